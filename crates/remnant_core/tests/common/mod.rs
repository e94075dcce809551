//! Synthetic saves built from the public document constructors.
#![allow(dead_code)]

use remnant_core::cursor::FString;
use remnant_core::document::object::LoadedData;
use remnant_core::document::persistence::{DynamicActor, PROFILE_CLASS_PATH, Transform};
use remnant_core::document::save_data::{PackageVersion, TopLevelAssetPath};
use remnant_core::document::{
    Actor, ActorEntry, Component, ComponentBody, FName, NameTable, PersistenceBlob,
    PersistenceContainer, Property, PropertyBag, SaveData, SaveDocument, UObject, Value, Variable,
    VariableValue, Variables,
};

pub const WORLD_CLASS_PATH: &str = "/Game/_Core/Blueprints/Base/BP_RemnantSaveGame";
pub const PLAYER_PATH: &str =
    "/Game/Characters/Player/Base/Character_Master_Player.Character_Master_Player_C";
pub const SCRAPS_PATH: &str =
    "/Game/World_Base/Items/Materials/Scraps/Material_Scraps.Material_Scraps_C";
pub const LUMENITE_PATH: &str =
    "/Game/World_Base/Items/Materials/Lumenite/Material_LumeniteCrystal.Material_LumeniteCrystal_C";
pub const WEAPON_PATH: &str =
    "/Game/World_Base/Items/Weapons/LongGuns/Repeater/Weapon_Repeater.Weapon_Repeater_C";

pub const CAMPAIGN_START: &str = "/Game/World_Base/Quests/Quest_Ward13/Quest_Ward13.Quest_Ward13_C";
pub const CAMPAIGN_END: &str = "/Game/Campaign_Main/Quest_Campaign_Main.Quest_Campaign_Main_C";
pub const ADVENTURE_END: &str = "/Game/World_Jungle/Quests/Quest_AdventureMode/Quest_AdventureMode_Jungle.Quest_AdventureMode_Jungle_C";

const UE_VERSION: i32 = 1009;
const SAVE_VERSION: u32 = 6;

pub fn quest(world: &str, kind: &str, name: &str) -> String {
    format!("/Game/{world}/Quests/Quest_{kind}_{name}/Quest_{kind}_{name}.Quest_{kind}_{name}_C")
}

pub fn segment(name: &str, level: i32) -> Value {
    Value::Struct(PropertyBag::new(vec![
        Property::name("RowName", name),
        Property::int("Level", level),
    ]))
}

pub fn prism(segments: &[(&str, i32)], seed: i32, experience: f32) -> Property {
    let items = segments.iter().map(|(n, l)| segment(n, *l)).collect();
    Property::structure(
        "Prism",
        "PrismData",
        Value::Struct(PropertyBag::new(vec![
            Property::struct_array("CurrentSegments", "PrismSegment", items),
            Property::int("CurrentSeed", seed),
            Property::float("PendingExperience", experience),
        ])),
    )
}

pub fn inventory_item(item_bp: i32, instance: i32, quantity: Option<i32>) -> Value {
    let mut props = vec![
        Property::object("ItemBP", item_bp),
        Property::object("InstanceData", instance),
    ];
    if let Some(q) = quantity {
        props.push(Property::int("Quantity", q));
    }
    Value::Struct(PropertyBag::new(props))
}

fn bare(path: &str, index: i32) -> UObject {
    let mut object = UObject::new(path, index, PropertyBag::default());
    object.properties = None;
    object
}

fn transform(x: f64) -> Transform {
    Transform {
        rotation: [0.0, 0.0, 0.0, 1.0],
        position: [x, 2.0, 3.0],
        scale: [1.0; 3],
    }
}

fn top_level(class_path: &str, mut objects: Vec<UObject>) -> SaveData {
    // The first loaded object of a top-level save is the class itself.
    if let Some(first) = objects.first_mut() {
        first.path = FString::new(class_path);
        first.path_implied = true;
    }
    SaveData {
        package_version: Some(PackageVersion {
            ue_version: UE_VERSION,
            licensee_version: 0,
        }),
        asset_path: Some(TopLevelAssetPath {
            package: FString::new(class_path),
            asset: FString::new("None"),
        }),
        version: SAVE_VERSION,
        objects,
        names: NameTable::default(),
    }
}

/// Inner profile save: the player with two prisms and an inventory.
pub fn profile_inner(segments: &[(&str, i32)], second: &[(&str, i32)]) -> SaveData {
    let items = vec![
        inventory_item(1, 3, Some(1250)),
        inventory_item(2, 4, None),
        inventory_item(5, 3, Some(1)),
        inventory_item(-1, 3, Some(99)),
    ];
    let player = UObject::new(
        PLAYER_PATH,
        0,
        PropertyBag::new(vec![
            prism(segments, 4242, 12.5),
            Property::struct_array("Items", "InventoryItemData", items),
            Property::string("CharacterName", "Traveler"),
        ]),
    );
    let spare = UObject::new(
        "/Game/Characters/Player/Base/PrismStash",
        6,
        PropertyBag::new(vec![prism(second, 7, 0.0)]),
    );
    let instance = UObject::new(
        "/Game/Characters/Player/Base/InstanceData_Lumenite",
        4,
        PropertyBag::new(vec![Property::int("Quantity", 7)]),
    );
    SaveData {
        package_version: Some(PackageVersion {
            ue_version: UE_VERSION,
            licensee_version: 0,
        }),
        asset_path: None,
        version: SAVE_VERSION,
        objects: vec![
            player,
            bare(SCRAPS_PATH, 1),
            bare(LUMENITE_PATH, 2),
            bare("/Game/Characters/Player/Base/InstanceData_Default", 3),
            instance,
            bare(WEAPON_PATH, 5),
            spare,
        ],
        names: NameTable::default(),
    }
}

pub fn profile_document(segments: &[(&str, i32)], second: &[(&str, i32)]) -> SaveDocument {
    let blob = Value::Blob(Box::new(PersistenceBlob::Save(profile_inner(segments, second))));
    let root = UObject::new(
        PROFILE_CLASS_PATH,
        0,
        PropertyBag::new(vec![
            Property::int("Version", 3),
            Property::structure("ProfileData", "PersistenceBlob", blob),
        ]),
    );
    SaveDocument::new(UE_VERSION, 412_345, top_level(PROFILE_CLASS_PATH, vec![root]))
}

pub fn default_profile() -> SaveDocument {
    profile_document(
        &[("CriticalDamage", 3), ("HealthPercent", 2), ("Brutality", 1)],
        &[("CriticalDamage", 5), ("RangedDamage", 4)],
    )
}

fn actor_archive() -> SaveData {
    let zone = UObject::new(
        "/Game/World_Jungle/Zones/Zone_Spawn.Zone_Spawn_C",
        0,
        PropertyBag::new(vec![Property::int("Level", 3), Property::boolean("Visited", true)]),
    );
    SaveData {
        package_version: None,
        asset_path: None,
        version: SAVE_VERSION,
        objects: vec![zone],
        names: NameTable::default(),
    }
}

fn quest_state_object(index: i32) -> UObject {
    let mut object = bare("/Game/World_Base/Quests/QuestState", index);
    object.was_loaded = 0;
    object.loaded = Some(LoadedData {
        name: FName::new("QuestState"),
        outer_id: 1,
    });
    object.is_actor = 1;
    object.components = vec![
        Component {
            key: FString::new("Variables"),
            body: ComponentBody::Variables(Variables {
                name: FName::new("Variables"),
                unknown: 0,
                items: vec![
                    Variable {
                        name: FName::new("Completed"),
                        value: VariableValue::Bool(1),
                    },
                    Variable {
                        name: FName::new("Stage"),
                        value: VariableValue::Int(4),
                    },
                ],
            })
            .into(),
        },
        Component {
            key: FString::new("Health"),
            body: ComponentBody::Properties(PropertyBag::new(vec![Property::float("Current", 80.0)]))
                .into(),
        },
    ];
    object
}

/// World save whose object paths list `quests` in order after a container
/// blob, a component-bearing object and an opaque property.
pub fn world_document(quests: &[String]) -> SaveDocument {
    let container = PersistenceContainer {
        version: 4,
        actors: vec![ActorEntry {
            id: 17,
            actor: Actor {
                has_transform: 1,
                transform: Some(transform(1.0)),
                archive: actor_archive(),
            }
            .into(),
        }],
        dynamic: vec![DynamicActor {
            id: 99,
            transform: transform(5.0),
            class_path: FString::new("/Game/World_Base/Actors/BP_Dynamic.BP_Dynamic_C"),
        }],
        destroyed: vec![5, 6],
    };
    let root = UObject::new(
        WORLD_CLASS_PATH,
        0,
        PropertyBag::new(vec![
            Property::structure(
                "ActorData",
                "PersistenceBlob",
                Value::Blob(Box::new(PersistenceBlob::Container(container))),
            ),
            Property::structure("Unknown", "MysteryStruct", Value::Opaque(vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01])),
        ]),
    );
    let mut objects = vec![root, quest_state_object(1)];
    for (i, path) in quests.iter().enumerate() {
        objects.push(bare(path, i as i32 + 2));
    }
    SaveDocument::new(UE_VERSION, 412_345, top_level(WORLD_CLASS_PATH, objects))
}

/// Encoded decompressed stream of a fixture.
pub fn stream(doc: &SaveDocument) -> Vec<u8> {
    doc.encode().expect("failed to encode fixture")
}
