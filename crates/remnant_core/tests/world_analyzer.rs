mod common;

use std::collections::BTreeSet;

use remnant_core::core_api::{Engine, EventEntry, Session};
use remnant_core::world::Mode;

use common::{ADVENTURE_END, CAMPAIGN_END, CAMPAIGN_START, quest, stream, world_document};

fn open_world(quests: &[String]) -> Session {
    Engine::new()
        .open_bytes(stream(&world_document(quests)))
        .expect("failed to open world save")
}

fn rolled_world() -> Vec<String> {
    vec![
        quest("World_Jungle", "Boss", "Ravager"),
        CAMPAIGN_START.to_string(),
        quest("World_Jungle", "Boss", "Ravager"),
        quest("World_Jungle", "Story", "TheLament"),
        quest("World_Fae", "Boss", "Nightweaver"),
        quest("World_Nerud", "Boss", "Sentinel"),
        quest("World_Nerud", "Boss", "Sentinel"),
        CAMPAIGN_END.to_string(),
        quest("World_Fae", "Boss", "Magister"),
        quest("World_Fae", "Injectable", "Regenerator"),
        ADVENTURE_END.to_string(),
    ]
}

fn names(events: &[EventEntry]) -> Vec<&str> {
    events.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn campaign_lists_every_known_event_once() {
    let events = open_world(&rolled_world())
        .analyze(Mode::Campaign, true)
        .expect("analysis succeeds");

    assert_eq!(names(&events), ["Ward13", "Ravager", "The Lament", "Nightweaver", "Sentinel"]);
    assert!(events.iter().all(|e| e.known));

    let worlds: BTreeSet<&str> = events.iter().map(|e| e.world.as_str()).collect();
    assert_eq!(worlds, BTreeSet::from(["Losomn", "N'Erud", "Ward 13", "Yaesha"]));

    let lament = &events[2];
    assert_eq!(lament.event_type, "Story");
    assert_eq!(lament.raw_id, "TheLamentStory");
    assert_eq!(lament.location, "Yaesha: The Great Hall");
}

#[test]
fn rewards_resolve_through_the_item_table() {
    let events = open_world(&rolled_world())
        .analyze(Mode::Campaign, true)
        .expect("analysis succeeds");
    let ravager = &events[1];
    assert_eq!(ravager.location, "Yaesha: Ravager's Lair");

    let items: Vec<(&str, &str)> = ravager
        .items
        .iter()
        .map(|i| (i.name.as_str(), i.kind.as_str()))
        .collect();
    assert_eq!(items, [("Ravager's Maw", "Melee"), ("Ravager's Mark", "Amulet")]);
    assert_eq!(ravager.items[1].notes, "Kill the Ravager while its Doe is alive");

    let nightweaver = &events[3];
    assert_eq!(nightweaver.items.len(), 2);
    assert!(nightweaver.items.iter().all(|i| !i.name.is_empty()));
}

#[test]
fn adventure_mode_reads_after_the_campaign() {
    let events = open_world(&rolled_world())
        .analyze(Mode::Adventure, true)
        .expect("analysis succeeds");
    assert_eq!(names(&events), ["Magister", "Regenerator"]);

    let magister = &events[0];
    assert_eq!(magister.location, "Losomn: Ironborough");
    assert!(magister.items[0].coop);

    // Rewards missing from the item table fall back to a name from the path.
    let regenerator = &events[1];
    assert_eq!(regenerator.event_type, "Injectable");
    assert_eq!(regenerator.items[0].name, "Regenerator");
    assert_eq!(regenerator.items[0].kind, "Mutator");
}

#[test]
fn unknown_events_keep_their_raw_name() {
    let quests = vec![
        CAMPAIGN_START.to_string(),
        quest("World_Nerud", "Boss", "Annihilation"),
        CAMPAIGN_END.to_string(),
    ];
    let events = open_world(&quests)
        .analyze(Mode::Campaign, true)
        .expect("analysis succeeds");
    let unknown = events.last().expect("one event past the start marker");
    assert_eq!(unknown.raw_id, "Annihilation");
    assert_eq!(unknown.world, "N'Erud");
    assert_eq!(unknown.location, "N'Erud");
    assert!(!unknown.known);
    assert!(unknown.items.is_empty());
}

#[test]
fn items_can_be_left_out() {
    let events = open_world(&rolled_world())
        .analyze(Mode::Campaign, false)
        .expect("analysis succeeds");
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e.items.is_empty()));
}

#[test]
fn save_without_markers_has_no_events() {
    let quests = vec![quest("World_Jungle", "Boss", "Ravager")];
    let session = open_world(&quests);
    for mode in [Mode::Campaign, Mode::Adventure] {
        assert!(session.analyze(mode, true).expect("analysis succeeds").is_empty());
    }
}
