//! Built-in reference data for world events, their rewards and sub-locations.
//!
//! Event keys are the event names as they come out of quest paths after
//! normalization (story events carry a `Story` suffix, injectables are reduced
//! to their last name part). Reward paths are item asset paths without the
//! `/Game` root.

pub struct EventRecord {
    pub event: &'static str,
    pub rewards: &'static [&'static str],
}

pub struct ItemRecord {
    pub path: &'static str,
    pub name: &'static str,
    pub coop: bool,
    pub notes: &'static str,
}

pub struct SubLocation {
    pub event: &'static str,
    pub location: &'static str,
}

#[rustfmt::skip]
pub const WORLD_TRANSLATIONS: &[(&str, &str)] = &[
    ("World_Jungle",       "Yaesha"),
    ("World_Fae",          "Losomn"),
    ("World_Nerud",        "N'Erud"),
    ("World_Earth",        "Earth"),
    ("World_RootEarth",    "Root Earth"),
    ("World_Labyrinth",    "Labyrinth"),
    ("World_Base",         "Ward 13"),
    ("World_DLC1",         "Losomn"),
    ("World_DLC2",         "Yaesha"),
    ("World_DLC3",         "N'Erud"),
    ("Campaign_Labyrinth", "Labyrinth"),
    ("Campaign_Main",      "Campaign"),
];

#[rustfmt::skip]
const EVENTS: &[EventRecord] = &[
    // Ward 13
    EventRecord { event: "Ward13",             rewards: &[] },

    // Yaesha
    EventRecord { event: "Ravager",            rewards: &["/Items/Weapons/Melee/Special/RavagersMaw/Weapon_RavagersMaw",
                                                          "/Items/Trinkets/Amulets/RavagersMark/Amulet_RavagersMark"] },
    EventRecord { event: "TheLamentStory",     rewards: &["/Items/Trinkets/Rings/HeartOfTheWolf/Ring_HeartOfTheWolf"] },
    EventRecord { event: "RedPrince",          rewards: &["/Items/Weapons/LongGuns/Special/Merciless/Weapon_Merciless",
                                                          "/Items/Armor/Leto/Armor_Body_Leto"] },
    EventRecord { event: "Bloodmoon",          rewards: &["/Items/Trinkets/Rings/BloodmoonRing/Ring_BloodmoonRing",
                                                          "/Items/Materials/Engrams/Material_Engram_Bloodmoon"] },
    EventRecord { event: "Doe",                rewards: &["/Items/Weapons/Melee/Special/Godsplitter/Weapon_Godsplitter"] },

    // Losomn
    EventRecord { event: "Nightweaver",        rewards: &["/Items/Weapons/HandGuns/Special/Nightfall/Weapon_Nightfall",
                                                          "/Items/Relic/NightweaversGrudge/Relic_NightweaversGrudge"] },
    EventRecord { event: "BeatificPalaceStory",rewards: &["/Items/Trinkets/Amulets/WhisperingMarble/Amulet_WhisperingMarble"] },
    EventRecord { event: "Magister",           rewards: &["/Items/Mods/Firestorm/Mod_Firestorm"] },
    EventRecord { event: "Butcher",            rewards: &["/Items/Trinkets/Rings/ButchersFetish/Ring_ButchersFetish"] },

    // N'Erud
    EventRecord { event: "Sentinel",           rewards: &["/Items/Weapons/LongGuns/Special/Alpha/Weapon_Alpha",
                                                          "/Items/Gems/Spirited/MetaGem_Spirited"] },
    EventRecord { event: "Phantom",            rewards: &["/Items/Trinkets/Rings/PhantomShard/Ring_PhantomShard"] },
    EventRecord { event: "Custodian",          rewards: &["/Items/Traits/Fortify/Trait_Fortify"] },

    // Injectables
    EventRecord { event: "Wisp",               rewards: &["/Items/Trinkets/Rings/WispWeave/Ring_WispWeave"] },
    EventRecord { event: "Regenerator",        rewards: &["/Items/Gems/Regenerator/MetaGem_Regenerator"] },
];

#[rustfmt::skip]
const ITEMS: &[ItemRecord] = &[
    ItemRecord { path: "/Items/Weapons/Melee/Special/RavagersMaw/Weapon_RavagersMaw",     name: "Ravager's Maw",          coop: false, notes: "" },
    ItemRecord { path: "/Items/Trinkets/Amulets/RavagersMark/Amulet_RavagersMark",        name: "Ravager's Mark",         coop: false, notes: "Kill the Ravager while its Doe is alive" },
    ItemRecord { path: "/Items/Trinkets/Rings/HeartOfTheWolf/Ring_HeartOfTheWolf",        name: "Heart Of The Wolf",      coop: false, notes: "" },
    ItemRecord { path: "/Items/Weapons/LongGuns/Special/Merciless/Weapon_Merciless",      name: "Merciless",              coop: false, notes: "Spare the Red Prince and trade his heart" },
    ItemRecord { path: "/Items/Armor/Leto/Armor_Body_Leto",                               name: "Leto's Armor",           coop: true,  notes: "" },
    ItemRecord { path: "/Items/Trinkets/Rings/BloodmoonRing/Ring_BloodmoonRing",          name: "Bloodmoon Ring",         coop: false, notes: "Only during a blood moon" },
    ItemRecord { path: "/Items/Materials/Engrams/Material_Engram_Bloodmoon",              name: "Bloodmoon Essence",      coop: true,  notes: "" },
    ItemRecord { path: "/Items/Weapons/Melee/Special/Godsplitter/Weapon_Godsplitter",     name: "Godsplitter",            coop: false, notes: "" },
    ItemRecord { path: "/Items/Weapons/HandGuns/Special/Nightfall/Weapon_Nightfall",      name: "Nightfall",              coop: false, notes: "" },
    ItemRecord { path: "/Items/Relic/NightweaversGrudge/Relic_NightweaversGrudge",        name: "Nightweaver's Grudge",   coop: false, notes: "Alternate kill: destroy the loom before the fight" },
    ItemRecord { path: "/Items/Trinkets/Amulets/WhisperingMarble/Amulet_WhisperingMarble",name: "Whispering Marble",      coop: false, notes: "" },
    ItemRecord { path: "/Items/Mods/Firestorm/Mod_Firestorm",                             name: "Firestorm",              coop: true,  notes: "" },
    ItemRecord { path: "/Items/Trinkets/Rings/ButchersFetish/Ring_ButchersFetish",        name: "Butcher's Fetish",       coop: false, notes: "" },
    ItemRecord { path: "/Items/Weapons/LongGuns/Special/Alpha/Weapon_Alpha",              name: "Alpha-Omega",            coop: false, notes: "" },
    ItemRecord { path: "/Items/Gems/Spirited/MetaGem_Spirited",                           name: "Spirited",               coop: false, notes: "" },
    ItemRecord { path: "/Items/Trinkets/Rings/PhantomShard/Ring_PhantomShard",            name: "Phantom Shard",          coop: false, notes: "" },
    ItemRecord { path: "/Items/Traits/Fortify/Trait_Fortify",                             name: "Fortify",                coop: false, notes: "" },
    ItemRecord { path: "/Items/Trinkets/Rings/WispWeave/Ring_WispWeave",                  name: "Wisp Weave",             coop: false, notes: "" },
];

#[rustfmt::skip]
const SUB_LOCATIONS: &[SubLocation] = &[
    SubLocation { event: "Ravager",         location: "Ravager's Lair" },
    SubLocation { event: "TheLament",       location: "The Great Hall" },
    SubLocation { event: "RedPrince",       location: "Withering Gardens" },
    SubLocation { event: "Nightweaver",     location: "Nightweaver's Web" },
    SubLocation { event: "BeatificPalace",  location: "Beatific Palace" },
    SubLocation { event: "Magister",        location: "Ironborough" },
    SubLocation { event: "Sentinel",        location: "Sentinel's Keep" },
    SubLocation { event: "Phantom",         location: "Dormant N'Erudian Facility" },
    SubLocation { event: "Custodian",       location: "The Eye of the Custodian" },
];

pub fn translate_world(world: &str) -> &str {
    WORLD_TRANSLATIONS
        .iter()
        .find(|(id, _)| *id == world)
        .map_or(world, |(_, name)| *name)
}

pub fn event(name: &str) -> Option<&'static EventRecord> {
    EVENTS.iter().find(|e| e.event == name)
}

pub fn item(path: &str) -> Option<&'static ItemRecord> {
    ITEMS.iter().find(|i| i.path == path)
}

pub fn sub_location(event: &str) -> Option<&'static str> {
    SUB_LOCATIONS
        .iter()
        .find(|s| s.event == event)
        .map(|s| s.location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_worlds_translate_to_themselves() {
        assert_eq!(translate_world("World_Jungle"), "Yaesha");
        assert_eq!(translate_world("World_Unknown"), "World_Unknown");
    }

    #[test]
    fn event_keys_are_unique() {
        for (i, record) in EVENTS.iter().enumerate() {
            assert!(
                EVENTS[i + 1..].iter().all(|other| other.event != record.event),
                "{}",
                record.event
            );
        }
    }
}
