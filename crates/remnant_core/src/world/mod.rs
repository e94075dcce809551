//! World state analysis: which quest events a campaign or adventure rolled,
//! and what they can drop.
//!
//! Events are recovered from the document's strings in serialization order.
//! A campaign's events sit between its last Ward 13 quest marker and the main
//! campaign quest; an adventure's sit between the campaign quest and the
//! adventure-mode quest.

pub mod reference;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use tracing::debug;

use crate::document::SaveData;
use crate::document::walk;

const CAMPAIGN_START: &str = "/Game/World_Base/Quests/Quest_Ward13/Quest_Ward13.Quest_Ward13_C";
const CAMPAIGN_END: &str = "/Game/Campaign_Main/Quest_Campaign_Main.Quest_Campaign_Main_C";

const ADVENTURE_PATTERN: &str = r"/Game/World_(?:\w+)/Quests/Quest_AdventureMode/Quest_AdventureMode_\w+\.Quest_AdventureMode_\w+_C";
const EVENT_PATTERN: &str = r"/Game/(?P<world>(?:World|Campaign)_\w+)/Quests/(?:Quest_)?(?P<kind>[a-zA-Z0-9]+)_(?P<name>\w+)/(?P<details>\w+)\.\w+";
const CAMEL_PATTERN: &str = r"([a-z])([A-Z])";

const SKIP_TYPES: &[&str] = &["Global", "Earth", "AdventureMode"];
const SKIP_NAMES: &[&str] = &["AdventureMode", "Campaign_Main"];
const ITEM_PREFIXES: &[&str] = &["Ring_", "Amulet_", "Weapon_", "Armor_", "Trait_", "Mod_", "Relic_", "MetaGem_"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Campaign,
    Adventure,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Campaign => "campaign",
            Self::Adventure => "adventure",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaign" => Ok(Self::Campaign),
            "adventure" => Ok(Self::Adventure),
            other => Err(format!("unknown mode \"{other}\"")),
        }
    }
}

/// One event marker found in a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldEvent {
    /// The quest path the event was recovered from.
    pub key: String,
    /// Internal world id, e.g. `World_Jungle`.
    pub world_id: String,
    pub event_type: String,
    /// Normalized event name, used as the reference table key.
    pub name: String,
    pub sub_location: Option<&'static str>,
}

impl WorldEvent {
    pub fn world(&self) -> &str {
        reference::translate_world(&self.world_id)
    }

    /// `World: Sub-location`, or just the world.
    pub fn location(&self) -> String {
        match self.sub_location {
            Some(sub) => format!("{}: {sub}", self.world()),
            None => self.world().to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        reference::event(&self.name).is_some()
    }
}

/// A reward resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub path: String,
    pub name: String,
    pub kind: &'static str,
    pub coop: bool,
    pub notes: String,
}

/// Item category from its asset path.
pub fn item_kind(path: &str) -> &'static str {
    if path.contains("/Rings/") {
        "Ring"
    } else if path.contains("/Amulets/") {
        "Amulet"
    } else if path.contains("/Weapons/") {
        if path.contains("/Melee/") {
            "Melee"
        } else if path.contains("/LongGuns/") {
            "Long Gun"
        } else if path.contains("/HandGuns/") {
            "Hand Gun"
        } else {
            "Weapon"
        }
    } else if path.contains("/Armor/") {
        "Armor"
    } else if path.contains("/Traits/") {
        "Trait"
    } else if path.contains("/Mods/") {
        "Mod"
    } else if path.contains("/Gems/") {
        "Mutator"
    } else if path.contains("/Relic") {
        "Relic"
    } else {
        "Item"
    }
}

/// Compiled patterns for event extraction and name display.
#[derive(Debug, Clone)]
pub struct WorldAnalyzer {
    adventure: Regex,
    event: Regex,
    camel: Regex,
}

impl WorldAnalyzer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            adventure: Regex::new(ADVENTURE_PATTERN)?,
            event: Regex::new(EVENT_PATTERN)?,
            camel: Regex::new(CAMEL_PATTERN)?,
        })
    }

    /// Events for `mode`, in the order the save lists them.
    pub fn analyze(&self, save: &SaveData, mode: Mode) -> Vec<WorldEvent> {
        let text = save_text(save);
        let events = self.parse_events(self.events_region(&text, mode));
        debug!(%mode, events = events.len(), "analyzed world");
        events
    }

    /// The slice of `text` holding the events for `mode`; empty when the
    /// bounding markers are missing.
    pub fn events_region<'t>(&self, text: &'t str, mode: Mode) -> &'t str {
        let campaign_end = text.find(CAMPAIGN_END);
        match mode {
            Mode::Campaign => {
                let Some(end) = campaign_end else {
                    return "";
                };
                text[..end]
                    .rfind(CAMPAIGN_START)
                    .map_or("", |start| &text[start..end])
            }
            Mode::Adventure => {
                let Some(found) = self.adventure.find(text) else {
                    return "";
                };
                let end = found.start();
                let start = campaign_end.filter(|&s| s <= end).unwrap_or(0);
                &text[start..end]
            }
        }
    }

    pub fn parse_events(&self, region: &str) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        let mut seen = HashSet::new();

        for caps in self.event.captures_iter(region) {
            let (Some(full), Some(world), Some(kind), Some(raw_name), Some(details)) = (
                caps.get(0),
                caps.name("world"),
                caps.name("kind"),
                caps.name("name"),
                caps.name("details"),
            ) else {
                continue;
            };
            let full = full.as_str();
            let (world, raw_name) = (world.as_str(), raw_name.as_str());
            let mut event_type = kind.as_str().to_string();

            if full.contains("EventTree")
                || details.as_str().ends_with("_C")
                || SKIP_TYPES.contains(&event_type.as_str())
                || SKIP_NAMES.contains(&raw_name)
                || full.contains("Template")
                || full.contains("TileInfo")
            {
                continue;
            }
            if !seen.insert(format!("{world}:{event_type}:{raw_name}")) {
                continue;
            }

            let mut name = raw_name.replace("_Spawntable", "");
            if ["Ring", "Amulet", "Trait"].iter().any(|p| name.starts_with(p)) {
                event_type = "Item".to_string();
            }
            if event_type == "Story" && !full.contains("Quest_Event") {
                name.push_str("Story");
            }
            if event_type.contains("Injectable") || event_type.contains("Abberation") {
                let parts: Vec<&str> = name.split('_').collect();
                let pick = match parts.as_slice() {
                    [.., prev, "DLC"] => *prev,
                    [.., last] => *last,
                    [] => "",
                };
                name = pick.to_string();
            }

            events.push(WorldEvent {
                key: full.to_string(),
                world_id: world.to_string(),
                event_type,
                name,
                sub_location: reference::sub_location(raw_name),
            });
        }
        events
    }

    fn split_camel(&self, s: &str) -> String {
        self.camel.replace_all(s, "$1 $2").into_owned()
    }

    /// Event name for display: no `Story` suffix, words split.
    pub fn display_name(&self, event: &WorldEvent) -> String {
        let name = event.name.strip_suffix("Story").unwrap_or(&event.name);
        self.split_camel(name)
    }

    /// Display name derived from an item path when the reference table has none.
    pub fn derived_item_name(&self, path: &str) -> String {
        let last = path.rsplit('/').next().unwrap_or(path);
        let stripped = ITEM_PREFIXES
            .iter()
            .find_map(|p| last.strip_prefix(p))
            .unwrap_or(last);
        self.split_camel(stripped)
    }

    /// Possible rewards of an event; empty for events the table does not know.
    pub fn items(&self, event: &WorldEvent) -> Vec<Item> {
        let Some(record) = reference::event(&event.name) else {
            return Vec::new();
        };
        record
            .rewards
            .iter()
            .map(|&path| match reference::item(path) {
                Some(known) => Item {
                    path: path.to_string(),
                    name: known.name.to_string(),
                    kind: item_kind(path),
                    coop: known.coop,
                    notes: known.notes.to_string(),
                },
                None => Item {
                    path: path.to_string(),
                    name: self.derived_item_name(path),
                    kind: item_kind(path),
                    coop: false,
                    notes: String::new(),
                },
            })
            .collect()
    }
}

/// Every string of the document joined by newlines.
pub fn save_text(save: &SaveData) -> String {
    walk::strings(save).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> WorldAnalyzer {
        WorldAnalyzer::new().unwrap()
    }

    fn campaign(body: &[&str]) -> String {
        let mut lines = vec!["/Game/Other", CAMPAIGN_START];
        lines.extend_from_slice(body);
        lines.push(CAMPAIGN_END);
        lines.join("\n")
    }

    #[test]
    fn campaign_region_starts_at_last_ward13_marker() {
        let text = format!("{CAMPAIGN_START}\nold\n{}", campaign(&["new"]));
        let region = analyzer().events_region(&text, Mode::Campaign);
        assert!(region.starts_with(CAMPAIGN_START));
        assert!(region.contains("new"));
        assert!(!region.contains("old"));
    }

    #[test]
    fn missing_markers_give_an_empty_region() {
        assert_eq!(analyzer().events_region("nothing here", Mode::Campaign), "");
        assert_eq!(analyzer().events_region(CAMPAIGN_END, Mode::Adventure), "");
    }

    #[test]
    fn adventure_region_ends_at_adventure_quest() {
        let adventure = "/Game/World_Jungle/Quests/Quest_AdventureMode/Quest_AdventureMode_Jungle.Quest_AdventureMode_Jungle_C";
        let text = format!("{}\nbetween\n{adventure}\nafter", campaign(&["inside"]));
        let region = analyzer().events_region(&text, Mode::Adventure);
        assert!(region.starts_with(CAMPAIGN_END));
        assert!(region.contains("between"));
        assert!(!region.contains("after"));
    }

    #[test]
    fn event_names_are_normalized() {
        let region = [
            "/Game/World_Jungle/Quests/Quest_Story_TheLament/Quest_Story_TheLament.Quest_Story_TheLament_C",
            "/Game/World_Fae/Quests/Quest_Injectable_Wisp_DLC/Quest_Injectable_Wisp_DLC.Quest_Injectable_Wisp_DLC_C",
            "/Game/World_Nerud/Quests/Quest_SideD_Ring_Phantom_Spawntable/Quest_SideD_Ring_Phantom_Spawntable.Quest_C",
            "/Game/World_Jungle/Quests/Quest_Boss_Ravager/Quest_Boss_Ravager.Quest_Boss_Ravager_C",
            "/Game/World_Jungle/Quests/Quest_Boss_Ravager/Quest_Boss_Ravager.Quest_Boss_Ravager_C",
        ]
        .join("\n");
        let events = analyzer().parse_events(&region);
        let names: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.event_type.as_str(), e.name.as_str()))
            .collect();
        assert_eq!(
            names,
            [
                ("Story", "TheLamentStory"),
                ("Injectable", "Wisp"),
                ("Item", "Ring_Phantom"),
                ("Boss", "Ravager"),
            ]
        );
    }

    #[test]
    fn skipped_patterns_produce_no_events() {
        let region = [
            "/Game/World_Base/Quests/Quest_Global_Stuff/Quest_Global_Stuff.X",
            "/Game/World_Jungle/Quests/Quest_Boss_Ravager/Quest_Boss_Ravager_C.X",
            "/Game/World_Jungle/Quests/Quest_Boss_EventTree/Quest_Boss_Tree.X",
            "/Game/World_Jungle/Quests/Quest_Boss_Template/Quest_Boss_Template.X",
        ]
        .join("\n");
        assert!(analyzer().parse_events(&region).is_empty());
    }

    #[test]
    fn display_names_split_words() {
        let a = analyzer();
        let event = WorldEvent {
            key: String::new(),
            world_id: "World_Jungle".into(),
            event_type: "Story".into(),
            name: "TheLamentStory".into(),
            sub_location: None,
        };
        assert_eq!(a.display_name(&event), "The Lament");
        assert_eq!(
            a.derived_item_name("/Items/Gems/Regenerator/MetaGem_RegeneratorPlus"),
            "Regenerator Plus"
        );
    }

    #[test]
    fn item_kinds_follow_path_folders() {
        assert_eq!(item_kind("/Items/Weapons/LongGuns/X/Weapon_X"), "Long Gun");
        assert_eq!(item_kind("/Items/Weapons/Special/X"), "Weapon");
        assert_eq!(item_kind("/Items/Gems/X/MetaGem_X"), "Mutator");
        assert_eq!(item_kind("/Items/Relic/X/Relic_X"), "Relic");
        assert_eq!(item_kind("/Items/Other"), "Item");
    }
}
