//! Prism segment slots in profile saves.
//!
//! A prism is any property bag holding a `CurrentSegments` array of structs,
//! each with a `RowName` name and a `Level` int. Slots are located by walking
//! the document, then edited through their path addresses.

use thiserror::Error;
use tracing::debug;

use crate::document::path::PathError;
use crate::document::walk::{self, Visitor};
use crate::document::{PathAddress, PropertyBag, SaveData, SaveDocument, Value};

// Fusion, base and mythic segments known to the game.
#[rustfmt::skip]
pub const VALID_PRISM_SEGMENTS: &[&str] = &[
    // Fusion
    "MeleeDamageMeleeSpeed", "DamageReductionArmorPercent", "MeleeCriticalEvadeSpeed",
    "HealthPercentStaminaPercent", "WeakspotDamageCriticalDamage", "HealthRegenSkillCooldown",
    "FireRateReloadSpeed", "RangedDamageIdealRange", "RangedCriticalAmmoReserves",
    "MovementSpeedEvadeSpeed", "ModDurationSkillDuration", "ModDamageModGeneration",
    "ExplosiveDamageDamageReduction", "WeaponSpreadSwapSpeed", "CastSpeedUseSpeed",

    // Base
    "CriticalDamage", "Immovable", "HealthPercent", "MeleeCriticalChance", "DamageReduction",
    "MeleeDamage", "MeleeAttackSpeed", "ArmorPercent", "EvadeSpeed", "StaminaPercent",
    "SkillDamage", "HealthRegen", "HealingEfficacy", "ConsumableSpeed", "FirearmChargeSpeed",
    "SharpShooter", "ReloadSpeed", "IdealRange", "AmmoReserves", "RangedFireRate",
    "WeakspotDamage", "RangedDamage", "RangedCriticalChance", "StatusDamage", "Sadistic",
    "MovementSpeed", "SkillCooldown", "ModDuration", "SkillDuration", "ModCriticalChance",
    "CriticalSituation", "ModGeneration", "ModDamage", "ExplosiveDamage", "SwapSpeed",
    "WeaponSpread", "Unbridled", "CastSpeed",

    // Mythic
    "Allegiance", "Altruistic", "ArtfulDodger", "Bodyguard", "BoundlessEnergy", "Brutality",
    "DarkOmen", "DefensiveMeasures", "Exhausted", "FleetFooted", "FullHearted", "Gigantic",
    "GodTear", "HeavyDrinker", "Hyperactive", "Impervious", "InsultToInjury", "JackOfAllTrades",
    "LuckOfTheDevil", "MasterKiller", "Outlaw", "Overpowered", "PeakConditioning", "Physician",
    "PowerFantasy", "PowerTrip", "PrimeTime", "Reverberation", "SizeMatters", "Soulmate",
    "Spectrum", "SpeedDemon", "SteelPlating", "Traitor", "Unbreakable", "Vaccinated",
    "WreckingBall",
];

const SEGMENTS_KEY: &str = "CurrentSegments";
const ROW_NAME_KEY: &str = "RowName";

pub fn is_valid_segment(name: &str) -> bool {
    VALID_PRISM_SEGMENTS.contains(&name)
}

/// The allow-list in name order.
pub fn valid_segments() -> Vec<&'static str> {
    let mut names = VALID_PRISM_SEGMENTS.to_vec();
    names.sort_unstable();
    names
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("\"{0}\" is not a valid prism segment name")]
    UnknownSegmentName(String),

    #[error("no prism segment slot holds \"{0}\"")]
    SegmentNotFound(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("slot at {0} does not hold a name")]
    NotAName(PathAddress),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSlot {
    /// Address of the slot's `RowName` property.
    pub path: PathAddress,
    pub name: String,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub path: PathAddress,
    pub segments: Vec<SegmentSlot>,
    pub current_seed: Option<i32>,
    pub pending_experience: Option<f32>,
}

impl Prism {
    pub fn total_level(&self) -> i32 {
        self.segments.iter().filter_map(|s| s.level).sum()
    }

    fn from_bag(path: &PathAddress, bag: &PropertyBag) -> Option<Self> {
        let Value::StructArray(array) = bag.value(SEGMENTS_KEY)? else {
            return None;
        };
        let segments = array
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let slot = item.as_bag()?;
                let name = slot.value(ROW_NAME_KEY)?.as_name()?;
                Some(SegmentSlot {
                    path: path.child(SEGMENTS_KEY, Some(i)).child(ROW_NAME_KEY, None),
                    name: name.as_str().to_string(),
                    level: slot.value("Level").and_then(Value::as_int),
                })
            })
            .collect();
        Some(Self {
            path: path.clone(),
            segments,
            current_seed: bag.value("CurrentSeed").and_then(Value::as_int),
            pending_experience: bag.value("PendingExperience").and_then(Value::as_float),
        })
    }
}

struct PrismFinder(Vec<Prism>);

impl<'a> Visitor<'a> for PrismFinder {
    fn bag(&mut self, path: &PathAddress, bag: &'a PropertyBag, _owner: &'a SaveData) {
        if let Some(prism) = Prism::from_bag(path, bag) {
            self.0.push(prism);
        }
    }
}

/// Every prism in document order.
pub fn prisms(save: &SaveData) -> Vec<Prism> {
    let mut finder = PrismFinder(Vec::new());
    walk::walk(save, &mut finder);
    finder.0
}

/// Current slot values in document order.
pub fn segment_slots(save: &SaveData) -> Vec<SegmentSlot> {
    prisms(save).into_iter().flat_map(|p| p.segments).collect()
}

/// Replace every slot holding `from` with `to` and return how many changed.
///
/// `to` is checked against the allow-list before anything is touched, and a
/// `from` that no slot holds leaves the document unchanged.
pub fn replace_segment(doc: &mut SaveDocument, from: &str, to: &str) -> Result<usize, SegmentError> {
    if !is_valid_segment(to) {
        return Err(SegmentError::UnknownSegmentName(to.to_string()));
    }

    let targets: Vec<PathAddress> = segment_slots(&doc.save)
        .into_iter()
        .filter(|slot| slot.name == from)
        .map(|slot| slot.path)
        .collect();
    if targets.is_empty() {
        return Err(SegmentError::SegmentNotFound(from.to_string()));
    }

    for path in &targets {
        let node = doc.find_mut(path)?;
        match node.value() {
            Some(Value::Name(name)) => name.name = to.to_string(),
            _ => return Err(SegmentError::NotAName(path.clone())),
        }
    }
    debug!(from, to, replaced = targets.len(), "replaced prism segments");
    Ok(targets.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_has_no_duplicates() {
        let mut names = valid_segments();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
    }

    #[test]
    fn validation_covers_every_family() {
        for name in ["FireRateReloadSpeed", "CriticalDamage", "Brutality"] {
            assert!(is_valid_segment(name), "{name}");
        }
        assert!(!is_valid_segment("criticaldamage"));
        assert!(!is_valid_segment("Level"));
    }
}
