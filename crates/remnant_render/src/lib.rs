use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use remnant_core::core_api::{
    EventEntry, ItemEntry, NodeListing, PrismSummary, ReplaceOutcome, SegmentEntry,
    SegmentListing,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const WORLD_RULE_WIDTH: usize = 60;
const NOTE_MAX_CHARS: usize = 50;
const NOTE_CUT_CHARS: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldTextOptions {
    pub show_items: bool,
}

// World report

/// Events grouped by world in first-seen order, each world between `=` rules.
pub fn render_world_text(events: &[EventEntry], options: WorldTextOptions) -> String {
    let mut worlds: Vec<(&str, Vec<&EventEntry>)> = Vec::new();
    for event in events {
        match worlds.iter_mut().find(|(w, _)| *w == event.world) {
            Some((_, group)) => group.push(event),
            None => worlds.push((event.world.as_str(), vec![event])),
        }
    }

    let rule = "=".repeat(WORLD_RULE_WIDTH);
    let mut lines: Vec<String> = Vec::new();
    for (world, group) in worlds {
        lines.push(format!("\n{rule}"));
        lines.push(format!("  {world}"));
        lines.push(rule.clone());

        for event in group {
            let prefix = format!("{world}: ");
            let location = event
                .location
                .strip_prefix(&prefix)
                .unwrap_or(&event.location);
            let mut line = format!("\n  [{}] {}", event.event_type, event.name);
            if !location.is_empty() {
                let _ = write!(line, " - {location}");
            }
            lines.push(line);

            if options.show_items {
                for item in &event.items {
                    write_item_lines(&mut lines, item);
                }
            }
        }
    }
    lines.join("\n")
}

fn write_item_lines(lines: &mut Vec<String>, item: &ItemEntry) {
    let mut line = format!("      {}: {}", item.kind, item.name);
    if item.coop {
        line.push_str(" (co-op)");
    }
    lines.push(line);
    if !item.notes.is_empty() {
        lines.push(format!("        Note: {}", truncate_note(&item.notes)));
    }
}

fn truncate_note(notes: &str) -> String {
    if notes.chars().count() > NOTE_MAX_CHARS {
        let cut: String = notes.chars().take(NOTE_CUT_CHARS).collect();
        format!("{cut}...")
    } else {
        notes.to_string()
    }
}

pub fn render_world_json(events: &[EventEntry]) -> JsonValue {
    JsonValue::Array(events.iter().map(event_to_json).collect())
}

fn event_to_json(event: &EventEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".to_string(), JsonValue::String(event.name.clone()));
    m.insert(
        "type".to_string(),
        JsonValue::String(event.event_type.clone()),
    );
    m.insert(
        "location".to_string(),
        JsonValue::String(event.location.clone()),
    );
    m.insert(
        "items".to_string(),
        JsonValue::Array(event.items.iter().map(item_to_json).collect()),
    );
    JsonValue::Object(m)
}

fn item_to_json(item: &ItemEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".to_string(), JsonValue::String(item.name.clone()));
    m.insert("type".to_string(), JsonValue::String(item.kind.clone()));
    m.insert("coop".to_string(), JsonValue::Bool(item.coop));
    m.insert("notes".to_string(), JsonValue::String(item.notes.clone()));
    JsonValue::Object(m)
}

// Segments and prisms

/// Distinct segment names in use, then every valid name with `*` on those in use.
pub fn render_segments_text(listing: &SegmentListing) -> String {
    let in_use: BTreeSet<&str> = listing.current.iter().map(|s| s.name.as_str()).collect();
    let mut out = String::new();

    if in_use.is_empty() {
        out.push_str("No prism segments found\n");
    } else {
        let _ = writeln!(out, "Segments in current prisms ({}):", in_use.len());
        for name in &in_use {
            let _ = writeln!(out, "  {name}");
        }
    }

    let _ = writeln!(out, "\nAll valid segment names ({}):", listing.valid.len());
    for name in &listing.valid {
        let marker = if in_use.contains(name.as_str()) { " *" } else { "" };
        let _ = writeln!(out, "  {name}{marker}");
    }
    out
}

pub fn render_segments_json(listing: &SegmentListing) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert(
        "current".to_string(),
        JsonValue::Array(listing.current.iter().map(segment_to_json).collect()),
    );
    m.insert(
        "valid".to_string(),
        JsonValue::Array(
            listing
                .valid
                .iter()
                .map(|n| JsonValue::String(n.clone()))
                .collect(),
        ),
    );
    JsonValue::Object(m)
}

fn segment_to_json(segment: &SegmentEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("path".to_string(), JsonValue::String(segment.path.clone()));
    m.insert("name".to_string(), JsonValue::String(segment.name.clone()));
    m.insert(
        "level".to_string(),
        segment.level.map_or(JsonValue::Null, JsonValue::from),
    );
    JsonValue::Object(m)
}

pub fn render_replace_text(outcome: &ReplaceOutcome) -> String {
    format!(
        "Replaced {} segment(s): {} -> {}\n",
        outcome.replaced, outcome.from, outcome.to
    )
}

pub fn render_prisms_text(prisms: &[PrismSummary]) -> String {
    if prisms.is_empty() {
        return "No prisms found\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "Found {} prism(s):", prisms.len());
    for (i, prism) in prisms.iter().enumerate() {
        let _ = writeln!(out, "Prism {}:", i + 1);
        let _ = writeln!(out, "  Total Level: {}", prism.total_level);
        if let Some(exp) = prism.pending_experience {
            let _ = writeln!(out, "  Pending Experience: {exp:.0}");
        }
        if let Some(seed) = prism.current_seed {
            let _ = writeln!(out, "  Current Seed: {seed}");
        }
        if !prism.segments.is_empty() {
            let _ = writeln!(out, "  Segments ({}):", prism.segments.len());
            for segment in &prism.segments {
                match segment.level {
                    Some(level) if level > 0 => {
                        let _ = writeln!(out, "    {}: {level}", segment.name);
                    }
                    Some(_) => {}
                    None => {
                        let _ = writeln!(out, "    {}", segment.name);
                    }
                }
            }
        }
    }
    out
}

pub fn render_prisms_json(prisms: &[PrismSummary]) -> JsonValue {
    JsonValue::Array(
        prisms
            .iter()
            .map(|prism| {
                let mut m = JsonMap::new();
                m.insert("path".to_string(), JsonValue::String(prism.path.clone()));
                m.insert("total_level".to_string(), JsonValue::from(prism.total_level));
                m.insert(
                    "current_seed".to_string(),
                    prism.current_seed.map_or(JsonValue::Null, JsonValue::from),
                );
                m.insert(
                    "pending_experience".to_string(),
                    prism
                        .pending_experience
                        .map_or(JsonValue::Null, JsonValue::from),
                );
                m.insert(
                    "segments".to_string(),
                    JsonValue::Array(prism.segments.iter().map(segment_to_json).collect()),
                );
                JsonValue::Object(m)
            })
            .collect(),
    )
}

// Materials

pub fn render_materials_text(materials: &BTreeMap<String, i32>) -> String {
    if materials.is_empty() {
        return "No materials found\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "Found {} materials:", materials.len());
    for (name, quantity) in materials {
        let _ = writeln!(out, "  {name}: {quantity}");
    }
    out
}

pub fn render_materials_json(materials: &BTreeMap<String, i32>) -> JsonValue {
    JsonValue::Object(
        materials
            .iter()
            .map(|(name, quantity)| (name.clone(), JsonValue::from(*quantity)))
            .collect(),
    )
}

// Inspect

pub fn render_inspect_text(listing: &NodeListing) -> String {
    let mut out = String::new();
    let path = if listing.path.is_empty() {
        "<root>"
    } else {
        &listing.path
    };
    let _ = write!(out, "{path} ({})", listing.kind);
    if let Some(summary) = &listing.summary {
        let _ = write!(out, ": {summary}");
    }
    out.push('\n');
    for key in &listing.keys {
        let _ = writeln!(out, "  {key}");
    }
    out
}

pub fn render_inspect_json(listing: &NodeListing) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("path".to_string(), JsonValue::String(listing.path.clone()));
    m.insert("kind".to_string(), JsonValue::String(listing.kind.clone()));
    m.insert(
        "summary".to_string(),
        listing
            .summary
            .clone()
            .map_or(JsonValue::Null, JsonValue::String),
    );
    m.insert(
        "keys".to_string(),
        JsonValue::Array(
            listing
                .keys
                .iter()
                .map(|k| JsonValue::String(k.clone()))
                .collect(),
        ),
    );
    JsonValue::Object(m)
}
