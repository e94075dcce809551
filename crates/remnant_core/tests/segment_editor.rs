mod common;

use std::fs;

use remnant_core::core_api::{CoreErrorCode, Engine, Session};
use remnant_core::document::SaveDocument;
use remnant_core::layout;
use remnant_core::prism;

use common::{default_profile, profile_document, stream};

fn open_default() -> Session {
    Engine::new()
        .open_bytes(stream(&default_profile()))
        .expect("failed to open profile")
}

#[test]
fn lists_current_slots_and_valid_names() {
    let listing = open_default().segments();
    let names: Vec<&str> = listing.current.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        ["CriticalDamage", "HealthPercent", "Brutality", "CriticalDamage", "RangedDamage"]
    );
    assert_eq!(
        listing.current[1].path,
        "objects[0].ProfileData.objects[0].Prism.CurrentSegments[1].RowName"
    );
    assert_eq!(listing.current[1].level, Some(2));
    assert!(listing.valid.windows(2).all(|w| w[0] < w[1]));
    assert!(listing.valid.iter().any(|n| n == "WreckingBall"));
}

#[test]
fn replaces_every_matching_slot() {
    let mut session = open_default();
    let outcome = session
        .replace_segment("CriticalDamage", "HealthPercent")
        .expect("replacement succeeds");
    assert_eq!(outcome.replaced, 2);

    let reopened = Engine::new()
        .open_bytes(session.to_bytes().expect("failed to encode"))
        .expect("edited save reopens");
    let names: Vec<String> = reopened.segments().current.into_iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        ["HealthPercent", "HealthPercent", "Brutality", "HealthPercent", "RangedDamage"]
    );
}

#[test]
fn edit_touches_only_slot_indices_and_checksum() {
    let mut session = open_default();
    let before = session.to_stream().expect("failed to encode");
    session
        .replace_segment("Brutality", "RangedDamage")
        .expect("replacement succeeds");
    let after = session.to_stream().expect("failed to encode");
    assert_eq!(before.len(), after.len());

    let ranges = session.changed_ranges().expect("failed to diff");
    let outside_crc: Vec<_> = ranges.iter().filter(|r| r.start >= 4).collect();
    assert_eq!(outside_crc.len(), 1, "{ranges:?}");
    assert!(outside_crc[0].len() <= 2);

    let doc = SaveDocument::decode(&after).expect("edited stream decodes");
    let slots = prism::segment_slots(&doc.save);
    assert_eq!(slots[2].name, "RangedDamage");
    assert_eq!(slots[2].level, Some(1));
}

#[test]
fn new_name_is_appended_and_document_stays_consistent() {
    let mut session = open_default();
    session
        .replace_segment("HealthPercent", "WreckingBall")
        .expect("replacement succeeds");
    let after = session.to_stream().expect("failed to encode");
    let doc = SaveDocument::decode(&after).expect("edited stream decodes");
    assert_eq!(doc.encode().expect("failed to re-encode"), after);
    assert_eq!(prism::segment_slots(&doc.save)[1].name, "WreckingBall");
    assert!(layout::changed_len(&session.changed_ranges().expect("failed to diff")) > 2);
}

#[test]
fn invalid_replacement_is_rejected_before_any_change() {
    let mut session = open_default();
    let before = session.to_stream().expect("failed to encode");
    let err = session
        .replace_segment("CriticalDamage", "NotASegment")
        .expect_err("unknown name must be rejected");
    assert_eq!(err.code, CoreErrorCode::UnknownSegmentName);
    assert_eq!(session.to_stream().expect("failed to encode"), before);
}

#[test]
fn absent_source_is_reported_distinctly() {
    let mut session = open_default();
    let err = session
        .replace_segment("Gigantic", "Brutality")
        .expect_err("no slot holds Gigantic");
    assert_eq!(err.code, CoreErrorCode::SegmentNotFound);
}

#[test]
fn rejected_edits_write_nothing() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let target = dir.path().join("profile.sav");
    let mut session = open_default();
    for (from, to) in [("CriticalDamage", "Nope"), ("Gigantic", "Brutality")] {
        if session.replace_segment(from, to).is_ok() {
            session.save_to(&target).expect("failed to write");
        }
    }
    assert!(!target.exists());
}

#[test]
fn writing_over_the_input_keeps_a_backup() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let target = dir.path().join("profile.sav");
    let original = stream(&default_profile());
    fs::write(&target, &original).expect("failed to write fixture");

    let mut session = Engine::new().open_path(&target).expect("failed to open");
    session
        .replace_segment("CriticalDamage", "Brutality")
        .expect("replacement succeeds");
    let backup = session
        .save_to(&target)
        .expect("failed to write")
        .expect("existing target is backed up");

    assert_eq!(fs::read(&backup).expect("backup readable"), original);
    assert_ne!(fs::read(&target).expect("target readable"), original);
    assert!(backup.to_string_lossy().ends_with(".bak1"));
}

#[test]
fn prism_summary_reports_seed_experience_and_levels() {
    let session = Engine::new()
        .open_bytes(stream(&profile_document(
            &[("Spectrum", 5), ("CastSpeed", 3)],
            &[],
        )))
        .expect("failed to open profile");
    let prisms = session.prisms();
    assert_eq!(prisms.len(), 2);
    assert_eq!(prisms[0].current_seed, Some(4242));
    assert_eq!(prisms[0].pending_experience, Some(12.5));
    assert_eq!(prisms[0].total_level, 8);
    assert!(prisms[1].segments.is_empty());
    assert_eq!(prisms[1].total_level, 0);
}

#[test]
fn materials_resolve_direct_and_instance_quantities() {
    let materials = open_default().materials();
    let entries: Vec<(&str, i32)> = materials.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(entries, [("LumeniteCrystal", 7), ("Scraps", 1250)]);
}
