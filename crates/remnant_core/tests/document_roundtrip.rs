mod common;

use remnant_core::compression;
use remnant_core::core_api::{CoreErrorCode, Engine};
use remnant_core::document::{PersistenceBlob, SaveDocument, Value};

use common::{CAMPAIGN_END, CAMPAIGN_START, default_profile, quest, stream, world_document};

fn world_quests() -> Vec<String> {
    vec![
        CAMPAIGN_START.to_string(),
        quest("World_Jungle", "Boss", "Ravager"),
        CAMPAIGN_END.to_string(),
    ]
}

#[test]
fn profile_stream_roundtrips_exactly() {
    let bytes = stream(&default_profile());
    let doc = SaveDocument::decode(&bytes).expect("failed to decode profile");
    assert!(doc.crc_valid());
    assert_eq!(doc.encode().expect("failed to encode profile"), bytes);
}

#[test]
fn world_stream_roundtrips_exactly() {
    let bytes = stream(&world_document(&world_quests()));
    let doc = SaveDocument::decode(&bytes).expect("failed to decode world");
    assert_eq!(doc.encode().expect("failed to encode world"), bytes);
}

#[test]
fn nested_structures_decode_to_their_shapes() {
    let bytes = stream(&world_document(&world_quests()));
    let doc = SaveDocument::decode(&bytes).expect("failed to decode world");

    let root = doc.save.objects[0].bag().expect("root has properties");
    let Some(Value::Blob(blob)) = root.value("ActorData") else {
        panic!("ActorData is not a blob");
    };
    let PersistenceBlob::Container(container) = blob.as_ref() else {
        panic!("ActorData is not a container");
    };
    assert_eq!(container.actors.len(), 1);
    assert_eq!(container.dynamic.len(), 1);
    assert_eq!(container.destroyed, [5, 6]);
    let actor = container.actor(17).expect("actor 17 decoded");
    assert_eq!(actor.archive.objects[0].bag().and_then(|b| b.value("Level")).and_then(Value::as_int), Some(3));

    let quest_state = &doc.save.objects[1];
    assert_eq!(quest_state.components.len(), 2);
    let vars = quest_state.components[0].variables().expect("variables component");
    assert!(vars.get("Completed").is_some());
    assert!(quest_state.components[1].properties().is_some());
}

#[test]
fn unknown_struct_bytes_survive_as_opaque() {
    let bytes = stream(&world_document(&world_quests()));
    let doc = SaveDocument::decode(&bytes).expect("failed to decode world");
    let root = doc.save.objects[0].bag().expect("root has properties");
    assert_eq!(
        root.value("Unknown"),
        Some(&Value::Opaque(vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01]))
    );
    assert_eq!(doc.encode().expect("failed to encode world"), bytes);
}

#[test]
fn damaged_nested_region_is_contained() {
    let mut bytes = stream(&default_profile());
    // Corrupt the player's name inside the nested profile blob.
    let needle = b"Traveler";
    let at = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("player name present");
    bytes[at - 4..at].copy_from_slice(&0x7FFF_i32.to_le_bytes());

    let doc = SaveDocument::decode(&bytes).expect("damage is contained below the document");
    assert_eq!(doc.encode().expect("failed to encode damaged profile"), bytes);
}

#[test]
fn stale_checksum_is_echoed() {
    let mut bytes = stream(&default_profile());
    bytes[0] ^= 0x55;
    let doc = SaveDocument::decode(&bytes).expect("failed to decode profile");
    assert!(!doc.crc_valid());
    assert_eq!(doc.encode().expect("failed to encode profile"), bytes);
}

#[test]
fn compressed_input_roundtrips_through_the_container() {
    let raw = stream(&default_profile());
    let packed = compression::compress(&raw).expect("failed to compress");

    let session = Engine::new().open_bytes(&packed).expect("failed to open compressed save");
    assert!(session.is_compressed());
    assert_eq!(session.to_stream().expect("failed to encode"), raw);
    let again = session.to_bytes().expect("failed to emit compressed bytes");
    assert_eq!(compression::decompress(&again).expect("failed to decompress"), raw);
}

#[test]
fn truncated_stream_is_a_file_level_error() {
    let bytes = stream(&default_profile());
    let err = Engine::new()
        .open_bytes(&bytes[..40])
        .expect_err("truncated save must not open");
    assert_eq!(err.code, CoreErrorCode::TruncatedInput);
}
