use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backup;
use crate::compression;
use crate::document::path as doc_path;
use crate::document::{NodeRef, PathAddress, PersistenceBlob, SaveDocument, Value};
use crate::error::FormatError;
use crate::layout::{self, ByteRange};
use crate::materials;
use crate::prism::{self, SegmentSlot};
use crate::world::{Mode, WorldAnalyzer};

use super::error::{CoreError, CoreErrorCode};
use super::types::{
    EventEntry, ItemEntry, NodeListing, PrismSummary, ReplaceOutcome, SegmentEntry, SegmentListing,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// One decoded save and the stream it was decoded from.
#[derive(Debug)]
pub struct Session {
    document: SaveDocument,
    compressed: bool,
    original: Vec<u8>,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Decode a save, compressed or not.
    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        let parse_error =
            |e: FormatError| CoreError::new(CoreErrorCode::of_format(&e), format!("failed to parse save: {e}"));
        let compressed = compression::is_compressed(bytes);
        let original = if compressed {
            compression::decompress(bytes).map_err(parse_error)?
        } else {
            bytes.to_vec()
        };
        let document = SaveDocument::decode(&original).map_err(parse_error)?;
        debug!(compressed, bytes = original.len(), "opened save");
        Ok(Session {
            document,
            compressed,
            original,
        })
    }

    pub fn open_path(&self, path: &Path) -> Result<Session, CoreError> {
        let bytes = std::fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        self.open_bytes(bytes)
    }
}

fn segment_entry(slot: SegmentSlot) -> SegmentEntry {
    SegmentEntry {
        path: slot.path.to_string(),
        name: slot.name,
        level: slot.level,
    }
}

fn parse_path(path: &str) -> Result<PathAddress, CoreError> {
    path.parse().map_err(|e| {
        CoreError::new(
            CoreErrorCode::PathNotFound,
            format!("failed to parse path: {e}"),
        )
    })
}

fn summarize_value(value: &Value) -> String {
    match value {
        Value::Empty => "empty".to_string(),
        Value::Int8(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::UInt16(v) => v.to_string(),
        Value::UInt32(v) => v.to_string(),
        Value::UInt64(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Byte(v) => v.to_string(),
        Value::Str(s) => format!("\"{s}\""),
        Value::Name(name) => name.to_string(),
        Value::Object(index) => format!("object #{index}"),
        Value::Guid(guid) => guid.to_string(),
        Value::Vector(v) | Value::Rotator(v) => format!("({}, {}, {})", v[0], v[1], v[2]),
        Value::DateTime(ticks) | Value::Timespan(ticks) => format!("{ticks} ticks"),
        Value::Text(_) => "text".to_string(),
        Value::Struct(bag) => format!("struct with {} properties", bag.len()),
        Value::Blob(blob) => match blob.as_ref() {
            PersistenceBlob::Save(save) => format!("save data with {} objects", save.objects.len()),
            PersistenceBlob::Container(c) => format!("persistence container with {} actors", c.actors.len()),
            PersistenceBlob::Opaque(bytes) => format!("{} opaque bytes", bytes.len()),
        },
        Value::Array(_) | Value::StructArray(_) | Value::Set(_) | Value::Map(_) => {
            format!("{} elements", value.element_count().unwrap_or_default())
        }
        Value::Opaque(bytes) => format!("{} opaque bytes", bytes.len()),
    }
}

fn summarize(node: NodeRef<'_>) -> Option<String> {
    match node {
        NodeRef::Property(p) => Some(match p.bool_value() {
            Some(b) => b.to_string(),
            None => summarize_value(&p.value),
        }),
        NodeRef::Value(v) => Some(summarize_value(v)),
        NodeRef::Object(o) => Some(o.path().to_string()),
        NodeRef::Component(c) => Some(c.key().to_string()),
        NodeRef::Variable(v) => Some(format!("{:?}", v.value)),
        NodeRef::Opaque(bytes) => Some(format!("{} opaque bytes", bytes.len())),
        _ => None,
    }
}

impl Session {
    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    /// Whether the input was in the compressed container.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn segments(&self) -> SegmentListing {
        SegmentListing {
            current: prism::segment_slots(&self.document.save)
                .into_iter()
                .map(segment_entry)
                .collect(),
            valid: prism::valid_segments().into_iter().map(str::to_string).collect(),
        }
    }

    pub fn prisms(&self) -> Vec<PrismSummary> {
        prism::prisms(&self.document.save)
            .into_iter()
            .map(|p| PrismSummary {
                path: p.path.to_string(),
                total_level: p.total_level(),
                current_seed: p.current_seed,
                pending_experience: p.pending_experience,
                segments: p.segments.into_iter().map(segment_entry).collect(),
            })
            .collect()
    }

    pub fn replace_segment(&mut self, from: &str, to: &str) -> Result<ReplaceOutcome, CoreError> {
        let replaced = prism::replace_segment(&mut self.document, from, to).map_err(|e| {
            CoreError::new(
                CoreErrorCode::of_segment(&e),
                format!("failed to replace segment: {e}"),
            )
        })?;
        Ok(ReplaceOutcome {
            from: from.to_string(),
            to: to.to_string(),
            replaced,
        })
    }

    pub fn materials(&self) -> BTreeMap<String, i32> {
        materials::find_materials(&self.document.save)
    }

    pub fn analyze(&self, mode: Mode, include_items: bool) -> Result<Vec<EventEntry>, CoreError> {
        let analyzer = WorldAnalyzer::new().map_err(|e| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("failed to build world patterns: {e}"),
            )
        })?;
        let events = analyzer.analyze(&self.document.save, mode);
        Ok(events
            .iter()
            .map(|event| EventEntry {
                world: event.world().to_string(),
                name: analyzer.display_name(event),
                event_type: event.event_type.clone(),
                location: event.location(),
                raw_id: event.name.clone(),
                known: event.is_known(),
                items: if include_items {
                    analyzer
                        .items(event)
                        .into_iter()
                        .map(|item| ItemEntry {
                            name: item.name,
                            kind: item.kind.to_string(),
                            coop: item.coop,
                            notes: item.notes,
                        })
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect())
    }

    /// Child keys and a short summary of the node at `path` (the root when empty).
    pub fn inspect(&self, path: &str) -> Result<NodeListing, CoreError> {
        let address = if path.is_empty() {
            PathAddress::root()
        } else {
            parse_path(path)?
        };
        let node = self.document.find(&address).map_err(|e| {
            CoreError::new(
                CoreErrorCode::PathNotFound,
                format!("failed to resolve path: {e}"),
            )
        })?;
        Ok(NodeListing {
            path: address.to_string(),
            kind: node.kind().to_string(),
            summary: summarize(node),
            keys: doc_path::list_keys(node),
        })
    }

    /// The decompressed stream for the current document.
    pub fn to_stream(&self) -> Result<Vec<u8>, CoreError> {
        self.document.encode().map_err(|e| {
            CoreError::new(
                CoreErrorCode::of_format(&e),
                format!("failed to encode save: {e}"),
            )
        })
    }

    /// The current document in the input's on-disk representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        self.document.to_file_bytes(self.compressed).map_err(|e| {
            CoreError::new(
                CoreErrorCode::of_format(&e),
                format!("failed to encode save: {e}"),
            )
        })
    }

    /// Byte ranges of the decompressed stream that differ from the input.
    pub fn changed_ranges(&self) -> Result<Vec<ByteRange>, CoreError> {
        Ok(layout::diff_ranges(&self.original, &self.to_stream()?))
    }

    /// Encode and write atomically, backing up an existing target first.
    /// Returns the backup path, if one was made.
    pub fn save_to(&self, target: &Path) -> Result<Option<PathBuf>, CoreError> {
        let bytes = self.to_bytes()?;
        backup::write_with_backup(target, &bytes).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to write {}: {e}", target.display()),
            )
        })
    }
}
