//! `PersistenceBlob` struct bodies.
//!
//! In a profile save the blob is a nested SaveData. Everywhere else it is a
//! container of actor archives addressed through an index table:
//!
//! ```text
//! u32 version | i32 index_offset | i32 dynamic_offset
//! actor regions ...
//! u32 count, dynamic records ...          <- dynamic_offset
//! u32 count, (u64 id, i32 offset, i32 size) ...   <- index_offset
//! u32 count, u64 destroyed ids ...
//! ```

use tracing::{debug, warn};

use crate::cursor::{ByteReader, ByteWriter, FString};
use crate::error::{FormatError, FormatResult};

use super::names::{DecodeContext, EncodeContext};
use super::object::Payload;
use super::save_data::{SaveData, SaveHeaders};

pub const PROFILE_CLASS_PATH: &str = "/Game/_Core/Blueprints/Base/BP_RemnantSaveGameProfile";

const CONTAINER_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: [f64; 4],
    pub position: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    fn read(r: &mut ByteReader<'_>) -> FormatResult<Self> {
        let mut t = Self {
            rotation: [0.0; 4],
            position: [0.0; 3],
            scale: [0.0; 3],
        };
        for v in t
            .rotation
            .iter_mut()
            .chain(t.position.iter_mut())
            .chain(t.scale.iter_mut())
        {
            *v = r.read_f64()?;
        }
        Ok(t)
    }

    fn write(&self, w: &mut ByteWriter) {
        for v in self.rotation.iter().chain(&self.position).chain(&self.scale) {
            w.write_f64(*v);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub has_transform: u32,
    pub transform: Option<Transform>,
    pub archive: SaveData,
}

impl Actor {
    fn read(r: &mut ByteReader<'_>) -> FormatResult<Self> {
        let has_transform = r.read_u32()?;
        let transform = if has_transform != 0 {
            Some(Transform::read(r)?)
        } else {
            None
        };
        let archive = SaveData::read(r, SaveHeaders::ACTOR_ARCHIVE)?;
        Ok(Self {
            has_transform,
            transform,
            archive,
        })
    }

    fn write(&self, w: &mut ByteWriter) -> FormatResult<()> {
        w.write_u32(self.has_transform);
        if let Some(t) = &self.transform {
            t.write(w);
        }
        self.archive.write(w)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorEntry {
    pub id: u64,
    pub actor: Payload<Actor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicActor {
    pub id: u64,
    pub transform: Transform,
    pub class_path: FString,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceContainer {
    pub version: u32,
    /// In index-table order, which is also storage order.
    pub actors: Vec<ActorEntry>,
    pub dynamic: Vec<DynamicActor>,
    pub destroyed: Vec<u64>,
}

fn to_i32(value: usize) -> FormatResult<i32> {
    i32::try_from(value).map_err(|_| FormatError::LengthOverflow { length: value })
}

fn to_u32(value: usize) -> FormatResult<u32> {
    u32::try_from(value).map_err(|_| FormatError::LengthOverflow { length: value })
}

fn read_table_count(r: &mut ByteReader<'_>, min_element_size: usize) -> FormatResult<usize> {
    let offset = r.offset();
    let count = r.read_u32()? as usize;
    if count.saturating_mul(min_element_size) > r.remaining() {
        return Err(FormatError::TruncatedInput {
            offset,
            needed: count.saturating_mul(min_element_size),
            remaining: r.remaining(),
        });
    }
    Ok(count)
}

impl PersistenceContainer {
    pub fn actor(&self, id: u64) -> Option<&Actor> {
        self.actors
            .iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| entry.actor.parsed())
    }

    /// Decode a whole blob. Offsets are relative to the blob start.
    fn read(r: &mut ByteReader<'_>) -> FormatResult<Self> {
        let version = r.read_u32()?;
        let index_at = r.read_i32()?;
        let dynamic_at = r.read_i32()?;
        let (Ok(index_at), Ok(dynamic_at)) = (usize::try_from(index_at), usize::try_from(dynamic_at))
        else {
            return Err(FormatError::layout(r.offset(), "negative container offset"));
        };

        r.seek_to(index_at)?;
        let count = read_table_count(r, 16)?;
        let mut index = Vec::with_capacity(count);
        for _ in 0..count {
            index.push((r.read_u64()?, r.read_i32()?, r.read_i32()?));
        }
        let count = read_table_count(r, 8)?;
        let mut destroyed = Vec::with_capacity(count);
        for _ in 0..count {
            destroyed.push(r.read_u64()?);
        }
        if !r.at_end() {
            return Err(FormatError::layout(r.offset(), "bytes after destroyed list"));
        }

        let mut expected = CONTAINER_HEADER_LEN;
        let mut actors = Vec::with_capacity(index.len());
        for (id, offset, size) in index {
            let (Ok(offset), Ok(size)) = (usize::try_from(offset), usize::try_from(size)) else {
                return Err(FormatError::layout(r.offset(), format!("actor {id} has a negative extent")));
            };
            if offset != expected {
                return Err(FormatError::layout(
                    offset,
                    format!("actor {id} stored at {offset:#x}, expected {expected:#x}"),
                ));
            }
            r.seek_to(offset)?;
            let window = r.window(size)?;
            let actor = Payload::decode(window, "actor", Actor::read);
            actors.push(ActorEntry { id, actor });
            expected = offset + size;
        }
        if dynamic_at != expected {
            return Err(FormatError::layout(
                dynamic_at,
                format!("dynamic records at {dynamic_at:#x}, expected {expected:#x}"),
            ));
        }

        r.seek_to(dynamic_at)?;
        let count = read_table_count(r, 8 + 80 + 4)?;
        let mut dynamic = Vec::with_capacity(count);
        for _ in 0..count {
            dynamic.push(DynamicActor {
                id: r.read_u64()?,
                transform: Transform::read(r)?,
                class_path: r.read_fstring()?,
            });
        }
        if r.position() != index_at {
            return Err(FormatError::layout(r.offset(), "dynamic records do not end at the index"));
        }

        debug!(
            actors = actors.len(),
            dynamic = dynamic.len(),
            destroyed = destroyed.len(),
            "decoded persistence container"
        );
        Ok(Self {
            version,
            actors,
            dynamic,
            destroyed,
        })
    }

    fn write(&self, w: &mut ByteWriter) -> FormatResult<()> {
        let start = w.position();
        w.write_u32(self.version);
        let index_slot = w.reserve_u32();
        let dynamic_slot = w.reserve_u32();

        let mut index = Vec::with_capacity(self.actors.len());
        for entry in &self.actors {
            let mut actor_w = ByteWriter::new();
            entry.actor.encode(&mut actor_w, |actor, w| actor.write(w))?;
            let bytes = actor_w.into_bytes();
            index.push((entry.id, to_i32(w.position() - start)?, to_i32(bytes.len())?));
            w.write_bytes(&bytes);
        }

        let dynamic_at = to_i32(w.position() - start)?;
        w.write_u32(to_u32(self.dynamic.len())?);
        for record in &self.dynamic {
            w.write_u64(record.id);
            record.transform.write(w);
            w.write_fstring(&record.class_path)?;
        }

        let index_at = to_i32(w.position() - start)?;
        w.write_u32(to_u32(index.len())?);
        for (id, offset, size) in index {
            w.write_u64(id);
            w.write_i32(offset);
            w.write_i32(size);
        }
        w.write_u32(to_u32(self.destroyed.len())?);
        for id in &self.destroyed {
            w.write_u64(*id);
        }

        w.patch_i32(index_slot, index_at);
        w.patch_i32(dynamic_slot, dynamic_at);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceBlob {
    /// Nested profile SaveData (package version, no asset path).
    Save(SaveData),
    Container(PersistenceContainer),
    /// A blob whose content could not be decoded, or whose layout is not the
    /// one the encoder produces; kept verbatim.
    Opaque(Vec<u8>),
}

impl PersistenceBlob {
    pub(crate) fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Self> {
        let len = r.read_count(1)?;
        let window = r.window(len)?;
        let mut body = window.clone();
        let decoded = if ctx.class_path == Some(PROFILE_CLASS_PATH) {
            SaveData::read(&mut body, SaveHeaders::PROFILE_BLOB).and_then(|save| {
                if body.at_end() {
                    Ok(Self::Save(save))
                } else {
                    Err(FormatError::layout(body.offset(), "bytes after nested save data"))
                }
            })
        } else {
            PersistenceContainer::read(&mut body).map(Self::Container)
        };
        Ok(decoded.unwrap_or_else(|e| {
            warn!(
                offset = window.offset(),
                len = window.len(),
                error = %e,
                "keeping persistence blob as opaque bytes"
            );
            let mut raw = window;
            Self::Opaque(raw.read_rest().to_vec())
        }))
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, _ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        let bytes = self.to_bytes()?;
        w.write_count(bytes.len())?;
        w.write_bytes(&bytes);
        Ok(())
    }

    pub fn to_bytes(&self) -> FormatResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        match self {
            Self::Save(save) => save.write(&mut w)?,
            Self::Container(container) => container.write(&mut w)?,
            Self::Opaque(bytes) => w.write_bytes(bytes),
        }
        Ok(w.into_bytes())
    }
}
