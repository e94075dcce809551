//! In-memory save document.
//!
//! The tree is a plain owned value: [`SaveDocument`] owns the top-level
//! [`SaveData`], which owns its objects, their property bags and any nested
//! persistence blobs. Encoding walks the same tree in the same order it was
//! decoded, so an untouched document re-encodes to its input bytes.

pub mod names;
pub mod object;
pub mod path;
pub mod persistence;
pub mod property;
pub mod save_data;
pub mod walk;

use tracing::{debug, warn};

use crate::compression;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{FormatError, FormatResult};

pub use names::{FName, NameTable};
pub use object::{Component, ComponentBody, Payload, UObject, Variable, VariableValue, Variables};
pub use path::{NodeMut, NodeRef, PathAddress, PathError, PathStep};
pub use persistence::{Actor, ActorEntry, PersistenceBlob, PersistenceContainer};
pub use property::{Property, PropertyBag, PropertyKind, PropertyTag, StructArray, Value};
pub use save_data::{SaveData, SaveHeaders};

pub const FILE_HEADER_LEN: usize = 16;

/// First 16 bytes of the decompressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub crc: u32,
    pub size: i32,
    pub version: i32,
    pub build: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveDocument {
    pub header: FileHeader,
    pub save: SaveData,
    /// Bytes after the top-level SaveData.
    pub trailer: Vec<u8>,
    crc_valid: bool,
    size_bias: i64,
}

impl SaveDocument {
    /// A fresh document; the checksum and size are computed on encode.
    pub fn new(version: i32, build: i32, save: SaveData) -> Self {
        Self {
            header: FileHeader {
                crc: 0,
                size: 0,
                version,
                build,
            },
            save,
            trailer: Vec::new(),
            crc_valid: true,
            size_bias: 0,
        }
    }

    pub fn crc_valid(&self) -> bool {
        self.crc_valid
    }

    /// Decode a decompressed stream.
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        let mut r = ByteReader::new(data);
        let header = FileHeader {
            crc: r.read_u32()?,
            size: r.read_i32()?,
            version: r.read_i32()?,
            build: r.read_i32()?,
        };
        let crc_valid = compression::crc32(data) == header.crc;
        if !crc_valid {
            warn!(stored = header.crc, "stored checksum does not match; it will be echoed unchanged");
        }

        let save = SaveData::read(&mut r, SaveHeaders::TOP_LEVEL)?;
        let trailer = r.read_rest().to_vec();
        debug!(
            bytes = data.len(),
            objects = save.objects.len(),
            trailer = trailer.len(),
            "decoded document"
        );
        Ok(Self {
            header,
            save,
            trailer,
            crc_valid,
            size_bias: i64::from(header.size) - data.len() as i64,
        })
    }

    /// Encode to a decompressed stream.
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.write_u32(self.header.crc);
        w.write_i32(self.header.size);
        w.write_i32(self.header.version);
        w.write_i32(self.header.build);
        self.save.write(&mut w)?;
        w.write_bytes(&self.trailer);
        let mut data = w.into_bytes();

        let length = data.len();
        let size = i32::try_from(length as i64 + self.size_bias)
            .map_err(|_| FormatError::LengthOverflow { length })?;
        data[4..8].copy_from_slice(&size.to_le_bytes());
        let crc = if self.crc_valid {
            compression::crc32(&data)
        } else {
            self.header.crc
        };
        data[0..4].copy_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    /// Decode either on-disk representation. The flag reports whether the
    /// input was compressed.
    pub fn from_file_bytes(bytes: &[u8]) -> FormatResult<(Self, bool)> {
        if compression::is_compressed(bytes) {
            let data = compression::decompress(bytes)?;
            Ok((Self::decode(&data)?, true))
        } else {
            Ok((Self::decode(bytes)?, false))
        }
    }

    pub fn to_file_bytes(&self, compressed: bool) -> FormatResult<Vec<u8>> {
        let data = self.encode()?;
        if compressed {
            compression::compress(&data)
        } else {
            Ok(data)
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::Save(&self.save)
    }

    pub fn root_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Save(&mut self.save)
    }

    pub fn find(&self, path: &PathAddress) -> Result<NodeRef<'_>, PathError> {
        path::find(self.root(), path)
    }

    pub fn find_mut(&mut self, path: &PathAddress) -> Result<NodeMut<'_>, PathError> {
        path::find_mut(self.root_mut(), path)
    }
}
