use tracing::debug;

use crate::cursor::{ByteReader, ByteWriter, FString};
use crate::error::{FormatError, FormatResult};

use super::names::{DecodeContext, EncodeContext, NameTable};
use super::object::UObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageVersion {
    pub ue_version: i32,
    pub licensee_version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelAssetPath {
    pub package: FString,
    pub asset: FString,
}

/// Which optional headers precede the offset block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveHeaders {
    pub package_version: bool,
    pub asset_path: bool,
}

impl SaveHeaders {
    pub const TOP_LEVEL: Self = Self {
        package_version: true,
        asset_path: true,
    };
    pub const PROFILE_BLOB: Self = Self {
        package_version: true,
        asset_path: false,
    };
    pub const ACTOR_ARCHIVE: Self = Self {
        package_version: false,
        asset_path: false,
    };
}

/// Names table, objects table and object data of one archive.
///
/// Offsets in the stored offset block are relative to the start of the
/// reader the SaveData is decoded from. Only the canonical layout (data,
/// then objects table, then names table, back to back) is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveData {
    pub package_version: Option<PackageVersion>,
    pub asset_path: Option<TopLevelAssetPath>,
    pub version: u32,
    pub objects: Vec<UObject>,
    pub names: NameTable,
}

fn stored_offset(offset: usize, value: i64) -> FormatResult<usize> {
    usize::try_from(value)
        .map_err(|_| FormatError::layout(offset, format!("negative table offset {value}")))
}

impl SaveData {
    pub fn class_path(&self) -> Option<&str> {
        self.asset_path.as_ref().and_then(|p| p.package.as_str())
    }

    pub fn read(r: &mut ByteReader<'_>, headers: SaveHeaders) -> FormatResult<Self> {
        let package_version = if headers.package_version {
            Some(PackageVersion {
                ue_version: r.read_i32()?,
                licensee_version: r.read_i32()?,
            })
        } else {
            None
        };
        let asset_path = if headers.asset_path {
            Some(TopLevelAssetPath {
                package: r.read_fstring()?,
                asset: r.read_fstring()?,
            })
        } else {
            None
        };

        let offsets_at = r.offset();
        let names_at = stored_offset(offsets_at, r.read_i64()?)?;
        let version = r.read_u32()?;
        let objects_at = stored_offset(offsets_at, r.read_i64()?)?;
        let data_at = r.position();
        if !(data_at <= objects_at && objects_at <= names_at) {
            return Err(FormatError::layout(
                offsets_at,
                format!("tables out of order: data {data_at:#x}, objects {objects_at:#x}, names {names_at:#x}"),
            ));
        }

        r.seek_to(names_at)?;
        let names = NameTable::read(r)?;
        let end = r.position();

        let class_path = asset_path.as_ref().and_then(|p| p.package.as_str());
        let ctx = DecodeContext {
            names: &names,
            class_path,
        };

        r.seek_to(objects_at)?;
        let count = r.read_count(1)?;
        let mut objects = Vec::with_capacity(count);
        for index in 0..count {
            objects.push(UObject::read_header(r, &ctx, index)?);
        }
        if r.position() != names_at {
            return Err(FormatError::layout(
                r.offset(),
                "objects table does not end at the names table",
            ));
        }

        r.seek_to(data_at)?;
        for object in &mut objects {
            object.read_data(r, &ctx)?;
        }
        if r.position() != objects_at {
            return Err(FormatError::layout(
                r.offset(),
                "object data does not end at the objects table",
            ));
        }

        r.seek_to(end)?;
        debug!(objects = objects.len(), names = names.len(), "decoded save data");
        Ok(Self {
            package_version,
            asset_path,
            version,
            objects,
            names,
        })
    }

    /// Encode at the writer's current position. Names first referenced
    /// during encoding are appended to the written table only.
    pub fn write(&self, w: &mut ByteWriter) -> FormatResult<()> {
        if let Some(pv) = &self.package_version {
            w.write_i32(pv.ue_version);
            w.write_i32(pv.licensee_version);
        }
        if let Some(path) = &self.asset_path {
            w.write_fstring(&path.package)?;
            w.write_fstring(&path.asset)?;
        }

        let names_slot = w.reserve_u64();
        w.write_u32(self.version);
        let objects_slot = w.reserve_u64();

        let mut names = self.names.clone();
        let mut ctx = EncodeContext {
            names: &mut names,
            class_path: self.class_path(),
        };
        for object in &self.objects {
            object.write_data(w, &mut ctx)?;
        }

        let objects_at = w.position();
        w.write_count(self.objects.len())?;
        for object in &self.objects {
            object.write_header(w, &mut ctx)?;
        }

        let names_at = w.position();
        names.write(w)?;

        w.patch_i64(names_slot, names_at as i64);
        w.patch_i64(objects_slot, objects_at as i64);
        Ok(())
    }

    pub fn to_bytes(&self) -> FormatResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.write(&mut w)?;
        Ok(w.into_bytes())
    }
}
