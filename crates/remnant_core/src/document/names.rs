use std::collections::HashMap;
use std::fmt;

use crate::cursor::{ByteReader, ByteWriter, FString};
use crate::error::{FormatError, FormatResult};

const HAS_NUMBER: u16 = 0x8000;
const INDEX_MASK: u16 = 0x7FFF;

/// Reference into the enclosing names table.
///
/// `index` is where the name was found when decoded. Editing `name` is enough
/// to retarget the reference; the encoder resolves a fresh index when the old
/// one no longer spells `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FName {
    pub name: String,
    pub index: u16,
    pub number: Option<i32>,
}

impl FName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: INDEX_MASK,
            number: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_none(&self) -> bool {
        self.name == "None"
    }

    pub fn read(r: &mut ByteReader<'_>, names: &NameTable) -> FormatResult<Self> {
        let offset = r.offset();
        let raw = r.read_u16()?;
        let index = raw & INDEX_MASK;
        let name = names.get(index).ok_or(FormatError::NameIndex {
            offset,
            index,
            len: names.len(),
        })?;
        let number = if raw & HAS_NUMBER != 0 {
            Some(r.read_i32()?)
        } else {
            None
        };
        Ok(Self {
            name: name.to_string(),
            index,
            number,
        })
    }

    pub fn write(&self, w: &mut ByteWriter, names: &mut NameTable) -> FormatResult<()> {
        let index = if names.get(self.index) == Some(self.name.as_str()) {
            self.index
        } else {
            names.get_or_add(&self.name)?
        };
        match self.number {
            Some(number) => {
                w.write_u16(index | HAS_NUMBER);
                w.write_i32(number);
            }
            None => w.write_u16(index),
        }
        Ok(())
    }
}

impl fmt::Display for FName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "{}_{}", self.name, n),
            None => f.write_str(&self.name),
        }
    }
}

/// Names table of one SaveData. Entries keep their original string encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    entries: Vec<FString>,
    lookup: HashMap<String, u16>,
}

impl NameTable {
    pub fn from_entries(entries: Vec<FString>) -> Self {
        let mut lookup = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let Some(name) = entry.as_str() {
                lookup.entry(name.to_string()).or_insert(i as u16);
            }
        }
        Self { entries, lookup }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&str> {
        self.entries.get(usize::from(index)).and_then(FString::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(FString::as_str)
    }

    pub fn get_or_add(&mut self, name: &str) -> FormatResult<u16> {
        if let Some(index) = self.lookup.get(name) {
            return Ok(*index);
        }
        let index = u16::try_from(self.entries.len())
            .ok()
            .filter(|i| *i <= INDEX_MASK)
            .ok_or(FormatError::LengthOverflow {
                length: self.entries.len() + 1,
            })?;
        self.entries.push(FString::new(name));
        self.lookup.insert(name.to_string(), index);
        Ok(index)
    }

    pub fn read(r: &mut ByteReader<'_>) -> FormatResult<Self> {
        let count = r.read_count(4)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = r.offset();
            let entry = r.read_fstring()?;
            if entry.is_none() {
                return Err(FormatError::layout(offset, "null entry in names table"));
            }
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    pub fn write(&self, w: &mut ByteWriter) -> FormatResult<()> {
        w.write_count(self.entries.len())?;
        for entry in &self.entries {
            w.write_fstring(entry)?;
        }
        Ok(())
    }
}

/// Shared state while decoding one SaveData's objects.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub names: &'a NameTable,
    pub class_path: Option<&'a str>,
}

/// Shared state while encoding one SaveData's objects. New names are
/// appended to `names` and land in the table written afterwards.
#[derive(Debug)]
pub struct EncodeContext<'a> {
    pub names: &'a mut NameTable,
    pub class_path: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> NameTable {
        NameTable::from_entries(names.iter().map(|n| FString::new(*n)).collect())
    }

    #[test]
    fn unchanged_name_keeps_its_original_index() {
        // Duplicate spellings exist in real tables; the decoded index wins.
        let mut names = table(&["None", "Level", "Level"]);
        let fname = FName {
            name: "Level".into(),
            index: 2,
            number: None,
        };
        let mut w = ByteWriter::new();
        fname.write(&mut w, &mut names).unwrap();
        assert_eq!(w.into_bytes(), vec![2, 0]);
    }

    #[test]
    fn renamed_reference_appends_missing_name() {
        let mut names = table(&["None", "Level"]);
        let mut fname = FName {
            name: "Level".into(),
            index: 1,
            number: Some(7),
        };
        fname.name = "Brutality".into();
        let mut w = ByteWriter::new();
        fname.write(&mut w, &mut names).unwrap();
        assert_eq!(w.into_bytes(), vec![2, 0x80, 7, 0, 0, 0]);
        assert_eq!(names.get(2), Some("Brutality"));
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let names = table(&["None"]);
        let err = FName::read(&mut ByteReader::new(&[5, 0]), &names).unwrap_err();
        assert!(matches!(err, FormatError::NameIndex { index: 5, .. }));
    }
}
