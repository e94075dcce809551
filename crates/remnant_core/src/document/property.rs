//! Typed property bags.
//!
//! A bag is a run of `(name, type, size, array_index, tag, body)` records
//! closed by a property named `None`. Every body sits in a window of exactly
//! `size` bytes; a body that cannot be decoded to the last byte of its window
//! is kept verbatim as [`Value::Opaque`] while its tag stays decoded.

use tracing::{trace, warn};

use crate::cursor::{ByteReader, ByteWriter, FString, Guid};
use crate::error::{FormatError, FormatResult};

use super::names::{DecodeContext, EncodeContext, FName};
use super::persistence::PersistenceBlob;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Int8,
    Int16,
    Int,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    Byte,
    Enum,
    Str,
    Name,
    Text,
    Object,
    SoftObject,
    SoftClass,
    Struct,
    Array,
    Set,
    Map,
    Unknown,
}

impl PropertyKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Int8Property" => Self::Int8,
            "Int16Property" => Self::Int16,
            "IntProperty" => Self::Int,
            "Int64Property" => Self::Int64,
            "UInt16Property" => Self::UInt16,
            "UInt32Property" => Self::UInt32,
            "UInt64Property" => Self::UInt64,
            "FloatProperty" => Self::Float,
            "DoubleProperty" => Self::Double,
            "BoolProperty" => Self::Bool,
            "ByteProperty" => Self::Byte,
            "EnumProperty" => Self::Enum,
            "StrProperty" => Self::Str,
            "NameProperty" => Self::Name,
            "TextProperty" => Self::Text,
            "ObjectProperty" => Self::Object,
            "SoftObjectProperty" => Self::SoftObject,
            "SoftClassProperty" | "SoftClassPath" => Self::SoftClass,
            "StructProperty" => Self::Struct,
            "ArrayProperty" => Self::Array,
            "SetProperty" => Self::Set,
            "MapProperty" => Self::Map,
            _ => Self::Unknown,
        }
    }
}

/// Type-specific header bytes between `array_index` and the sized body.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyTag {
    Simple { guid_flag: u8 },
    Bool { value: u8, guid_flag: u8 },
    Byte { enum_name: FName, guid_flag: u8 },
    Enum { enum_type: FName, guid_flag: u8 },
    Struct {
        struct_type: FName,
        guid: Guid,
        guid_flag: u8,
    },
    Array { element_type: FName, guid_flag: u8 },
    Set { element_type: FName, guid_flag: u8 },
    Map {
        key_type: FName,
        value_type: FName,
        guid_flag: u8,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextHistory {
    Base {
        namespace: FString,
        key: FString,
        source: FString,
    },
    None {
        flag: u32,
        culture_invariant: Option<FString>,
    },
    Other { kind: i8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub flags: u32,
    pub history: TextHistory,
}

/// Inner header and items of an array whose elements are structs.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub inner_name: FName,
    pub inner_type: FName,
    pub inner_size: u32,
    pub inner_index: u32,
    pub struct_type: FName,
    pub guid: Guid,
    pub guid_flag: u8,
    pub items: Vec<Value>,
}

/// Decoded body of a property, a struct, or a container element.
///
/// Encoding is driven by the variant alone, so a value written back always
/// produces the shape it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Body of a Bool property; its value lives in the tag.
    Empty,
    Int8(i8),
    Int16(i16),
    Int(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Byte(u8),
    Str(FString),
    Name(FName),
    Object(i32),
    Text(Text),
    Guid(Guid),
    Vector([f64; 3]),
    Rotator([f64; 3]),
    DateTime(i64),
    Timespan(i64),
    Struct(PropertyBag),
    Blob(Box<PersistenceBlob>),
    Array(Vec<Value>),
    StructArray(Box<StructArray>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Opaque(Vec<u8>),
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<i32> {
        match self {
            Self::Object(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&FName> {
        match self {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&PropertyBag> {
        match self {
            Self::Struct(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn as_bag_mut(&mut self) -> Option<&mut PropertyBag> {
        match self {
            Self::Struct(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    /// Number of addressable elements for container values.
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Self::Array(items) | Self::Set(items) => Some(items.len()),
            Self::StructArray(array) => Some(array.items.len()),
            Self::Map(pairs) => Some(pairs.len()),
            _ => None,
        }
    }

    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Array(items) | Self::Set(items) => items.get(index),
            Self::StructArray(array) => array.items.get(index),
            Self::Map(pairs) => pairs.get(index).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Self::Array(items) | Self::Set(items) => items.get_mut(index),
            Self::StructArray(array) => array.items.get_mut(index),
            Self::Map(pairs) => pairs.get_mut(index).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        match self {
            Self::Empty => {}
            Self::Int8(v) => w.write_i8(*v),
            Self::Int16(v) => w.write_i16(*v),
            Self::Int(v) => w.write_i32(*v),
            Self::Int64(v) => w.write_i64(*v),
            Self::UInt16(v) => w.write_u16(*v),
            Self::UInt32(v) => w.write_u32(*v),
            Self::UInt64(v) => w.write_u64(*v),
            Self::Float(v) => w.write_f32(*v),
            Self::Double(v) => w.write_f64(*v),
            Self::Bool(v) => w.write_bool(*v),
            Self::Byte(v) => w.write_u8(*v),
            Self::Str(s) => w.write_fstring(s)?,
            Self::Name(n) => n.write(w, ctx.names)?,
            Self::Object(v) => w.write_i32(*v),
            Self::Text(text) => write_text(w, text)?,
            Self::Guid(g) => w.write_guid(g),
            Self::Vector(v) | Self::Rotator(v) => {
                for c in v {
                    w.write_f64(*c);
                }
            }
            Self::DateTime(ticks) | Self::Timespan(ticks) => w.write_i64(*ticks),
            Self::Struct(bag) => bag.write(w, ctx)?,
            Self::Blob(blob) => blob.write(w, ctx)?,
            Self::Array(items) => {
                w.write_count(items.len())?;
                for item in items {
                    item.write(w, ctx)?;
                }
            }
            Self::StructArray(array) => write_struct_array(w, array, ctx)?,
            Self::Set(items) => {
                w.write_i32(0);
                w.write_count(items.len())?;
                for item in items {
                    item.write(w, ctx)?;
                }
            }
            Self::Map(pairs) => {
                w.write_i32(0);
                w.write_count(pairs.len())?;
                for (key, value) in pairs {
                    key.write(w, ctx)?;
                    value.write(w, ctx)?;
                }
            }
            Self::Opaque(bytes) => w.write_bytes(bytes),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: FName,
    pub type_name: FName,
    /// Size as declared in the input; recomputed on every encode.
    pub size: u32,
    pub array_index: u32,
    pub tag: PropertyTag,
    pub value: Value,
}

impl Property {
    fn simple(name: &str, type_name: &str, value: Value) -> Self {
        Self {
            name: FName::new(name),
            type_name: FName::new(type_name),
            size: 0,
            array_index: 0,
            tag: PropertyTag::Simple { guid_flag: 0 },
            value,
        }
    }

    pub fn int(name: &str, value: i32) -> Self {
        Self::simple(name, "IntProperty", Value::Int(value))
    }

    pub fn float(name: &str, value: f32) -> Self {
        Self::simple(name, "FloatProperty", Value::Float(value))
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self::simple(name, "StrProperty", Value::Str(FString::new(value)))
    }

    pub fn name(name: &str, value: &str) -> Self {
        Self::simple(name, "NameProperty", Value::Name(FName::new(value)))
    }

    pub fn object(name: &str, index: i32) -> Self {
        Self::simple(name, "ObjectProperty", Value::Object(index))
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self {
            tag: PropertyTag::Bool {
                value: u8::from(value),
                guid_flag: 0,
            },
            ..Self::simple(name, "BoolProperty", Value::Empty)
        }
    }

    pub fn structure(name: &str, struct_type: &str, value: Value) -> Self {
        Self {
            tag: PropertyTag::Struct {
                struct_type: FName::new(struct_type),
                guid: Guid::default(),
                guid_flag: 0,
            },
            ..Self::simple(name, "StructProperty", value)
        }
    }

    pub fn struct_array(name: &str, struct_type: &str, items: Vec<Value>) -> Self {
        let array = StructArray {
            inner_name: FName::new(name),
            inner_type: FName::new("StructProperty"),
            inner_size: 0,
            inner_index: 0,
            struct_type: FName::new(struct_type),
            guid: Guid::default(),
            guid_flag: 0,
            items,
        };
        Self {
            tag: PropertyTag::Array {
                element_type: FName::new("StructProperty"),
                guid_flag: 0,
            },
            ..Self::simple(name, "ArrayProperty", Value::StructArray(Box::new(array)))
        }
    }

    pub fn array(name: &str, element_type: &str, items: Vec<Value>) -> Self {
        Self {
            tag: PropertyTag::Array {
                element_type: FName::new(element_type),
                guid_flag: 0,
            },
            ..Self::simple(name, "ArrayProperty", Value::Array(items))
        }
    }

    pub fn kind(&self) -> PropertyKind {
        PropertyKind::from_type_name(self.type_name.as_str())
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.tag {
            PropertyTag::Bool { value, .. } => Some(value != 0),
            _ => None,
        }
    }

    pub fn struct_type(&self) -> Option<&str> {
        match &self.tag {
            PropertyTag::Struct { struct_type, .. } => Some(struct_type.as_str()),
            _ => None,
        }
    }

    fn read_tag(
        r: &mut ByteReader<'_>,
        kind: PropertyKind,
        ctx: &DecodeContext<'_>,
    ) -> FormatResult<PropertyTag> {
        let names = ctx.names;
        Ok(match kind {
            PropertyKind::Bool => PropertyTag::Bool {
                value: r.read_u8()?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Byte => PropertyTag::Byte {
                enum_name: FName::read(r, names)?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Enum => PropertyTag::Enum {
                enum_type: FName::read(r, names)?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Struct => PropertyTag::Struct {
                struct_type: FName::read(r, names)?,
                guid: r.read_guid()?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Array => PropertyTag::Array {
                element_type: FName::read(r, names)?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Set => PropertyTag::Set {
                element_type: FName::read(r, names)?,
                guid_flag: r.read_u8()?,
            },
            PropertyKind::Map => PropertyTag::Map {
                key_type: FName::read(r, names)?,
                value_type: FName::read(r, names)?,
                guid_flag: r.read_u8()?,
            },
            _ => PropertyTag::Simple {
                guid_flag: r.read_u8()?,
            },
        })
    }

    fn write_tag(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        match &self.tag {
            PropertyTag::Simple { guid_flag } => w.write_u8(*guid_flag),
            PropertyTag::Bool { value, guid_flag } => {
                w.write_u8(*value);
                w.write_u8(*guid_flag);
            }
            PropertyTag::Byte {
                enum_name: name,
                guid_flag,
            }
            | PropertyTag::Enum {
                enum_type: name,
                guid_flag,
            }
            | PropertyTag::Array {
                element_type: name,
                guid_flag,
            }
            | PropertyTag::Set {
                element_type: name,
                guid_flag,
            } => {
                name.write(w, ctx.names)?;
                w.write_u8(*guid_flag);
            }
            PropertyTag::Struct {
                struct_type,
                guid,
                guid_flag,
            } => {
                struct_type.write(w, ctx.names)?;
                w.write_guid(guid);
                w.write_u8(*guid_flag);
            }
            PropertyTag::Map {
                key_type,
                value_type,
                guid_flag,
            } => {
                key_type.write(w, ctx.names)?;
                value_type.write(w, ctx.names)?;
                w.write_u8(*guid_flag);
            }
        }
        Ok(())
    }

    fn read_body(
        r: &mut ByteReader<'_>,
        kind: PropertyKind,
        tag: &PropertyTag,
        ctx: &DecodeContext<'_>,
    ) -> FormatResult<Value> {
        Ok(match (kind, tag) {
            (PropertyKind::Bool, _) => Value::Empty,
            (PropertyKind::Byte, PropertyTag::Byte { enum_name, .. }) => {
                if enum_name.is_none() {
                    Value::Byte(r.read_u8()?)
                } else {
                    Value::Name(FName::read(r, ctx.names)?)
                }
            }
            (PropertyKind::Enum, _) => Value::Name(FName::read(r, ctx.names)?),
            (PropertyKind::Text, _) => Value::Text(read_text(r)?),
            (PropertyKind::Struct, PropertyTag::Struct { struct_type, .. }) => {
                read_struct(r, struct_type.as_str(), ctx)?
            }
            (PropertyKind::Array, PropertyTag::Array { element_type, .. }) => {
                let count = r.read_count(0)?;
                if element_type.as_str() == "StructProperty" {
                    Value::StructArray(Box::new(read_struct_array(r, count, ctx)?))
                } else {
                    let mut items = Vec::with_capacity(count.min(r.remaining()));
                    for _ in 0..count {
                        items.push(read_element(r, element_type.as_str(), ctx)?);
                    }
                    Value::Array(items)
                }
            }
            (PropertyKind::Set, PropertyTag::Set { element_type, .. }) => {
                expect_no_removals(r)?;
                let count = r.read_count(0)?;
                let mut items = Vec::with_capacity(count.min(r.remaining()));
                for _ in 0..count {
                    items.push(read_element(r, element_type.as_str(), ctx)?);
                }
                Value::Set(items)
            }
            (
                PropertyKind::Map,
                PropertyTag::Map {
                    key_type,
                    value_type,
                    ..
                },
            ) => {
                expect_no_removals(r)?;
                let count = r.read_count(0)?;
                let mut pairs = Vec::with_capacity(count.min(r.remaining()));
                for _ in 0..count {
                    let key = read_element(r, key_type.as_str(), ctx)?;
                    let value = read_element(r, value_type.as_str(), ctx)?;
                    pairs.push((key, value));
                }
                Value::Map(pairs)
            }
            (PropertyKind::Unknown, _) => Value::Opaque(r.read_rest().to_vec()),
            (kind, _) => read_scalar(r, kind, ctx)?,
        })
    }

    /// Reads one property, or `None` at the bag terminator.
    fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Result<Self, FName>> {
        let name = FName::read(r, ctx.names)?;
        if name.is_none() {
            return Ok(Err(name));
        }

        let type_name = FName::read(r, ctx.names)?;
        let size = r.read_u32()?;
        let array_index = r.read_u32()?;
        let kind = PropertyKind::from_type_name(type_name.as_str());
        let tag = Self::read_tag(r, kind, ctx)?;

        let window = r.window(size as usize)?;
        let value = decode_window(window, |body| Self::read_body(body, kind, &tag, ctx), || {
            format!("{} ({})", name, type_name)
        });

        Ok(Ok(Self {
            name,
            type_name,
            size,
            array_index,
            tag,
            value,
        }))
    }

    fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        self.name.write(w, ctx.names)?;
        self.type_name.write(w, ctx.names)?;
        let size = w.reserve_u32();
        w.write_u32(self.array_index);
        self.write_tag(w, ctx)?;
        let start = w.position();
        self.value.write(w, ctx)?;
        let length = w.position() - start;
        let length = u32::try_from(length).map_err(|_| FormatError::LengthOverflow { length })?;
        w.patch_u32(size, length);
        Ok(())
    }
}

/// Decode a sized window completely, or keep its bytes verbatim.
///
/// Any failure inside the window, or bytes left over after decoding, is a
/// `MalformedLength` for this node only.
pub(crate) fn decode_window<'a, F, D>(window: ByteReader<'a>, decode: F, describe: D) -> Value
where
    F: FnOnce(&mut ByteReader<'a>) -> FormatResult<Value>,
    D: FnOnce() -> String,
{
    let mut body = window.clone();
    let failure = match decode(&mut body) {
        Ok(value) if body.at_end() => return value,
        Ok(_) => FormatError::MalformedLength {
            offset: window.offset(),
            declared: window.len(),
            actual: body.position(),
        },
        Err(e) => e,
    };
    warn!(
        node = %describe(),
        offset = window.offset(),
        len = window.len(),
        error = %failure,
        "keeping undecodable region as opaque bytes"
    );
    let mut raw = window;
    Value::Opaque(raw.read_rest().to_vec())
}

fn expect_no_removals(r: &mut ByteReader<'_>) -> FormatResult<()> {
    let offset = r.offset();
    let removed = r.read_i32()?;
    if removed != 0 {
        return Err(FormatError::layout(
            offset,
            format!("container declares {removed} removed entries"),
        ));
    }
    Ok(())
}

fn read_scalar(r: &mut ByteReader<'_>, kind: PropertyKind, ctx: &DecodeContext<'_>) -> FormatResult<Value> {
    Ok(match kind {
        PropertyKind::Int8 => Value::Int8(r.read_i8()?),
        PropertyKind::Int16 => Value::Int16(r.read_i16()?),
        PropertyKind::Int => Value::Int(r.read_i32()?),
        PropertyKind::Int64 => Value::Int64(r.read_i64()?),
        PropertyKind::UInt16 => Value::UInt16(r.read_u16()?),
        PropertyKind::UInt32 => Value::UInt32(r.read_u32()?),
        PropertyKind::UInt64 => Value::UInt64(r.read_u64()?),
        PropertyKind::Float => Value::Float(r.read_f32()?),
        PropertyKind::Double => Value::Double(r.read_f64()?),
        PropertyKind::Str | PropertyKind::SoftObject | PropertyKind::SoftClass => {
            Value::Str(r.read_fstring()?)
        }
        PropertyKind::Name | PropertyKind::Enum => Value::Name(FName::read(r, ctx.names)?),
        PropertyKind::Object => Value::Object(r.read_i32()?),
        other => {
            return Err(FormatError::layout(
                r.offset(),
                format!("{other:?} has no scalar encoding"),
            ));
        }
    })
}

/// Raw element of an array, set or map: no per-element header.
fn read_element(r: &mut ByteReader<'_>, element_type: &str, ctx: &DecodeContext<'_>) -> FormatResult<Value> {
    match PropertyKind::from_type_name(element_type) {
        PropertyKind::Bool => Ok(Value::Bool(r.read_bool()?)),
        PropertyKind::Byte => Ok(Value::Byte(r.read_u8()?)),
        PropertyKind::Struct => Ok(Value::Guid(r.read_guid()?)),
        PropertyKind::Text
        | PropertyKind::Array
        | PropertyKind::Set
        | PropertyKind::Map
        | PropertyKind::Unknown => Err(FormatError::layout(
            r.offset(),
            format!("no raw element encoding for {element_type}"),
        )),
        kind => read_scalar(r, kind, ctx),
    }
}

pub(crate) fn read_struct(
    r: &mut ByteReader<'_>,
    struct_type: &str,
    ctx: &DecodeContext<'_>,
) -> FormatResult<Value> {
    Ok(match struct_type {
        "SoftClassPath" | "SoftObjectPath" => Value::Str(r.read_fstring()?),
        "Timespan" => Value::Timespan(r.read_i64()?),
        "DateTime" => Value::DateTime(r.read_i64()?),
        "Guid" => Value::Guid(r.read_guid()?),
        "Vector" => Value::Vector([r.read_f64()?, r.read_f64()?, r.read_f64()?]),
        "Rotator" => Value::Rotator([r.read_f64()?, r.read_f64()?, r.read_f64()?]),
        "PersistenceBlob" => Value::Blob(Box::new(PersistenceBlob::read(r, ctx)?)),
        other => {
            trace!(struct_type = other, "decoding struct body as a property bag");
            Value::Struct(PropertyBag::read(r, ctx)?)
        }
    })
}

fn read_struct_array(
    r: &mut ByteReader<'_>,
    count: usize,
    ctx: &DecodeContext<'_>,
) -> FormatResult<StructArray> {
    let inner_name = FName::read(r, ctx.names)?;
    let inner_type = FName::read(r, ctx.names)?;
    let inner_size = r.read_u32()?;
    let inner_index = r.read_u32()?;
    let struct_type = FName::read(r, ctx.names)?;
    let guid = r.read_guid()?;
    let guid_flag = r.read_u8()?;

    let mut items_reader = r.window(inner_size as usize)?;
    let mut items = Vec::with_capacity(count.min(items_reader.remaining()));
    for _ in 0..count {
        items.push(read_struct(&mut items_reader, struct_type.as_str(), ctx)?);
    }
    if !items_reader.at_end() {
        return Err(FormatError::MalformedLength {
            offset: items_reader.offset(),
            declared: inner_size as usize,
            actual: items_reader.position(),
        });
    }

    Ok(StructArray {
        inner_name,
        inner_type,
        inner_size,
        inner_index,
        struct_type,
        guid,
        guid_flag,
        items,
    })
}

fn write_struct_array(
    w: &mut ByteWriter,
    array: &StructArray,
    ctx: &mut EncodeContext<'_>,
) -> FormatResult<()> {
    w.write_count(array.items.len())?;
    array.inner_name.write(w, ctx.names)?;
    array.inner_type.write(w, ctx.names)?;
    let size = w.reserve_u32();
    w.write_u32(array.inner_index);
    array.struct_type.write(w, ctx.names)?;
    w.write_guid(&array.guid);
    w.write_u8(array.guid_flag);
    let start = w.position();
    for item in &array.items {
        item.write(w, ctx)?;
    }
    let length = w.position() - start;
    let length = u32::try_from(length).map_err(|_| FormatError::LengthOverflow { length })?;
    w.patch_u32(size, length);
    Ok(())
}

fn read_text(r: &mut ByteReader<'_>) -> FormatResult<Text> {
    let flags = r.read_u32()?;
    let kind = r.read_i8()?;
    let history = match kind {
        0 => TextHistory::Base {
            namespace: r.read_fstring()?,
            key: r.read_fstring()?,
            source: r.read_fstring()?,
        },
        -1 => {
            let flag = r.read_u32()?;
            let culture_invariant = if flag != 0 {
                Some(r.read_fstring()?)
            } else {
                None
            };
            TextHistory::None {
                flag,
                culture_invariant,
            }
        }
        kind => TextHistory::Other {
            kind,
            data: r.read_rest().to_vec(),
        },
    };
    Ok(Text { flags, history })
}

fn write_text(w: &mut ByteWriter, text: &Text) -> FormatResult<()> {
    w.write_u32(text.flags);
    match &text.history {
        TextHistory::Base {
            namespace,
            key,
            source,
        } => {
            w.write_i8(0);
            w.write_fstring(namespace)?;
            w.write_fstring(key)?;
            w.write_fstring(source)?;
        }
        TextHistory::None {
            flag,
            culture_invariant,
        } => {
            w.write_i8(-1);
            w.write_u32(*flag);
            if let Some(s) = culture_invariant {
                w.write_fstring(s)?;
            }
        }
        TextHistory::Other { kind, data } => {
            w.write_i8(*kind);
            w.write_bytes(data);
        }
    }
    Ok(())
}

/// Ordered properties of one object, component or struct body.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBag {
    pub properties: Vec<Property>,
    pub terminator: FName,
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PropertyBag {
    pub fn new(properties: Vec<Property>) -> Self {
        Self {
            properties,
            terminator: FName::new("None"),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.as_str() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name.as_str() == name)
    }

    /// The `nth` property carrying `name`; static arrays repeat a name with
    /// increasing array indices.
    pub fn get_nth(&self, name: &str, nth: usize) -> Option<&Property> {
        self.properties
            .iter()
            .filter(|p| p.name.as_str() == name)
            .nth(nth)
    }

    pub fn get_nth_mut(&mut self, name: &str, nth: usize) -> Option<&mut Property> {
        self.properties
            .iter_mut()
            .filter(|p| p.name.as_str() == name)
            .nth(nth)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|p| &p.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Self> {
        let mut properties = Vec::new();
        loop {
            match Property::read(r, ctx)? {
                Ok(property) => properties.push(property),
                Err(terminator) => {
                    return Ok(Self {
                        properties,
                        terminator,
                    });
                }
            }
        }
    }

    pub fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        for property in &self.properties {
            property.write(w, ctx)?;
        }
        self.terminator.write(w, ctx.names)
    }
}
