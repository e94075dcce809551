use tracing::warn;

use crate::cursor::{ByteReader, ByteWriter, FString};
use crate::error::{FormatError, FormatResult};

use super::names::{DecodeContext, EncodeContext, FName};
use super::property::PropertyBag;

/// Component keys whose body is a variables block instead of a property bag.
const VARIABLES_KEYS: &[&str] = &[
    "GlobalVariables",
    "Variables",
    "Variable",
    "PersistenceKeys",
    "PersistanceKeys1",
    "PersistenceKeys1",
];

/// A length-prefixed region that either decoded or is kept as raw bytes.
///
/// `trailing` holds bytes after the decoded value that still belong to the
/// region (usually zero padding).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Parsed { value: T, trailing: Vec<u8> },
    Opaque(Vec<u8>),
}

impl<T> Payload<T> {
    pub(crate) fn decode<'a, F>(window: ByteReader<'a>, what: &str, decode: F) -> Self
    where
        F: FnOnce(&mut ByteReader<'a>) -> FormatResult<T>,
    {
        let mut body = window.clone();
        match decode(&mut body) {
            Ok(value) => Self::Parsed {
                value,
                trailing: body.read_rest().to_vec(),
            },
            Err(e) => {
                warn!(
                    region = what,
                    offset = window.offset(),
                    len = window.len(),
                    error = %e,
                    "keeping undecodable region as opaque bytes"
                );
                let mut raw = window;
                Self::Opaque(raw.read_rest().to_vec())
            }
        }
    }

    pub(crate) fn encode<F>(&self, w: &mut ByteWriter, encode: F) -> FormatResult<()>
    where
        F: FnOnce(&T, &mut ByteWriter) -> FormatResult<()>,
    {
        match self {
            Self::Parsed { value, trailing } => {
                encode(value, w)?;
                w.write_bytes(trailing);
            }
            Self::Opaque(bytes) => w.write_bytes(bytes),
        }
        Ok(())
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed { value, .. } => Some(value),
            Self::Opaque(_) => None,
        }
    }

    pub fn parsed_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Parsed { value, .. } => Some(value),
            Self::Opaque(_) => None,
        }
    }
}

impl<T> From<T> for Payload<T> {
    fn from(value: T) -> Self {
        Self::Parsed {
            value,
            trailing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub name: FName,
    pub outer_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    None,
    Bool(u32),
    Int(i32),
    Float(f32),
    Name(FName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: FName,
    pub value: VariableValue,
}

impl Variable {
    fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Self> {
        let offset = r.offset();
        let name = FName::read(r, ctx.names)?;
        if name.is_none() {
            return Err(FormatError::layout(offset, "unexpected None variable"));
        }
        let kind_offset = r.offset();
        let value = match r.read_u8()? {
            0 => VariableValue::None,
            1 => VariableValue::Bool(r.read_u32()?),
            2 => VariableValue::Int(r.read_i32()?),
            3 => VariableValue::Float(r.read_f32()?),
            4 => VariableValue::Name(FName::read(r, ctx.names)?),
            other => {
                return Err(FormatError::layout(
                    kind_offset,
                    format!("unknown variable kind {other}"),
                ));
            }
        };
        Ok(Self { name, value })
    }

    fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        self.name.write(w, ctx.names)?;
        match &self.value {
            VariableValue::None => w.write_u8(0),
            VariableValue::Bool(v) => {
                w.write_u8(1);
                w.write_u32(*v);
            }
            VariableValue::Int(v) => {
                w.write_u8(2);
                w.write_i32(*v);
            }
            VariableValue::Float(v) => {
                w.write_u8(3);
                w.write_f32(*v);
            }
            VariableValue::Name(n) => {
                w.write_u8(4);
                n.write(w, ctx.names)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    pub name: FName,
    pub unknown: u64,
    pub items: Vec<Variable>,
}

impl Variables {
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.items.iter().find(|v| v.name.as_str() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.items.iter_mut().find(|v| v.name.as_str() == name)
    }

    fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Self> {
        let name = FName::read(r, ctx.names)?;
        let unknown = r.read_u64()?;
        let count = r.read_count(3)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(Variable::read(r, ctx)?);
        }
        Ok(Self {
            name,
            unknown,
            items,
        })
    }

    fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        self.name.write(w, ctx.names)?;
        w.write_u64(self.unknown);
        w.write_count(self.items.len())?;
        for item in &self.items {
            item.write(w, ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentBody {
    Variables(Variables),
    Properties(PropertyBag),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub key: FString,
    pub body: Payload<ComponentBody>,
}

impl Component {
    pub fn key(&self) -> &str {
        self.key.as_str().unwrap_or_default()
    }

    pub fn properties(&self) -> Option<&PropertyBag> {
        match self.body.parsed()? {
            ComponentBody::Properties(bag) => Some(bag),
            ComponentBody::Variables(_) => None,
        }
    }

    pub fn variables(&self) -> Option<&Variables> {
        match self.body.parsed()? {
            ComponentBody::Variables(vars) => Some(vars),
            ComponentBody::Properties(_) => None,
        }
    }

    fn read(r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<Self> {
        let offset = r.offset();
        let key = r.read_fstring()?;
        let Some(key_str) = key.as_str() else {
            return Err(FormatError::layout(offset, "null component key"));
        };
        let len = r.read_count(1)?;
        let window = r.window(len)?;
        let body = if VARIABLES_KEYS.contains(&key_str) {
            Payload::decode(window, key_str, |body| {
                Variables::read(body, ctx).map(ComponentBody::Variables)
            })
        } else {
            Payload::decode(window, key_str, |body| {
                PropertyBag::read(body, ctx).map(ComponentBody::Properties)
            })
        };
        Ok(Self { key, body })
    }

    fn write(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        w.write_fstring(&self.key)?;
        let scope = w.begin_length();
        self.body.encode(w, |body, w| match body {
            ComponentBody::Variables(vars) => vars.write(w, ctx),
            ComponentBody::Properties(bag) => bag.write(w, ctx),
        })?;
        w.end_length(scope)?;
        Ok(())
    }
}

/// One entry of a SaveData's object list.
///
/// The header half (`was_loaded`, `path`, `loaded`) lives in the objects
/// table; the rest lives in the data region, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct UObject {
    pub was_loaded: u8,
    pub path: FString,
    /// The first loaded object of a SaveData with an asset path stores no
    /// path of its own; it takes the class path.
    pub path_implied: bool,
    pub loaded: Option<LoadedData>,
    pub object_index: i32,
    /// `None` when the stored properties length is zero.
    pub properties: Option<Payload<PropertyBag>>,
    pub is_actor: u8,
    pub components: Vec<Component>,
}

impl UObject {
    pub fn new(path: &str, object_index: i32, properties: PropertyBag) -> Self {
        Self {
            was_loaded: 1,
            path: FString::new(path),
            path_implied: false,
            loaded: None,
            object_index,
            properties: Some(properties.into()),
            is_actor: 0,
            components: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        self.path.as_str().unwrap_or_default()
    }

    pub fn bag(&self) -> Option<&PropertyBag> {
        self.properties.as_ref()?.parsed()
    }

    pub fn bag_mut(&mut self) -> Option<&mut PropertyBag> {
        self.properties.as_mut()?.parsed_mut()
    }

    pub(crate) fn read_header(
        r: &mut ByteReader<'_>,
        ctx: &DecodeContext<'_>,
        index: usize,
    ) -> FormatResult<Self> {
        let was_loaded = r.read_u8()?;
        let implied_path = ctx.class_path.filter(|_| was_loaded != 0 && index == 0);
        let (path, path_implied) = match implied_path {
            Some(class_path) => (FString::new(class_path), true),
            None => (r.read_fstring()?, false),
        };
        let loaded = if was_loaded == 0 {
            Some(LoadedData {
                name: FName::read(r, ctx.names)?,
                outer_id: r.read_u32()?,
            })
        } else {
            None
        };
        Ok(Self {
            was_loaded,
            path,
            path_implied,
            loaded,
            object_index: 0,
            properties: None,
            is_actor: 0,
            components: Vec::new(),
        })
    }

    pub(crate) fn read_data(&mut self, r: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> FormatResult<()> {
        self.object_index = r.read_i32()?;
        let len = r.read_u32()? as usize;
        if len > 0 {
            let window = r.window(len)?;
            let what = self.path.to_string();
            self.properties = Some(Payload::decode(window, &what, |body| {
                PropertyBag::read(body, ctx)
            }));
        }
        self.is_actor = r.read_u8()?;
        if self.is_actor != 0 {
            let count = r.read_u32()? as usize;
            if count > r.remaining() {
                return Err(FormatError::TruncatedInput {
                    offset: r.offset(),
                    needed: count,
                    remaining: r.remaining(),
                });
            }
            self.components = Vec::with_capacity(count);
            for _ in 0..count {
                self.components.push(Component::read(r, ctx)?);
            }
        }
        Ok(())
    }

    pub(crate) fn write_header(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        w.write_u8(self.was_loaded);
        if !(self.path_implied && ctx.class_path.is_some()) {
            w.write_fstring(&self.path)?;
        }
        if let Some(loaded) = &self.loaded {
            loaded.name.write(w, ctx.names)?;
            w.write_u32(loaded.outer_id);
        }
        Ok(())
    }

    pub(crate) fn write_data(&self, w: &mut ByteWriter, ctx: &mut EncodeContext<'_>) -> FormatResult<()> {
        w.write_i32(self.object_index);
        match &self.properties {
            None => w.write_u32(0),
            Some(payload) => {
                let scope = w.begin_length();
                payload.encode(w, |bag, w| bag.write(w, ctx))?;
                w.end_length(scope)?;
            }
        }
        w.write_u8(self.is_actor);
        if self.is_actor != 0 {
            let count = u32::try_from(self.components.len()).map_err(|_| FormatError::LengthOverflow {
                length: self.components.len(),
            })?;
            w.write_u32(count);
            for component in &self.components {
                component.write(w, ctx)?;
            }
        }
        Ok(())
    }
}
