//! Path addressing into a decoded document.
//!
//! A [`PathAddress`] such as `objects[3].CurrentSegments[1].RowName` names a
//! node without holding a reference into the tree, so it stays valid across
//! a decode, a mutation and a re-encode.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::object::{Component, ComponentBody, UObject, Variable, Variables};
use super::persistence::{Actor, PersistenceBlob, PersistenceContainer};
use super::property::{Property, PropertyBag, Value};
use super::save_data::SaveData;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path `{0}`")]
    Syntax(String),

    #[error("path not found: no `{step}` under `{parent}`")]
    NotFound { parent: String, step: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub key: String,
    pub index: Option<usize>,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.key, i),
            None => f.write_str(&self.key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathAddress {
    pub steps: Vec<PathStep>,
}

impl PathAddress {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, key: &str, index: Option<usize>) {
        self.steps.push(PathStep {
            key: key.to_string(),
            index,
        });
    }

    pub fn pop(&mut self) {
        self.steps.pop();
    }

    pub fn child(&self, key: &str, index: Option<usize>) -> Self {
        let mut path = self.clone();
        path.push(key, index);
        path
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for PathAddress {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::root());
        }
        let syntax = || PathError::Syntax(s.to_string());
        let mut path = Self::root();
        for part in s.split('.') {
            let (key, index) = match part.split_once('[') {
                Some((key, rest)) => {
                    let digits = rest.strip_suffix(']').ok_or_else(syntax)?;
                    (key, Some(digits.parse::<usize>().map_err(|_| syntax())?))
                }
                None => (part, None),
            };
            if key.is_empty() || key.contains(']') {
                return Err(syntax());
            }
            path.push(key, index);
        }
        Ok(path)
    }
}

/// Shared view of any addressable node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Save(&'a SaveData),
    Container(&'a PersistenceContainer),
    Actor(&'a Actor),
    Object(&'a UObject),
    Component(&'a Component),
    Variables(&'a Variables),
    Variable(&'a Variable),
    Bag(&'a PropertyBag),
    Property(&'a Property),
    Value(&'a Value),
    Opaque(&'a [u8]),
}

/// Exclusive view of any addressable node; the only way to edit the tree.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Save(&'a mut SaveData),
    Container(&'a mut PersistenceContainer),
    Actor(&'a mut Actor),
    Object(&'a mut UObject),
    Component(&'a mut Component),
    Variables(&'a mut Variables),
    Variable(&'a mut Variable),
    Bag(&'a mut PropertyBag),
    Property(&'a mut Property),
    Value(&'a mut Value),
    Opaque(&'a mut Vec<u8>),
}

impl<'a> NodeRef<'a> {
    /// Look through properties and struct values to what they contain.
    fn resolved(self) -> Self {
        match self {
            Self::Property(p) => Self::Value(&p.value).resolved(),
            Self::Value(Value::Struct(bag)) => Self::Bag(bag),
            Self::Value(Value::Blob(blob)) => match blob.as_ref() {
                PersistenceBlob::Save(save) => Self::Save(save),
                PersistenceBlob::Container(container) => Self::Container(container),
                PersistenceBlob::Opaque(bytes) => Self::Opaque(bytes),
            },
            other => other,
        }
    }

    /// The property bag this node holds, if any.
    pub fn bag(self) -> Option<&'a PropertyBag> {
        match self.resolved() {
            Self::Bag(bag) => Some(bag),
            Self::Object(object) => object.bag(),
            Self::Component(component) => component.properties(),
            _ => None,
        }
    }

    pub fn property(self) -> Option<&'a Property> {
        match self {
            Self::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn value(self) -> Option<&'a Value> {
        match self {
            Self::Property(p) => Some(&p.value),
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Self::Save(_) => "save data",
            Self::Container(_) => "persistence container",
            Self::Actor(_) => "actor",
            Self::Object(_) => "object",
            Self::Component(_) => "component",
            Self::Variables(_) => "variables",
            Self::Variable(_) => "variable",
            Self::Bag(_) => "property bag",
            Self::Property(_) => "property",
            Self::Value(_) => "value",
            Self::Opaque(_) => "opaque bytes",
        }
    }

    fn step(self, step: &PathStep) -> Option<Self> {
        let key = step.key.as_str();
        match (self.resolved(), step.index) {
            (Self::Save(save), Some(i)) if key == "objects" => save.objects.get(i).map(Self::Object),
            (Self::Container(c), Some(i)) if key == "actors" => {
                c.actors.get(i)?.actor.parsed().map(Self::Actor)
            }
            (Self::Actor(actor), None) if key == "archive" => Some(Self::Save(&actor.archive)),
            (Self::Object(object), Some(i)) if key == "components" => {
                object.components.get(i).map(Self::Component)
            }
            (Self::Object(object), _) => bag_step(object.bag()?, step),
            (Self::Component(c), None) if key == "variables" => c.variables().map(Self::Variables),
            (Self::Component(c), _) => bag_step(c.properties()?, step),
            (Self::Variables(vars), None) => vars.get(key).map(Self::Variable),
            (Self::Bag(bag), _) => bag_step(bag, step),
            _ => None,
        }
    }
}

fn bag_step<'a>(bag: &'a PropertyBag, step: &PathStep) -> Option<NodeRef<'a>> {
    let key = step.key.as_str();
    let Some(i) = step.index else {
        return bag.get(key).map(NodeRef::Property);
    };
    let first = bag.get(key)?;
    if first.value.element_count().is_some() {
        first.value.element(i).map(NodeRef::Value)
    } else {
        bag.get_nth(key, i).map(NodeRef::Property)
    }
}

impl<'a> NodeMut<'a> {
    fn resolved(self) -> Self {
        match self {
            Self::Property(p) => Self::Value(&mut p.value).resolved(),
            Self::Value(value) => match value {
                Value::Struct(bag) => Self::Bag(bag),
                Value::Blob(blob) => match blob.as_mut() {
                    PersistenceBlob::Save(save) => Self::Save(save),
                    PersistenceBlob::Container(container) => Self::Container(container),
                    PersistenceBlob::Opaque(bytes) => Self::Opaque(bytes),
                },
                other => Self::Value(other),
            },
            other => other,
        }
    }

    pub fn bag(self) -> Option<&'a mut PropertyBag> {
        match self.resolved() {
            Self::Bag(bag) => Some(bag),
            Self::Object(object) => object.bag_mut(),
            Self::Component(component) => match component.body.parsed_mut()? {
                ComponentBody::Properties(bag) => Some(bag),
                ComponentBody::Variables(_) => None,
            },
            _ => None,
        }
    }

    pub fn property(self) -> Option<&'a mut Property> {
        match self {
            Self::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn value(self) -> Option<&'a mut Value> {
        match self {
            Self::Property(p) => Some(&mut p.value),
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    fn step(self, step: &PathStep) -> Option<Self> {
        let key = step.key.as_str();
        match (self.resolved(), step.index) {
            (Self::Save(save), Some(i)) if key == "objects" => {
                save.objects.get_mut(i).map(Self::Object)
            }
            (Self::Container(c), Some(i)) if key == "actors" => {
                c.actors.get_mut(i)?.actor.parsed_mut().map(Self::Actor)
            }
            (Self::Actor(actor), None) if key == "archive" => Some(Self::Save(&mut actor.archive)),
            (Self::Object(object), Some(i)) if key == "components" => {
                object.components.get_mut(i).map(Self::Component)
            }
            (Self::Object(object), _) => bag_step_mut(object.bag_mut()?, step),
            (Self::Component(c), None) if key == "variables" => match c.body.parsed_mut()? {
                ComponentBody::Variables(vars) => Some(Self::Variables(vars)),
                ComponentBody::Properties(_) => None,
            },
            (Self::Component(c), _) => match c.body.parsed_mut()? {
                ComponentBody::Properties(bag) => bag_step_mut(bag, step),
                ComponentBody::Variables(_) => None,
            },
            (Self::Variables(vars), None) => vars.get_mut(key).map(Self::Variable),
            (Self::Bag(bag), _) => bag_step_mut(bag, step),
            _ => None,
        }
    }
}

fn bag_step_mut<'a>(bag: &'a mut PropertyBag, step: &PathStep) -> Option<NodeMut<'a>> {
    let key = step.key.as_str();
    let Some(i) = step.index else {
        return bag.get_mut(key).map(NodeMut::Property);
    };
    let is_container = bag.get(key)?.value.element_count().is_some();
    if is_container {
        bag.get_mut(key)?.value.element_mut(i).map(NodeMut::Value)
    } else {
        bag.get_nth_mut(key, i).map(NodeMut::Property)
    }
}

fn not_found(path: &PathAddress, depth: usize) -> PathError {
    let parent = PathAddress {
        steps: path.steps[..depth].to_vec(),
    };
    PathError::NotFound {
        parent: if parent.is_root() {
            "<root>".to_string()
        } else {
            parent.to_string()
        },
        step: path.steps[depth].to_string(),
    }
}

pub fn find<'a>(root: NodeRef<'a>, path: &PathAddress) -> Result<NodeRef<'a>, PathError> {
    let mut node = root;
    for (depth, step) in path.steps.iter().enumerate() {
        node = node.step(step).ok_or_else(|| not_found(path, depth))?;
    }
    Ok(node)
}

pub fn find_mut<'a>(root: NodeMut<'a>, path: &PathAddress) -> Result<NodeMut<'a>, PathError> {
    let mut node = root;
    for (depth, step) in path.steps.iter().enumerate() {
        node = node.step(step).ok_or_else(|| not_found(path, depth))?;
    }
    Ok(node)
}

/// Child step keys of a node, in document order.
pub fn list_keys(node: NodeRef<'_>) -> Vec<String> {
    match node.resolved() {
        NodeRef::Save(save) => indexed("objects", save.objects.len()),
        NodeRef::Container(c) => indexed("actors", c.actors.len()),
        NodeRef::Actor(_) => vec!["archive".to_string()],
        NodeRef::Object(object) => {
            let mut keys = indexed("components", object.components.len());
            keys.extend(object.bag().map(bag_keys).unwrap_or_default());
            keys
        }
        NodeRef::Component(c) => match c.variables() {
            Some(_) => vec!["variables".to_string()],
            None => c.properties().map(bag_keys).unwrap_or_default(),
        },
        NodeRef::Variables(vars) => vars.items.iter().map(|v| v.name.to_string()).collect(),
        NodeRef::Bag(bag) => bag_keys(bag),
        _ => Vec::new(),
    }
}

fn indexed(key: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{key}[{i}]")).collect()
}

fn bag_keys(bag: &PropertyBag) -> Vec<String> {
    let mut keys = Vec::with_capacity(bag.len());
    for (position, property) in bag.properties.iter().enumerate() {
        let name = property.name.as_str();
        let nth = bag.properties[..position]
            .iter()
            .filter(|p| p.name.as_str() == name)
            .count();
        if let Some(count) = property.value.element_count() {
            keys.extend(indexed(name, count));
        } else if nth > 0 {
            keys.push(format!("{name}[{nth}]"));
        } else {
            keys.push(name.to_string());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_indexed_steps() {
        let path: PathAddress = "objects[3].CurrentSegments[1].RowName".parse().unwrap();
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[0].index, Some(3));
        assert_eq!(path.steps[2].index, None);
        assert_eq!(path.to_string(), "objects[3].CurrentSegments[1].RowName");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["a..b", "a[x]", "a[1", "[2]"] {
            assert!(bad.parse::<PathAddress>().is_err(), "{bad}");
        }
    }

    #[test]
    fn nth_same_named_property_is_addressable() {
        let bag = PropertyBag::new(vec![
            Property::int("Slot", 1),
            Property::int("Other", 9),
            Property::int("Slot", 2),
        ]);
        let path: PathAddress = "Slot[1]".parse().unwrap();
        let node = find(NodeRef::Bag(&bag), &path).unwrap();
        assert_eq!(node.value().and_then(Value::as_int), Some(2));
        assert_eq!(list_keys(NodeRef::Bag(&bag)), ["Slot", "Other", "Slot[1]"]);
    }

    #[test]
    fn missing_step_names_its_parent() {
        let bag = PropertyBag::new(vec![Property::int("Level", 3)]);
        let path: PathAddress = "Level.Inner".parse().unwrap();
        let err = find(NodeRef::Bag(&bag), &path).unwrap_err();
        assert_eq!(
            err,
            PathError::NotFound {
                parent: "Level".into(),
                step: "Inner".into()
            }
        );
    }
}
