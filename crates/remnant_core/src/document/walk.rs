//! Read-only traversal in serialization order.
//!
//! Every SaveData is visited the way its bytes are laid out: asset path,
//! object data (with nested blobs inline), object paths, then names. Opaque
//! regions contribute their printable ASCII runs.

use std::borrow::Cow;

use super::object::{ComponentBody, Payload, VariableValue};
use super::path::PathAddress;
use super::persistence::PersistenceBlob;
use super::property::{PropertyBag, TextHistory, Value};
use super::save_data::SaveData;

const MIN_ASCII_RUN: usize = 4;

pub trait Visitor<'a> {
    /// A decoded bag, with the path that resolves to it and the SaveData
    /// whose object indices it uses.
    fn bag(&mut self, _path: &PathAddress, _bag: &'a PropertyBag, _owner: &'a SaveData) {}

    fn string(&mut self, _s: Cow<'a, str>) {}
}

pub fn walk<'a, V: Visitor<'a>>(save: &'a SaveData, visitor: &mut V) {
    let mut path = PathAddress::root();
    walk_save(save, &mut path, visitor);
}

/// All strings of a document in serialization order.
pub fn strings(save: &SaveData) -> Vec<Cow<'_, str>> {
    struct Strings<'a>(Vec<Cow<'a, str>>);
    impl<'a> Visitor<'a> for Strings<'a> {
        fn string(&mut self, s: Cow<'a, str>) {
            self.0.push(s);
        }
    }
    let mut collector = Strings(Vec::new());
    walk(save, &mut collector);
    collector.0
}

fn emit<'a, V: Visitor<'a>>(visitor: &mut V, s: Option<&'a str>) {
    if let Some(s) = s.filter(|s| !s.is_empty()) {
        visitor.string(Cow::Borrowed(s));
    }
}

fn scan_opaque<'a, V: Visitor<'a>>(bytes: &[u8], visitor: &mut V) {
    for run in bytes.split(|b| !(0x20..0x7F).contains(b)) {
        if run.len() >= MIN_ASCII_RUN {
            visitor.string(Cow::Owned(String::from_utf8_lossy(run).into_owned()));
        }
    }
}

fn walk_save<'a, V: Visitor<'a>>(save: &'a SaveData, path: &mut PathAddress, visitor: &mut V) {
    if let Some(asset) = &save.asset_path {
        emit(visitor, asset.package.as_str());
        emit(visitor, asset.asset.as_str());
    }

    for (i, object) in save.objects.iter().enumerate() {
        path.push("objects", Some(i));
        match &object.properties {
            Some(Payload::Parsed { value, .. }) => walk_bag(value, save, path, visitor),
            Some(Payload::Opaque(bytes)) => scan_opaque(bytes, visitor),
            None => {}
        }
        for (j, component) in object.components.iter().enumerate() {
            path.push("components", Some(j));
            emit(visitor, component.key.as_str());
            match &component.body {
                Payload::Parsed {
                    value: ComponentBody::Properties(bag),
                    ..
                } => walk_bag(bag, save, path, visitor),
                Payload::Parsed {
                    value: ComponentBody::Variables(vars),
                    ..
                } => {
                    for var in &vars.items {
                        if let VariableValue::Name(name) = &var.value {
                            emit(visitor, Some(name.as_str()));
                        }
                    }
                }
                Payload::Opaque(bytes) => scan_opaque(bytes, visitor),
            }
            path.pop();
        }
        path.pop();
    }

    for object in &save.objects {
        if !object.path_implied {
            emit(visitor, object.path.as_str());
        }
    }
    for name in save.names.iter() {
        emit(visitor, Some(name));
    }
}

fn walk_bag<'a, V: Visitor<'a>>(
    bag: &'a PropertyBag,
    owner: &'a SaveData,
    path: &mut PathAddress,
    visitor: &mut V,
) {
    visitor.bag(path, bag, owner);
    let mut seen: Vec<&str> = Vec::new();
    for property in &bag.properties {
        let name = property.name.as_str();
        let nth = seen.iter().filter(|n| **n == name).count();
        seen.push(name);
        match property.value.element_count() {
            Some(_) => {
                let items: Box<dyn Iterator<Item = &'a Value>> = match &property.value {
                    Value::Array(items) | Value::Set(items) => Box::new(items.iter()),
                    Value::StructArray(array) => Box::new(array.items.iter()),
                    Value::Map(pairs) => Box::new(pairs.iter().flat_map(|(k, v)| [k, v])),
                    _ => Box::new(std::iter::empty()),
                };
                for (i, item) in items.enumerate() {
                    // Map keys and values share one counter; only values are addressable.
                    let index = if matches!(property.value, Value::Map(_)) { i / 2 } else { i };
                    path.push(name, Some(index));
                    walk_value(item, owner, path, visitor);
                    path.pop();
                }
            }
            None => {
                path.push(name, (nth > 0).then_some(nth));
                walk_value(&property.value, owner, path, visitor);
                path.pop();
            }
        }
    }
}

fn walk_value<'a, V: Visitor<'a>>(
    value: &'a Value,
    owner: &'a SaveData,
    path: &mut PathAddress,
    visitor: &mut V,
) {
    match value {
        Value::Str(s) => emit(visitor, s.as_str()),
        Value::Text(text) => match &text.history {
            TextHistory::Base {
                namespace,
                key,
                source,
            } => {
                emit(visitor, namespace.as_str());
                emit(visitor, key.as_str());
                emit(visitor, source.as_str());
            }
            TextHistory::None {
                culture_invariant, ..
            } => emit(visitor, culture_invariant.as_ref().and_then(|s| s.as_str())),
            TextHistory::Other { data, .. } => scan_opaque(data, visitor),
        },
        Value::Struct(bag) => walk_bag(bag, owner, path, visitor),
        Value::Blob(blob) => match blob.as_ref() {
            PersistenceBlob::Save(save) => walk_save(save, path, visitor),
            PersistenceBlob::Container(container) => {
                for (i, entry) in container.actors.iter().enumerate() {
                    match &entry.actor {
                        Payload::Parsed { value: actor, .. } => {
                            path.push("actors", Some(i));
                            path.push("archive", None);
                            walk_save(&actor.archive, path, visitor);
                            path.pop();
                            path.pop();
                        }
                        Payload::Opaque(bytes) => scan_opaque(bytes, visitor),
                    }
                }
                for record in &container.dynamic {
                    emit(visitor, record.class_path.as_str());
                }
            }
            PersistenceBlob::Opaque(bytes) => scan_opaque(bytes, visitor),
        },
        Value::Opaque(bytes) => scan_opaque(bytes, visitor),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Runs(Vec<String>);
    impl<'a> Visitor<'a> for Runs {
        fn string(&mut self, s: Cow<'a, str>) {
            self.0.push(s.into_owned());
        }
    }

    #[test]
    fn opaque_bytes_yield_printable_runs() {
        let mut runs = Runs(Vec::new());
        scan_opaque(b"\x01\x02/Game/Quest\x00ab\x00\xffWorld_Jungle", &mut runs);
        assert_eq!(runs.0, ["/Game/Quest", "World_Jungle"]);
    }
}
