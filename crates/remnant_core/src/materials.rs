//! Crafting material quantities held in a profile's inventory.

use std::collections::BTreeMap;

use tracing::debug;

use crate::document::walk::{self, Visitor};
use crate::document::{PathAddress, PropertyBag, SaveData, UObject, Value};

const MATERIALS_DIR: &str = "/Materials/";

/// Readable material id from an asset path.
///
/// `/Game/World_Base/Items/Materials/Scraps/Material_Scraps.Material_Scraps_C`
/// becomes `Scraps`.
pub fn material_name(path: &str) -> &str {
    let last = path.rsplit('/').next().unwrap_or(path);
    let last = last.split('.').next().unwrap_or(last);
    last.strip_prefix("Material_").unwrap_or(last)
}

fn object_at(owner: &SaveData, index: i32) -> Option<&UObject> {
    usize::try_from(index).ok().and_then(|i| owner.objects.get(i))
}

fn quantity(bag: &PropertyBag, owner: &SaveData) -> Option<i32> {
    if let Some(quantity) = bag.value("Quantity").and_then(Value::as_int) {
        return Some(quantity);
    }
    let instance = bag.value("InstanceData").and_then(Value::as_object)?;
    object_at(owner, instance)?
        .bag()?
        .value("Quantity")
        .and_then(Value::as_int)
}

#[derive(Default)]
struct MaterialFinder(BTreeMap<String, i32>);

impl<'a> Visitor<'a> for MaterialFinder {
    fn bag(&mut self, _path: &PathAddress, bag: &'a PropertyBag, owner: &'a SaveData) {
        let Some(item) = bag.value("ItemBP").and_then(Value::as_object) else {
            return;
        };
        let Some(path) = object_at(owner, item).map(|o| o.path()) else {
            return;
        };
        if !path.contains(MATERIALS_DIR) {
            return;
        }
        if let Some(quantity) = quantity(bag, owner) {
            self.0.entry(material_name(path).to_string()).or_insert(quantity);
        }
    }
}

/// Material id to quantity, in name order. The first entry seen for an id wins.
pub fn find_materials(save: &SaveData) -> BTreeMap<String, i32> {
    let mut finder = MaterialFinder::default();
    walk::walk(save, &mut finder);
    debug!(count = finder.0.len(), "found materials");
    finder.0
}
