//! Cartesian expansion of attribute values into variant records.

use std::collections::{HashMap, VecDeque};

use super::attribute_map::AttributeMap;
use super::attributes::AttributeDefinition;
use super::record::{VariantDefaults, VariantRecord};

/// Every combination of the attributes' values. The first attribute varies
/// slowest and the last fastest, so `[a,b] x [x,y]` yields
/// `(a,x) (a,y) (b,x) (b,y)`.
///
/// Expects already-filtered attributes (see [`super::attributes::usable`]);
/// no attributes means no combinations.
pub fn combinations(attributes: &[AttributeDefinition]) -> Vec<AttributeMap> {
    if attributes.is_empty() {
        return Vec::new();
    }
    let mut acc = vec![AttributeMap::new()];
    for attr in attributes {
        let mut next = Vec::with_capacity(acc.len() * attr.values.len());
        for partial in &acc {
            for value in &attr.values {
                let mut combo = partial.clone();
                combo.insert(attr.name.as_str(), value.as_str());
                next.push(combo);
            }
        }
        acc = next;
    }
    acc
}

/// Builds the variant list for `attributes`, carrying forward every previous
/// record whose attribute map equals a new combination. Only `attributes` is
/// rewritten on a carried record; price, stock, SKU, images, active flag and
/// identity are kept. Each previous record is claimed at most once.
pub fn generate(
    attributes: &[AttributeDefinition],
    previous: &[VariantRecord],
    defaults: &VariantDefaults,
) -> Vec<VariantRecord> {
    let mut by_key: HashMap<String, VecDeque<&VariantRecord>> = HashMap::new();
    for record in previous {
        by_key.entry(record.attributes.canonical_key()).or_default().push_back(record);
    }

    combinations(attributes)
        .into_iter()
        .map(|combo| {
            match by_key.get_mut(&combo.canonical_key()).and_then(VecDeque::pop_front) {
                Some(existing) => VariantRecord { attributes: combo, ..existing.clone() },
                None => VariantRecord::fresh(combo, defaults),
            }
        })
        .collect()
}

/// Sorted canonical keys of the records' attribute maps.
pub fn signature(variants: &[VariantRecord]) -> Vec<String> {
    let mut keys: Vec<String> = variants.iter().map(|v| v.attributes.canonical_key()).collect();
    keys.sort();
    keys
}

/// True when both lists describe the same combinations, ignoring order and
/// every field other than the attribute maps.
pub fn same_combinations(a: &[VariantRecord], b: &[VariantRecord]) -> bool {
    a.len() == b.len() && signature(a) == signature(b)
}
