//! Canonical attribute map.
//!
//! Every place that needs "which value was chosen for which attribute" uses
//! [`AttributeMap`]. It keeps declaration order (the SKU synthesizer depends on
//! it) while comparing order-independently. Deserialization is the one adapter
//! for the two wire shapes the storefront produces: a plain JSON object, or an
//! array of `[name, value]` entries.

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered `name -> value` pairs with unique names.
#[derive(Clone, Debug, Default)]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    pub fn new() -> Self { Self(Vec::new()) }

    /// Sets `name` to `value`. An existing name keeps its position and the
    /// previous value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Order-independent signature: the pairs rendered as a JSON object with
    /// sorted keys.
    pub fn canonical_key(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self.0.iter().collect();
        pairs.sort();
        let object: serde_json::Map<String, serde_json::Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(object).to_string()
    }
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|(k, v)| other.get(k) == Some(v.as_str()))
    }
}

impl Eq for AttributeMap {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributeMapVisitor)
    }
}

struct AttributeMapVisitor;

impl<'de> Visitor<'de> for AttributeMapVisitor {
    type Value = AttributeMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of attribute values or an array of [name, value] entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = AttributeMap::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            map.insert(k, v);
        }
        Ok(map)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = AttributeMap::new();
        while let Some((k, v)) = access.next_element::<(String, String)>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn insert_keeps_declaration_order_and_replaces_in_place() {
        let mut m = map(&[("Storage", "64GB"), ("Color", "Black")]);
        assert_eq!(m.insert("Storage", "128GB"), Some("64GB".to_string()));
        let pairs: Vec<_> = m.iter().collect();
        assert_eq!(pairs, vec![("Storage", "128GB"), ("Color", "Black")]);
    }

    #[test]
    fn equality_ignores_order() {
        assert_eq!(map(&[("a", "1"), ("b", "2")]), map(&[("b", "2"), ("a", "1")]));
        assert_ne!(map(&[("a", "1")]), map(&[("a", "1"), ("b", "2")]));
        assert_ne!(map(&[("a", "1")]), map(&[("a", "2")]));
    }

    #[test]
    fn canonical_key_is_sorted() {
        let a = map(&[("Storage", "64GB"), ("Color", "Black")]);
        let b = map(&[("Color", "Black"), ("Storage", "64GB")]);
        assert_eq!(a.canonical_key(), r#"{"Color":"Black","Storage":"64GB"}"#);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn deserializes_object_and_entry_list() {
        let from_object: AttributeMap = serde_json::from_str(r#"{"Color":"Black","Storage":"64GB"}"#).unwrap();
        let from_entries: AttributeMap = serde_json::from_str(r#"[["Color","Black"],["Storage","64GB"]]"#).unwrap();
        assert_eq!(from_object, from_entries);
        assert_eq!(from_entries.names().collect::<Vec<_>>(), vec!["Color", "Storage"]);
    }

    #[test]
    fn serializes_as_object_in_declaration_order() {
        let m = map(&[("Storage", "64GB"), ("Color", "Black")]);
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"Storage":"64GB","Color":"Black"}"#);
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(serde_json::from_str::<AttributeMap>(r#"{"Size":42}"#).is_err());
    }
}
