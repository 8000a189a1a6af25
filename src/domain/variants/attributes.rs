//! Attribute definitions as edited by the admin operator.
//!
//! Editing is permissive: blank names and values are allowed while the operator
//! is still typing. [`usable`] is the filter the generator sees, and
//! [`super::validation`] reports what was filtered away.

use serde::{Deserialize, Serialize};

/// A named axis of variation with its values in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl AttributeDefinition {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { name: name.into(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Trimmed copy with blank values dropped, or `None` when nothing usable
    /// remains.
    fn to_usable(&self) -> Option<AttributeDefinition> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let values: Vec<String> = self
            .values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(AttributeDefinition { name: name.to_string(), values })
    }
}

/// Attributes with a non-blank name and at least one non-blank value, values
/// trimmed and filtered. Duplicate values are kept.
pub fn usable(attributes: &[AttributeDefinition]) -> Vec<AttributeDefinition> {
    attributes.iter().filter_map(AttributeDefinition::to_usable).collect()
}

/// Number of combinations `usable` attributes expand to; `None` on overflow.
/// Zero attributes expand to zero combinations.
pub fn combination_count(usable: &[AttributeDefinition]) -> Option<usize> {
    if usable.is_empty() {
        return Some(0);
    }
    usable.iter().try_fold(1usize, |acc, attr| acc.checked_mul(attr.values.len()))
}

/// Editable attribute list. Every edit trims its input; an index that does not
/// exist makes the edit a no-op reported through the return value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(Vec<AttributeDefinition>);

impl AttributeSet {
    pub fn new() -> Self { Self(Vec::new()) }

    pub fn definitions(&self) -> &[AttributeDefinition] { &self.0 }
    pub fn into_definitions(self) -> Vec<AttributeDefinition> { self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Appends an attribute and returns its index.
    pub fn add_attribute(&mut self, name: &str) -> usize {
        self.0.push(AttributeDefinition { name: name.trim().to_string(), values: Vec::new() });
        self.0.len() - 1
    }

    pub fn remove_attribute(&mut self, index: usize) -> Option<AttributeDefinition> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn rename_attribute(&mut self, index: usize, name: &str) -> bool {
        match self.0.get_mut(index) {
            Some(attr) => {
                attr.name = name.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_value(&mut self, index: usize, value: &str) -> bool {
        match self.0.get_mut(index) {
            Some(attr) => {
                attr.values.push(value.trim().to_string());
                true
            }
            None => false,
        }
    }

    pub fn remove_value(&mut self, index: usize, value_index: usize) -> Option<String> {
        let attr = self.0.get_mut(index)?;
        (value_index < attr.values.len()).then(|| attr.values.remove(value_index))
    }

    pub fn edit_value(&mut self, index: usize, value_index: usize, value: &str) -> bool {
        match self.0.get_mut(index).and_then(|attr| attr.values.get_mut(value_index)) {
            Some(slot) => {
                *slot = value.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn usable(&self) -> Vec<AttributeDefinition> { usable(&self.0) }
}

impl From<Vec<AttributeDefinition>> for AttributeSet {
    /// Trims names and values of externally supplied definitions.
    fn from(definitions: Vec<AttributeDefinition>) -> Self {
        Self(
            definitions
                .into_iter()
                .map(|d| AttributeDefinition {
                    name: d.name.trim().to_string(),
                    values: d.values.iter().map(|v| v.trim().to_string()).collect(),
                })
                .collect(),
        )
    }
}
