//! Advisory checks over attribute input and the generated variant list.
//!
//! Nothing here fails: every rule runs and contributes messages, and callers
//! decide what a non-empty list blocks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attributes::AttributeDefinition;
use super::record::VariantRecord;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { is_valid: errors.is_empty(), errors }
    }
}

/// Runs every rule over the raw (unfiltered) attributes and the variants
/// generated from them. Variant positions in messages are 1-based.
pub fn validate(attributes: &[AttributeDefinition], variants: &[VariantRecord]) -> ValidationResult {
    let mut errors = Vec::new();
    duplicate_names(attributes, &mut errors);
    incomplete_attributes(attributes, &mut errors);
    if !attributes.is_empty() && variants.is_empty() {
        errors.push("No valid combinations: every attribute needs a name and at least one value".to_string());
    }
    variant_fields(variants, &mut errors);
    ValidationResult::from_errors(errors)
}

fn duplicate_names(attributes: &[AttributeDefinition], errors: &mut Vec<String>) {
    // folded name -> (first spelling seen, occurrences)
    let mut seen: BTreeMap<String, (&str, usize)> = BTreeMap::new();
    let mut order = Vec::new();
    for attr in attributes {
        let name = attr.name.trim();
        if name.is_empty() {
            continue;
        }
        let folded = name.to_lowercase();
        let entry = seen.entry(folded.clone()).or_insert_with(|| {
            order.push(folded);
            (name, 0)
        });
        entry.1 += 1;
    }
    for folded in order {
        if let Some((spelling, count)) = seen.get(&folded) {
            if *count > 1 {
                errors.push(format!("Duplicate attribute name \"{spelling}\""));
            }
        }
    }
}

fn incomplete_attributes(attributes: &[AttributeDefinition], errors: &mut Vec<String>) {
    for (i, attr) in attributes.iter().enumerate() {
        let name = attr.name.trim();
        if name.is_empty() {
            errors.push(format!("Attribute {} has no name", i + 1));
            continue;
        }
        if attr.values.is_empty() {
            errors.push(format!("Attribute \"{name}\" has no values"));
        } else if attr.values.iter().any(|v| v.trim().is_empty()) {
            errors.push(format!("Attribute \"{name}\" has an empty value"));
        }
    }
}

fn variant_fields(variants: &[VariantRecord], errors: &mut Vec<String>) {
    for (i, variant) in variants.iter().enumerate() {
        match variant.stock {
            Some(stock) if stock >= 0 => {}
            _ => errors.push(format!("Variant {}: stock must be zero or more", i + 1)),
        }
        if variant.sku.trim().is_empty() {
            errors.push(format!("Variant {}: SKU is required", i + 1));
        }
    }
}
