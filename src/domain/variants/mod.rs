//! Product-variant engine.
//!
//! Turns attribute definitions into individually priced and stocked variant
//! records, and resolves a customer's chosen combination back to a price,
//! stock level and image. Everything in here is synchronous and pure; the only
//! state carried between calls is the previous variant list the caller passes
//! back in.
//!
//! Flow: [`attributes::usable`] filters operator input,
//! [`generator::generate`] expands and merges it, [`validation::validate`]
//! reports problems, and consumers call [`resolver::resolve`] per line item.

pub mod attribute_map;
pub mod attributes;
pub mod generator;
pub mod record;
pub mod resolver;
pub mod sku;
pub mod validation;

pub use attribute_map::AttributeMap;
pub use attributes::{AttributeDefinition, AttributeSet};
pub use record::{VariantDefaults, VariantRecord};
pub use resolver::{resolve, PriceSource, Resolution, SelectedVariation, VariantCatalog};
pub use validation::{validate, ValidationResult};

use serde::Serialize;

/// Outcome of one [`regenerate`] call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Regeneration {
    pub variants: Vec<VariantRecord>,
    pub validation: ValidationResult,
    /// `false` when the combinations matched `previous` and the previous list
    /// was handed back untouched.
    pub changed: bool,
}

/// Recomputes the variant list after an attribute edit.
///
/// Callers invoke this on every edit; when the generated combinations are the
/// same set as before the previous list is returned as-is so repeated calls
/// settle instead of churning.
pub fn regenerate(
    attributes: &[AttributeDefinition],
    previous: &[VariantRecord],
    defaults: VariantDefaults,
) -> Regeneration {
    let usable = attributes::usable(attributes);
    let generated = generator::generate(&usable, previous, &defaults);
    let changed = !generator::same_combinations(previous, &generated);
    let variants = if changed { generated } else { previous.to_vec() };
    let validation = validate(attributes, &variants);

    tracing::debug!(
        attributes = attributes.len(),
        usable = usable.len(),
        variants = variants.len(),
        changed,
        errors = validation.errors.len(),
        "regenerated variants"
    );

    Regeneration { variants, validation, changed }
}
