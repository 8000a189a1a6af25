//! Default SKU derivation for freshly generated variants.

use super::attribute_map::AttributeMap;

const SEGMENT_LEN: usize = 3;

/// Builds `KEY-VAL` segments in declaration order and joins them with `-`:
/// `{Storage: 128GB, Color: Black}` becomes `STO-128-COL-BLA`.
///
/// Only a default. Once a variant exists its SKU belongs to the operator and
/// regeneration carries it forward untouched.
pub fn synthesize(combination: &AttributeMap) -> String {
    combination
        .iter()
        .map(|(name, value)| format!("{}-{}", segment(name), segment(value)))
        .collect::<Vec<_>>()
        .join("-")
}

fn segment(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.to_uppercase().chars().take(SEGMENT_LEN).collect()
}
