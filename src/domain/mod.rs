//! Domain layer: value objects, the variant engine and its consumers.
pub mod aggregates;
pub mod events;
pub mod value_objects;
pub mod variants;
