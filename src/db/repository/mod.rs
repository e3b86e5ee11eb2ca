//! Repository layer: entity-scoped database operations.

mod doctor;

pub use doctor::*;
