//! API endpoint handlers. Blocking pipeline work runs on the blocking pool.

pub mod analyze;
pub mod health;
pub mod recommend;
