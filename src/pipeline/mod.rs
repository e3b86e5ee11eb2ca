pub mod extraction;
pub mod triage;
