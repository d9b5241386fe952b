//! Business logic
//!
//! The four pipeline stages and the state machine that sequences them:
//! parse/extract, validate, de-identify, orchestrate, plus secure delivery
//! of the cleaned artifacts.

pub mod deidentify;
pub mod delivery;
pub mod extract;
pub mod parse;
pub mod validate;
pub mod workflow;
