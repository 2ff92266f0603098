pub mod candidate;
pub mod company;
pub mod job;
pub mod resume;
pub mod user;

use thiserror::Error;

/// A stored text column held a value outside its enumeration.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
