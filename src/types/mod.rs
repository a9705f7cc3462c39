use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Value out of bounds: {value}, expected {min}..={max}")]
    OutOfBounds { value: usize, min: usize, max: usize },

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },
}
