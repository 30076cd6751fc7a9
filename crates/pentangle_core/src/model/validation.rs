//! Shared validation error for model constructors.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Domain validation failures raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Stable identifiers must not be the nil UUID.
    NilId { entity: &'static str },
    /// Category names must contain at least one visible character.
    BlankCategoryName,
    /// Sight names must contain at least one visible character.
    BlankSightName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId { entity } => write!(f, "{entity} id must not be nil"),
            Self::BlankCategoryName => write!(f, "category name must not be blank"),
            Self::BlankSightName => write!(f, "sight name must not be blank"),
        }
    }
}

impl Error for ValidationError {}
