//! Common type definitions.
//!
//! All entity IDs are `BIGSERIAL` keys wrapped in type aliases so signatures say which table
//! they point into:
//!
//! - [`UserId`]: user account identifier
//! - [`CategoryId`]: top-level category identifier
//! - [`SubcategoryId`]: subcategory identifier
//! - [`AdId`]: advertisement identifier

use std::fmt;

pub type UserId = i64;
pub type CategoryId = i64;
pub type SubcategoryId = i64;
pub type AdId = i64;

/// Write operations, used to phrase errors and log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Entity kinds exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Category,
    Subcategory,
    Ad,
}

impl Resource {
    /// Lowercase name for use inside sentences
    pub fn noun(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Category => "category",
            Resource::Subcategory => "subcategory",
            Resource::Ad => "ad",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User => write!(f, "User"),
            Resource::Category => write!(f, "Category"),
            Resource::Subcategory => write!(f, "Subcategory"),
            Resource::Ad => write!(f, "Ad"),
        }
    }
}
