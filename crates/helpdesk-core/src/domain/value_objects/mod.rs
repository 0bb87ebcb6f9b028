//! Value Objects module
//!
//! Immutable identifiers shared across the domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC instant used for every ticket timestamp
pub type Timestamp = DateTime<Utc>;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Opaque ticket identifier, immutable after creation
    TicketId
);

string_id!(
    /// User identifier as issued by the identity provider
    UserId
);

string_id!(
    /// Owning team, used for visibility scoping and team-leader lookup
    TeamId
);

impl TicketId {
    /// Generate a fresh identifier of the form `T-XXXXXXXX`
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("T-{}", raw[..8].to_uppercase()))
    }
}
