//! newtype ids used across the core
//!
//! kept as thin wrappers over `String` (on-chain addresses and uuids are
//! both strings on the wire) so repositories and handlers can't accidentally
//! swap an agent id for a service id.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(AgentId);
string_id!(ServiceId);
string_id!(RatingId);
string_id!(AgreementId);
string_id!(EscrowId);
string_id!(TaskId);
string_id!(MessageId);
string_id!(PredictionId);
string_id!(Address);
