//! Typed identifiers for daemon entities.
//!
//! The backend treats every id as an opaque string; these wrappers exist so
//! call sites can't accidentally pass a `CityId` where a `RequestId` is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(RequestId);
string_id!(CityId);
string_id!(QueueItemId);
string_id!(TaskId);
string_id!(OrgId);
string_id!(WorkerId);

impl WorkerId {
    pub fn for_index(idx: usize) -> Self {
        Self(format!("worker-{idx}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner_string() {
        let id = RequestId::from("r1");
        assert_eq!(id.to_string(), "r1");
        assert_eq!(id.as_str(), "r1");
    }

    #[test]
    fn worker_id_for_index() {
        assert_eq!(WorkerId::for_index(3).as_str(), "worker-3");
    }
}
