//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally passing a raw field id where
//! an [`IssueKey`] is expected even though both are strings under the hood.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (remote tracker keys)
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies an issue in the remote tracker (e.g. `"PROJ-123"`).
    ///
    /// Opaque to this crate: no project/number structure is assumed.
    IssueKey
}

string_id! {
    /// Display name of a configured tracker site, used in log lines only.
    SiteName
}

/// The set of issues one step execution applies its update to.
///
/// Iteration follows the set's ordering; callers must not attach meaning to it.
pub type IssueKeySet = BTreeSet<IssueKey>;

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single step execution.
///
/// Generated fresh for every invocation; propagated through spans so all
/// activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_key_rejects_empty_value() {
        assert!(IssueKey::new("").is_none());
        assert_eq!(IssueKey::new("PROJ-1").map(|k| k.to_string()), Some("PROJ-1".to_string()));
    }

    #[test]
    fn issue_key_set_deduplicates() {
        let keys: IssueKeySet = ["A-1", "A-2", "A-1"]
            .into_iter()
            .filter_map(IssueKey::new)
            .collect();
        assert_eq!(keys.len(), 2);
    }
}
