//! Custom field identifiers, values, and the update payload applied to issues.
//!
//! A [`FieldUpdate`] is always built through [`FieldUpdate::from_expanded`], which
//! owns the rule for when a value is list-wrapped. Field identifiers are always
//! produced by [`normalize_field_id`], so every [`FieldId`] carries the
//! [`CUSTOM_FIELD_PREFIX`].

use serde::{Deserialize, Serialize};

/// Namespace token every custom field id sent to the tracker starts with.
pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A normalized custom field identifier (e.g. `"customfield_10042"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(String);

impl FieldId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefixes `raw` with [`CUSTOM_FIELD_PREFIX`] unless it already starts with it.
///
/// Idempotent: normalizing an already-normalized id returns it unchanged.
pub fn normalize_field_id(raw: &str) -> FieldId {
    if raw.starts_with(CUSTOM_FIELD_PREFIX) {
        FieldId(raw.to_string())
    } else {
        FieldId(format!("{CUSTOM_FIELD_PREFIX}{raw}"))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of checking a user-supplied field id before a run is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIdValidation {
    /// The id is a non-empty run of ASCII digits.
    Ok,
    /// The id is blank; the step can be saved but will not do anything useful.
    Warning(String),
    /// The id is not numeric and can never match a custom field.
    Error(String),
}

/// Checks that `value` is a non-blank, all-digit custom field number.
pub fn validate_field_id(value: &str) -> FieldIdValidation {
    if value.trim().is_empty() {
        return FieldIdValidation::Warning("No issue field id given".to_string());
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return FieldIdValidation::Error(
            "Not a valid issue field id; expected digits only".to_string(),
        );
    }
    FieldIdValidation::Ok
}

// ---------------------------------------------------------------------------
// Value and update
// ---------------------------------------------------------------------------

/// The value assigned to a field.
///
/// Serializes untagged so it maps directly onto the tracker's JSON: a plain
/// string, or a one-element array for fields declared as multi-valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A scalar string value.
    Single(String),
    /// A list-typed value; this crate only ever produces one element.
    Multiple(Vec<String>),
}

/// One `(field id, value)` pair applied to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Normalized field identifier.
    pub field_id: FieldId,
    /// Value to store in the field.
    pub value: FieldValue,
}

impl FieldUpdate {
    /// Builds the update for an already expanded and trimmed value.
    ///
    /// The value is list-wrapped only when `multiple` is set and the value is
    /// non-empty; an empty value is always submitted as an empty scalar.
    pub fn from_expanded(field_id: FieldId, value: String, multiple: bool) -> Self {
        let value = if multiple && !value.is_empty() {
            FieldValue::Multiple(vec![value])
        } else {
            FieldValue::Single(value)
        };
        Self { field_id, value }
    }
}
