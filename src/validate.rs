//! Input validation.
//!
//! Two layers:
//! - [`Validate`]: the checks every insert / update payload passes before it
//!   reaches a backend. Insert payloads are checked strictly; update patches
//!   only check the fields they carry.
//! - Lenient parsing for user-typed enum values. Resolution is exact match →
//!   synonym lookup → error with a suggestion.

use crate::error::{Error, Result};
use crate::model::{EdgeType, Role, Visibility};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Payload validation run before any I/O.
pub trait Validate {
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first problem found.
    fn validate(&self) -> Result<()>;
}

/// Require a non-blank string.
pub(crate) fn require(entity: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(entity, format!("{field} is required")));
    }
    Ok(())
}

/// Require an optional string to be non-blank when present.
pub(crate) fn require_if_present(
    entity: &'static str,
    field: &str,
    value: Option<&str>,
) -> Result<()> {
    match value {
        Some(v) => require(entity, field, v),
        None => Ok(()),
    }
}

/// Metadata columns hold JSON objects (or nothing).
pub(crate) fn require_object(entity: &'static str, metadata: Option<&Value>) -> Result<()> {
    match metadata {
        None | Some(Value::Null | Value::Object(_)) => Ok(()),
        Some(_) => Err(Error::validation(entity, "metadata must be a JSON object")),
    }
}

// ── Synonym maps ─────────────────────────────────────────────

pub static ROLE_SYNONYMS: LazyLock<HashMap<&str, Role>> = LazyLock::new(|| {
    [
        ("human", Role::User),
        ("customer", Role::User),
        ("ai", Role::Assistant),
        ("bot", Role::Assistant),
        ("agent", Role::Assistant),
        ("model", Role::Assistant),
        ("developer", Role::System),
        ("sys", Role::System),
        ("function", Role::Tool),
        ("tool_result", Role::Tool),
    ]
    .into_iter()
    .collect()
});

pub static VISIBILITY_SYNONYMS: LazyLock<HashMap<&str, Visibility>> = LazyLock::new(|| {
    [
        ("shown", Visibility::Visible),
        ("show", Visibility::Visible),
        ("public", Visibility::Visible),
        ("internal", Visibility::Hidden),
        ("hide", Visibility::Hidden),
        ("context_only", Visibility::Hidden),
        ("deleted", Visibility::Archived),
        ("removed", Visibility::Archived),
        ("archive", Visibility::Archived),
    ]
    .into_iter()
    .collect()
});

pub static EDGE_TYPE_SYNONYMS: LazyLock<HashMap<&str, EdgeType>> = LazyLock::new(|| {
    [
        ("depends", EdgeType::DependsOn),
        ("depends-on", EdgeType::DependsOn),
        ("dependency", EdgeType::DependsOn),
        ("needs", EdgeType::DependsOn),
        ("cause", EdgeType::CausedBy),
        ("caused-by", EdgeType::CausedBy),
        ("triggered_by", EdgeType::CausedBy),
    ]
    .into_iter()
    .collect()
});

/// Parse a role, accepting synonyms.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] naming the closest valid role, if any.
pub fn normalize_role(input: &str) -> Result<Role> {
    normalize(input, "role", &Role::ALL, Role::as_str, &ROLE_SYNONYMS)
}

/// Parse a visibility, accepting synonyms.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] naming the closest valid visibility, if any.
pub fn normalize_visibility(input: &str) -> Result<Visibility> {
    normalize(
        input,
        "visibility",
        &Visibility::ALL,
        Visibility::as_str,
        &VISIBILITY_SYNONYMS,
    )
}

/// Parse an edge type, accepting synonyms.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] naming the closest valid edge type, if any.
pub fn normalize_edge_type(input: &str) -> Result<EdgeType> {
    normalize(
        input,
        "edge type",
        &EdgeType::ALL,
        EdgeType::as_str,
        &EDGE_TYPE_SYNONYMS,
    )
}

fn normalize<T: Copy>(
    input: &str,
    label: &str,
    valid: &[T],
    as_str: fn(&T) -> &'static str,
    synonyms: &HashMap<&str, T>,
) -> Result<T> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if let Some(v) = valid.iter().find(|v| as_str(v) == lower) {
        return Ok(*v);
    }

    // Tier 2: synonym lookup
    if let Some(v) = synonyms.get(lower.as_str()) {
        return Ok(*v);
    }

    // Tier 3: suggest the closest canonical value
    let suggestion = valid
        .iter()
        .map(as_str)
        .map(|candidate| (candidate, levenshtein(&lower, candidate)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c);

    Err(Error::InvalidArgument(match suggestion {
        Some(s) => format!("unknown {label} '{input}' (did you mean '{s}'?)"),
        None => format!("unknown {label} '{input}'"),
    }))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
