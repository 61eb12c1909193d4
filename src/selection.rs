//! Parsing of user selection expressions such as `1,3,5-7`.
//!
//! Expressions use 1-based positions as shown in listings; the resulting
//! [`SelectionSet`] holds 0-based indices, ascending and deduplicated.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use thiserror::Error;

/// Ranges wider than this, and wider than the listing itself, are rejected
/// rather than expanded.
const MAX_RANGE_SPAN: u64 = 100_000;

/// Errors produced while validating a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Nothing was selected.
    #[error("selection is empty\n  Suggestion: Enter numbers like `1,3,5-7`, or `all`")]
    Empty,

    /// A token is neither a number nor an ascending `a-b` range.
    #[error("cannot parse '{token}' in selection\n  Suggestion: Use comma-separated numbers and ascending ranges, e.g. `1,3,5-7`")]
    Malformed { token: String },

    /// One or more indices fall outside `1..=max`.
    #[error("{}", format_out_of_range(.invalid, .max))]
    OutOfRange { invalid: Vec<u64>, max: usize },

    /// The selection was validated against a listing of a different length.
    #[error("selection was made against {selected_against} entries but the listing now has {current}\n  Suggestion: Re-list the share and select again")]
    Stale {
        selected_against: usize,
        current: usize,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn format_out_of_range(invalid: &[u64], max: &usize) -> String {
    let max = *max;
    let mut listed = String::new();
    for (i, index) in invalid.iter().enumerate() {
        if i > 0 {
            listed.push_str(", ");
        }
        let _ = write!(listed, "{index}");
    }
    if max == 0 {
        return format!(
            "selection index {listed} out of range: the listing is empty\n  Suggestion: Enumerate a share with at least one file"
        );
    }
    format!(
        "selection index {listed} out of range (valid: 1-{max})\n  Suggestion: Pick numbers shown in the listing"
    )
}

/// A validated set of 0-based indices into an enumeration result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    indices: Vec<usize>,
    bound: usize,
}

impl SelectionSet {
    /// Parses a selection expression against a listing of `max` entries.
    ///
    /// Accepts comma-separated 1-based numbers and inclusive ranges
    /// (`1,3,5-7`), or `all` / `*` for every entry. Whitespace around tokens
    /// is ignored and duplicates collapse.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::Empty`] when the expression selects nothing
    /// - [`SelectionError::Malformed`] for unparsable tokens or descending ranges
    /// - [`SelectionError::OutOfRange`] naming every index outside `1..=max`
    pub fn parse(expr: &str, max: usize) -> Result<Self, SelectionError> {
        let expr = expr.trim();
        if expr.eq_ignore_ascii_case("all") || expr == "*" {
            if max == 0 {
                return Err(SelectionError::Empty);
            }
            return Ok(Self::all(max));
        }

        let upper = u64::try_from(max).unwrap_or(u64::MAX);
        let span_limit = MAX_RANGE_SPAN.max(upper);
        let mut picked = BTreeSet::new();
        for token in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start = parse_position(start, token)?;
                let end = parse_position(end, token)?;
                if start > end || end - start > span_limit {
                    return Err(malformed(token));
                }
                picked.extend(start..=end);
            } else {
                picked.insert(parse_position(token, token)?);
            }
        }

        if picked.is_empty() {
            return Err(SelectionError::Empty);
        }

        let invalid: Vec<u64> = picked
            .iter()
            .copied()
            .filter(|&position| position == 0 || position > upper)
            .collect();
        if !invalid.is_empty() {
            return Err(SelectionError::OutOfRange { invalid, max });
        }

        #[allow(clippy::cast_possible_truncation)]
        let indices = picked.into_iter().map(|p| (p - 1) as usize).collect();
        Ok(Self {
            indices,
            bound: max,
        })
    }

    /// Selects every entry of a listing of `len` entries.
    #[must_use]
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
            bound: len,
        }
    }

    /// Ascending 0-based indices.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Length of the listing this selection was validated against.
    #[must_use]
    pub fn bound(&self) -> usize {
        self.bound
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

fn parse_position(raw: &str, token: &str) -> Result<u64, SelectionError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(token));
    }
    raw.parse::<u64>().map_err(|_| malformed(token))
}

fn malformed(token: &str) -> SelectionError {
    SelectionError::Malformed {
        token: token.to_string(),
    }
}
