//! Patch-ID Validator (C2)
//!
//! Validates and normalizes patch identifiers (`N` or `N-slug`), and
//! sanitizes free text into a kebab slug for interactive patch creation.
//! Grounded on `half_orm_dev/patch_validator.py`'s `PatchValidator`, recast
//! as a small free-function module in the teacher's style (`version.rs`'s
//! neighbor, not a stateful object — `PatchValidator` carried no state).

use crate::error::{HopError, HopResult};

/// A validated patch identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInfo {
  pub number: u64,
  pub slug: Option<String>,
  pub canonical: String,
}

/// Validate a patch id: either a bare positive integer, or `N-slug` where
/// slug is lowercase kebab-case (`[a-z0-9]+(-[a-z0-9]+)*`).
pub fn validate(id: &str) -> HopResult<PatchInfo> {
  let id = id.trim();
  if id.is_empty() {
    return Err(HopError::InvalidPatchId {
      id: id.to_string(),
      reason: "patch id is empty".to_string(),
    });
  }

  match id.split_once('-') {
    None => {
      let number = parse_number(id)?;
      Ok(PatchInfo {
        number,
        slug: None,
        canonical: number.to_string(),
      })
    }
    Some((num_part, slug_part)) => {
      let number = parse_number(num_part)?;
      validate_slug(slug_part).map_err(|reason| HopError::InvalidPatchId {
        id: id.to_string(),
        reason,
      })?;
      Ok(PatchInfo {
        number,
        slug: Some(slug_part.to_string()),
        canonical: format!("{}-{}", number, slug_part),
      })
    }
  }
}

fn parse_number(s: &str) -> HopResult<u64> {
  if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
    return Err(HopError::InvalidPatchId {
      id: s.to_string(),
      reason: "reservation number must be a non-negative integer".to_string(),
    });
  }
  if s.len() > 1 && s.starts_with('0') {
    return Err(HopError::InvalidPatchId {
      id: s.to_string(),
      reason: "reservation number must not have a leading zero".to_string(),
    });
  }
  s.parse::<u64>().map_err(|_| HopError::InvalidPatchId {
    id: s.to_string(),
    reason: "reservation number out of range".to_string(),
  })
}

fn validate_slug(slug: &str) -> Result<(), String> {
  if slug.is_empty() {
    return Err("slug must not be empty".to_string());
  }
  if slug.starts_with('-') || slug.ends_with('-') {
    return Err("slug must not start or end with a hyphen".to_string());
  }
  if slug.contains("--") {
    return Err("slug must not contain consecutive hyphens".to_string());
  }
  if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
    return Err("slug may only contain lowercase letters, digits, and hyphens".to_string());
  }
  Ok(())
}

/// Turn arbitrary free text into a safe kebab slug: lower-case, fold accents
/// to ASCII, replace non-alphanumerics with `-`, collapse runs of `-`, strip
/// leading/trailing hyphens, truncate at 50 characters. Empty input yields
/// the literal `"patch"`.
pub fn sanitize(free_text: &str) -> String {
  let folded: String = free_text.chars().map(fold_accent).collect();

  let mut slug = String::with_capacity(folded.len());
  let mut last_was_hyphen = false;
  for c in folded.chars() {
    if c.is_ascii_alphanumeric() {
      slug.push(c.to_ascii_lowercase());
      last_was_hyphen = false;
    } else if !last_was_hyphen && !slug.is_empty() {
      slug.push('-');
      last_was_hyphen = true;
    }
  }

  let trimmed = slug.trim_end_matches('-');
  let truncated = if trimmed.len() > 50 { &trimmed[..50] } else { trimmed };
  let truncated = truncated.trim_end_matches('-');

  if truncated.is_empty() {
    "patch".to_string()
  } else {
    truncated.to_string()
  }
}

/// Fold a handful of common accented Latin characters to plain ASCII.
/// Anything outside this table falls through unchanged and is later
/// dropped by `sanitize`'s alphanumeric filter.
fn fold_accent(c: char) -> char {
  match c {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
    'è' | 'é' | 'ê' | 'ë' => 'e',
    'ì' | 'í' | 'î' | 'ï' => 'i',
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
    'ù' | 'ú' | 'û' | 'ü' => 'u',
    'ý' | 'ÿ' => 'y',
    'ñ' => 'n',
    'ç' => 'c',
    other => other,
  }
}
