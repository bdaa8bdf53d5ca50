//! Version Resolver (C1)
//!
//! Parses and expands semantic version specs, computes next versions, and
//! projects versions onto branch and tag names.
//!
//! Grounded on `half_orm_dev/version_parser.py`'s `VersionParser`, recast as
//! the teacher's `BumpType`/`ReleaseConfig` value-type style
//! (`src/release/plan.rs`, `crates/cargo-rail/src/commands/release/semver.rs`).
//! The pre-release grammar (`alpha|beta|rc|dev` with an optional positive
//! suffix) diverges from upstream SemVer's prerelease identifiers, so it is
//! hand-rolled here rather than delegated to the `semver` crate.

use crate::error::{HopError, HopResult};
use std::cmp::Ordering;
use std::fmt;

/// The three components that can be bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseKind {
  Patch,
  Minor,
  Major,
}

impl fmt::Display for ReleaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseKind::Major => write!(f, "major"),
      ReleaseKind::Minor => write!(f, "minor"),
      ReleaseKind::Patch => write!(f, "patch"),
    }
  }
}

/// One of the four recognized pre-release tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreReleaseKind {
  Dev,
  Alpha,
  Beta,
  Rc,
}

impl PreReleaseKind {
  pub(crate) fn as_str(self) -> &'static str {
    match self {
      PreReleaseKind::Alpha => "alpha",
      PreReleaseKind::Beta => "beta",
      PreReleaseKind::Rc => "rc",
      PreReleaseKind::Dev => "dev",
    }
  }

  fn parse(s: &str) -> Option<Self> {
    match s {
      "alpha" => Some(PreReleaseKind::Alpha),
      "beta" => Some(PreReleaseKind::Beta),
      "rc" => Some(PreReleaseKind::Rc),
      "dev" => Some(PreReleaseKind::Dev),
      _ => None,
    }
  }
}

/// A pre-release suffix, e.g. `alpha1`, `rc2`, bare `dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreRelease {
  pub kind: PreReleaseKind,
  pub num: Option<u32>,
}

impl fmt::Display for PreRelease {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.num {
      Some(n) => write!(f, "{}{}", self.kind.as_str(), n),
      None => write!(f, "{}", self.kind.as_str()),
    }
  }
}

impl PartialOrd for PreRelease {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for PreRelease {
  fn cmp(&self, other: &Self) -> Ordering {
    self.kind.cmp(&other.kind).then_with(|| self.num.unwrap_or(0).cmp(&other.num.unwrap_or(0)))
  }
}

/// Which branch namespace a rendered name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
  /// `ho/<M>.<m>.x` — production maintenance line.
  Production,
  /// `ho-dev/<M>.<m>.x` — development maintenance line.
  Development,
  /// `main`, version-independent.
  Main,
}

/// A fully parsed, canonical semantic version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub pre_release: Option<PreRelease>,
}

impl PartialOrd for VersionInfo {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for VersionInfo {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.major, self.minor, self.patch)
      .cmp(&(other.major, other.minor, other.patch))
      .then_with(|| match (&self.pre_release, &other.pre_release) {
        (None, None) => Ordering::Equal,
        // Release > pre-release of the same (major, minor, patch).
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
      })
  }
}

impl VersionInfo {
  pub const ZERO: VersionInfo = VersionInfo {
    major: 0,
    minor: 0,
    patch: 0,
    pre_release: None,
  };

  /// Parse any of `N`, `N.M`, `N.M.P`, `N.M.P-pre` and expand to the
  /// canonical `(major, minor, patch, pre_release)` tuple.
  pub fn parse(spec: &str) -> HopResult<Self> {
    let spec = spec.trim();
    if spec.is_empty() {
      return Err(HopError::InvalidVersion {
        spec: spec.to_string(),
        reason: "version spec is empty".to_string(),
      });
    }

    let (numeric_part, pre_release) = match spec.split_once('-') {
      Some((base, suffix)) => (base, Some(Self::parse_pre_release(spec, suffix)?)),
      None => (spec, None),
    };

    let fields: Vec<&str> = numeric_part.split('.').collect();
    if fields.is_empty() || fields.len() > 3 {
      return Err(HopError::InvalidVersion {
        spec: spec.to_string(),
        reason: "expected 1 to 3 dot-separated numeric components".to_string(),
      });
    }

    let mut parsed = [0u64; 3];
    for (i, field) in fields.iter().enumerate() {
      parsed[i] = Self::parse_component(spec, field)?;
    }

    Ok(VersionInfo {
      major: parsed[0],
      minor: parsed[1],
      patch: parsed[2],
      pre_release,
    })
  }

  fn parse_component(spec: &str, field: &str) -> HopResult<u64> {
    if field.is_empty() || (field.len() > 1 && field.starts_with('0')) {
      return Err(HopError::InvalidVersion {
        spec: spec.to_string(),
        reason: format!("component '{}' has a leading zero or is empty", field),
      });
    }
    field.parse::<u64>().map_err(|_| HopError::InvalidVersion {
      spec: spec.to_string(),
      reason: format!("component '{}' is not a non-negative integer", field),
    })
  }

  fn parse_pre_release(spec: &str, suffix: &str) -> HopResult<PreRelease> {
    let split_at = suffix.find(|c: char| c.is_ascii_digit()).unwrap_or(suffix.len());
    let (token, num_str) = suffix.split_at(split_at);

    let kind = PreReleaseKind::parse(token).ok_or_else(|| HopError::InvalidVersion {
      spec: spec.to_string(),
      reason: format!("unknown pre-release token '{}' (expected alpha, beta, rc, or dev)", token),
    })?;

    let num = if num_str.is_empty() {
      None
    } else {
      let n: u32 = num_str.parse().map_err(|_| HopError::InvalidVersion {
        spec: spec.to_string(),
        reason: format!("pre-release suffix '{}' is not numeric", num_str),
      })?;
      if n == 0 {
        return Err(HopError::InvalidVersion {
          spec: spec.to_string(),
          reason: "pre-release suffix must not be 0".to_string(),
        });
      }
      Some(n)
    };

    Ok(PreRelease { kind, num })
  }

  /// Render back to the canonical string form. `render(parse(s)) == canonical(s)`.
  pub fn render(&self) -> String {
    match &self.pre_release {
      Some(pre) => format!("{}.{}.{}-{}", self.major, self.minor, self.patch, pre),
      None => format!("{}.{}.{}", self.major, self.minor, self.patch),
    }
  }

  /// The highest component that differs between `target` and `current`.
  pub fn determine_release_type(target: &Self, current: &Self) -> ReleaseKind {
    if target.major != current.major {
      ReleaseKind::Major
    } else if target.minor != current.minor {
      ReleaseKind::Minor
    } else {
      ReleaseKind::Patch
    }
  }

  /// `target` must be strictly greater than `current`.
  pub fn validate_progression(current: &Self, target: &Self) -> HopResult<()> {
    if target > current {
      Ok(())
    } else {
      Err(HopError::VersionProgression {
        current: current.render(),
        target: target.render(),
      })
    }
  }

  /// Increment the named component, zeroing the lower-order ones, dropping
  /// any pre-release tag.
  pub fn next_version(current: &Self, kind: ReleaseKind) -> Self {
    match kind {
      ReleaseKind::Major => VersionInfo {
        major: current.major + 1,
        minor: 0,
        patch: 0,
        pre_release: None,
      },
      ReleaseKind::Minor => VersionInfo {
        major: current.major,
        minor: current.minor + 1,
        patch: 0,
        pre_release: None,
      },
      ReleaseKind::Patch => VersionInfo {
        major: current.major,
        minor: current.minor,
        patch: current.patch + 1,
        pre_release: None,
      },
    }
  }

  /// The maintenance-line branch name for this version.
  pub fn branch_name(&self, kind: BranchKind) -> String {
    match kind {
      BranchKind::Main => "main".to_string(),
      BranchKind::Production => format!("ho/{}.{}.x", self.major, self.minor),
      BranchKind::Development => format!("ho-dev/{}.{}.x", self.major, self.minor),
    }
  }

  /// The Git release tag for this version.
  pub fn release_tag(&self) -> String {
    format!("v{}", self.render())
  }
}

impl fmt::Display for VersionInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.render())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_partial_specs() {
    let v = VersionInfo::parse("1.3").unwrap();
    assert_eq!(v.render(), "1.3.0");
    let v = VersionInfo::parse("2").unwrap();
    assert_eq!(v.render(), "2.0.0");
  }

  #[test]
  fn parses_pre_release() {
    let v = VersionInfo::parse("1.2.3-alpha1").unwrap();
    assert_eq!(v.pre_release, Some(PreRelease { kind: PreReleaseKind::Alpha, num: Some(1) }));
    assert_eq!(v.render(), "1.2.3-alpha1");
    assert_eq!(v.release_tag(), "v1.2.3-alpha1");
    assert_eq!(v.branch_name(BranchKind::Development), "ho-dev/1.2.x");
  }

  #[test]
  fn bare_pre_release_token_is_valid() {
    let v = VersionInfo::parse("1.2.3-dev").unwrap();
    assert_eq!(v.pre_release, Some(PreRelease { kind: PreReleaseKind::Dev, num: None }));
  }

  #[test]
  fn rejects_leading_zero() {
    assert!(VersionInfo::parse("01.2.3").is_err());
    assert!(VersionInfo::parse("1.02.3").is_err());
  }

  #[test]
  fn rejects_zero_suffix() {
    assert!(VersionInfo::parse("1.2.3-alpha0").is_err());
  }

  #[test]
  fn rejects_unknown_prerelease_token() {
    assert!(VersionInfo::parse("1.2.3-snapshot1").is_err());
  }

  #[test]
  fn round_trips() {
    for s in ["0.0.0", "1.0.0", "2.3.4", "1.2.3-alpha1", "1.2.3-beta", "10.20.30-rc12", "1.2.3-dev"] {
      let v = VersionInfo::parse(s).unwrap();
      assert_eq!(v.render(), s);
    }
  }

  #[test]
  fn ordering_release_beats_prerelease_of_same_triple() {
    let pre = VersionInfo::parse("1.0.0-rc1").unwrap();
    let release = VersionInfo::parse("1.0.0").unwrap();
    assert!(release > pre);
  }

  #[test]
  fn ordering_is_lexicographic_on_triple() {
    let a = VersionInfo::parse("1.9.9").unwrap();
    let b = VersionInfo::parse("2.0.0").unwrap();
    assert!(b > a);
  }

  #[test]
  fn determine_release_type_picks_highest_differing_component() {
    let current = VersionInfo::parse("1.2.3").unwrap();
    assert_eq!(
      VersionInfo::determine_release_type(&VersionInfo::parse("2.0.0").unwrap(), &current),
      ReleaseKind::Major
    );
    assert_eq!(
      VersionInfo::determine_release_type(&VersionInfo::parse("1.3.0").unwrap(), &current),
      ReleaseKind::Minor
    );
    assert_eq!(
      VersionInfo::determine_release_type(&VersionInfo::parse("1.2.4").unwrap(), &current),
      ReleaseKind::Patch
    );
  }

  #[test]
  fn next_version_zeroes_lower_components() {
    let current = VersionInfo::parse("1.2.3").unwrap();
    assert_eq!(VersionInfo::next_version(&current, ReleaseKind::Major).render(), "2.0.0");
    assert_eq!(VersionInfo::next_version(&current, ReleaseKind::Minor).render(), "1.3.0");
    assert_eq!(VersionInfo::next_version(&current, ReleaseKind::Patch).render(), "1.2.4");
  }

  #[test]
  fn validate_progression_rejects_non_increase() {
    let current = VersionInfo::parse("1.2.3").unwrap();
    assert!(VersionInfo::validate_progression(&current, &current).is_err());
    let lower = VersionInfo::parse("1.0.0").unwrap();
    assert!(VersionInfo::validate_progression(&current, &lower).is_err());
  }
}
