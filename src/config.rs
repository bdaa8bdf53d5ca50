//! Configuration (C-ambient, spec §4.10 / §6)
//!
//! Two INI-backed config surfaces, grounded in shape on the teacher's
//! `RailConfig` (`core/config.rs`) even though the file format differs (INI
//! here, via the `ini` crate, rather than TOML — the original system's
//! `configparser`-based files are INI and there is no reason to translate
//! them into a different format): the project config at `.hop/config` and
//! per-database connection files under `HALFORM_CONF_DIR`.

use crate::error::{HopError, HopResult, ResultExt};
use ini::Ini;
use std::path::{Path, PathBuf};

const DEFAULT_CONF_DIR: &str = "/etc/half_orm";

/// `.hop/config`'s `[halfORM]` section.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
  pub hop_version: String,
  pub git_origin: Option<String>,
  pub devel: bool,
  /// Legacy field, kept only as a fallback in database-config-name resolution.
  pub package_name: Option<String>,
}

impl ProjectConfig {
  /// Load `<hop_dir>/config`.
  pub fn load(hop_dir: &Path) -> HopResult<Self> {
    let path = hop_dir.join("config");
    let ini = Ini::load_from_file(&path).context(format!("failed to read {}", path.display()))?;
    let section = ini
      .section(Some("halfORM"))
      .ok_or_else(|| HopError::message(format!("{} is missing a [halfORM] section", path.display())))?;

    let hop_version = section
      .get("hop_version")
      .ok_or_else(|| HopError::message(format!("{} is missing 'hop_version'", path.display())))?
      .to_string();

    Ok(Self {
      hop_version,
      git_origin: section.get("git_origin").map(str::to_string),
      devel: section.get("devel").map(parse_bool).unwrap_or(false),
      package_name: section.get("package_name").map(str::to_string),
    })
  }

  /// Write `<hop_dir>/config`.
  pub fn save(&self, hop_dir: &Path) -> HopResult<()> {
    let mut ini = Ini::new();
    {
      let section = ini.with_section(Some("halfORM"));
      section.set("hop_version", &self.hop_version);
      section.set("devel", if self.devel { "True" } else { "False" });
      if let Some(origin) = &self.git_origin {
        section.set("git_origin", origin);
      }
      if let Some(pkg) = &self.package_name {
        section.set("package_name", pkg);
      }
    }
    let path = hop_dir.join("config");
    ini.write_to_file(&path).context(format!("failed to write {}", path.display()))?;
    Ok(())
  }
}

/// A per-database connection file under `HALFORM_CONF_DIR`.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
  pub name: String,
  pub user: String,
  pub password: Option<String>,
  pub host: Option<String>,
  pub port: u16,
  pub production: bool,
}

impl DatabaseConfig {
  /// Load the connection file for `db_config_name` from `conf_dir`.
  pub fn load(conf_dir: &Path, db_config_name: &str) -> HopResult<Self> {
    let path = conf_dir.join(db_config_name);
    if !path.exists() {
      return Err(HopError::DatabaseNotConfigured {
        name: db_config_name.to_string(),
      });
    }
    let ini = Ini::load_from_file(&path).context(format!("failed to read {}", path.display()))?;
    let section = ini
      .section(Some("database"))
      .ok_or_else(|| HopError::message(format!("{} is missing a [database] section", path.display())))?;

    let name = section
      .get("name")
      .ok_or_else(|| HopError::message(format!("{} is missing 'name'", path.display())))?
      .to_string();

    let user = section.get("user").map(str::to_string).unwrap_or_else(default_user);

    let port = section
      .get("port")
      .map(|p| {
        p.parse::<u16>()
          .map_err(|_| HopError::message(format!("{} has a non-numeric port '{}'", path.display(), p)))
      })
      .transpose()?
      .unwrap_or(5432);

    Ok(Self {
      name,
      user,
      password: section.get("password").filter(|p| !p.is_empty()).map(str::to_string),
      host: section.get("host").filter(|h| !h.is_empty()).map(str::to_string),
      port,
      production: section.get("production").map(parse_bool).unwrap_or(false),
    })
  }

  /// Write a connection file for this config to `conf_dir`.
  pub fn save(&self, conf_dir: &Path) -> HopResult<()> {
    let mut ini = Ini::new();
    {
      let section = ini.with_section(Some("database"));
      section.set("name", &self.name);
      section.set("user", &self.user);
      section.set("password", self.password.as_deref().unwrap_or(""));
      section.set("host", self.host.as_deref().unwrap_or(""));
      section.set("port", self.port.to_string());
      section.set("production", if self.production { "True" } else { "False" });
    }
    std::fs::create_dir_all(conf_dir).context(format!("failed to create {}", conf_dir.display()))?;
    let path = conf_dir.join(&self.name);
    ini.write_to_file(&path).context(format!("failed to write {}", path.display()))?;
    Ok(())
  }
}

/// `HALFORM_CONF_DIR`, defaulting to `/etc/half_orm`.
pub fn conf_dir() -> PathBuf {
  std::env::var("HALFORM_CONF_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_CONF_DIR))
}

/// The `USER` environment variable, defaulting to `"postgres"` when unset
/// (matches the original tool's fallback for a default database user).
pub fn default_user() -> String {
  std::env::var("USER").unwrap_or_else(|_| "postgres".to_string())
}

/// Three-priority database-config-name resolution (spec §4.10): the
/// clone-local override, then the legacy package name, then the project
/// directory's basename.
pub fn resolve_db_config_name(project_root: &Path, project_config: &ProjectConfig) -> String {
  if let Ok(contents) = std::fs::read_to_string(project_root.join(".hop").join("alt_config")) {
    let trimmed = contents.trim();
    if !trimmed.is_empty() {
      return trimmed.to_string();
    }
  }

  if let Some(package_name) = &project_config.package_name {
    if !package_name.is_empty() {
      return package_name.clone();
    }
  }

  project_root
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_else(|| "hop".to_string())
}

fn parse_bool(s: &str) -> bool {
  matches!(s.trim(), "True" | "true" | "1" | "yes" | "Yes")
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn project_config_round_trips() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".hop")).unwrap();
    let config = ProjectConfig {
      hop_version: "1.2.3".to_string(),
      git_origin: Some("git@example.com:org/repo.git".to_string()),
      devel: true,
      package_name: None,
    };
    config.save(&dir.path().join(".hop")).unwrap();
    let loaded = ProjectConfig::load(&dir.path().join(".hop")).unwrap();
    assert_eq!(loaded.hop_version, "1.2.3");
    assert!(loaded.devel);
    assert_eq!(loaded.git_origin.as_deref(), Some("git@example.com:org/repo.git"));
  }

  #[test]
  fn database_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
      name: "my_db".to_string(),
      user: "app".to_string(),
      password: None,
      host: Some("localhost".to_string()),
      port: 5433,
      production: false,
    };
    config.save(dir.path()).unwrap();
    let loaded = DatabaseConfig::load(dir.path(), "my_db").unwrap();
    assert_eq!(loaded.name, "my_db");
    assert_eq!(loaded.port, 5433);
    assert_eq!(loaded.host.as_deref(), Some("localhost"));
    assert!(loaded.password.is_none());
  }

  #[test]
  fn missing_database_config_is_a_typed_error() {
    let dir = TempDir::new().unwrap();
    let err = DatabaseConfig::load(dir.path(), "absent").unwrap_err();
    assert!(matches!(err, HopError::DatabaseNotConfigured { .. }));
  }

  #[test]
  fn alt_config_takes_priority_over_package_name() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".hop")).unwrap();
    std::fs::write(dir.path().join(".hop").join("alt_config"), "  overridden_db  \n").unwrap();
    let config = ProjectConfig {
      hop_version: "1.0.0".to_string(),
      git_origin: None,
      devel: false,
      package_name: Some("legacy_pkg".to_string()),
    };
    assert_eq!(resolve_db_config_name(dir.path(), &config), "overridden_db");
  }

  #[test]
  fn falls_back_to_package_name_then_dirname() {
    let dir = TempDir::new().unwrap();
    let with_pkg = ProjectConfig {
      hop_version: "1.0.0".to_string(),
      git_origin: None,
      devel: false,
      package_name: Some("legacy_pkg".to_string()),
    };
    assert_eq!(resolve_db_config_name(dir.path(), &with_pkg), "legacy_pkg");

    let without_pkg = ProjectConfig {
      package_name: None,
      ..with_pkg
    };
    assert_eq!(
      resolve_db_config_name(dir.path(), &without_pkg),
      dir.path().file_name().unwrap().to_string_lossy()
    );
  }
}
