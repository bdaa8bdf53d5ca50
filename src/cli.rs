//! Command-line surface (spec §6)
//!
//! `hop dev <verb>`: a single wrapping subcommand, mirrored on the
//! teacher's `CargoCli::Rail(RailCli)` nesting (`main.rs`) even though this
//! binary is invoked directly rather than as a cargo plugin.

use crate::version::ReleaseKind;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "hop")]
#[command(bin_name = "hop")]
#[command(version, about, long_about = None)]
#[command(styles = crate::get_styles())]
pub struct HopCli {
  #[command(subcommand)]
  pub command: TopCommand,
}

#[derive(Subcommand)]
pub enum TopCommand {
  /// Developer lifecycle commands (schema + patch + release management)
  Dev {
    #[command(subcommand)]
    verb: DevCommand,
  },
}

/// Bump kind for `prepare-release`, convertible into [`ReleaseKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReleaseKindArg {
  Major,
  Minor,
  Patch,
}

impl From<ReleaseKindArg> for ReleaseKind {
  fn from(arg: ReleaseKindArg) -> Self {
    match arg {
      ReleaseKindArg::Major => ReleaseKind::Major,
      ReleaseKindArg::Minor => ReleaseKind::Minor,
      ReleaseKindArg::Patch => ReleaseKind::Patch,
    }
  }
}

#[derive(Subcommand)]
pub enum DevCommand {
  /// Provision a database connection file and (optionally) the database itself
  InitDatabase {
    /// The name this database will be known by, both in HALFORM_CONF_DIR and as the package name
    database_name: String,
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 5432)]
    port: u16,
    /// Connection user; defaults to $USER
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Run `createdb` before writing the connection file
    #[arg(long)]
    create_db: bool,
    /// Provision the half_orm_meta schema/tables after creating the database
    #[arg(long)]
    add_metadata: bool,
    /// Mark this connection file as a production target
    #[arg(long)]
    production: bool,
  },

  /// Scaffold a new Git-centric project directory around an existing database config
  InitProject {
    /// Also used as the Python package name; must already have a connection file
    database_name: String,
    /// Git remote to set as `origin` and push the initial commit/branch to
    #[arg(long)]
    origin: Option<String>,
  },

  /// Reserve a patch number/slug and scaffold its directory and branch
  CreatePatch {
    /// A bare number, or `<N>-<kebab-slug>`
    id_or_number: String,
  },

  /// Open a new release stage for the next major/minor/patch version
  PrepareRelease {
    #[arg(value_enum)]
    kind: ReleaseKindArg,
  },

  /// Merge a patch branch into ho-prod and record it in the open stage
  AddToRelease {
    patch_id: String,
    /// The release this patch is staged into, e.g. 1.4.0
    #[arg(long)]
    version: String,
  },

  /// Freeze a fully-staged release stage into the next release candidate
  PromoteToRc {
    #[arg(long)]
    version: String,
  },

  /// Tag the highest release candidate as the production release
  PromoteToProd {
    #[arg(long)]
    version: String,
  },

  /// Apply a release's staged patches and bootstrap scripts to a target database
  DeployToProd {
    #[arg(long)]
    version: String,
  },

  /// Run pending bootstrap/<N>-<patch>-<version>.{sql,py} scripts
  Bootstrap {
    /// Show what would run without executing it
    #[arg(long)]
    dry_run: bool,
    /// Re-run scripts already recorded as executed
    #[arg(long)]
    force: bool,
  },

  /// Run one patch's files, in order, against the developer database
  ApplyPatch { patch_id: String },

  /// Regenerate the Python package and schema snapshot from the live database
  SyncPackage,

  /// Bring a production database up to the latest tagged release
  Upgrade,

  /// Rebuild a database from a schema snapshot plus every release's staged data
  Restore {
    /// The version whose schema-<version>.sql snapshot to restore from
    version: String,
  },

  /// Restore a database to the production version immediately before the current one
  Rollback,

  /// Create a patch rooted at an already-released maintenance line instead of ho-prod
  CreateHotfix {
    /// The released version this hotfix is based on, e.g. 1.4.0
    base_version: String,
    id_or_number: String,
  },
}
