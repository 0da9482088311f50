//! Migration types and utilities.

use crate::error::{MigrationError, Result};
use crate::options::{MigrationOptions, OPTIONS_FILE};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// File name of the forward change-set inside a migration directory.
pub const UP_FILE: &str = "up.sql";

/// File name of the reverse change-set inside a migration directory.
pub const DOWN_FILE: &str = "down.sql";

const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of the current time used to stamp new migration versions.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One versioned, directional schema change.
///
/// The version orders migrations and identifies them in the store. The path
/// is where the migration came from; migrations read back from the store
/// have an empty path and no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    version: i64,
    path: String,
    up_content: String,
    down_content: String,
    options: MigrationOptions,
}

impl Migration {
    /// Create a migration from its parts.
    #[must_use]
    pub fn new(
        version: i64,
        path: impl Into<String>,
        up_content: impl Into<String>,
        down_content: impl Into<String>,
    ) -> Self {
        Self {
            version,
            path: path.into(),
            up_content: up_content.into(),
            down_content: down_content.into(),
            options: MigrationOptions::default(),
        }
    }

    /// A content-less migration standing for a version recorded in a store.
    #[must_use]
    pub fn applied(version: i64) -> Self {
        Self::new(version, "", "", "")
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a migration from the raw documents of one migration directory.
    ///
    /// The version is taken from the last component of `path`. Forward
    /// content is required, reverse content and options are not.
    pub fn from_parts(
        path: impl Into<String>,
        up_content: Option<&str>,
        down_content: Option<&str>,
        options: Option<&str>,
    ) -> Result<Self> {
        let path = path.into();
        let version = version_from_path(&path)?;

        let Some(up_content) = up_content else {
            return Err(MigrationError::MissingContent { path });
        };
        let options = MigrationOptions::parse(&path, options)?;

        Ok(Self {
            version,
            up_content: up_content.to_string(),
            down_content: down_content.unwrap_or_default().to_string(),
            options,
            path,
        })
    }

    /// Read a migration from a directory laid out like:
    ///
    /// ```text
    /// 20170329154959_introduce_domain_model/
    /// ├── down.sql
    /// ├── options.json
    /// └── up.sql
    /// ```
    pub fn from_path(dir: &Path) -> Result<Self> {
        let path = dir.to_string_lossy().into_owned();
        // Fail on the name before touching any file.
        version_from_path(&path)?;

        let up_content = read_optional(&dir.join(UP_FILE))?;
        let down_content = read_optional(&dir.join(DOWN_FILE))?;
        let options = read_optional(&dir.join(OPTIONS_FILE))?;

        Self::from_parts(
            path,
            up_content.as_deref(),
            down_content.as_deref(),
            options.as_deref(),
        )
    }

    /// Generate a new blank migration named after `description`, versioned
    /// with the clock's current time.
    pub fn generate(description: &str, clock: &dyn Clock) -> Result<Self> {
        let stamp = clock.now().format(VERSION_FORMAT).to_string();
        let version = stamp
            .parse::<i64>()
            .map_err(|_| MigrationError::MalformedVersion { name: stamp.clone() })?;

        let path = format!("{}_{}", version, normalize_name(description));
        Ok(Self::new(version, path, "", ""))
    }

    /// Ordering and identity key.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Where the migration came from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The description part of the path, after the version prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        let base = base_name(&self.path);
        base.split_once('_').map_or("", |(_, name)| name)
    }

    /// Forward change-set.
    #[must_use]
    pub fn up_content(&self) -> &str {
        &self.up_content
    }

    /// Reverse change-set. May be empty.
    #[must_use]
    pub fn down_content(&self) -> &str {
        &self.down_content
    }

    /// Per-migration options.
    #[must_use]
    pub fn options(&self) -> MigrationOptions {
        self.options
    }

    /// True when the migration has reverse content.
    #[must_use]
    pub fn reversible(&self) -> bool {
        !self.down_content.is_empty()
    }

    /// True for migrations backed by a real source location.
    #[must_use]
    pub fn persistable(&self) -> bool {
        !self.path.is_empty()
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            "" => write!(f, "{}", self.version),
            name => write!(f, "{} - {}", self.version, name),
        }
    }
}

fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

fn version_from_path(path: &str) -> Result<i64> {
    let base = base_name(path);
    let prefix = base.split_once('_').map_or(base, |(prefix, _)| prefix);

    let malformed = || MigrationError::MalformedVersion {
        name: base.to_string(),
    };

    // Digits only: `i64::from_str` would also take a leading sign.
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    prefix.parse::<i64>().map_err(|_| malformed())
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

fn normalize_name(description: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(description.trim(), "${1}_${2}")
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// An ordered collection of migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migrations(Vec<Migration>);

impl Migrations {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a migration.
    pub fn push(&mut self, migration: Migration) {
        self.0.push(migration);
    }

    /// Sort ascending by version.
    pub fn sort(&mut self) {
        self.0.sort_by_key(Migration::version);
    }

    /// Sorted copy of the collection.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Migrations in `self` missing from `other`, followed by migrations in
    /// `other` missing from `self`, compared by version.
    ///
    /// This is a symmetric difference on purpose: an applied version that
    /// no longer exists in the source shows up in the result too.
    #[must_use]
    pub fn except(&self, other: &Migrations) -> Migrations {
        let ours: HashSet<i64> = self.0.iter().map(Migration::version).collect();
        let theirs: HashSet<i64> = other.0.iter().map(Migration::version).collect();

        self.0
            .iter()
            .filter(|m| !theirs.contains(&m.version))
            .chain(other.0.iter().filter(|m| !ours.contains(&m.version)))
            .cloned()
            .collect()
    }

    /// The migration with the highest version.
    #[must_use]
    pub fn current(&self) -> Option<&Migration> {
        self.0.iter().max_by_key(|m| m.version)
    }

    /// Find a migration by version.
    #[must_use]
    pub fn find(&self, version: i64) -> Option<&Migration> {
        self.0.iter().find(|m| m.version == version)
    }

    /// Versions in collection order.
    #[must_use]
    pub fn versions(&self) -> Vec<i64> {
        self.0.iter().map(Migration::version).collect()
    }

    /// Fail on the first version that appears twice.
    pub fn ensure_unique_versions(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for migration in &self.0 {
            if !seen.insert(migration.version) {
                return Err(MigrationError::DuplicateVersion {
                    version: migration.version,
                });
            }
        }
        Ok(())
    }

    /// Iterate in collection order.
    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.0.iter()
    }

    /// Number of migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no migrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the inner vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Migration> {
        self.0
    }
}

impl From<Vec<Migration>> for Migrations {
    fn from(migrations: Vec<Migration>) -> Self {
        Self(migrations)
    }
}

impl FromIterator<Migration> for Migrations {
    fn from_iter<I: IntoIterator<Item = Migration>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Migration> for Migrations {
    fn extend<I: IntoIterator<Item = Migration>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Migrations {
    type Item = Migration;
    type IntoIter = std::vec::IntoIter<Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Migrations {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
