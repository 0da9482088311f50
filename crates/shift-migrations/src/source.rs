//! Migration sources.
//!
//! A source enumerates every migration known to exist. Both sources here read
//! the same layout, one directory per migration:
//!
//! ```text
//! migrations/
//! ├── 20170329154959_introduce_domain_model/
//! │   ├── down.sql
//! │   └── up.sql
//! └── 20180905150724_concurrent_migration/
//!     ├── options.json
//!     └── up.sql
//! ```

use crate::error::{MigrationError, Result};
use crate::migration::{Migration, Migrations, DOWN_FILE, UP_FILE};
use crate::options::OPTIONS_FILE;
use include_dir::Dir;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Provider of the complete candidate migration set.
pub trait Source: Send + Sync {
    /// Collect every migration, sorted ascending by version.
    fn collect(&self) -> Result<Migrations>;
}

/// Migrations stored in directories on disk.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    dir: PathBuf,
}

impl FileSystemSource {
    /// Create a source rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Source for FileSystemSource {
    fn collect(&self) -> Result<Migrations> {
        let mut migrations = Migrations::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_dir() {
                migrations.push(Migration::from_path(&path)?);
            }
        }

        debug!(dir = %self.dir.display(), count = migrations.len(), "Collected migrations");
        finish(migrations)
    }
}

/// Migrations compiled into the binary with [`include_dir::include_dir!`].
///
/// ```rust,ignore
/// use include_dir::{include_dir, Dir};
///
/// static MIGRATIONS: Dir = include_dir!("$CARGO_MANIFEST_DIR/db/migrations");
///
/// let source = EmbeddedSource::new(&MIGRATIONS);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSource {
    root: &'static Dir<'static>,
}

impl EmbeddedSource {
    /// Create a source over an embedded directory.
    #[must_use]
    pub fn new(root: &'static Dir<'static>) -> Self {
        Self { root }
    }
}

impl Source for EmbeddedSource {
    fn collect(&self) -> Result<Migrations> {
        let migrations = self
            .root
            .dirs()
            .map(|dir| {
                Migration::from_parts(
                    dir.path().to_string_lossy(),
                    embedded_file(dir, UP_FILE)?,
                    embedded_file(dir, DOWN_FILE)?,
                    embedded_file(dir, OPTIONS_FILE)?,
                )
            })
            .collect::<Result<Migrations>>()?;

        debug!(count = migrations.len(), "Collected embedded migrations");
        finish(migrations)
    }
}

fn embedded_file<'a>(dir: &'a Dir<'a>, name: &str) -> Result<Option<&'a str>> {
    let Some(file) = dir
        .files()
        .find(|file| file.path().file_name().is_some_and(|n| n == name))
    else {
        return Ok(None);
    };

    file.contents_utf8().map(Some).ok_or_else(|| {
        MigrationError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8", file.path().display()),
        ))
    })
}

fn finish(migrations: Migrations) -> Result<Migrations> {
    let migrations = migrations.sorted();
    migrations.ensure_unique_versions()?;
    Ok(migrations)
}
