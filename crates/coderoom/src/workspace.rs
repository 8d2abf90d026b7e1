//! Per-request workspace management
//!
//! Every request gets a unique identifier from which all of its file paths
//! are derived. Paths are registered for cleanup as they are planned and
//! deleted individually when the request finishes.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::Placeholders;

/// The shared directory under which all workspaces live
#[derive(Debug, Clone)]
pub struct WorkspaceRoot {
    path: PathBuf,
}

impl WorkspaceRoot {
    /// Create the root directory if absent.
    ///
    /// Meant to run once at startup; calling it again for an existing
    /// directory is a no-op.
    pub fn prepare(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let path = std::fs::canonicalize(path)?;
        debug!(path = %path.display(), "workspace root ready");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocate a workspace under a fresh random identifier
    pub async fn allocate(
        &self,
        extension: &str,
        source_stem: Option<&str>,
    ) -> io::Result<Workspace> {
        let id = Uuid::new_v4().to_string();
        self.allocate_with_id(id, extension, source_stem).await
    }

    /// Allocate a workspace for a given identifier.
    ///
    /// Without `source_stem` the source is `<root>/<id>.<extension>`. With a
    /// stem (a name dictated by the source text) the workspace gets its own
    /// directory `<root>/<id>/` holding `<stem>.<extension>`, so that equal
    /// stems from concurrent requests never collide.
    #[instrument(skip(self))]
    pub async fn allocate_with_id(
        &self,
        id: String,
        extension: &str,
        source_stem: Option<&str>,
    ) -> io::Result<Workspace> {
        validate_file_name(&id)?;

        let (dir, scoped, stem) = match source_stem {
            Some(stem) => {
                validate_file_name(stem)?;
                let dir = self.path.join(&id);
                tokio::fs::create_dir(&dir).await?;
                (dir, true, stem.to_owned())
            }
            None => (self.path.clone(), false, id.clone()),
        };

        let source = dir.join(format!("{stem}.{extension}"));
        debug!(source = %source.display(), scoped, "workspace allocated");

        Ok(Workspace {
            id,
            dir,
            scoped,
            source,
            input: None,
            cleanup: Vec::new(),
            released: false,
        })
    }
}

/// Files backing a single request
///
/// # Cleanup
///
/// Call [`release()`](Self::release) when the request finishes, whatever the
/// outcome. A workspace dropped without release (a panic or a cancelled
/// request) deletes its files synchronously from `Drop` and logs a warning.
#[derive(Debug)]
pub struct Workspace {
    /// Request identifier
    id: String,

    /// Directory holding the request's files
    dir: PathBuf,

    /// Whether `dir` belongs to this request alone
    scoped: bool,

    /// Source file path
    source: PathBuf,

    /// Input file path, once written
    input: Option<PathBuf>,

    /// Paths deleted on release
    cleanup: Vec<PathBuf>,

    released: bool,
}

impl Workspace {
    /// Get the request identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Directory holding the request's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the directory is owned by this request alone
    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Source file name without extension
    pub fn source_stem(&self) -> &str {
        self.source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.id)
    }

    /// Path of the native binary for compiled languages
    pub fn binary_path(&self) -> PathBuf {
        self.dir.join(&self.id)
    }

    /// Path of the input file, if one was written
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// Get the path to a file in the workspace directory
    ///
    /// Returns an error if the name would escape the directory.
    pub fn file_path(&self, name: &str) -> io::Result<PathBuf> {
        validate_file_name(name)?;
        Ok(self.dir.join(name))
    }

    /// Paths currently registered for cleanup
    pub fn registered(&self) -> &[PathBuf] {
        &self.cleanup
    }

    /// Register a path to be deleted on release
    pub fn register_for_cleanup(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.cleanup.contains(&path) {
            self.cleanup.push(path);
        }
    }

    /// Write the source text verbatim
    #[instrument(skip(self, code), fields(id = %self.id))]
    pub async fn write_source(&mut self, code: &str) -> io::Result<&Path> {
        self.register_for_cleanup(self.source.clone());
        tokio::fs::write(&self.source, code).await?;
        debug!(len = code.len(), "wrote source file");
        Ok(self.source.as_path())
    }

    /// Write stdin text to `input_<id>.txt`
    #[instrument(skip(self, input), fields(id = %self.id))]
    pub async fn write_input(&mut self, input: &str) -> io::Result<&Path> {
        let path = self.dir.join(format!("input_{}.txt", self.id));
        self.register_for_cleanup(path.clone());
        tokio::fs::write(&path, input).await?;
        debug!(len = input.len(), "wrote input file");
        Ok(self.input.insert(path).as_path())
    }

    /// Template values for this workspace, with `artifact` set to the binary
    pub fn placeholders(&self) -> Placeholders {
        let binary = self.binary_path().to_string_lossy().into_owned();
        Placeholders {
            source: self.source.to_string_lossy().into_owned(),
            artifact: binary.clone(),
            binary,
            dir: self.dir.to_string_lossy().into_owned(),
            id: self.id.clone(),
            stem: self.source_stem().to_owned(),
            file: self
                .source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Delete every registered path, then the scoped directory.
    ///
    /// Each deletion is attempted independently. Missing files are fine;
    /// other failures are logged and never abort the remaining deletions.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn release(mut self) {
        self.released = true;

        for path in &self.cleanup {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
            }
        }

        if self.scoped {
            match tokio::fs::remove_dir_all(&self.dir).await {
                Ok(()) => debug!(dir = %self.dir.display(), "removed workspace directory"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "failed to remove workspace directory")
                }
            }
        }
    }

    fn release_blocking(&mut self) {
        for path in &self.cleanup {
            if let Err(e) = std::fs::remove_file(path)
                && e.kind() != io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %e, "best-effort removal failed");
            }
        }
        if self.scoped
            && let Err(e) = std::fs::remove_dir_all(&self.dir)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(dir = %self.dir.display(), error = %e, "best-effort removal failed");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                id = %self.id,
                "Workspace dropped without release, removing its files synchronously"
            );
            self.release_blocking();
        }
    }
}

fn validate_file_name(name: &str) -> io::Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\0') || name == "." || name == ".." {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid workspace file name: {name:?}"),
        ));
    }
    Ok(())
}
