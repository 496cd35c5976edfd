use crate::error::{RenderError, RenderErrorExt};
use fxhash::FxHashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Where template sources come from.
pub trait AssetSource: Send + Sync + 'static {
    /// Returns the source of template `name`, a relative slash separated path.
    ///
    /// # Errors
    /// [`RenderError::Asset`] if the file is missing or unreadable.
    fn read(&self, name: &str) -> Result<String, RenderError>;
}

/// Templates below a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirSource {
    fn read(&self, name: &str) -> Result<String, RenderError> {
        let rel = Path::new(name);
        if !rel.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(RenderError::Asset {
                source: io::Error::new(io::ErrorKind::InvalidInput, "path leaves the template root"),
                context: Some(name.to_owned().into()),
            });
        }

        let path = self.root.join(rel);
        tracing::trace!(path = %path.display(), "reading template");
        std::fs::read_to_string(&path).context(path.display().to_string())
    }
}

/// Templates held in memory, e.g. sources embedded with `include_str!`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: FxHashMap<String, String>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces template `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        Self { files: iter.into_iter().map(|(n, s)| (n.into(), s.into())).collect() }
    }
}

impl AssetSource for MemorySource {
    fn read(&self, name: &str) -> Result<String, RenderError> {
        self.files.get(name).cloned().ok_or_else(|| RenderError::Asset {
            source: io::Error::from(io::ErrorKind::NotFound),
            context: Some(name.to_owned().into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_source_stays_below_root() {
        let src = DirSource::new("templates");
        assert!(matches!(src.read("../secret"), Err(RenderError::Asset { .. })));
        assert!(matches!(src.read("/etc/passwd"), Err(RenderError::Asset { .. })));
    }

    #[test]
    fn test_memory_source_lookup() {
        let src: MemorySource = [("a.tmpl", "A")].into_iter().collect();
        assert_eq!(src.read("a.tmpl").unwrap(), "A");

        let err = src.read("b.tmpl").unwrap_err();
        assert!(err.to_string().contains("b.tmpl"), "{err}");
    }
}
