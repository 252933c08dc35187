//! The shared "currently loaded document" slot.

use crate::document::OpenApiDocument;
use crate::error::DocumentError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A loaded document together with where it came from.
#[derive(Debug)]
pub struct LoadedDocument {
    /// Path the document was read from.
    pub path: PathBuf,
    /// The parsed document.
    pub document: OpenApiDocument,
}

/// Holds at most one loaded document, shared by every tool.
///
/// Loading is copy-on-load: the file is read and parsed without holding the
/// lock, and the finished document is swapped in under a short write guard.
/// Readers clone an `Arc` under a read guard, so they always see either the
/// previous document or the new one in full, and keep using their snapshot
/// even if another load replaces it meanwhile. A failed load leaves the
/// previous document in place.
#[derive(Debug, Default)]
pub struct DocumentStore {
    slot: RwLock<Option<Arc<LoadedDocument>>>,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads, parses and installs the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns the read or parse failure; the store is unchanged.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<LoadedDocument>, DocumentError> {
        let path = path.as_ref();
        let document = match OpenApiDocument::read(path).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to load OpenAPI document");
                return Err(err);
            }
        };

        tracing::info!(
            path = %path.display(),
            title = %document.info.title,
            paths = document.paths.len(),
            "loaded OpenAPI document"
        );
        Ok(self.replace(LoadedDocument {
            path: path.to_path_buf(),
            document,
        }))
    }

    /// Installs an already-parsed document, returning the new snapshot.
    pub fn replace(&self, loaded: LoadedDocument) -> Arc<LoadedDocument> {
        let loaded = Arc::new(loaded);
        *self.slot.write() = Some(Arc::clone(&loaded));
        loaded
    }

    /// Returns a snapshot of the current document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotLoaded`] if nothing has been loaded.
    pub fn current(&self) -> Result<Arc<LoadedDocument>, DocumentError> {
        self.slot.read().clone().ok_or(DocumentError::NotLoaded)
    }

    /// Returns `true` once a document has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Drops the current document.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}
