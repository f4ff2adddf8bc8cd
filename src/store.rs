use crate::insights::InsightDocument;
use anyhow::Result;
use serde::de::IgnoredAny;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub enum InsightStoreError {
    NotFound,
    ReadError,
    Internal(String),
}

impl std::fmt::Display for InsightStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InsightStoreError::NotFound => write!(
                f,
                "Insights data not found. Please generate insights first."
            ),
            InsightStoreError::ReadError => {
                write!(f, "Error reading insights data")
            }
            InsightStoreError::Internal(msg) => {
                write!(f, "Internal server error: {}", msg)
            }
        }
    }
}

impl std::error::Error for InsightStoreError {}

/// Handle to the single insights artifact.
///
/// The batch run writes through it and the HTTP server reads through it;
/// there is no other shared state between the two.
#[derive(Debug, Clone)]
pub struct InsightStore {
    path: PathBuf,
}

impl InsightStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail early when the artifact could not be written, before any model
    /// calls are spent.
    #[instrument(level = "debug")]
    pub fn check_writable(&self) -> Result<()> {
        let directory = self.directory();
        if !directory.is_dir() {
            return Err(anyhow::anyhow!(
                "Directory for insights file at '{}' does not exist. Please create it manually.",
                directory.display()
            ));
        }
        if let Ok(metadata) = std::fs::metadata(&self.path) {
            if metadata.permissions().readonly() {
                return Err(anyhow::anyhow!(
                    "Cannot write to insights file at '{}'. Please check file permissions.",
                    self.path.display()
                ));
            }
        }
        Ok(())
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Replace the stored document. Readers see either the old document or
    /// the new one, never a partial write.
    #[instrument(skip(self, document), fields(path = %self.path.display()), err)]
    pub fn write_document(&self, document: &InsightDocument) -> Result<()> {
        let json = serde_json::to_vec_pretty(document)?;

        let mut temp = tempfile::NamedTempFile::new_in(self.directory())?;
        temp.write_all(&json)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to replace insights file '{}': {}",
                self.path.display(),
                e
            )
        })?;

        info!(
            "Saved {} guest profiles to {}",
            document.stats.total_reservations,
            self.path.display()
        );
        Ok(())
    }

    /// Raw bytes of the stored document, checked to be JSON but otherwise
    /// untouched.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read_raw(&self) -> Result<Vec<u8>, InsightStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InsightStoreError::NotFound)
            }
            Err(e) => return Err(InsightStoreError::Internal(e.to_string())),
        };

        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&bytes) {
            debug!("Stored insights are not valid JSON: {}", e);
            return Err(InsightStoreError::ReadError);
        }

        Ok(bytes)
    }

    /// The stored document, parsed into its typed form.
    pub async fn read_document(
        &self,
    ) -> Result<InsightDocument, InsightStoreError> {
        let bytes = self.read_raw().await?;
        serde_json::from_slice(&bytes).map_err(|_| InsightStoreError::ReadError)
    }
}
