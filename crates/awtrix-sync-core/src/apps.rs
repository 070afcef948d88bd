//! Widget definitions loaded from an apps directory.
//!
//! Every `*.json`, `*.yaml` or `*.yml` file in the directory is one producer.
//! Files are only read when the producer is invoked, so a broken file fails
//! its own unit and nothing else.
//!
//! ```yaml
//! name: ExampleApp
//! slides:
//!   - text: Hello from Example App!
//!     duration: 5
//!     color: "#FFFFFF"
//!     noScroll: false
//! ```

use crate::error::{ProducerError, RegistryError};
use crate::producer::{Producer, ProducerRegistry, Widget};
use crate::slide::SlideSet;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

#[derive(Debug, Deserialize)]
struct WidgetFile {
    name: String,
    #[serde(default)]
    slides: SlideSet,
}

// ---------------------------------------------------------------------------
// FileProducer
// ---------------------------------------------------------------------------

pub struct FileProducer {
    path: PathBuf,
}

impl FileProducer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn malformed(&self, reason: impl ToString) -> ProducerError {
        ProducerError::Malformed {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse(&self, data: &str) -> Result<WidgetFile, ProducerError> {
        let is_json = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(data).map_err(|e| self.malformed(e))
        } else {
            serde_yaml::from_str(data).map_err(|e| self.malformed(e))
        }
    }
}

#[async_trait]
impl Producer for FileProducer {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    async fn get_slides(&self) -> Result<Widget, ProducerError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        let file = self.parse(&data)?;
        Ok(Widget::new(file.name, file.slides))
    }
}

// ---------------------------------------------------------------------------
// DirectoryRegistry
// ---------------------------------------------------------------------------

/// Rescans `dir` on every discovery so added and removed files take effect
/// on the next cycle.
pub struct DirectoryRegistry {
    dir: PathBuf,
}

impl DirectoryRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn is_widget_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[async_trait]
impl ProducerRegistry for DirectoryRegistry {
    async fn discover(&self) -> Result<Vec<Arc<dyn Producer>>, RegistryError> {
        if !self.dir.is_dir() {
            return Err(RegistryError::MissingDir(self.dir.display().to_string()));
        }
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_widget_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        tracing::debug!(dir = %self.dir.display(), count = files.len(), "discovered widget files");
        Ok(files
            .into_iter()
            .map(|p| Arc::new(FileProducer::new(p)) as Arc<dyn Producer>)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
