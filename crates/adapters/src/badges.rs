//! Badge sinks: where produced grades end up

use async_trait::async_trait;
use nutri_grade_domain::{Grade, PresentError, PresentationSink};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON line per presented grade
#[derive(Debug, Clone)]
pub struct JsonlBadgeSink {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl JsonlBadgeSink {
    pub async fn new(path: PathBuf) -> Result<Self, PresentError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct BadgeLine<'a> {
    product_id: &'a str,
    grade: Grade,
    color: &'a str,
}

#[async_trait]
impl PresentationSink for JsonlBadgeSink {
    async fn present(&self, product_id: &str, grade: Grade) -> Result<(), PresentError> {
        let line = serde_json::to_string(&BadgeLine {
            product_id,
            grade,
            color: grade.color_hex(),
        })
        .map_err(|e| PresentError::Serialization(e.to_string()))?;

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

/// Collects presented grades in memory
#[derive(Debug, Default)]
pub struct MemoryBadgeSink {
    presented: std::sync::Mutex<Vec<(String, Grade)>>,
}

impl MemoryBadgeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything presented so far, in order
    pub fn presented(&self) -> Vec<(String, Grade)> {
        self.presented
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PresentationSink for MemoryBadgeSink {
    async fn present(&self, product_id: &str, grade: Grade) -> Result<(), PresentError> {
        if let Ok(mut presented) = self.presented.lock() {
            presented.push((product_id.to_string(), grade));
        }
        Ok(())
    }
}
