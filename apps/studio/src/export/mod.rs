//! Export pipeline: raster capture, print flow and artifact naming.
//!
//! Public entry points never fail across their contract: every outcome is an
//! [`ExportResult`].

pub mod filename;
pub mod painter;
pub mod print;

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, Rgba};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::notify::{ReportKind, SharedReporter};
use crate::templates::tree::Node;

pub use filename::generate_export_filename;
pub use painter::{BoxRasterizer, CaptureRequest, RasterHost};
pub use print::{HtmlPrintHost, PrintController, PrintOutcome};

pub const DEFAULT_RASTER_FILENAME: &str = "简历.png";
pub const DEFAULT_SCALE: f32 = 2.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("capture produced no pixels")]
    EmptyCapture,

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("encoder produced an empty file")]
    EmptyOutput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("print host error: {0}")]
    Host(String),

    #[error("background task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ExportResult {
    pub fn ok(message: impl Into<String>, path: PathBuf) -> Self {
        Self {
            success: true,
            message: message.into(),
            path: Some(path),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            path: None,
        }
    }
}

pub type ProgressFn = Box<dyn FnMut(f32) + Send>;

pub struct RasterOptions {
    pub filename: String,
    pub scale: f32,
    pub on_progress: Option<ProgressFn>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_RASTER_FILENAME.to_string(),
            scale: DEFAULT_SCALE,
            on_progress: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Artifact sink
// ────────────────────────────────────────────────────────────────────────────

/// Where downloadable artifacts end up.
pub trait ArtifactSink: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Writes artifacts into a directory through a temp file that is persisted
/// under the final name. A failed write drops (and deletes) the temp file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let plain = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);
        if !plain {
            return Err(ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a plain file name: {filename:?}"),
            )));
        }
        std::fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(bytes)?;
        temp.flush()?;
        let target = self.dir.join(filename);
        temp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
        Ok(target)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raster export
// ────────────────────────────────────────────────────────────────────────────

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct ExportPipeline {
    host: Arc<dyn RasterHost>,
    sink: Arc<dyn ArtifactSink>,
    reporter: SharedReporter,
}

impl ExportPipeline {
    pub fn new(
        host: Arc<dyn RasterHost>,
        sink: Arc<dyn ArtifactSink>,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            host,
            sink,
            reporter,
        }
    }

    /// Captures `node` on white, encodes it as PNG and saves it as
    /// `options.filename`. Progress goes 0.1 → 0.5 → 0.8 → 1.0.
    ///
    /// The tree is cloned up front; later edits never leak into an export in flight.
    pub async fn export_to_raster(&self, node: &Node, mut options: RasterOptions) -> ExportResult {
        let mut progress = |value: f32| {
            if let Some(cb) = options.on_progress.as_mut() {
                cb(value);
            }
        };
        progress(0.1);

        let snapshot = node.pruned_for_export();
        let host = Arc::clone(&self.host);
        let request = CaptureRequest {
            scale: options.scale,
            background: WHITE,
        };
        let captured = tokio::task::spawn_blocking(move || host.capture(&snapshot, &request))
            .await
            .map_err(|e| ExportError::Join(e.to_string()))
            .and_then(|r| r);
        let pixels = match captured {
            Ok(pixels) if pixels.width() > 0 && pixels.height() > 0 => pixels,
            Ok(_) => return self.fail(ExportError::EmptyCapture),
            Err(e) => return self.fail(e),
        };
        progress(0.5);

        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ExportError> {
            let mut bytes = Vec::new();
            pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            if bytes.is_empty() {
                return Err(ExportError::EmptyOutput);
            }
            Ok(bytes)
        })
        .await
        .map_err(|e| ExportError::Join(e.to_string()))
        .and_then(|r| r);
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e),
        };
        progress(0.8);

        let sink = Arc::clone(&self.sink);
        let filename = options.filename.clone();
        let saved = tokio::task::spawn_blocking(move || sink.save(&filename, &bytes))
            .await
            .map_err(|e| ExportError::Join(e.to_string()))
            .and_then(|r| r);
        match saved {
            Ok(path) => {
                progress(1.0);
                info!(path = %path.display(), "raster export written");
                let message = format!("已导出 {}", options.filename);
                self.reporter.report(ReportKind::Success, &message);
                ExportResult::ok(message, path)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, error: ExportError) -> ExportResult {
        warn!("raster export failed: {error}");
        let message = match error {
            ExportError::EmptyCapture | ExportError::EmptyOutput => {
                "导出失败：生成的图片为空，请重试".to_string()
            }
            _ => "导出失败，请重试".to_string(),
        };
        self.reporter.report(ReportKind::Error, &message);
        ExportResult::failed(message)
    }
}
