//! Print flow scoped to a single rendered subtree.
//!
//! While a print is pending the host carries a print-only stylesheet, a scope
//! marker on the target subtree and the export file name as its title. All of
//! it is undone on the host's after-print notification or, failing that, by a
//! fallback timer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::export::{ArtifactSink, DirectorySink, ExportError};
use crate::notify::{ReportKind, SharedReporter};
use crate::templates::tree::{escape_html, Node};

pub const PRINT_SCOPE_ID: &str = "resume-print-scope";
pub const PRINT_FALLBACK: Duration = Duration::from_secs(5);

/// Hides everything but the scoped subtree on the print medium.
pub const PRINT_STYLE: &str = "@media print {\n  \
body * { visibility: hidden; }\n  \
#resume-print-scope, #resume-print-scope * { visibility: visible; }\n  \
#resume-print-scope { position: absolute; left: 0; top: 0; width: 100%; }\n  \
@page { size: A4; margin: 0; }\n}\n";

/// What the host's dialog did with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintDialog {
    /// Finished before returning; no after-print notification will follow.
    Completed { artifact: Option<PathBuf> },
    /// Still open; completion arrives through `on_after_print`.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    Completed { artifact: Option<PathBuf> },
    Pending,
    /// A previous print flow was still pending.
    Suppressed,
    Failed(String),
}

#[async_trait]
pub trait PrintHost: Send + Sync {
    fn title(&self) -> String;
    fn set_title(&self, title: &str);
    fn mark_scope(&self, scope_id: &str);
    fn unmark_scope(&self, scope_id: &str);
    fn inject_print_style(&self, css: &str);
    fn remove_print_style(&self);
    async fn open_print_dialog(&self, node: &Node) -> Result<PrintDialog, ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

struct Pending {
    generation: u64,
    previous_title: String,
    fallback: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Session {
    generation: u64,
    pending: Option<Pending>,
}

pub struct PrintController {
    host: Arc<dyn PrintHost>,
    session: Arc<Mutex<Session>>,
    reporter: SharedReporter,
}

impl PrintController {
    pub fn new(host: Arc<dyn PrintHost>, reporter: SharedReporter) -> Self {
        Self {
            host,
            session: Arc::new(Mutex::new(Session::default())),
            reporter,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.session).pending.is_some()
    }

    /// Prints `node` with `filename` as the suggested document name.
    pub async fn print_document(&self, node: &Node, filename: &str) -> PrintOutcome {
        let generation = {
            let mut session = lock(&self.session);
            if session.pending.is_some() {
                debug!("print already pending, ignoring request");
                return PrintOutcome::Suppressed;
            }
            session.generation += 1;
            let generation = session.generation;

            let previous_title = self.host.title();
            self.host.set_title(filename);
            self.host.mark_scope(PRINT_SCOPE_ID);
            self.host.inject_print_style(PRINT_STYLE);

            let host = Arc::clone(&self.host);
            let shared = Arc::clone(&self.session);
            let fallback = tokio::spawn(async move {
                tokio::time::sleep(PRINT_FALLBACK).await;
                let restored = {
                    let mut session = lock(&shared);
                    take_if(&mut session, Some(generation))
                };
                if let Some(pending) = restored {
                    warn!("no after-print notification, restoring print state");
                    restore(host.as_ref(), pending);
                }
            });
            session.pending = Some(Pending {
                generation,
                previous_title,
                fallback: Some(fallback),
            });
            generation
        };

        let snapshot = node.pruned_for_export();
        match self.host.open_print_dialog(&snapshot).await {
            Ok(PrintDialog::Completed { artifact }) => {
                self.finish(Some(generation));
                info!(filename, "print flow completed");
                PrintOutcome::Completed { artifact }
            }
            Ok(PrintDialog::Pending) => PrintOutcome::Pending,
            Err(e) => {
                self.finish(Some(generation));
                warn!("print dialog failed: {e}");
                let message = "打印失败，请重试".to_string();
                self.reporter.report(ReportKind::Error, &message);
                PrintOutcome::Failed(message)
            }
        }
    }

    /// The host's print-completion notification. Returns whether anything was restored.
    pub fn on_after_print(&self) -> bool {
        self.finish(None)
    }

    fn finish(&self, generation: Option<u64>) -> bool {
        let taken = take_if(&mut lock(&self.session), generation);
        match taken {
            Some(mut pending) => {
                if let Some(fallback) = pending.fallback.take() {
                    fallback.abort();
                }
                restore(self.host.as_ref(), pending);
                true
            }
            None => false,
        }
    }
}

impl Drop for PrintController {
    fn drop(&mut self) {
        if let Some(fallback) = lock(&self.session)
            .pending
            .as_mut()
            .and_then(|p| p.fallback.take())
        {
            fallback.abort();
        }
    }
}

fn lock(session: &Mutex<Session>) -> std::sync::MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn take_if(session: &mut Session, generation: Option<u64>) -> Option<Pending> {
    match (&session.pending, generation) {
        (Some(p), Some(g)) if p.generation != g => None,
        _ => session.pending.take(),
    }
}

fn restore(host: &dyn PrintHost, pending: Pending) {
    host.remove_print_style();
    host.unmark_scope(PRINT_SCOPE_ID);
    host.set_title(&pending.previous_title);
}

// ────────────────────────────────────────────────────────────────────────────
// HTML host
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct HtmlDocument {
    title: String,
    scope: Option<String>,
    style: Option<String>,
}

/// Writes the print-scoped document as a standalone HTML file into the
/// export directory, named after the current title.
pub struct HtmlPrintHost {
    sink: Arc<DirectorySink>,
    doc: Mutex<HtmlDocument>,
}

impl HtmlPrintHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            sink: Arc::new(DirectorySink::new(dir)),
            doc: Mutex::new(HtmlDocument {
                title: "简历".to_string(),
                ..Default::default()
            }),
        }
    }

    fn with_doc<R>(&self, f: impl FnOnce(&mut HtmlDocument) -> R) -> R {
        let mut doc = self.doc.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut doc)
    }

    fn compose(&self, node: &Node) -> (String, String) {
        self.with_doc(|doc| {
            let body = match &doc.scope {
                Some(scope) => format!("<div id=\"{scope}\">{}</div>", node.to_html()),
                None => node.to_html(),
            };
            let style = doc
                .style
                .as_deref()
                .map(|css| format!("<style>{css}</style>"))
                .unwrap_or_default();
            let html = format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{style}\n</head>\n<body>\n{body}\n</body>\n</html>\n",
                escape_html(&doc.title)
            );
            let filename = Path::new(&doc.title)
                .with_extension("html")
                .to_string_lossy()
                .into_owned();
            (filename, html)
        })
    }
}

#[async_trait]
impl PrintHost for HtmlPrintHost {
    fn title(&self) -> String {
        self.with_doc(|doc| doc.title.clone())
    }

    fn set_title(&self, title: &str) {
        self.with_doc(|doc| doc.title = title.to_string());
    }

    fn mark_scope(&self, scope_id: &str) {
        self.with_doc(|doc| doc.scope = Some(scope_id.to_string()));
    }

    fn unmark_scope(&self, scope_id: &str) {
        self.with_doc(|doc| {
            if doc.scope.as_deref() == Some(scope_id) {
                doc.scope = None;
            }
        });
    }

    fn inject_print_style(&self, css: &str) {
        self.with_doc(|doc| doc.style = Some(css.to_string()));
    }

    fn remove_print_style(&self) {
        self.with_doc(|doc| doc.style = None);
    }

    async fn open_print_dialog(&self, node: &Node) -> Result<PrintDialog, ExportError> {
        let (filename, html) = self.compose(node);
        let sink = Arc::clone(&self.sink);
        let path = tokio::task::spawn_blocking(move || sink.save(&filename, html.as_bytes()))
            .await
            .map_err(|e| ExportError::Join(e.to_string()))??;
        Ok(PrintDialog::Completed {
            artifact: Some(path),
        })
    }
}
