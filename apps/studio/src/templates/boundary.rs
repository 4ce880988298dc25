//! Last-resort failure boundary around template rendering.
//!
//! Holds the last good tree. A failed render keeps showing that tree (or a
//! fallback view when there is none) until `retry` succeeds.

use serde::Serialize;
use tracing::warn;

use crate::models::ResumeData;
use crate::notify::{ReportKind, SharedReporter};
use crate::templates::tree::{Align, Node, NodeKind, Role};
use crate::templates::{RenderError, TemplateKind};

#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryState {
    Empty,
    Good(Node),
    Fallback {
        last_good: Option<Node>,
        error: RenderError,
    },
}

/// What the boundary hands to the caller after a render attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryView {
    pub tree: Node,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct RenderBoundary {
    state: BoundaryState,
    reporter: SharedReporter,
    last_input: Option<(TemplateKind, ResumeData)>,
}

impl RenderBoundary {
    pub fn new(reporter: SharedReporter) -> Self {
        Self {
            state: BoundaryState::Empty,
            reporter,
            last_input: None,
        }
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn render(&mut self, kind: TemplateKind, doc: &ResumeData) -> BoundaryView {
        self.last_input = Some((kind, doc.clone()));
        self.attempt(kind, doc)
    }

    /// Re-runs the last render in place.
    pub fn retry(&mut self) -> Option<BoundaryView> {
        let (kind, doc) = self.last_input.take()?;
        let view = self.attempt(kind, &doc);
        self.last_input = Some((kind, doc));
        Some(view)
    }

    fn attempt(&mut self, kind: TemplateKind, doc: &ResumeData) -> BoundaryView {
        match kind.render(doc) {
            Ok(tree) => {
                self.state = BoundaryState::Good(tree.clone());
                BoundaryView {
                    tree,
                    failed: false,
                    error: None,
                }
            }
            Err(error) => {
                warn!(template = kind.id(), resume_id = %doc.id, "render failed: {error}");
                self.reporter
                    .report(ReportKind::Error, &format!("预览渲染失败：{error}"));
                let last_good = match std::mem::replace(&mut self.state, BoundaryState::Empty) {
                    BoundaryState::Good(tree) => Some(tree),
                    BoundaryState::Fallback { last_good, .. } => last_good,
                    BoundaryState::Empty => None,
                };
                let tree = last_good
                    .clone()
                    .unwrap_or_else(|| fallback_view(&error));
                let message = error.to_string();
                self.state = BoundaryState::Fallback { last_good, error };
                BoundaryView {
                    tree,
                    failed: true,
                    error: Some(message),
                }
            }
        }
    }
}

fn fallback_view(error: &RenderError) -> Node {
    Node::new(NodeKind::Page)
        .child(
            Node::text("简历预览出错了", 18.0)
                .role(Role::Error)
                .styled(|s| {
                    s.bold = true;
                    s.align = Align::Center;
                }),
        )
        .child(
            Node::text(error.to_string(), 12.0)
                .role(Role::Error)
                .styled(|s| s.color = Some("#b91c1c".to_string())),
        )
}
