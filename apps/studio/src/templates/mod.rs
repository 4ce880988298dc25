//! Template variants: pure `(ResumeData) -> Node` transforms.
//!
//! Every variant renders the visible modules in document order, branches on
//! `is_skills_module` the same way, and scales every font size by
//! `settings.fontSizeScale`. Variants differ only in styling and decoration.

pub mod academic;
pub mod boundary;
pub mod classic;
pub mod common;
pub mod minimal;
pub mod modern;
pub mod tree;

use serde::Serialize;
use thiserror::Error;

use crate::models::{ModelError, ResumeData};

pub use boundary::RenderBoundary;
pub use tree::Node;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("malformed document: {0}")]
    Malformed(#[from] ModelError),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Classic,
    Modern,
    Academic,
    Minimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Classic,
        TemplateKind::Modern,
        TemplateKind::Academic,
        TemplateKind::Minimal,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TemplateKind::Classic => "classic",
            TemplateKind::Modern => "modern",
            TemplateKind::Academic => "academic",
            TemplateKind::Minimal => "minimal",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn info(self) -> TemplateInfo {
        let (name, description) = match self {
            TemplateKind::Classic => ("经典", "居中页眉，主题色分隔线"),
            TemplateKind::Modern => ("现代", "有头像时使用侧栏布局"),
            TemplateKind::Academic => ("学术", "衬线字体与规范化章节标题"),
            TemplateKind::Minimal => ("简约", "黑白配色，留白充足"),
        };
        TemplateInfo {
            id: self.id(),
            name,
            description,
        }
    }

    /// Renders `doc` with this variant. The input is never modified.
    pub fn render(self, doc: &ResumeData) -> Result<Node, RenderError> {
        for module in doc.visible_modules() {
            module.check()?;
        }
        let tree = match self {
            TemplateKind::Classic => classic::render(doc),
            TemplateKind::Modern => modern::render(doc),
            TemplateKind::Academic => academic::render(doc),
            TemplateKind::Minimal => minimal::render(doc),
        };
        Ok(tree)
    }
}

/// Renders with the template named in the document itself.
pub fn render_document(doc: &ResumeData) -> Result<Node, RenderError> {
    let kind = TemplateKind::from_id(&doc.template)
        .ok_or_else(|| RenderError::UnknownTemplate(doc.template.clone()))?;
    kind.render(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::{engineer_sample, student_sample};
    use crate::models::resume::{ModuleItem, SkillItem};
    use crate::templates::tree::Role;

    fn all_docs() -> Vec<ResumeData> {
        let mut with_avatar = engineer_sample();
        with_avatar.profile.avatar = Some("data:image/png;base64,AAAA".into());
        let mut hidden = engineer_sample();
        hidden.modules[1].visible = false;
        vec![engineer_sample(), student_sample(), with_avatar, hidden]
    }

    #[test]
    fn test_every_variant_yields_same_outline() {
        for doc in all_docs() {
            let expected: Vec<(String, Vec<String>)> = doc
                .visible_modules()
                .map(|m| {
                    (
                        m.id.clone(),
                        m.items.iter().map(|i| i.id().to_string()).collect(),
                    )
                })
                .collect();
            for kind in TemplateKind::ALL {
                let tree = kind.render(&doc).unwrap();
                assert_eq!(tree.outline(), expected, "variant {:?}", kind);
            }
        }
    }

    #[test]
    fn test_render_does_not_mutate_input() {
        let doc = engineer_sample();
        let before = doc.clone();
        for kind in TemplateKind::ALL {
            kind.render(&doc).unwrap();
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn test_render_is_deterministic() {
        let doc = student_sample();
        for kind in TemplateKind::ALL {
            assert_eq!(kind.render(&doc).unwrap(), kind.render(&doc).unwrap());
        }
    }

    #[test]
    fn test_mixed_content_is_an_error() {
        let mut doc = engineer_sample();
        doc.modules[0].items.push(ModuleItem::Skill(SkillItem {
            id: "stray".into(),
            name: "Rust".into(),
        }));
        for kind in TemplateKind::ALL {
            assert!(matches!(
                kind.render(&doc),
                Err(RenderError::Malformed(ModelError::MixedContent { .. }))
            ));
        }
    }

    #[test]
    fn test_hidden_mixed_module_is_ignored() {
        let mut doc = engineer_sample();
        doc.modules[0].items.push(ModuleItem::Skill(SkillItem {
            id: "stray".into(),
            name: "Rust".into(),
        }));
        doc.modules[0].visible = false;
        assert!(TemplateKind::Classic.render(&doc).is_ok());
    }

    #[test]
    fn test_font_scale_keeps_proportions() {
        let mut doc = engineer_sample();
        for kind in TemplateKind::ALL {
            doc.settings.font_size_scale = 1.0;
            let base = kind.render(&doc).unwrap();
            doc.settings.font_size_scale = 1.3;
            let scaled = kind.render(&doc).unwrap();

            let sizes = |tree: &Node| {
                let mut out = Vec::new();
                tree.walk(&mut |n| {
                    if let Some(size) = n.style.font_size {
                        out.push(size);
                    }
                });
                out
            };
            let a = sizes(&base);
            let b = sizes(&scaled);
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((y / x - 1.3).abs() < 1e-4, "variant {:?}", kind);
            }
        }
    }

    #[test]
    fn test_description_line_breaks_preserved() {
        let doc = engineer_sample();
        for kind in TemplateKind::ALL {
            let tree = kind.render(&doc).unwrap();
            let descriptions = tree.find_all(Role::ItemDescription);
            let first = descriptions.first().unwrap();
            assert!(first.text.as_deref().unwrap().contains('\n'));
            assert!(first.style.pre_line);
        }
    }

    #[test]
    fn test_absent_optional_fields_omitted() {
        let mut doc = student_sample();
        doc.profile.phone = None;
        doc.profile.title = Some("  ".into());
        if let ModuleItem::Entry(item) = &mut doc.modules[1].items[0] {
            item.location = None;
            item.subtitle = None;
        }
        for kind in TemplateKind::ALL {
            let tree = kind.render(&doc).unwrap();
            assert!(tree.find_all(Role::Headline).is_empty());
            assert!(tree.find_all(Role::Avatar).is_empty());
            let sections = tree.find_all(Role::Section);
            let project = sections[1];
            assert!(project.find_all(Role::ItemLocation).is_empty());
            assert!(project.find_all(Role::ItemSubtitle).is_empty());
            let contacts: Vec<_> = tree
                .find_all(Role::Contact)
                .iter()
                .filter_map(|n| n.text.clone())
                .collect();
            assert_eq!(contacts, vec!["wangfang@example.com".to_string()]);
        }
    }

    #[test]
    fn test_unknown_template_reported() {
        let mut doc = engineer_sample();
        doc.template = "retro".into();
        assert_eq!(
            render_document(&doc),
            Err(RenderError::UnknownTemplate("retro".into()))
        );
    }

    #[test]
    fn test_from_id_round_trips() {
        for kind in TemplateKind::ALL {
            assert_eq!(TemplateKind::from_id(kind.id()), Some(kind));
        }
    }
}
