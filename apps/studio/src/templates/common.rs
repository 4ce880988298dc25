//! Building blocks shared by all variants.
//!
//! Section resolution, the skills/entries branch and optional-field omission
//! live here so that the variants cannot diverge on content, only on looks.

use crate::models::resume::{
    is_skills_module, non_blank, FontFamily, Language, Module, ModuleItem, ModuleType, Profile,
    ResumeItem, ResumeSettings,
};
use crate::templates::tree::{Align, Node, NodeKind, Role};

/// A4 at 96 dpi.
pub const PAGE_WIDTH: f32 = 794.0;
pub const PAGE_HEIGHT: f32 = 1123.0;

/// Font-size multiplier applied to every sized node.
#[derive(Debug, Clone, Copy)]
pub struct Scale(pub f32);

impl Scale {
    pub fn of(settings: &ResumeSettings) -> Self {
        Scale(settings.scale())
    }

    pub fn px(self, base: f32) -> f32 {
        base * self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionNaming {
    /// The module's own title.
    Own,
    /// Canonical headings per module type; custom modules keep their title.
    Formal { uppercase: bool },
}

/// Resolves the heading shown for a module.
pub fn section_title(module: &Module, naming: SectionNaming, language: Language) -> String {
    match naming {
        SectionNaming::Own => module.title.clone(),
        SectionNaming::Formal { uppercase } => {
            let title = formal_heading(module.kind, language)
                .map(str::to_string)
                .unwrap_or_else(|| module.title.clone());
            if uppercase {
                title.to_uppercase()
            } else {
                title
            }
        }
    }
}

fn formal_heading(kind: ModuleType, language: Language) -> Option<&'static str> {
    let heading = match (kind, language) {
        (ModuleType::Experience, Language::Zh) => "工作经历",
        (ModuleType::Education, Language::Zh) => "教育背景",
        (ModuleType::Projects, Language::Zh) => "项目经历",
        (ModuleType::Skills, Language::Zh) => "专业技能",
        (ModuleType::Experience, Language::En) => "Professional Experience",
        (ModuleType::Education, Language::En) => "Education",
        (ModuleType::Projects, Language::En) => "Selected Projects",
        (ModuleType::Skills, Language::En) => "Skills",
        (ModuleType::Custom, _) => return None,
    };
    Some(heading)
}

pub fn font_stack(family: FontFamily) -> &'static str {
    match family {
        FontFamily::SansSerif => "\"PingFang SC\", \"Microsoft YaHei\", sans-serif",
        FontFamily::Serif => "\"Songti SC\", \"SimSun\", serif",
        FontFamily::Monospace => "\"JetBrains Mono\", monospace",
    }
}

/// Colours and base sizes (before scaling) for a variant's section bodies.
#[derive(Debug, Clone)]
pub struct ItemLook {
    pub title_size: f32,
    pub meta_size: f32,
    pub body_size: f32,
    pub text_color: String,
    pub muted_color: String,
    pub tag_background: String,
    pub tag_color: String,
    pub item_gap: f32,
}

/// The page root shared by every variant.
pub fn page(settings: &ResumeSettings, background: &str) -> Node {
    let font_family = font_stack(settings.font_family).to_string();
    let line_height = settings.line_height;
    let padding = settings.page_margin.px();
    let background = background.to_string();
    Node::new(NodeKind::Page).styled(move |s| {
        s.font_family = Some(font_family);
        s.line_height = Some(line_height);
        s.padding = padding;
        s.background = Some(background);
        s.width = Some(PAGE_WIDTH);
    })
}

/// Renders the items of one module, branching on the module type.
pub fn section_items(module: &Module, look: &ItemLook, scale: Scale) -> Vec<Node> {
    if is_skills_module(module) {
        let tags = module.items.iter().filter_map(|item| match item {
            ModuleItem::Skill(skill) if !skill.name.trim().is_empty() => {
                Some(skill_tag(&skill.id, skill.name.trim(), look, scale))
            }
            _ => None,
        });
        vec![Node::row().styled(|s| s.gap = 6.0).children(tags)]
    } else {
        module
            .items
            .iter()
            .filter_map(|item| match item {
                ModuleItem::Entry(entry) => Some(entry_node(entry, look, scale)),
                ModuleItem::Skill(_) => None,
            })
            .collect()
    }
}

fn skill_tag(id: &str, name: &str, look: &ItemLook, scale: Scale) -> Node {
    let background = look.tag_background.clone();
    let color = look.tag_color.clone();
    let size = scale.px(look.meta_size);
    let mut tag = Node::new(NodeKind::Tag)
        .role(Role::Skill)
        .key(id)
        .styled(move |s| {
            s.font_size = Some(size);
            s.background = Some(background);
            s.color = Some(color);
            s.padding = 4.0;
        });
    tag.text = Some(name.to_string());
    tag
}

fn entry_node(item: &ResumeItem, look: &ItemLook, scale: Scale) -> Node {
    let mut head = Node::row().styled(|s| s.gap = 8.0);
    if !item.title.trim().is_empty() {
        head = head.child(
            Node::text(item.title.trim(), scale.px(look.title_size))
                .role(Role::ItemTitle)
                .styled(|s| {
                    s.bold = true;
                    s.color = Some(look.text_color.clone());
                }),
        );
    }
    if let Some(date) = non_blank(&item.date) {
        head = head.child(
            Node::text(date, scale.px(look.meta_size))
                .role(Role::ItemDate)
                .styled(|s| {
                    s.color = Some(look.muted_color.clone());
                    s.align = Align::Right;
                }),
        );
    }

    let mut node = Node::block()
        .role(Role::Item)
        .key(&item.id)
        .styled(|s| s.margin_bottom = look.item_gap)
        .child(head);

    let subtitle = non_blank(&item.subtitle);
    let location = non_blank(&item.location);
    if subtitle.is_some() || location.is_some() {
        let mut meta = Node::row().styled(|s| s.gap = 8.0);
        if let Some(subtitle) = subtitle {
            meta = meta.child(
                Node::text(subtitle, scale.px(look.meta_size))
                    .role(Role::ItemSubtitle)
                    .styled(|s| s.color = Some(look.text_color.clone())),
            );
        }
        if let Some(location) = location {
            meta = meta.child(
                Node::text(location, scale.px(look.meta_size))
                    .role(Role::ItemLocation)
                    .styled(|s| s.color = Some(look.muted_color.clone())),
            );
        }
        node = node.child(meta);
    }

    if let Some(description) = non_blank(&item.description) {
        node = node.child(
            Node::text(description, scale.px(look.body_size))
                .role(Role::ItemDescription)
                .styled(|s| {
                    s.pre_line = true;
                    s.color = Some(look.text_color.clone());
                }),
        );
    }
    node
}

/// Name, headline, contacts, custom fields and summary nodes for a header,
/// in that order, skipping absent fields.
pub struct ProfileParts {
    pub name: Option<Node>,
    pub headline: Option<Node>,
    pub contacts: Vec<Node>,
    pub custom_fields: Vec<Node>,
    pub summary: Option<Node>,
}

pub struct ProfileLook<'a> {
    pub name_size: f32,
    pub headline_size: f32,
    pub contact_size: f32,
    pub summary_size: f32,
    pub name_color: &'a str,
    pub text_color: &'a str,
    pub muted_color: &'a str,
}

pub fn profile_parts(profile: &Profile, look: &ProfileLook<'_>, scale: Scale) -> ProfileParts {
    let name = Some(profile.name.trim())
        .filter(|n| !n.is_empty())
        .map(|n| {
            Node::text(n, scale.px(look.name_size))
                .role(Role::Name)
                .styled(|s| {
                    s.bold = true;
                    s.color = Some(look.name_color.to_string());
                })
        });
    let headline = non_blank(&profile.title).map(|t| {
        Node::text(t, scale.px(look.headline_size))
            .role(Role::Headline)
            .styled(|s| s.color = Some(look.text_color.to_string()))
    });
    let contacts = profile
        .contact_fields()
        .into_iter()
        .map(|(field, value)| {
            Node::text(value, scale.px(look.contact_size))
                .role(Role::Contact)
                .key(field)
                .styled(|s| s.color = Some(look.muted_color.to_string()))
        })
        .collect();
    let custom_fields = profile
        .visible_custom_fields()
        .map(|f| {
            Node::text(
                format!("{}: {}", f.label.trim(), f.value.trim()),
                scale.px(look.contact_size),
            )
            .role(Role::CustomField)
            .key(&f.id)
            .styled(|s| s.color = Some(look.muted_color.to_string()))
        })
        .collect();
    let summary = non_blank(&profile.summary).map(|t| {
        Node::text(t, scale.px(look.summary_size))
            .role(Role::Summary)
            .styled(|s| {
                s.pre_line = true;
                s.color = Some(look.text_color.to_string());
            })
    });
    ProfileParts {
        name,
        headline,
        contacts,
        custom_fields,
        summary,
    }
}

/// Avatar node, or `None` when the profile has no avatar.
pub fn avatar(profile: &Profile, size: f32) -> Option<Node> {
    non_blank(&profile.avatar).map(|src| {
        let mut node = Node::new(NodeKind::Image)
            .role(Role::Avatar)
            .styled(|s| s.width = Some(size));
        node.text = Some(src.to_string());
        node
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Module;

    #[test]
    fn test_formal_naming_maps_known_types() {
        let module = Module::new(ModuleType::Experience);
        assert_eq!(
            section_title(&module, SectionNaming::Formal { uppercase: true }, Language::En),
            "PROFESSIONAL EXPERIENCE"
        );
        assert_eq!(
            section_title(&module, SectionNaming::Formal { uppercase: false }, Language::Zh),
            "工作经历"
        );
    }

    #[test]
    fn test_custom_falls_back_to_own_title() {
        let mut module = Module::new(ModuleType::Custom);
        module.title = "Awards".into();
        assert_eq!(
            section_title(&module, SectionNaming::Formal { uppercase: true }, Language::En),
            "AWARDS"
        );
        assert_eq!(
            section_title(&module, SectionNaming::Own, Language::En),
            "Awards"
        );
    }

    #[test]
    fn test_blank_skill_names_are_not_rendered() {
        let mut module = Module::new(ModuleType::Skills);
        module.items = vec![
            ModuleItem::Skill(crate::models::resume::SkillItem {
                id: "a".into(),
                name: "Rust".into(),
            }),
            ModuleItem::Skill(crate::models::resume::SkillItem {
                id: "b".into(),
                name: " ".into(),
            }),
        ];
        let look = ItemLook {
            title_size: 14.0,
            meta_size: 12.0,
            body_size: 12.0,
            text_color: "#000".into(),
            muted_color: "#666".into(),
            tag_background: "#eee".into(),
            tag_color: "#000".into(),
            item_gap: 8.0,
        };
        let nodes = section_items(&module, &look, Scale(1.0));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].text.as_deref(), Some("Rust"));
    }
}
