use crate::models::resume::FontFamily;
use crate::models::ResumeData;
use crate::templates::common::{
    avatar, font_stack, page, profile_parts, section_items, section_title, ItemLook, ProfileLook,
    Scale, SectionNaming,
};
use crate::templates::tree::{Align, Node, Role};

const INK: &str = "#000000";
const MUTED: &str = "#374151";

/// Formal CV layout: serif type, canonical upper-cased section headings.
pub fn render(doc: &ResumeData) -> Node {
    let scale = Scale::of(&doc.settings);

    let parts = profile_parts(
        &doc.profile,
        &ProfileLook {
            name_size: 24.0,
            headline_size: 13.0,
            contact_size: 11.0,
            summary_size: 12.0,
            name_color: INK,
            text_color: INK,
            muted_color: MUTED,
        },
        scale,
    );

    let mut identity = Node::block()
        .styled(|s| s.align = Align::Center)
        .children(parts.name)
        .children(parts.headline)
        .child(
            Node::row()
                .styled(|s| s.gap = 10.0)
                .children(parts.contacts)
                .children(parts.custom_fields),
        );
    if let Some(photo) = avatar(&doc.profile, 72.0) {
        identity = Node::row()
            .styled(|s| s.gap = 16.0)
            .child(identity)
            .child(photo);
    }
    let header = identity.role(Role::Header).styled(|s| {
        s.border_color = Some(INK.to_string());
        s.margin_bottom = 14.0;
    });

    let look = ItemLook {
        title_size: 13.0,
        meta_size: 11.5,
        body_size: 12.0,
        text_color: INK.to_string(),
        muted_color: MUTED.to_string(),
        tag_background: "#f3f4f6".to_string(),
        tag_color: INK.to_string(),
        item_gap: 8.0,
    };

    let mut root = page(&doc.settings, "#ffffff")
        .styled(|s| s.font_family = Some(font_stack(FontFamily::Serif).to_string()))
        .child(header);
    if let Some(summary) = parts.summary {
        root = root.child(summary.styled(|s| {
            s.italic = true;
            s.margin_bottom = 12.0;
        }));
    }

    let naming = SectionNaming::Formal { uppercase: true };
    for module in doc.visible_modules() {
        let heading = Node::text(
            section_title(module, naming, doc.settings.language),
            scale.px(13.5),
        )
        .role(Role::SectionTitle)
        .styled(|s| {
            s.bold = true;
            s.color = Some(INK.to_string());
            s.border_color = Some(INK.to_string());
            s.margin_bottom = 6.0;
        });
        root = root.child(
            Node::block()
                .role(Role::Section)
                .key(&module.id)
                .styled(|s| s.margin_bottom = 12.0)
                .child(heading)
                .children(section_items(module, &look, scale)),
        );
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::student_sample;
    use crate::models::resume::{Language, Module, ModuleType};

    #[test]
    fn test_headings_are_formal() {
        let mut doc = student_sample();
        doc.settings.language = Language::En;
        let mut custom = Module::new(ModuleType::Custom);
        custom.title = "Honors".into();
        doc.modules.push(custom);

        let tree = render(&doc);
        let titles: Vec<_> = tree
            .find_all(Role::SectionTitle)
            .iter()
            .filter_map(|n| n.text.clone())
            .collect();
        assert_eq!(titles, vec!["EDUCATION", "SELECTED PROJECTS", "SKILLS", "HONORS"]);
    }
}
