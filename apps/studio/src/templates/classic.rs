use crate::models::ResumeData;
use crate::templates::common::{
    avatar, page, profile_parts, section_items, section_title, ItemLook, ProfileLook, Scale,
    SectionNaming,
};
use crate::templates::tree::{Align, Node, Role};

const TEXT: &str = "#1f2937";
const MUTED: &str = "#6b7280";

/// Centered header, theme-coloured section rules.
pub fn render(doc: &ResumeData) -> Node {
    let scale = Scale::of(&doc.settings);
    let theme = doc.settings.theme_color.as_str();

    let parts = profile_parts(
        &doc.profile,
        &ProfileLook {
            name_size: 28.0,
            headline_size: 15.0,
            contact_size: 12.0,
            summary_size: 13.0,
            name_color: theme,
            text_color: TEXT,
            muted_color: MUTED,
        },
        scale,
    );

    let mut identity = Node::block().styled(|s| s.align = Align::Center);
    identity = identity.children(parts.name).children(parts.headline);
    identity = identity.child(
        Node::row()
            .styled(|s| s.gap = 12.0)
            .children(parts.contacts)
            .children(parts.custom_fields),
    );

    let header = match avatar(&doc.profile, 84.0) {
        Some(photo) => Node::row()
            .styled(|s| s.gap = 20.0)
            .child(photo)
            .child(identity),
        None => identity,
    }
    .role(Role::Header)
    .styled(|s| s.margin_bottom = 16.0);

    let look = ItemLook {
        title_size: 14.0,
        meta_size: 12.0,
        body_size: 12.5,
        text_color: TEXT.to_string(),
        muted_color: MUTED.to_string(),
        tag_background: "#eff6ff".to_string(),
        tag_color: theme.to_string(),
        item_gap: 10.0,
    };

    let mut root = page(&doc.settings, "#ffffff").child(header);
    if let Some(summary) = parts.summary {
        root = root.child(summary.styled(|s| s.margin_bottom = 12.0));
    }

    for module in doc.visible_modules() {
        let title = section_title(module, SectionNaming::Own, doc.settings.language);
        let heading = Node::text(title, scale.px(16.0))
            .role(Role::SectionTitle)
            .styled(|s| {
                s.bold = true;
                s.color = Some(theme.to_string());
                s.border_color = Some(theme.to_string());
                s.margin_bottom = 8.0;
            });
        root = root.child(
            Node::block()
                .role(Role::Section)
                .key(&module.id)
                .styled(|s| s.margin_bottom = 14.0)
                .child(heading)
                .children(section_items(module, &look, scale)),
        );
    }
    root
}
