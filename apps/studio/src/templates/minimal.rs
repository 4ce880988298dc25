use crate::models::ResumeData;
use crate::templates::common::{
    avatar, page, profile_parts, section_items, section_title, ItemLook, ProfileLook, Scale,
    SectionNaming,
};
use crate::templates::tree::{Node, Role};

const INK: &str = "#111111";
const GREY: &str = "#777777";

pub fn render(doc: &ResumeData) -> Node {
    let scale = Scale::of(&doc.settings);

    let parts = profile_parts(
        &doc.profile,
        &ProfileLook {
            name_size: 22.0,
            headline_size: 13.0,
            contact_size: 11.0,
            summary_size: 12.0,
            name_color: INK,
            text_color: INK,
            muted_color: GREY,
        },
        scale,
    );

    let identity = Node::block()
        .children(parts.name)
        .children(parts.headline)
        .children(parts.contacts)
        .children(parts.custom_fields);
    let header = match avatar(&doc.profile, 64.0) {
        Some(photo) => Node::row().styled(|s| s.gap = 16.0).child(identity).child(photo),
        None => identity,
    }
    .role(Role::Header)
    .styled(|s| s.margin_bottom = 24.0);

    let look = ItemLook {
        title_size: 13.0,
        meta_size: 11.0,
        body_size: 12.0,
        text_color: INK.to_string(),
        muted_color: GREY.to_string(),
        tag_background: "#ffffff".to_string(),
        tag_color: INK.to_string(),
        item_gap: 10.0,
    };

    let mut root = page(&doc.settings, "#ffffff").child(header);
    if let Some(summary) = parts.summary {
        root = root.child(summary.styled(|s| s.margin_bottom = 20.0));
    }
    for module in doc.visible_modules() {
        let heading = Node::text(
            section_title(module, SectionNaming::Own, doc.settings.language),
            scale.px(12.0),
        )
        .role(Role::SectionTitle)
        .styled(|s| {
            s.color = Some(GREY.to_string());
            s.margin_bottom = 6.0;
        });
        root = root.child(
            Node::block()
                .role(Role::Section)
                .key(&module.id)
                .styled(|s| s.margin_bottom = 20.0)
                .child(heading)
                .children(section_items(module, &look, scale)),
        );
    }
    root
}
