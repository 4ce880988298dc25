use crate::models::ResumeData;
use crate::templates::common::{
    avatar, page, profile_parts, section_items, section_title, ItemLook, ProfileLook, Scale,
    SectionNaming,
};
use crate::templates::tree::{Node, NodeKind, Role};

const TEXT: &str = "#111827";
const MUTED: &str = "#4b5563";
const ON_THEME: &str = "#ffffff";
const SIDEBAR_WIDTH: f32 = 220.0;

/// Sidebar layout around the avatar; a top banner when there is no avatar.
pub fn render(doc: &ResumeData) -> Node {
    let scale = Scale::of(&doc.settings);
    let theme = doc.settings.theme_color.as_str();

    let parts = profile_parts(
        &doc.profile,
        &ProfileLook {
            name_size: 26.0,
            headline_size: 14.0,
            contact_size: 11.5,
            summary_size: 12.5,
            name_color: ON_THEME,
            text_color: ON_THEME,
            muted_color: ON_THEME,
        },
        scale,
    );

    let look = ItemLook {
        title_size: 14.0,
        meta_size: 11.5,
        body_size: 12.0,
        text_color: TEXT.to_string(),
        muted_color: MUTED.to_string(),
        tag_background: theme.to_string(),
        tag_color: ON_THEME.to_string(),
        item_gap: 12.0,
    };

    let mut main = Node::block();
    for module in doc.visible_modules() {
        let title = section_title(module, SectionNaming::Own, doc.settings.language);
        let accent = theme.to_string();
        let bar = Node::new(NodeKind::Divider)
            .role(Role::Decoration)
            .styled(|s| {
                s.background = Some(accent);
                s.width = Some(32.0);
                s.margin_bottom = 4.0;
            });
        let heading = Node::text(title, scale.px(17.0))
            .role(Role::SectionTitle)
            .styled(|s| {
                s.bold = true;
                s.color = Some(TEXT.to_string());
                s.margin_bottom = 8.0;
            });
        main = main.child(
            Node::block()
                .role(Role::Section)
                .key(&module.id)
                .styled(|s| s.margin_bottom = 16.0)
                .child(bar)
                .child(heading)
                .children(section_items(module, &look, scale)),
        );
    }

    let banner_style = |s: &mut crate::templates::tree::Style| {
        s.background = Some(theme.to_string());
        s.padding = 20.0;
    };

    match avatar(&doc.profile, 120.0) {
        Some(photo) => {
            let sidebar = Node::block()
                .role(Role::Header)
                .styled(banner_style)
                .styled(|s| s.width = Some(SIDEBAR_WIDTH))
                .child(photo)
                .children(parts.name)
                .children(parts.headline)
                .children(parts.contacts)
                .children(parts.custom_fields)
                .children(parts.summary);
            page(&doc.settings, "#ffffff").child(
                Node::row()
                    .styled(|s| s.gap = 24.0)
                    .child(sidebar)
                    .child(main),
            )
        }
        None => {
            let banner = Node::block()
                .role(Role::Header)
                .styled(banner_style)
                .styled(|s| s.margin_bottom = 20.0)
                .children(parts.name)
                .children(parts.headline)
                .child(
                    Node::row()
                        .styled(|s| s.gap = 14.0)
                        .children(parts.contacts)
                        .children(parts.custom_fields),
                )
                .children(parts.summary);
            page(&doc.settings, "#ffffff").child(banner).child(main)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::engineer_sample;

    #[test]
    fn test_sidebar_only_with_avatar() {
        let mut doc = engineer_sample();
        let tree = render(&doc);
        let header = tree.find_all(Role::Header)[0];
        assert_eq!(header.style.width, None);
        assert!(tree.find_all(Role::Avatar).is_empty());

        doc.profile.avatar = Some("avatar.png".into());
        let tree = render(&doc);
        let header = tree.find_all(Role::Header)[0];
        assert_eq!(header.style.width, Some(SIDEBAR_WIDTH));
        assert_eq!(tree.find_all(Role::Avatar).len(), 1);
    }
}
