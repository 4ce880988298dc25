//! Presentation tree produced by the template variants.
//!
//! The tree is the logical layout: the same document and template always
//! produce the same tree. Host renderers (the raster painter, the print HTML
//! writer) materialise it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Page,
    Block,
    Row,
    Text,
    Tag,
    Image,
    Divider,
}

/// Semantic role of a node, shared by every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Header,
    Name,
    Headline,
    Contact,
    Avatar,
    Summary,
    CustomField,
    Section,
    SectionTitle,
    Item,
    ItemTitle,
    ItemSubtitle,
    ItemDate,
    ItemLocation,
    ItemDescription,
    Skill,
    Decoration,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    pub padding: f32,
    pub gap: f32,
    pub margin_bottom: f32,
    /// Fixed width in pixels; `None` takes the remaining space.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Keep literal line breaks in text.
    pub pre_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Reconciliation key: the module or item id this node renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub style: Style,
    /// Subtrees carrying this marker never reach exported output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub export_exclude: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            role: None,
            key: None,
            text: None,
            style: Style::default(),
            export_exclude: false,
            children: Vec::new(),
        }
    }

    pub fn block() -> Self {
        Self::new(NodeKind::Block)
    }

    pub fn row() -> Self {
        Self::new(NodeKind::Row)
    }

    pub fn text(text: impl Into<String>, font_size: f32) -> Self {
        let mut node = Self::new(NodeKind::Text);
        node.text = Some(text.into());
        node.style.font_size = Some(font_size);
        node
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn styled(mut self, f: impl FnOnce(&mut Style)) -> Self {
        f(&mut self.style);
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn excluded(mut self) -> Self {
        self.export_exclude = true;
        self
    }

    /// Depth-first pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn find_all(&self, role: Role) -> Vec<&Node> {
        let mut found = Vec::new();
        self.walk(&mut |n| {
            if n.role == Some(role) {
                found.push(n);
            }
        });
        found
    }

    /// A copy with every export-excluded subtree removed.
    pub fn pruned_for_export(&self) -> Node {
        let mut copy = self.clone();
        copy.children = self
            .children
            .iter()
            .filter(|c| !c.export_exclude)
            .map(Node::pruned_for_export)
            .collect();
        copy
    }

    /// The visible content skeleton: section keys in order, each with its item keys.
    pub fn outline(&self) -> Vec<(String, Vec<String>)> {
        self.find_all(Role::Section)
            .into_iter()
            .map(|section| {
                let items = section
                    .find_all(Role::Item)
                    .into_iter()
                    .chain(section.find_all(Role::Skill))
                    .filter_map(|n| n.key.clone())
                    .collect();
                (section.key.clone().unwrap_or_default(), items)
            })
            .collect()
    }

    /// Serialises the tree as HTML. Layout is approximated with flexbox.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let tag = match self.kind {
            NodeKind::Text | NodeKind::Tag => "span",
            NodeKind::Image => "img",
            NodeKind::Divider => "hr",
            _ => "div",
        };
        let mut css = Vec::new();
        let s = &self.style;
        if let Some(size) = s.font_size {
            css.push(format!("font-size:{size:.1}px"));
        }
        if let Some(lh) = s.line_height {
            css.push(format!("line-height:{lh}"));
        }
        if let Some(family) = &s.font_family {
            css.push(format!("font-family:{family}"));
        }
        if let Some(color) = &s.color {
            css.push(format!("color:{color}"));
        }
        if let Some(bg) = &s.background {
            css.push(format!("background:{bg}"));
        }
        if let Some(border) = &s.border_color {
            css.push(format!("border-bottom:1px solid {border}"));
        }
        if s.bold {
            css.push("font-weight:bold".to_string());
        }
        if s.italic {
            css.push("font-style:italic".to_string());
        }
        if s.padding > 0.0 {
            css.push(format!("padding:{}px", s.padding));
        }
        if s.margin_bottom > 0.0 {
            css.push(format!("margin-bottom:{}px", s.margin_bottom));
        }
        if let Some(width) = s.width {
            css.push(format!("width:{width}px;flex:none"));
        }
        if s.pre_line {
            css.push("white-space:pre-line".to_string());
        }
        match self.kind {
            NodeKind::Row => css.push(format!("display:flex;gap:{}px", s.gap)),
            NodeKind::Text => css.push("display:block".to_string()),
            NodeKind::Tag => css.push("display:inline-block;margin:0 4px 4px 0".to_string()),
            _ => {}
        }
        match s.align {
            Align::Left => {}
            Align::Center => css.push("text-align:center".to_string()),
            Align::Right => css.push("text-align:right".to_string()),
        }

        out.push('<');
        out.push_str(tag);
        if let Some(key) = &self.key {
            out.push_str(&format!(" data-key=\"{}\"", escape_html(key)));
        }
        if self.export_exclude {
            out.push_str(" class=\"no-export\"");
        }
        if self.kind == NodeKind::Image {
            if let Some(src) = &self.text {
                out.push_str(&format!(" src=\"{}\" alt=\"\"", escape_html(src)));
            }
        }
        if !css.is_empty() {
            out.push_str(&format!(" style=\"{}\"", css.join(";")));
        }
        if matches!(self.kind, NodeKind::Image | NodeKind::Divider) {
            out.push_str(" />");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_html(text));
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str(&format!("</{tag}>"));
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new(NodeKind::Page)
            .child(Node::text("toolbar", 12.0).excluded())
            .child(
                Node::block()
                    .role(Role::Section)
                    .key("m1")
                    .child(Node::block().role(Role::Item).key("i1"))
                    .child(Node::new(NodeKind::Tag).role(Role::Skill).key("s1")),
            )
    }

    #[test]
    fn test_pruned_for_export_removes_marked_subtrees() {
        let pruned = sample().pruned_for_export();
        assert_eq!(pruned.children.len(), 1);
        assert_eq!(pruned.children[0].key.as_deref(), Some("m1"));
    }

    #[test]
    fn test_outline_lists_sections_and_items() {
        assert_eq!(
            sample().outline(),
            vec![("m1".to_string(), vec!["i1".to_string(), "s1".to_string()])]
        );
    }

    #[test]
    fn test_html_escapes_and_marks_excluded() {
        let html = Node::new(NodeKind::Page)
            .child(Node::text("<b>&", 10.0))
            .child(Node::text("x", 10.0).excluded())
            .to_html();
        assert!(html.contains("&lt;b&gt;&amp;"));
        assert!(html.contains("class=\"no-export\""));
    }
}
