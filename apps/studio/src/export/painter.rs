//! Built-in raster host: lays the presentation tree out into boxes and paints
//! them onto an RGBA canvas.
//!
//! Text is painted as solid runs ("greeked") in the text colour using static
//! advance widths, so output depends only on the tree and the scale.
//! Widths are in em units; non-ASCII characters count as one full em, which
//! matches CJK glyphs.

use image::{Rgba, RgbaImage};

use crate::export::ExportError;
use crate::templates::common::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::templates::tree::{Align, Node, NodeKind};

/// Pixel density bounds for a capture.
pub const MIN_SCALE: f32 = 0.25;
pub const MAX_SCALE: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest {
    pub scale: f32,
    pub background: Rgba<u8>,
}

/// Something that can turn a realised tree into pixels.
pub trait RasterHost: Send + Sync {
    fn capture(&self, node: &Node, request: &CaptureRequest) -> Result<RgbaImage, ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Advance widths
// ────────────────────────────────────────────────────────────────────────────

fn char_em(c: char) -> f32 {
    match c {
        ' ' => 0.28,
        'i' | 'l' | 'j' | 't' | 'f' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.3,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        c if c.is_ascii() => 0.52,
        _ => 1.0,
    }
}

pub fn measure(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_em).sum::<f32>() * font_size
}

/// Greedy wrap. ASCII words stay whole when they fit; every other character
/// is its own break opportunity.
pub fn wrap(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_ascii() && !c.is_ascii_whitespace() {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        tokens.push(c.to_string());
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0.0;
    for token in tokens {
        let token_width = measure(&token, font_size);
        if width + token_width > max_width && !line.is_empty() {
            lines.push(std::mem::take(&mut line).trim_end().to_string());
            width = 0.0;
            if token.trim().is_empty() {
                continue;
            }
        }
        if token_width > max_width {
            for c in token.chars() {
                let w = char_em(c) * font_size;
                if width + w > max_width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                }
                line.push(c);
                width += w;
            }
        } else {
            line.push_str(&token);
            width += token_width;
        }
    }
    if !line.trim().is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().strip_prefix('#').filter(|h| h.is_ascii())?;
    let expand = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Some(Rgba([
            expand(&hex[0..2])?,
            expand(&hex[2..4])?,
            expand(&hex[4..6])?,
            255,
        ])),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Inherited {
    font_size: f32,
    line_height: f32,
    color: Rgba<u8>,
}

const INK: Rgba<u8> = Rgba([17, 24, 39, 255]);
const PLACEHOLDER: Rgba<u8> = Rgba([209, 213, 219, 255]);
const RULE: Rgba<u8> = Rgba([229, 231, 235, 255]);

/// Lays out `root` and returns the paint list plus the content height.
pub fn layout(root: &Node) -> (Vec<PaintRect>, f32, f32) {
    let width = root.style.width.unwrap_or(PAGE_WIDTH);
    let inherited = Inherited {
        font_size: 12.0,
        line_height: 1.5,
        color: INK,
    };
    let mut out = Vec::new();
    let height = layout_node(root, 0.0, 0.0, width, inherited, &mut out);
    (out, width, height.max(PAGE_HEIGHT))
}

fn layout_node(
    node: &Node,
    x: f32,
    y: f32,
    width: f32,
    parent: Inherited,
    out: &mut Vec<PaintRect>,
) -> f32 {
    let style = &node.style;
    let ctx = Inherited {
        font_size: style.font_size.unwrap_or(parent.font_size),
        line_height: style.line_height.unwrap_or(parent.line_height),
        color: style
            .color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(parent.color),
    };
    let width = style.width.map(|w| w.min(width)).unwrap_or(width);
    let background_slot = style.background.as_deref().and_then(parse_color).map(|color| {
        out.push(PaintRect {
            x,
            y,
            w: width,
            h: 0.0,
            color,
        });
        out.len() - 1
    });

    let pad = style.padding;
    let inner_x = x + pad;
    let inner_w = (width - 2.0 * pad).max(0.0);
    let mut cursor = y + pad;

    match node.kind {
        NodeKind::Text | NodeKind::Tag => {
            let text = node.text.as_deref().unwrap_or("");
            let line_px = ctx.font_size * ctx.line_height;
            let paragraphs: Vec<String> = if style.pre_line {
                text.split('\n').map(str::to_string).collect()
            } else {
                vec![text.replace('\n', " ")]
            };
            for paragraph in paragraphs {
                let lines = wrap(&paragraph, inner_w, ctx.font_size);
                if lines.is_empty() {
                    cursor += line_px;
                }
                for line in lines {
                    let w = measure(&line, ctx.font_size).min(inner_w);
                    let offset = match style.align {
                        Align::Left => 0.0,
                        Align::Center => (inner_w - w) / 2.0,
                        Align::Right => inner_w - w,
                    };
                    let bar = ctx.font_size * if style.bold { 0.8 } else { 0.65 };
                    out.push(PaintRect {
                        x: inner_x + offset,
                        y: cursor + (line_px - bar) / 2.0,
                        w,
                        h: bar,
                        color: ctx.color,
                    });
                    cursor += line_px;
                }
            }
        }
        NodeKind::Image => {
            let side = style.width.unwrap_or(64.0).min(inner_w);
            out.push(PaintRect {
                x: inner_x,
                y: cursor,
                w: side,
                h: side,
                color: PLACEHOLDER,
            });
            cursor += side;
        }
        NodeKind::Divider => {
            let color = style
                .background
                .as_deref()
                .and_then(parse_color)
                .unwrap_or(RULE);
            out.push(PaintRect {
                x: inner_x,
                y: cursor,
                w: inner_w,
                h: 3.0,
                color,
            });
            cursor += 3.0;
        }
        NodeKind::Row => {
            cursor += layout_row(node, inner_x, cursor, inner_w, ctx, out);
        }
        NodeKind::Page | NodeKind::Block => {
            for child in &node.children {
                cursor += layout_node(child, inner_x, cursor, inner_w, ctx, out);
            }
        }
    }

    // Text-like nodes never have children; containers already laid theirs out.
    let mut height = cursor + pad - y;
    if let Some(border) = style.border_color.as_deref().and_then(parse_color) {
        out.push(PaintRect {
            x,
            y: y + height,
            w: width,
            h: 1.0,
            color: border,
        });
        height += 1.0;
    }
    if let Some(slot) = background_slot {
        out[slot].h = height;
    }
    height + style.margin_bottom
}

/// Natural single-line width of inline children; `None` means "flexible".
fn natural_width(node: &Node, ctx: Inherited) -> Option<f32> {
    if let Some(w) = node.style.width {
        return Some(w);
    }
    match node.kind {
        NodeKind::Text | NodeKind::Tag => {
            let size = node.style.font_size.unwrap_or(ctx.font_size);
            let text = node.text.as_deref().unwrap_or("");
            let widest = text
                .split('\n')
                .map(|line| measure(line, size))
                .fold(0.0, f32::max);
            Some(widest + 2.0 * node.style.padding + 1.0)
        }
        NodeKind::Image => Some(64.0),
        _ => None,
    }
}

fn layout_row(
    node: &Node,
    x: f32,
    y: f32,
    width: f32,
    ctx: Inherited,
    out: &mut Vec<PaintRect>,
) -> f32 {
    let gap = node.style.gap;
    let widths: Vec<Option<f32>> = node
        .children
        .iter()
        .map(|c| natural_width(c, ctx).map(|w| w.min(width)))
        .collect();
    let flexible = widths.iter().filter(|w| w.is_none()).count();

    if flexible == 0 {
        // Flow with wrapping, like inline tags.
        let mut cx = x;
        let mut line_top = y;
        let mut line_height: f32 = 0.0;
        for (child, w) in node.children.iter().zip(widths) {
            let w = w.unwrap_or(0.0);
            if cx > x && cx + w > x + width {
                line_top += line_height + gap;
                cx = x;
                line_height = 0.0;
            }
            let h = layout_node(child, cx, line_top, w, ctx, out);
            line_height = line_height.max(h);
            cx += w + gap;
        }
        return line_top + line_height - y;
    }

    let fixed: f32 = widths.iter().flatten().sum();
    let gaps = gap * node.children.len().saturating_sub(1) as f32;
    let share = ((width - fixed - gaps) / flexible as f32).max(0.0);
    let mut cx = x;
    let mut height: f32 = 0.0;
    for (child, w) in node.children.iter().zip(widths) {
        let w = w.unwrap_or(share);
        height = height.max(layout_node(child, cx, y, w, ctx, out));
        cx += w + gap;
    }
    height
}

// ────────────────────────────────────────────────────────────────────────────
// Painting
// ────────────────────────────────────────────────────────────────────────────

/// The default [`RasterHost`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRasterizer;

impl RasterHost for BoxRasterizer {
    fn capture(&self, node: &Node, request: &CaptureRequest) -> Result<RgbaImage, ExportError> {
        let scale = request.scale.clamp(MIN_SCALE, MAX_SCALE);
        let (rects, width, height) = layout(node);
        let canvas_w = (width * scale).ceil() as u32;
        let canvas_h = (height * scale).ceil() as u32;
        if canvas_w == 0 || canvas_h == 0 {
            return Err(ExportError::EmptyCapture);
        }

        let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, request.background);
        for rect in rects {
            fill(&mut canvas, &rect, scale);
        }
        Ok(canvas)
    }
}

fn fill(canvas: &mut RgbaImage, rect: &PaintRect, scale: f32) {
    let x0 = (rect.x * scale).floor().max(0.0) as u32;
    let y0 = (rect.y * scale).floor().max(0.0) as u32;
    let x1 = ((rect.x + rect.w) * scale).ceil().max(0.0) as u32;
    let y1 = ((rect.y + rect.h) * scale).ceil().max(0.0) as u32;
    let x1 = x1.min(canvas.width());
    let y1 = y1.min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, rect.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::engineer_sample;
    use crate::templates::TemplateKind;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_measure_cjk_is_full_em() {
        assert_eq!(measure("简历", 10.0), 20.0);
        assert!(measure("il", 10.0) < measure("mw", 10.0));
    }

    #[test]
    fn test_wrap_keeps_ascii_words_whole() {
        let lines = wrap("hello world again", measure("hello world", 10.0) + 1.0, 10.0);
        assert_eq!(lines, vec!["hello world", "again"]);
    }

    #[test]
    fn test_wrap_breaks_cjk_anywhere() {
        let lines = wrap("负责订单系统重构", 40.0, 10.0);
        assert_eq!(lines, vec!["负责订单", "系统重构"]);
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let lines = wrap("abcdefghij", measure("abcde", 10.0), 10.0);
        assert_eq!(lines.concat(), "abcdefghij");
        assert!(lines.len() >= 2);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#fff"), Some(WHITE));
        assert_eq!(parse_color("#2563eb"), Some(Rgba([0x25, 0x63, 0xeb, 255])));
        assert_eq!(parse_color("blue"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_capture_dimensions_follow_scale() {
        let tree = TemplateKind::Classic.render(&engineer_sample()).unwrap();
        let one = BoxRasterizer
            .capture(&tree, &CaptureRequest { scale: 1.0, background: WHITE })
            .unwrap();
        let two = BoxRasterizer
            .capture(&tree, &CaptureRequest { scale: 2.0, background: WHITE })
            .unwrap();
        assert_eq!(one.width(), PAGE_WIDTH as u32);
        assert!(one.height() >= PAGE_HEIGHT as u32);
        assert_eq!(two.width(), one.width() * 2);
        assert_eq!(*one.get_pixel(0, one.height() - 1), WHITE);
    }

    #[test]
    fn test_capture_is_deterministic_and_inked() {
        let tree = TemplateKind::Modern.render(&engineer_sample()).unwrap();
        let request = CaptureRequest { scale: 1.0, background: WHITE };
        let a = BoxRasterizer.capture(&tree, &request).unwrap();
        let b = BoxRasterizer.capture(&tree, &request).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
        assert!(a.pixels().any(|p| *p != WHITE));
    }
}
