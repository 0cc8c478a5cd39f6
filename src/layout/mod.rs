//! # Layout Solver
//!
//! Recursive binary-split solver converting millimetres and ratios into
//! integer dot rectangles. All arithmetic happens in dots after one
//! mm→dots conversion per quantity.
//!
//! For a split of available length `L - gutter`, child 0 receives
//! `floor(available × ratio)` and child 1 the remainder, so
//! `child0 + gutter + child1 == L` holds exactly on both axes for every
//! split (the no-missing-pixel invariant).

use std::collections::HashMap;

use crate::error::ZplgridError;
use crate::template::{Direction, LeafNode, Node, PaddingMm};
use crate::units::mm_to_dots;

/// An integer dot rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Shrink by per-side insets, clamping width and height at zero.
    pub fn inset(&self, left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect {
            x: self.x + left,
            y: self.y + top,
            w: (self.w - left - right).max(0),
            h: (self.h - top - bottom).max(0),
        }
    }
}

/// A solved leaf: its rectangle and the content rectangle after padding.
#[derive(Debug)]
pub struct LeafLayout<'a> {
    /// Canonical structural id (`r`, `r/0/1`, ...).
    pub node_id: String,
    /// Error path (`layout/children/0`, ...).
    pub path: String,
    pub leaf: &'a LeafNode,
    pub rect: Rect,
    pub content_rect: Rect,
}

/// A visible divider centred inside its gutter.
#[derive(Debug, Clone, Copy)]
pub struct DividerLayout {
    pub rect: Rect,
    pub thickness: i32,
}

/// A gutter rectangle, retained for debug overlays.
#[derive(Debug, Clone, Copy)]
pub struct GutterLayout {
    pub rect: Rect,
    pub direction: Direction,
}

/// Everything the solver produces for one compile.
#[derive(Debug)]
pub struct LayoutResult<'a> {
    /// Canonical id → rect for every node, in traversal order.
    pub node_rects: Vec<(String, Rect)>,
    pub leaves: Vec<LeafLayout<'a>>,
    pub dividers: Vec<DividerLayout>,
    pub gutters: Vec<GutterLayout>,
    /// Alias → canonical id.
    pub aliases: HashMap<String, String>,
}

/// Solve the tree against a label of `width_dots` × `height_dots`.
pub fn compute_layout(
    root: &Node,
    width_dots: i32,
    height_dots: i32,
    dpi: u32,
) -> Result<LayoutResult<'_>, ZplgridError> {
    let mut result = LayoutResult {
        node_rects: Vec::new(),
        leaves: Vec::new(),
        dividers: Vec::new(),
        gutters: Vec::new(),
        aliases: HashMap::new(),
    };
    let root_rect = Rect { x: 0, y: 0, w: width_dots, h: height_dots };
    solve(root, "r", "layout", root_rect, dpi, &mut result)?;
    Ok(result)
}

fn solve<'a>(
    node: &'a Node,
    node_id: &str,
    path: &str,
    rect: Rect,
    dpi: u32,
    result: &mut LayoutResult<'a>,
) -> Result<(), ZplgridError> {
    result.node_rects.push((node_id.to_string(), rect));
    if let Some(alias) = node.alias() {
        result.aliases.insert(alias.to_string(), node_id.to_string());
    }

    let split = match node {
        Node::Leaf(leaf) => {
            let padding = leaf.padding_mm.unwrap_or(PaddingMm::ZERO);
            let content = rect.inset(
                mm_to_dots(padding.left, dpi),
                mm_to_dots(padding.top, dpi),
                mm_to_dots(padding.right, dpi),
                mm_to_dots(padding.bottom, dpi),
            );
            result.leaves.push(LeafLayout {
                node_id: node_id.to_string(),
                path: path.to_string(),
                leaf,
                rect,
                content_rect: content,
            });
            return Ok(());
        }
        Node::Split(split) => split,
    };

    if rect.w < 0 || rect.h < 0 {
        return Err(ZplgridError::layout(path, "negative rectangle"));
    }

    let gutter = mm_to_dots(split.gutter_mm, dpi);
    let length = match split.direction {
        Direction::Vertical => rect.w,
        Direction::Horizontal => rect.h,
    };
    let available = length - gutter;
    if available < 0 {
        return Err(ZplgridError::layout(path, "gutter exceeds parent"));
    }

    let child0_len = ((available as f64) * split.ratio).floor() as i32;
    let child0_len = child0_len.clamp(0, available);
    let child1_len = available - child0_len;

    let (child0, child1, gutter_rect) = match split.direction {
        Direction::Vertical => (
            Rect { x: rect.x, y: rect.y, w: child0_len, h: rect.h },
            Rect { x: rect.x + child0_len + gutter, y: rect.y, w: child1_len, h: rect.h },
            Rect { x: rect.x + child0_len, y: rect.y, w: gutter, h: rect.h },
        ),
        Direction::Horizontal => (
            Rect { x: rect.x, y: rect.y, w: rect.w, h: child0_len },
            Rect { x: rect.x, y: rect.y + child0_len + gutter, w: rect.w, h: child1_len },
            Rect { x: rect.x, y: rect.y + child0_len, w: rect.w, h: gutter },
        ),
    };

    if gutter > 0 {
        result.gutters.push(GutterLayout { rect: gutter_rect, direction: split.direction });
    }

    if split.divider.visible {
        let thickness = mm_to_dots(split.divider.thickness_mm, dpi);
        let rect = match split.direction {
            Direction::Vertical => Rect {
                x: rect.x + child0_len + (gutter - thickness) / 2,
                y: rect.y,
                w: thickness,
                h: rect.h,
            },
            Direction::Horizontal => Rect {
                x: rect.x,
                y: rect.y + child0_len + (gutter - thickness) / 2,
                w: rect.w,
                h: thickness,
            },
        };
        result.dividers.push(DividerLayout { rect, thickness });
    }

    solve(&split.children[0], &format!("{}/0", node_id), &format!("{}/children/0", path), child0, dpi, result)?;
    solve(&split.children[1], &format!("{}/1", node_id), &format!("{}/children/1", path), child1, dpi, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Node, Template};

    fn layout_of(json: &str) -> Template {
        Template::from_json(json).unwrap()
    }

    fn split_template(direction: &str, ratio: f64, gutter_mm: f64) -> Template {
        layout_of(&format!(
            r#"{{
                "schema_version": 1,
                "layout": {{
                    "kind": "split", "direction": "{}", "ratio": {}, "gutter_mm": {},
                    "children": [
                        {{"kind": "leaf", "padding_mm": [0,0,0,0], "alias": "first",
                          "elements": [{{"type": "text", "text": "a"}}]}},
                        {{"kind": "leaf", "padding_mm": [0,0,0,0],
                          "elements": [{{"type": "text", "text": "b"}}]}}
                    ]
                }}
            }}"#,
            direction, ratio, gutter_mm
        ))
    }

    fn rect_of<'a>(result: &'a LayoutResult<'_>, id: &str) -> Rect {
        result.node_rects.iter().find(|(node_id, _)| node_id == id).unwrap().1
    }

    #[test]
    fn test_dot_accounting_vertical() {
        // 591 dots wide, 8-dot gutter (1.0mm at 203dpi), ratio 0.3:
        // available 583, child0 = floor(174.9) = 174, child1 = 409.
        let template = split_template("v", 0.3, 1.0);
        let result = compute_layout(&template.layout, 591, 208, 203).unwrap();
        let child0 = rect_of(&result, "r/0");
        let child1 = rect_of(&result, "r/1");
        assert_eq!(child0.w, 174);
        assert_eq!(child1.w, 409);
        assert_eq!(child0.w + 8 + child1.w, 591);
        assert_eq!(child1.x, child0.x + child0.w + 8);
    }

    #[test]
    fn test_no_missing_pixels_on_both_axes() {
        for (direction, ratio) in
            [("v", 0.1), ("v", 0.5), ("v", 0.9), ("h", 0.33), ("h", 0.66)]
        {
            let template = split_template(direction, ratio, 0.5);
            let result = compute_layout(&template.layout, 591, 208, 203).unwrap();
            let parent = rect_of(&result, "r");
            let child0 = rect_of(&result, "r/0");
            let child1 = rect_of(&result, "r/1");
            let gutter = result.gutters[0].rect;
            if direction == "v" {
                assert_eq!(child0.w + gutter.w + child1.w, parent.w);
                assert_eq!(child0.h, parent.h);
            } else {
                assert_eq!(child0.h + gutter.h + child1.h, parent.h);
                assert_eq!(child0.w, parent.w);
            }
            assert!(child0.w >= 0 && child1.w >= 0);
        }
    }

    #[test]
    fn test_gutter_exceeds_parent() {
        let template = split_template("v", 0.5, 80.0);
        let err = compute_layout(&template.layout, 100, 100, 203).unwrap_err();
        assert_eq!(err.kind(), "layout");
        assert!(err.to_string().contains("gutter"));
    }

    #[test]
    fn test_divider_centred_in_gutter() {
        let template = layout_of(
            r#"{
                "schema_version": 1,
                "layout": {
                    "kind": "split", "direction": "v", "ratio": 0.5, "gutter_mm": 1.0,
                    "divider": {"visible": true, "thickness_mm": 0.25},
                    "children": [
                        {"kind": "leaf", "elements": [{"type": "text", "text": "a"}]},
                        {"kind": "leaf", "elements": [{"type": "text", "text": "b"}]}
                    ]
                }
            }"#,
        );
        // 200 dots, gutter 8 dots, thickness 2 dots, ratio 0.5:
        // child0 = 96, divider x = 96 + (8-2)/2 = 99.
        let result = compute_layout(&template.layout, 200, 100, 203).unwrap();
        assert_eq!(result.dividers.len(), 1);
        let divider = result.dividers[0];
        assert_eq!(divider.rect.x, 99);
        assert_eq!(divider.rect.w, 2);
        assert_eq!(divider.rect.h, 100);
    }

    #[test]
    fn test_leaf_content_rect_subtracts_padding() {
        let template = layout_of(
            r#"{
                "schema_version": 1,
                "layout": {"kind": "leaf", "padding_mm": [1, 2, 3, 4],
                           "elements": [{"type": "text", "text": "x"}]}
            }"#,
        );
        let result = compute_layout(&template.layout, 200, 100, 203).unwrap();
        let leaf = &result.leaves[0];
        // 203dpi: 1mm=8, 2mm=16, 3mm=24, 4mm=32 dots.
        assert_eq!(leaf.content_rect.x, 32);
        assert_eq!(leaf.content_rect.y, 8);
        assert_eq!(leaf.content_rect.w, 200 - 32 - 16);
        assert_eq!(leaf.content_rect.h, 100 - 8 - 24);
    }

    #[test]
    fn test_oversized_padding_clamps_to_zero() {
        let template = layout_of(
            r#"{
                "schema_version": 1,
                "layout": {"kind": "leaf", "padding_mm": [50, 50, 50, 50],
                           "elements": [{"type": "text", "text": "x"}]}
            }"#,
        );
        let result = compute_layout(&template.layout, 100, 100, 203).unwrap();
        let leaf = &result.leaves[0];
        assert_eq!(leaf.content_rect.w, 0);
        assert_eq!(leaf.content_rect.h, 0);
    }

    #[test]
    fn test_aliases_map_to_canonical_ids() {
        let template = split_template("v", 0.5, 0.0);
        let result = compute_layout(&template.layout, 100, 100, 203).unwrap();
        assert_eq!(result.aliases.get("first").map(String::as_str), Some("r/0"));
        assert!(result.gutters.is_empty());
    }

    #[test]
    fn test_nested_split_accounting() {
        let template = layout_of(
            r#"{
                "schema_version": 1,
                "layout": {
                    "kind": "split", "direction": "v", "ratio": 0.37, "gutter_mm": 0.7,
                    "children": [
                        {"kind": "split", "direction": "h", "ratio": 0.62, "gutter_mm": 0.3,
                         "children": [
                            {"kind": "leaf", "elements": [{"type": "text", "text": "a"}]},
                            {"kind": "leaf", "elements": [{"type": "text", "text": "b"}]}
                         ]},
                        {"kind": "leaf", "elements": [{"type": "text", "text": "c"}]}
                    ]
                }
            }"#,
        );
        let result = compute_layout(&template.layout, 473, 219, 300).unwrap();
        let parent = rect_of(&result, "r");
        let left = rect_of(&result, "r/0");
        let right = rect_of(&result, "r/1");
        let top = rect_of(&result, "r/0/0");
        let bottom = rect_of(&result, "r/0/1");
        let outer_gutter = result.gutters[0].rect;
        let inner_gutter = result.gutters[1].rect;
        assert_eq!(left.w + outer_gutter.w + right.w, parent.w);
        assert_eq!(top.h + inner_gutter.h + bottom.h, left.h);
    }
}
