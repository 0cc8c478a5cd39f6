//! Defaults resolution.
//!
//! Top-down walk that folds the template's top-level `defaults` into each
//! leaf and element, producing a new tree. Element values win on conflict.
//! After this stage no consumer needs to consult `defaults` again (the
//! render block still travels with the template for the assembler).

use super::{Defaults, Element, LeafNode, Node, SplitNode, Template};

/// Produce a fully resolved copy of the template.
pub fn resolve_defaults(template: &Template) -> Template {
    let mut resolved = template.clone();
    resolved.layout = resolve_node(&template.layout, &template.defaults);
    resolved
}

fn resolve_node(node: &Node, defaults: &Defaults) -> Node {
    match node {
        Node::Split(split) => Node::Split(SplitNode {
            children: split.children.iter().map(|child| resolve_node(child, defaults)).collect(),
            ..split.clone()
        }),
        Node::Leaf(leaf) => Node::Leaf(LeafNode {
            padding_mm: Some(leaf.padding_mm.unwrap_or(defaults.leaf_padding_mm)),
            elements: leaf.elements.iter().map(|e| resolve_element(e, defaults)).collect(),
            ..leaf.clone()
        }),
    }
}

fn resolve_element(element: &Element, defaults: &Defaults) -> Element {
    match element {
        Element::Text(text) => {
            let mut resolved = text.clone();
            let d = &defaults.text;
            resolved.font_height_mm = resolved.font_height_mm.or(d.font_height_mm);
            resolved.font_width_mm = resolved.font_width_mm.or(d.font_width_mm);
            resolved.wrap = resolved.wrap.or(d.wrap);
            resolved.fit = resolved.fit.or(d.fit);
            resolved.max_lines = resolved.max_lines.or(d.max_lines);
            resolved.align_h = resolved.align_h.or(d.align_h);
            resolved.align_v = resolved.align_v.or(d.align_v);
            Element::Text(resolved)
        }
        Element::Qr(qr) => {
            let mut resolved = qr.clone();
            let d = &defaults.code2d;
            resolved.quiet_zone_mm = resolved.quiet_zone_mm.or(d.quiet_zone_mm);
            resolved.size_mode = resolved.size_mode.or(d.size_mode);
            resolved.align_h = resolved.align_h.or(d.align_h);
            resolved.align_v = resolved.align_v.or(d.align_v);
            resolved.render_mode = resolved.render_mode.or(d.render_mode);
            Element::Qr(resolved)
        }
        Element::Datamatrix(dm) => {
            let mut resolved = dm.clone();
            let d = &defaults.code2d;
            resolved.quiet_zone_mm = resolved.quiet_zone_mm.or(d.quiet_zone_mm);
            resolved.size_mode = resolved.size_mode.or(d.size_mode);
            resolved.align_h = resolved.align_h.or(d.align_h);
            resolved.align_v = resolved.align_v.or(d.align_v);
            resolved.render_mode = resolved.render_mode.or(d.render_mode);
            Element::Datamatrix(resolved)
        }
        Element::Image(image) => {
            let mut resolved = image.clone();
            let d = &defaults.image;
            resolved.fit = resolved.fit.or(d.fit);
            resolved.align_h = resolved.align_h.or(d.align_h);
            resolved.align_v = resolved.align_v.or(d.align_v);
            resolved.threshold = resolved.threshold.or(d.threshold);
            resolved.dither = resolved.dither.or(d.dither);
            resolved.invert = resolved.invert.or(d.invert);
            Element::Image(resolved)
        }
        Element::Line(_) => element.clone(),
    }
}
