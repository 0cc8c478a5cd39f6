//! # Template Model
//!
//! The declarative label template: a binary tree of splits and leaves,
//! top-level defaults, and a schema version. The same types serve the Rust
//! API and the JSON API.
//!
//! ```ignore
//! use zplgrid::template::{Template, RenderTarget};
//!
//! let template = Template::from_json(json_str)?;
//! let target = RenderTarget { width_mm: 74.0, height_mm: 26.0, ..Default::default() };
//! let zpl = template.compile(&target, &variables, &Default::default())?;
//! ```
//!
//! Canonical node identity (`r`, `r/0`, `r/1/0`, ...) is derived from tree
//! position during traversal and never stored on the nodes, so it is
//! stable under ratio/gutter/divider edits and changes only on structural
//! edits. [`walk`] exposes the traversal.

pub mod types;

mod resolve;
mod validate;

pub use types::*;

pub use resolve::resolve_defaults;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::compiler::{CompileOptions, Compiler};
use crate::error::ZplgridError;
use crate::vars::MacroContext;

/// A label template document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Must be 1.
    pub schema_version: u32,
    #[serde(default = "default_template_name")]
    pub name: String,
    #[serde(default)]
    pub defaults: Defaults,
    pub layout: Node,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

fn default_template_name() -> String {
    "template".to_string()
}

/// A layout node: either a binary split or a leaf holding one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split(SplitNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn alias(&self) -> Option<&str> {
        match self {
            Node::Split(split) => split.alias.as_deref(),
            Node::Leaf(leaf) => leaf.alias.as_deref(),
        }
    }
}

/// Divides its rectangle into two children along one axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitNode {
    pub direction: Direction,
    /// Fraction of the available length given to child 0, in (0, 1).
    pub ratio: f64,
    #[serde(default)]
    pub gutter_mm: f64,
    #[serde(default)]
    pub divider: DividerSpec,
    /// Exactly two children (enforced by the validator).
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

/// Holds exactly one element inside an optionally padded content rect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_mm: Option<PaddingMm>,
    #[serde(default)]
    pub debug_border: bool,
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

/// The closed element union, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Text(TextElement),
    Qr(QrElement),
    Datamatrix(DataMatrixElement),
    Line(LineElement),
    Image(ImageElement),
}

impl Element {
    pub fn common(&self) -> &ElementCommon {
        match self {
            Element::Text(e) => &e.common,
            Element::Qr(e) => &e.common,
            Element::Datamatrix(e) => &e.common,
            Element::Line(e) => &e.common,
            Element::Image(e) => &e.common,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Qr(_) => "qr",
            Element::Datamatrix(_) => "datamatrix",
            Element::Line(_) => "line",
            Element::Image(_) => "image",
        }
    }
}

/// The physical label a template is compiled against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderTarget {
    pub width_mm: f64,
    pub height_mm: f64,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub origin_x_mm: f64,
    #[serde(default)]
    pub origin_y_mm: f64,
}

fn default_dpi() -> u32 {
    203
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self {
            width_mm: 0.0,
            height_mm: 0.0,
            dpi: default_dpi(),
            origin_x_mm: 0.0,
            origin_y_mm: 0.0,
        }
    }
}

impl RenderTarget {
    pub(crate) fn validate(&self) -> Result<(), ZplgridError> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(ZplgridError::schema("target", "width_mm and height_mm must be > 0"));
        }
        if self.dpi == 0 {
            return Err(ZplgridError::schema("target", "dpi must be > 0"));
        }
        if self.origin_x_mm < 0.0 || self.origin_y_mm < 0.0 {
            return Err(ZplgridError::schema("target", "origin offsets must be >= 0"));
        }
        Ok(())
    }
}

impl Template {
    /// Parse and fully validate a template from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ZplgridError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ZplgridError::schema("$", format!("invalid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Parse and fully validate a template from parsed JSON.
    ///
    /// Phase A checks shape (required fields, types, enums, ranges,
    /// unknown fields) against the raw value; phase B enforces the
    /// cross-field invariants on the typed tree.
    pub fn from_value(value: &Value) -> Result<Self, ZplgridError> {
        validate::validate_shape(value)?;
        let template: Template = serde_json::from_value(value.clone())
            .map_err(|e| ZplgridError::schema("$", e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    /// Enforce the cross-field structural invariants (validator phase B).
    ///
    /// Fails fast on the first violation with a path-qualified error.
    pub fn validate(&self) -> Result<(), ZplgridError> {
        validate::validate_invariants(self)
    }

    /// Compile this template against a render target with the default
    /// compiler and a macro context derived from the template name.
    pub fn compile(
        &self,
        target: &RenderTarget,
        variables: &HashMap<String, String>,
        options: &CompileOptions,
    ) -> Result<String, ZplgridError> {
        let ctx = MacroContext::for_template(&self.name);
        Compiler::new().compile(self, target, variables, &ctx, options)
    }
}

/// Depth-first traversal yielding `(canonical_id, json_path, node)` for
/// every node in the tree. Root is `("r", "layout", _)`; children of a
/// split append `/0` and `/1` to the id and `/children/N` to the path.
pub fn walk(root: &Node) -> Vec<(String, String, &Node)> {
    let mut out = Vec::new();
    walk_into(root, "r".to_string(), "layout".to_string(), &mut out);
    out
}

fn walk_into<'a>(node: &'a Node, id: String, path: String, out: &mut Vec<(String, String, &'a Node)>) {
    if let Node::Split(split) = node {
        out.push((id.clone(), path.clone(), node));
        for (idx, child) in split.children.iter().enumerate() {
            walk_into(child, format!("{}/{}", id, idx), format!("{}/children/{}", path, idx), out);
        }
        return;
    }
    out.push((id, path, node));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_leaf_template(ratio: f64) -> String {
        format!(
            r#"{{
                "schema_version": 1,
                "name": "t",
                "layout": {{
                    "kind": "split",
                    "direction": "v",
                    "ratio": {},
                    "children": [
                        {{"kind": "leaf", "elements": [{{"type": "text", "text": "a"}}]}},
                        {{"kind": "leaf", "elements": [{{"type": "text", "text": "b"}}]}}
                    ]
                }}
            }}"#,
            ratio
        )
    }

    #[test]
    fn test_parse_minimal_template() {
        let template = Template::from_json(&two_leaf_template(0.5)).unwrap();
        assert_eq!(template.schema_version, 1);
        assert_eq!(template.name, "t");
        match &template.layout {
            Node::Split(split) => assert_eq!(split.children.len(), 2),
            Node::Leaf(_) => panic!("expected split"),
        }
    }

    #[test]
    fn test_element_tag_dispatch() {
        let json = r#"{"type": "qr", "data": "X"}"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.type_name(), "qr");
        match element {
            Element::Qr(qr) => {
                assert_eq!(qr.data, "X");
                assert_eq!(qr.error_correction, ErrorCorrection::M);
                assert_eq!(qr.input_mode, InputMode::A);
            }
            _ => panic!("expected qr"),
        }
    }

    #[test]
    fn test_padding_roundtrip() {
        let padding: PaddingMm = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(padding.top, 1.0);
        assert_eq!(padding.left, 4.0);
        assert_eq!(serde_json::to_string(&padding).unwrap(), "[1.0,2.0,3.0,4.0]");
    }

    #[test]
    fn test_datamatrix_defaults() {
        let element: DataMatrixElement = serde_json::from_str(r#"{"data": "D"}"#).unwrap();
        assert_eq!(element.quality, 200);
        assert_eq!(element.format_id, 6);
        assert_eq!(element.escape_char, '_');
        assert_eq!(element.columns, 0);
        assert_eq!(element.rows, 0);
    }

    #[test]
    fn test_walk_canonical_ids() {
        let template = Template::from_json(&two_leaf_template(0.5)).unwrap();
        let nodes = walk(&template.layout);
        let ids: Vec<&str> = nodes.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["r", "r/0", "r/1"]);
        let paths: Vec<&str> = nodes.iter().map(|(_, path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["layout", "layout/children/0", "layout/children/1"]);
    }

    #[test]
    fn test_canonical_id_invariant_under_ratio_change() {
        let a = Template::from_json(&two_leaf_template(0.3)).unwrap();
        let b = Template::from_json(&two_leaf_template(0.7)).unwrap();
        let ids_a: Vec<String> = walk(&a.layout).into_iter().map(|(id, _, _)| id).collect();
        let ids_b: Vec<String> = walk(&b.layout).into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_render_target_rejects_zero_dpi() {
        let target = RenderTarget { width_mm: 50.0, height_mm: 20.0, dpi: 0, ..Default::default() };
        assert!(target.validate().is_err());
    }
}
