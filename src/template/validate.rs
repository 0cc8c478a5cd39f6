//! Two-phase template validation.
//!
//! Phase A ([`validate_shape`]) checks the raw JSON value against the v1
//! schema: required fields, types, enum values, numeric ranges, and
//! unknown fields outside `extensions`. Phase B ([`validate_invariants`])
//! enforces the cross-field structural rules the schema cannot express,
//! failing fast on the first violation. Both produce path-qualified
//! errors (`layout/children/1: ...`).

use serde_json::Value;
use std::collections::HashSet;

use super::{Element, LeafNode, Node, SizeMode, SplitNode, Template};
use crate::error::ZplgridError;

// ============================================================================
// PHASE A — shape validation on the raw value
// ============================================================================

const TEMPLATE_KEYS: &[&str] = &["schema_version", "name", "defaults", "layout", "extensions"];
const DEFAULTS_KEYS: &[&str] = &["leaf_padding_mm", "text", "code2d", "image", "render"];
const DEFAULTS_TEXT_KEYS: &[&str] =
    &["font_height_mm", "font_width_mm", "wrap", "fit", "max_lines", "align_h", "align_v"];
const DEFAULTS_CODE2D_KEYS: &[&str] =
    &["quiet_zone_mm", "size_mode", "align_h", "align_v", "render_mode"];
const DEFAULTS_IMAGE_KEYS: &[&str] = &["fit", "align_h", "align_v", "threshold", "dither", "invert"];
const RENDER_KEYS: &[&str] =
    &["missing_variables", "emit_ci28", "debug_padding_guides", "debug_gutter_guides"];
const SPLIT_KEYS: &[&str] =
    &["kind", "direction", "ratio", "gutter_mm", "divider", "children", "alias", "extensions"];
const LEAF_KEYS: &[&str] =
    &["kind", "padding_mm", "debug_border", "elements", "alias", "extensions"];
const ELEMENT_COMMON_KEYS: &[&str] =
    &["type", "id", "padding_mm", "min_size_mm", "max_size_mm", "extensions"];
const TEXT_KEYS: &[&str] =
    &["text", "font_height_mm", "font_width_mm", "wrap", "fit", "max_lines", "align_h", "align_v"];
const QR_KEYS: &[&str] = &[
    "data", "magnification", "size_mode", "error_correction", "input_mode", "character_mode",
    "quiet_zone_mm", "align_h", "align_v", "render_mode",
];
const DATAMATRIX_KEYS: &[&str] = &[
    "data", "module_size_mm", "size_mode", "columns", "rows", "quality", "format_id",
    "escape_char", "quiet_zone_mm", "align_h", "align_v", "render_mode",
];
const LINE_KEYS: &[&str] = &["orientation", "thickness_mm", "align"];
const IMAGE_KEYS: &[&str] =
    &["source", "fit", "align_h", "align_v", "input_dpi", "threshold", "dither", "invert"];

pub fn validate_shape(raw: &Value) -> Result<(), ZplgridError> {
    let obj = as_object(raw, "$")?;
    check_keys(obj, TEMPLATE_KEYS, "$")?;

    match obj.get("schema_version") {
        Some(Value::Number(n)) if n.as_i64() == Some(1) => {}
        Some(_) => return Err(ZplgridError::schema("schema_version", "must be 1")),
        None => return Err(ZplgridError::schema("$", "schema_version is required")),
    }

    if let Some(name) = obj.get("name") {
        if !name.is_string() {
            return Err(ZplgridError::schema("name", "must be a string"));
        }
    }

    if let Some(defaults) = obj.get("defaults") {
        validate_defaults(defaults)?;
    }

    let layout = obj
        .get("layout")
        .ok_or_else(|| ZplgridError::schema("$", "layout is required"))?;
    validate_node(layout, "layout")
}

fn validate_defaults(raw: &Value) -> Result<(), ZplgridError> {
    let obj = as_object(raw, "defaults")?;
    check_keys(obj, DEFAULTS_KEYS, "defaults")?;
    if let Some(padding) = obj.get("leaf_padding_mm") {
        validate_padding(padding, "defaults/leaf_padding_mm")?;
    }
    if let Some(text) = obj.get("text") {
        let text_obj = as_object(text, "defaults/text")?;
        check_keys(text_obj, DEFAULTS_TEXT_KEYS, "defaults/text")?;
        check_enum(text_obj, "wrap", &["none", "word", "char"], "defaults/text")?;
        check_enum(text_obj, "fit", &["overflow", "wrap", "shrink_to_fit", "truncate"], "defaults/text")?;
        check_align(text_obj, "defaults/text")?;
    }
    if let Some(code2d) = obj.get("code2d") {
        let code2d_obj = as_object(code2d, "defaults/code2d")?;
        check_keys(code2d_obj, DEFAULTS_CODE2D_KEYS, "defaults/code2d")?;
        check_enum(code2d_obj, "size_mode", &["fixed", "max"], "defaults/code2d")?;
        check_enum(code2d_obj, "render_mode", &["zpl", "image"], "defaults/code2d")?;
        check_align(code2d_obj, "defaults/code2d")?;
    }
    if let Some(image) = obj.get("image") {
        let image_obj = as_object(image, "defaults/image")?;
        check_keys(image_obj, DEFAULTS_IMAGE_KEYS, "defaults/image")?;
        check_enum(image_obj, "fit", &["none", "contain", "cover", "stretch"], "defaults/image")?;
        check_enum(image_obj, "dither", &["none", "floyd_steinberg", "bayer"], "defaults/image")?;
        check_align(image_obj, "defaults/image")?;
    }
    if let Some(render) = obj.get("render") {
        let render_obj = as_object(render, "defaults/render")?;
        check_keys(render_obj, RENDER_KEYS, "defaults/render")?;
        check_enum(render_obj, "missing_variables", &["error", "empty"], "defaults/render")?;
    }
    Ok(())
}

fn validate_node(raw: &Value, path: &str) -> Result<(), ZplgridError> {
    let obj = as_object(raw, path)?;
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ZplgridError::schema(path, "kind is required"))?;

    match kind {
        "split" => {
            check_keys(obj, SPLIT_KEYS, path)?;
            check_enum(obj, "direction", &["v", "h"], path)?;
            if obj.get("direction").is_none() {
                return Err(ZplgridError::schema(path, "direction is required"));
            }
            let ratio = require_number(obj, "ratio", path)?;
            if !(ratio > 0.0 && ratio < 1.0) {
                return Err(ZplgridError::schema(
                    format!("{}/ratio", path),
                    "must be strictly between 0 and 1",
                ));
            }
            check_number_min(obj, "gutter_mm", 0.0, path)?;
            if let Some(divider) = obj.get("divider") {
                let divider_obj = as_object(divider, &format!("{}/divider", path))?;
                check_keys(divider_obj, &["visible", "thickness_mm"], &format!("{}/divider", path))?;
                if let Some(thickness) = divider_obj.get("thickness_mm") {
                    let t = thickness.as_f64().ok_or_else(|| {
                        ZplgridError::schema(format!("{}/divider/thickness_mm", path), "must be a number")
                    })?;
                    if t <= 0.0 {
                        return Err(ZplgridError::schema(
                            format!("{}/divider/thickness_mm", path),
                            "must be > 0",
                        ));
                    }
                }
            }
            let children = obj
                .get("children")
                .and_then(Value::as_array)
                .ok_or_else(|| ZplgridError::schema(path, "children is required"))?;
            if children.len() != 2 {
                return Err(ZplgridError::schema(
                    format!("{}/children", path),
                    "split must have exactly two children",
                ));
            }
            for (idx, child) in children.iter().enumerate() {
                validate_node(child, &format!("{}/children/{}", path, idx))?;
            }
            Ok(())
        }
        "leaf" => {
            check_keys(obj, LEAF_KEYS, path)?;
            if let Some(padding) = obj.get("padding_mm") {
                validate_padding(padding, &format!("{}/padding_mm", path))?;
            }
            let elements = obj
                .get("elements")
                .and_then(Value::as_array)
                .ok_or_else(|| ZplgridError::schema(path, "elements is required"))?;
            for (idx, element) in elements.iter().enumerate() {
                validate_element(element, &format!("{}/elements/{}", path, idx))?;
            }
            Ok(())
        }
        other => Err(ZplgridError::schema(path, format!("unknown node kind {:?}", other))),
    }
}

fn validate_element(raw: &Value, path: &str) -> Result<(), ZplgridError> {
    let obj = as_object(raw, path)?;
    let element_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ZplgridError::schema(path, "type is required"))?;

    let type_keys = match element_type {
        "text" => TEXT_KEYS,
        "qr" => QR_KEYS,
        "datamatrix" => DATAMATRIX_KEYS,
        "line" => LINE_KEYS,
        "image" => IMAGE_KEYS,
        other => {
            return Err(ZplgridError::schema(path, format!("unknown element type {:?}", other)))
        }
    };
    let allowed: HashSet<&str> =
        ELEMENT_COMMON_KEYS.iter().chain(type_keys.iter()).copied().collect();
    for key in obj.keys() {
        if !allowed.contains(key.as_str()) {
            return Err(ZplgridError::schema(path, format!("unknown field {:?}", key)));
        }
    }

    if let Some(padding) = obj.get("padding_mm") {
        validate_padding(padding, &format!("{}/padding_mm", path))?;
    }

    match element_type {
        "text" => {
            if obj.get("text").map(Value::is_string) != Some(true) {
                return Err(ZplgridError::schema(path, "text is required"));
            }
            check_number_exclusive_min(obj, "font_height_mm", 0.0, path)?;
            check_number_exclusive_min(obj, "font_width_mm", 0.0, path)?;
            check_enum(obj, "wrap", &["none", "word", "char"], path)?;
            check_enum(obj, "fit", &["overflow", "wrap", "shrink_to_fit", "truncate"], path)?;
            check_int_range(obj, "max_lines", 1, i64::MAX, path)?;
            check_align(obj, path)?;
        }
        "qr" => {
            if obj.get("data").map(Value::is_string) != Some(true) {
                return Err(ZplgridError::schema(path, "data is required"));
            }
            if obj.contains_key("model") {
                return Err(ZplgridError::schema(path, "qr model is fixed to 2"));
            }
            check_int_range(obj, "magnification", 1, 10, path)?;
            check_enum(obj, "size_mode", &["fixed", "max"], path)?;
            check_enum(obj, "error_correction", &["L", "M", "Q", "H"], path)?;
            check_enum(obj, "input_mode", &["A", "M"], path)?;
            check_enum(obj, "character_mode", &["N", "A"], path)?;
            check_number_min(obj, "quiet_zone_mm", 0.0, path)?;
            check_enum(obj, "render_mode", &["zpl", "image"], path)?;
            check_align(obj, path)?;
        }
        "datamatrix" => {
            if obj.get("data").map(Value::is_string) != Some(true) {
                return Err(ZplgridError::schema(path, "data is required"));
            }
            check_number_exclusive_min(obj, "module_size_mm", 0.0, path)?;
            check_enum(obj, "size_mode", &["fixed", "max"], path)?;
            check_int_range(obj, "columns", 0, 49, path)?;
            check_int_range(obj, "rows", 0, 49, path)?;
            if let Some(quality) = obj.get("quality") {
                if quality.as_i64() != Some(200) {
                    return Err(ZplgridError::schema(
                        format!("{}/quality", path),
                        "must be 200 (ECC200)",
                    ));
                }
            }
            check_int_range(obj, "format_id", 0, 6, path)?;
            if let Some(escape) = obj.get("escape_char") {
                let ok = escape.as_str().map(|s| s.chars().count() == 1).unwrap_or(false);
                if !ok {
                    return Err(ZplgridError::schema(
                        format!("{}/escape_char", path),
                        "must be exactly one character",
                    ));
                }
            }
            check_number_min(obj, "quiet_zone_mm", 0.0, path)?;
            check_enum(obj, "render_mode", &["zpl", "image"], path)?;
            check_align(obj, path)?;
        }
        "line" => {
            check_enum(obj, "orientation", &["h", "v"], path)?;
            let thickness = require_number(obj, "thickness_mm", path)?;
            if thickness <= 0.0 {
                return Err(ZplgridError::schema(format!("{}/thickness_mm", path), "must be > 0"));
            }
            check_enum(obj, "align", &["start", "center", "end"], path)?;
        }
        "image" => {
            let source = obj
                .get("source")
                .ok_or_else(|| ZplgridError::schema(path, "source is required"))?;
            let source_obj = as_object(source, &format!("{}/source", path))?;
            check_keys(source_obj, &["kind", "data"], &format!("{}/source", path))?;
            check_enum(source_obj, "kind", &["base64"], &format!("{}/source", path))?;
            if source_obj.get("data").map(Value::is_string) != Some(true) {
                return Err(ZplgridError::schema(format!("{}/source", path), "data is required"));
            }
            check_enum(obj, "fit", &["none", "contain", "cover", "stretch"], path)?;
            check_int_range(obj, "input_dpi", 1, i64::MAX, path)?;
            check_int_range(obj, "threshold", 0, 255, path)?;
            check_enum(obj, "dither", &["none", "floyd_steinberg", "bayer"], path)?;
            check_align(obj, path)?;
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn validate_padding(raw: &Value, path: &str) -> Result<(), ZplgridError> {
    let arr = raw
        .as_array()
        .ok_or_else(|| ZplgridError::schema(path, "must be [top, right, bottom, left]"))?;
    if arr.len() != 4 {
        return Err(ZplgridError::schema(path, "must have 4 numbers: [top, right, bottom, left]"));
    }
    for value in arr {
        match value.as_f64() {
            Some(v) if v >= 0.0 => {}
            _ => return Err(ZplgridError::schema(path, "padding values must be numbers >= 0")),
        }
    }
    Ok(())
}

fn as_object<'a>(
    raw: &'a Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>, ZplgridError> {
    raw.as_object().ok_or_else(|| ZplgridError::schema(path, "must be an object"))
}

fn check_keys(
    obj: &serde_json::Map<String, Value>,
    allowed: &[&str],
    path: &str,
) -> Result<(), ZplgridError> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ZplgridError::schema(path, format!("unknown field {:?}", key)));
        }
    }
    Ok(())
}

fn check_enum(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    allowed: &[&str],
    path: &str,
) -> Result<(), ZplgridError> {
    if let Some(value) = obj.get(key) {
        let ok = value.as_str().map(|s| allowed.contains(&s)).unwrap_or(false);
        if !ok {
            return Err(ZplgridError::schema(
                format!("{}/{}", path, key),
                format!("must be one of {:?}", allowed),
            ));
        }
    }
    Ok(())
}

fn require_number(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<f64, ZplgridError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ZplgridError::schema(path, format!("{} is required and must be a number", key)))
}

fn check_number_min(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    minimum: f64,
    path: &str,
) -> Result<(), ZplgridError> {
    if let Some(value) = obj.get(key) {
        match value.as_f64() {
            Some(v) if v >= minimum => {}
            _ => {
                return Err(ZplgridError::schema(
                    format!("{}/{}", path, key),
                    format!("must be a number >= {}", minimum),
                ))
            }
        }
    }
    Ok(())
}

fn check_number_exclusive_min(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    minimum: f64,
    path: &str,
) -> Result<(), ZplgridError> {
    if let Some(value) = obj.get(key) {
        match value.as_f64() {
            Some(v) if v > minimum => {}
            _ => {
                return Err(ZplgridError::schema(
                    format!("{}/{}", path, key),
                    format!("must be a number > {}", minimum),
                ))
            }
        }
    }
    Ok(())
}

fn check_int_range(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    minimum: i64,
    maximum: i64,
    path: &str,
) -> Result<(), ZplgridError> {
    if let Some(value) = obj.get(key) {
        match value.as_i64() {
            Some(v) if v >= minimum && v <= maximum => {}
            _ => {
                return Err(ZplgridError::schema(
                    format!("{}/{}", path, key),
                    format!("must be an integer in [{}, {}]", minimum, maximum),
                ))
            }
        }
    }
    Ok(())
}

fn check_align(obj: &serde_json::Map<String, Value>, path: &str) -> Result<(), ZplgridError> {
    check_enum(obj, "align_h", &["left", "center", "right"], path)?;
    check_enum(obj, "align_v", &["top", "center", "bottom"], path)
}

// ============================================================================
// PHASE B — structural invariants on the typed tree
// ============================================================================

pub fn validate_invariants(template: &Template) -> Result<(), ZplgridError> {
    if template.schema_version != 1 {
        return Err(ZplgridError::schema("schema_version", "must be 1"));
    }
    let mut seen_aliases: HashSet<&str> = HashSet::new();
    validate_node_invariants(&template.layout, "layout", &mut seen_aliases)
}

fn validate_node_invariants<'a>(
    node: &'a Node,
    path: &str,
    seen_aliases: &mut HashSet<&'a str>,
) -> Result<(), ZplgridError> {
    if let Some(alias) = node.alias() {
        if !seen_aliases.insert(alias) {
            return Err(ZplgridError::invariant(path, format!("duplicate alias {:?}", alias)));
        }
    }

    match node {
        Node::Split(split) => validate_split_invariants(split, path, seen_aliases),
        Node::Leaf(leaf) => validate_leaf_invariants(leaf, path),
    }
}

fn validate_split_invariants<'a>(
    split: &'a SplitNode,
    path: &str,
    seen_aliases: &mut HashSet<&'a str>,
) -> Result<(), ZplgridError> {
    if !(split.ratio > 0.0 && split.ratio < 1.0) {
        return Err(ZplgridError::invariant(path, "ratio must be strictly between 0 and 1"));
    }
    if split.gutter_mm < 0.0 {
        return Err(ZplgridError::invariant(path, "gutter_mm must be >= 0"));
    }
    if split.divider.visible && split.gutter_mm < split.divider.thickness_mm {
        return Err(ZplgridError::invariant(
            path,
            "gutter_mm must be >= divider.thickness_mm when the divider is visible",
        ));
    }
    if split.children.len() != 2 {
        return Err(ZplgridError::invariant(path, "split must have exactly two children"));
    }
    for (idx, child) in split.children.iter().enumerate() {
        validate_node_invariants(child, &format!("{}/children/{}", path, idx), seen_aliases)?;
    }
    Ok(())
}

fn validate_leaf_invariants(leaf: &LeafNode, path: &str) -> Result<(), ZplgridError> {
    if leaf.elements.len() != 1 {
        return Err(ZplgridError::invariant(path, "leaf must contain exactly one element"));
    }
    let element_path = format!("{}/elements/0", path);
    match &leaf.elements[0] {
        Element::Qr(qr) => {
            if qr.input_mode == super::InputMode::M && qr.character_mode.is_none() {
                return Err(ZplgridError::invariant(
                    element_path,
                    "character_mode is required when input_mode is \"M\"",
                ));
            }
        }
        Element::Datamatrix(dm) => {
            if dm.size_mode == Some(SizeMode::Max) && (dm.columns == 0 || dm.rows == 0) {
                return Err(ZplgridError::invariant(
                    element_path,
                    "size_mode \"max\" requires explicit columns and rows",
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Template;
    use crate::error::ZplgridError;

    fn parse(json: &str) -> Result<Template, ZplgridError> {
        Template::from_json(json)
    }

    fn leaf(element: &str) -> String {
        format!(r#"{{"kind": "leaf", "elements": [{}]}}"#, element)
    }

    fn template_with_layout(layout: &str) -> String {
        format!(r#"{{"schema_version": 1, "layout": {}}}"#, layout)
    }

    #[test]
    fn test_schema_version_must_be_1() {
        let err = parse(r#"{"schema_version": 2, "layout": {"kind": "leaf", "elements": []}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let json = format!(
            r#"{{"schema_version": 1, "bogus": true, "layout": {}}}"#,
            leaf(r#"{"type": "text", "text": "x"}"#)
        );
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "schema");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_unknown_element_field_rejected() {
        let json = template_with_layout(&leaf(r#"{"type": "text", "text": "x", "font": "Arial"}"#));
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "schema");
        assert!(err.to_string().contains("font"));
    }

    #[test]
    fn test_extensions_pass_through() {
        let json = template_with_layout(&leaf(
            r#"{"type": "text", "text": "x", "extensions": {"vendor": {"anything": [1, 2]}}}"#,
        ));
        let template = parse(&json).unwrap();
        match &template.layout {
            super::super::Node::Leaf(l) => {
                assert!(l.elements[0].common().extensions.contains_key("vendor"));
            }
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_ratio_out_of_range() {
        let json = template_with_layout(&format!(
            r#"{{"kind": "split", "direction": "v", "ratio": 1.0, "children": [{}, {}]}}"#,
            leaf(r#"{"type": "text", "text": "a"}"#),
            leaf(r#"{"type": "text", "text": "b"}"#)
        ));
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("ratio"));
    }

    #[test]
    fn test_split_requires_two_children() {
        let json = template_with_layout(&format!(
            r#"{{"kind": "split", "direction": "v", "ratio": 0.5, "children": [{}]}}"#,
            leaf(r#"{"type": "text", "text": "a"}"#)
        ));
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("exactly two children"));
    }

    #[test]
    fn test_leaf_requires_exactly_one_element() {
        let json = template_with_layout(r#"{"kind": "leaf", "elements": []}"#);
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "invariant");
        assert!(err.to_string().contains("layout: leaf must contain exactly one element"));
    }

    #[test]
    fn test_divider_thicker_than_gutter() {
        let json = template_with_layout(&format!(
            r#"{{"kind": "split", "direction": "v", "ratio": 0.5, "gutter_mm": 0.1,
                "divider": {{"visible": true, "thickness_mm": 0.3}},
                "children": [{}, {}]}}"#,
            leaf(r#"{"type": "text", "text": "a"}"#),
            leaf(r#"{"type": "text", "text": "b"}"#)
        ));
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "invariant");
        assert!(err.to_string().starts_with("layout:"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let json = template_with_layout(&format!(
            r#"{{"kind": "split", "direction": "v", "ratio": 0.5, "alias": "box",
                "children": [
                    {{"kind": "leaf", "alias": "box", "elements": [{{"type": "text", "text": "a"}}]}},
                    {}
                ]}}"#,
            leaf(r#"{"type": "text", "text": "b"}"#)
        ));
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "invariant");
        assert!(err.to_string().contains("duplicate alias"));
    }

    #[test]
    fn test_qr_manual_mode_requires_character_mode() {
        let json = template_with_layout(&leaf(r#"{"type": "qr", "data": "X", "input_mode": "M"}"#));
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "invariant");
        assert!(err.to_string().contains("character_mode"));
    }

    #[test]
    fn test_qr_model_not_configurable() {
        let json = template_with_layout(&leaf(r#"{"type": "qr", "data": "X", "model": 1}"#));
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_datamatrix_max_requires_dims() {
        let json = template_with_layout(&leaf(
            r#"{"type": "datamatrix", "data": "D", "size_mode": "max", "columns": 0, "rows": 10}"#,
        ));
        let err = parse(&json).unwrap_err();
        assert_eq!(err.kind(), "invariant");
        assert!(err.to_string().contains("columns and rows"));
    }

    #[test]
    fn test_datamatrix_quality_must_be_200() {
        let json = template_with_layout(&leaf(
            r#"{"type": "datamatrix", "data": "D", "quality": 140}"#,
        ));
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn test_magnification_range() {
        let json =
            template_with_layout(&leaf(r#"{"type": "qr", "data": "X", "magnification": 11}"#));
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("magnification"));
    }

    #[test]
    fn test_negative_padding_rejected() {
        let json = template_with_layout(
            r#"{"kind": "leaf", "padding_mm": [1, -1, 1, 1],
                "elements": [{"type": "text", "text": "x"}]}"#,
        );
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("padding"));
    }

    #[test]
    fn test_valid_template_passes() {
        let json = template_with_layout(&format!(
            r#"{{"kind": "split", "direction": "h", "ratio": 0.4, "gutter_mm": 1.0,
                "divider": {{"visible": true, "thickness_mm": 0.3}},
                "children": [{}, {}]}}"#,
            leaf(r#"{"type": "qr", "data": "{id}", "size_mode": "max"}"#),
            leaf(r#"{"type": "text", "text": "hello", "max_lines": 2}"#)
        ));
        assert!(parse(&json).is_ok());
    }
}
