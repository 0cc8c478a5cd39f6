//! # Variable Binding
//!
//! Placeholder substitution for element data fields. Substitution is an
//! explicit left-to-right scan, not a host formatter:
//!
//! - `{name}` expands to the variable's value;
//! - `{{` and `}}` produce literal braces;
//! - `{name:spec}` applies a minimal format spec (optional fill character,
//!   alignment `<` / `>` / `^`, and a minimum width);
//! - anything else is a [`ZplgridError::Format`].
//!
//! Missing names follow the `missing_variables` policy: `error` fails the
//! compile, `empty` substitutes the empty string.
//!
//! Binding runs before layout and produces a new tree, so that text
//! measurement operates on the final strings.

pub mod macros;

pub use macros::{builtin_macros, commit_used_counters, CounterStore, MacroContext};

use std::collections::HashMap;

use crate::error::ZplgridError;
use crate::template::{Element, LeafNode, MissingVariables, Node, SplitNode, Template};

/// Substitute placeholders in one string. `path` qualifies errors.
pub fn substitute(
    input: &str,
    variables: &HashMap<String, String>,
    missing: MissingVariables,
    path: &str,
) -> Result<String, ZplgridError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut body = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(ZplgridError::format(path, "nested '{' in placeholder"))
                        }
                        other => body.push(other),
                    }
                }
                if !closed {
                    return Err(ZplgridError::format(path, "unbalanced '{' in template string"));
                }
                let (name, spec) = match body.split_once(':') {
                    Some((name, spec)) => (name, Some(spec)),
                    None => (body.as_str(), None),
                };
                if name.is_empty() {
                    return Err(ZplgridError::format(path, "empty placeholder name"));
                }
                let value = match variables.get(name) {
                    Some(value) => value.clone(),
                    None => match missing {
                        MissingVariables::Empty => String::new(),
                        MissingVariables::Error => {
                            return Err(ZplgridError::MissingVariable {
                                name: name.to_string(),
                                path: path.to_string(),
                            })
                        }
                    },
                };
                match spec {
                    Some(spec) => out.push_str(&apply_format_spec(&value, spec, path)?),
                    None => out.push_str(&value),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(ZplgridError::format(path, "unbalanced '}' in template string"));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Minimal format spec: `[[fill]align][width]` with align in `<`, `>`, `^`.
fn apply_format_spec(value: &str, spec: &str, path: &str) -> Result<String, ZplgridError> {
    if spec.is_empty() {
        return Ok(value.to_string());
    }

    let chars: Vec<char> = spec.chars().collect();
    let (fill, align, width_start) = match chars.as_slice() {
        [fill, align, ..] if matches!(*align, '<' | '>' | '^') => (*fill, *align, 2),
        [align, ..] if matches!(*align, '<' | '>' | '^') => (' ', *align, 1),
        _ => (' ', '<', 0),
    };

    let width_str: String = chars[width_start..].iter().collect();
    let width: usize = width_str.parse().map_err(|_| {
        ZplgridError::format(path, format!("unsupported format spec {:?}", spec))
    })?;

    let len = value.chars().count();
    if len >= width {
        return Ok(value.to_string());
    }
    let pad = width - len;
    let mut out = String::with_capacity(width);
    match align {
        '>' => {
            out.extend(std::iter::repeat(fill).take(pad));
            out.push_str(value);
        }
        '^' => {
            let left = pad / 2;
            out.extend(std::iter::repeat(fill).take(left));
            out.push_str(value);
            out.extend(std::iter::repeat(fill).take(pad - left));
        }
        _ => {
            out.push_str(value);
            out.extend(std::iter::repeat(fill).take(pad));
        }
    }
    Ok(out)
}

/// Collect the placeholder names used anywhere in the template, in
/// traversal order. Malformed syntax is ignored here; [`substitute`]
/// reports it during binding.
pub fn collect_placeholders(template: &Template) -> Vec<String> {
    let mut names = Vec::new();
    for (_, _, node) in crate::template::walk(&template.layout) {
        if let Node::Leaf(leaf) = node {
            for element in &leaf.elements {
                for field in substitutable_fields(element) {
                    collect_from(field, &mut names);
                }
            }
        }
    }
    names
}

fn substitutable_fields(element: &Element) -> Vec<&str> {
    match element {
        Element::Text(e) => vec![e.text.as_str()],
        Element::Qr(e) => vec![e.data.as_str()],
        Element::Datamatrix(e) => vec![e.data.as_str()],
        Element::Image(e) => vec![e.source.data.as_str()],
        Element::Line(_) => Vec::new(),
    }
}

fn collect_from(input: &str, names: &mut Vec<String>) {
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            continue;
        }
        let mut body = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            body.push(inner);
        }
        if !closed {
            return;
        }
        let name = body.split(':').next().unwrap_or("");
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}

/// Produce a copy of the template with every substitutable field bound.
pub fn bind(
    template: &Template,
    variables: &HashMap<String, String>,
    missing: MissingVariables,
) -> Result<Template, ZplgridError> {
    let mut bound = template.clone();
    bound.layout = bind_node(&template.layout, "layout", variables, missing)?;
    Ok(bound)
}

fn bind_node(
    node: &Node,
    path: &str,
    variables: &HashMap<String, String>,
    missing: MissingVariables,
) -> Result<Node, ZplgridError> {
    match node {
        Node::Split(split) => {
            let mut children = Vec::with_capacity(split.children.len());
            for (idx, child) in split.children.iter().enumerate() {
                children.push(bind_node(
                    child,
                    &format!("{}/children/{}", path, idx),
                    variables,
                    missing,
                )?);
            }
            Ok(Node::Split(SplitNode { children, ..split.clone() }))
        }
        Node::Leaf(leaf) => {
            let mut elements = Vec::with_capacity(leaf.elements.len());
            for (idx, element) in leaf.elements.iter().enumerate() {
                let element_path = format!("{}/elements/{}", path, idx);
                elements.push(bind_element(element, &element_path, variables, missing)?);
            }
            Ok(Node::Leaf(LeafNode { elements, ..leaf.clone() }))
        }
    }
}

fn bind_element(
    element: &Element,
    path: &str,
    variables: &HashMap<String, String>,
    missing: MissingVariables,
) -> Result<Element, ZplgridError> {
    Ok(match element {
        Element::Text(e) => {
            let mut bound = e.clone();
            bound.text = substitute(&e.text, variables, missing, path)?;
            Element::Text(bound)
        }
        Element::Qr(e) => {
            let mut bound = e.clone();
            bound.data = substitute(&e.data, variables, missing, path)?;
            Element::Qr(bound)
        }
        Element::Datamatrix(e) => {
            let mut bound = e.clone();
            bound.data = substitute(&e.data, variables, missing, path)?;
            Element::Datamatrix(bound)
        }
        Element::Image(e) => {
            let mut bound = e.clone();
            bound.source.data = substitute(&e.source.data, variables, missing, path)?;
            Element::Image(bound)
        }
        Element::Line(_) => element.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn sub(input: &str, pairs: &[(&str, &str)]) -> Result<String, ZplgridError> {
        substitute(input, &vars(pairs), MissingVariables::Error, "test")
    }

    #[test]
    fn test_simple_substitution() {
        assert_eq!(sub("id: {asset}", &[("asset", "A1")]).unwrap(), "id: A1");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(sub("{{literal}}", &[]).unwrap(), "{literal}");
        assert_eq!(sub("a{{b}}c {x}", &[("x", "1")]).unwrap(), "a{b}c 1");
    }

    #[test]
    fn test_missing_variable_error_policy() {
        let err = sub("{nope}", &[]).unwrap_err();
        match err {
            ZplgridError::MissingVariable { name, path } => {
                assert_eq!(name, "nope");
                assert_eq!(path, "test");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_variable_empty_policy() {
        let out = substitute("a{nope}b", &vars(&[]), MissingVariables::Empty, "test").unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_unbalanced_open_brace() {
        let err = sub("oops {name", &[("name", "x")]).unwrap_err();
        assert_eq!(err.kind(), "format");
    }

    #[test]
    fn test_unbalanced_close_brace() {
        let err = sub("oops } here", &[]).unwrap_err();
        assert_eq!(err.kind(), "format");
    }

    #[test]
    fn test_empty_placeholder_name() {
        assert_eq!(sub("{}", &[]).unwrap_err().kind(), "format");
    }

    #[test]
    fn test_format_spec_width() {
        assert_eq!(sub("{v:5}", &[("v", "ab")]).unwrap(), "ab   ");
        assert_eq!(sub("{v:>5}", &[("v", "ab")]).unwrap(), "   ab");
        assert_eq!(sub("{v:^4}", &[("v", "ab")]).unwrap(), " ab ");
        assert_eq!(sub("{v:0>4}", &[("v", "7")]).unwrap(), "0007");
    }

    #[test]
    fn test_format_spec_no_truncation() {
        assert_eq!(sub("{v:2}", &[("v", "abcdef")]).unwrap(), "abcdef");
    }

    #[test]
    fn test_unsupported_format_spec() {
        assert_eq!(sub("{v:.3f}", &[("v", "1.5")]).unwrap_err().kind(), "format");
    }

    #[test]
    fn test_collect_placeholders() {
        let template = Template::from_json(
            r#"{
                "schema_version": 1,
                "layout": {
                    "kind": "split", "direction": "v", "ratio": 0.5,
                    "children": [
                        {"kind": "leaf", "elements": [{"type": "qr", "data": "{asset_id}"}]},
                        {"kind": "leaf",
                         "elements": [{"type": "text", "text": "{title} {_now_iso} {title}"}]}
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(collect_placeholders(&template), vec!["asset_id", "title", "_now_iso"]);
    }

    #[test]
    fn test_bind_produces_new_tree() {
        let template = Template::from_json(
            r#"{
                "schema_version": 1,
                "layout": {"kind": "leaf", "elements": [{"type": "text", "text": "{x}"}]}
            }"#,
        )
        .unwrap();
        let bound =
            bind(&template, &vars(&[("x", "bound")]), MissingVariables::Error).unwrap();
        let Node::Leaf(leaf) = &bound.layout else { panic!("expected leaf") };
        let Element::Text(text) = &leaf.elements[0] else { panic!("expected text") };
        assert_eq!(text.text, "bound");

        // Input untouched
        let Node::Leaf(original) = &template.layout else { panic!("expected leaf") };
        let Element::Text(original_text) = &original.elements[0] else { panic!("expected text") };
        assert_eq!(original_text.text, "{x}");
    }

    #[test]
    fn test_bind_reports_element_path() {
        let template = Template::from_json(
            r#"{
                "schema_version": 1,
                "layout": {
                    "kind": "split", "direction": "h", "ratio": 0.5,
                    "children": [
                        {"kind": "leaf", "elements": [{"type": "text", "text": "ok"}]},
                        {"kind": "leaf", "elements": [{"type": "text", "text": "{gone}"}]}
                    ]
                }
            }"#,
        )
        .unwrap();
        let err = bind(&template, &vars(&[]), MissingVariables::Error).unwrap_err();
        match err {
            ZplgridError::MissingVariable { path, .. } => {
                assert_eq!(path, "layout/children/1/elements/0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
