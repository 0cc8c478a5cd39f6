//! End-to-end compile scenarios over the public API.

use std::collections::HashMap;

use zplgrid::compiler::CompileOptions;
use zplgrid::layout::compute_layout;
use zplgrid::template::{MissingVariables, RenderTarget, Template};
use zplgrid::ZplgridError;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn target_74x26() -> RenderTarget {
    RenderTarget { width_mm: 74.0, height_mm: 26.0, dpi: 203, ..Default::default() }
}

/// QR on the left, two-line text on the right, divider in the gutter.
fn asset_label(gutter_mm: f64, divider_thickness_mm: f64) -> String {
    format!(
        r#"{{
            "schema_version": 1,
            "name": "asset-tag",
            "layout": {{
                "kind": "split",
                "direction": "v",
                "ratio": 0.35,
                "gutter_mm": {gutter_mm},
                "divider": {{"visible": true, "thickness_mm": {divider_thickness_mm}}},
                "children": [
                    {{"kind": "leaf", "padding_mm": [0, 0, 0, 0],
                      "elements": [{{"type": "qr", "data": "{{asset_id}}", "size_mode": "max"}}]}},
                    {{"kind": "leaf", "padding_mm": [0, 0, 0, 0],
                      "elements": [{{"type": "text", "text": "{{title}}\\n{{subtitle}}"}}]}}
                ]
            }}
        }}"#
    )
}

#[test]
fn qr_left_text_right_label() {
    let template = Template::from_json(&asset_label(1.0, 0.3)).unwrap();
    let variables = vars(&[("asset_id", "A1"), ("title", "Hi"), ("subtitle", "World")]);
    let zpl = template
        .compile(&target_74x26(), &variables, &CompileOptions::default())
        .unwrap();

    assert!(zpl.starts_with("^XA"));
    assert!(zpl.ends_with("^XZ\n"));
    assert!(zpl.contains("^CI28"));

    // One QR field carrying the bound data.
    assert_eq!(zpl.matches("^BQN,2,").count(), 1);
    assert!(zpl.contains("^FDMA,A1\n"));

    // One text field with the ZPL newline control between the lines.
    assert!(zpl.contains("^FDHi\\&World\n"));

    // Divider: 74mm = 591 dots, gutter 8 dots, ratio 0.35 over 583
    // available -> child0 = 204; thickness 2 dots centred -> x = 207.
    assert!(zpl.contains("^FO207,0\n^GB2,208,2,B,0\n"));
}

#[test]
fn divider_thicker_than_gutter_is_rejected() {
    let template = Template::from_json(&asset_label(0.1, 0.3));
    let err = template.unwrap_err();
    assert_eq!(err.kind(), "invariant");
    assert!(err.to_string().starts_with("layout:"));
}

#[test]
fn dot_accounting_is_exact() {
    let json = asset_label(1.0, 0.3).replace("\"ratio\": 0.35", "\"ratio\": 0.3");
    let template = Template::from_json(&json).unwrap();
    let layout = compute_layout(&template.layout, 591, 208, 203).unwrap();
    let child0 = layout.node_rects.iter().find(|(id, _)| id == "r/0").unwrap().1;
    let child1 = layout.node_rects.iter().find(|(id, _)| id == "r/1").unwrap().1;
    assert_eq!(child0.w, 174);
    assert_eq!(child1.w, 409);
    assert_eq!(child0.w + 8 + child1.w, 591);
}

#[test]
fn min_size_unmet_fails_compilation() {
    let template = Template::from_json(
        r#"{
            "schema_version": 1,
            "layout": {
                "kind": "leaf", "padding_mm": [0, 0, 0, 0],
                "elements": [{"type": "text", "text": "x", "min_size_mm": [50, 10]}]
            }
        }"#,
    )
    .unwrap();
    let target = RenderTarget { width_mm: 40.0, height_mm: 10.0, dpi: 203, ..Default::default() };
    let err = template
        .compile(&target, &HashMap::new(), &CompileOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), "layout");
}

#[test]
fn shrink_to_fit_terminates_at_one_dot() {
    let template = Template::from_json(
        r#"{
            "schema_version": 1,
            "layout": {
                "kind": "leaf", "padding_mm": [0, 0, 0, 0],
                "elements": [{
                    "type": "text",
                    "text": "this text can never fit in such a tiny label no matter what",
                    "font_height_mm": 8.0,
                    "fit": "shrink_to_fit"
                }]
            }
        }"#,
    )
    .unwrap();
    let target = RenderTarget { width_mm: 2.0, height_mm: 1.0, dpi: 203, ..Default::default() };
    let zpl = template
        .compile(&target, &HashMap::new(), &CompileOptions::default())
        .unwrap();
    assert!(zpl.contains("^A0N,1,1\n"));
    assert!(zpl.contains("^FD"));
    assert!(zpl.ends_with("^XZ\n"));
}

#[test]
fn datamatrix_max_without_dims_is_invariant_error() {
    let err = Template::from_json(
        r#"{
            "schema_version": 1,
            "layout": {
                "kind": "leaf",
                "elements": [{"type": "datamatrix", "data": "D", "size_mode": "max", "columns": 0}]
            }
        }"#,
    )
    .unwrap_err();
    assert_eq!(err.kind(), "invariant");
}

#[test]
fn ci28_toggle_leaves_fields_unchanged() {
    let with_ci28 = Template::from_json(&asset_label(1.0, 0.3)).unwrap();
    let json = asset_label(1.0, 0.3).replace(
        "\"name\": \"asset-tag\",",
        "\"name\": \"asset-tag\", \"defaults\": {\"render\": {\"emit_ci28\": false}},",
    );
    let without_ci28 = Template::from_json(&json).unwrap();

    let variables = vars(&[("asset_id", "A1"), ("title", "Hi"), ("subtitle", "World")]);
    let target = target_74x26();
    let a = with_ci28.compile(&target, &variables, &CompileOptions::default()).unwrap();
    let b = without_ci28.compile(&target, &variables, &CompileOptions::default()).unwrap();

    assert!(a.contains("^CI28\n"));
    assert!(!b.contains("^CI28"));
    assert_eq!(a.replace("^CI28\n", ""), b);
}

#[test]
fn compilation_is_idempotent_without_time_macros() {
    let template = Template::from_json(&asset_label(1.0, 0.3)).unwrap();
    let variables = vars(&[("asset_id", "A1"), ("title", "Hi"), ("subtitle", "World")]);
    let target = target_74x26();
    let first = template.compile(&target, &variables, &CompileOptions::default()).unwrap();
    let second = template.compile(&target, &variables, &CompileOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_variable_policy_error_and_empty() {
    let template = Template::from_json(&asset_label(1.0, 0.3)).unwrap();
    let variables = vars(&[("asset_id", "A1"), ("title", "Hi")]);
    let target = target_74x26();

    let err = template
        .compile(&target, &variables, &CompileOptions::default())
        .unwrap_err();
    match err {
        ZplgridError::MissingVariable { name, path } => {
            assert_eq!(name, "subtitle");
            assert_eq!(path, "layout/children/1/elements/0");
        }
        other => panic!("unexpected error: {other}"),
    }

    let options = CompileOptions {
        debug: false,
        missing_variables_override: Some(MissingVariables::Empty),
    };
    let zpl = template.compile(&target, &variables, &options).unwrap();
    assert!(zpl.contains("^FDHi\\&\n"));
}

#[test]
fn debug_flag_adds_leaf_frames() {
    let template = Template::from_json(&asset_label(1.0, 0.3)).unwrap();
    let variables = vars(&[("asset_id", "A1"), ("title", "Hi"), ("subtitle", "World")]);
    let target = target_74x26();

    let plain = template.compile(&target, &variables, &CompileOptions::default()).unwrap();
    let options = CompileOptions { debug: true, missing_variables_override: None };
    let debugged = template.compile(&target, &variables, &options).unwrap();
    assert!(debugged.matches(",1,B,0").count() >= plain.matches(",1,B,0").count() + 2);
}

#[test]
fn macro_substitution_in_data_fields() {
    let template = Template::from_json(
        r#"{
            "schema_version": 1,
            "name": "dated",
            "layout": {
                "kind": "leaf",
                "elements": [{"type": "text", "text": "{_date_yyyy_mm_dd} #{_counter_global}"}]
            }
        }"#,
    )
    .unwrap();
    let target = RenderTarget { width_mm: 50.0, height_mm: 20.0, dpi: 203, ..Default::default() };
    let zpl = template.compile(&target, &HashMap::new(), &CompileOptions::default()).unwrap();
    // Date macro resolves to an ISO date; no counter store means 0.
    let field = zpl.lines().find(|line| line.starts_with("^FD")).unwrap();
    assert!(field.contains("-"));
    assert!(field.ends_with("#0"));
}
