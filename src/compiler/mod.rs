//! # Element Compiler
//!
//! Drives the full pipeline for one compile call:
//!
//! ```text
//! Template ──► validate ──► resolve defaults ──► bind variables
//!          ──► solve layout ──► emit fields ──► ZPL program
//! ```
//!
//! The compiler is a pure transformation and holds no state across
//! invocations; it is safe to call concurrently as long as each call owns
//! its inputs. The text measurer is injectable so tests can substitute a
//! deterministic implementation.

mod code2d;
mod image;
mod text;

use std::collections::HashMap;

use crate::error::ZplgridError;
use crate::layout::{compute_layout, Rect};
use crate::measure::{GlyphAdvanceMeasurer, TextMeasurer};
use crate::template::{
    resolve_defaults, AlignH, AlignV, Element, ElementCommon, LineAlign, MissingVariables,
    Orientation, PaddingMm, RenderTarget, Template,
};
use crate::units::mm_to_dots;
use crate::vars::{bind, builtin_macros, collect_placeholders, MacroContext};
use crate::zpl::{ZplBuilder, ZplOptions};

/// Per-call compile flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Draw a one-dot frame around every leaf content rect.
    pub debug: bool,
    /// Force a missing-variable policy regardless of the template's
    /// render defaults. The HTTP render path forces `error`.
    pub missing_variables_override: Option<MissingVariables>,
}

/// Compiles templates to ZPL programs.
pub struct Compiler {
    measurer: Box<dyn TextMeasurer + Send + Sync>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self { measurer: Box::new(GlyphAdvanceMeasurer) }
    }

    /// Use a custom text measurer for the fit heuristics.
    pub fn with_measurer(measurer: Box<dyn TextMeasurer + Send + Sync>) -> Self {
        Self { measurer }
    }

    /// Compile a validated template against a render target.
    pub fn compile(
        &self,
        template: &Template,
        target: &RenderTarget,
        variables: &HashMap<String, String>,
        ctx: &MacroContext<'_>,
        options: &CompileOptions,
    ) -> Result<String, ZplgridError> {
        target.validate()?;
        template.validate()?;

        let resolved = resolve_defaults(template);
        let used = collect_placeholders(&resolved);
        let missing = options
            .missing_variables_override
            .unwrap_or(resolved.defaults.render.missing_variables);

        let mut effective = variables.clone();
        for (name, value) in builtin_macros(&used, variables, ctx) {
            effective.insert(name, value);
        }
        let bound = bind(&resolved, &effective, missing)?;

        let dpi = target.dpi;
        let width_dots = mm_to_dots(target.width_mm, dpi);
        let height_dots = mm_to_dots(target.height_mm, dpi);
        let origin_x = mm_to_dots(target.origin_x_mm, dpi);
        let origin_y = mm_to_dots(target.origin_y_mm, dpi);

        let layout = compute_layout(&bound.layout, width_dots, height_dots, dpi)?;
        let render = &bound.defaults.render;

        let mut z =
            ZplBuilder::new(ZplOptions { emit_ci28: render.emit_ci28 }, origin_x, origin_y);

        for divider in &layout.dividers {
            if divider.rect.w <= 0 || divider.rect.h <= 0 {
                continue;
            }
            z.field_origin(divider.rect.x, divider.rect.y);
            z.graphic_box(divider.rect.w, divider.rect.h, divider.thickness.max(1));
            z.field_separator();
        }

        if render.debug_gutter_guides {
            for gutter in &layout.gutters {
                emit_guide(&mut z, gutter.rect);
            }
        }

        for leaf in &layout.leaves {
            if options.debug || leaf.leaf.debug_border {
                emit_guide(&mut z, leaf.content_rect);
            }
            if render.debug_padding_guides {
                emit_guide(&mut z, leaf.content_rect);
            }

            let element = &leaf.leaf.elements[0];
            let element_path = format!("{}/elements/0", leaf.path);
            let box_rect = element_box(element.common(), leaf.content_rect, dpi, &element_path)?;

            match element {
                Element::Text(e) => {
                    text::emit_text(&mut z, e, box_rect, self.measurer.as_ref(), dpi, &element_path)?
                }
                Element::Qr(e) => code2d::emit_qr(&mut z, e, box_rect, dpi, &element_path)?,
                Element::Datamatrix(e) => {
                    code2d::emit_datamatrix(&mut z, e, box_rect, dpi, &element_path)?
                }
                Element::Line(e) => emit_line(&mut z, e, box_rect, dpi),
                Element::Image(e) => image::emit_image(&mut z, e, box_rect, dpi, &element_path)?,
            }
        }

        Ok(z.finish())
    }
}

/// One-dot debug frame.
fn emit_guide(z: &mut ZplBuilder, rect: Rect) {
    z.field_origin(rect.x, rect.y);
    z.graphic_box(rect.w.max(1), rect.h.max(1), 1);
    z.field_separator();
}

/// Element padding inset, then min-size enforcement, then max-size
/// shrink centred inside the pre-shrink rect.
fn element_box(
    common: &ElementCommon,
    rect: Rect,
    dpi: u32,
    path: &str,
) -> Result<Rect, ZplgridError> {
    let padding = common.padding_mm.unwrap_or(PaddingMm::ZERO);
    let mut boxed = rect.inset(
        mm_to_dots(padding.left, dpi),
        mm_to_dots(padding.top, dpi),
        mm_to_dots(padding.right, dpi),
        mm_to_dots(padding.bottom, dpi),
    );

    if let Some(min) = common.min_size_mm {
        let min_w = mm_to_dots(min.w, dpi);
        let min_h = mm_to_dots(min.h, dpi);
        if boxed.w < min_w || boxed.h < min_h {
            return Err(ZplgridError::layout(
                path,
                format!(
                    "element box {}x{} dots is below min_size_mm {}x{} dots",
                    boxed.w, boxed.h, min_w, min_h
                ),
            ));
        }
    }

    if let Some(max) = common.max_size_mm {
        let target_w = boxed.w.min(mm_to_dots(max.w, dpi));
        let target_h = boxed.h.min(mm_to_dots(max.h, dpi));
        boxed = Rect {
            x: boxed.x + (boxed.w - target_w) / 2,
            y: boxed.y + (boxed.h - target_h) / 2,
            w: target_w,
            h: target_h,
        };
    }

    Ok(boxed)
}

/// Top-left position of a `size_w` × `size_h` box aligned inside `rect`.
fn align_in_rect(
    rect: Rect,
    size_w: i32,
    size_h: i32,
    align_h: AlignH,
    align_v: AlignV,
) -> (i32, i32) {
    let x = match align_h {
        AlignH::Left => rect.x,
        AlignH::Center => rect.x + ((rect.w - size_w) / 2).max(0),
        AlignH::Right => rect.x + (rect.w - size_w).max(0),
    };
    let y = match align_v {
        AlignV::Top => rect.y,
        AlignV::Center => rect.y + ((rect.h - size_h) / 2).max(0),
        AlignV::Bottom => rect.y + (rect.h - size_h).max(0),
    };
    (x, y)
}

fn emit_line(z: &mut ZplBuilder, element: &crate::template::LineElement, rect: Rect, dpi: u32) {
    let thickness = mm_to_dots(element.thickness_mm, dpi).max(1);
    match element.orientation {
        Orientation::Horizontal => {
            let y = match element.align {
                LineAlign::Start => rect.y,
                LineAlign::Center => rect.y + ((rect.h - thickness) / 2).max(0),
                LineAlign::End => rect.y + (rect.h - thickness).max(0),
            };
            z.field_origin(rect.x, y);
            z.graphic_box(rect.w.max(1), thickness, thickness);
        }
        Orientation::Vertical => {
            let x = match element.align {
                LineAlign::Start => rect.x,
                LineAlign::Center => rect.x + ((rect.w - thickness) / 2).max(0),
                LineAlign::End => rect.x + (rect.w - thickness).max(0),
            };
            z.field_origin(x, rect.y);
            z.graphic_box(thickness, rect.h.max(1), thickness);
        }
    }
    z.field_separator();
}
