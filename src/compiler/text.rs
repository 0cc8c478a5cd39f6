//! Text element emission: wrapping, fit policies, and the shrink-to-fit
//! heuristic loop.

use crate::error::ZplgridError;
use crate::layout::Rect;
use crate::measure::TextMeasurer;
use crate::template::{AlignH, AlignV, Fit, TextElement, Wrap};
use crate::units::mm_to_dots;
use crate::zpl::{encode_field_data, ZplBuilder};

const DEFAULT_FONT_HEIGHT_MM: f64 = 4.0;
const UNLIMITED_LINES: u32 = 9999;

pub fn emit_text(
    z: &mut ZplBuilder,
    element: &TextElement,
    rect: Rect,
    measurer: &dyn TextMeasurer,
    dpi: u32,
    _path: &str,
) -> Result<(), ZplgridError> {
    // `\n` arrives as a two-character escape from JSON-authored templates.
    let mut text = element
        .text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("\\n", "\n");

    let font_h_mm = element.font_height_mm.unwrap_or(DEFAULT_FONT_HEIGHT_MM);
    let font_w_mm = element.font_width_mm.unwrap_or(font_h_mm);
    let mut font_h = mm_to_dots(font_h_mm, dpi).max(1);
    let mut font_w = mm_to_dots(font_w_mm, dpi).max(1);

    let wrap = element.wrap.unwrap_or(Wrap::Word);
    let fit = element
        .fit
        .unwrap_or(if wrap == Wrap::None { Fit::Overflow } else { Fit::Wrap });
    let max_lines = element.max_lines.unwrap_or(UNLIMITED_LINES);
    let align_h = element.align_h.unwrap_or(AlignH::Left);
    let align_v = element.align_v.unwrap_or(AlignV::Center);

    let justification = match align_h {
        AlignH::Left => 'L',
        AlignH::Center => 'C',
        AlignH::Right => 'R',
    };

    // Char wrap makes the estimate oscillate around hyphenation points;
    // shrink against word wrap instead.
    let measure_wrap = if fit == Fit::ShrinkToFit && wrap == Wrap::Char { Wrap::Word } else { wrap };

    if fit == Fit::ShrinkToFit {
        (font_h, font_w) =
            shrink_to_fit(&text, rect, font_h, font_w, measure_wrap, max_lines, measurer);
    }

    if fit == Fit::Truncate {
        let lines = measurer.wrap_lines(&text, wrap, font_w, rect.w.max(1));
        let mut kept: Vec<String> =
            lines.into_iter().take(max_lines.max(1) as usize).collect();
        if wrap == Wrap::None {
            let capacity = measurer.chars_that_fit(font_w, rect.w.max(1));
            for line in &mut kept {
                if line.chars().count() > capacity {
                    *line = line.chars().take(capacity).collect();
                }
            }
        }
        text = kept.join("\n");
    }

    let mut y = rect.y;
    if matches!(fit, Fit::Wrap | Fit::ShrinkToFit) && align_v != AlignV::Top {
        let metrics = measurer.measure(&text, measure_wrap, font_w, font_h, rect.w.max(1));
        let content_h = metrics.height_dots;
        y = match align_v {
            AlignV::Center => rect.y + ((rect.h - content_h) / 2).max(0),
            AlignV::Bottom => rect.y + (rect.h - content_h).max(0),
            AlignV::Top => rect.y,
        };
    }

    let field_text = text.replace('\n', "\\&");

    z.field_origin(rect.x, y);
    z.font(font_h, font_w);
    if fit != Fit::Overflow {
        z.field_block(rect.w.max(1), max_lines.max(1), 0, justification);
    }
    let (needs_hex, encoded) = encode_field_data(&field_text, '_');
    if needs_hex {
        z.field_hex('_');
    }
    z.field_data(&encoded);
    z.field_separator();
    Ok(())
}

/// Decrement both font dimensions by 10% (floored, never below 1 dot)
/// until the estimated text extent fits the box. Terminates at 1 dot even
/// for text that can never fit.
fn shrink_to_fit(
    text: &str,
    rect: Rect,
    mut font_h: i32,
    mut font_w: i32,
    wrap: Wrap,
    max_lines: u32,
    measurer: &dyn TextMeasurer,
) -> (i32, i32) {
    if rect.w <= 0 || rect.h <= 0 {
        return (font_h, font_w);
    }
    loop {
        let metrics = measurer.measure(text, wrap, font_w, font_h, rect.w);
        let fits = metrics.lines <= max_lines.max(1) as usize
            && metrics.height_dots <= rect.h
            && metrics.width_dots <= rect.w;
        if fits || (font_h <= 1 && font_w <= 1) {
            return (font_h, font_w);
        }
        font_h = (((font_h as f64) * 0.9).floor() as i32).max(1);
        font_w = (((font_w as f64) * 0.9).floor() as i32).max(1);
    }
}
