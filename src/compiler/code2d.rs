//! QR and DataMatrix emission.
//!
//! ZPL chooses the QR version from the data at print time, so sizing a
//! symbol ahead of print needs the QR version/module relationship: pick
//! the minimum version whose codeword capacity holds the data at the
//! requested error correction, then `modules = 17 + 4 × version`. The
//! capacity table is the standard 40-version codeword count per ECC
//! level.

use crate::compiler::align_in_rect;
use crate::error::ZplgridError;
use crate::layout::Rect;
use crate::template::{
    AlignH, AlignV, CharacterMode, DataMatrixElement, ErrorCorrection, InputMode, QrElement,
    RenderMode, SizeMode,
};
use crate::units::mm_to_dots;
use crate::zpl::{encode_field_data, ZplBuilder};

/// Data codeword capacity for QR versions 1..=40 at ECC L, M, Q, H.
const QR_CAPACITY_CODEWORDS: [[u16; 4]; 40] = [
    [19, 16, 13, 9],
    [34, 28, 22, 16],
    [55, 44, 34, 26],
    [80, 64, 48, 36],
    [108, 86, 62, 46],
    [136, 108, 76, 60],
    [156, 124, 88, 66],
    [194, 154, 110, 86],
    [232, 182, 132, 100],
    [274, 216, 154, 122],
    [324, 254, 180, 140],
    [370, 290, 206, 158],
    [428, 334, 244, 180],
    [461, 365, 261, 197],
    [523, 415, 295, 223],
    [589, 453, 325, 253],
    [647, 507, 367, 283],
    [721, 563, 397, 313],
    [795, 627, 445, 341],
    [861, 669, 485, 385],
    [932, 714, 512, 406],
    [1006, 782, 568, 442],
    [1094, 860, 614, 464],
    [1174, 914, 664, 514],
    [1276, 1000, 718, 538],
    [1370, 1062, 754, 596],
    [1468, 1128, 808, 628],
    [1531, 1193, 871, 661],
    [1631, 1267, 911, 701],
    [1735, 1373, 985, 745],
    [1843, 1455, 1033, 793],
    [1955, 1541, 1115, 845],
    [2071, 1631, 1171, 901],
    [2191, 1725, 1231, 961],
    [2306, 1812, 1286, 986],
    [2434, 1914, 1354, 1054],
    [2566, 1992, 1426, 1096],
    [2702, 2102, 1502, 1142],
    [2812, 2216, 1582, 1222],
    [2956, 2334, 1666, 1276],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QrDataMode {
    Numeric,
    Alphanumeric,
    Byte,
}

const QR_ALPHANUMERIC_SET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

fn qr_data_mode(data: &str) -> QrDataMode {
    if !data.is_empty() && data.bytes().all(|b| b.is_ascii_digit()) {
        QrDataMode::Numeric
    } else if data.chars().all(|c| QR_ALPHANUMERIC_SET.contains(c)) {
        QrDataMode::Alphanumeric
    } else {
        QrDataMode::Byte
    }
}

fn qr_length_bits(mode: QrDataMode, version: u32) -> u32 {
    match mode {
        QrDataMode::Numeric => {
            if version < 10 {
                10
            } else if version < 27 {
                12
            } else {
                14
            }
        }
        QrDataMode::Alphanumeric => {
            if version < 10 {
                9
            } else if version < 27 {
                11
            } else {
                13
            }
        }
        QrDataMode::Byte => {
            if version < 10 {
                8
            } else {
                16
            }
        }
    }
}

fn qr_data_bits(mode: QrDataMode, length: u32) -> u32 {
    match mode {
        QrDataMode::Numeric => {
            let rem_bits = match length % 3 {
                1 => 4,
                2 => 7,
                _ => 0,
            };
            (length / 3) * 10 + rem_bits
        }
        QrDataMode::Alphanumeric => (length / 2) * 11 + if length % 2 == 1 { 6 } else { 0 },
        QrDataMode::Byte => length * 8,
    }
}

fn ecc_index(ecc: ErrorCorrection) -> usize {
    match ecc {
        ErrorCorrection::L => 0,
        ErrorCorrection::M => 1,
        ErrorCorrection::Q => 2,
        ErrorCorrection::H => 3,
    }
}

/// Modules per side of the smallest QR version that holds `data`.
pub(crate) fn qr_modules_for_data(
    data: &str,
    ecc: ErrorCorrection,
    path: &str,
) -> Result<i32, ZplgridError> {
    let mode = qr_data_mode(data);
    let length = match mode {
        QrDataMode::Byte => data.len() as u32,
        _ => data.chars().count() as u32,
    };
    for version in 1..=40u32 {
        let capacity_bits =
            u32::from(QR_CAPACITY_CODEWORDS[(version - 1) as usize][ecc_index(ecc)]) * 8;
        let required = 4 + qr_length_bits(mode, version) + qr_data_bits(mode, length);
        if required <= capacity_bits {
            return Ok((17 + 4 * version) as i32);
        }
    }
    Err(ZplgridError::layout(path, format!("QR data too large ({} bytes)", data.len())))
}

/// Default magnification by print density.
fn default_qr_magnification(dpi: u32) -> u8 {
    if dpi <= 203 {
        3
    } else if dpi <= 300 {
        4
    } else {
        6
    }
}

fn ecc_letter(ecc: ErrorCorrection) -> char {
    match ecc {
        ErrorCorrection::L => 'L',
        ErrorCorrection::M => 'M',
        ErrorCorrection::Q => 'Q',
        ErrorCorrection::H => 'H',
    }
}

pub fn emit_qr(
    z: &mut ZplBuilder,
    element: &QrElement,
    rect: Rect,
    dpi: u32,
    path: &str,
) -> Result<(), ZplgridError> {
    if element.render_mode == Some(RenderMode::Image) {
        return Err(ZplgridError::unsupported(path, "qr render_mode \"image\" is not supported"));
    }
    if element.input_mode == InputMode::M && element.character_mode.is_none() {
        return Err(ZplgridError::invariant(
            path,
            "character_mode is required when input_mode is \"M\"",
        ));
    }

    let quiet = element.quiet_zone_mm.map(|mm| mm_to_dots(mm, dpi)).unwrap_or(0);
    let inner = rect.inset(quiet, quiet, quiet, quiet);
    let size_mode = element.size_mode.unwrap_or(SizeMode::Fixed);
    let align_h = element.align_h.unwrap_or(AlignH::Center);
    let align_v = element.align_v.unwrap_or(AlignV::Center);
    let ecc = element.error_correction;

    let modules = qr_modules_for_data(&element.data, ecc, path)?;
    let magnification = match size_mode {
        SizeMode::Fixed => element.magnification.unwrap_or_else(|| default_qr_magnification(dpi)),
        SizeMode::Max => {
            let inner_size = inner.w.min(inner.h).max(1);
            (1..=10u8).rev().find(|m| modules * i32::from(*m) <= inner_size).unwrap_or(1)
        }
    };

    let size = (modules * i32::from(magnification)).max(1);
    let (x, y) = align_in_rect(inner, size, size, align_h, align_v);

    let field_data = match element.input_mode {
        InputMode::A => format!("{}A,{}", ecc_letter(ecc), element.data),
        InputMode::M => {
            let cm = match element.character_mode.unwrap_or(CharacterMode::A) {
                CharacterMode::N => 'N',
                CharacterMode::A => 'A',
            };
            format!("{}M,{}{}", ecc_letter(ecc), cm, element.data)
        }
    };

    let (needs_hex, encoded) = encode_field_data(&field_data, '_');
    z.field_origin(x.max(0), y.max(0));
    z.qr_code(2, magnification);
    if needs_hex {
        z.field_hex('_');
    }
    z.field_data(&encoded);
    z.field_separator();
    Ok(())
}

pub fn emit_datamatrix(
    z: &mut ZplBuilder,
    element: &DataMatrixElement,
    rect: Rect,
    dpi: u32,
    path: &str,
) -> Result<(), ZplgridError> {
    if element.render_mode == Some(RenderMode::Image) {
        return Err(ZplgridError::unsupported(
            path,
            "datamatrix render_mode \"image\" is not supported",
        ));
    }
    if element.quality != 200 {
        return Err(ZplgridError::invariant(path, "quality must be 200 (ECC200)"));
    }

    let quiet = element.quiet_zone_mm.map(|mm| mm_to_dots(mm, dpi)).unwrap_or(0);
    let inner = rect.inset(quiet, quiet, quiet, quiet);
    let size_mode = element.size_mode.unwrap_or(SizeMode::Fixed);
    let align_h = element.align_h.unwrap_or(AlignH::Center);
    let align_v = element.align_v.unwrap_or(AlignV::Center);

    let module = match size_mode {
        SizeMode::Max => {
            if element.columns == 0 || element.rows == 0 {
                return Err(ZplgridError::invariant(
                    path,
                    "size_mode \"max\" requires explicit columns and rows",
                ));
            }
            (inner.w / element.columns as i32).min(inner.h / element.rows as i32).max(1)
        }
        SizeMode::Fixed => mm_to_dots(element.module_size_mm.unwrap_or(0.5), dpi).max(1),
    };

    let (size_w, size_h) = if element.columns > 0 && element.rows > 0 {
        (
            (element.columns as i32 * module).max(1),
            (element.rows as i32 * module).max(1),
        )
    } else {
        let square = inner.w.min(inner.h).max(1);
        (square, square)
    };

    let (x, y) = align_in_rect(inner, size_w, size_h, align_h, align_v);

    let (needs_hex, encoded) = encode_field_data(&element.data, element.escape_char);
    z.field_origin(x.max(0), y.max(0));
    z.datamatrix(
        module,
        element.quality,
        element.columns,
        element.rows,
        element.format_id,
        element.escape_char,
    );
    if needs_hex {
        z.field_hex(element.escape_char);
    }
    z.field_data(&encoded);
    z.field_separator();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zpl::ZplOptions;

    fn builder() -> ZplBuilder {
        ZplBuilder::new(ZplOptions { emit_ci28: false }, 0, 0)
    }

    #[test]
    fn test_qr_version_selection() {
        // Version 1 at M holds 16 codewords; short alphanumeric data fits.
        assert_eq!(qr_modules_for_data("A1", ErrorCorrection::M, "p").unwrap(), 21);
        // Longer data forces a higher version and more modules.
        let long = "X".repeat(200);
        assert!(qr_modules_for_data(&long, ErrorCorrection::M, "p").unwrap() > 21);
        // Higher ECC needs a higher version for the same data.
        let mid = "X".repeat(40);
        let low = qr_modules_for_data(&mid, ErrorCorrection::L, "p").unwrap();
        let high = qr_modules_for_data(&mid, ErrorCorrection::H, "p").unwrap();
        assert!(high >= low);
    }

    #[test]
    fn test_qr_mode_detection() {
        assert_eq!(qr_data_mode("123456"), QrDataMode::Numeric);
        assert_eq!(qr_data_mode("ABC 123"), QrDataMode::Alphanumeric);
        assert_eq!(qr_data_mode("hello"), QrDataMode::Byte);
        assert_eq!(qr_data_mode(""), QrDataMode::Alphanumeric);
    }

    #[test]
    fn test_qr_fixed_uses_dpi_default() {
        let element = QrElement { data: "A1".into(), ..Default::default() };
        let mut z = builder();
        emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 200, h: 200 }, 203, "p").unwrap();
        let zpl = z.finish();
        assert!(zpl.contains("^BQN,2,3\n"));
        assert!(zpl.contains("^FDMA,A1\n"));
    }

    #[test]
    fn test_qr_max_picks_largest_fitting_magnification() {
        let element = QrElement {
            data: "A1".into(),
            size_mode: Some(SizeMode::Max),
            ..Default::default()
        };
        // 21 modules; 140-dot box → magnification 6 (126 ≤ 140 < 147).
        let mut z = builder();
        emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 140, h: 140 }, 203, "p").unwrap();
        assert!(z.finish().contains("^BQN,2,6\n"));
    }

    #[test]
    fn test_qr_max_clamps_to_one_when_nothing_fits() {
        let element = QrElement {
            data: "A1".into(),
            size_mode: Some(SizeMode::Max),
            ..Default::default()
        };
        let mut z = builder();
        emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 10, h: 10 }, 203, "p").unwrap();
        assert!(z.finish().contains("^BQN,2,1\n"));
    }

    #[test]
    fn test_qr_manual_input_mode_prefix() {
        let element = QrElement {
            data: "12345".into(),
            input_mode: InputMode::M,
            character_mode: Some(CharacterMode::N),
            error_correction: ErrorCorrection::Q,
            ..Default::default()
        };
        let mut z = builder();
        emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 200, h: 200 }, 203, "p").unwrap();
        assert!(z.finish().contains("^FDQM,N12345\n"));
    }

    #[test]
    fn test_qr_manual_without_character_mode_fails() {
        let element = QrElement {
            data: "X".into(),
            input_mode: InputMode::M,
            ..Default::default()
        };
        let mut z = builder();
        let err =
            emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 100 }, 203, "p").unwrap_err();
        assert_eq!(err.kind(), "invariant");
    }

    #[test]
    fn test_qr_image_render_mode_unsupported() {
        let element = QrElement {
            data: "X".into(),
            render_mode: Some(RenderMode::Image),
            ..Default::default()
        };
        let mut z = builder();
        let err =
            emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 100 }, 203, "p").unwrap_err();
        assert_eq!(err.kind(), "unsupported");
    }

    #[test]
    fn test_datamatrix_fixed_auto_size() {
        let element = DataMatrixElement { data: "D123".into(), ..Default::default() };
        let mut z = builder();
        emit_datamatrix(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 100 }, 203, "p").unwrap();
        // 0.5mm at 203dpi = 4 dots; columns/rows stay 0 for printer auto.
        assert!(z.finish().contains("^BXN,4,200,0,0,6,_\n"));
    }

    #[test]
    fn test_datamatrix_max_computes_module() {
        let element = DataMatrixElement {
            data: "D".into(),
            size_mode: Some(SizeMode::Max),
            columns: 12,
            rows: 12,
            ..Default::default()
        };
        let mut z = builder();
        emit_datamatrix(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 80 }, 203, "p").unwrap();
        // min(100/12, 80/12) = 6 dots per module.
        assert!(z.finish().contains("^BXN,6,200,12,12,6,_\n"));
    }

    #[test]
    fn test_datamatrix_max_without_dims_fails() {
        let element = DataMatrixElement {
            data: "D".into(),
            size_mode: Some(SizeMode::Max),
            columns: 0,
            rows: 10,
            ..Default::default()
        };
        let mut z = builder();
        let err = emit_datamatrix(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 100 }, 203, "p")
            .unwrap_err();
        assert_eq!(err.kind(), "invariant");
    }

    #[test]
    fn test_datamatrix_escape_char_drives_encoding() {
        let element = DataMatrixElement {
            data: "A_B".into(),
            escape_char: '!',
            ..Default::default()
        };
        let mut z = builder();
        emit_datamatrix(&mut z, &element, Rect { x: 0, y: 0, w: 100, h: 100 }, 203, "p").unwrap();
        let zpl = z.finish();
        // '_' is plain data under a '!' indicator; the command carries '!'.
        assert!(zpl.contains("^BXN,4,200,0,0,6,!\n"));
        assert!(zpl.contains("^FDA_B\n"));
        assert!(!zpl.contains("^FH"));
    }

    #[test]
    fn test_quiet_zone_insets_symbol() {
        let element = QrElement {
            data: "A1".into(),
            quiet_zone_mm: Some(1.0), // 8 dots
            magnification: Some(2),
            align_h: Some(AlignH::Left),
            align_v: Some(AlignV::Top),
            ..Default::default()
        };
        let mut z = builder();
        emit_qr(&mut z, &element, Rect { x: 0, y: 0, w: 200, h: 200 }, 203, "p").unwrap();
        assert!(z.finish().contains("^FO8,8\n"));
    }
}
