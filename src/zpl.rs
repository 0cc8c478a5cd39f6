//! # ZPL II Program Builder
//!
//! Line-oriented builder for the small ZPL II command set the compiler
//! emits: start/end of format, the UTF-8 encoding directive, field origin,
//! field block, scalable font, graphic box, graphic field, QR code,
//! DataMatrix, and field separator.
//!
//! All coordinates handed to [`ZplBuilder::field_origin`] are relative to
//! the label; the builder adds the render target's origin offset so the
//! emitted program is self-contained absolute geometry.

/// Options controlling program assembly.
#[derive(Debug, Clone, Copy)]
pub struct ZplOptions {
    /// Emit `^CI28` before the first field to enable UTF-8 field data.
    pub emit_ci28: bool,
}

impl Default for ZplOptions {
    fn default() -> Self {
        Self { emit_ci28: true }
    }
}

/// Accumulates ZPL commands and renders the final program string.
#[derive(Debug)]
pub struct ZplBuilder {
    lines: Vec<String>,
    origin_x: i32,
    origin_y: i32,
}

impl ZplBuilder {
    /// Start a new label program. Pushes `^XA` and, when enabled, `^CI28`.
    pub fn new(options: ZplOptions, origin_x: i32, origin_y: i32) -> Self {
        let mut lines = vec!["^XA".to_string()];
        if options.emit_ci28 {
            lines.push("^CI28".to_string());
        }
        Self { lines, origin_x, origin_y }
    }

    /// `^FO` — field origin at the given label coordinates plus the
    /// render target origin.
    pub fn field_origin(&mut self, x: i32, y: i32) {
        self.lines.push(format!("^FO{},{}", self.origin_x + x, self.origin_y + y));
    }

    /// `^A0N` — scalable font 0, normal orientation.
    pub fn font(&mut self, height: i32, width: i32) {
        self.lines.push(format!("^A0N,{},{}", height, width));
    }

    /// `^FB` — field block (wrapping container).
    pub fn field_block(&mut self, width: i32, max_lines: u32, line_spacing: i32, justification: char) {
        self.lines.push(format!(
            "^FB{},{},{},{},0",
            width, max_lines, line_spacing, justification
        ));
    }

    /// `^FH` — hexadecimal escape indicator for the next field data.
    pub fn field_hex(&mut self, indicator: char) {
        if indicator == '_' {
            self.lines.push("^FH".to_string());
        } else {
            self.lines.push(format!("^FH{}", indicator));
        }
    }

    /// `^FD` — field data.
    pub fn field_data(&mut self, data: &str) {
        self.lines.push(format!("^FD{}", data));
    }

    /// `^FS` — field separator.
    pub fn field_separator(&mut self) {
        self.lines.push("^FS".to_string());
    }

    /// `^BQ` — QR code, normal orientation.
    pub fn qr_code(&mut self, model: u8, magnification: u8) {
        self.lines.push(format!("^BQN,{},{}", model, magnification));
    }

    /// `^BX` — DataMatrix, normal orientation. Columns/rows of zero let
    /// the printer auto-size the symbol.
    pub fn datamatrix(&mut self, module_size: i32, quality: u32, columns: u32, rows: u32, format_id: u8, escape_char: char) {
        self.lines.push(format!(
            "^BXN,{},{},{},{},{},{}",
            module_size, quality, columns, rows, format_id, escape_char
        ));
    }

    /// `^GB` — graphic box, black, square corners.
    pub fn graphic_box(&mut self, width: i32, height: i32, thickness: i32) {
        self.lines.push(format!("^GB{},{},{},B,0", width, height, thickness));
    }

    /// `^GF` — graphic field, ASCII-hex data.
    pub fn graphic_field(&mut self, total_bytes: usize, bytes_per_row: usize, data: &str) {
        self.lines.push(format!("^GFA,{},{},{},{}", total_bytes, total_bytes, bytes_per_row, data));
    }

    /// Close the label with `^XZ` and render the program.
    pub fn finish(mut self) -> String {
        self.lines.push("^XZ".to_string());
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Encode field data for `^FD`, hex-escaping every byte that is not safe
/// printable ASCII (and the caret/tilde command prefixes). Returns whether
/// a `^FH` directive is required along with the encoded string.
pub fn encode_field_data(text: &str, hex_indicator: char) -> (bool, String) {
    let mut needs_hex = false;
    let mut out = String::with_capacity(text.len());

    for b in text.bytes() {
        let is_safe = (0x20..0x7F).contains(&b) && b != 0x5E && b != 0x7E;
        if is_safe && b as char != hex_indicator {
            out.push(b as char);
        } else {
            needs_hex = true;
            out.push(hex_indicator);
            out.push_str(&format!("{:02X}", b));
        }
    }

    (needs_hex, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_program() {
        let z = ZplBuilder::new(ZplOptions { emit_ci28: false }, 0, 0);
        assert_eq!(z.finish(), "^XA\n^XZ\n");
    }

    #[test]
    fn test_ci28_directive() {
        let z = ZplBuilder::new(ZplOptions::default(), 0, 0);
        let program = z.finish();
        assert!(program.starts_with("^XA\n^CI28\n"));
    }

    #[test]
    fn test_field_origin_adds_target_origin() {
        let mut z = ZplBuilder::new(ZplOptions { emit_ci28: false }, 16, 8);
        z.field_origin(10, 20);
        let program = z.finish();
        assert!(program.contains("^FO26,28\n"));
    }

    #[test]
    fn test_field_block_format() {
        let mut z = ZplBuilder::new(ZplOptions { emit_ci28: false }, 0, 0);
        z.field_block(200, 3, 0, 'C');
        assert!(z.finish().contains("^FB200,3,0,C,0\n"));
    }

    #[test]
    fn test_encode_plain_ascii() {
        let (needs_hex, encoded) = encode_field_data("Hello A1", '_');
        assert!(!needs_hex);
        assert_eq!(encoded, "Hello A1");
    }

    #[test]
    fn test_encode_caret_and_tilde() {
        let (needs_hex, encoded) = encode_field_data("a^b~c", '_');
        assert!(needs_hex);
        assert_eq!(encoded, "a_5Eb_7Ec");
    }

    #[test]
    fn test_encode_utf8_multibyte() {
        // 'é' = 0xC3 0xA9 in UTF-8
        let (needs_hex, encoded) = encode_field_data("é", '_');
        assert!(needs_hex);
        assert_eq!(encoded, "_C3_A9");
    }

    #[test]
    fn test_encode_escapes_the_indicator_itself() {
        let (needs_hex, encoded) = encode_field_data("a_b", '_');
        assert!(needs_hex);
        assert_eq!(encoded, "a_5Fb");
    }

    #[test]
    fn test_encode_custom_indicator() {
        let (needs_hex, encoded) = encode_field_data("x!y", '!');
        assert!(needs_hex);
        assert_eq!(encoded, "x!21y");
    }
}
