//! Element struct types and shared enums for the template model.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! both Rust API construction and JSON deserialization. Discriminated
//! fields use `#[serde(tag = ...)]` in the parent enums (see `mod.rs`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-side padding in millimetres: `[top, right, bottom, left]` in JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddingMm {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PaddingMm {
    pub const ZERO: PaddingMm = PaddingMm { top: 0.0, right: 0.0, bottom: 0.0, left: 0.0 };

    pub fn uniform(mm: f64) -> Self {
        Self { top: mm, right: mm, bottom: mm, left: mm }
    }
}

impl Serialize for PaddingMm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.top, self.right, self.bottom, self.left].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PaddingMm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = <[f64; 4]>::deserialize(deserializer)?;
        Ok(Self { top: values[0], right: values[1], bottom: values[2], left: values[3] })
    }
}

/// A `[width_mm, height_mm]` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeMm {
    pub w: f64,
    pub h: f64,
}

impl Serialize for SizeMm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.w, self.h].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SizeMm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Self { w: values[0], h: values[1] })
    }
}

/// Split direction: `v` divides the width, `h` divides the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

/// Text wrapping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    None,
    #[default]
    Word,
    Char,
}

/// How text behaves when it exceeds its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    Overflow,
    Wrap,
    ShrinkToFit,
    Truncate,
}

/// Horizontal alignment inside an element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignH {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment inside an element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignV {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Line orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "h")]
    Horizontal,
    #[serde(rename = "v")]
    Vertical,
}

/// Line placement on the axis perpendicular to its orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAlign {
    Start,
    #[default]
    Center,
    End,
}

/// 2D symbol sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    #[default]
    Fixed,
    Max,
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

/// QR input mode: `A` (automatic) or `M` (manual).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    A,
    M,
}

/// QR character mode, required when `input_mode` is `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterMode {
    N,
    A,
}

/// How 2D symbols are rendered. v1 only supports native ZPL commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Zpl,
    Image,
}

/// Policy for placeholders with no value in the variable map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingVariables {
    #[default]
    Error,
    Empty,
}

/// Image scaling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    None,
    #[default]
    Contain,
    Cover,
    Stretch,
}

/// Binarisation strategy for image elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dither {
    #[default]
    None,
    FloydSteinberg,
    Bayer,
}

/// Image payload source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSourceKind {
    #[default]
    Base64,
}

/// Fields shared by every element variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementCommon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_mm: Option<PaddingMm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size_mm: Option<SizeMm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mm: Option<SizeMm>,
    /// Opaque extension data, preserved but ignored by the compiler.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

/// Text element. Placeholder substitution applies to `text`; the
/// two-character escape `\n` maps to the ZPL newline control.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub text: String,
    /// Font cap height in millimetres. Falls back to 4.0mm when neither
    /// the element nor the text defaults provide one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_height_mm: Option<f64>,
    /// Font width in millimetres; defaults to the height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_width_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<Wrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<Fit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
}

/// QR code element. Model is fixed to 2.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub data: String,
    /// Module magnification in [1, 10]; absent means a DPI-based default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnification: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mode: Option<SizeMode>,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_mode: Option<CharacterMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_zone_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
}

fn default_quality() -> u32 {
    200
}

fn default_format_id() -> u8 {
    6
}

fn default_escape_char() -> char {
    '_'
}

/// DataMatrix element, ECC200 only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataMatrixElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub data: String,
    /// Module edge length in millimetres (default 0.5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_size_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mode: Option<SizeMode>,
    /// Symbol columns, 0 = printer auto-size.
    #[serde(default)]
    pub columns: u32,
    /// Symbol rows, 0 = printer auto-size.
    #[serde(default)]
    pub rows: u32,
    /// Quality level; only 200 (ECC200) is supported.
    #[serde(default = "default_quality")]
    pub quality: u32,
    #[serde(default = "default_format_id")]
    pub format_id: u8,
    #[serde(default = "default_escape_char")]
    pub escape_char: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_zone_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
}

impl Default for DataMatrixElement {
    fn default() -> Self {
        Self {
            common: ElementCommon::default(),
            data: String::new(),
            module_size_mm: None,
            size_mode: None,
            columns: 0,
            rows: 0,
            quality: default_quality(),
            format_id: default_format_id(),
            escape_char: default_escape_char(),
            quiet_zone_mm: None,
            align_h: None,
            align_v: None,
            render_mode: None,
        }
    }
}

/// Straight rule spanning its box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    #[serde(default)]
    pub orientation: Orientation,
    pub thickness_mm: f64,
    #[serde(default)]
    pub align: LineAlign,
}

/// Image payload reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(default)]
    pub kind: ImageSourceKind,
    /// Base64 payload, optionally carrying a `data:` URI prefix.
    /// Placeholder substitution applies.
    pub data: String,
}

/// Raster image element, emitted as a graphic field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub source: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<ImageFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    /// Source DPI for `fit: none` scaling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dpi: Option<u32>,
    /// Binarisation threshold in [0, 255] (default 128).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dither: Option<Dither>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
}

/// Optional divider line centred inside a split's gutter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DividerSpec {
    #[serde(default)]
    pub visible: bool,
    #[serde(default = "default_divider_thickness")]
    pub thickness_mm: f64,
}

fn default_divider_thickness() -> f64 {
    0.3
}

impl Default for DividerSpec {
    fn default() -> Self {
        Self { visible: false, thickness_mm: default_divider_thickness() }
    }
}

/// Partial text settings merged into every text element (element wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_height_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_width_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<Wrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<Fit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
}

/// Partial settings merged into qr and datamatrix elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Code2dDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_zone_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mode: Option<SizeMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
}

/// Partial settings merged into image elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<ImageFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dither: Option<Dither>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Render-stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDefaults {
    #[serde(default)]
    pub missing_variables: MissingVariables,
    #[serde(default = "default_true")]
    pub emit_ci28: bool,
    #[serde(default)]
    pub debug_padding_guides: bool,
    #[serde(default)]
    pub debug_gutter_guides: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            missing_variables: MissingVariables::Error,
            emit_ci28: true,
            debug_padding_guides: false,
            debug_gutter_guides: false,
        }
    }
}

fn default_leaf_padding() -> PaddingMm {
    PaddingMm::uniform(1.0)
}

/// Top-level `defaults` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Padding inherited by leaves that do not set their own.
    #[serde(default = "default_leaf_padding")]
    pub leaf_padding_mm: PaddingMm,
    #[serde(default)]
    pub text: TextDefaults,
    #[serde(default)]
    pub code2d: Code2dDefaults,
    #[serde(default)]
    pub image: ImageDefaults,
    #[serde(default)]
    pub render: RenderDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            leaf_padding_mm: default_leaf_padding(),
            text: TextDefaults::default(),
            code2d: Code2dDefaults::default(),
            image: ImageDefaults::default(),
            render: RenderDefaults::default(),
        }
    }
}
