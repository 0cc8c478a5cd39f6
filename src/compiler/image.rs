//! Image element emission.
//!
//! Decodes a base64 payload, scales it into the element box, binarises it
//! (fixed threshold, ordered Bayer dithering, or Floyd-Steinberg error
//! diffusion), and emits the bitmap as an ASCII-hex graphic field.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

use crate::compiler::align_in_rect;
use crate::error::ZplgridError;
use crate::layout::Rect;
use crate::template::{AlignH, AlignV, Dither, ImageElement, ImageFit};
use crate::zpl::ZplBuilder;

/// Bayer 8x8 ordered-dithering matrix, values 0-63.
const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

pub fn emit_image(
    z: &mut ZplBuilder,
    element: &ImageElement,
    rect: Rect,
    dpi: u32,
    path: &str,
) -> Result<(), ZplgridError> {
    if rect.w <= 0 || rect.h <= 0 {
        return Ok(());
    }

    let bytes = decode_base64(&element.source.data, path)?;
    if bytes.is_empty() {
        return Err(ZplgridError::schema(path, "image source data is empty"));
    }
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ZplgridError::schema(path, format!("failed to decode image: {}", e)))?;
    let gray = flatten_to_gray(&decoded);

    let fit = element.fit.unwrap_or(ImageFit::Contain);
    let align_h = element.align_h.unwrap_or(AlignH::Center);
    let align_v = element.align_v.unwrap_or(AlignV::Center);
    let threshold = element.threshold.unwrap_or(128);
    let dither = element.dither.unwrap_or(Dither::None);
    let invert = element.invert.unwrap_or(false);

    let sized = scale_to_rect(gray, rect, fit, element.input_dpi, dpi);
    let (width, height) = sized.dimensions();
    if width == 0 || height == 0 {
        return Ok(());
    }

    let (x, y) = if fit == ImageFit::Cover {
        (rect.x, rect.y)
    } else {
        align_in_rect(rect, width as i32, height as i32, align_h, align_v)
    };

    let flags = binarize(&sized, threshold, dither, invert);
    let (hex, bytes_per_row, total_bytes) = pack_graphic_field(&flags, width, height);

    z.field_origin(x, y);
    z.graphic_field(total_bytes, bytes_per_row, &hex);
    z.field_separator();
    Ok(())
}

fn decode_base64(data: &str, path: &str) -> Result<Vec<u8>, ZplgridError> {
    let payload = data.trim();
    let payload = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, body)| body).unwrap_or(rest),
        None => payload,
    };
    BASE64
        .decode(payload)
        .map_err(|e| ZplgridError::schema(path, format!("failed to decode base64 image data: {}", e)))
}

/// Alpha-composite onto white and convert to 8-bit grayscale.
fn flatten_to_gray(img: &image::DynamicImage) -> GrayImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let over = |c: u8| c as f32 * alpha + 255.0 * (1.0 - alpha);
        let luma = 0.299 * over(r) + 0.587 * over(g) + 0.114 * over(b);
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    gray
}

fn scale_to_rect(
    gray: GrayImage,
    rect: Rect,
    fit: ImageFit,
    input_dpi: Option<u32>,
    target_dpi: u32,
) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray;
    }
    let rect_w = rect.w.max(1) as u32;
    let rect_h = rect.h.max(1) as u32;

    match fit {
        ImageFit::None => match input_dpi {
            Some(input_dpi) if input_dpi != target_dpi => {
                let scale = target_dpi as f64 / input_dpi as f64;
                let target_w = ((w as f64 * scale).round() as u32).max(1);
                let target_h = ((h as f64 * scale).round() as u32).max(1);
                imageops::resize(&gray, target_w, target_h, FilterType::Lanczos3)
            }
            _ => gray,
        },
        ImageFit::Stretch => {
            if (w, h) == (rect_w, rect_h) {
                gray
            } else {
                imageops::resize(&gray, rect_w, rect_h, FilterType::Lanczos3)
            }
        }
        ImageFit::Contain | ImageFit::Cover => {
            let sx = rect_w as f64 / w as f64;
            let sy = rect_h as f64 / h as f64;
            let scale = if fit == ImageFit::Contain { sx.min(sy) } else { sx.max(sy) };
            let target_w = ((w as f64 * scale).round() as u32).max(1);
            let target_h = ((h as f64 * scale).round() as u32).max(1);
            let resized = imageops::resize(&gray, target_w, target_h, FilterType::Lanczos3);
            if fit == ImageFit::Cover {
                let left = (target_w.saturating_sub(rect_w)) / 2;
                let top = (target_h.saturating_sub(rect_h)) / 2;
                imageops::crop_imm(&resized, left, top, rect_w.min(target_w), rect_h.min(target_h))
                    .to_image()
            } else {
                resized
            }
        }
    }
}

/// Row-major black flags for every pixel.
fn binarize(gray: &GrayImage, threshold: u8, dither: Dither, invert: bool) -> Vec<bool> {
    let (width, height) = gray.dimensions();
    let mut flags = Vec::with_capacity((width * height) as usize);

    match dither {
        Dither::None => {
            for pixel in gray.pixels() {
                flags.push(pixel.0[0] < threshold);
            }
        }
        Dither::Bayer => {
            let offset = threshold as i32 - 128;
            for (x, y, pixel) in gray.enumerate_pixels() {
                let cell = i32::from(BAYER8[(y % 8) as usize][(x % 8) as usize]) * 4 + 2;
                flags.push(pixel.0[0] as i32 + offset < cell);
            }
        }
        Dither::FloydSteinberg => {
            let mut values: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32).collect();
            let w = width as usize;
            for y in 0..height as usize {
                for x in 0..w {
                    let idx = y * w + x;
                    let old = values[idx];
                    let black = old < threshold as f32;
                    let new = if black { 0.0 } else { 255.0 };
                    let error = old - new;
                    flags.push(black);
                    if x + 1 < w {
                        values[idx + 1] += error * 7.0 / 16.0;
                    }
                    if y + 1 < height as usize {
                        if x > 0 {
                            values[idx + w - 1] += error * 3.0 / 16.0;
                        }
                        values[idx + w] += error * 5.0 / 16.0;
                        if x + 1 < w {
                            values[idx + w + 1] += error * 1.0 / 16.0;
                        }
                    }
                }
            }
        }
    }

    if invert {
        for flag in &mut flags {
            *flag = !*flag;
        }
    }
    flags
}

/// Pack black flags into `^GFA` hex rows, MSB first.
fn pack_graphic_field(flags: &[bool], width: u32, height: u32) -> (String, usize, usize) {
    let bytes_per_row = (width as usize + 7) / 8;
    let mut bytes = Vec::with_capacity(bytes_per_row * height as usize);
    for y in 0..height as usize {
        let row = &flags[y * width as usize..(y + 1) * width as usize];
        for chunk in row.chunks(8) {
            let mut byte = 0u8;
            for (bit, &black) in chunk.iter().enumerate() {
                if black {
                    byte |= 1 << (7 - bit);
                }
            }
            bytes.push(byte);
        }
    }
    let total = bytes.len();
    let mut hex = String::with_capacity(total * 2);
    for byte in &bytes {
        hex.push_str(&format!("{:02X}", byte));
    }
    (hex, bytes_per_row, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_single_row() {
        let flags = vec![true, true, false, false, true, false, true, false];
        let (hex, bytes_per_row, total) = pack_graphic_field(&flags, 8, 1);
        assert_eq!(hex, "CA");
        assert_eq!(bytes_per_row, 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_pack_pads_partial_byte() {
        let flags = vec![true, false, true];
        let (hex, bytes_per_row, total) = pack_graphic_field(&flags, 3, 1);
        assert_eq!(hex, "A0");
        assert_eq!(bytes_per_row, 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_threshold_binarize() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, Luma([10]));
        gray.put_pixel(1, 0, Luma([240]));
        assert_eq!(binarize(&gray, 128, Dither::None, false), vec![true, false]);
        assert_eq!(binarize(&gray, 128, Dither::None, true), vec![false, true]);
    }

    #[test]
    fn test_bayer_mid_gray_mixes() {
        let gray = GrayImage::from_pixel(8, 8, Luma([128]));
        let flags = binarize(&gray, 128, Dither::Bayer, false);
        let black = flags.iter().filter(|&&b| b).count();
        assert!(black > 8 && black < 56, "mid gray should dither to a mix, got {}", black);
    }

    #[test]
    fn test_floyd_steinberg_preserves_density() {
        let gray = GrayImage::from_pixel(16, 16, Luma([64]));
        let flags = binarize(&gray, 128, Dither::FloydSteinberg, false);
        let black = flags.iter().filter(|&&b| b).count();
        // 64/255 dark ≈ 75% black coverage.
        let ratio = black as f64 / flags.len() as f64;
        assert!((0.6..0.9).contains(&ratio), "unexpected density {}", ratio);
    }

    #[test]
    fn test_contain_scales_into_rect() {
        let gray = GrayImage::new(100, 50);
        let rect = Rect { x: 0, y: 0, w: 40, h: 40 };
        let scaled = scale_to_rect(gray, rect, ImageFit::Contain, None, 203);
        assert_eq!(scaled.dimensions(), (40, 20));
    }

    #[test]
    fn test_cover_fills_and_crops() {
        let gray = GrayImage::new(100, 50);
        let rect = Rect { x: 0, y: 0, w: 40, h: 40 };
        let scaled = scale_to_rect(gray, rect, ImageFit::Cover, None, 203);
        assert_eq!(scaled.dimensions(), (40, 40));
    }

    #[test]
    fn test_decode_base64_with_data_uri() {
        // 1x1 transparent PNG.
        let png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let plain = decode_base64(png, "p").unwrap();
        let with_prefix =
            decode_base64(&format!("data:image/png;base64,{}", png), "p").unwrap();
        assert_eq!(plain, with_prefix);
        assert!(image::load_from_memory(&plain).is_ok());
    }

    #[test]
    fn test_invalid_base64_is_schema_error() {
        let err = decode_base64("not//valid!!", "p").unwrap_err();
        assert_eq!(err.kind(), "schema");
    }
}
