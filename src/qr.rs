//! QR code generation for printable documents.
//!
//! Payloads (ZATCA TLV blobs, tracking URLs) become inline PNG data URIs so
//! the generated HTML never loads external assets at print time.

use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::QrError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QrOptions {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_margin_modules")]
    pub margin_modules: u32,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
}

fn default_width_px() -> u32 {
    160
}

fn default_margin_modules() -> u32 {
    2
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width_px: default_width_px(),
            margin_modules: default_margin_modules(),
            error_correction: ErrorCorrection::default(),
        }
    }
}

/// Turns a payload into a `data:image/png;base64,...` URI.
pub trait QrRenderer: Send + Sync {
    fn render(&self, payload: &str, options: &QrOptions) -> Result<String, QrError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PngQrRenderer;

impl QrRenderer for PngQrRenderer {
    fn render(&self, payload: &str, options: &QrOptions) -> Result<String, QrError> {
        let image = generate_qr(payload, options)?;
        let mut encoded = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut encoded), ImageFormat::Png)?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(encoded)
        ))
    }
}

/// Rasterize the QR matrix with a white quiet zone of `margin_modules`.
///
/// The module scale is an integer so edges stay crisp on thermal printers;
/// the image can therefore be slightly narrower than `width_px`.
pub fn generate_qr(payload: &str, options: &QrOptions) -> Result<DynamicImage, QrError> {
    let code =
        QrCode::with_error_correction_level(payload.as_bytes(), options.error_correction.into())?;
    let modules = code.to_colors();
    let module_count = code.width() as u32;
    let span = module_count + 2 * options.margin_modules;

    let scale = (options.width_px / span).max(1);
    let img_size = span * scale;
    let offset = options.margin_modules * scale;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));
    for (i, color) in modules.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x = (i as u32) % module_count;
        let y = (i as u32) / module_count;
        for dx in 0..scale {
            for dy in 0..scale {
                img.put_pixel(offset + x * scale + dx, offset + y * scale + dy, Luma([0u8]));
            }
        }
    }

    Ok(DynamicImage::ImageLuma8(img))
}

/// Render a QR or log and give up; documents print without the QR block.
pub fn render_or_omit(
    renderer: &dyn QrRenderer,
    payload: &str,
    options: &QrOptions,
    purpose: &str,
) -> Option<String> {
    match renderer.render(payload, options) {
        Ok(uri) => Some(uri),
        Err(error) => {
            warn!(purpose = %purpose, payload_len = payload.len(), error = %error, "QR render failed, omitting QR block");
            None
        }
    }
}
