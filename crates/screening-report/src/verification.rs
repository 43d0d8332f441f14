//! Scannable verification tags embedded in generated reports.
//!
//! A tag carries the same four values printed on the report so that staff can
//! check a paper copy against what a phone camera reads back.

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

use crate::records::StudentRecord;

pub struct VerificationPayload;

impl VerificationPayload {
    pub fn from_record(record: &StudentRecord) -> String {
        format!(
            "Matric Number: {}\nFull Name: {}\nDepartment: {}\nResult: {}",
            record.identifier, record.full_name, record.department, record.result
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("verification payload exceeds QR code capacity")]
    Capacity,
    #[error("verification tag could not be encoded: {0}")]
    Symbol(String),
    #[error("verification tag could not be rasterized: {0}")]
    Image(#[from] image::ImageError),
}

impl From<QrError> for EncodeError {
    fn from(value: QrError) -> Self {
        match value {
            QrError::DataTooLong => Self::Capacity,
            other => Self::Symbol(other.to_string()),
        }
    }
}

/// Turns a text payload into PNG bytes.
pub trait TagEncoder: Send + Sync {
    fn encode(&self, payload: &str) -> Result<Vec<u8>, EncodeError>;
}

/// QR encoder producing black-on-white grayscale PNGs. The symbol version is
/// the smallest that fits the payload at the configured correction level.
#[derive(Debug, Clone, Copy)]
pub struct QrTagEncoder {
    pub module_pixels: u32,
    pub quiet_zone_modules: u32,
    pub ec_level: EcLevel,
}

impl Default for QrTagEncoder {
    fn default() -> Self {
        Self {
            module_pixels: 10,
            quiet_zone_modules: 4,
            ec_level: EcLevel::M,
        }
    }
}

impl QrTagEncoder {
    fn rasterize(&self, code: &QrCode) -> GrayImage {
        let width = code.width() as u32;
        let colors = code.to_colors();
        let module = self.module_pixels.max(1);
        let border = self.quiet_zone_modules;
        let side = (width + 2 * border) * module;

        GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / module, y / module);
            let inside = (border..border + width).contains(&mx)
                && (border..border + width).contains(&my);
            let dark = inside
                && colors[((my - border) * width + (mx - border)) as usize] == Color::Dark;
            if dark {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }
}

impl TagEncoder for QrTagEncoder {
    fn encode(&self, payload: &str) -> Result<Vec<u8>, EncodeError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)?;
        let raster = DynamicImage::ImageLuma8(self.rasterize(&code));

        let mut png = Vec::new();
        raster.write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StudentRecord {
        StudentRecord {
            identifier: "S1001".to_string(),
            full_name: "Jane Doe".to_string(),
            department: "CS".to_string(),
            result: "Negative".to_string(),
        }
    }

    fn decode(png: &[u8]) -> String {
        let image = image::load_from_memory(png).expect("png decodes").to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "exactly one symbol expected");
        let (_, content) = grids[0].decode().expect("symbol decodes");
        content
    }

    #[test]
    fn payload_lists_fields_in_record_order() {
        assert_eq!(
            VerificationPayload::from_record(&record()),
            "Matric Number: S1001\nFull Name: Jane Doe\nDepartment: CS\nResult: Negative"
        );
    }

    #[test]
    fn encoded_tag_decodes_to_the_payload() {
        let payload = VerificationPayload::from_record(&record());
        let png = QrTagEncoder::default().encode(&payload).expect("encodes");
        assert_eq!(decode(&png), payload);
    }

    #[test]
    fn raster_includes_quiet_zone() {
        let encoder = QrTagEncoder::default();
        let code = QrCode::with_error_correction_level(b"S1001", EcLevel::M).expect("fits");
        let raster = encoder.rasterize(&code);
        let expected = (code.width() as u32 + 8) * 10;
        assert_eq!(raster.width(), expected);
        assert_eq!(raster.get_pixel(0, 0)[0], 255);
        assert_eq!(raster.get_pixel(40, 40)[0], 0, "finder pattern corner is dark");
    }

    #[test]
    fn oversized_payload_reports_capacity() {
        let payload = "X".repeat(8_000);
        let error = QrTagEncoder::default()
            .encode(&payload)
            .expect_err("too long");
        assert!(matches!(error, EncodeError::Capacity));
    }
}
