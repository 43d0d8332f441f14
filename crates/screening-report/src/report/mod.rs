//! Single-page PDF rendering of a student's screening result.

pub mod fonts;
pub mod layout;
mod pdf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::records::StudentRecord;
pub use layout::{ImageAsset, LayoutElement, ReportLayout, TextBlock, TextRole};
use pdf::PageImages;

/// The two centered header lines printed under the logo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBranding {
    pub institution: String,
    pub title: String,
}

impl Default for ReportBranding {
    fn default() -> Self {
        Self {
            institution: "Bells University of Technology, Ota".to_string(),
            title: "Substance Abuse Screening Report".to_string(),
        }
    }
}

impl ImageAsset {
    pub fn label(self) -> &'static str {
        match self {
            ImageAsset::Logo => "logo",
            ImageAsset::VerificationTag => "verification tag",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("report asset {} is unavailable: {source}", .path.display())]
    MissingAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} image could not be decoded: {source}", .asset.label())]
    Image {
        asset: ImageAsset,
        #[source]
        source: image::ImageError,
    },
    #[error("pdf generation failed: {0}")]
    Pdf(String),
}

/// Renders reports against a logo on disk. The logo is read on every call so
/// a missing or replaced file only affects the requests that hit it.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    branding: ReportBranding,
    logo_path: PathBuf,
}

impl ReportRenderer {
    pub fn new(branding: ReportBranding, logo_path: impl Into<PathBuf>) -> Self {
        Self {
            branding,
            logo_path: logo_path.into(),
        }
    }

    pub fn branding(&self) -> &ReportBranding {
        &self.branding
    }

    pub fn logo_path(&self) -> &Path {
        &self.logo_path
    }

    pub fn layout(
        &self,
        record: &StudentRecord,
        generated_at: NaiveDateTime,
        with_verification_tag: bool,
    ) -> ReportLayout {
        ReportLayout::build(&self.branding, record, generated_at, with_verification_tag)
    }

    /// `verification_tag` is an encoded image (PNG or JPEG) placed under the
    /// details. Images are embedded straight from memory.
    pub fn render(
        &self,
        record: &StudentRecord,
        generated_at: NaiveDateTime,
        verification_tag: Option<&[u8]>,
    ) -> Result<Vec<u8>, RenderError> {
        let logo_bytes = std::fs::read(&self.logo_path).map_err(|source| {
            RenderError::MissingAsset {
                path: self.logo_path.clone(),
                source,
            }
        })?;
        let images = PageImages {
            logo: decode(ImageAsset::Logo, &logo_bytes)?,
            verification_tag: verification_tag
                .map(|bytes| decode(ImageAsset::VerificationTag, bytes))
                .transpose()?,
        };

        let layout = self.layout(record, generated_at, images.verification_tag.is_some());
        let title = format!("{} - {}", self.branding.title, record.identifier);
        pdf::write_document(
            &layout,
            &images,
            &title,
            generated_at,
            document_id(&record.identifier),
        )
    }
}

fn decode(asset: ImageAsset, bytes: &[u8]) -> Result<image::DynamicImage, RenderError> {
    image::load_from_memory(bytes).map_err(|source| RenderError::Image { asset, source })
}

/// 128-bit FNV-1a digest of the identifier, written as the PDF file id.
fn document_id(identifier: &str) -> [u8; 16] {
    const OFFSET: u128 = 0x6c62272e07bb014262b821756295c58d;
    const PRIME: u128 = 0x0000000001000000000000000000013b;
    let digest = identifier
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u128::from(byte)).wrapping_mul(PRIME));
    digest.to_be_bytes()
}
