use chrono::NaiveDateTime;
use serde::Serialize;

use super::fonts::{points_to_mm, FontFace};
use super::ReportBranding;
use crate::records::StudentRecord;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ROW_HEIGHT_MM: f32 = 10.0;
// Horizontal padding inside a row, matching the usual PDF cell margin.
const CELL_PADDING_MM: f32 = 1.0;

const HEADER_TOP_MM: f32 = 50.0;
const DETAILS_TOP_MM: f32 = 80.0;
const FOOTER_FROM_BOTTOM_MM: f32 = 30.0;

const HEADER_SIZE_PT: f32 = 18.0;
const DETAIL_SIZE_PT: f32 = 12.0;
const FOOTER_SIZE_PT: f32 = 8.0;

const BLACK: [u8; 3] = [0, 0, 0];
const MUTED_GRAY: [u8; 3] = [128, 128, 128];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    Header,
    Detail,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAsset {
    Logo,
    VerificationTag,
}

/// A single line of text. Coordinates are millimetres from the top-left
/// corner of the page; `baseline_mm` is where the glyphs sit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub role: TextRole,
    pub text: String,
    pub face: FontFace,
    pub size_pt: f32,
    pub x_mm: f32,
    pub baseline_mm: f32,
    pub color: [u8; 3],
}

/// An image anchored at its top-left corner; height follows the aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePlacement {
    pub asset: ImageAsset,
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutElement {
    Text(TextBlock),
    Image(ImagePlacement),
}

/// Fixed single-page A4 layout of a screening report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub elements: Vec<LayoutElement>,
}

impl ReportLayout {
    pub fn build(
        branding: &ReportBranding,
        record: &StudentRecord,
        generated_at: NaiveDateTime,
        with_verification_tag: bool,
    ) -> Self {
        let mut elements = vec![LayoutElement::Image(ImagePlacement {
            asset: ImageAsset::Logo,
            x_mm: 80.0,
            y_mm: 10.0,
            width_mm: 35.0,
        })];

        for (row, line) in [&branding.institution, &branding.title].into_iter().enumerate() {
            elements.push(LayoutElement::Text(centered(
                TextRole::Header,
                line.clone(),
                FontFace::Bold,
                HEADER_SIZE_PT,
                HEADER_TOP_MM + row as f32 * ROW_HEIGHT_MM,
                BLACK,
            )));
        }

        for (row, line) in detail_lines(record).into_iter().enumerate() {
            let top = DETAILS_TOP_MM + row as f32 * ROW_HEIGHT_MM;
            elements.push(LayoutElement::Text(TextBlock {
                role: TextRole::Detail,
                text: line,
                face: FontFace::Regular,
                size_pt: DETAIL_SIZE_PT,
                x_mm: MARGIN_MM + CELL_PADDING_MM,
                baseline_mm: baseline(top, DETAIL_SIZE_PT),
                color: BLACK,
            }));
        }

        if with_verification_tag {
            elements.push(LayoutElement::Image(ImagePlacement {
                asset: ImageAsset::VerificationTag,
                x_mm: 80.0,
                y_mm: 120.0,
                width_mm: 50.0,
            }));
        }

        elements.push(LayoutElement::Text(centered(
            TextRole::Timestamp,
            format!("Generated on: {}", generated_at.format(TIMESTAMP_FORMAT)),
            FontFace::Oblique,
            FOOTER_SIZE_PT,
            PAGE_HEIGHT_MM - FOOTER_FROM_BOTTOM_MM,
            MUTED_GRAY,
        )));

        Self { elements }
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.elements.iter().filter_map(|element| match element {
            LayoutElement::Text(block) => Some(block),
            LayoutElement::Image(_) => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImagePlacement> {
        self.elements.iter().filter_map(|element| match element {
            LayoutElement::Image(placement) => Some(placement),
            LayoutElement::Text(_) => None,
        })
    }

    /// The page text in drawing order.
    pub fn lines(&self) -> Vec<&str> {
        self.text_blocks().map(|block| block.text.as_str()).collect()
    }
}

pub fn detail_lines(record: &StudentRecord) -> [String; 4] {
    [
        format!("Matric Number/Hospital Number: {}", record.identifier),
        format!("Full Name: {}", record.full_name),
        format!("Department: {}", record.department),
        format!("Substance abuse screening: {}", record.result),
    ]
}

fn centered(
    role: TextRole,
    text: String,
    face: FontFace,
    size_pt: f32,
    row_top_mm: f32,
    color: [u8; 3],
) -> TextBlock {
    let content_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let x_mm = MARGIN_MM + (content_width - face.text_width_mm(&text, size_pt)) / 2.0;
    TextBlock {
        role,
        text,
        face,
        size_pt,
        x_mm,
        baseline_mm: baseline(row_top_mm, size_pt),
        color,
    }
}

// Vertically centres glyphs in a row the way PDF cell layouts do.
fn baseline(row_top_mm: f32, size_pt: f32) -> f32 {
    row_top_mm + ROW_HEIGHT_MM / 2.0 + 0.3 * points_to_mm(size_pt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> StudentRecord {
        StudentRecord {
            identifier: "S1001".to_string(),
            full_name: "Jane Doe".to_string(),
            department: "CS".to_string(),
            result: "Negative".to_string(),
        }
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .expect("valid date")
            .and_hms_opt(hour, minute, second)
            .expect("valid time")
    }

    fn masked(layout: &ReportLayout) -> Vec<LayoutElement> {
        layout
            .elements
            .iter()
            .filter(|element| {
                !matches!(element, LayoutElement::Text(block) if block.role == TextRole::Timestamp)
            })
            .cloned()
            .collect()
    }

    #[test]
    fn lines_follow_record_field_order() {
        let layout = ReportLayout::build(&ReportBranding::default(), &record(), at(9, 30, 0), true);
        assert_eq!(
            layout.lines(),
            vec![
                "Bells University of Technology, Ota",
                "Substance Abuse Screening Report",
                "Matric Number/Hospital Number: S1001",
                "Full Name: Jane Doe",
                "Department: CS",
                "Substance abuse screening: Negative",
                "Generated on: 2026-03-02 09:30:00",
            ]
        );
    }

    #[test]
    fn timestamp_is_the_only_difference_between_renders() {
        let branding = ReportBranding::default();
        let first = ReportLayout::build(&branding, &record(), at(9, 30, 0), true);
        let second = ReportLayout::build(&branding, &record(), at(17, 5, 59), true);

        assert_ne!(first, second);
        assert_eq!(masked(&first), masked(&second));
    }

    #[test]
    fn identical_inputs_build_identical_layouts() {
        let branding = ReportBranding::default();
        let first = ReportLayout::build(&branding, &record(), at(9, 30, 0), true);
        let second = ReportLayout::build(&branding, &record(), at(9, 30, 0), true);
        assert_eq!(first, second);
    }

    #[test]
    fn verification_tag_is_optional() {
        let branding = ReportBranding::default();
        let with_tag = ReportLayout::build(&branding, &record(), at(9, 30, 0), true);
        let without_tag = ReportLayout::build(&branding, &record(), at(9, 30, 0), false);

        let assets = |layout: &ReportLayout| {
            layout.images().map(|image| image.asset).collect::<Vec<_>>()
        };
        assert_eq!(
            assets(&with_tag),
            vec![ImageAsset::Logo, ImageAsset::VerificationTag]
        );
        assert_eq!(assets(&without_tag), vec![ImageAsset::Logo]);
        assert_eq!(with_tag.lines(), without_tag.lines());
    }

    #[test]
    fn header_lines_are_centered_and_footer_is_muted() {
        let branding = ReportBranding::default();
        let layout = ReportLayout::build(&branding, &record(), at(9, 30, 0), false);
        for block in layout.text_blocks().filter(|block| block.role == TextRole::Header) {
            let width = block.face.text_width_mm(&block.text, block.size_pt);
            let left_gap = block.x_mm;
            let right_gap = PAGE_WIDTH_MM - block.x_mm - width;
            assert!((left_gap - right_gap).abs() < 1e-3);
        }

        let footer = layout
            .text_blocks()
            .find(|block| block.role == TextRole::Timestamp)
            .expect("timestamp line");
        assert_eq!(footer.face, FontFace::Oblique);
        assert_eq!(footer.color, [128, 128, 128]);
        assert!(footer.baseline_mm > 260.0 && footer.baseline_mm < PAGE_HEIGHT_MM);
    }

    #[test]
    fn blank_fields_render_as_empty_values() {
        let mut record = record();
        record.result = String::new();
        let layout = ReportLayout::build(&ReportBranding::default(), &record, at(9, 30, 0), false);
        assert!(layout.lines().contains(&"Substance abuse screening: "));
    }
}
