use serde::Serialize;

/// Standard PDF base fonts used by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    Regular,
    Bold,
    Oblique,
}

// Helvetica AFM advance widths for ASCII 0x20..=0x7E, in 1/1000 em.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, //
];

// Non-ASCII glyphs fall back to the width of a lowercase 'n'.
const FALLBACK_WIDTH: u16 = 556;

const POINT_IN_MM: f32 = 25.4 / 72.0;

impl FontFace {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontFace::Regular | FontFace::Oblique => &HELVETICA,
            FontFace::Bold => &HELVETICA_BOLD,
        }
    }

    fn glyph_width(self, glyph: char) -> u16 {
        let code = glyph as u32;
        if (0x20..=0x7e).contains(&code) {
            self.widths()[(code - 0x20) as usize]
        } else {
            FALLBACK_WIDTH
        }
    }

    /// Rendered width of `text` in millimetres at `size_pt`.
    pub fn text_width_mm(self, text: &str, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        units as f32 / 1000.0 * size_pt * POINT_IN_MM
    }
}

pub(crate) fn points_to_mm(points: f32) -> f32 {
    points * POINT_IN_MM
}
