use chrono::NaiveDateTime;
use image::DynamicImage;
use printpdf::lopdf::{self, Dictionary, Object, ObjectId, StringFormat};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, OffsetDateTime, PdfDocument,
    PdfLayerReference, Rgb,
};

use super::fonts::FontFace;
use super::layout::{
    ImageAsset, ImagePlacement, LayoutElement, ReportLayout, TextBlock, PAGE_HEIGHT_MM,
    PAGE_WIDTH_MM,
};
use super::RenderError;

/// Decoded images referenced by a layout.
pub(crate) struct PageImages {
    pub(crate) logo: DynamicImage,
    pub(crate) verification_tag: Option<DynamicImage>,
}

impl PageImages {
    fn get(&self, asset: ImageAsset) -> Option<&DynamicImage> {
        match asset {
            ImageAsset::Logo => Some(&self.logo),
            ImageAsset::VerificationTag => self.verification_tag.as_ref(),
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn for_face(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Oblique => &self.oblique,
        }
    }
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(err.to_string())
}

/// Writes `layout` as a one-page PDF. The output depends only on the
/// arguments: document dates come from `generated_at` and the trailer `/ID`
/// from `document_id`.
pub(crate) fn write_document(
    layout: &ReportLayout,
    images: &PageImages,
    title: &str,
    generated_at: NaiveDateTime,
    document_id: [u8; 16],
) -> Result<Vec<u8>, RenderError> {
    // The wall-clock time is recorded as-is with a zero offset.
    let stamp = OffsetDateTime::from_unix_timestamp(generated_at.and_utc().timestamp())
        .map_err(pdf_error)?;
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Report");
    let doc = doc
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);
    let layer = doc.get_page(page).get_layer(layer);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?,
    };

    for element in &layout.elements {
        match element {
            LayoutElement::Text(block) => draw_text(&layer, &fonts, block),
            LayoutElement::Image(placement) => {
                if let Some(source) = images.get(placement.asset) {
                    draw_image(&layer, placement, source);
                }
            }
        }
    }

    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    normalize(&bytes, document_id)
}

/// printpdf numbers image objects in hash order and fills the trailer `/ID`
/// with random strings. Both are rewritten so equal inputs give equal bytes.
fn normalize(bytes: &[u8], document_id: [u8; 16]) -> Result<Vec<u8>, RenderError> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(pdf_error)?;
    for page_id in doc.get_pages().into_values() {
        order_xobjects(&mut doc, page_id)?;
    }

    let id = Object::String(document_id.to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(pdf_error)?;
    Ok(out)
}

/// Gives the page's XObjects ascending object ids in name order and writes
/// the XObject dictionary sorted by name.
fn order_xobjects(doc: &mut lopdf::Document, page_id: ObjectId) -> Result<(), RenderError> {
    let resources_id = match doc.get_dictionary(page_id).map_err(pdf_error)?.get(b"Resources") {
        Ok(Object::Reference(id)) => *id,
        _ => return Ok(()),
    };
    let resources = doc.get_dictionary(resources_id).map_err(pdf_error)?;
    let Ok(Object::Dictionary(xobjects)) = resources.get(b"XObject") else {
        return Ok(());
    };

    let mut entries = Vec::new();
    for (name, object) in xobjects.iter() {
        entries.push((name.clone(), object.as_reference().map_err(pdf_error)?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let mut ids: Vec<ObjectId> = entries.iter().map(|(_, id)| *id).collect();
    ids.sort();

    let mut moved = Vec::with_capacity(entries.len());
    for (_, old_id) in &entries {
        let object = doc
            .objects
            .remove(old_id)
            .ok_or_else(|| RenderError::Pdf(format!("missing xobject {old_id:?}")))?;
        moved.push(object);
    }

    let mut ordered = Dictionary::new();
    for (((name, _), new_id), object) in entries.into_iter().zip(ids).zip(moved) {
        doc.objects.insert(new_id, object);
        ordered.set(name, Object::Reference(new_id));
    }

    doc.get_dictionary_mut(resources_id)
        .map_err(pdf_error)?
        .set("XObject", Object::Dictionary(ordered));
    Ok(())
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, block: &TextBlock) {
    let [r, g, b] = block.color;
    layer.set_fill_color(Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    )));
    layer.use_text(
        block.text.as_str(),
        block.size_pt,
        Mm(block.x_mm),
        Mm(PAGE_HEIGHT_MM - block.baseline_mm),
        fonts.for_face(block.face),
    );
}

/// PDF space has its origin bottom-left, so the image is anchored by its
/// lower edge. The DPI is chosen so the pixel width maps onto `width_mm`.
fn draw_image(layer: &PdfLayerReference, placement: &ImagePlacement, source: &DynamicImage) {
    let width_px = source.width().max(1) as f32;
    let height_px = source.height().max(1) as f32;
    let height_mm = placement.width_mm * height_px / width_px;
    let dpi = width_px * 25.4 / placement.width_mm;

    let rgb = DynamicImage::ImageRgb8(source.to_rgb8());
    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placement.x_mm)),
            translate_y: Some(Mm(PAGE_HEIGHT_MM - placement.y_mm - height_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}
