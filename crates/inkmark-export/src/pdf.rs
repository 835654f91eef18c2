//! Writing ink layers and text notes into PDF pages.

use crate::error::{ExportError, ExportResult};
use crate::layer::AnnotationLayer;
use inkmark_core::TextAnnotation;
use kurbo::{Point, Rect, Vec2};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

/// Resource name prefix for ink layer images.
pub const LAYER_XOBJECT_PREFIX: &str = "InkLayer";
/// Resource name of the font used for text notes.
pub const TEXT_FONT_NAME: &str = "InkHelv";

/// Look up a possibly inherited page attribute, following references.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    loop {
        if let Ok(value) = node.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        Object::Reference(id) => number(doc, doc.get_object(*id).ok()?),
        _ => None,
    }
}

/// The page's MediaBox, normalized so `x0 <= x1` and `y0 <= y1`.
pub fn media_box(doc: &Document, page_id: ObjectId) -> Option<Rect> {
    let Object::Array(values) = inherited_attribute(doc, page_id, b"MediaBox")? else {
        return None;
    };
    let coords: Vec<f64> = values.iter().filter_map(|v| number(doc, v)).collect();
    match coords[..] {
        [x0, y0, x1, y1] => Some(Rect::new(x0, y0, x1, y1).abs()),
        _ => None,
    }
}

/// Resolve a sub-dictionary of `resources` (e.g. `XObject`) into an owned copy.
fn resource_category(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

/// Pick a resource name not yet used in `category`.
fn unused_name(category: &Dictionary, prefix: &str) -> String {
    (0..)
        .map(|i| format!("{}{}", prefix, i))
        .find(|name| !category.has(name.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}

/// Ink and text to add on top of one page.
#[derive(Default)]
pub struct PageOverlay<'a> {
    pub layer: Option<&'a AnnotationLayer>,
    pub texts: &'a [TextAnnotation],
    /// Maps stored note coordinates onto the native page.
    pub scale: Vec2,
}

/// Add an overlay to a page in place.
///
/// The page's existing content is wrapped in `q`/`Q` so the overlay starts
/// from a clean graphics state, then the overlay stream is appended.
pub fn overlay_page(doc: &mut Document, page_id: ObjectId, overlay: &PageOverlay<'_>) -> ExportResult<()> {
    if overlay.layer.is_none() && overlay.texts.is_empty() {
        return Ok(());
    }

    let media = media_box(doc, page_id);
    let resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut xobjects = resource_category(doc, &resources, b"XObject");
    let mut fonts = resource_category(doc, &resources, b"Font");
    let mut operations = vec![Operation::new("Q", vec![])];

    if let Some(layer) = overlay.layer {
        let image_id = add_layer_image(doc, layer);
        let name = unused_name(&xobjects, LAYER_XOBJECT_PREFIX);
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));

        let size = layer.native_size();
        let origin = media.map(|m| m.origin()).unwrap_or(Point::ZERO);
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(size.width),
                    real(0.0),
                    real(0.0),
                    real(size.height),
                    real(origin.x),
                    real(origin.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    if !overlay.texts.is_empty() {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let name = unused_name(&fonts, TEXT_FONT_NAME);
        fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
        let media = media.unwrap_or_else(|| {
            overlay
                .layer
                .map(|l| l.native_size().to_rect())
                .unwrap_or(Rect::ZERO)
        });
        operations.extend(text_operations(overlay.texts, &name, media, overlay.scale));
    }

    let content = Content { operations }.encode()?;
    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, content));

    let mut new_resources = resources;
    new_resources.set("XObject", Object::Dictionary(xobjects));
    new_resources.set("Font", Object::Dictionary(fonts));

    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    };
    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(new_resources));
    Ok(())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Embed a layer as an RGB image with an 8-bit soft mask.
fn add_layer_image(doc: &mut Document, layer: &AnnotationLayer) -> ObjectId {
    let (rgb, alpha) = layer.to_rgb_and_alpha();
    let width = layer.width() as i64;
    let height = layer.height() as i64;

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        alpha,
    ));
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => Object::Reference(smask_id),
        },
        rgb,
    ))
}

/// Text drawing operations; note `y` grows downward, PDF `y` upward.
fn text_operations(texts: &[TextAnnotation], font: &str, media: Rect, scale: Vec2) -> Vec<Operation> {
    let mut ops = vec![Operation::new("BT", vec![])];
    for note in texts {
        if note.text.is_empty() {
            continue;
        }
        let color = note.color;
        let x = media.x0 + note.x * scale.x;
        let y = media.y1 - note.y * scale.y;
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), real(note.font_size * scale.y)],
        ));
        ops.push(Operation::new(
            "rg",
            vec![
                real(color.r as f64 / 255.0),
                real(color.g as f64 / 255.0),
                real(color.b as f64 / 255.0),
            ],
        ));
        ops.push(Operation::new(
            "Tm",
            vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&note.text), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

/// Best-effort WinAnsi bytes; characters outside Latin-1 become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Load a document, mapping parse failures to [`ExportError::Load`].
pub fn load_document(bytes: &[u8]) -> ExportResult<Document> {
    Document::load_mem(bytes).map_err(ExportError::Load)
}

/// Serialize a document.
pub fn save_document(doc: &mut Document) -> ExportResult<Vec<u8>> {
    doc.compress();
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ExportError::Encode(format!("PDF serialization: {}", e)))?;
    Ok(output)
}
