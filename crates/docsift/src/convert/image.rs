//! Image to single-page PDF conversion.
//!
//! JPEG sources keep their compressed stream (DCTDecode); everything else is
//! decoded to raw RGB. The page is sized to the image so no scaling metadata
//! is lost before OCR-style extraction downstream.

use std::path::Path;

use image::GenericImageView;
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::ConvertError;

pub fn image_to_pdf(source: &Path, target: &Path) -> Result<(), ConvertError> {
    let bytes = std::fs::read(source).map_err(|e| ConvertError::ReadSource {
        path: source.to_path_buf(),
        source: e,
    })?;

    let img = image::load_from_memory(&bytes)
        .map_err(|e| ConvertError::ImageDecode(e.to_string()))?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ConvertError::ImageDecode("image has zero dimensions".to_string()));
    }

    let is_jpeg = matches!(
        source.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()),
        Some(ref ext) if ext == "jpg" || ext == "jpeg"
    );

    let xobject = if is_jpeg {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            bytes,
        )
    } else {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.to_rgb8().into_raw(),
        )
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Object::Stream(xobject));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });

    // Page sized to the image in points; draw the image edge to edge.
    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im1 Do\nQ\n", width, height);
    let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, content.into_bytes())));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(target)
        .map_err(|e| ConvertError::PdfEncode(e.to_string()))?;

    Ok(())
}
