use std::{path::Path, str::FromStr};

use mime::Mime;

pub fn get_content_type(mime_type: Option<&str>, filename: &str) -> Mime {
    if let Some(mime_type) = mime_type {
        if let Ok(content_type) = Mime::from_str(mime_type) {
            return content_type;
        }
    }
    if let Some(extension) = Path::new(filename).extension().and_then(|extension| extension.to_str()) {
        return match extension {
            "pdf" => mime::APPLICATION_PDF,
            "png" => mime::IMAGE_PNG,
            "jpg" | "jpeg" => mime::IMAGE_JPEG,
            "gif" => mime::IMAGE_GIF,
            "bmp" => mime::IMAGE_BMP,
            "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
            _ => mime::APPLICATION_OCTET_STREAM,
        };
    }
    mime::APPLICATION_OCTET_STREAM
}

/// Content type of generated image bytes. Falls back to the file name when
/// the header is not recognised.
pub fn sniff_image_type(head: &[u8], filename: &str) -> Mime {
    match image::guess_format(head) {
        Ok(image::ImageFormat::Png) => mime::IMAGE_PNG,
        Ok(image::ImageFormat::Jpeg) => mime::IMAGE_JPEG,
        Ok(image::ImageFormat::Gif) => mime::IMAGE_GIF,
        Ok(image::ImageFormat::Bmp) => mime::IMAGE_BMP,
        Ok(image::ImageFormat::WebP) => get_content_type(None, "x.webp"),
        _ => get_content_type(None, filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mime_type_wins() {
        assert_eq!(get_content_type(Some("application/pdf"), "a.png"), mime::APPLICATION_PDF);
        assert_eq!(get_content_type(Some("not a mime"), "a.png"), mime::IMAGE_PNG);
        assert_eq!(get_content_type(None, "a.unknown"), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn sniffs_jpeg_saved_as_png() {
        let jpeg_head = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(sniff_image_type(&jpeg_head, "abc.png"), mime::IMAGE_JPEG);
        assert_eq!(sniff_image_type(&[0, 0, 0], "abc.png"), mime::IMAGE_PNG);
    }
}
