//! Image decoding and JPEG encoding

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError};

/// Decode raw bytes, guessing the format from the content
///
/// An unrecognised format comes back as `ImageError::Unsupported`, which
/// callers report differently from corrupt data in a known format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Encode as baseline JPEG at the given quality (1-100)
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));

    // JPEG has no alpha channel and the encoder rejects 16-bit data
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_encode_jpeg_from_rgba() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 128])));
        let bytes = encode_jpeg(&image, 75).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(3, 2))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let decoded = decode(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_decode_distinguishes_unknown_format_from_corrupt_data() {
        assert!(matches!(decode(b"plain text, not an image"), Err(ImageError::Unsupported(_))));

        // A valid PNG signature followed by garbage
        let mut corrupt = b"\x89PNG\r\n\x1a\n".to_vec();
        corrupt.extend_from_slice(&[0u8; 32]);
        assert!(!matches!(decode(&corrupt), Err(ImageError::Unsupported(_)) | Ok(_)));
    }
}
