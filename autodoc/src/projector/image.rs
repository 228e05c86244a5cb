//! PNG encoding of subject diagrams.

use crate::errors::ImageSerializationError;
use crate::providers::RasterImage;

/// Encodes an RGBA image as PNG into a fresh in-memory buffer.
///
/// The encoder borrows the buffer only inside this function; on failure the
/// partially written buffer is dropped with it.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, ImageSerializationError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(ImageSerializationError::new)?;
        writer
            .write_image_data(image.pixels())
            .map_err(ImageSerializationError::new)?;
        writer.finish().map_err(ImageSerializationError::new)?;
    }
    Ok(buffer)
}
