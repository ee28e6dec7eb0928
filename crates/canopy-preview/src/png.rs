//! PNG output with a physical resolution (pHYs) chunk.

use crate::Result;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbaImage};
use std::path::Path;

/// Length of the PNG signature plus the IHDR chunk (8 + 4 + 4 + 13 + 4).
const IHDR_END: usize = 33;

const METERS_PER_INCH: f64 = 0.0254;

/// Encode `image` as RGB PNG tagged with `dpi` and write it to `path`,
/// replacing any existing file.
pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P, dpi: u32) -> Result<()> {
    let bytes = encode_png(image, dpi)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode `image` as an RGB PNG carrying a pHYs chunk for `dpi`.
pub fn encode_png(image: &RgbaImage, dpi: u32) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded).write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;

    // pHYs must precede IDAT; the encoder writes IHDR first, so insert right after it.
    let mut png = Vec::with_capacity(encoded.len() + 21);
    png.extend_from_slice(&encoded[..IHDR_END]);
    write_chunk(&mut png, b"pHYs", &phys_data(dpi));
    png.extend_from_slice(&encoded[IHDR_END..]);

    Ok(png)
}

/// pHYs payload: pixels per meter on both axes, unit = meter.
fn phys_data(dpi: u32) -> [u8; 9] {
    let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
    let mut data = [0u8; 9];
    data[0..4].copy_from_slice(&ppm.to_be_bytes());
    data[4..8].copy_from_slice(&ppm.to_be_bytes());
    data[8] = 1;
    data
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    // Write length
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());

    // Write chunk type
    png.extend_from_slice(chunk_type);

    // Write data
    png.extend_from_slice(data);

    // Write CRC
    let crc_data = [chunk_type.as_slice(), data].concat();
    png.extend_from_slice(&crc32fast::hash(&crc_data).to_be_bytes());
}
