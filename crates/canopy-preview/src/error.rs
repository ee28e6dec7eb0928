//! Error types for the preview crate.

use thiserror::Error;

/// Errors that can occur while reading a raster or rendering its preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// I/O error reading the raster or writing the image.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Requested band does not exist in the dataset.
    #[error("Invalid band {band} (dataset has {count} band(s), numbered from 1)")]
    InvalidBand {
        /// Requested 1-based band index.
        band: usize,
        /// Number of bands in the dataset.
        count: usize,
    },

    /// Window extends past the dataset extent.
    #[error("Window {width}x{height} at ({col_off}, {row_off}) exceeds raster size {raster_width}x{raster_height}")]
    WindowOutOfBounds {
        /// Window column offset.
        col_off: u32,
        /// Window row offset.
        row_off: u32,
        /// Window width.
        width: u32,
        /// Window height.
        height: u32,
        /// Dataset width.
        raster_width: u32,
        /// Dataset height.
        raster_height: u32,
    },

    /// Image encoding error.
    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),

    /// The embedded font could not be parsed.
    #[error("Failed to load embedded font")]
    FontLoad,
}
