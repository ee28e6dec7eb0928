//! The preview pipeline: open, window, mask, render, save.

use crate::figure::{render_preview, FigureStyle};
use crate::mask::MaskedArray;
use crate::png::save_png;
use crate::raster::{PixelWindow, RasterDataset};
use crate::Result;
use std::path::PathBuf;
use tracing::info;

/// Raster read by default.
pub const DEFAULT_INPUT: &str = "canopy.tif";

/// Preview image written by default.
pub const DEFAULT_OUTPUT: &str = "canopy_preview.png";

/// Largest window edge read from the raster, in pixels.
pub const MAX_WINDOW: u32 = 2000;

/// Inputs, outputs and figure settings for one preview run.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Window width limit.
    pub max_width: u32,
    /// Window height limit.
    pub max_height: u32,
    /// 1-based band index.
    pub band: usize,
    pub figure: FigureStyle,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            max_width: MAX_WINDOW,
            max_height: MAX_WINDOW,
            band: 1,
            figure: FigureStyle::default(),
        }
    }
}

/// What a preview run read and wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub output: PathBuf,
    /// Window that was read.
    pub window: PixelWindow,
    /// Number of pixels that were not no-data.
    pub valid_pixels: usize,
    /// Min/max of valid pixels, if any.
    pub value_range: Option<(f64, f64)>,
    /// Size of the written image in pixels.
    pub image_size: (u32, u32),
}

/// Run the whole preview pipeline for `config`.
///
/// The raster handle is released before rendering starts.
pub fn run_preview(config: &PreviewConfig) -> Result<PreviewReport> {
    let (window, masked) = {
        let mut dataset = RasterDataset::open(&config.input)?;
        let window = PixelWindow::clamped(
            config.max_width,
            config.max_height,
            dataset.width(),
            dataset.height(),
        );
        let array = dataset.read_window(config.band, window)?;
        (window, MaskedArray::masked_equal(array, dataset.no_data_value()))
    };

    let value_range = masked.min_max();
    info!(
        input = %config.input.display(),
        width = window.width,
        height = window.height,
        valid = masked.valid_count(),
        masked = masked.masked_count(),
        ?value_range,
        "Read preview window"
    );

    let image = render_preview(&masked, &config.figure)?;
    save_png(&image, &config.output, config.figure.dpi)?;
    info!(output = %config.output.display(), width = image.width(), height = image.height(), "Preview saved");

    Ok(PreviewReport {
        output: config.output.clone(),
        window,
        valid_pixels: masked.valid_count(),
        value_range,
        image_size: image.dimensions(),
    })
}
