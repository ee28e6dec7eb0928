//! # canopy-preview
//!
//! Quick-look renderer for canopy height GeoTIFFs.
//!
//! The previewer reads at most a 2000x2000 pixel window from the top-left of
//! band 1, masks the dataset's no-data sentinel, and renders the remaining
//! heights with the viridis color map, a labeled colorbar and a title. The
//! figure is trimmed to its content and saved as a 150 DPI PNG.
//!
//! ## Overview
//!
//! - [`RasterDataset`] opens a GeoTIFF and decodes only the strips or tiles
//!   that intersect the requested [`PixelWindow`].
//! - [`MaskedArray`] pairs the window with an exclusion mask; masked pixels
//!   are ignored by [`MaskedArray::min_max`] and drawn as background.
//! - [`render_preview`] lays out the figure; [`save_png`] writes it.
//! - [`run_preview`] chains the steps with the fixed default paths.
//!
//! ## Example
//!
//! ```no_run
//! use canopy_preview::{run_preview, PreviewConfig};
//!
//! let report = run_preview(&PreviewConfig::default())?;
//! println!("Preview saved as '{}'", report.output.display());
//! # Ok::<(), canopy_preview::PreviewError>(())
//! ```
//!
//! Reading a window directly:
//!
//! ```no_run
//! use canopy_preview::{MaskedArray, PixelWindow, RasterDataset};
//!
//! let mut dataset = RasterDataset::open("canopy.tif")?;
//! let window = PixelWindow::clamped(2000, 2000, dataset.width(), dataset.height());
//! let heights = dataset.read_window(1, window)?;
//! let masked = MaskedArray::masked_equal(heights, dataset.no_data_value());
//! println!("Height range: {:?}", masked.min_max());
//! # Ok::<(), canopy_preview::PreviewError>(())
//! ```

mod colormap;
mod error;
mod figure;
mod mask;
mod pipeline;
mod png;
mod raster;

pub use colormap::{ColorScale, ColorStop, Colormap};
pub use error::PreviewError;
pub use figure::{render_preview, FigureStyle};
pub use mask::MaskedArray;
pub use pipeline::{run_preview, PreviewConfig, PreviewReport, DEFAULT_INPUT, DEFAULT_OUTPUT, MAX_WINDOW};
pub use png::{encode_png, save_png};
pub use raster::{PixelWindow, RasterArray, RasterDataset, SampleType};

/// Result type for preview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;
