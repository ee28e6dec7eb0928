//! Windowed reads from a single-image GeoTIFF.

use crate::{PreviewError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// A rectangular region of a raster, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Column of the left edge.
    pub col_off: u32,
    /// Row of the top edge.
    pub row_off: u32,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl PixelWindow {
    pub fn new(col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window anchored at (0, 0), at most `max_width` x `max_height`, clamped
    /// to the raster extent.
    pub fn clamped(max_width: u32, max_height: u32, raster_width: u32, raster_height: u32) -> Self {
        Self::new(0, 0, max_width.min(raster_width), max_height.min(raster_height))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn fits_within(&self, raster_width: u32, raster_height: u32) -> bool {
        u64::from(self.col_off) + u64::from(self.width) <= u64::from(raster_width)
            && u64::from(self.row_off) + u64::from(self.height) <= u64::from(raster_height)
    }
}

/// Numeric type of the stored samples, with its width in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Unsigned(u8),
    Signed(u8),
    Float(u8),
}

impl SampleType {
    /// Round `value` to the nearest value the band can hold.
    ///
    /// Only 32-bit floats lose precision; integer bands keep the sentinel
    /// as parsed, so a fractional sentinel never matches an integer pixel.
    pub fn round_to_band(self, value: f64) -> f64 {
        match self {
            SampleType::Float(32) => value as f32 as f64,
            _ => value,
        }
    }

    fn from_tags(sample_format: u16, bits: u8) -> Self {
        match sample_format {
            2 => SampleType::Signed(bits),
            3 => SampleType::Float(bits),
            _ => SampleType::Unsigned(bits),
        }
    }
}

/// Row-major 2-D array of pixel values read from one band.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterArray {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl RasterArray {
    /// Wrap row-major `data`. Panics if the length does not match the shape.
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "data length does not match shape");
        Self {
            data,
            width,
            height,
        }
    }

    /// Value at (`row`, `col`), or `None` outside the array.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn into_values(self) -> Vec<f64> {
        self.data
    }
}

/// An open GeoTIFF, read lazily chunk by chunk.
///
/// The file handle is held for the lifetime of the value and released on drop.
pub struct RasterDataset {
    decoder: Decoder<BufReader<File>>,
    path: PathBuf,
    width: u32,
    height: u32,
    samples_per_pixel: usize,
    sample_type: SampleType,
    no_data_value: Option<f64>,
}

impl std::fmt::Debug for RasterDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterDataset")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples_per_pixel", &self.samples_per_pixel)
            .field("sample_type", &self.sample_type)
            .field("no_data_value", &self.no_data_value)
            .finish_non_exhaustive()
    }
}

impl RasterDataset {
    /// Open a GeoTIFF for reading. Only the header and tags are read here.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        // Canopy tiles can be large single-strip images
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let samples_per_pixel = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1).max(1) as usize;
        let sample_type = Self::read_sample_type(&mut decoder);
        let no_data_value = Self::read_nodata_value(&mut decoder).map(|v| sample_type.round_to_band(v));

        debug!(
            path = %path.display(),
            width,
            height,
            samples_per_pixel,
            ?sample_type,
            ?no_data_value,
            "Opened raster"
        );

        Ok(Self {
            decoder,
            path: path.to_path_buf(),
            width,
            height,
            samples_per_pixel,
            sample_type,
            no_data_value,
        })
    }

    /// Try to read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
        let raw = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
        parse_nodata(&raw)
    }

    /// SampleFormat and BitsPerSample are per-sample lists; all bands share the first entry.
    fn read_sample_type<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> SampleType {
        let first = |values: tiff::TiffResult<Vec<u16>>| values.ok().and_then(|v| v.first().copied());
        let sample_format = first(decoder.get_tag_u16_vec(Tag::SampleFormat)).unwrap_or(1);
        let bits = first(decoder.get_tag_u16_vec(Tag::BitsPerSample)).unwrap_or(1);
        SampleType::from_tags(sample_format, u8::try_from(bits).unwrap_or(u8::MAX))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of bands (samples per pixel).
    pub fn band_count(&self) -> usize {
        self.samples_per_pixel
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Declared no-data sentinel, if any, rounded to the band's sample type.
    pub fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    /// Read `window` of the 1-based `band` into a `(window.height, window.width)` array.
    ///
    /// Only the strips or tiles that intersect the window are decoded.
    pub fn read_window(&mut self, band: usize, window: PixelWindow) -> Result<RasterArray> {
        if band == 0 || band > self.samples_per_pixel {
            return Err(PreviewError::InvalidBand {
                band,
                count: self.samples_per_pixel,
            });
        }
        if !window.fits_within(self.width, self.height) {
            return Err(PreviewError::WindowOutOfBounds {
                col_off: window.col_off,
                row_off: window.row_off,
                width: window.width,
                height: window.height,
                raster_width: self.width,
                raster_height: self.height,
            });
        }

        let out_width = window.width as usize;
        let mut out = vec![0.0f64; window.len()];
        if window.is_empty() {
            return Ok(RasterArray::new(out, out_width, window.height as usize));
        }

        let (chunk_width, chunk_height) = self.decoder.chunk_dimensions();
        let chunks_across = self.width.div_ceil(chunk_width);

        let first_cx = window.col_off / chunk_width;
        let last_cx = (window.col_off + window.width - 1) / chunk_width;
        let first_cy = window.row_off / chunk_height;
        let last_cy = (window.row_off + window.height - 1) / chunk_height;

        let stride = self.samples_per_pixel;
        let sample = band - 1;
        let win_x1 = window.col_off + window.width;
        let win_y1 = window.row_off + window.height;

        for cy in first_cy..=last_cy {
            for cx in first_cx..=last_cx {
                let index = cy * chunks_across + cx;
                let (data_width, data_height) = self.decoder.chunk_data_dimensions(index);
                let chunk = samples_to_f64(self.decoder.read_chunk(index)?);

                let chunk_x0 = cx * chunk_width;
                let chunk_y0 = cy * chunk_height;
                let x0 = chunk_x0.max(window.col_off);
                let x1 = (chunk_x0 + data_width).min(win_x1);
                let y0 = chunk_y0.max(window.row_off);
                let y1 = (chunk_y0 + data_height).min(win_y1);

                for y in y0..y1 {
                    let src_row = (y - chunk_y0) as usize * data_width as usize;
                    let dst_row = (y - window.row_off) as usize * out_width;
                    for x in x0..x1 {
                        let src = (src_row + (x - chunk_x0) as usize) * stride + sample;
                        out[dst_row + (x - window.col_off) as usize] = chunk[src];
                    }
                }
            }
        }

        debug!(
            band,
            col_off = window.col_off,
            row_off = window.row_off,
            width = window.width,
            height = window.height,
            chunks = (last_cx - first_cx + 1) * (last_cy - first_cy + 1),
            "Read raster window"
        );

        Ok(RasterArray::new(out, out_width, window.height as usize))
    }
}

/// Parse a GDAL_NODATA string such as `"-9999"` or `"nan"`.
fn parse_nodata(raw: &str) -> Option<f64> {
    raw.trim_end_matches('\0').trim().parse().ok()
}

/// Widen decoded samples of any supported type to `f64`.
fn samples_to_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_window_smaller_raster() {
        let window = PixelWindow::clamped(2000, 2000, 100, 100);
        assert_eq!(window, PixelWindow::new(0, 0, 100, 100));
    }

    #[test]
    fn test_clamped_window_larger_raster() {
        let window = PixelWindow::clamped(2000, 2000, 40000, 2500);
        assert_eq!(window, PixelWindow::new(0, 0, 2000, 2000));
        assert_eq!(window.len(), 4_000_000);
    }

    #[test]
    fn test_clamped_window_mixed_extent() {
        let window = PixelWindow::clamped(2000, 2000, 3000, 150);
        assert_eq!((window.width, window.height), (2000, 150));
    }

    #[test]
    fn test_window_fits_within() {
        assert!(PixelWindow::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(PixelWindow::new(5, 5, 5, 5).fits_within(10, 10));
        assert!(!PixelWindow::new(6, 0, 5, 5).fits_within(10, 10));
        assert!(!PixelWindow::new(0, 0, 10, 11).fits_within(10, 10));
        assert!(!PixelWindow::new(u32::MAX, 0, 2, 1).fits_within(10, 10));
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-9999"), Some(-9999.0));
        assert_eq!(parse_nodata("255\0"), Some(255.0));
        assert_eq!(parse_nodata(" 0 "), Some(0.0));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert_eq!(parse_nodata("-3.4028234663852886e+38"), Some(f64::from(f32::MIN)));
        assert_eq!(parse_nodata("none"), None);
    }

    #[test]
    fn test_sentinel_rounded_to_float32_band() {
        let sentinel = parse_nodata("0.1").unwrap();
        assert_eq!(SampleType::Float(32).round_to_band(sentinel), f64::from(0.1f32));
        assert_eq!(SampleType::Float(64).round_to_band(sentinel), 0.1);
        assert_eq!(SampleType::Unsigned(8).round_to_band(0.5), 0.5);
        assert!(SampleType::Float(32).round_to_band(f64::NAN).is_nan());
    }

    #[test]
    fn test_sample_type_from_tags() {
        assert_eq!(SampleType::from_tags(3, 32), SampleType::Float(32));
        assert_eq!(SampleType::from_tags(2, 16), SampleType::Signed(16));
        assert_eq!(SampleType::from_tags(1, 8), SampleType::Unsigned(8));
        assert_eq!(SampleType::from_tags(4, 8), SampleType::Unsigned(8));
    }

    #[test]
    fn test_samples_to_f64() {
        assert_eq!(samples_to_f64(DecodingResult::U8(vec![0, 255])), vec![0.0, 255.0]);
        assert_eq!(samples_to_f64(DecodingResult::I16(vec![-5, 7])), vec![-5.0, 7.0]);
        assert_eq!(samples_to_f64(DecodingResult::F32(vec![1.5])), vec![1.5]);
    }

    #[test]
    fn test_array_get() {
        let array = RasterArray::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        assert_eq!(array.shape(), (2, 3));
        assert_eq!(array.get(0, 0), Some(1.0));
        assert_eq!(array.get(1, 2), Some(6.0));
        assert_eq!(array.get(2, 0), None);
        assert_eq!(array.get(0, 3), None);
    }
}
