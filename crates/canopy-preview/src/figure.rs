//! Pseudocolor figure rendering: image, colorbar, title and tight trimming.

use crate::colormap::{ColorScale, Colormap};
use crate::mask::MaskedArray;
use crate::{PreviewError, Result};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

/// Embedded font data - DejaVu Sans
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Target number of colorbar ticks.
const MAX_TICKS: usize = 6;

/// Size, resolution and text of the preview figure.
#[derive(Debug, Clone)]
pub struct FigureStyle {
    /// Figure width in inches.
    pub width_in: f32,
    /// Figure height in inches.
    pub height_in: f32,
    /// Output resolution in dots per inch.
    pub dpi: u32,
    /// Padding kept around the drawn content when trimming, in inches.
    pub pad_in: f32,
    pub title: String,
    pub colorbar_label: String,
    pub colormap: Colormap,
    /// Figure background, also used for masked pixels.
    pub background: Rgba<u8>,
    /// Title font size in points.
    pub title_pt: f32,
    /// Tick and label font size in points.
    pub label_pt: f32,
}

impl Default for FigureStyle {
    fn default() -> Self {
        FigureStyle {
            width_in: 10.0,
            height_in: 8.0,
            dpi: 150,
            pad_in: 0.1,
            title: "Canopy Height (First 2000x2000 pixels)".to_string(),
            colorbar_label: "Canopy Height (m)".to_string(),
            colormap: Colormap::viridis(),
            background: Rgba([255, 255, 255, 255]),
            title_pt: 12.0,
            label_pt: 10.0,
        }
    }
}

impl FigureStyle {
    /// Untrimmed canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.inches_to_px(self.width_in), self.inches_to_px(self.height_in))
    }

    fn inches_to_px(&self, inches: f32) -> u32 {
        (inches * self.dpi as f32).round().max(1.0) as u32
    }

    fn points_to_px(&self, points: f32) -> f32 {
        points * self.dpi as f32 / 72.0
    }
}

/// Render `data` as a pseudocolor image with colorbar and title.
///
/// The color scale spans the min/max of unmasked values; masked pixels are
/// painted with the background color. The result is trimmed to the drawn
/// content plus `style.pad_in` of padding.
pub fn render_preview(data: &MaskedArray, style: &FigureStyle) -> Result<RgbaImage> {
    let font = Font::try_from_bytes(FONT_DATA).ok_or(PreviewError::FontLoad)?;
    let (canvas_w, canvas_h) = style.canvas_size();
    let mut canvas: RgbaImage = ImageBuffer::from_pixel(canvas_w, canvas_h, style.background);

    let scale = ColorScale::from_range(data.min_max());
    let (ticks, step) = nice_ticks(scale.vmin, scale.vmax, MAX_TICKS);
    let tick_labels: Vec<String> = ticks.iter().map(|&t| format_tick(t, step)).collect();

    let title_scale = Scale::uniform(style.points_to_px(style.title_pt));
    let label_scale = Scale::uniform(style.points_to_px(style.label_pt));

    // Horizontal budget to the right of the image
    let edge = style.inches_to_px(style.pad_in) as i32;
    let bar_gap = style.inches_to_px(0.2) as i32;
    let bar_w = style.inches_to_px(0.2) as i32;
    let tick_len = style.inches_to_px(0.05) as i32;
    let text_gap = style.inches_to_px(0.04) as i32;
    let widest_tick = tick_labels
        .iter()
        .map(|l| text_size(label_scale, &font, l).0)
        .max()
        .unwrap_or(0);
    let (_, label_h) = text_size(label_scale, &font, &style.colorbar_label);
    let reserved_right = bar_gap + bar_w + tick_len + text_gap + widest_tick + text_gap * 2 + label_h + edge;

    let (_, title_h) = text_size(title_scale, &font, &style.title);
    let axes_top = edge + title_h + title_h / 2;

    let avail = Rect::at(edge, axes_top).of_size(
        (canvas_w as i32 - edge - reserved_right).max(1) as u32,
        (canvas_h as i32 - axes_top - edge).max(1) as u32,
    );
    let image_rect = fit_image_rect(avail, data.shape());

    paint_raster(&mut canvas, image_rect, data, &scale, &style.colormap, style.background);

    // Colorbar, same height as the image
    let bar = Rect::at(image_rect.right() + 1 + bar_gap, image_rect.top()).of_size(bar_w as u32, image_rect.height());
    paint_colorbar(&mut canvas, bar, &style.colormap);
    draw_hollow_rect_mut(&mut canvas, bar, BLACK);

    let tick_x0 = (bar.right() + 1) as f32;
    let mut labels_right = bar.right() + 1 + tick_len;
    for (&value, label) in ticks.iter().zip(&tick_labels) {
        let frac = scale.normalize(value).clamp(0.0, 1.0);
        let y = bar.top() as f32 + ((1.0 - frac) * (bar.height() - 1) as f64) as f32;
        draw_line_segment_mut(&mut canvas, (tick_x0, y), (tick_x0 + tick_len as f32, y), BLACK);

        let (tw, th) = text_size(label_scale, &font, label);
        let tx = bar.right() + 1 + tick_len + text_gap;
        draw_text_mut(&mut canvas, BLACK, tx, y as i32 - th / 2, label_scale, &font, label);
        labels_right = labels_right.max(tx + tw);
    }

    // Colorbar label, reading bottom to top
    let (lw, lh) = text_size(label_scale, &font, &style.colorbar_label);
    let mut label_img: RgbaImage =
        ImageBuffer::from_pixel((lw + 2).max(1) as u32, (lh + 2).max(1) as u32, style.background);
    draw_text_mut(&mut label_img, BLACK, 1, 1, label_scale, &font, &style.colorbar_label);
    let rotated = imageops::rotate270(&label_img);
    let label_x = labels_right + text_gap * 2;
    let label_y = bar.top() + (bar.height() as i32 - rotated.height() as i32) / 2;
    imageops::overlay(&mut canvas, &rotated, i64::from(label_x), i64::from(label_y));

    // Title, centered over the image
    let (tw, _) = text_size(title_scale, &font, &style.title);
    let title_x = (image_rect.left() + image_rect.width() as i32 / 2 - tw / 2).max(edge);
    draw_text_mut(&mut canvas, BLACK, title_x, edge, title_scale, &font, &style.title);

    Ok(tight_crop(&canvas, style.background, edge as u32))
}

/// Largest rectangle with the array's aspect ratio, centered in `avail`.
fn fit_image_rect(avail: Rect, shape: (usize, usize)) -> Rect {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return avail;
    }

    let zoom = (avail.width() as f64 / cols as f64).min(avail.height() as f64 / rows as f64);
    let w = ((cols as f64 * zoom).round() as u32).clamp(1, avail.width());
    let h = ((rows as f64 * zoom).round() as u32).clamp(1, avail.height());
    let x = avail.left() + (avail.width() - w) as i32 / 2;
    let y = avail.top() + (avail.height() - h) as i32 / 2;
    Rect::at(x, y).of_size(w, h)
}

/// Nearest-neighbour paint of `data` into `rect`.
fn paint_raster(
    canvas: &mut RgbaImage,
    rect: Rect,
    data: &MaskedArray,
    scale: &ColorScale,
    colormap: &Colormap,
    background: Rgba<u8>,
) {
    let (rows, cols) = data.shape();
    let (w, h) = (rect.width(), rect.height());

    for py in 0..h {
        let cy = rect.top() + py as i32;
        if cy < 0 || cy >= canvas.height() as i32 {
            continue;
        }
        let row = ((py as f64 + 0.5) * rows as f64 / h as f64) as usize;
        for px in 0..w {
            let cx = rect.left() + px as i32;
            if cx < 0 || cx >= canvas.width() as i32 {
                continue;
            }
            let col = ((px as f64 + 0.5) * cols as f64 / w as f64) as usize;
            let color = match data.get(row, col) {
                Some(v) => colormap.color_at(scale.normalize(v)),
                None => background,
            };
            canvas.put_pixel(cx as u32, cy as u32, color);
        }
    }
}

/// Vertical color ramp, low values at the bottom.
fn paint_colorbar(canvas: &mut RgbaImage, bar: Rect, colormap: &Colormap) {
    let h = bar.height();
    for py in 0..h {
        let t = 1.0 - (py as f64 + 0.5) / h as f64;
        let color = colormap.color_at(t);
        let y = bar.top() + py as i32;
        for x in bar.left()..=bar.right() {
            if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Evenly spaced "round" tick values inside `[vmin, vmax]`, and their step.
fn nice_ticks(vmin: f64, vmax: f64, max_ticks: usize) -> (Vec<f64>, f64) {
    let range = vmax - vmin;
    if range.is_nan() || range <= 0.0 || range.is_infinite() || max_ticks == 0 {
        return (vec![vmin], 1.0);
    }

    let raw = range / max_ticks as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let nice = match raw / magnitude {
        n if n <= 1.0 => 1.0,
        n if n <= 2.0 => 2.0,
        n if n <= 2.5 => 2.5,
        n if n <= 5.0 => 5.0,
        _ => 10.0,
    };
    let step = nice * magnitude;

    let first = (vmin / step).ceil() as i64;
    let last = (vmax / step + 1e-9).floor() as i64;
    let ticks = (first..=last).map(|i| i as f64 * step).collect();
    (ticks, step)
}

/// Format a tick with just enough decimals to distinguish `step`.
fn format_tick(value: f64, step: f64) -> String {
    let mut decimals = 0usize;
    while decimals < 6 {
        let scaled = step * 10f64.powi(decimals as i32);
        if (scaled - scaled.round()).abs() < 1e-6 * scaled.abs().max(1.0) {
            break;
        }
        decimals += 1;
    }
    let text = format!("{:.*}", decimals, value);
    // Avoid "-0" / "-0.0"
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

/// Crop to the bounding box of non-background pixels, plus `pad` pixels.
fn tight_crop(canvas: &RgbaImage, background: Rgba<u8>, pad: u32) -> RgbaImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in canvas.enumerate_pixels() {
        if *pixel != background {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return canvas.clone();
    };

    let left = x0.saturating_sub(pad);
    let top = y0.saturating_sub(pad);
    let right = (x1 + pad).min(canvas.width() - 1);
    let bottom = (y1 + pad).min(canvas.height() - 1);
    imageops::crop_imm(canvas, left, top, right - left + 1, bottom - top + 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterArray;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_nice_ticks() {
        let (ticks, step) = nice_ticks(0.0, 30.0, 6);
        assert_eq!(step, 5.0);
        assert_eq!(ticks, vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0]);

        let (ticks, step) = nice_ticks(3.0, 12.5, 6);
        assert_eq!(step, 2.0);
        assert_eq!(ticks, vec![4.0, 6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn test_nice_ticks_degenerate() {
        let (ticks, _) = nice_ticks(5.0, 5.0, 6);
        assert_eq!(ticks, vec![5.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(10.0, 5.0), "10");
        assert_eq!(format_tick(0.4, 0.2), "0.4");
        assert_eq!(format_tick(7.5, 2.5), "7.5");
        assert_eq!(format_tick(-0.0, 0.2), "0.0");
    }

    #[test]
    fn test_fit_image_rect_keeps_aspect() {
        let avail = Rect::at(10, 20).of_size(400, 200);

        let square = fit_image_rect(avail, (100, 100));
        assert_eq!((square.width(), square.height()), (200, 200));
        assert_eq!((square.left(), square.top()), (110, 20));

        let wide = fit_image_rect(avail, (10, 100));
        assert_eq!((wide.width(), wide.height()), (400, 40));
    }

    #[test]
    fn test_paint_raster_masks_to_background() {
        // 2x2: one masked corner, min and max present.
        let array = RasterArray::new(vec![-9999.0, 0.0, 5.0, 10.0], 2, 2);
        let data = MaskedArray::masked_equal(array, Some(-9999.0));
        let scale = ColorScale::from_range(data.min_max());
        let cmap = Colormap::viridis();
        let mut canvas: RgbaImage = ImageBuffer::from_pixel(4, 4, WHITE);

        paint_raster(&mut canvas, Rect::at(0, 0).of_size(4, 4), &data, &scale, &cmap, WHITE);

        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(1, 1), WHITE);
        assert_eq!(*canvas.get_pixel(3, 0), cmap.color_at(0.0));
        assert_eq!(*canvas.get_pixel(0, 3), cmap.color_at(0.5));
        assert_eq!(*canvas.get_pixel(3, 3), cmap.color_at(1.0));
    }

    #[test]
    fn test_colorbar_low_at_bottom() {
        let cmap = Colormap::viridis();
        let mut canvas: RgbaImage = ImageBuffer::from_pixel(10, 100, WHITE);
        paint_colorbar(&mut canvas, Rect::at(2, 0).of_size(5, 100), &cmap);

        assert_eq!(*canvas.get_pixel(4, 99), cmap.color_at(1.0 - 99.5 / 100.0));
        assert_eq!(*canvas.get_pixel(4, 0), cmap.color_at(1.0 - 0.5 / 100.0));
        assert_eq!(*canvas.get_pixel(0, 50), WHITE);
    }

    #[test]
    fn test_tight_crop() {
        let mut canvas: RgbaImage = ImageBuffer::from_pixel(100, 100, WHITE);
        canvas.put_pixel(50, 50, BLACK);
        canvas.put_pixel(60, 55, BLACK);

        let cropped = tight_crop(&canvas, WHITE, 5);
        assert_eq!(cropped.dimensions(), (21, 16));
        assert_eq!(*cropped.get_pixel(5, 5), BLACK);

        // Padding is clamped at the canvas edge.
        let mut corner: RgbaImage = ImageBuffer::from_pixel(20, 20, WHITE);
        corner.put_pixel(0, 0, BLACK);
        assert_eq!(tight_crop(&corner, WHITE, 5).dimensions(), (6, 6));
    }

    #[test]
    fn test_tight_crop_blank_canvas_unchanged() {
        let canvas: RgbaImage = ImageBuffer::from_pixel(30, 20, WHITE);
        assert_eq!(tight_crop(&canvas, WHITE, 5).dimensions(), (30, 20));
    }

    #[test]
    fn test_render_preview_trims_canvas() {
        let values: Vec<f64> = (0..100 * 100)
            .map(|i| if (i / 100 + i % 100) % 2 == 0 { -9999.0 } else { (i % 37) as f64 })
            .collect();
        let data = MaskedArray::masked_equal(RasterArray::new(values, 100, 100), Some(-9999.0));
        let style = FigureStyle::default();

        let image = render_preview(&data, &style).unwrap();
        let (w, h) = image.dimensions();

        assert_eq!(style.canvas_size(), (1500, 1200));
        assert!(w > 0 && w < 1500, "width {}", w);
        assert!(h > 0 && h <= 1200, "height {}", h);
        // The lowest and highest colors both appear in the render.
        let cmap = Colormap::viridis();
        assert!(image.pixels().any(|p| *p == cmap.color_at(0.0)));
        assert!(image.pixels().any(|p| *p == cmap.color_at(1.0)));
    }

    #[test]
    fn test_render_preview_all_masked() {
        let data = MaskedArray::masked_equal(RasterArray::new(vec![-1.0; 50 * 40], 50, 40), Some(-1.0));
        let image = render_preview(&data, &FigureStyle::default()).unwrap();
        assert!(image.width() > 0 && image.height() > 0);
    }
}
