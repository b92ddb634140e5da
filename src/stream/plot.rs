use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::stream::error::StreamError;
use crate::stream::sink::{ArtifactFormat, ChartRenderer};
use crate::stream::Batch;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            background: WHITE,
            palette: vec![BLUE, RED, GREEN, MAGENTA, CYAN, BLACK],
        }
    }
}
fn y_bounds(batch: &Batch) -> (f64, f64) {
    let (lo, hi) = batch
        .iter()
        .flat_map(|s| s.values().iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (-1.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}
/// Draws one line per channel against sample index. No text is drawn, so no
/// font backend is needed.
fn draw_batch<DB>(root: DrawingArea<DB, Shift>, batch: &Batch, style: &PlotStyle) -> Result<(), StreamError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&style.background)?;
    let (y_min, y_max) = y_bounds(batch);
    let x_max = batch.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?;
    let channel_count = batch.samples().first().map_or(0, |s| s.channel_count());
    for idx in 0..channel_count {
        let color = style.palette[idx % style.palette.len()];
        let series = batch
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value(idx).map(|v| (i as f64, v)));
        chart.draw_series(LineSeries::new(series, &color))?;
    }
    root.present()?;
    Ok(())
}
fn check_renderable(batch: &Batch, style: &PlotStyle) -> Result<(), StreamError> {
    if batch.is_empty() {
        return Err(StreamError::Plot("batch has no samples".into()));
    }
    if style.width == 0 || style.height == 0 || style.palette.is_empty() {
        return Err(StreamError::Plot("plot style has no drawable area".into()));
    }
    Ok(())
}
/// Largest raster the PNG renderer will allocate (RGB, 3 bytes per pixel).
pub const MAX_RASTER_PIXELS: usize = 8192 * 8192;
fn raster_len(style: &PlotStyle) -> Result<usize, StreamError> {
    (style.width as usize)
        .checked_mul(style.height as usize)
        .filter(|pixels| *pixels <= MAX_RASTER_PIXELS)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| {
            StreamError::Plot(format!(
                "{}x{} raster exceeds {MAX_RASTER_PIXELS} pixels",
                style.width, style.height
            ))
        })
}
pub fn render_batch_png(batch: &Batch, style: &PlotStyle) -> Result<Vec<u8>, StreamError> {
    check_renderable(batch, style)?;
    let mut buffer = vec![0u8; raster_len(style)?];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        draw_batch(root, batch, style)?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_batch_svg(batch: &Batch, style: &PlotStyle) -> Result<String, StreamError> {
    check_renderable(batch, style)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height))
            .into_drawing_area();
        draw_batch(root, batch, style)?;
    }
    Ok(svg)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, StreamError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| StreamError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
/// Primary chart format.
#[derive(Clone, Debug, Default)]
pub struct PngRenderer {
    pub style: PlotStyle,
}
impl ChartRenderer for PngRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Png
    }
    fn render(&self, batch: &Batch, path: &Path) -> Result<(), StreamError> {
        let png = render_batch_png(batch, &self.style)?;
        fs::write(path, png)?;
        Ok(())
    }
}
/// Lightweight fallback: plain SVG text, no raster encoder involved.
#[derive(Clone, Debug, Default)]
pub struct SvgRenderer {
    pub style: PlotStyle,
}
impl ChartRenderer for SvgRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Svg
    }
    fn render(&self, batch: &Batch, path: &Path) -> Result<(), StreamError> {
        let svg = render_batch_svg(batch, &self.style)?;
        fs::write(path, svg)?;
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::CsvTable;
    use crate::stream::sink::tests::scratch_dir;
    use crate::stream::{BatchSink, ChannelSet, FileSink, Sample};
    use chrono::Local;
    fn wave(n: usize) -> Batch {
        (0..n)
            .map(|i| {
                let t = i as f64 * 0.1;
                Sample::new(Local::now(), vec![t.sin(), t.cos(), 0.5])
            })
            .collect::<Vec<_>>()
            .into()
    }
    fn small() -> PlotStyle {
        PlotStyle {
            width: 160,
            height: 90,
            ..PlotStyle::default()
        }
    }
    #[test]
    fn png_has_signature() {
        let png = render_batch_png(&wave(64), &small()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
    #[test]
    fn svg_contains_line_paths() {
        let svg = render_batch_svg(&wave(64), &small()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polyline"));
    }
    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            render_batch_png(&Batch::default(), &small()),
            Err(StreamError::Plot(_))
        ));
        assert!(render_batch_svg(&Batch::default(), &small()).is_err());
    }
    #[test]
    fn flat_or_single_sample_batches_still_render() {
        let flat: Batch = vec![Sample::new(Local::now(), vec![2.0])].into();
        assert!(!render_batch_png(&flat, &small()).unwrap().is_empty());
        assert_eq!(y_bounds(&flat), (1.0, 3.0));
    }
    #[test]
    fn oversized_raster_is_an_error_not_a_panic() {
        let huge = PlotStyle {
            width: 40_000,
            height: 40_000,
            ..PlotStyle::default()
        };
        assert!(matches!(
            render_batch_png(&wave(4), &huge),
            Err(StreamError::Plot(_))
        ));
        let wide = PlotStyle {
            width: u32::MAX,
            height: u32::MAX,
            ..PlotStyle::default()
        };
        assert!(render_batch_png(&wave(4), &wide).is_err());
    }
    #[test]
    fn oversized_png_falls_back_to_svg() {
        let dir = scratch_dir("plot-huge");
        let style = PlotStyle {
            width: 40_000,
            height: 40_000,
            ..PlotStyle::default()
        };
        let sink = FileSink::new(
            &dir,
            "accel",
            Box::new(CsvTable::new(ChannelSet::xyz())),
            Box::new(PngRenderer { style: style.clone() }),
            Box::new(SvgRenderer { style }),
        );
        let report = sink.persist(&wave(4)).unwrap();
        assert!(report.artifact.is_fallback());
        assert_eq!(report.artifact.file().unwrap().format, ArtifactFormat::Svg);
        std::fs::remove_dir_all(dir).ok();
    }
}
