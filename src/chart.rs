//! Two-panel pie chart of sentiment and emotion counts

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::analysis::{AnalysisSummary, LabelCount};
use crate::error::ChartError;

pub const POSITIVE_COLOR: RGBColor = RGBColor(144, 238, 144);
pub const NEGATIVE_COLOR: RGBColor = RGBColor(250, 128, 114);
pub const NEUTRAL_COLOR: RGBColor = RGBColor(173, 216, 230);
pub const OTHER_COLOR: RGBColor = RGBColor(128, 128, 128);

const PLACEHOLDER_COLOR: RGBColor = RGBColor(200, 200, 200);

/// Categorical palette for emotion wedges (tab10)
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Angle of the first wedge edge, degrees counter-clockwise from 3 o'clock
const START_ANGLE_DEG: f64 = 140.0;

/// One wedge, also used as a legend row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
    pub percent_label: String,
    pub color: String,
    pub rgb: [u8; 3],
}

/// Wedges drawn in each panel
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanels {
    pub sentiment: Vec<PieSlice>,
    pub emotion: Vec<PieSlice>,
}

pub fn sentiment_color(label: &str) -> RGBColor {
    match label {
        "positive" => POSITIVE_COLOR,
        "negative" => NEGATIVE_COLOR,
        "neutral" => NEUTRAL_COLOR,
        _ => OTHER_COLOR,
    }
}

pub fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

pub fn build_slices(counts: &[LabelCount], color_for: impl Fn(usize, &str) -> RGBColor) -> Vec<PieSlice> {
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return Vec::new();
    }

    counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            let percent = count.count as f64 * 100.0 / total as f64;
            let RGBColor(r, g, b) = color_for(index, &count.label);
            PieSlice {
                label: count.label.clone(),
                count: count.count,
                percent,
                percent_label: format!("{:.1}%", percent),
                color: format!("#{:02x}{:02x}{:02x}", r, g, b),
                rgb: [r, g, b],
            }
        })
        .collect()
}

pub fn sentiment_slices(summary: &AnalysisSummary) -> Vec<PieSlice> {
    build_slices(&summary.sentiment_counts, |_, label| sentiment_color(label))
}

pub fn emotion_slices(summary: &AnalysisSummary) -> Vec<PieSlice> {
    build_slices(&summary.emotion_counts, |index, _| palette_color(index))
}

/// Polygon approximating one wedge: the centre followed by arc points
pub fn wedge_points(center: (i32, i32), radius: f64, start_deg: f64, sweep_deg: f64) -> Vec<(i32, i32)> {
    let steps = (sweep_deg.abs().ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);

    for step in 0..=steps {
        let angle = (start_deg + sweep_deg * step as f64 / steps as f64).to_radians();
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 - (radius * angle.sin()).round() as i32,
        ));
    }

    points
}

fn render_error<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

static FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const FONT_FAMILY: &str = "sans-serif";

pub const SENTIMENT_TITLE: &str = "Sentiment Distribution";
pub const EMOTION_TITLE: &str = "Emotion Distribution (Non-Neutral)";
const NO_SENTIMENT_TEXT: &str = "No sentiment data";
const NO_EMOTION_TEXT: &str = "No emotion data (all sentiments neutral)";

/// Register the embedded font with plotters once per process
fn ensure_font() -> Result<(), ChartError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).map_err(|_| "invalid font data".to_string()))
        .clone()
        .map_err(ChartError::Render)
}

fn centered_text(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT_FAMILY, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

fn pie_geometry<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> ((i32, i32), f64) {
    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    (center, width.min(height) as f64 * 0.35)
}

/// Point at `fraction` of the radius along the wedge bisector
fn polar_point(center: (i32, i32), radius: f64, angle_deg: f64, fraction: f64) -> (i32, i32) {
    let angle = angle_deg.to_radians();
    (
        center.0 + (radius * fraction * angle.cos()).round() as i32,
        center.1 - (radius * fraction * angle.sin()).round() as i32,
    )
}

fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, slices: &[PieSlice]) -> Result<(), ChartError> {
    let (center, radius) = pie_geometry(area);
    let label_size = (radius / 9.0).clamp(10.0, 22.0) as u32;
    let mut start = START_ANGLE_DEG;

    for slice in slices {
        let sweep = 360.0 * slice.percent / 100.0;
        let [r, g, b] = slice.rgb;
        area.draw(&Polygon::new(
            wedge_points(center, radius, start, sweep),
            RGBColor(r, g, b).filled(),
        ))
        .map_err(render_error)?;

        let middle = start + sweep / 2.0;
        area.draw(&Text::new(
            slice.label.clone(),
            polar_point(center, radius, middle, 1.2),
            centered_text(label_size),
        ))
        .map_err(render_error)?;
        area.draw(&Text::new(
            slice.percent_label.clone(),
            polar_point(center, radius, middle, 0.6),
            centered_text(label_size),
        ))
        .map_err(render_error)?;

        start += sweep;
    }

    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, message: &str) -> Result<(), ChartError> {
    let (center, radius) = pie_geometry(area);
    area.draw(&Circle::new(center, radius as i32, PLACEHOLDER_COLOR.stroke_width(2)))
        .map_err(render_error)?;
    area.draw(&Text::new(message.to_string(), center, centered_text(18)))
        .map_err(render_error)?;
    Ok(())
}

/// Render the sentiment pie (left) and the non-neutral emotion pie (right)
/// into a PNG at `path`
pub fn render_analysis_chart(
    summary: &AnalysisSummary,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<ChartPanels, ChartError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ensure_font()?;

    let sentiment = sentiment_slices(summary);
    let emotion = emotion_slices(summary);

    {
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let panels = root.split_evenly((1, 2));
        let title_size = (height / 20).clamp(12, 32);
        let layout = [
            (SENTIMENT_TITLE, &sentiment, NO_SENTIMENT_TEXT),
            (EMOTION_TITLE, &emotion, NO_EMOTION_TEXT),
        ];

        for (panel, (title, slices, empty_message)) in panels.iter().zip(layout) {
            let panel = panel
                .titled(title, (FONT_FAMILY, title_size))
                .map_err(render_error)?;
            if slices.is_empty() {
                draw_placeholder(&panel, empty_message)?;
            } else {
                draw_pie(&panel, slices)?;
            }
        }

        root.present().map_err(render_error)?;
    }

    info!("📊 Chart saved to '{}'", path.display());
    Ok(ChartPanels { sentiment, emotion })
}
