use crate::errors::ExportError;
use crate::models::{ChartKind, Coord, Series};
use serde::Serialize;
use std::collections::HashMap;

pub const SNAPSHOT_WIDTH: u32 = 800;
pub const SNAPSHOT_HEIGHT: u32 = 500;

const MARGIN: i64 = 40;
const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const AXIS: [u8; 4] = [180, 186, 192, 255];

/// What a container shows instead of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placeholder {
    Loading,
    NoData,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Placeholder(Placeholder),
    Plot { kind: ChartKind, series: Vec<Series> },
}

/// The charting backend. Containers are opaque ids; series are drawn as given.
pub trait Renderer: Send {
    fn draw(&mut self, container: &str, kind: ChartKind, series: &[Series]);

    fn show_placeholder(&mut self, container: &str, placeholder: Placeholder);

    fn clear(&mut self, container: &str);

    /// PNG of what the container currently shows.
    fn snapshot(&self, container: &str, width: u32, height: u32) -> Result<Vec<u8>, ExportError>;
}

/// In-memory surfaces that can be rasterised on demand.
#[derive(Debug, Default)]
pub struct Canvas {
    surfaces: HashMap<String, Surface>,
    draws: HashMap<String, u64>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self, container: &str) -> Option<&Surface> {
        self.surfaces.get(container)
    }

    pub fn draw_count(&self, container: &str) -> u64 {
        self.draws.get(container).copied().unwrap_or(0)
    }

    fn put(&mut self, container: &str, surface: Surface) {
        *self.draws.entry(container.to_string()).or_insert(0) += 1;
        self.surfaces.insert(container.to_string(), surface);
    }
}

impl Renderer for Canvas {
    fn draw(&mut self, container: &str, kind: ChartKind, series: &[Series]) {
        self.put(
            container,
            Surface::Plot {
                kind,
                series: series.to_vec(),
            },
        );
    }

    fn show_placeholder(&mut self, container: &str, placeholder: Placeholder) {
        self.put(container, Surface::Placeholder(placeholder));
    }

    fn clear(&mut self, container: &str) {
        self.surfaces.remove(container);
        self.draws.remove(container);
    }

    fn snapshot(&self, container: &str, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
        match self.surfaces.get(container) {
            Some(Surface::Plot { kind, series }) => {
                let mut image = Raster::new(width, height);
                image.plot(*kind, series);
                image.encode()
            }
            Some(Surface::Placeholder(_)) => Err(ExportError::NotRendered(container.to_string())),
            None => Err(ExportError::UnknownContainer(container.to_string())),
        }
    }
}

struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    fn new(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&BACKGROUND);
        }
        Self { width, height, pixels }
    }

    fn set(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.pixels[offset..offset + 4].copy_from_slice(&color);
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.set(x, y, color);
            }
        }
    }

    fn line(&mut self, (mut x0, mut y0): (i64, i64), (x1, y1): (i64, i64), color: [u8; 4]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set(x0, y0, color);
            self.set(x0, y0 + 1, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x0 += sx;
            }
            if doubled <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn plot_area(&self) -> (i64, i64, i64, i64) {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        (MARGIN, MARGIN, (w - MARGIN).max(MARGIN + 1), (h - MARGIN).max(MARGIN + 1))
    }

    fn axes(&mut self) {
        let (left, top, right, bottom) = self.plot_area();
        self.line((left, top), (left, bottom), AXIS);
        self.line((left, bottom), (right, bottom), AXIS);
    }

    fn plot(&mut self, kind: ChartKind, series: &[Series]) {
        match kind {
            ChartKind::TimeSeries => self.lines(series),
            ChartKind::Correlation => self.heatmap(series),
            ChartKind::Categorical | ChartKind::Geographic | ChartKind::Radar | ChartKind::Gauge => {
                self.bars(series)
            }
        }
    }

    fn lines(&mut self, series: &[Series]) {
        self.axes();
        let years: Vec<i32> = series
            .iter()
            .flat_map(|series| series.points.iter())
            .filter_map(|point| match point.x {
                Coord::Year(year) => Some(year),
                Coord::Label(_) => None,
            })
            .collect();
        let (Some(&first), Some(&last)) = (years.iter().min(), years.iter().max()) else {
            return;
        };
        let peak = peak(series);
        let (left, top, right, bottom) = self.plot_area();
        let span = i64::from((last - first).max(1));

        for series in series {
            let color = parse_color(&series.color);
            let mut previous = None;
            for point in &series.points {
                let Coord::Year(year) = point.x else { continue };
                let x = left + (right - left) * i64::from(year - first) / span;
                let y = bottom - scale(point.y, peak, bottom - top);
                if let Some(from) = previous {
                    self.line(from, (x, y), color);
                }
                previous = Some((x, y));
            }
        }
    }

    fn bars(&mut self, series: &[Series]) {
        self.axes();
        let mut categories: Vec<String> = Vec::new();
        for point in series.iter().flat_map(|series| series.points.iter()) {
            let label = point.x.to_string();
            if !categories.contains(&label) {
                categories.push(label);
            }
        }
        if categories.is_empty() {
            return;
        }

        let peak = peak(series);
        let (left, top, right, bottom) = self.plot_area();
        let slot = ((right - left) / categories.len() as i64).max(1);
        let bar = (slot / (series.len() as i64 + 1)).max(1);

        for (index, series) in series.iter().enumerate() {
            let color = parse_color(&series.color);
            for point in &series.points {
                let Some(category) = categories.iter().position(|label| *label == point.x.to_string()) else {
                    continue;
                };
                let x = left + slot * category as i64 + bar * index as i64 + bar / 2;
                let height = scale(point.y, peak, bottom - top);
                self.fill_rect(x, bottom - height, x + bar, bottom, color);
            }
        }
    }

    fn heatmap(&mut self, series: &[Series]) {
        let rows = series.len() as i64;
        let columns = series.iter().map(|series| series.points.len()).max().unwrap_or(0) as i64;
        if rows == 0 || columns == 0 {
            return;
        }
        let (left, top, right, bottom) = self.plot_area();
        let cell_w = ((right - left) / columns).max(1);
        let cell_h = ((bottom - top) / rows).max(1);
        let low = parse_color("#ECF0F1");
        let high = parse_color("#2C3E50");

        for (row, series) in series.iter().enumerate() {
            for (column, point) in series.points.iter().enumerate() {
                let t = point.y.clamp(0.0, 1.0);
                let mut color = [0u8, 0, 0, 255];
                for channel in 0..3 {
                    color[channel] =
                        (f64::from(low[channel]) + (f64::from(high[channel]) - f64::from(low[channel])) * t) as u8;
                }
                let x = left + cell_w * column as i64;
                let y = top + cell_h * row as i64;
                self.fill_rect(x, y, x + cell_w - 1, y + cell_h - 1, color);
            }
        }
    }

    fn encode(self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder
                .write_header()
                .map_err(|err| ExportError::Encode(err.to_string()))?
                .write_image_data(&self.pixels)
                .map_err(|err| ExportError::Encode(err.to_string()))?;
        }
        Ok(buffer)
    }
}

fn peak(series: &[Series]) -> f64 {
    series
        .iter()
        .flat_map(|series| series.points.iter())
        .map(|point| point.y)
        .fold(0.0, f64::max)
}

fn scale(value: f64, peak: f64, extent: i64) -> i64 {
    if peak <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value.max(0.0) / peak) * extent as f64).round() as i64
}

/// `#RRGGBB` to RGBA; anything else falls back to mid grey.
pub fn parse_color(hex: &str) -> [u8; 4] {
    let digits = hex.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    match (digits.len(), channel(0..2), channel(2..4), channel(4..6)) {
        (6, Some(r), Some(g), Some(b)) => [r, g, b, 255],
        _ => [128, 128, 128, 255],
    }
}
