//! Plot series bound to the profile table, and a headless renderer for it.

use crate::enums::{MarkerStyle, PlotType};
use crate::table::{DISTANCE_COLUMN, INTENSITY_COLUMN, Table};

use image::{Rgb, RgbImage};

/// Color given to profile series, as RGB fractions.
pub const PROFILE_COLOR: [f64; 3] = [0.0, 0.6, 1.0];

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: Rgb<u8> = Rgb([96, 96, 96]);
const MARGIN: u32 = 8;

/// X/Y series referring to two columns of a table by name.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSeries {
    name: String,
    table_name: Option<String>,
    x_column: String,
    y_column: String,
    plot_type: PlotType,
    marker_style: MarkerStyle,
    color: [f64; 3],
}

impl PlotSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            x_column: String::new(),
            y_column: String::new(),
            plot_type: PlotType::default(),
            marker_style: MarkerStyle::default(),
            color: [0.0, 0.0, 0.0],
        }
    }

    pub fn with_plot_type(mut self, plot_type: PlotType) -> Self {
        self.plot_type = plot_type;
        self
    }

    pub fn with_marker_style(mut self, marker_style: MarkerStyle) -> Self {
        self.marker_style = marker_style;
        self
    }

    pub fn with_color(mut self, color: [f64; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn x_column(&self) -> &str {
        &self.x_column
    }

    pub fn y_column(&self) -> &str {
        &self.y_column
    }

    pub fn plot_type(&self) -> PlotType {
        self.plot_type
    }

    pub fn marker_style(&self) -> MarkerStyle {
        self.marker_style
    }

    pub fn color(&self) -> [f64; 3] {
        self.color
    }

    /// Paired `(x, y)` values read from `table`, or `None` when the series is
    /// not bound to it or a column is missing.
    pub fn points(&self, table: &Table) -> Option<Vec<(f64, f64)>> {
        if self.table_name.as_deref() != Some(table.name()) {
            return None;
        }
        let xs = table.column_values(&self.x_column)?;
        let ys = table.column_values(&self.y_column)?;
        Some(xs.iter().copied().zip(ys.iter().copied()).collect())
    }
}

/// Chart container listing the series it shows, by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotChart {
    series: Vec<String>,
}

impl PlotChart {
    pub fn series(&self) -> &[String] {
        &self.series
    }

    /// Adds the series unless it is already shown.
    pub fn add_series(&mut self, series: &PlotSeries) {
        if !self.series.iter().any(|name| name == series.name()) {
            self.series.push(series.name().to_owned());
        }
    }
}

/// Points `series` at the profile columns of `table` and applies the profile
/// style.
pub fn bind_chart(table: &Table, series: &mut PlotSeries) {
    series.table_name = Some(table.name().to_owned());
    series.x_column = DISTANCE_COLUMN.to_owned();
    series.y_column = INTENSITY_COLUMN.to_owned();
    series.plot_type = PlotType::Scatter;
    series.marker_style = MarkerStyle::None;
    series.color = PROFILE_COLOR;
}

/// Draws the series into a `width` x `height` image with the axes fitted to
/// its data range. Returns `None` for an unbound series, a missing column or
/// an image too small to hold a plot area.
pub fn render_series(
    table: &Table,
    series: &PlotSeries,
    width: u32,
    height: u32,
) -> Option<RgbImage> {
    if width <= 2 * MARGIN + 1 || height <= 2 * MARGIN + 1 {
        return None;
    }
    let points = series.points(table)?;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let left = MARGIN;
    let right = width - MARGIN - 1;
    let top = MARGIN;
    let bottom = height - MARGIN - 1;
    draw_segment(&mut img, (left, bottom), (right, bottom), AXIS_COLOR);
    draw_segment(&mut img, (left, top), (left, bottom), AXIS_COLOR);

    let finite: Vec<(f64, f64)> = points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if finite.is_empty() {
        return Some(img);
    }

    let (x_min, x_max) = range(finite.iter().map(|p| p.0));
    let (y_min, y_max) = range(finite.iter().map(|p| p.1));
    let to_pixel = |(x, y): (f64, f64)| -> (u32, u32) {
        let fx = (x - x_min) / (x_max - x_min);
        let fy = (y - y_min) / (y_max - y_min);
        let px = left as f64 + fx * (right - left) as f64;
        let py = bottom as f64 - fy * (bottom - top) as f64;
        (px.round() as u32, py.round() as u32)
    };

    let color = to_rgb(series.color());
    let pixels: Vec<(u32, u32)> = finite.into_iter().map(to_pixel).collect();
    match series.plot_type() {
        PlotType::Bar => {
            for &(px, py) in &pixels {
                draw_segment(&mut img, (px, bottom), (px, py), color);
            }
        }
        PlotType::Line | PlotType::Scatter => {
            if let [only] = pixels.as_slice() {
                img.put_pixel(only.0, only.1, color);
            }
            for pair in pixels.windows(2) {
                draw_segment(&mut img, pair[0], pair[1], color);
            }
        }
    }
    if series.marker_style() != MarkerStyle::None {
        for &(px, py) in &pixels {
            draw_marker(&mut img, px, py, series.marker_style(), color);
        }
    }

    Some(img)
}

/// Data range, widened around a constant value so it can be normalized.
fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if max - min > f64::EPSILON * max.abs().max(1.0) {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn to_rgb(color: [f64; 3]) -> Rgb<u8> {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([channel(color[0]), channel(color[1]), channel(color[2])])
}

fn put_pixel_checked(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

// Bresenham
fn draw_segment(img: &mut RgbImage, from: (u32, u32), to: (u32, u32), color: Rgb<u8>) {
    let (mut x0, mut y0) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel_checked(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_marker(img: &mut RgbImage, x: u32, y: u32, style: MarkerStyle, color: Rgb<u8>) {
    let (x, y) = (i64::from(x), i64::from(y));
    for dy in -2i64..=2 {
        for dx in -2i64..=2 {
            let hit = match style {
                MarkerStyle::None => false,
                MarkerStyle::Square => true,
                MarkerStyle::Circle => dx * dx + dy * dy <= 4,
                MarkerStyle::Cross => dx == dy || dx == -dy,
            };
            if hit {
                put_pixel_checked(img, x + dx, y + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_table() -> Table {
        let mut table = Table::new("profile");
        let d = table.column_index_or_insert(DISTANCE_COLUMN);
        let i = table.column_index_or_insert(INTENSITY_COLUMN);
        table.set_number_of_rows(3);
        for row in 0..3 {
            table.set_value(d, row, row as f64).expect("row exists");
            table.set_value(i, row, 10.0 * row as f64).expect("row exists");
        }
        table
    }

    #[test]
    fn binding_applies_profile_style() {
        let table = profile_table();
        let mut series = PlotSeries::new("profile series");
        bind_chart(&table, &mut series);

        assert_eq!(series.table_name(), Some("profile"));
        assert_eq!(series.x_column(), DISTANCE_COLUMN);
        assert_eq!(series.y_column(), INTENSITY_COLUMN);
        assert_eq!(series.plot_type(), PlotType::Scatter);
        assert_eq!(series.marker_style(), MarkerStyle::None);
        assert_eq!(series.color(), PROFILE_COLOR);
        assert_eq!(
            series.points(&table),
            Some(vec![(0.0, 0.0), (1.0, 10.0), (2.0, 20.0)])
        );
    }

    #[test]
    fn unbound_series_has_no_points() {
        let table = profile_table();
        assert!(PlotSeries::new("loose").points(&table).is_none());
        assert!(render_series(&table, &PlotSeries::new("loose"), 64, 48).is_none());
    }

    #[test]
    fn chart_does_not_duplicate_series() {
        let mut chart = PlotChart::default();
        let series = PlotSeries::new("a");
        chart.add_series(&series);
        chart.add_series(&series);
        assert_eq!(chart.series(), ["a".to_owned()]);
    }

    #[test]
    fn render_fits_series_to_plot_area() {
        let table = profile_table();
        let mut series = PlotSeries::new("s");
        bind_chart(&table, &mut series);
        let img = render_series(&table, &series, 64, 48).expect("bound series renders");

        let color = to_rgb(PROFILE_COLOR);
        // first sample at the lower-left, last at the upper-right corner
        assert_eq!(*img.get_pixel(MARGIN, 48 - MARGIN - 1), color);
        assert_eq!(*img.get_pixel(64 - MARGIN - 1, MARGIN), color);
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    /// Series bound to the profile columns of `table`, then restyled.
    fn restyled(table: &Table, plot_type: PlotType, marker_style: MarkerStyle) -> PlotSeries {
        let mut series = PlotSeries::new("s");
        bind_chart(table, &mut series);
        series.with_plot_type(plot_type).with_marker_style(marker_style)
    }

    #[test]
    fn binding_resets_custom_style() {
        let table = profile_table();
        let mut series = PlotSeries::new("s")
            .with_plot_type(PlotType::Bar)
            .with_marker_style(MarkerStyle::Cross)
            .with_color([1.0, 0.0, 0.0]);
        bind_chart(&table, &mut series);
        assert_eq!(series.plot_type(), PlotType::Scatter);
        assert_eq!(series.marker_style(), MarkerStyle::None);
        assert_eq!(series.color(), PROFILE_COLOR);
    }

    #[test]
    fn line_plot_connects_samples() {
        let table = profile_table();
        let series = restyled(&table, PlotType::Line, MarkerStyle::None);
        let img = render_series(&table, &series, 64, 48).expect("renders");
        let color = to_rgb(PROFILE_COLOR);
        // samples at x = 8, 32, 55 and y = 39, 24, 8; the midpoint lies on the line
        assert_eq!(*img.get_pixel(32, 24), color);
        assert_eq!(*img.get_pixel(32, 39), AXIS_COLOR);
    }

    #[test]
    fn bar_plot_fills_down_to_the_axis() {
        let table = profile_table();
        let series = restyled(&table, PlotType::Bar, MarkerStyle::None);
        let img = render_series(&table, &series, 64, 48).expect("renders");
        let color = to_rgb(PROFILE_COLOR);
        for y in 24..=39 {
            assert_eq!(*img.get_pixel(32, y), color, "bar gap at y = {y}");
        }
        // no segment between the bars
        assert_eq!(*img.get_pixel(20, 31), BACKGROUND);
    }

    #[test]
    fn markers_are_drawn_around_samples() {
        let table = profile_table();
        let color = to_rgb(PROFILE_COLOR);

        let square = restyled(&table, PlotType::Bar, MarkerStyle::Square);
        let img = render_series(&table, &square, 64, 48).expect("renders");
        assert_eq!(*img.get_pixel(34, 22), color);
        assert_eq!(*img.get_pixel(30, 26), color);

        let circle = restyled(&table, PlotType::Bar, MarkerStyle::Circle);
        let img = render_series(&table, &circle, 64, 48).expect("renders");
        assert_eq!(*img.get_pixel(34, 24), color);
        assert_eq!(*img.get_pixel(34, 22), BACKGROUND);

        let cross = restyled(&table, PlotType::Bar, MarkerStyle::Cross);
        let img = render_series(&table, &cross, 64, 48).expect("renders");
        assert_eq!(*img.get_pixel(34, 22), color);
        assert_eq!(*img.get_pixel(34, 23), BACKGROUND);
    }

    #[test]
    fn constant_range_is_widened() {
        assert_eq!(range([2.0, 2.0].into_iter()), (1.5, 2.5));
        assert_eq!(range([1.0, 3.0].into_iter()), (1.0, 3.0));
    }
}
