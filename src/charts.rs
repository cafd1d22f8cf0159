//! PNG charts for the dashboard views.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::{DashboardError, Result};

const CHART_SIZE: (u32, u32) = (1600, 1200);

pub const WEEKDAY_COLOUR: RGBColor = RGBColor(0, 0, 255);
pub const WEEKEND_COLOUR: RGBColor = RGBColor(255, 0, 0);
pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const SALMON: RGBColor = RGBColor(250, 128, 114);

/// Cycled over scatter groups, one colour per metro line.
pub const GROUP_COLOURS: [RGBColor; 12] = [
    RGBColor(255, 0, 0),
    RGBColor(0, 0, 255),
    RGBColor(0, 128, 0),
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
    RGBColor(0, 128, 128),
    RGBColor(255, 192, 203),
    RGBColor(128, 128, 0),
    RGBColor(0, 0, 0),
    RGBColor(165, 42, 42),
    RGBColor(0, 255, 255),
    RGBColor(255, 215, 0),
];

/// One named line on a time series chart.
pub struct Series {
    pub label: String,
    pub colour: RGBColor,
    pub points: Vec<(i32, f64)>,
}

fn render(path: &Path, draw: impl FnOnce(&Path) -> std::result::Result<(), Box<dyn Error>>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| DashboardError::io(parent, err))?;
    }
    draw(path).map_err(|err| DashboardError::Chart {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

/// Upper y bound with 10% headroom, never below 1.
fn headroom(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Vertical bar chart, one labelled bar per entry, in the given order.
pub fn bar_chart(
    path: &Path,
    caption: &str,
    y_desc: &str,
    data: &[(String, f64)],
    colour: RGBColor,
) -> Result<()> {
    render(path, |path| {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let max_value = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let min_value = data.iter().map(|(_, v)| *v).fold(0.0, f64::min);

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 50))
            .margin(60)
            .x_label_area_size(100)
            .y_label_area_size(120)
            .build_cartesian_2d(0..data.len(), min_value * 1.1..headroom(max_value))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(data.len())
            .x_label_formatter(&|idx| data.get(*idx).map_or(String::new(), |(label, _)| label.clone()))
            .y_desc(y_desc)
            .label_style(("sans-serif", 30))
            .draw()?;

        for (i, (_, value)) in data.iter().enumerate() {
            chart.draw_series(std::iter::once(Rectangle::new(
                [(i, 0.0), (i + 1, *value)],
                colour.filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.3}", value),
                (i, *value + max_value / 50.0),
                ("sans-serif", 30).into_font().color(&BLACK),
            ).into_dyn()))?;
        }
        root.present()?;
        Ok(())
    })
}

/// Line chart with markers over the 24 hours of a day.
pub fn hourly_chart(path: &Path, caption: &str, y_desc: &str, series: &[Series]) -> Result<()> {
    render(path, |path| {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let max_hourly = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, v)| *v))
            .fold(0.0, f64::max);
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 50))
            .margin(60)
            .set_label_area_size(LabelAreaPosition::Left, 120)
            .set_label_area_size(LabelAreaPosition::Bottom, 80)
            .build_cartesian_2d(0..23, 0.0..headroom(max_hourly))?;

        chart
            .configure_mesh()
            .x_labels(24)
            .x_desc("Hour of Day")
            .y_desc(y_desc)
            .label_style(("sans-serif", 30))
            .draw()?;

        for s in series {
            let colour = s.colour;
            chart.draw_series(LineSeries::new(s.points.clone(), colour.stroke_width(3)))?;
            chart
                .draw_series(s.points.iter().map(|&point| Circle::new(point, 7, colour.filled())))?
                .label(s.label.as_str())
                .legend(move |(x, y)| Circle::new((x + 10, y), 7, colour.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 30))
            .draw()?;
        root.present()?;
        Ok(())
    })
}

/// Histogram from `(bin_start, bin_end, count)` triples.
pub fn histogram_chart(path: &Path, caption: &str, x_desc: &str, bins: &[(f64, f64, usize)]) -> Result<()> {
    render(path, |path| {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let x_min = bins.first().map_or(0.0, |b| b.0);
        let x_max = bins.last().map_or(1.0, |b| b.1);
        let max_count = bins.iter().map(|b| b.2).max().unwrap_or(0);
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 50))
            .margin(60)
            .set_label_area_size(LabelAreaPosition::Left, 100)
            .set_label_area_size(LabelAreaPosition::Bottom, 80)
            .build_cartesian_2d(x_min..x_max, 0..(max_count + max_count / 10 + 1))?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Frequency")
            .label_style(("sans-serif", 30))
            .draw()?;

        chart.draw_series(bins.iter().map(|&(start, end, count)| {
            Rectangle::new([(start, 0), (end, count)], SKY_BLUE.filled())
        }))?;
        root.present()?;
        Ok(())
    })
}

/// Scatter plot with one colour per group.
pub fn scatter_chart(
    path: &Path,
    caption: &str,
    axes: (&str, &str),
    groups: &[(String, Vec<(f64, f64)>)],
) -> Result<()> {
    render(path, |path| {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let all = || groups.iter().flat_map(|(_, points)| points.iter());
        let x_max = all().map(|p| p.0).fold(0.0, f64::max);
        let y_max = all().map(|p| p.1).fold(0.0, f64::max);
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 50))
            .margin(60)
            .set_label_area_size(LabelAreaPosition::Left, 120)
            .set_label_area_size(LabelAreaPosition::Bottom, 80)
            .build_cartesian_2d(0.0..headroom(x_max), 0.0..headroom(y_max))?;

        chart
            .configure_mesh()
            .x_desc(axes.0)
            .y_desc(axes.1)
            .label_style(("sans-serif", 30))
            .draw()?;

        for ((label, points), colour) in groups.iter().zip(GROUP_COLOURS.iter().copied().cycle()) {
            chart
                .draw_series(points.iter().map(|&point| Circle::new(point, 8, colour.mix(0.7).filled())))?
                .label(label.as_str())
                .legend(move |(x, y)| Circle::new((x + 10, y), 8, colour.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 30))
            .draw()?;
        root.present()?;
        Ok(())
    })
}
