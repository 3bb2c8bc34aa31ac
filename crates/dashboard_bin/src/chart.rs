use chrono::{DateTime, Utc};
use std::fmt::Write;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

struct Series {
    name: String,
    color: &'static str,
    points: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: i64,
    x_max: i64,
    y_min: f64,
    y_max: f64,
}

impl Bounds {
    fn project(&self, x: i64, y: f64) -> (f64, f64) {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let fx = (x - self.x_min) as f64 / (self.x_max - self.x_min) as f64;
        let fy = (y - self.y_min) / (self.y_max - self.y_min);
        (MARGIN_LEFT + fx * plot_w, MARGIN_TOP + plot_h - fy * plot_h)
    }
}

/// Time series line chart rendered to inline SVG.
pub struct LineChart {
    title: String,
    series: Vec<Series>,
}

impl LineChart {
    pub fn new(title: impl Into<String>) -> Self {
        LineChart {
            title: title.into(),
            series: Vec::new(),
        }
    }

    pub fn series(
        mut self,
        name: impl Into<String>,
        color: &'static str,
        points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        self.series.push(Series {
            name: name.into(),
            color,
            points: points
                .into_iter()
                .filter(|(_, y)| y.is_finite())
                .map(|(x, y)| (x.timestamp(), y))
                .collect(),
        });
        self
    }

    fn bounds(&self) -> Option<Bounds> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x, y) = points.next()?;
        let mut b = Bounds {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        };
        for &(x, y) in points {
            b.x_min = b.x_min.min(x);
            b.x_max = b.x_max.max(x);
            b.y_min = b.y_min.min(y);
            b.y_max = b.y_max.max(y);
        }
        // flat ranges would divide by zero
        if b.x_max == b.x_min {
            b.x_max = b.x_min + 1;
        }
        if b.y_max == b.y_min {
            b.y_min -= 1.0;
            b.y_max += 1.0;
        }
        Some(b)
    }

    pub fn render(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="chart" role="img"><title>{t}</title><text x="{cx}" y="24" text-anchor="middle" class="chart-title">{t}</text>"#,
            w = WIDTH,
            h = HEIGHT,
            t = escape(&self.title),
            cx = WIDTH / 2.0,
        );

        let Some(bounds) = self.bounds() else {
            let _ = write!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="middle">No data</text></svg>"#,
                WIDTH / 2.0,
                HEIGHT / 2.0
            );
            return svg;
        };

        let bottom = HEIGHT - MARGIN_BOTTOM;
        let right = WIDTH - MARGIN_RIGHT;
        let _ = write!(
            svg,
            r##"<g stroke="#999" stroke-width="1"><line x1="{l}" y1="{t}" x2="{l}" y2="{b}"/><line x1="{l}" y1="{b}" x2="{r}" y2="{b}"/></g>"##,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = bottom,
            r = right,
        );
        let _ = write!(
            svg,
            r#"<g font-size="11"><text x="{lx}" y="{top}" text-anchor="end">{max:.2}</text><text x="{lx}" y="{bottom}" text-anchor="end">{min:.2}</text><text x="{l}" y="{dy}">{first}</text><text x="{r}" y="{dy}" text-anchor="end">{last}</text></g>"#,
            lx = MARGIN_LEFT - 6.0,
            top = MARGIN_TOP + 4.0,
            bottom = bottom,
            max = bounds.y_max,
            min = bounds.y_min,
            l = MARGIN_LEFT,
            r = right,
            dy = bottom + 16.0,
            first = date_label(bounds.x_min),
            last = date_label(bounds.x_max),
        );

        for series in &self.series {
            let points: Vec<String> = series
                .points
                .iter()
                .map(|&(x, y)| {
                    let (px, py) = bounds.project(x, y);
                    format!("{:.1},{:.1}", px, py)
                })
                .collect();
            let _ = write!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                series.color,
                points.join(" ")
            );
        }

        for (i, series) in self.series.iter().enumerate() {
            let y = MARGIN_TOP + 14.0 * i as f64;
            let _ = write!(
                svg,
                r#"<g font-size="12"><rect x="{x}" y="{ry}" width="10" height="10" fill="{c}"/><text x="{tx}" y="{ty}">{n}</text></g>"#,
                x = MARGIN_LEFT + 10.0,
                ry = y,
                c = series.color,
                tx = MARGIN_LEFT + 24.0,
                ty = y + 9.0,
                n = escape(&series.name),
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

fn date_label(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn project_maps_extremes_to_plot_corners() {
        let chart = LineChart::new("t").series("close", "black", vec![(day(1), 10.0), (day(5), 20.0)]);
        let bounds = chart.bounds().unwrap();

        let (x0, y0) = bounds.project(bounds.x_min, 10.0);
        assert_eq!(x0, MARGIN_LEFT);
        assert_eq!(y0, HEIGHT - MARGIN_BOTTOM);

        let (x1, y1) = bounds.project(bounds.x_max, 20.0);
        assert_eq!(x1, WIDTH - MARGIN_RIGHT);
        assert_eq!(y1, MARGIN_TOP);
    }

    #[test]
    fn bounds_span_all_series() {
        let chart = LineChart::new("t")
            .series("a", "black", vec![(day(2), 5.0), (day(3), 7.0)])
            .series("b", "red", vec![(day(1), 9.0), (day(4), 1.0)]);
        let bounds = chart.bounds().unwrap();
        assert_eq!(bounds.x_min, day(1).timestamp());
        assert_eq!(bounds.x_max, day(4).timestamp());
        assert_eq!(bounds.y_min, 1.0);
        assert_eq!(bounds.y_max, 9.0);
    }

    #[test]
    fn flat_series_is_widened() {
        let chart = LineChart::new("t").series("flat", "black", vec![(day(1), 3.0)]);
        let bounds = chart.bounds().unwrap();
        assert!(bounds.x_max > bounds.x_min);
        assert_eq!((bounds.y_min, bounds.y_max), (2.0, 4.0));
        let (px, py) = bounds.project(bounds.x_min, 3.0);
        assert!(px.is_finite() && py.is_finite());
    }

    #[test]
    fn render_draws_polyline_and_legend_per_series() {
        let svg = LineChart::new("AAPL forecast")
            .series("train", "steelblue", vec![(day(1), 1.0), (day(2), 2.0)])
            .series("forecast", "orange", vec![(day(3), 3.0)])
            .render();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(">train</text>"));
        assert!(svg.contains(">forecast</text>"));
        assert!(svg.contains("2024-03-01"));
        assert!(svg.contains("2024-03-03"));
    }

    #[test]
    fn render_empty_chart() {
        let svg = LineChart::new("nothing").render();
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn render_escapes_title() {
        let svg = LineChart::new("<b>&</b>").render();
        assert!(svg.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let chart = LineChart::new("t").series("a", "black", vec![(day(1), f64::NAN), (day(2), 4.0)]);
        assert_eq!(chart.bounds().unwrap().y_min, 3.0);
    }
}
