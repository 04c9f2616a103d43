use crate::signal::{Events, Sample};
use serde::{Deserialize, Serialize};

pub const TRACE_COLOR: Color = Color(0x00A050);
pub const PEAK_COLOR: Color = Color(0xFF0077);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Isolated points such as detected R-peaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every series, or `None` for an empty figure.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

/// Reduce a trace to at most `max_points` while keeping every bucket's extremes,
/// so narrow QRS spikes survive.
pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points || max_points < 2 {
        return points.to_vec();
    }
    let buckets = max_points / 2;
    let bucket_size = points.len() as f64 / buckets as f64;
    let mut result = Vec::with_capacity(buckets * 2);
    for i in 0..buckets {
        let start = (i as f64 * bucket_size).floor() as usize;
        let end = (((i + 1) as f64 * bucket_size).floor() as usize).min(points.len());
        let bucket = &points[start..end.max(start + 1).min(points.len())];
        let (mut lo, mut hi) = (0, 0);
        for (j, p) in bucket.iter().enumerate() {
            if p[1] < bucket[lo][1] {
                lo = j;
            }
            if p[1] > bucket[hi][1] {
                hi = j;
            }
        }
        result.push(bucket[lo.min(hi)]);
        if lo != hi {
            result.push(bucket[lo.max(hi)]);
        }
    }
    result
}

/// ECG trace in mV over seconds, optionally with R-peak markers.
pub fn figure_from_samples(
    title: &str,
    samples: &[Sample],
    peaks: Option<&Events>,
    max_points: usize,
) -> Figure {
    let points: Vec<[f64; 2]> = samples.iter().map(|s| [s.time, s.amplitude]).collect();
    let mut fig = Figure::new(Some(title.into()));
    fig.x.label = Some("Time (s)".into());
    fig.y.label = Some("Amplitude (mV)".into());
    fig.add_series(Series::Line(LineSeries {
        name: title.into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            color: TRACE_COLOR,
        },
    }));
    if let Some(peaks) = peaks {
        let marked = peaks
            .indices
            .iter()
            .filter_map(|&idx| points.get(idx).copied())
            .collect();
        fig.add_series(Series::Markers(MarkerSeries {
            name: "R-peaks".into(),
            points: marked,
            radius: 3,
            color: PEAK_COLOR,
        }));
    }
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimation_keeps_spikes() {
        let mut points: Vec<[f64; 2]> = (0..1000).map(|i| [i as f64, 0.0]).collect();
        points[517][1] = 1.5;
        points[731][1] = -0.4;
        let reduced = decimate_points(&points, 100);
        assert!(reduced.len() <= 100);
        assert!(reduced.iter().any(|p| p[1] == 1.5 && p[0] == 517.0));
        assert!(reduced.iter().any(|p| p[1] == -0.4));
        assert!(reduced.windows(2).all(|w| w[0][0] < w[1][0]));
    }

    #[test]
    fn short_traces_are_untouched() {
        let points = vec![[0.0, 1.0], [1.0, 2.0]];
        assert_eq!(decimate_points(&points, 10), points);
    }

    #[test]
    fn sample_figure_marks_peaks() {
        let samples: Vec<Sample> = (0..10)
            .map(|i| Sample {
                time: i as f64 / 500.0,
                amplitude: if i == 4 { 1.0 } else { 0.0 },
                sample_index: i,
                beat_count: 0,
            })
            .collect();
        let peaks = Events::from_indices(vec![4, 99]);
        let fig = figure_from_samples("Lead II", &samples, Some(&peaks), 1000);
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[1].points(), &[[0.008, 1.0]]);
        assert_eq!(fig.bounds(), Some((0.0, 0.018, 0.0, 1.0)));
    }
}
