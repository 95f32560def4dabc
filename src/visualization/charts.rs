use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType},
    style::{Color, Style},
};

use crate::analysis::ComparativeSummary;
use crate::capture::ProtocolTag;
use crate::pipeline::TraceReport;
use crate::utils::formatting::{format_compact, format_flags, format_seconds};

pub const MEAN_COLOR: Color = Color::Indexed(208);
pub const POINT_COLOR: Color = Color::Cyan;

/// Bar colors, indexed by the tag's position in the configured list so each
/// tag keeps its color on every row.
pub const TAG_PALETTE: [Color; 8] = [
    Color::Blue,
    Color::Indexed(208),
    Color::Green,
    Color::Red,
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::LightBlue,
];

/// Magnitudes below 1 are clamped to the axis origin.
pub fn log_scale(value: f64) -> f64 {
    value.max(1.0).log10()
}

/// Bar height for a count on a log axis: log10(1 + count), in hundredths.
pub fn log_bar(count: usize) -> u64 {
    ((count as f64 + 1.0).log10() * 100.0).round() as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gridline {
    pub y: f64,
    pub major: bool,
}

/// One scatter or line view of a series against normalized time. Values are
/// stored already transformed into axis space.
#[derive(Debug, Clone)]
pub struct SeriesChart {
    pub title: String,
    pub points: Vec<(f64, f64)>,
    pub mean: Option<f64>,
    pub graph_type: GraphType,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub gridlines: Vec<Gridline>,
    gridline_data: Vec<Vec<(f64, f64)>>,
    mean_data: Vec<(f64, f64)>,
}

impl SeriesChart {
    fn new(title: String, points: Vec<(f64, f64)>, graph_type: GraphType, comparison: &ComparativeSummary) -> Self {
        let end = if comparison.max_duration > 0.0 { comparison.max_duration } else { 1.0 };
        Self {
            title,
            points,
            mean: None,
            graph_type,
            x_bounds: [0.0, end],
            y_bounds: [0.0, 1.0],
            x_labels: vec![
                format_seconds(0.0),
                format_seconds(end / 2.0),
                format_seconds(end),
            ],
            y_labels: Vec::new(),
            gridlines: Vec::new(),
            gridline_data: Vec::new(),
            mean_data: Vec::new(),
        }
    }

    fn with_mean(mut self, mean: f64) -> Self {
        self.mean = Some(mean);
        self.mean_data = vec![(self.x_bounds[0], mean), (self.x_bounds[1], mean)];
        self
    }

    fn with_gridlines(mut self, gridlines: Vec<Gridline>) -> Self {
        self.gridline_data = gridlines
            .iter()
            .map(|g| vec![(self.x_bounds[0], g.y), (self.x_bounds[1], g.y)])
            .collect();
        self.gridlines = gridlines;
        self
    }

    fn linear_y(mut self, max: f64) -> Self {
        let top = if max > 0.0 { max } else { 1.0 };
        self.y_bounds = [0.0, top];
        self.y_labels = vec![
            format_compact(0.0),
            format_compact(top / 2.0),
            format_compact(top),
        ];
        self
    }

    /// Size over time, log10 magnitude axis with one label per decade.
    pub fn packet_size(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        let metadata = &report.metadata;
        let points = metadata
            .normalized_time()
            .iter()
            .zip(metadata.size())
            .map(|(&t, &s)| (t, log_scale(s as f64)))
            .collect();
        let decades = log_scale(comparison.max_size as f64).ceil().max(1.0);

        let mut chart = Self::new(
            format!("\"{}\": Packet size (B)", report_label(&report.name)),
            points,
            GraphType::Scatter,
            comparison,
        )
        .with_mean(log_scale(report.summary.mean_size));
        chart.y_bounds = [0.0, decades];
        chart.y_labels = (0..=decades as i32)
            .map(|k| format_compact(10f64.powi(k)))
            .collect();
        chart
    }

    pub fn inter_arrival(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        let metadata = &report.metadata;
        let points = metadata
            .normalized_time()
            .iter()
            .copied()
            .zip(metadata.inter_arrival().iter().copied())
            .collect();
        let mut chart = Self::new("Inter-arrival time (s)".to_string(), points, GraphType::Scatter, comparison)
            .linear_y(comparison.max_inter_arrival)
            .with_mean(report.summary.mean_inter_arrival);
        chart.y_labels = vec![
            format_seconds(0.0),
            format_seconds(chart.y_bounds[1] / 2.0),
            format_seconds(chart.y_bounds[1]),
        ];
        chart
    }

    /// Flags as a discrete bit field: labels every 4 values in binary,
    /// gridlines on every integer.
    pub fn tcp_flags(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        let metadata = &report.metadata;
        let points = metadata
            .normalized_time()
            .iter()
            .zip(metadata.flags())
            .map(|(&t, &f)| (t, f64::from(f)))
            .collect();

        let (top, major, minor) = if comparison.max_flags < 32 { (32u32, 4u32, 1u32) } else { (256, 32, 8) };
        let gridlines = (0..=top)
            .step_by(minor as usize)
            .map(|y| Gridline {
                y: f64::from(y),
                major: y % major == 0,
            })
            .collect();

        let mut chart = Self::new("TCP flags".to_string(), points, GraphType::Scatter, comparison)
            .with_gridlines(gridlines);
        chart.y_bounds = [0.0, f64::from(top)];
        chart.y_labels = (0..=top).step_by(major as usize).map(format_flags).collect();
        chart
    }

    pub fn tcp_window(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        let metadata = &report.metadata;
        let points = metadata
            .normalized_time()
            .iter()
            .zip(metadata.window())
            .map(|(&t, &w)| (t, f64::from(w)))
            .collect();
        Self::new("TCP window".to_string(), points, GraphType::Line, comparison)
            .linear_y(f64::from(comparison.max_window))
            .with_mean(report.summary.mean_window)
    }

    pub fn render(&self, area: Rect, frame: &mut Frame, marker: symbols::Marker) {
        let mut datasets: Vec<Dataset> = self
            .gridlines
            .iter()
            .zip(&self.gridline_data)
            .map(|(grid, data)| {
                let color = if grid.major { Color::Gray } else { Color::DarkGray };
                Dataset::default()
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(data)
            })
            .collect();

        datasets.push(
            Dataset::default()
                .marker(marker)
                .graph_type(self.graph_type)
                .style(Style::default().fg(POINT_COLOR))
                .data(&self.points),
        );

        if self.mean.is_some() {
            datasets.push(
                Dataset::default()
                    .name("mean")
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(MEAN_COLOR))
                    .data(&self.mean_data),
            );
        }

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title(self.title.as_str())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::White)),
            )
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds(self.x_bounds)
                    .labels(self.x_labels.iter().map(|l| Span::raw(l.as_str())).collect()),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds(self.y_bounds)
                    .labels(self.y_labels.iter().map(|l| Span::raw(l.as_str())).collect()),
            );

        frame.render_widget(chart, area);
    }
}

/// Protocol distribution for one trace, log-scaled bars in configured tag order.
#[derive(Debug, Clone)]
pub struct ProtocolChart {
    pub bars: Vec<ProtocolBar>,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolBar {
    pub tag: ProtocolTag,
    pub count: usize,
    pub height: u64,
    pub color: Color,
}

impl ProtocolChart {
    pub fn from_report(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        let bars = report
            .counts
            .entries()
            .iter()
            .enumerate()
            .map(|(i, &(tag, count))| ProtocolBar {
                tag,
                count,
                height: log_bar(count),
                color: TAG_PALETTE[i % TAG_PALETTE.len()],
            })
            .collect();

        Self {
            bars,
            max: log_bar(comparison.max_count).max(1),
        }
    }

    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let block = Block::default().title("Prot. dist.").borders(Borders::ALL);

        if self.bars.is_empty() {
            frame.render_widget(block, area);
            return;
        }

        let bars: Vec<Bar> = self
            .bars
            .iter()
            .map(|bar| {
                Bar::default()
                    .label(Line::from(bar.tag.as_str()))
                    .value(bar.height)
                    .text_value(bar.count.to_string())
                    .style(Style::default().fg(bar.color))
                    .value_style(Style::default().fg(Color::Black).bg(bar.color))
            })
            .collect();

        let n = self.bars.len() as u16;
        let inner_width = area.width.saturating_sub(2);
        let bar_width = (inner_width / n.max(1)).saturating_sub(1).max(1);

        let chart = BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .max(self.max);

        frame.render_widget(chart, area);
    }
}

/// The five views of one trace row.
#[derive(Debug, Clone)]
pub struct TraceCharts {
    pub name: String,
    pub size: SeriesChart,
    pub inter_arrival: SeriesChart,
    pub flags: SeriesChart,
    pub window: SeriesChart,
    pub protocols: ProtocolChart,
}

impl TraceCharts {
    pub fn build(report: &TraceReport, comparison: &ComparativeSummary) -> Self {
        Self {
            name: report.name.clone(),
            size: SeriesChart::packet_size(report, comparison),
            inter_arrival: SeriesChart::inter_arrival(report, comparison),
            flags: SeriesChart::tcp_flags(report, comparison),
            window: SeriesChart::tcp_window(report, comparison),
            protocols: ProtocolChart::from_report(report, comparison),
        }
    }

    pub fn render(&self, cells: &[Rect; 5], frame: &mut Frame, marker: symbols::Marker) {
        self.size.render(cells[0], frame, marker);
        self.inter_arrival.render(cells[1], frame, marker);
        self.flags.render(cells[2], frame, marker);
        self.window.render(cells[3], frame, marker);
        self.protocols.render(cells[4], frame);
    }
}

/// Trace name without its capture extension.
fn report_label(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).filter(|s| !s.is_empty()).unwrap_or(name)
}
