// =============================================================================
// Chart payloads
// =============================================================================
//
// Charts are shipped column-oriented, the layout uPlot-style renderers take
// directly:
//
//   data[0]  = x values (UNIX seconds)
//   data[k]  = y values of series[k - 1]; `null` where undefined
//
// Styling mirrors the dashboard palette so the front end only has to hand the
// payload to the chart library.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;
use crate::types::Bar;

const AXIS_STROKE: &str = "var(--muted)";

const CLOSE_BLUE: &str = "#3b82f6";
const CLOSE_LIGHT: &str = "#93c5fd";
const VOLUME_VIOLET: &str = "#a78bfa";
const MA_PALETTE: &[&str] = &["#10b981", "#f59e0b", "#ef4444", "#06b6d4", "#ec4899"];

/// Which moving averages are drawn. Windows other than 20/50/200 are always
/// shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaToggles {
    pub ma20: bool,
    pub ma50: bool,
    pub ma200: bool,
}

impl Default for MaToggles {
    fn default() -> Self {
        Self {
            ma20: true,
            ma50: true,
            ma200: true,
        }
    }
}

impl MaToggles {
    pub fn shows(&self, window: usize) -> bool {
        match window {
            20 => self.ma20,
            50 => self.ma50,
            200 => self.ma200,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesStyle {
    pub label: String,
    pub stroke: &'static str,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    pub show: bool,
}

impl SeriesStyle {
    fn line(label: impl Into<String>, stroke: &'static str, width: f64) -> Self {
        Self {
            label: label.into(),
            stroke,
            width,
            fill: None,
            show: true,
        }
    }

    fn filled(mut self, fill: &'static str) -> Self {
        self.fill = Some(fill);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub stroke: &'static str,
    pub grid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl AxisStyle {
    fn plain() -> Self {
        Self {
            label: None,
            stroke: AXIS_STROKE,
            grid: true,
            size: None,
        }
    }
}

/// One renderable chart.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub data: Vec<Vec<Option<f64>>>,
    pub series: Vec<SeriesStyle>,
    pub axes: Vec<AxisStyle>,
    /// Fixed y-axis range; auto-scaled when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<(f64, f64)>,
    /// Horizontal reference lines (e.g. RSI 30/70).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<f64>,
}

impl Chart {
    fn new(id: &'static str, x: &[Option<f64>]) -> Self {
        Self {
            id,
            data: vec![x.to_vec()],
            series: Vec::new(),
            axes: vec![AxisStyle::plain(), AxisStyle::plain()],
            y_range: None,
            guides: Vec::new(),
        }
    }

    fn push(&mut self, style: SeriesStyle, values: Vec<Option<f64>>) {
        self.series.push(style);
        self.data.push(values);
    }

    /// Number of points on the x-axis.
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn x_axis(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| Some(b.timestamp() as f64)).collect()
}

fn column(bars: &[Bar], f: impl Fn(&Bar) -> f64) -> Vec<Option<f64>> {
    bars.iter().map(|b| Some(f(b))).collect()
}

pub fn price_chart(bars: &[Bar]) -> Chart {
    let mut chart = Chart::new("price", &x_axis(bars));
    chart.push(
        SeriesStyle::line("Close Price", CLOSE_BLUE, 2.0).filled("rgba(59, 130, 246, 0.1)"),
        column(bars, |b| b.close),
    );
    chart
}

/// Close plus one line per configured moving average; `show` follows the
/// toggles.
pub fn moving_average_chart(bars: &[Bar], indicators: &IndicatorSet, toggles: &MaToggles) -> Chart {
    let mut chart = Chart::new("moving_averages", &x_axis(bars));
    chart.push(
        SeriesStyle::line("Close", CLOSE_LIGHT, 1.0),
        column(bars, |b| b.close),
    );

    for (i, ma) in indicators.moving_averages.iter().enumerate() {
        let mut style = SeriesStyle::line(
            format!("MA {}", ma.window),
            MA_PALETTE[i % MA_PALETTE.len()],
            2.0,
        );
        style.show = toggles.shows(ma.window);
        chart.push(style, ma.values.clone());
    }
    chart
}

pub fn volume_chart(bars: &[Bar]) -> Chart {
    let mut chart = Chart::new("volume", &x_axis(bars));
    chart.axes[1] = AxisStyle {
        label: Some("Volume"),
        stroke: AXIS_STROKE,
        grid: true,
        size: Some(60),
    };
    chart.push(
        SeriesStyle::line("Vol", VOLUME_VIOLET, 1.0).filled("rgba(167, 139, 250, 0.4)"),
        column(bars, |b| b.volume),
    );
    chart
}

pub fn rsi_chart(bars: &[Bar], indicators: &IndicatorSet) -> Chart {
    let mut chart = Chart::new("rsi", &x_axis(bars));
    chart.y_range = Some((0.0, 100.0));
    chart.guides = vec![30.0, 70.0];
    chart.push(SeriesStyle::line("RSI", "#8b5cf6", 1.5), indicators.rsi.clone());
    chart
}

pub fn macd_chart(bars: &[Bar], indicators: &IndicatorSet) -> Chart {
    let mut chart = Chart::new("macd", &x_axis(bars));
    chart.guides = vec![0.0];
    chart.push(SeriesStyle::line("MACD", CLOSE_BLUE, 1.5), indicators.macd.macd.clone());
    chart.push(SeriesStyle::line("Signal", "#f97316", 1.5), indicators.macd.signal.clone());
    chart.push(
        SeriesStyle::line("Histogram", "#64748b", 1.0).filled("rgba(100, 116, 139, 0.4)"),
        indicators.macd.histogram.clone(),
    );
    chart
}

pub fn bollinger_chart(bars: &[Bar], indicators: &IndicatorSet) -> Chart {
    let mut chart = Chart::new("bollinger", &x_axis(bars));
    chart.push(SeriesStyle::line("Close", CLOSE_LIGHT, 1.0), column(bars, |b| b.close));
    chart.push(SeriesStyle::line("Upper", "#ef4444", 1.0), indicators.bollinger.upper.clone());
    chart.push(SeriesStyle::line("Middle", "#10b981", 1.5), indicators.bollinger.middle.clone());
    chart.push(SeriesStyle::line("Lower", "#ef4444", 1.0), indicators.bollinger.lower.clone());
    chart
}
