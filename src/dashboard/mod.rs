// =============================================================================
// Dashboard view assembly
// =============================================================================
//
// Indicators are always computed over the FULL series and sliced afterwards,
// so a narrow range still shows MA 200 from its first visible bar.

pub mod chart;
pub mod kpi;
pub mod range;

use serde::{Deserialize, Serialize};

use crate::indicators::{
    bollinger::calculate_bollinger, rsi::current_rsi, IndicatorParams, IndicatorSet,
};
use crate::types::Bar;

pub use chart::{Chart, MaToggles};
pub use kpi::Kpis;
pub use range::ViewRange;

/// What the user is looking at: slider range plus MA checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub range: ViewRange,
    pub toggles: MaToggles,
}

/// Last defined value of one moving average.
#[derive(Debug, Clone, Serialize)]
pub struct LatestMa {
    pub window: usize,
    pub value: Option<f64>,
}

/// Most recent indicator readings over the full series.
#[derive(Debug, Clone, Serialize)]
pub struct LatestReadings {
    pub close: f64,
    pub moving_averages: Vec<LatestMa>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_histogram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_width: Option<f64>,
}

/// Everything the front end needs to draw one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub symbol: String,
    pub total_bars: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub kpis: Kpis,
    pub latest: LatestReadings,
    pub charts: Vec<Chart>,
}

/// Build KPIs, latest readings and every chart for the visible slice of
/// `bars`. Returns `None` for an empty series.
pub fn build_dashboard(
    symbol: &str,
    bars: &[Bar],
    view: &ViewState,
    params: &IndicatorParams,
) -> Option<DashboardView> {
    let (i0, i1) = view.range.indices(bars.len())?;
    let slice = &bars[i0..=i1];

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let full = IndicatorSet::compute(&closes, params);
    let visible = full.slice(i0, i1);

    let kpis = Kpis::compute(slice)?;

    let rsi = current_rsi(&closes, params.rsi_period);
    let macd_last = full.macd.last();
    let moving_averages = params
        .ma_windows
        .iter()
        .map(|&window| LatestMa {
            window,
            value: full
                .moving_average(window)
                .and_then(|v| v.last().copied().flatten()),
        })
        .collect();

    let latest = LatestReadings {
        close: *closes.last()?,
        moving_averages,
        rsi: rsi.map(|(v, _)| v),
        rsi_label: rsi.map(|(_, l)| l),
        macd: macd_last.map(|(m, _, _)| m),
        macd_signal: macd_last.map(|(_, s, _)| s),
        macd_histogram: macd_last.map(|(_, _, h)| h),
        bollinger_width: calculate_bollinger(&closes, params.bollinger_period, params.bollinger_k)
            .map(|bb| bb.width),
    };

    let charts = vec![
        chart::price_chart(slice),
        chart::moving_average_chart(slice, &visible, &view.toggles),
        chart::volume_chart(slice),
        chart::rsi_chart(slice, &visible),
        chart::macd_chart(slice, &visible),
        chart::bollinger_chart(slice, &visible),
    ];

    Some(DashboardView {
        symbol: symbol.to_string(),
        total_bars: bars.len(),
        start_index: i0,
        end_index: i1,
        kpis,
        latest,
        charts,
    })
}
