// =============================================================================
// Shared types used across the dashboard backend
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading-day OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// UNIX seconds at UTC midnight of the bar's date (chart x-axis value).
    pub fn timestamp(&self) -> i64 {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }
}

/// Where a symbol's series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Snapshot,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Descriptive data attached to a loaded series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub symbol: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    pub source: DataSource,
}

impl SymbolMeta {
    pub fn new(symbol: impl Into<String>, source: DataSource) -> Self {
        Self {
            symbol: symbol.into(),
            long_name: None,
            last_updated: None,
            source,
        }
    }
}

/// Whether the live price simulation is advancing the active series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveMode {
    Running,
    Stopped,
}

impl Default for LiveMode {
    fn default() -> Self {
        Self::Stopped
    }
}

impl std::fmt::Display for LiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_timestamp_is_utc_midnight() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        assert_eq!(bar.timestamp(), 1_704_153_600);
    }

    #[test]
    fn bar_date_serialises_as_iso_day() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        };
        let json = serde_json::to_value(&bar).unwrap();
        assert_eq!(json["date"], "2023-12-29");
    }

    #[test]
    fn data_source_display_matches_serde() {
        let json = serde_json::to_string(&DataSource::Synthetic).unwrap();
        assert_eq!(json, "\"synthetic\"");
        assert_eq!(DataSource::Synthetic.to_string(), "synthetic");
    }
}
