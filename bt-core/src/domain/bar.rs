//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of a position or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl Side {
    pub fn is_long(self) -> bool {
        matches!(self, Side::Long)
    }
}

/// An OHLCV bar for one symbol over one timeframe interval.
///
/// Immutable once constructed; the engine never mutates a `Bar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// Timeframe tag, e.g. "1m", "1h", "1d". Advisory — the engine does not
    /// interpret it beyond passing it through to the indicator manager.
    pub timeframe: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate the OHLCV invariant. Not called on the hot path — a strict
    /// caller-supplied validator may invoke it at the ingestion boundary.
    pub fn validate(&self) -> Result<(), crate::error::EngineError> {
        let lo = self.open.min(self.close);
        let hi = self.open.max(self.close);
        if self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
        {
            return Err(crate::error::EngineError::InvalidBar {
                symbol: self.symbol.clone(),
                reason: "NaN in OHLCV".into(),
            });
        }
        if self.low > lo || self.high < hi || self.volume < 0.0 {
            return Err(crate::error::EngineError::InvalidBar {
                symbol: self.symbol.clone(),
                reason: format!(
                    "low={} high={} open={} close={} volume={} violates OHLCV invariant",
                    self.low, self.high, self.open, self.close, self.volume
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            "SPY",
            "1m",
            100.0,
            105.0,
            98.0,
            103.0,
            50_000.0,
        )
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn detects_nan() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn detects_high_below_low() {
        let mut bar = sample_bar();
        bar.high = 90.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn detects_negative_volume() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }

    #[test]
    fn side_is_long() {
        assert!(Side::Long.is_long());
        assert!(!Side::Short.is_long());
    }
}
