use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// One OHLC bucket. `timestamp` is epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl OhlcPoint {
    /// Positional mapping of a raw provider row:
    /// `[timestamp, open, high, low, close, volume?]`.
    pub fn from_row(row: &[f64]) -> Result<Self> {
        if row.len() < 5 {
            return Err(Error::DeserializationError(format!(
                "OHLC row needs at least 5 values, got {}",
                row.len()
            )));
        }

        Ok(OhlcPoint {
            timestamp: row[0] as i64,
            open: row[1],
            high: row[2],
            low: row[3],
            close: row[4],
            volume: row.get(5).copied(),
        })
    }

    /// Sort by timestamp and drop duplicate timestamps (the later row wins).
    pub fn normalize_series(mut points: Vec<OhlcPoint>) -> Vec<OhlcPoint> {
        // Stable sort keeps arrival order among equal timestamps
        points.sort_by_key(|p| p.timestamp);

        let mut out: Vec<OhlcPoint> = Vec::with_capacity(points.len());
        for point in points {
            match out.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => out.push(point),
            }
        }
        out
    }
}

/// Current market state of one token.
///
/// Field names follow the dashboard's JSON contract, which is also the
/// representation stored in the fast cache and the durable store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub current_price: f64,
    #[serde(default)]
    pub price_change_percentage_1h: f64,
    #[serde(default)]
    pub price_change_percentage_24h: f64,
    #[serde(default)]
    pub price_change_percentage_7d: f64,
    pub total_volume: f64,
    pub market_cap: f64,
    #[serde(default)]
    pub sparkline_data: Vec<f64>,
    #[serde(rename = "ohlcData", default, skip_serializing_if = "Option::is_none")]
    pub ohlc_data: Option<Vec<OhlcPoint>>,
}

impl TokenSnapshot {
    pub fn with_ohlc(mut self, ohlc: Vec<OhlcPoint>) -> Self {
        self.ohlc_data = Some(OhlcPoint::normalize_series(ohlc));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.current_price >= 0.0) {
            return Err(Error::InvalidTokenData(format!(
                "{}: negative or NaN price {}",
                self.id, self.current_price
            )));
        }

        if !(self.total_volume >= 0.0) {
            return Err(Error::InvalidTokenData(format!(
                "{}: negative or NaN volume {}",
                self.id, self.total_volume
            )));
        }

        if let Some(ohlc) = &self.ohlc_data {
            let ordered = ohlc.windows(2).all(|w| w[0].timestamp < w[1].timestamp);
            if !ordered {
                return Err(Error::InvalidTokenData(format!(
                    "{}: OHLC series not strictly ascending",
                    self.id
                )));
            }
        }

        Ok(())
    }
}
