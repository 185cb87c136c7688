use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Axis padding as a fraction of the integer price range.
const AXIS_PADDING_RATIO: f64 = 0.1;

/// One daily OHLC record inside a quiz's `quiz_data` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    pub date: String,
    #[serde(deserialize_with = "de_price")]
    pub open_price: f64,
    #[serde(deserialize_with = "de_price")]
    pub high_price: f64,
    #[serde(deserialize_with = "de_price")]
    pub low_price: f64,
    #[serde(deserialize_with = "de_price")]
    pub close_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: Option<NaiveDate>,
    pub label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

impl From<PricePoint> for Candle {
    fn from(p: PricePoint) -> Self {
        let date = parse_point_date(&p.date);
        let label = match date {
            Some(d) => format!("{}/{}", d.month(), d.day()),
            None => p.date.trim().to_string(),
        };
        Self {
            date,
            label,
            open: p.open_price,
            high: p.high_price,
            low: p.low_price,
            close: p.close_price,
        }
    }
}

/// Vertical price range of a chart, padded around whole-number extremes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAxis {
    pub min: f64,
    pub max: f64,
}

impl PriceAxis {
    pub fn for_candles(candles: &[Candle]) -> Option<Self> {
        if candles.is_empty() {
            return None;
        }
        let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min).floor();
        let high = candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max)
            .ceil();
        let padding = ((high - low) * AXIS_PADDING_RATIO).ceil();
        Some(Self {
            min: low - padding,
            max: high + padding,
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Distance from the top edge for `price` on a chart `height` units tall.
    pub fn y(&self, price: f64, height: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return height / 2.0;
        }
        ((self.max - price) / span * height).clamp(0.0, height)
    }

    /// Row index (0 = top) for `price` on a grid of `rows` rows.
    pub fn row(&self, price: f64, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        let last = (rows - 1) as f64;
        self.y(price, last).round() as usize
    }
}

pub fn parse_candles(quiz_data: &str) -> anyhow::Result<Vec<Candle>> {
    let points = serde_json::from_str::<Vec<PricePoint>>(quiz_data)
        .context("quiz_data is not a JSON array of price points")?;
    Ok(points.into_iter().map(Candle::from).collect())
}

pub fn parse_hints(hint: &str) -> anyhow::Result<Vec<String>> {
    if hint.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(hint).context("hint is not a JSON array of strings")
}

fn parse_point_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(t) {
        return Some(dt.date_naive());
    }
    // Compact exchange format, e.g. "20250103".
    if t.len() == 8 && t.bytes().all(|b| b.is_ascii_digit()) {
        let y = t[0..4].parse::<i32>().ok()?;
        let m = t[4..6].parse::<u32>().ok()?;
        let d = t[6..8].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    NaiveDate::parse_from_str(t.get(..10)?, "%Y-%m-%d").ok()
}

fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Num(f64),
        Text(String),
    }

    match Price::deserialize(deserializer)? {
        Price::Num(v) => Ok(v),
        Price::Text(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("price is not numeric: {s}"))),
    }
}
