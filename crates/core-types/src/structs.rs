use crate::error::CoreError;
use crate::tags::TagSet;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One raw, timestamped price/market-cap record for a single token.
///
/// Observations are immutable once ingested: the engines only ever derive new
/// series from them. The 24h volume is optional because not every feed
/// provides it; a missing volume contributes zero to volume-window sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub token_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub market_cap: Decimal,
    pub volume_24h: Option<Decimal>,
}

impl Observation {
    /// Validates the basic range contract: price, market cap and volume must
    /// be non-negative. A violation is a caller error, reported with the
    /// offending field name.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.price.is_sign_negative() {
            return Err(CoreError::InvalidInput(
                "price".to_string(),
                format!("negative price {} for token {}", self.price, self.token_id),
            ));
        }
        if self.market_cap.is_sign_negative() {
            return Err(CoreError::InvalidInput(
                "market_cap".to_string(),
                format!(
                    "negative market cap {} for token {}",
                    self.market_cap, self.token_id
                ),
            ));
        }
        if let Some(volume) = self.volume_24h {
            if volume.is_sign_negative() {
                return Err(CoreError::InvalidInput(
                    "volume_24h".to_string(),
                    format!("negative volume {} for token {}", volume, self.token_id),
                ));
            }
        }
        Ok(())
    }
}

/// One derived entry of a token's normalized series.
///
/// Carries the raw observation fields alongside the derived values so that
/// downstream engines never have to re-read raw input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub market_cap: Decimal,
    pub volume_24h: Option<Decimal>,
    /// Fractional price change from the immediately preceding observation of
    /// the same token; 0 for the first record or when the previous price is 0.
    pub simple_return: Decimal,
    /// The previous period's market cap; 0 for the first record, so a token
    /// enters the index with zero influence and participates from its second
    /// period onward.
    pub lagged_weight: Decimal,
}

/// A token's complete normalized history, sorted ascending by timestamp with
/// strictly increasing, unique timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSeries {
    pub token_id: String,
    pub records: Vec<ReturnRecord>,
}

impl TokenSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One entry of a capitalization-weighted index series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub timestamp: DateTime<Utc>,
    /// Capitalization-weighted mean of constituent returns; 0 when the total
    /// lagged weight at this timestamp is 0.
    pub index_return: Decimal,
    /// Compounded level, seeded at the base value before the first period.
    pub index_value: Decimal,
    /// Compatibility duplicate of `index_value`, kept because downstream
    /// consumers read both names.
    pub normalized_index: Decimal,
    /// Straight sum of constituent market caps at this timestamp.
    pub total_market_cap: Decimal,
}

/// Per-token risk/behavior metrics relative to the overall index.
///
/// All six values are rounded to 2 decimal places. A record only exists for
/// tokens with at least the minimum aligned history; absence means
/// "not enough data", not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetricsRecord {
    pub token_id: String,
    /// Fraction of up-market periods in which the token also moved up.
    pub usens: Decimal,
    /// Fraction of down-market periods in which the token also moved down.
    pub dsens: Decimal,
    /// OLS slope of token return on market return.
    pub beta: Decimal,
    pub change24h: Decimal,
    pub change7d: Decimal,
    /// Blended 7-day momentum and recent-vs-prior weekly volume ratio.
    pub overbought_coef: Decimal,
}

impl TokenMetricsRecord {
    /// Creates a new, zeroed-out record for the given token.
    pub fn new(token_id: String) -> Self {
        Self {
            token_id,
            usens: Decimal::ZERO,
            dsens: Decimal::ZERO,
            beta: Decimal::ZERO,
            change24h: Decimal::ZERO,
            change7d: Decimal::ZERO,
            overbought_coef: Decimal::ZERO,
        }
    }
}

/// Static descriptive metadata for one token, as provided by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub tags: TagSet,
}
