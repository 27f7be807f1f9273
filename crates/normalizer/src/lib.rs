//! # Time-Series Normalizer
//!
//! Turns heterogeneous raw observations into clean, per-token-sorted series of
//! simple returns and lagged market-cap weights, tolerant of gaps in coverage.
//!
//! This is a pure logic crate: it performs no I/O and never mutates its input.
//! Every input observation appears exactly once in the output.

use core_types::{Observation, ReturnRecord, TokenSeries};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub mod error;

pub use error::NormalizerError;

/// Validates, groups and sorts raw observations, deriving each token's
/// per-period simple return and one-period-lagged weight.
///
/// Rules, per token and in ascending timestamp order:
/// - `simple_return = price[t] / price[t-1] - 1`, defined as 0 for the first
///   record or when the previous price is 0 (never infinite, never NaN);
/// - `lagged_weight = market_cap[t-1]`, 0 for the first record.
///
/// Duplicate timestamps within one token's series are rejected: the sampling
/// contract makes them a caller error, and keeping the invariant "strictly
/// increasing, unique timestamps" checkable beats picking a winner silently.
pub fn normalize(
    observations: &[Observation],
) -> Result<BTreeMap<String, TokenSeries>, NormalizerError> {
    for observation in observations {
        observation.validate()?;
    }

    // Group by token; BTreeMap keeps token iteration order canonical.
    let mut grouped: BTreeMap<String, Vec<&Observation>> = BTreeMap::new();
    for observation in observations {
        grouped
            .entry(observation.token_id.clone())
            .or_default()
            .push(observation);
    }

    let mut series = BTreeMap::new();
    for (token_id, mut group) in grouped {
        group.sort_by_key(|o| o.timestamp);

        let mut records = Vec::with_capacity(group.len());
        let mut previous: Option<&Observation> = None;
        for observation in group {
            if let Some(prev) = previous {
                if prev.timestamp == observation.timestamp {
                    return Err(NormalizerError::DuplicateTimestamp {
                        token_id: token_id.clone(),
                        timestamp: observation.timestamp,
                    });
                }
            }

            let simple_return = match previous {
                Some(prev) if prev.price > Decimal::ZERO => {
                    observation.price / prev.price - Decimal::ONE
                }
                _ => Decimal::ZERO,
            };
            let lagged_weight = previous.map_or(Decimal::ZERO, |prev| prev.market_cap);

            records.push(ReturnRecord {
                timestamp: observation.timestamp,
                price: observation.price,
                market_cap: observation.market_cap,
                volume_24h: observation.volume_24h,
                simple_return,
                lagged_weight,
            });
            previous = Some(observation);
        }

        tracing::debug!(
            token_id = %token_id,
            records = records.len(),
            "normalized token series"
        );
        series.insert(token_id.clone(), TokenSeries { token_id, records });
    }

    Ok(series)
}
