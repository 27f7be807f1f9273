use crate::error::IndexError;
use crate::series::IndexSeries;
use chrono::{DateTime, Utc};
use core_types::{IndexPoint, Observation, TagSet};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// The level every index is seeded at before its first period.
pub const DEFAULT_BASE_VALUE: Decimal = dec!(100);

/// Per-timestamp accumulator for the weighted aggregation pass.
#[derive(Default)]
struct Bucket {
    weighted_return: Decimal,
    total_weight: Decimal,
    total_market_cap: Decimal,
}

/// Builds a capitalization-weighted index series over the given observations.
///
/// Per timestamp t over all tokens present at t:
/// `index_return(t) = Σ(lagged_weight · simple_return) / Σ(lagged_weight)`,
/// defined as 0 when the total lagged weight is 0 — the very first period,
/// or a period where every constituent is newly listed, carries the index
/// flat instead of amplifying a near-zero denominator. Levels compound from
/// `base_value`, so the first point's `index_value` equals `base_value`
/// exactly.
///
/// Aggregation iterates tokens in lexicographic id order within ascending
/// timestamps, so repeated runs over the same input produce identical output.
pub fn build_index(
    observations: &[Observation],
    base_value: Decimal,
) -> Result<IndexSeries, IndexError> {
    let series = normalizer::normalize(observations)?;

    let mut buckets: BTreeMap<DateTime<Utc>, Bucket> = BTreeMap::new();
    for token in series.values() {
        for record in &token.records {
            let bucket = buckets.entry(record.timestamp).or_default();
            bucket.weighted_return += record.lagged_weight * record.simple_return;
            bucket.total_weight += record.lagged_weight;
            bucket.total_market_cap += record.market_cap;
        }
    }

    let mut points = Vec::with_capacity(buckets.len());
    let mut level = base_value;
    for (timestamp, bucket) in buckets {
        let index_return = if bucket.total_weight > Decimal::ZERO {
            bucket.weighted_return / bucket.total_weight
        } else {
            Decimal::ZERO
        };
        level *= Decimal::ONE + index_return;
        points.push(IndexPoint {
            timestamp,
            index_return,
            index_value: level,
            normalized_index: level,
            total_market_cap: bucket.total_market_cap,
        });
    }

    tracing::debug!(
        tokens = series.len(),
        points = points.len(),
        "built capitalization-weighted index"
    );
    Ok(IndexSeries::new(points))
}

/// Builds the index restricted to tokens whose tag set contains `tag`.
///
/// Membership is an exact match over each token's parsed `TagSet`. An empty
/// result is a normal outcome (no token carries the tag, or no tagged token
/// has observations), not an error — callers must treat it distinctly from
/// "tag unknown".
pub fn build_index_for_tag(
    observations: &[Observation],
    token_tags: &BTreeMap<String, TagSet>,
    tag: &str,
    base_value: Decimal,
) -> Result<IndexSeries, IndexError> {
    let filtered: Vec<Observation> = observations
        .iter()
        .filter(|o| token_tags.get(&o.token_id).is_some_and(|tags| tags.contains(tag)))
        .cloned()
        .collect();

    if filtered.is_empty() {
        tracing::debug!(tag = %tag, "no observations carry this tag");
        return Ok(IndexSeries::default());
    }

    build_index(&filtered, base_value)
}
