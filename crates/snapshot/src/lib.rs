//! # Market Snapshot
//!
//! Bundles one full calculation pass — the overall capitalization-weighted
//! index, one index per tag, and per-token metrics — into a single immutable
//! value object.
//!
//! ## Architectural Principles
//!
//! - **Explicit recomputation:** a snapshot is built by [`MarketSnapshot::compute`]
//!   and replaced by [`MarketSnapshot::refresh`]. There is no import-time or
//!   process-start side effect; the owner (typically a serving layer) decides
//!   when to recompute and holds the single copy.
//! - **Read-only thereafter:** everything derived from a snapshot — market
//!   change, heatmap entries, best-performing tag — is computed from its
//!   immutable series.

use chrono::{DateTime, Utc};
use core_types::{Observation, TagSet, TokenMeta, TokenMetricsRecord};
use index_engine::IndexSeries;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub mod error;

pub use error::SnapshotError;

/// Periods per 24 hours at the 3-hour sampling interval.
const DAY_PERIODS: usize = 8;

/// Periods used for a tag's headline 7-period compounded change.
const BEST_TAG_TRAILING_PERIODS: usize = 7;

/// One tag's entry in the market heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapEntry {
    pub tag: String,
    pub total_market_cap: Decimal,
    pub change_24h_pct: Decimal,
}

/// The tag whose index gained the most over the last day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTag {
    pub tag: String,
    pub change_24h_pct: Decimal,
    pub change_7d_pct: Decimal,
}

/// The complete output of one calculation pass over an observation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    computed_at: DateTime<Utc>,
    overall: IndexSeries,
    tag_indices: BTreeMap<String, IndexSeries>,
    token_metrics: BTreeMap<String, TokenMetricsRecord>,
}

impl MarketSnapshot {
    /// Runs the full pipeline: overall index, one index per tag found in the
    /// metadata (empty tag series are dropped), and token metrics against the
    /// overall index.
    pub fn compute(
        observations: &[Observation],
        metadata: &[TokenMeta],
        base_value: Decimal,
    ) -> Result<Self, SnapshotError> {
        let token_tags: BTreeMap<String, TagSet> = metadata
            .iter()
            .map(|meta| (meta.id.clone(), meta.tags.clone()))
            .collect();
        let tag_universe: BTreeSet<String> = metadata
            .iter()
            .flat_map(|meta| meta.tags.iter().map(str::to_string))
            .collect();

        let overall = index_engine::build_index(observations, base_value)?;

        let mut tag_indices = BTreeMap::new();
        for tag in &tag_universe {
            let series =
                index_engine::build_index_for_tag(observations, &token_tags, tag, base_value)?;
            if !series.is_empty() {
                tag_indices.insert(tag.clone(), series);
            }
        }

        let tokens = normalizer::normalize(observations)?;
        let token_metrics = token_metrics::compute_metrics(&overall, &tokens);

        tracing::info!(
            index_points = overall.len(),
            tag_indices = tag_indices.len(),
            tokens_with_metrics = token_metrics.len(),
            "computed market snapshot"
        );
        Ok(Self {
            computed_at: Utc::now(),
            overall,
            tag_indices,
            token_metrics,
        })
    }

    /// Recomputes the snapshot in place from a fresh observation set.
    pub fn refresh(
        &mut self,
        observations: &[Observation],
        metadata: &[TokenMeta],
        base_value: Decimal,
    ) -> Result<(), SnapshotError> {
        *self = Self::compute(observations, metadata, base_value)?;
        Ok(())
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn overall(&self) -> &IndexSeries {
        &self.overall
    }

    pub fn tag_index(&self, tag: &str) -> Option<&IndexSeries> {
        self.tag_indices.get(tag)
    }

    /// Tags that produced a non-empty index, in lexicographic order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_indices.keys().map(String::as_str)
    }

    pub fn token_metrics(&self) -> &BTreeMap<String, TokenMetricsRecord> {
        &self.token_metrics
    }

    pub fn metrics_for(&self, token_id: &str) -> Option<&TokenMetricsRecord> {
        self.token_metrics.get(token_id)
    }

    /// The overall index's summed return over the last day, as a percentage.
    pub fn market_change_24h_pct(&self) -> Decimal {
        self.overall.summed_change_pct(DAY_PERIODS)
    }

    /// One entry per tag index: latest total market cap and the change
    /// between the last two index levels.
    pub fn heatmap(&self) -> Vec<HeatmapEntry> {
        self.tag_indices
            .iter()
            .filter_map(|(tag, series)| {
                series.latest().map(|latest| HeatmapEntry {
                    tag: tag.clone(),
                    total_market_cap: latest.total_market_cap,
                    change_24h_pct: series.latest_value_change_pct(),
                })
            })
            .collect()
    }

    /// The tag with the highest summed day change among tags with at least
    /// two index points. Lexicographically first on exact ties; `None` when
    /// no tag qualifies.
    pub fn best_performing_tag(&self) -> Option<BestTag> {
        let mut best: Option<BestTag> = None;
        for (tag, series) in &self.tag_indices {
            if series.len() < 2 {
                continue;
            }
            let change_24h_pct = series.summed_change_pct(DAY_PERIODS);
            if best
                .as_ref()
                .is_none_or(|current| change_24h_pct > current.change_24h_pct)
            {
                best = Some(BestTag {
                    tag: tag.clone(),
                    change_24h_pct,
                    change_7d_pct: series.compounded_change_pct(BEST_TAG_TRAILING_PERIODS),
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use index_engine::DEFAULT_BASE_VALUE;
    use rust_decimal_macros::dec;

    fn ts(period: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(3 * period)
    }

    fn obs(token: &str, period: i64, price: Decimal) -> Observation {
        Observation {
            token_id: token.to_string(),
            timestamp: ts(period),
            price,
            market_cap: price * dec!(1000),
            volume_24h: Some(dec!(10)),
        }
    }

    fn meta(id: &str, tags: &str) -> TokenMeta {
        TokenMeta {
            id: id.to_string(),
            name: id.to_uppercase(),
            symbol: id.to_uppercase(),
            tags: TagSet::parse(tags),
        }
    }

    /// Twelve periods for three tokens: "up" gains 2% per period, "down"
    /// loses 2%, "flat" holds.
    fn universe() -> (Vec<Observation>, Vec<TokenMeta>) {
        let mut observations = Vec::new();
        let mut up = dec!(10);
        let mut down = dec!(10);
        for period in 0..12i64 {
            if period > 0 {
                up = (up * dec!(1.02)).normalize();
                down = (down * dec!(0.98)).normalize();
            }
            observations.push(obs("up", period, up));
            observations.push(obs("down", period, down));
            observations.push(obs("flat", period, dec!(10)));
        }
        let metadata = vec![
            meta("up", "gainers,defi"),
            meta("down", "losers,defi"),
            meta("flat", "stable"),
            // In the metadata but without observations: its tag must not
            // produce an index.
            meta("ghost", "phantom"),
        ];
        (observations, metadata)
    }

    #[test]
    fn compute_builds_overall_tag_indices_and_metrics() {
        let (observations, metadata) = universe();
        let snapshot =
            MarketSnapshot::compute(&observations, &metadata, DEFAULT_BASE_VALUE).unwrap();

        assert_eq!(snapshot.overall().len(), 12);
        assert_eq!(snapshot.overall().points()[0].index_value, dec!(100));

        let tags: Vec<_> = snapshot.tags().collect();
        assert_eq!(tags, vec!["defi", "gainers", "losers", "stable"]);
        assert!(snapshot.tag_index("phantom").is_none());

        // All three observed tokens clear the 10-aligned-observation floor.
        assert_eq!(snapshot.token_metrics().len(), 3);
        assert!(snapshot.metrics_for("up").is_some());
        assert!(snapshot.metrics_for("ghost").is_none());
    }

    #[test]
    fn tag_indices_cover_only_their_constituents() {
        let (observations, metadata) = universe();
        let snapshot =
            MarketSnapshot::compute(&observations, &metadata, DEFAULT_BASE_VALUE).unwrap();

        let gainers = snapshot.tag_index("gainers").unwrap();
        // A single-constituent index reproduces that token's returns.
        assert_eq!(gainers.points()[1].index_return, dec!(0.02));
        assert_eq!(gainers.points()[1].total_market_cap, dec!(10200));

        let stable = snapshot.tag_index("stable").unwrap();
        assert_eq!(stable.latest().unwrap().index_value, dec!(100));
    }

    #[test]
    fn heatmap_and_best_tag_derive_from_tag_indices() {
        let (observations, metadata) = universe();
        let snapshot =
            MarketSnapshot::compute(&observations, &metadata, DEFAULT_BASE_VALUE).unwrap();

        let heatmap = snapshot.heatmap();
        assert_eq!(heatmap.len(), 4);
        assert_eq!(heatmap[0].tag, "defi");
        let gainers_entry = heatmap.iter().find(|e| e.tag == "gainers").unwrap();
        assert_eq!(gainers_entry.change_24h_pct, dec!(2));

        let best = snapshot.best_performing_tag().unwrap();
        assert_eq!(best.tag, "gainers");
        // Eleven 2% returns summed, capped at the last 8: 16%.
        assert_eq!(best.change_24h_pct, dec!(16));
        assert!(best.change_7d_pct > Decimal::ZERO);
    }

    #[test]
    fn market_change_sums_last_day_of_returns() {
        let (observations, metadata) = universe();
        let snapshot =
            MarketSnapshot::compute(&observations, &metadata, DEFAULT_BASE_VALUE).unwrap();
        assert_eq!(
            snapshot.market_change_24h_pct(),
            snapshot.overall().summed_change_pct(8)
        );
    }

    #[test]
    fn refresh_replaces_the_snapshot_contents() {
        let (mut observations, metadata) = universe();
        let mut snapshot =
            MarketSnapshot::compute(&observations, &metadata, DEFAULT_BASE_VALUE).unwrap();
        assert_eq!(snapshot.overall().len(), 12);

        observations.push(obs("up", 12, dec!(13)));
        observations.push(obs("down", 12, dec!(8)));
        snapshot
            .refresh(&observations, &metadata, DEFAULT_BASE_VALUE)
            .unwrap();
        assert_eq!(snapshot.overall().len(), 13);
    }

    #[test]
    fn empty_universe_yields_empty_snapshot() {
        let snapshot = MarketSnapshot::compute(&[], &[], DEFAULT_BASE_VALUE).unwrap();
        assert!(snapshot.overall().is_empty());
        assert_eq!(snapshot.tags().count(), 0);
        assert!(snapshot.token_metrics().is_empty());
        assert!(snapshot.best_performing_tag().is_none());
    }
}
