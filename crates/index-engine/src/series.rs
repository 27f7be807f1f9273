use core_types::IndexPoint;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = dec!(100);

/// An ordered capitalization-weighted index series.
///
/// Append-only by construction: a series is fully recomputed from scratch on
/// each build, never mutated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSeries {
    points: Vec<IndexPoint>,
}

impl IndexSeries {
    pub fn new(points: Vec<IndexPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[IndexPoint] {
        &self.points
    }

    pub fn latest(&self) -> Option<&IndexPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of the last `periods` index returns, as a percentage.
    ///
    /// This is the headline "market change" figure; with 3-hourly sampling,
    /// 8 periods approximate the last 24 hours. Uses whatever history exists
    /// when the series is shorter than `periods`.
    pub fn summed_change_pct(&self, periods: usize) -> Decimal {
        let start = self.points.len().saturating_sub(periods);
        self.points[start..]
            .iter()
            .map(|p| p.index_return)
            .sum::<Decimal>()
            * HUNDRED
    }

    /// Compounded change over the last `periods` index returns, as a
    /// percentage. Uses whatever history exists when the series is shorter.
    pub fn compounded_change_pct(&self, periods: usize) -> Decimal {
        let start = self.points.len().saturating_sub(periods);
        let compounded = self.points[start..]
            .iter()
            .fold(Decimal::ONE, |acc, p| acc * (Decimal::ONE + p.index_return));
        (compounded - Decimal::ONE) * HUNDRED
    }

    /// Percentage change between the last two index levels; 0 when fewer than
    /// two points exist or the previous level is 0.
    pub fn latest_value_change_pct(&self) -> Decimal {
        if self.points.len() < 2 {
            return Decimal::ZERO;
        }
        let latest = &self.points[self.points.len() - 1];
        let previous = &self.points[self.points.len() - 2];
        if previous.index_value == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (latest.index_value - previous.index_value) / previous.index_value * HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn point(period: i64, index_return: Decimal, index_value: Decimal) -> IndexPoint {
        IndexPoint {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + Duration::hours(3 * period),
            index_return,
            index_value,
            normalized_index: index_value,
            total_market_cap: dec!(1000),
        }
    }

    #[test]
    fn summed_change_uses_available_history() {
        let series = IndexSeries::new(vec![
            point(0, dec!(0), dec!(100)),
            point(1, dec!(0.01), dec!(101)),
            point(2, dec!(0.02), dec!(103.02)),
        ]);
        // Only three points exist, so an 8-period window sums all of them.
        assert_eq!(series.summed_change_pct(8), dec!(3));
        assert_eq!(series.summed_change_pct(1), dec!(2));
    }

    #[test]
    fn compounded_change_multiplies_returns() {
        let series = IndexSeries::new(vec![
            point(0, dec!(0.1), dec!(110)),
            point(1, dec!(0.1), dec!(121)),
        ]);
        assert_eq!(series.compounded_change_pct(2), dec!(21.00));
    }

    #[test]
    fn latest_value_change_needs_two_points() {
        let single = IndexSeries::new(vec![point(0, dec!(0), dec!(100))]);
        assert_eq!(single.latest_value_change_pct(), Decimal::ZERO);

        let series = IndexSeries::new(vec![
            point(0, dec!(0), dec!(100)),
            point(1, dec!(0.05), dec!(105)),
        ]);
        assert_eq!(series.latest_value_change_pct(), dec!(5));
    }
}
