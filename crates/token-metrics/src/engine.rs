use chrono::{DateTime, Utc};
use core_types::{ReturnRecord, TokenMetricsRecord, TokenSeries};
use index_engine::IndexSeries;
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Minimum number of index-aligned observations a token needs before any
/// metric is computed for it.
pub const MIN_ALIGNED_OBSERVATIONS: usize = 10;

/// Observations per 24 hours at the 3-hour sampling interval.
pub const DAY_LOOKBACK: usize = 8;

/// Observations per 7 days at the 3-hour sampling interval.
pub const WEEK_LOOKBACK: usize = 56;

/// History required for the overbought coefficient: two consecutive
/// volume windows of [`VOLUME_WINDOW`] observations each.
pub const OVERBOUGHT_LOOKBACK: usize = 90;

const VOLUME_WINDOW: usize = 45;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Computes a [`TokenMetricsRecord`] for every token with at least
/// [`MIN_ALIGNED_OBSERVATIONS`] observations aligned with the index series.
///
/// The market return is re-derived as the pct-change of the compounded
/// `index_value`, not reused from `index_return` — the two can diverge by a
/// rounding-order effect, and downstream consumers expect the re-derived
/// series. Each token's return series is then inner-joined to the market
/// returns by timestamp; only aligned pairs feed the sensitivity and beta
/// calculations.
///
/// The sweep is read-only over shared input, so tokens are processed in
/// parallel and gathered into an ordered map.
pub fn compute_metrics(
    index: &IndexSeries,
    tokens: &BTreeMap<String, TokenSeries>,
) -> BTreeMap<String, TokenMetricsRecord> {
    let market = market_returns(index);

    let metrics: BTreeMap<String, TokenMetricsRecord> = tokens
        .par_iter()
        .filter_map(|(token_id, series)| {
            compute_token_metrics(&market, series).map(|record| (token_id.clone(), record))
        })
        .collect();

    tracing::info!(
        candidates = tokens.len(),
        computed = metrics.len(),
        "computed token metrics"
    );
    metrics
}

/// Pct-change series of the compounded index level, keyed by timestamp.
/// The first index timestamp carries a 0 market return.
fn market_returns(index: &IndexSeries) -> BTreeMap<DateTime<Utc>, Decimal> {
    let mut returns = BTreeMap::new();
    let mut previous: Option<Decimal> = None;
    for point in index.points() {
        let market_return = match previous {
            Some(prev) if prev > Decimal::ZERO => point.index_value / prev - Decimal::ONE,
            _ => Decimal::ZERO,
        };
        returns.insert(point.timestamp, market_return);
        previous = Some(point.index_value);
    }
    returns
}

fn compute_token_metrics(
    market: &BTreeMap<DateTime<Utc>, Decimal>,
    series: &TokenSeries,
) -> Option<TokenMetricsRecord> {
    // Inner join by timestamp: only periods present in both series count.
    let aligned: Vec<(Decimal, Decimal)> = series
        .records
        .iter()
        .filter_map(|r| market.get(&r.timestamp).map(|m| (*m, r.simple_return)))
        .collect();

    if aligned.len() < MIN_ALIGNED_OBSERVATIONS {
        tracing::debug!(
            token_id = %series.token_id,
            aligned = aligned.len(),
            "insufficient aligned history, token omitted"
        );
        return None;
    }

    let usens = directional_sensitivity(&aligned, Direction::Up);
    let dsens = directional_sensitivity(&aligned, Direction::Down);
    let beta = ols_slope(&aligned);

    let recent: Vec<&ReturnRecord> = series.records.iter().rev().collect();
    let change24h = trailing_change_pct(&recent, DAY_LOOKBACK);
    let change7d = trailing_change_pct(&recent, WEEK_LOOKBACK);
    let overbought_coef = overbought_coefficient(&recent, change7d);

    Some(TokenMetricsRecord {
        token_id: series.token_id.clone(),
        usens: usens.round_dp(2),
        dsens: dsens.round_dp(2),
        beta: beta.round_dp(2),
        change24h: change24h.round_dp(2),
        change7d: change7d.round_dp(2),
        overbought_coef: overbought_coef.round_dp(2),
    })
}

enum Direction {
    Up,
    Down,
}

/// Fraction of market-up (resp. market-down) periods in which the token moved
/// the same way; 0 when no period qualifies. Always within [0, 1].
fn directional_sensitivity(aligned: &[(Decimal, Decimal)], direction: Direction) -> Decimal {
    let qualifying: Vec<_> = aligned
        .iter()
        .filter(|(market_return, _)| match direction {
            Direction::Up => *market_return > Decimal::ZERO,
            Direction::Down => *market_return < Decimal::ZERO,
        })
        .collect();
    if qualifying.is_empty() {
        return Decimal::ZERO;
    }

    let matching = qualifying
        .iter()
        .filter(|(_, token_return)| match direction {
            Direction::Up => *token_return > Decimal::ZERO,
            Direction::Down => *token_return < Decimal::ZERO,
        })
        .count();
    Decimal::from(matching) / Decimal::from(qualifying.len())
}

/// Slope of the OLS regression of token return on market return (with
/// intercept). Algebraically identical to cov(market, token)/var(market), so
/// the zero-market-variance degenerate case and the unsolvable-regression
/// case collapse into one guard: both yield 0.
fn ols_slope(aligned: &[(Decimal, Decimal)]) -> Decimal {
    if aligned.len() < 2 {
        return Decimal::ZERO;
    }

    let n = Decimal::from(aligned.len());
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_xx = Decimal::ZERO;
    for (x, y) in aligned {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == Decimal::ZERO {
        return Decimal::ZERO;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Percentage price change between the most recent observation and the one
/// `lookback` observations earlier (inclusive of the endpoints). 0 when the
/// history is shorter than `lookback` or the reference price is 0.
fn trailing_change_pct(recent: &[&ReturnRecord], lookback: usize) -> Decimal {
    if recent.len() < lookback {
        return Decimal::ZERO;
    }
    let latest = recent[0].price;
    let reference = recent[lookback - 1].price;
    if reference <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (latest / reference - Decimal::ONE) * HUNDRED
}

/// Blends 7-day momentum with a volume-acceleration ratio: the most recent
/// 45-observation volume sum over the 45 before that, added to the (unrounded)
/// 7-day change. Falls back to the 7-day change alone when the prior window
/// had no volume, and to 0 outright below 90 observations. Missing volumes
/// count as 0.
fn overbought_coefficient(recent: &[&ReturnRecord], change7d: Decimal) -> Decimal {
    if recent.len() < OVERBOUGHT_LOOKBACK {
        return Decimal::ZERO;
    }

    let window_volume = |window: &[&ReturnRecord]| -> Decimal {
        window
            .iter()
            .map(|r| r.volume_24h.unwrap_or(Decimal::ZERO))
            .sum()
    };
    let recent_volume = window_volume(&recent[..VOLUME_WINDOW]);
    let prior_volume = window_volume(&recent[VOLUME_WINDOW..OVERBOUGHT_LOOKBACK]);

    if prior_volume > Decimal::ZERO {
        change7d + recent_volume / prior_volume
    } else {
        change7d
    }
}
