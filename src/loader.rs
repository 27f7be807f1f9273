//! CSV loading for the observation and metadata feeds.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use core_types::{Observation, TagSet, TokenMeta};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// One row of the price feed. Timestamps arrive either as RFC 3339 or as the
/// bare `YYYY-MM-DD HH:MM:SS` form, so they are parsed explicitly.
#[derive(Debug, Deserialize)]
struct PriceRow {
    id: String,
    timestamp: String,
    price: Decimal,
    market_cap: Decimal,
    volume_24h: Option<Decimal>,
}

/// One row of the metadata feed; `tags` is a comma-delimited string.
#[derive(Debug, Deserialize)]
struct MetadataRow {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    tags: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Unparseable timestamp '{raw}'"))?;
    Ok(naive.and_utc())
}

/// Loads the observation feed from a CSV file with columns
/// `id,timestamp,price,market_cap,volume_24h`.
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open prices file: {:?}", path.as_ref()))?;

    let mut reader = csv::Reader::from_reader(file);
    let mut observations = Vec::new();
    for result in reader.deserialize() {
        let row: PriceRow = result.context("Failed to parse price row")?;
        observations.push(Observation {
            timestamp: parse_timestamp(&row.timestamp)
                .with_context(|| format!("token {}", row.id))?,
            token_id: row.id,
            price: row.price,
            market_cap: row.market_cap,
            volume_24h: row.volume_24h,
        });
    }
    Ok(observations)
}

/// Loads token metadata from a CSV file with columns `id,name,symbol,tags`.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<TokenMeta>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open metadata file: {:?}", path.as_ref()))?;

    let mut reader = csv::Reader::from_reader(file);
    let mut metadata = Vec::new();
    for result in reader.deserialize() {
        let row: MetadataRow = result.context("Failed to parse metadata row")?;
        metadata.push(TokenMeta {
            id: row.id,
            name: row.name,
            symbol: row.symbol,
            tags: TagSet::parse(&row.tags),
        });
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn loads_observations_with_optional_volume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,timestamp,price,market_cap,volume_24h").unwrap();
        writeln!(file, "sol,2025-01-01 00:00:00,10.5,1000,250").unwrap();
        writeln!(file, "sol,2025-01-01T03:00:00Z,11,1100,").unwrap();
        drop(file);

        let observations = load_observations(&path).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].price, dec!(10.5));
        assert_eq!(observations[0].volume_24h, Some(dec!(250)));
        assert_eq!(observations[1].volume_24h, None);
        assert_eq!(
            observations[1].timestamp - observations[0].timestamp,
            chrono::Duration::hours(3)
        );
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,timestamp,price,market_cap,volume_24h").unwrap();
        writeln!(file, "sol,yesterday,10,1000,").unwrap();
        drop(file);

        assert!(load_observations(&path).is_err());
    }

    #[test]
    fn loads_metadata_and_parses_tags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metadata.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,name,symbol,tags").unwrap();
        writeln!(file, "sol,Solana,SOL,\"defi, memes\"").unwrap();
        writeln!(file, "bare,Bare,BARE,").unwrap();
        drop(file);

        let metadata = load_metadata(&path).unwrap();
        assert_eq!(metadata.len(), 2);
        assert!(metadata[0].tags.contains("defi"));
        assert!(metadata[0].tags.contains("memes"));
        assert!(metadata[1].tags.is_empty());
    }
}
