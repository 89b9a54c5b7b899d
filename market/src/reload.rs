//! One-shot historical reload from a `timestamp,price` table.
//!
//! The first line is a header. The ticker comes from the file name's
//! leading `_`-separated token, so `aapl_price.csv` reloads `AAPL`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::ReloadError;
use crate::types::{PricePoint, Ticker, Timestamp};

#[derive(Clone, Debug, PartialEq)]
pub struct ReloadedSeries {
    pub ticker: Ticker,
    pub points: Vec<PricePoint>,
}

pub fn reload_from_source(path: &Path) -> Result<ReloadedSeries, ReloadError> {
    let ticker = ticker_from_path(path)?;

    let file = File::open(path).map_err(|source| ReloadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let points = parse_table(BufReader::new(file), path)?;

    info!(
        ticker = %ticker,
        points = points.len(),
        path = %path.display(),
        "price history reloaded from file"
    );

    Ok(ReloadedSeries { ticker, points })
}

pub fn ticker_from_path(path: &Path) -> Result<Ticker, ReloadError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split('_').next())
        .and_then(Ticker::parse)
        .ok_or_else(|| ReloadError::NoTicker(path.to_path_buf()))
}

/// Parses rows after the header. Blank lines are skipped; anything else
/// that is not `timestamp,price` fails the whole table.
pub fn parse_table<R: BufRead>(reader: R, path: &Path) -> Result<Vec<PricePoint>, ReloadError> {
    let malformed = |line: usize, reason: String| ReloadError::Malformed {
        path: PathBuf::from(path),
        line,
        reason,
    };

    let mut points = Vec::new();
    for (idx, line) in reader.lines().enumerate().skip(1) {
        let line = line.map_err(|source| ReloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let line_no = idx + 1;
        let row = line.trim();
        if row.is_empty() {
            continue;
        }

        let (raw_ts, raw_price) = row
            .split_once(',')
            .ok_or_else(|| malformed(line_no, "expected `timestamp,price`".into()))?;

        let timestamp: Timestamp = raw_ts
            .parse()
            .map_err(|e| malformed(line_no, format!("bad timestamp {raw_ts:?}: {e}")))?;
        let price: f64 = raw_price
            .trim()
            .parse()
            .map_err(|e| malformed(line_no, format!("bad price {raw_price:?}: {e}")))?;

        points.push(PricePoint::new(timestamp, price));
    }

    Ok(points)
}
