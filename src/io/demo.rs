//! Built-in sample timeline, used when no dataset is supplied.

use crate::core::model::{CategorySet, EntityRecord, SnapshotInput, Timeline};
use crate::layout::seed::stable_hash;

const MONTHS: [&str; 12] = [
    "2023-01", "2023-02", "2023-03", "2023-04", "2023-05", "2023-06", "2023-07", "2023-08",
    "2023-09", "2023-10", "2023-11", "2023-12",
];

/// (ticker, sector, starting market cap in $bn, first month listed, last month listed)
const TICKERS: &[(&str, &str, f32, usize, usize)] = &[
    ("AAPL", "Information Technology", 2600.0, 0, 11),
    ("MSFT", "Information Technology", 2300.0, 0, 11),
    ("NVDA", "Information Technology", 900.0, 0, 11),
    ("ORCL", "Information Technology", 300.0, 0, 11),
    ("ARM", "Information Technology", 55.0, 8, 11),
    ("GOOGL", "Communication Services", 1500.0, 0, 11),
    ("META", "Communication Services", 700.0, 0, 11),
    ("NFLX", "Communication Services", 180.0, 0, 11),
    ("AMZN", "Consumer Discretionary", 1300.0, 0, 11),
    ("TSLA", "Consumer Discretionary", 650.0, 0, 11),
    ("NKE", "Consumer Discretionary", 170.0, 0, 11),
    ("BBBY", "Consumer Discretionary", 0.5, 0, 4),
    ("PG", "Consumer Staples", 350.0, 0, 11),
    ("KO", "Consumer Staples", 260.0, 0, 11),
    ("KVUE", "Consumer Staples", 45.0, 4, 11),
    ("LLY", "Health Care", 500.0, 0, 11),
    ("JNJ", "Health Care", 420.0, 0, 11),
    ("SGEN", "Health Care", 38.0, 0, 11),
    ("JPM", "Financials", 420.0, 0, 11),
    ("V", "Financials", 470.0, 0, 11),
    ("SIVB", "Financials", 15.0, 0, 2),
    ("FRC", "Financials", 20.0, 0, 3),
    ("GE", "Industrials", 100.0, 0, 11),
    ("CAT", "Industrials", 130.0, 0, 11),
    ("GEHC", "Industrials", 35.0, 0, 11),
    ("XOM", "Energy", 450.0, 0, 11),
    ("CVX", "Energy", 330.0, 0, 11),
    ("PXD", "Energy", 55.0, 0, 11),
    ("LIN", "Materials", 170.0, 0, 11),
    ("NEM", "Materials", 40.0, 0, 11),
    ("NEE", "Utilities", 150.0, 0, 11),
    ("DUK", "Utilities", 75.0, 0, 11),
    ("PLD", "Real Estate", 120.0, 0, 11),
    ("AMT", "Real Estate", 95.0, 0, 11),
    ("CAVA", "Consumer Discretionary", 6.0, 5, 11),
];

/// Month-over-month percent change in `[-12, 12]`, reproducible per (ticker, month).
fn monthly_change(ticker: &str, month: usize) -> f32 {
    let h = stable_hash(&format!("{ticker}:{month}"));
    let unit = (h % 10_000) as f32 / 10_000.0;
    (unit * 2.0 - 1.0) * 12.0
}

/// Twelve monthly snapshots over the given categories. Tickers whose sector is
/// not in `categories` are left out.
pub fn sample_timeline(categories: &CategorySet) -> Timeline {
    let mut caps: Vec<f32> = TICKERS.iter().map(|t| t.2).collect();
    let snapshots = MONTHS
        .iter()
        .enumerate()
        .map(|(month, label)| {
            let records = TICKERS
                .iter()
                .zip(caps.iter_mut())
                .filter_map(|(&(ticker, sector, _, first, last), cap)| {
                    let change = monthly_change(ticker, month);
                    *cap *= 1.0 + change / 100.0;
                    if month < first || month > last {
                        return None;
                    }
                    let category = categories.id_of(sector)?;
                    Some(EntityRecord::new(ticker, category, change, *cap * 1e9))
                })
                .collect();
            SnapshotInput::new(month, *label, records)
        })
        .collect();
    Timeline {
        categories: categories.clone(),
        snapshots,
    }
}
