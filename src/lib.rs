use std::io::{self, Write};

use clap::Parser;

mod error;
mod rates;
mod upstream;

pub use error::{Error, Result};
pub use rates::{CurrencyRates, DailyRates, MAX_DAYS, Rate, RateFetcher, project};
pub use upstream::{Currency, PRIVATBANK_URL, PrivatBankClient, Quote, QuoteSource, parse_quotes};

/// Get EUR and USD cash exchange rates from PrivatBank for the last few days.
///
/// Prints one JSON object per day, today first. The bank only publishes the current quotation,
/// so every day shows today's rates.
#[derive(Parser)]
pub struct Cli {
    /// How many days to report, today included (at most 10)
    #[arg(value_name = "DAYS", value_parser = parse_days, allow_negative_numbers = true)]
    pub days: i64,
}

/// Any base-10 integer is accepted; values beyond `i64` saturate so the range check reports them.
fn parse_days(arg: &str) -> std::result::Result<i64, String> {
    let arg = arg.trim();
    match arg.parse::<i64>() {
        Ok(days) => Ok(days),
        Err(_) if is_integer(arg) => Ok(if arg.starts_with('-') { i64::MIN } else { i64::MAX }),
        Err(_) => Err("enter a valid number of days".to_string()),
    }
}

fn is_integer(arg: &str) -> bool {
    let digits = arg.strip_prefix(['+', '-']).unwrap_or(arg);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn retrieve_rates(args: &Cli) -> Result<Vec<DailyRates>> {
    RateFetcher::new(PrivatBankClient::default(), args.days).get_rates()
}

/// Pretty-print `rates` as a JSON array, followed by a newline.
pub fn write_rates(mut out: impl Write, rates: &[DailyRates]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, rates)?;
    writeln!(out)
}
