use std::panic;
use std::thread;

use jiff::ToSpan;
use jiff::Zoned;
use jiff::civil::Date;
use log::info;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::upstream::{Currency, Quote, QuoteSource};

/// Furthest back the fetcher is allowed to go.
pub const MAX_DAYS: i64 = 10;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Buy and sell price of one currency, as quoted by the bank.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Rate {
    pub sale: String,
    /// Taken from the upstream `buy` field
    pub purchase: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CurrencyRates {
    #[serde(rename = "EUR")]
    pub eur: Rate,
    #[serde(rename = "USD")]
    pub usd: Rate,
}

/// Rates labelled with a single date.
///
/// Serializes as `{"DD.MM.YYYY": {"EUR": {..}, "USD": {..}}}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyRates {
    pub date: Date,
    pub rates: CurrencyRates,
}

impl DailyRates {
    pub fn date_label(&self) -> String {
        self.date.strftime(DATE_FORMAT).to_string()
    }
}

impl Serialize for DailyRates {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date_label(), &self.rates)?;
        map.end()
    }
}

/// Fetches the quotation once per requested day and labels each result with a date,
/// today first.
///
/// The upstream has no date parameter, so every day carries the current quotation.
pub struct RateFetcher<S> {
    source: S,
    days: i64,
}

impl<S: QuoteSource> RateFetcher<S> {
    pub fn new(source: S, days: i64) -> Self {
        Self { source, days }
    }

    pub fn get_rates(&self) -> Result<Vec<DailyRates>> {
        self.get_rates_on(Zoned::now().date())
    }

    /// Same as [`RateFetcher::get_rates`], with `today` fixed by the caller.
    pub fn get_rates_on(&self, today: Date) -> Result<Vec<DailyRates>> {
        let days = self.checked_days()?;
        info!("fetching rates for {days} day(s) ending {today}");

        self.fan_out(days)?
            .iter()
            .enumerate()
            .map(|(i, quotes)| {
                Ok(DailyRates {
                    date: today.saturating_sub((i as i64).days()),
                    rates: project(quotes)?,
                })
            })
            .collect()
    }

    fn checked_days(&self) -> Result<usize> {
        match self.days {
            d if d > MAX_DAYS => Err(Error::TooManyDays {
                requested: d,
                max: MAX_DAYS,
            }),
            d if d < 1 => Err(Error::NoDays(d)),
            d => Ok(d as usize),
        }
    }

    /// Run `days` fetches at once, returning their results in spawn order.
    fn fan_out(&self, days: usize) -> Result<Vec<Vec<Quote>>> {
        thread::scope(|scope| {
            let workers: Vec<_> = (0..days)
                .map(|_| scope.spawn(|| self.source.fetch()))
                .collect();

            workers
                .into_iter()
                .map(|worker| worker.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        })
    }
}

/// Pick the first EUR and USD rows out of a quotation.
pub fn project(quotes: &[Quote]) -> Result<CurrencyRates> {
    Ok(CurrencyRates {
        eur: find_rate(quotes, Currency::Eur)?,
        usd: find_rate(quotes, Currency::Usd)?,
    })
}

fn find_rate(quotes: &[Quote], currency: Currency) -> Result<Rate> {
    quotes
        .iter()
        .find(|quote| quote.ccy == currency.code())
        .map(|quote| Rate {
            sale: quote.sale.clone(),
            purchase: quote.buy.clone(),
        })
        .ok_or(Error::MissingCurrency(currency))
}
