use crate::upstream::Currency;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot retrieve rates for more than {max} days")]
    TooManyDays { requested: i64, max: i64 },
    #[error("number of days must be at least 1 (got {0})")]
    NoDays(i64),
    #[error("failure while accessing PrivatBank: {0}")]
    Transport(#[from] ureq::Error),
    #[error("PrivatBank responded with HTTP {0}")]
    UpstreamStatus(u16),
    #[error("failed to parse exchange data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no {0} quote in PrivatBank response")]
    MissingCurrency(Currency),
}

pub type Result<T> = std::result::Result<T, Error>;
