use std::fmt;

use log::debug;
use serde::Deserialize;
use ureq::Agent;
use ureq::http::StatusCode;

use crate::error::{Error, Result};

/// Public cash exchange rates, always the current quotation.
pub const PRIVATBANK_URL: &str = "https://api.privatbank.ua/p24api/pubinfo?json&exchange&coursid=5";

/// One row of the PrivatBank quotation.
///
/// Prices are kept as the strings the bank sent, so they can be echoed back without rounding.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub ccy: String,
    pub base_ccy: String,
    pub buy: String,
    pub sale: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Currency {
    Eur,
    Usd,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Anything that can produce the current list of quotes.
///
/// Shared between the fan-out workers, hence `Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait QuoteSource: Sync {
    fn fetch(&self) -> Result<Vec<Quote>>;
}

pub struct PrivatBankClient {
    agent: Agent,
    url: String,
}

impl PrivatBankClient {
    pub fn new() -> Self {
        Self::with_url(PRIVATBANK_URL)
    }

    /// Client for a PrivatBank-compatible endpoint other than the public one.
    pub fn with_url(url: impl Into<String>) -> Self {
        // Status codes are checked by hand so a non-200 keeps its code
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
        }
    }
}

impl Default for PrivatBankClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for PrivatBankClient {
    fn fetch(&self) -> Result<Vec<Quote>> {
        debug!("GET {}", self.url);
        let mut resp = self.agent.get(&self.url).call()?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::UpstreamStatus(status.as_u16()));
        }

        let body = resp.body_mut().read_to_string()?;
        parse_quotes(&body)
    }
}

/// Decode a quotation body into typed rows.
pub fn parse_quotes(body: &str) -> Result<Vec<Quote>> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    const QUOTATION: &str = r#"[
        {"ccy":"EUR","base_ccy":"UAH","buy":"40.00","sale":"41.00"},
        {"ccy":"USD","base_ccy":"UAH","buy":"37.00","sale":"38.00"}
    ]"#;

    /// Serve one raw HTTP response on a local port and return its URL.
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/p24api/pubinfo", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        url
    }

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn fetches_quotation() {
        let client = PrivatBankClient::with_url(serve_once(response("200 OK", QUOTATION)));
        let quotes = client.fetch().unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].sale, "38.00");
    }

    #[test]
    fn server_error_keeps_status() {
        let url = serve_once(response("500 Internal Server Error", "oops"));
        let err = PrivatBankClient::with_url(url).fetch().unwrap_err();
        assert!(matches!(err, Error::UpstreamStatus(500)));
        assert_eq!(err.to_string(), "PrivatBank responded with HTTP 500");
    }

    #[test]
    fn non_ok_success_is_rejected() {
        let url = serve_once(response("204 No Content", ""));
        let err = PrivatBankClient::with_url(url).fetch().unwrap_err();
        assert!(matches!(err, Error::UpstreamStatus(204)));
    }

    #[test]
    fn bad_body_is_decode_error() {
        let url = serve_once(response("200 OK", "<html>maintenance</html>"));
        let err = PrivatBankClient::with_url(url).fetch().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = PrivatBankClient::with_url(format!("http://{addr}/"))
            .fetch()
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn parses_quotation_body() {
        let body = r#"[
            {"ccy":"EUR","base_ccy":"UAH","buy":"40.00","sale":"41.00"},
            {"ccy":"USD","base_ccy":"UAH","buy":"37.00","sale":"38.00"}
        ]"#;
        let quotes = parse_quotes(body).expect("valid body");
        assert_eq!(quotes.len(), 2);
        assert_eq!(
            quotes[0],
            Quote {
                ccy: "EUR".into(),
                base_ccy: "UAH".into(),
                buy: "40.00".into(),
                sale: "41.00".into(),
            }
        );
        assert_eq!(quotes[1].ccy, "USD");
    }

    #[test]
    fn keeps_prices_verbatim() {
        let body = r#"[{"ccy":"USD","base_ccy":"UAH","buy":"41.35000","sale":"41.9500"}]"#;
        let quotes = parse_quotes(body).unwrap();
        assert_eq!(quotes[0].buy, "41.35000");
        assert_eq!(quotes[0].sale, "41.9500");
    }

    #[test]
    fn ignores_unknown_fields() {
        let body = r#"[{"ccy":"EUR","base_ccy":"UAH","buy":"1","sale":"2","extra":true}]"#;
        assert_eq!(parse_quotes(body).unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_quotes("<html>"), Err(Error::Decode(_))));
    }

    #[test]
    fn rejects_unexpected_shape() {
        // Numbers instead of strings
        let body = r#"[{"ccy":"EUR","base_ccy":"UAH","buy":40.0,"sale":41.0}]"#;
        assert!(matches!(parse_quotes(body), Err(Error::Decode(_))));
        assert!(matches!(parse_quotes(r#"{"ccy":"EUR"}"#), Err(Error::Decode(_))));
    }

    #[test]
    fn currency_codes() {
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(Currency::Usd.code(), "USD");
    }
}
