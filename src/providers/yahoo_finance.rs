use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{DailyClose, PriceProvider};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Trading date of a bar in the exchange's own time zone.
fn exchange_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

fn extract_daily_closes(item: &PriceChartItem) -> Vec<DailyClose> {
    let (Some(timestamps), Some(closes)) = (item.timestamp.as_ref(), item.closes()) else {
        return Vec::new();
    };
    let gmt_offset = item.meta.gmt_offset.unwrap_or(0);

    let mut daily: Vec<DailyClose> = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            exchange_date(*ts, gmt_offset).map(|date| DailyClose {
                date,
                close: (*close).filter(|c| c.is_finite()),
            })
        })
        .collect();

    // The live bar can repeat the last session's date; keep the newest one.
    daily.reverse();
    daily.dedup_by_key(|p| p.date);
    daily.reverse();
    daily.sort_by_key(|p| p.date);
    daily
}

// YahooFinanceProvider implementation for PriceProvider
pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(&self, symbol: &str, range: &str) -> Result<PriceChartItem> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range={}",
            self.base_url, symbol, range
        );
        debug!("Requesting price data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("stocksuggest/1.0")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        debug!(status = %response.status(), "Received Yahoo response");

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooPriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Yahoo error for symbol {}: {}",
                symbol,
                error.description
            ));
        }

        data.chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    description: String,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

impl PriceChartItem {
    fn closes(&self) -> Option<&Vec<Option<f64>>> {
        self.indicators
            .as_ref()
            .and_then(|inds| inds.quote.first())
            .and_then(|q| q.close.as_ref())
    }
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "gmtoffset")]
    gmt_offset: Option<i64>,
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooLatestClose",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_latest_close(&self, symbol: &str) -> Result<f64> {
        let item = self.fetch_chart(symbol, "1d").await?;

        item.closes()
            .and_then(|closes| closes.iter().rev().find_map(|c| *c))
            .or(item.meta.regular_market_price)
            .ok_or_else(|| anyhow!("No close price found for symbol: {}", symbol))
    }

    #[instrument(
        name = "YahooDailyCloses",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> Result<Vec<DailyClose>> {
        let item = self.fetch_chart(symbol, &format!("{days}d")).await?;

        let daily = extract_daily_closes(&item);
        if daily.is_empty() {
            return Err(anyhow!("No price history found for symbol: {}", symbol));
        }
        debug!("Parsed {} daily closes", daily.len());
        Ok(daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(
        symbol: &str,
        range: &str,
        status: u16,
        mock_response: &str,
    ) -> wiremock::MockServer {
        let mock_server = wiremock::MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .and(query_param("interval", "1d"))
            .and(query_param("range", range))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_latest_close_from_quote() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "regularMarketPrice": 150.65,
                        "currency": "USD",
                        "gmtoffset": -14400
                    },
                    "timestamp": [1709904600],
                    "indicators": {
                        "quote": [{
                            "close": [149.5]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let mock_server = create_mock_server("AAPL", "1d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let price = provider.fetch_latest_close("AAPL").await.unwrap();
        assert_eq!(price, 149.5);
    }

    #[tokio::test]
    async fn test_latest_close_falls_back_to_market_price() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "regularMarketPrice": 150.65,
                        "currency": "USD"
                    }
                }]
            }
        }"#;

        let mock_server = create_mock_server("AAPL", "1d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let price = provider.fetch_latest_close("AAPL").await.unwrap();
        assert_eq!(price, 150.65);
    }

    #[tokio::test]
    async fn test_daily_closes_use_exchange_dates() {
        // 2024-03-04..08 at 09:30 New York (UTC-5), last bar at 20:00 UTC
        // on the 8th which is still the 8th in New York.
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "regularMarketPrice": 170.73,
                        "currency": "USD",
                        "gmtoffset": -18000
                    },
                    "timestamp": [1709562600, 1709649000, 1709735400, 1709821800, 1709928000],
                    "indicators": {
                        "quote": [{
                            "close": [175.1, 170.12, null, 169.0, 170.73]
                        }]
                    }
                }]
            }
        }"#;

        let mock_server = create_mock_server("AAPL", "6d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let closes = provider.fetch_daily_closes("AAPL", 6).await.unwrap();

        assert_eq!(
            closes,
            vec![
                DailyClose {
                    date: date(2024, 3, 4),
                    close: Some(175.1)
                },
                DailyClose {
                    date: date(2024, 3, 5),
                    close: Some(170.12)
                },
                DailyClose {
                    date: date(2024, 3, 6),
                    close: None
                },
                DailyClose {
                    date: date(2024, 3, 7),
                    close: Some(169.0)
                },
                DailyClose {
                    date: date(2024, 3, 8),
                    close: Some(170.73)
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_daily_closes_keep_newest_bar_per_date() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 0 },
                    "timestamp": [1709892000, 1709913600],
                    "indicators": { "quote": [{ "close": [10.0, 11.0] }] }
                }]
            }
        }"#;

        let mock_server = create_mock_server("IBM", "6d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let closes = provider.fetch_daily_closes("IBM", 6).await.unwrap();
        assert_eq!(
            closes,
            vec![DailyClose {
                date: date(2024, 3, 8),
                close: Some(11.0)
            }]
        );
    }

    #[tokio::test]
    async fn test_daily_closes_without_bars_is_an_error() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 10.0 }
                }]
            }
        }"#;

        let mock_server = create_mock_server("IBM", "6d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let result = provider.fetch_daily_closes("IBM", 6).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price history found for symbol: IBM"
        );
    }

    #[tokio::test]
    async fn test_no_price_result_data() {
        let mock_response = r#"{"chart": {"result": []}}"#;
        let mock_server = create_mock_server("INVALID", "1d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let result = provider.fetch_latest_close("INVALID").await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: INVALID"
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_error_response() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        }"#;
        let mock_server = create_mock_server("GONE", "1d", 404, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let result = provider.fetch_latest_close("GONE").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for symbol: GONE"
        );
    }

    #[tokio::test]
    async fn test_yahoo_error_body_with_success_status() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        }"#;
        let mock_server = create_mock_server("GONE", "6d", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let result = provider.fetch_daily_closes("GONE", 6).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Yahoo error for symbol GONE: No data found, symbol may be delisted"
        );
    }

    #[tokio::test]
    async fn test_yahoo_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"charts": []}"#))
            .mount(&mock_server)
            .await;

        let provider = YahooFinanceProvider::new(&mock_server.uri());
        let result = provider.fetch_latest_close("AAPL").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for AAPL")
        );
    }

    #[test]
    fn test_exchange_date_shifts_by_offset() {
        // 2024-03-09 02:00 UTC is still the 8th in New York.
        assert_eq!(exchange_date(1709949600, -18000), Some(date(2024, 3, 8)));
        assert_eq!(exchange_date(1709949600, 0), Some(date(2024, 3, 9)));
    }
}
