use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use serde::Deserialize;
use tally_core::{LogRequest, Page, RawLogEntry};
use tally_data::LogQuery;
use tracing::debug;

use crate::{BybitCredentials, Signer};

pub const TRANSACTION_LOG_PATH: &str = "v5/account/transaction-log";
const MAX_PAGE_LIMIT: usize = 50;

/// Connection settings for the Bybit REST API.
#[derive(Clone, Debug)]
pub struct BybitConfig {
    pub base_url: String,
    pub recv_window_ms: u64,
    pub category: String,
    pub account_type: String,
    pub timeout: Duration,
    /// Optional client-side pacing on top of the fetcher's inter-page delay.
    pub requests_per_second: Option<NonZeroU32>,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".into(),
            recv_window_ms: 5_000,
            category: "spot".into(),
            account_type: "UNIFIED".into(),
            timeout: Duration::from_secs(10),
            requests_per_second: NonZeroU32::new(10),
        }
    }
}

/// Signed client for `GET /v5/account/transaction-log`.
pub struct BybitLogClient {
    client: Client,
    config: BybitConfig,
    signer: Signer,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl BybitLogClient {
    pub fn new(config: BybitConfig, credentials: BybitCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build Bybit HTTP client")?;
        let limiter = config
            .requests_per_second
            .map(|rps| Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(rps))));
        Ok(Self {
            client,
            config,
            signer: Signer::new(credentials),
            limiter,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/{path}")
    }

    /// Ordered query parameters; the encoded string is both sent and signed.
    fn query_string(&self, request: &LogRequest) -> Result<String> {
        let mut params = vec![
            ("accountType", self.config.account_type.clone()),
            ("category", self.config.category.clone()),
            ("startTime", request.start_time.timestamp_millis().to_string()),
            ("endTime", request.end_time.timestamp_millis().to_string()),
            ("limit", request.limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
        ];
        if let Some(cursor) = &request.cursor {
            params.push(("cursor", cursor.clone()));
        }
        serde_urlencoded::to_string(&params).context("failed to encode Bybit query")
    }

    /// Fetch one page of the account transaction log.
    pub async fn transaction_log(&self, request: &LogRequest) -> Result<Page> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let query = self.query_string(request)?;
        let timestamp = Utc::now().timestamp_millis();
        let signature = self.signer.sign(timestamp, self.config.recv_window_ms, &query);
        let url = format!("{}?{}", self.endpoint(TRANSACTION_LOG_PATH), query);

        let response = self
            .client
            .get(&url)
            .header("X-BAPI-API-KEY", self.signer.api_key())
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.config.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", signature)
            .send()
            .await
            .context("request to Bybit failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read Bybit response body")?;
        debug!(
            "bybit transaction log response (status {}): {}",
            status,
            truncate(&body, 512)
        );
        if !status.is_success() {
            return Err(anyhow!(
                "Bybit responded with status {}: {}",
                status,
                truncate(&body, 256)
            ));
        }
        parse_page(&body)
    }
}

#[async_trait]
impl LogQuery for BybitLogClient {
    async fn query(&self, request: LogRequest) -> Result<Page> {
        self.transaction_log(&request).await
    }
}

#[derive(Debug, Deserialize)]
struct BybitLogResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<BybitLogResult>,
}

#[derive(Debug, Deserialize)]
struct BybitLogResult {
    #[serde(default)]
    list: Option<Vec<RawLogEntry>>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

fn parse_page(body: &str) -> Result<Page> {
    let response: BybitLogResponse = serde_json::from_str(body).map_err(|err| {
        anyhow!(
            "failed to parse Bybit response: {} (body snippet: {})",
            err,
            truncate(body, 256)
        )
    })?;
    if response.ret_code != 0 {
        return Err(anyhow!(
            "Bybit returned error {}: {}",
            response.ret_code,
            response.ret_msg
        ));
    }
    Ok(match response.result {
        Some(result) => Page {
            items: result.list,
            next_cursor: result.next_page_cursor,
        },
        None => Page::without_list(),
    })
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    const PAGE_BODY: &str = r#"{
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "nextPageCursor": "21963%3A1%2C14954%3A1",
            "list": [
                {
                    "symbol": "BTCUSDT",
                    "category": "spot",
                    "side": "Buy",
                    "transactionTime": "1730728800000",
                    "type": "TRADE",
                    "currency": "BTC",
                    "tradePrice": "68000.5",
                    "fee": "",
                    "cashFlow": "0.001",
                    "feeRate": "",
                    "tradeId": "t-1",
                    "orderId": "o-1"
                },
                {
                    "symbol": "BTCUSDT",
                    "category": "spot",
                    "side": "Buy",
                    "transactionTime": "1730728800000",
                    "type": "TRADE",
                    "currency": "USDT",
                    "tradePrice": "68000.5",
                    "fee": "0.068",
                    "cashFlow": "-68.0005",
                    "feeRate": "0.001",
                    "tradeId": "t-1",
                    "orderId": "o-1"
                }
            ]
        },
        "time": 1730728801000
    }"#;

    async fn serve_once(listener: TcpListener, status: &'static str, body: &'static str, tx: mpsc::Sender<String>) {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = socket.read(&mut tmp).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        tx.send(String::from_utf8_lossy(&buf).into_owned())
            .await
            .expect("send request head");
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
    }

    async fn client_for(status: &'static str, body: &'static str) -> (BybitLogClient, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(serve_once(listener, status, body, tx));
        let config = BybitConfig {
            base_url: format!("http://{addr}/"),
            requests_per_second: None,
            ..BybitConfig::default()
        };
        let credentials = BybitCredentials {
            api_key: "test-key".into(),
            api_secret: "test-secret".into(),
        };
        (BybitLogClient::new(config, credentials).expect("client"), rx)
    }

    fn request(cursor: Option<&str>) -> LogRequest {
        LogRequest {
            start_time: Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 11, 7, 23, 59, 59).unwrap(),
            limit: 500,
            cursor: cursor.map(str::to_string),
        }
    }

    fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    #[tokio::test]
    async fn fetches_and_parses_signed_page() {
        let (client, mut rx) = client_for("200 OK", PAGE_BODY).await;

        let page = client.query(request(Some("abc=="))).await.expect("page");

        let items = page.items.as_ref().expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].currency, "USDT");
        assert_eq!(items[1].fee_rate.map(|d| d.to_string()).as_deref(), Some("0.001"));
        assert_eq!(page.continuation(), Some("21963%3A1%2C14954%3A1"));

        let head = rx.recv().await.expect("request head");
        let request_line = head.lines().next().unwrap();
        let target = request_line.split_whitespace().nth(1).unwrap();
        let (path, query) = target.split_once('?').unwrap();
        assert_eq!(path, "/v5/account/transaction-log");
        assert_eq!(
            query,
            "accountType=UNIFIED&category=spot&startTime=1730419200000&endTime=1731023999000&limit=50&cursor=abc%3D%3D"
        );
        assert_eq!(header(&head, "x-bapi-api-key"), Some("test-key"));
        assert_eq!(header(&head, "x-bapi-recv-window"), Some("5000"));
        let timestamp: i64 = header(&head, "x-bapi-timestamp").unwrap().parse().unwrap();
        let expected = client.signer.sign(timestamp, 5000, query);
        assert_eq!(header(&head, "x-bapi-sign"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn api_error_code_is_an_error() {
        let body = r#"{"retCode":10002,"retMsg":"invalid request, please check your server timestamp","result":{}}"#;
        let (client, _rx) = client_for("200 OK", body).await;
        let err = client.query(request(None)).await.unwrap_err();
        assert!(err.to_string().contains("10002"), "{err}");
    }

    #[tokio::test]
    async fn http_failure_is_an_error() {
        let (client, _rx) = client_for("502 Bad Gateway", "upstream down").await;
        let err = client.query(request(None)).await.unwrap_err();
        assert!(err.to_string().contains("502"), "{err}");
    }

    #[test]
    fn result_without_list_is_page_without_items() {
        let page = parse_page(r#"{"retCode":0,"retMsg":"OK","result":{}}"#).unwrap();
        assert_eq!(page, Page::without_list());
        let page = parse_page(r#"{"retCode":0,"retMsg":"OK"}"#).unwrap();
        assert!(page.items.is_none());
    }

    #[test]
    fn empty_cursor_ends_pagination() {
        let page = parse_page(r#"{"retCode":0,"result":{"list":[],"nextPageCursor":""}}"#).unwrap();
        assert_eq!(page.items, Some(Vec::new()));
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn amount_beyond_decimal_precision_fails_the_page() {
        let body = r#"{"retCode":0,"result":{"list":[{"transactionTime":"1730728800000","currency":"BTC","cashFlow":"0.12345678901234567890123456789","tradeId":"t-1"}]}}"#;
        let err = parse_page(body).unwrap_err();
        assert!(err.to_string().contains("invalid decimal amount"), "{err}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
