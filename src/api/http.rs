use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::LendingApi;
use crate::config::FrontendConfig;
use crate::errors::{LendingError, Result};
use crate::models::{
    CreateLoanRequest, CreateLoanResponse, CustomerOverview, ErrorBody, Ledger, PaymentReceipt,
    PaymentRequest,
};

/// reqwest-backed lending api client
#[derive(Debug, Clone)]
pub struct HttpLendingApi {
    client: Client,
    base_url: Url,
}

impl HttpLendingApi {
    pub fn new(config: &FrontendConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            LendingError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| LendingError::InvalidConfiguration {
            message: format!("cannot build http client: {}", e),
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// join path segments onto the base url, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LendingError::InvalidConfiguration {
                message: format!("base_url {} cannot be used as a base", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "lending api rejected request");
            return Err(rejection(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| LendingError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl LendingApi for HttpLendingApi {
    async fn customer_overview(&self, customer_id: &str) -> Result<CustomerOverview> {
        let url = self.endpoint(&["customers", customer_id, "overview"])?;
        tracing::debug!(%url, "GET customer overview");
        self.send(self.client.get(url)).await
    }

    async fn create_loan(&self, request: &CreateLoanRequest) -> Result<CreateLoanResponse> {
        let url = self.endpoint(&["loans"])?;
        tracing::debug!(%url, customer_id = %request.customer_id, "POST loan application");
        self.send(self.client.post(url).json(request)).await
    }

    async fn record_payment(&self, loan_id: &str, request: &PaymentRequest) -> Result<PaymentReceipt> {
        let url = self.endpoint(&["loans", loan_id, "payments"])?;
        tracing::debug!(%url, payment_type = %request.payment_type, "POST payment");
        self.send(self.client.post(url).json(request)).await
    }

    async fn loan_ledger(&self, loan_id: &str) -> Result<Ledger> {
        let url = self.endpoint(&["loans", loan_id, "ledger"])?;
        tracing::debug!(%url, "GET loan ledger");
        self.send(self.client.get(url)).await
    }
}

/// turn a non-2xx response into an api error, preferring the body's message
pub(crate) fn rejection(status: u16, body: &str) -> LendingError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or_else(|| b.detail.and_then(|d| d.as_str().map(str::to_string))))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| LendingError::status_message(status));

    LendingError::Api { status, message }
}

fn transport_error(err: reqwest::Error) -> LendingError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    LendingError::Transport { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentType;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// serve one canned response and hand back the raw request
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if raw.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (base, handle)
    }

    fn api(base: &str) -> HttpLendingApi {
        HttpLendingApi::new(&FrontendConfig::new(base)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let api = api("http://localhost:8000");
        let url = api.endpoint(&["customers", "CUST001", "overview"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/customers/CUST001/overview");

        let api = api_with_prefix();
        let url = api.endpoint(&["loans", "L123", "ledger"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/loans/L123/ledger");
    }

    fn api_with_prefix() -> HttpLendingApi {
        api("http://localhost:8000/api/v1/")
    }

    #[test]
    fn test_endpoint_encodes_identifiers() {
        let api = api("http://localhost:8000");
        let url = api.endpoint(&["customers", "A/B C", "overview"]).unwrap();
        assert_eq!(url.path(), "/customers/A%2FB%20C/overview");
    }

    #[test]
    fn test_rejection_uses_body_message() {
        let err = rejection(404, r#"{"message":"customer not found"}"#);
        assert_eq!(
            err,
            LendingError::Api {
                status: 404,
                message: "customer not found".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_falls_back_to_status() {
        for body in ["", "<html>bad gateway</html>", r#"{"message": "  "}"#, r#"{"error": 1}"#] {
            let err = rejection(502, body);
            assert_eq!(err.user_message(), "HTTP error, status 502");
        }
    }

    #[test]
    fn test_rejection_accepts_detail() {
        let err = rejection(422, r#"{"detail":"loan_amount must be positive"}"#);
        assert_eq!(err.user_message(), "loan_amount must be positive");
    }

    #[tokio::test]
    async fn test_overview_request_over_http() {
        let body = r#"{"customer_name":"Asha Rao","loans":[]}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let overview = api(&base).customer_overview("CUST001").await.unwrap();
        assert_eq!(overview.customer_name, "Asha Rao");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /customers/CUST001/overview HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_not_found_over_http() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"customer not found"}"#).await;

        let err = api(&base).customer_overview("NOPE").await.unwrap_err();
        assert_eq!(err.user_message(), "customer not found");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_payment_request_body_over_http() {
        let receipt = r#"{"message":"ok","payment_id":"P1","loan_id":"L123","remaining_balance":9000,"emis_left":9}"#;
        let (base, server) = serve_once("201 Created", receipt).await;

        let request = PaymentRequest {
            amount: dec!(1000),
            payment_type: PaymentType::Emi,
        };
        let result = api(&base).record_payment("L123", &request).await.unwrap();
        assert_eq!(result.payment_id, "P1");
        assert_eq!(result.emis_left, 9);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /loans/L123/payments HTTP/1.1"));
        assert!(raw.contains(r#""payment_type":"EMI""#));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let (base, server) = serve_once("200 OK", r#"{"loans": []}"#).await;

        let err = api(&base).customer_overview("CUST001").await.unwrap_err();
        assert!(matches!(err, LendingError::Decode { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = api(&base).loan_ledger("L123").await.unwrap_err();
        assert!(matches!(err, LendingError::Transport { .. }));
    }
}
