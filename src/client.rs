//! HTTP back office client.
//!
//! Talks JSON to the back office API (`/api/...`) with reqwest. Connection
//! failures and non-success statuses are mapped to typed errors carrying a
//! readable message.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::closing::*;
use crate::config::{normalize_base_url, EventBarConfig};
use crate::history::ClosingRecord;
use crate::session::User;
use crate::stock::*;
use crate::traits::*;
use crate::types::*;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Convert a `reqwest::Error` into a readable message.
fn friendly_error(url: &str, err: &reqwest::Error) -> EventBarError {
    if err.is_connect() {
        return EventBarError::Http(format!("Cannot reach back office at {url}"));
    }
    if err.is_timeout() {
        return EventBarError::Http(format!("Connection to {url} timed out"));
    }
    if err.is_builder() {
        return EventBarError::Http(format!("Invalid back office URL: {url}"));
    }
    EventBarError::Http(format!("Network error communicating with {url}: {err}"))
}

/// Readable message for an HTTP status code.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "Request rejected by the back office".to_string(),
        404 => "Back office endpoint not found".to_string(),
        409 => "Conflicting record on the back office".to_string(),
        s if s >= 500 => format!("Back office server error (HTTP {s})"),
        s => format!("Unexpected response from back office (HTTP {s})"),
    }
}

/// Prefer the `message`/`error` field of a JSON error body.
fn status_error(status: StatusCode, body: &str) -> EventBarError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| status_message(status));
    EventBarError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Back office reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackOffice {
    client: Client,
    base_url: String,
}

impl HttpBackOffice {
    /// Client for `base_url` with the default timeout
    pub fn new(base_url: &str) -> EventBarResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> EventBarResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EventBarError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn from_config(config: &EventBarConfig) -> EventBarResult<Self> {
        Self::with_timeout(&config.base_url(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Content-Type", "application/json")
    }

    /// Send and return the body text of a successful response
    async fn send(&self, req: RequestBuilder, path: &str) -> EventBarResult<String> {
        let start = Instant::now();
        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            warn!(path, status = status.as_u16(), error = %e, "back office response body unreadable");
            friendly_error(&self.base_url, &e)
        })?;
        let latency_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(path, status = status.as_u16(), latency_ms, "back office request failed");
            return Err(status_error(status, &body));
        }
        debug!(path, status = status.as_u16(), latency_ms, "back office request");
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> EventBarResult<T> {
        let body = self.send(req, path).await?;
        serde_json::from_str(&body)
            .map_err(|e| EventBarError::Decode(format!("Invalid JSON from {path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> EventBarResult<T> {
        self.fetch(self.request(Method::GET, path), path).await
    }

    async fn post<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> EventBarResult<T> {
        self.fetch(self.request(Method::POST, path).json(body), path)
            .await
    }
}

#[async_trait]
impl BackOffice for HttpBackOffice {
    async fn list_users(&self) -> EventBarResult<Vec<User>> {
        self.get("/api/users").await
    }

    async fn list_events(&self) -> EventBarResult<Vec<String>> {
        self.get("/api/events").await
    }

    async fn list_waiters(&self) -> EventBarResult<Vec<Person>> {
        self.get("/api/waiters").await
    }

    async fn list_cashiers(&self) -> EventBarResult<Vec<Person>> {
        self.get("/api/cashiers").await
    }

    async fn submit_waiter_closing(
        &mut self,
        payload: &WaiterClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        let receipt: SubmissionReceipt = self.post("/api/closings/waiter", payload).await?;
        info!(protocol = %receipt.protocol, "waiter closing accepted");
        Ok(receipt)
    }

    async fn submit_cashier_closing(
        &mut self,
        payload: &CashierClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        let receipt: SubmissionReceipt = self.post("/api/closings/cashier", payload).await?;
        info!(protocol = %receipt.protocol, "cashier closing accepted");
        Ok(receipt)
    }

    async fn submit_fixed_closing(
        &mut self,
        payload: &FixedClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        let receipt: SubmissionReceipt = self.post("/api/closings/fixed", payload).await?;
        info!(protocol = %receipt.protocol, "group closing accepted");
        Ok(receipt)
    }

    async fn list_closings(&self, event_name: &str) -> EventBarResult<Vec<ClosingRecord>> {
        let path = "/api/closings";
        let req = self
            .request(Method::GET, path)
            .query(&[("eventName", event_name)]);
        self.fetch(req, path).await
    }

    async fn list_products(&self) -> EventBarResult<Vec<Product>> {
        self.get("/api/stock/inventory").await
    }

    async fn create_product(&mut self, product: &NewProduct) -> EventBarResult<Product> {
        self.post("/api/stock/inventory", product).await
    }

    async fn update_inventory(&mut self, count: &InventoryCount) -> EventBarResult<()> {
        let path = "/api/stock/inventory/update";
        self.send(self.request(Method::POST, path).json(count), path)
            .await
            .map(|_| ())
    }

    async fn list_registrations(&self) -> EventBarResult<Vec<Registration>> {
        self.get("/api/stock/registrations").await
    }

    async fn save_registration(
        &mut self,
        registration: &Registration,
    ) -> EventBarResult<Registration> {
        registration.validate()?;
        let (method, path) = match &registration.id {
            Some(id) => (Method::PUT, format!("/api/stock/registrations/{id}")),
            None => (Method::POST, "/api/stock/registrations".to_string()),
        };
        let body = self
            .send(self.request(method, &path).json(registration), &path)
            .await?;

        // Updates may answer with an empty body or a bare message
        match serde_json::from_str::<Registration>(&body) {
            Ok(saved) => Ok(saved),
            Err(_) if registration.id.is_some() => Ok(registration.clone()),
            Err(e) => Err(EventBarError::Decode(format!("Invalid JSON from {path}: {e}"))),
        }
    }

    async fn delete_registration(&mut self, registration_id: &str) -> EventBarResult<()> {
        let path = format!("/api/stock/registrations/{registration_id}");
        self.send(self.request(Method::DELETE, &path), &path)
            .await
            .map(|_| ())
    }

    async fn record_movement(
        &mut self,
        movement: &MovementPayload,
    ) -> EventBarResult<MovementReceipt> {
        self.post("/api/stock/movements", movement).await
    }

    async fn record_return(
        &mut self,
        stock_return: &ReturnPayload,
    ) -> EventBarResult<MovementReceipt> {
        self.post("/api/stock/returns", stock_return).await
    }

    async fn list_audit(&self) -> EventBarResult<Vec<AuditEntry>> {
        self.get("/api/stock/audit").await
    }

    async fn transaction_details(&self, transaction_id: &str) -> EventBarResult<MovementDetails> {
        self.get(&format!("/api/stock/transaction/{transaction_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_prefers_body_message() {
        let err = status_error(StatusCode::BAD_REQUEST, r#"{"message":"Evento inválido"}"#);
        match err {
            EventBarError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Evento inválido");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = status_error(StatusCode::BAD_GATEWAY, "<html>");
        assert!(err.to_string().contains("HTTP 502"));
    }

    /// Serve one canned HTTP response on a local port
    fn serve_once(response: &'static str) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // headers, then the declared body
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request).to_lowercase();
            let header_end = text.find("\r\n\r\n").map_or(request.len(), |i| i + 4);
            let declared = text
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let mut received = request.len() - header_end;
            while received < declared {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received += n;
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"ok\"");
        let mut client = HttpBackOffice::new(&url).unwrap();
        let err = client
            .update_inventory(&InventoryCount::from_input("p1", "1", "0", "Fabio"))
            .await
            .unwrap_err();
        assert!(matches!(err, EventBarError::Http(_)));
    }

    #[tokio::test]
    async fn test_complete_empty_body_is_success() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        let mut client = HttpBackOffice::new(&url).unwrap();
        client
            .update_inventory(&InventoryCount::from_input("p1", "1", "0", "Fabio"))
            .await
            .unwrap();
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = HttpBackOffice::new("localhost:3001/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
    }
}
