mod account;
mod auth;
mod contracts;
mod invoices;
mod system;
mod transactions;
mod withdraw;

pub use contracts::CONTRACTS_PAGE_SIZE;
pub use withdraw::WITHDRAW_PAGE_SIZE;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::auth::TokenStore;
use crate::error::Result;
use crate::types::ApiResponse;

/// HTTP client wrapper for the staking REST API.
///
/// Attaches the bearer token from the [`TokenStore`] and answers every call
/// with an [`ApiResponse`] envelope: business failures and unparsable error
/// bodies come back as `success: false` rather than as `Err`. Only transport
/// failures are errors.
#[derive(Clone)]
pub struct StakingHttpClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl StakingHttpClient {
    /// Every request, including reading the body, is abandoned after `timeout`.
    pub fn new(base_url: &str, tokens: TokenStore, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// GET a JSON envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        let req = self.request(Method::GET, path).query(query);
        self.send(Method::GET, path, req).await
    }

    /// POST a JSON body and read the envelope.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let req = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, req).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, clean_path(path));
        let mut req = self
            .client
            .request(method, url)
            .header("content-type", "application/json");
        if let Some(token) = self.tokens.get() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        trace!(%method, path, status, body_len = text.len(), "response received");
        let envelope = normalize(method.as_str(), path, status, &text);
        if !envelope.success {
            debug!(%method, path, status, message = %envelope.message, "request unsuccessful");
        }
        Ok(envelope)
    }
}

fn clean_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn is_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Turn a raw response into an envelope.
///
/// - A JSON body is the envelope, whatever the status (errors travel
///   in-band, 202 carries "second factor required").
/// - Non-2xx without a JSON body becomes `"<METHOD> <path> failed: <status>"`.
/// - 2xx without a JSON body becomes an empty envelope.
pub fn normalize<T: DeserializeOwned>(
    method: &str,
    path: &str,
    status: u16,
    text: &str,
) -> ApiResponse<T> {
    let parsed = if text.is_empty() {
        None
    } else {
        serde_json::from_str::<serde_json::Value>(text).ok()
    };

    match parsed {
        Some(body) if !body.is_null() => ApiResponse::from_value(status, body),
        _ if !is_ok(status) => {
            ApiResponse::failure(status, format!("{method} {path} failed: {status}"))
        }
        _ => ApiResponse::empty(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Balance;

    #[test]
    fn test_clean_path_adds_leading_slash() {
        assert_eq!(clean_path("system/healthcheck"), "/system/healthcheck");
        assert_eq!(clean_path("/system/healthcheck"), "/system/healthcheck");
    }

    #[test]
    fn test_error_status_with_json_body_is_returned_in_band() {
        let resp: ApiResponse<Balance> = normalize(
            "GET",
            "/private/account/balance/current",
            401,
            r#"{"success":false,"message":"Unauthorized","data":{}}"#,
        );
        assert_eq!(resp.status, 401);
        assert!(!resp.success);
        assert_eq!(resp.message, "Unauthorized");
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_error_status_with_garbage_body_is_synthesized() {
        let resp: ApiResponse<Balance> =
            normalize("POST", "/private/account/contracts/buy", 502, "<html>Bad Gateway</html>");
        assert!(!resp.success);
        assert_eq!(resp.message, "POST /private/account/contracts/buy failed: 502");
    }

    #[test]
    fn test_error_status_with_empty_body_is_synthesized() {
        let resp: ApiResponse<Balance> = normalize("GET", "/x", 500, "");
        assert_eq!(resp.message, "GET /x failed: 500");
    }

    #[test]
    fn test_accepted_status_is_a_payload() {
        let resp: ApiResponse<Balance> = normalize(
            "POST",
            "/public/account/login",
            202,
            r#"{"success":false,"message":"2FA token required","data":{}}"#,
        );
        assert_eq!(resp.status, 202);
        assert_eq!(resp.message, "2FA token required");
    }

    #[test]
    fn test_ok_status_with_empty_body_is_empty_envelope() {
        let resp: ApiResponse<Balance> = normalize("GET", "/x", 204, "");
        assert!(!resp.success);
        assert!(resp.message.is_empty());
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_ok_status_with_data() {
        let resp: ApiResponse<Balance> = normalize(
            "GET",
            "/private/account/balance/current",
            200,
            r#"{"success":true,"message":"","data":{"balance":2500000,"balanceUsd":1250000}}"#,
        );
        let balance = resp.into_data().unwrap();
        assert_eq!(balance.balance, 2_500_000.0);
    }
}
