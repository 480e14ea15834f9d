/// HTTP client for the dining exchange backend
///
/// One method per endpoint. Responses are parsed from the body regardless
/// of HTTP status: the backend reports rejections as JSON (`success:
/// false` plus a message) on non-2xx replies, so status is not
/// load-bearing. Requests carry no timeout; a hung request simply leaves
/// that cycle's views stale.
use crate::error::ClientError;
use crate::types::{
    ActionResponse, BuyIpoRequest, CurrentUser, LoginRequest, LoginResponse, MarketSummary,
    Portfolio, SecondaryBuyRequest, SellRequest, TradeRecord,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Default backend address, overridable via `DINEX_SERVER_URL`
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Exchange client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("DINEX_SERVER_URL")
                .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with a custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

/// Typed client over the ten exchange endpoints
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ExchangeClient {
    /// Create a client from environment configuration
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with explicit configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            // Cookie support carries the backend session across calls
            http: reqwest::Client::builder()
                .cookie_store(true)
                .build()?,
            base_url,
        })
    }

    /// Backend base URL this client talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let body = self.http.get(url).send().await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::decode(path, e))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &'static str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let body = request.send().await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::decode(path, e))
    }

    /// Establish (or restore) a session for `username`
    pub async fn login(&self, username: &str) -> Result<LoginResponse, ClientError> {
        self.post_json("api/login", Some(&LoginRequest { username }))
            .await
    }

    /// End the current session
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post_json::<(), _>("api/logout", None).await?;
        Ok(())
    }

    /// Fetch the logged-in user's balance and the current IPO price
    pub async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.get_json("api/current_user").await
    }

    /// Fetch the full instrument snapshot
    pub async fn market_summary(&self) -> Result<MarketSummary, ClientError> {
        self.get_json("api/market_summary").await
    }

    /// Fetch recent trades, most recent first
    pub async fn trade_history(&self) -> Result<Vec<TradeRecord>, ClientError> {
        self.get_json("api/trade_history").await
    }

    /// Fetch the logged-in user's non-zero positions
    pub async fn portfolio(&self) -> Result<Portfolio, ClientError> {
        self.get_json("api/portfolio").await
    }

    /// Start the IPO clock
    pub async fn start_ipo(&self) -> Result<ActionResponse, ClientError> {
        self.post_json::<(), _>("api/start_ipo", None).await
    }

    /// Buy `qty` shares of `meal` from the house at the current IPO price
    pub async fn buy_ipo(&self, meal: &str, qty: u32) -> Result<ActionResponse, ClientError> {
        self.post_json("api/buy_ipo", Some(&BuyIpoRequest { meal, qty }))
            .await
    }

    /// Place a secondary-market buy order
    pub async fn secondary_buy(
        &self,
        meal: &str,
        price: f64,
        qty: u32,
        snap_buy: bool,
    ) -> Result<ActionResponse, ClientError> {
        self.post_json(
            "api/secondary_buy",
            Some(&SecondaryBuyRequest {
                meal,
                price,
                qty,
                snap_buy,
            }),
        )
        .await
    }

    /// Place a secondary-market sell order (or short sale)
    pub async fn sell(
        &self,
        meal: &str,
        price: f64,
        qty: u32,
        is_short: bool,
    ) -> Result<ActionResponse, ClientError> {
        self.post_json(
            "api/sell",
            Some(&SellRequest {
                meal,
                price,
                qty,
                is_short,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_custom_url() {
        let config = ClientConfig::new("http://exchange.local:9000");
        assert_eq!(config.base_url, "http://exchange.local:9000");
    }

    #[test]
    fn test_endpoint_join() {
        let client =
            ExchangeClient::with_config(ClientConfig::new("http://127.0.0.1:8000")).unwrap();
        let url = client.endpoint("api/market_summary").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/market_summary");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = ExchangeClient::with_config(ClientConfig::new("not a url"));
        assert!(matches!(result, Err(ClientError::Url(_))));
    }
}
