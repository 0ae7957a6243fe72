//! Live JPY to NTD exchange rate with an explicit fallback.
//!
//! The provider only fetches. Holding the "current rate" and showing whether
//! it is live or an estimate is up to the caller, which gets both through
//! [`ExchangeRate`].

use crate::error::RateFetchError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Rate used whenever a live rate is unavailable: 1 JPY = 0.2 NTD.
pub const DEFAULT_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Fetched,
    Fallback,
}

/// A positive JPY to NTD rate tagged with its freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    value: Decimal,
    source: RateSource,
    fetched_at: Option<DateTime<Utc>>,
}

impl ExchangeRate {
    /// The hardcoded default, marked as fallback.
    pub fn fallback() -> Self {
        ExchangeRate {
            value: DEFAULT_RATE,
            source: RateSource::Fallback,
            fetched_at: None,
        }
    }

    /// A freshly fetched rate. Non-positive values are refused.
    pub fn fetched(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then(|| ExchangeRate {
            value,
            source: RateSource::Fetched,
            fetched_at: Some(Utc::now()),
        })
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn source(&self) -> RateSource {
        self.source
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Connection settings for the rate source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSourceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        RateSourceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RateSourceConfig {
    /// Reads `EXCHANGERATE_API_KEY`, `EXCHANGERATE_API_BASE_URL` and
    /// `EXCHANGERATE_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = env::var("EXCHANGERATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        RateSourceConfig {
            base_url: env::var("EXCHANGERATE_API_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("EXCHANGERATE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    result: String,
    conversion_rates: Option<HashMap<String, f64>>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

/// Client for the exchange rate HTTP endpoint.
pub struct RateProvider {
    config: RateSourceConfig,
    client: Client,
}

impl RateProvider {
    pub fn new(config: RateSourceConfig) -> Result<Self, RateFetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RateFetchError::Network(e.to_string()))?;

        Ok(RateProvider { config, client })
    }

    pub fn config(&self) -> &RateSourceConfig {
        &self.config
    }

    /// Fetches the current JPY to NTD rate.
    ///
    /// A response counts only if the status is 2xx, `result` is `"success"`
    /// and `conversion_rates.TWD` is a positive finite number.
    pub async fn fetch_rate(&self) -> Result<Decimal, RateFetchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RateFetchError::MissingApiKey)?;
        let url = format!(
            "{}/{}/latest/JPY",
            self.config.base_url.trim_end_matches('/'),
            api_key
        );

        let response = self.client.get(&url).send().await.map_err(classify)?;

        if !response.status().is_success() {
            return Err(RateFetchError::Http(response.status().as_u16()));
        }

        let body: RateResponse = response
            .json()
            .await
            .map_err(|e| match classify(e) {
                RateFetchError::Network(msg) => RateFetchError::InvalidResponse(msg),
                other => other,
            })?;

        if body.result != "success" {
            return Err(RateFetchError::InvalidResponse(
                body.error_type.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        let twd = body
            .conversion_rates
            .as_ref()
            .and_then(|rates| rates.get("TWD"))
            .copied()
            .ok_or_else(|| RateFetchError::InvalidResponse("missing TWD rate".to_string()))?;

        parse_twd_rate(twd)
    }

    /// Fetches the rate, substituting [`DEFAULT_RATE`] on any failure.
    ///
    /// The fallback is logged and visible through [`ExchangeRate::is_fallback`].
    pub async fn fetch_or_default(&self) -> ExchangeRate {
        match self.fetch_rate().await {
            Ok(value) => match ExchangeRate::fetched(value) {
                Some(rate) => {
                    info!("Fetched exchange rate 1 JPY = {} NTD", value);
                    rate
                }
                None => ExchangeRate::fallback(),
            },
            Err(e) => {
                warn!(
                    "Exchange rate fetch failed ({}), using default rate {}",
                    e, DEFAULT_RATE
                );
                ExchangeRate::fallback()
            }
        }
    }
}

/// Uses the provider when it could be built, the default rate otherwise.
pub async fn rate_or_default(provider: Result<RateProvider, RateFetchError>) -> ExchangeRate {
    match provider {
        Ok(provider) => provider.fetch_or_default().await,
        Err(e) => {
            warn!(
                "Exchange rate client unavailable ({}), using default rate {}",
                e, DEFAULT_RATE
            );
            ExchangeRate::fallback()
        }
    }
}

fn parse_twd_rate(twd: f64) -> Result<Decimal, RateFetchError> {
    if !twd.is_finite() {
        return Err(RateFetchError::InvalidResponse(format!(
            "TWD rate {} out of range",
            twd
        )));
    }
    match Decimal::from_f64(twd) {
        Some(rate) if rate > Decimal::ZERO => Ok(rate),
        Some(_) => Err(RateFetchError::InvalidResponse(format!(
            "non-positive TWD rate {}",
            twd
        ))),
        None => Err(RateFetchError::InvalidResponse(format!(
            "TWD rate {} out of range",
            twd
        ))),
    }
}

fn classify(err: reqwest::Error) -> RateFetchError {
    if err.is_timeout() {
        RateFetchError::Timeout
    } else {
        RateFetchError::Network(err.to_string())
    }
}
