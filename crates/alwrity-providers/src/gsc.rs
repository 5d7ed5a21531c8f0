//! Google Search Console analytics client.
//!
//! Queries `searchAnalytics/query` with the `date` dimension. Transient
//! failures are retried a fixed number of times with a fixed delay; auth
//! failures are returned immediately.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use alwrity_core::{DailyMetrics, DateRange, Error, Result, SearchMetrics};

use crate::config::AnalyticsConfig;
use crate::traits::SearchAnalytics;

const ROW_LIMIT: u32 = 25_000;

/// Search Console client bound to one property.
pub struct SearchConsoleClient {
    client: Client,
    config: AnalyticsConfig,
}

impl SearchConsoleClient {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn query_url(&self, site_url: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| Error::Config(format!("Invalid Search Console URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Internal("base URL cannot have segments".into()))?
            .pop_if_empty()
            .extend(["webmasters", "v3", "sites", site_url, "searchAnalytics", "query"]);
        Ok(url)
    }

    async fn query_once(&self, url: &Url, token: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthenticated(format!(
                "Search Console rejected the session ({})",
                status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("Search Console error {}: {}", status, text)));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Provider(format!("Invalid response body: {}", e)))
    }
}

/// Convert `rows` of a date-dimension response into a date-ordered series.
pub fn parse_rows(response: &Value) -> Vec<DailyMetrics> {
    let mut series: Vec<DailyMetrics> = response["rows"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let date = row["keys"][0]
                        .as_str()
                        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;
                    Some(DailyMetrics {
                        date,
                        metrics: SearchMetrics {
                            clicks: row["clicks"].as_f64().unwrap_or(0.0),
                            impressions: row["impressions"].as_f64().unwrap_or(0.0),
                            ctr: row["ctr"].as_f64().unwrap_or(0.0),
                            position: row["position"].as_f64().unwrap_or(0.0),
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    series.sort_by_key(|d| d.date);
    series
}

#[async_trait]
impl SearchAnalytics for SearchConsoleClient {
    async fn daily_metrics(&self, range: &DateRange) -> Result<Vec<DailyMetrics>> {
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or_else(|| Error::Unauthenticated("No Search Console session".into()))?;
        let site_url = self
            .config
            .site_url
            .as_deref()
            .ok_or_else(|| Error::Config("GSC_SITE_URL is not set".into()))?;

        let url = self.query_url(site_url)?;
        let body = json!({
            "startDate": range.start_date.format("%Y-%m-%d").to_string(),
            "endDate": range.end_date.format("%Y-%m-%d").to_string(),
            "dimensions": ["date"],
            "rowLimit": ROW_LIMIT,
        });

        let attempts = self.config.max_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.query_once(&url, token, &body).await {
                Ok(response) => {
                    let series = parse_rows(&response);
                    debug!(
                        "Search Console returned {} days for {}..{}",
                        series.len(),
                        range.start_date,
                        range.end_date
                    );
                    return Ok(series);
                }
                Err(e @ Error::Unauthenticated(_)) => return Err(e),
                Err(e) => {
                    warn!("Search Console attempt {}/{} failed: {}", attempt, attempts, e);
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Provider("Search Console query failed".into())))
    }

    fn is_authenticated(&self) -> bool {
        self.config.access_token.is_some()
    }
}
