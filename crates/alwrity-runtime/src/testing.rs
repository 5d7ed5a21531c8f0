//! Scripted collaborators shared by the runtime tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::Notify;

use alwrity_core::{DailyMetrics, DateRange, Error, Result, SearchMetrics, SectionType};
use alwrity_providers::{
    ContentProvider, OutlineRequest, PlannedSection, SearchAnalytics, SectionRequest,
};

use crate::outline::OutlineState;
use crate::types::OutlineSection;

pub fn section(id: &str, title: &str) -> OutlineSection {
    OutlineSection {
        id: id.into(),
        title: title.into(),
        keywords: vec![],
        estimated_word_count: 200,
        section_type: SectionType::Body,
        key_points: vec![],
        content: String::new(),
        optimization_score: 0,
        scores: None,
    }
}

/// Content provider that answers from a title -> text table.
#[derive(Default)]
pub struct ScriptedProvider {
    pub responses: HashMap<String, String>,
    pub failing: HashSet<String>,
    pub outline: Vec<PlannedSection>,
    pub requests: Mutex<Vec<SectionRequest>>,
    pub outline_calls: Mutex<usize>,
    /// Cancelled when the first section request arrives.
    pub cancel_on_first: Mutex<Option<Arc<OutlineState>>>,
    /// Requests for this title wait until the gate is notified.
    pub hold: Option<(String, Arc<Notify>)>,
}

impl ScriptedProvider {
    pub fn with_responses(pairs: &[(&str, &str)]) -> Self {
        Self {
            responses: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    pub fn recorded(&self) -> Vec<SectionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    async fn generate_outline(&self, _request: &OutlineRequest) -> Result<Vec<PlannedSection>> {
        *self.outline_calls.lock() += 1;
        Ok(self.outline.clone())
    }

    async fn generate_section(&self, request: &SectionRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        if let Some(outline) = self.cancel_on_first.lock().take() {
            outline.request_cancel();
        }
        if let Some((title, gate)) = &self.hold {
            if *title == request.title {
                gate.notified().await;
            }
        }
        tokio::task::yield_now().await;
        if self.failing.contains(&request.title) {
            return Err(Error::Provider(format!("provider timeout for {}", request.title)));
        }
        Ok(self
            .responses
            .get(&request.title)
            .cloned()
            .unwrap_or_else(|| format!("Generated text about {}", request.title)))
    }
}

/// Analytics source returning a fixed series.
pub struct ScriptedAnalytics {
    pub authenticated: bool,
    pub series: Vec<DailyMetrics>,
    /// Requests whose range starts on this date fail.
    pub fail_from: Option<NaiveDate>,
    pub calls: Mutex<Vec<DateRange>>,
}

impl ScriptedAnalytics {
    pub fn new(series: Vec<DailyMetrics>) -> Self {
        Self {
            authenticated: true,
            series,
            fail_from: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl SearchAnalytics for ScriptedAnalytics {
    async fn daily_metrics(&self, range: &DateRange) -> Result<Vec<DailyMetrics>> {
        self.calls.lock().push(*range);
        if !self.authenticated {
            return Err(Error::Unauthenticated("no session".into()));
        }
        if self.fail_from == Some(range.start_date) {
            return Err(Error::Provider("quota exceeded".into()));
        }
        Ok(self.series.clone())
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

pub fn day(y: i32, m: u32, d: u32, clicks: f64) -> DailyMetrics {
    DailyMetrics {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        metrics: SearchMetrics {
            clicks,
            impressions: clicks * 10.0,
            ctr: 0.1,
            position: 5.0,
        },
    }
}
