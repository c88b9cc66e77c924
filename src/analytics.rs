//! Fire-and-forget gameplay events. Delivery problems are logged and dropped;
//! nothing here can fail a caller.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::config::{AnalyticsMode, Config};
use crate::results::GameSummary;
use crate::round::RoundResult;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    PageView { page_title: String },
    GameStart { rounds: usize },
    RoundComplete { round: usize, result: RoundResult },
    GameComplete { summary: GameSummary },
    DatasetError { message: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::PageView { .. } => "page_view",
            AnalyticsEvent::GameStart { .. } => "game_start",
            AnalyticsEvent::RoundComplete { .. } => "round_complete",
            AnalyticsEvent::GameComplete { .. } => "game_complete",
            AnalyticsEvent::DatasetError { .. } => "dataset_error",
        }
    }

    /// Flat key/value payload.
    pub fn params(&self) -> Map<String, Value> {
        let value = match self {
            AnalyticsEvent::PageView { page_title } => json!({ "page_title": page_title }),
            AnalyticsEvent::GameStart { rounds } => json!({ "rounds": rounds }),
            AnalyticsEvent::RoundComplete { round, result } => json!({
                "round": round,
                "country": result.country_code,
                "correct": result.is_correct,
                "points": result.points_awarded,
                "charts_viewed": result.charts_revealed_at_guess,
            }),
            AnalyticsEvent::GameComplete { summary } => json!({
                "score": summary.total_score,
                "max_score": summary.max_score,
                "accuracy": summary.accuracy_percent,
                "charts_viewed": summary.total_charts_viewed,
            }),
            AnalyticsEvent::DatasetError { message } => json!({ "message": message }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &AnalyticsEvent);
}

pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track(&self, _event: &AnalyticsEvent) {}
}

/// Writes events to the log.
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track(&self, event: &AnalyticsEvent) {
        let params = Value::Object(event.params());
        info!(target: "energy_guessr::analytics", event = event.name(), %params, "analytics event");
    }
}

/// POSTs `{"event": name, "params": {...}}` to an endpoint on a detached
/// thread.
pub struct HttpSink {
    endpoint: String,
    client: Client,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl AnalyticsSink for HttpSink {
    fn track(&self, event: &AnalyticsEvent) {
        let payload = json!({
            "event": event.name(),
            "params": Value::Object(event.params()),
        });
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let name = event.name();
        let spawned = thread::Builder::new()
            .name("analytics".to_string())
            .spawn(move || match client.post(&endpoint).json(&payload).send() {
                Ok(resp) if !resp.status().is_success() => {
                    debug!(event = name, status = %resp.status(), "analytics endpoint rejected event");
                }
                Ok(_) => {}
                Err(err) => debug!(event = name, error = %err, "analytics delivery failed"),
            });
        if let Err(err) = spawned {
            debug!(event = name, error = %err, "analytics thread spawn failed");
        }
    }
}

pub fn sink_from_config(config: &Config) -> Arc<dyn AnalyticsSink> {
    match (config.analytics, config.analytics_url.as_deref()) {
        (AnalyticsMode::Off, _) => Arc::new(NoopSink),
        (AnalyticsMode::Http, Some(url)) => match HttpSink::new(url) {
            Ok(sink) => Arc::new(sink),
            Err(err) => {
                debug!(error = %err, "falling back to log analytics");
                Arc::new(TracingSink)
            }
        },
        _ => Arc::new(TracingSink),
    }
}
