//! Remote clustering service backend.
//!
//! Serializes the learner set as JSON, issues a blocking HTTP POST to the
//! configured clustering service, and joins the returned assignments back to
//! learners by identifier. Timeouts are split into a connect timeout and a
//! generous total timeout so a cold-starting service gets time to warm up
//! without letting the caller hang indefinitely. Transport failures,
//! timeouts, and non-success payloads all surface as
//! [`CohortError::Service`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CohortError, Result};
use crate::model::{Category, ClusterAssignment, LearnerRecord};

use super::{BackendKind, ClusteringBackend};

/// Configuration for the remote-service backend.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Endpoint accepting clustering requests
    pub url: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Total request timeout, long enough for a cold start
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Configuration with default timeouts (10s connect, 120s total)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(120),
        }
    }

    /// Override the connect timeout
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Override the total request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    students: Vec<StudentPayload<'a>>,
    category: Category,
    clusters: usize,
}

#[derive(Debug, Serialize)]
struct StudentPayload<'a> {
    user_id: &'a str,
    literacy_score: f64,
    math_score: f64,
    games_played: u32,
    total_score: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    success: bool,
    #[serde(default)]
    assignments: Vec<AssignmentPayload>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentPayload {
    user_id: String,
    cluster_number: usize,
    cluster_label: String,
    #[serde(default)]
    #[allow(dead_code)]
    score: f64,
}

/// Clustering backend delegating to a remote HTTP service.
pub struct ServiceBackend {
    config: ServiceConfig,
    client: reqwest::blocking::Client,
}

impl ServiceBackend {
    /// Backend for the given configuration
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CohortError::Service(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

impl ClusteringBackend for ServiceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Service
    }

    fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
    ) -> Result<Vec<ClusterAssignment>> {
        let request = ServiceRequest {
            students: learners
                .iter()
                .map(|l| StudentPayload {
                    user_id: &l.id,
                    literacy_score: l.literacy_score,
                    math_score: l.math_score,
                    games_played: l.games_played,
                    total_score: l.total_score,
                })
                .collect(),
            category,
            clusters: k,
        };

        debug!(url = %self.config.url, learners = learners.len(), k, "posting to clustering service");
        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CohortError::Service(format!("request timed out: {}", e))
                } else {
                    CohortError::Service(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CohortError::Service(format!(
                "service returned HTTP {}",
                status
            )));
        }

        let parsed: ServiceResponse = response
            .json()
            .map_err(|e| CohortError::Service(format!("invalid response body: {}", e)))?;

        if !parsed.success {
            return Err(CohortError::Service(
                parsed
                    .message
                    .unwrap_or_else(|| "service reported failure".into()),
            ));
        }

        join_by_id(learners, parsed.assignments, category, k)
    }
}

/// Join service assignments back to learners by identifier.
///
/// Every learner must appear exactly once in the response with a cluster
/// index in `[0, k)`; anything less is a protocol violation.
fn join_by_id(
    learners: &[LearnerRecord],
    assignments: Vec<AssignmentPayload>,
    category: Category,
    k: usize,
) -> Result<Vec<ClusterAssignment>> {
    let by_id: std::collections::HashMap<&str, &AssignmentPayload> = assignments
        .iter()
        .map(|a| (a.user_id.as_str(), a))
        .collect();

    learners
        .iter()
        .map(|learner| {
            let payload = by_id.get(learner.id.as_str()).ok_or_else(|| {
                CohortError::Service(format!("no assignment returned for learner {}", learner.id))
            })?;
            if payload.cluster_number >= k {
                return Err(CohortError::Service(format!(
                    "cluster number {} out of range for k={}",
                    payload.cluster_number, k
                )));
            }
            Ok(ClusterAssignment {
                learner_id: learner.id.clone(),
                cluster: payload.cluster_number,
                label: payload.cluster_label.clone(),
                score: learner.display_score(category),
                literacy_score: learner.literacy_score,
                math_score: learner.math_score,
            })
        })
        .collect()
}
