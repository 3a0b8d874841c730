//! External-process clustering backend.
//!
//! Hands normalized learner features to an external clustering executable
//! over a file protocol and joins the results back by row position. The
//! request file is an attribute-header-then-data text document with one
//! declared numeric attribute per feature dimension and one data row per
//! learner in input order; the row index is the join key, the file carries
//! no learner identifier. The response file is a header line followed by
//! `index,cluster_number,cluster_label` rows.
//!
//! The executable is invoked synchronously as
//! `<executable> <request_file> <k> <response_file>` under a wall-clock
//! deadline. Work files live in a temporary directory that is removed when
//! the run ends, successful or not. Every failure mode — spawn error,
//! non-zero exit, timeout, missing or malformed output — surfaces as
//! [`CohortError::Process`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CohortError, Result};
use crate::features;
use crate::model::{Category, ClusterAssignment, LearnerRecord};

use super::{BackendKind, ClusteringBackend};

/// How often the deadline loop polls the child for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for the external-process backend.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Clustering executable to invoke
    pub executable: PathBuf,
    /// Wall-clock limit for one invocation
    pub timeout: Duration,
}

impl ProcessConfig {
    /// Configuration with the default 60-second timeout
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the wall-clock limit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Clustering backend that shells out to an external executable.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    config: ProcessConfig,
}

impl ProcessBackend {
    /// Backend for the given configuration
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }

    /// Whether the configured executable resolves to a runnable file.
    ///
    /// Availability probe for the admin dashboard; `run` performs its own
    /// spawn-time check regardless.
    pub fn is_available(&self) -> bool {
        let exe = &self.config.executable;
        if exe.is_absolute() || exe.components().count() > 1 {
            return exe.is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(exe).is_file()))
            .unwrap_or(false)
    }

    fn invoke(&self, request: &Path, k: usize, response: &Path) -> Result<()> {
        let mut child = Command::new(&self.config.executable)
            .arg(request)
            .arg(k.to_string())
            .arg(response)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CohortError::Process(format!(
                    "failed to start {}: {}",
                    self.config.executable.display(),
                    e
                ))
            })?;

        let deadline = Instant::now() + self.config.timeout;
        let status = loop {
            match child.try_wait().map_err(|e| {
                CohortError::Process(format!("failed to poll clustering process: {}", e))
            })? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        warn!("failed to kill timed-out clustering process: {}", e);
                    }
                    let _ = child.wait();
                    return Err(CohortError::Process(format!(
                        "timed out after {:?}",
                        self.config.timeout
                    )));
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(CohortError::Process(format!(
                "exited with {}: {}",
                status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl ClusteringBackend for ProcessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Process
    }

    fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
    ) -> Result<Vec<ClusterAssignment>> {
        let features = features::extract(learners, category);
        let normalized = features::normalize(&features);

        let workdir = tempfile::tempdir()
            .map_err(|e| CohortError::Process(format!("failed to create work dir: {}", e)))?;
        let request_path = workdir.path().join(format!("learners_{}.dat", category));
        let response_path = workdir.path().join(format!("clusters_{}.csv", category));

        let request = RequestDocument {
            attributes: features::attribute_names(category),
            rows: &normalized,
        };
        std::fs::write(&request_path, request.encode())
            .map_err(|e| CohortError::Process(format!("failed to write request file: {}", e)))?;

        debug!(
            executable = %self.config.executable.display(),
            learners = learners.len(),
            k,
            "invoking external clustering process"
        );
        self.invoke(&request_path, k, &response_path)?;

        let raw = std::fs::read_to_string(&response_path)
            .map_err(|_| CohortError::Process("output file missing or unreadable".into()))?;
        let rows = ResponseDocument::parse(&raw, learners.len(), k)?;

        // Row position is the join key.
        Ok(learners
            .iter()
            .zip(rows.iter())
            .map(|(learner, row)| ClusterAssignment {
                learner_id: learner.id.clone(),
                cluster: row.cluster,
                label: row.label.clone(),
                score: learner.display_score(category),
                literacy_score: learner.literacy_score,
                math_score: learner.math_score,
            })
            .collect())
    }
}

/// Typed writer for the attribute/row request file.
struct RequestDocument<'a> {
    attributes: &'a [&'a str],
    rows: &'a [Vec<f64>],
}

impl RequestDocument<'_> {
    fn encode(&self) -> String {
        let mut out = String::from("@relation learner_performance\n\n");
        for name in self.attributes {
            out.push_str("@attribute ");
            out.push_str(name);
            out.push_str(" numeric\n");
        }
        out.push_str("\n@data\n");
        for row in self.rows {
            let line: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

/// One parsed row of the response file.
#[derive(Debug, Clone, PartialEq)]
struct ResponseRow {
    cluster: usize,
    label: String,
}

/// Typed parser for the positional response file.
struct ResponseDocument;

impl ResponseDocument {
    /// Parse `index,cluster_number,cluster_label` rows, skipping the header.
    ///
    /// Requires exactly `expected` data rows with cluster indices in
    /// `[0, k)`; anything else is a protocol violation.
    fn parse(raw: &str, expected: usize, k: usize) -> Result<Vec<ResponseRow>> {
        let mut rows = Vec::with_capacity(expected);

        for line in raw.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 3 {
                return Err(CohortError::Process(format!(
                    "malformed output row: {:?}",
                    line
                )));
            }
            let cluster: usize = fields[1].trim().parse().map_err(|_| {
                CohortError::Process(format!("invalid cluster number: {:?}", fields[1]))
            })?;
            if cluster >= k {
                return Err(CohortError::Process(format!(
                    "cluster number {} out of range for k={}",
                    cluster, k
                )));
            }
            rows.push(ResponseRow {
                cluster,
                label: fields[2].trim().to_string(),
            });
        }

        if rows.len() != expected {
            return Err(CohortError::Process(format!(
                "expected {} output rows, got {}",
                expected,
                rows.len()
            )));
        }
        Ok(rows)
    }
}
