//! Analysis service clients.
//!
//! [`HttpAnalysisClient`] is the production implementation: one blocking
//! JSON POST per chunk against a configurable endpoint, with the timeout
//! enforced per call. [`MockAnalysisClient`] backs the test suites.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::parser::parse_findings_response;
use super::prompt::ANALYSIS_SYSTEM_PROMPT;
use super::types::{AnalysisClient, ChunkFindings};
use super::AnalysisError;

/// HTTP client for a language-model-backed analysis service.
pub struct HttpAnalysisClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpAnalysisClient {
    /// Create a client for the service at `base_url` with a per-call
    /// timeout. The timeout covers one chunk submission, never the whole
    /// multi-chunk operation.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Request body for the analysis endpoint.
#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    prompt: &'a str,
    system: &'a str,
}

/// Response body from the analysis endpoint.
#[derive(Deserialize)]
struct AnalyzeResponse {
    completion: String,
}

impl AnalysisClient for HttpAnalysisClient {
    fn submit(&self, prompt: &str) -> Result<ChunkFindings, AnalysisError> {
        let url = format!("{}/v1/analyze", self.base_url);
        let body = AnalyzeRequest {
            prompt,
            system: ANALYSIS_SYSTEM_PROMPT,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                AnalysisError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                AnalysisError::Http(format!("request timed out after {}s", self.timeout_secs))
            } else {
                AnalysisError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        parse_findings_response(&parsed.completion)
    }
}

/// Mock client for tests: scripted findings per call, recorded prompts.
pub struct MockAnalysisClient {
    responses: Vec<ChunkFindings>,
    calls: Mutex<Vec<String>>,
}

impl MockAnalysisClient {
    /// Return the same findings for every call.
    pub fn new(findings: ChunkFindings) -> Self {
        Self {
            responses: vec![findings],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return one scripted findings object per call, repeating the last
    /// entry once the script runs out.
    pub fn with_sequence(responses: Vec<ChunkFindings>) -> Self {
        assert!(!responses.is_empty(), "sequence must not be empty");
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl AnalysisClient for MockAnalysisClient {
    fn submit(&self, prompt: &str) -> Result<ChunkFindings, AnalysisError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len().min(self.responses.len() - 1);
        calls.push(prompt.to_string());
        Ok(self.responses[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::SafetyFlag;

    #[test]
    fn http_client_normalizes_base_url() {
        let client = HttpAnalysisClient::new("http://localhost:8099/", 120);
        assert_eq!(client.base_url, "http://localhost:8099");
        assert_eq!(client.timeout_secs, 120);
    }

    #[test]
    fn mock_replays_single_response() {
        let findings = ChunkFindings {
            safety_flags: vec![SafetyFlag::new("allergy to latex")],
            ..ChunkFindings::default()
        };
        let mock = MockAnalysisClient::new(findings.clone());

        assert_eq!(mock.submit("first").unwrap(), findings);
        assert_eq!(mock.submit("second").unwrap(), findings);
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn mock_sequence_advances_then_repeats_last() {
        let a = ChunkFindings {
            reasoning: Some("first".into()),
            ..ChunkFindings::default()
        };
        let b = ChunkFindings {
            reasoning: Some("second".into()),
            ..ChunkFindings::default()
        };
        let mock = MockAnalysisClient::with_sequence(vec![a.clone(), b.clone()]);

        assert_eq!(mock.submit("1").unwrap(), a);
        assert_eq!(mock.submit("2").unwrap(), b);
        assert_eq!(mock.submit("3").unwrap(), b);
    }

    #[test]
    fn mock_records_prompts_in_order() {
        let mock = MockAnalysisClient::new(ChunkFindings::default());
        mock.submit("alpha").unwrap();
        mock.submit("beta").unwrap();
        assert_eq!(mock.recorded_prompts(), vec!["alpha", "beta"]);
    }
}
