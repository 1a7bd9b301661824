//! HTTP client for the gauntlet master REST API.

use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use gauntlet_core::protocol::{SuiteCreated, SuiteSettings, SuiteStatusResponse};

use crate::monitor::StatusSource;

/// Client for the master's suite endpoints.
pub struct MasterSession {
    base_url: String,
    http: reqwest::Client,
}

impl MasterSession {
    /// Create a new session against `host:port` (scheme optional).
    pub fn new(address: &str) -> Self {
        let base_url = if address.starts_with("http://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Submit a suite: the settings JSON plus any locally uploaded
    /// candidate and dataset artifacts. Returns the new suite id.
    pub async fn submit_suite(
        &self,
        settings: &SuiteSettings,
        candidate_source: Option<Vec<u8>>,
        data_source: Option<Vec<u8>>,
    ) -> Result<String> {
        let mut form = Form::new().text("suite_settings", serde_json::to_string(settings)?);
        if let Some(content) = candidate_source {
            form = form.part(
                "candidate_source",
                Part::bytes(content).file_name("candidate_source"),
            );
        }
        if let Some(content) = data_source {
            form = form.part("data_source", Part::bytes(content).file_name("data_source"));
        }

        let url = format!("{}/suite", self.base_url);
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("master not reachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("error generating suite - {}: {}", status, body);
        }

        let created: SuiteCreated = resp.json().await.context("failed to parse suite response")?;
        Ok(created.suite_id)
    }

    /// Fetch the current status of every experiment in a suite.
    pub async fn fetch_suite_status(&self, suite_id: &str) -> Result<SuiteStatusResponse> {
        let url = format!("{}/suite/{}/experiments", self.base_url, suite_id);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("master not reachable")?;

        if !resp.status().is_success() {
            bail!("suite status request failed: {}", resp.status());
        }
        resp.json().await.context("failed to parse suite status")
    }

    /// Download the suite's CSV dump to a local file.
    pub async fn download_dump(&self, suite_id: &str, output: &Path) -> Result<()> {
        let url = format!("{}/suite/{}/dump", self.base_url, suite_id);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("master not reachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("dump request failed {}: {}", status, body);
        }

        let content = resp.bytes().await.context("failed to read dump body")?;
        tokio::fs::write(output, &content)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for MasterSession {
    async fn fetch_statuses(&self, suite_id: &str) -> Result<SuiteStatusResponse> {
        self.fetch_suite_status(suite_id).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────
