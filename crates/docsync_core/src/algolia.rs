use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AlgoliaSettings;
use crate::record::SearchRecord;

const TASK_PUBLISHED: &str = "published";

/// Destination for search records. The whole index is replaced on every run,
/// so `clear` is always called once before the first `upload`.
pub trait SearchIndex {
    fn clear(&mut self) -> Result<()>;
    /// Add records, letting the backend assign object IDs, and return only
    /// once the backend has applied them.
    fn upload(&mut self, records: &[SearchRecord]) -> Result<()>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    requests: Vec<BatchOperation<'a>>,
}

#[derive(Debug, Serialize)]
struct BatchOperation<'a> {
    action: &'static str,
    body: &'a SearchRecord,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(rename = "taskID")]
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    status: String,
}

pub struct AlgoliaClient {
    client: Client,
    host: Url,
    app_id: String,
    api_key: String,
    index_name: String,
    batch_size: usize,
    task_poll: Duration,
    request_count: usize,
}

impl AlgoliaClient {
    pub fn new(settings: &AlgoliaSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let host = algolia_host(settings)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("failed to build Algolia HTTP client")?;

        Ok(Self {
            client,
            host,
            app_id: settings.app_id.clone(),
            api_key,
            index_name: settings.index_name.clone(),
            batch_size: settings.batch_size.max(1),
            task_poll: Duration::from_millis(settings.task_poll_ms),
            request_count: 0,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        index_endpoint(&self.host, &self.index_name, segments)
    }

    fn request_json<T: DeserializeOwned>(
        &mut self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        self.request_count += 1;
        let response = request
            .header("X-Algolia-Application-Id", self.app_id.as_str())
            .header("X-Algolia-API-Key", self.api_key.as_str())
            .send()
            .with_context(|| format!("failed to call Algolia {operation}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!(
                "Algolia {operation} failed with HTTP {status}: {}",
                error_message(&body)
            );
        }

        response
            .json::<T>()
            .with_context(|| format!("failed to decode Algolia {operation} response"))
    }

    fn wait_for_task(&mut self, task_id: u64) -> Result<()> {
        let url = self.endpoint(&["task", &task_id.to_string()])?;
        loop {
            let request = self.client.get(url.clone());
            let status: TaskStatusResponse = self.request_json(request, "task status")?;
            if status.status == TASK_PUBLISHED {
                debug!(task_id, "algolia task published");
                return Ok(());
            }
            sleep(self.task_poll);
        }
    }
}

impl SearchIndex for AlgoliaClient {
    fn clear(&mut self) -> Result<()> {
        let request = self.client.post(self.endpoint(&["clear"])?);
        let task: TaskResponse = self.request_json(request, "clear")?;
        self.wait_for_task(task.task_id)
    }

    fn upload(&mut self, records: &[SearchRecord]) -> Result<()> {
        for chunk in records.chunks(self.batch_size) {
            let body = batch_body(chunk);
            let request = self.client.post(self.endpoint(&["batch"])?).json(&body);
            let task: TaskResponse = self.request_json(request, "batch")?;
            debug!(task_id = task.task_id, records = chunk.len(), "algolia batch accepted");
            self.wait_for_task(task.task_id)?;
        }
        Ok(())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// Stands in for the backend during `--dry-run`; nothing leaves the process.
#[derive(Debug, Default)]
pub struct DryRunIndex {
    pub cleared: bool,
    pub batches: usize,
    pub records: usize,
}

impl SearchIndex for DryRunIndex {
    fn clear(&mut self) -> Result<()> {
        self.cleared = true;
        Ok(())
    }

    fn upload(&mut self, records: &[SearchRecord]) -> Result<()> {
        self.batches += 1;
        self.records += records.len();
        Ok(())
    }

    fn request_count(&self) -> usize {
        0
    }
}

/// `addObject` leaves `objectID` assignment to Algolia.
fn batch_body(records: &[SearchRecord]) -> BatchRequest<'_> {
    BatchRequest {
        requests: records
            .iter()
            .map(|record| BatchOperation {
                action: "addObject",
                body: record,
            })
            .collect(),
    }
}

fn algolia_host(settings: &AlgoliaSettings) -> Result<Url> {
    let raw = match &settings.host {
        Some(host) => host.clone(),
        None => format!("https://{}.algolia.net", settings.app_id.to_ascii_lowercase()),
    };
    Url::parse(&raw).with_context(|| format!("invalid Algolia host: {raw}"))
}

fn index_endpoint(host: &Url, index_name: &str, segments: &[&str]) -> Result<Url> {
    let mut url = host.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("Algolia host cannot carry a path: {host}"))?
        .pop_if_empty()
        .extend(["1", "indexes", index_name])
        .extend(segments);
    Ok(url)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
