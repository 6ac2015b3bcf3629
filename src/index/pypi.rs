// src/index/pypi.rs

//! PyPI JSON API client
//!
//! Fetches `<base>/<project>/json` and reads `info.requires_dist`. The
//! response is treated as untrusted: anything that does not match the
//! expected shape counts as "no declared dependencies".

use super::{IndexRequest, PackageIndex, select_dependencies};
use crate::config::IndexSection;
use crate::error::{Error, Result};
use crate::interrupt;
use crate::requirement::Requirement;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

const USER_AGENT: &str = concat!("aptpip/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Deserialize)]
struct ProjectMetadata {
    #[serde(default)]
    info: Option<ProjectInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

/// Parse the dependency list out of a PyPI JSON response body
///
/// Invalid JSON is an error. Valid JSON with a missing, null or oddly shaped
/// `info.requires_dist` yields an empty list, and entries that are not valid
/// requirements are skipped.
pub fn parse_project_metadata(project: &str, body: &str) -> Result<Vec<Requirement>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Invalid JSON from index for {project}: {e}")))?;

    let metadata: ProjectMetadata = serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Unexpected index metadata shape for {}: {}", project, e);
        ProjectMetadata::default()
    });

    let Some(requires_dist) = metadata.info.and_then(|info| info.requires_dist) else {
        debug!("No dependencies declared for {}", project);
        return Ok(Vec::new());
    };

    let deps = requires_dist
        .iter()
        .filter_map(|entry| match Requirement::parse(entry) {
            Ok(req) => Some(req),
            Err(e) => {
                warn!("Skipping dependency '{}' of {}: {}", entry, project, e);
                None
            }
        })
        .collect();

    Ok(deps)
}

/// Blocking PyPI client with retry support
pub struct PypiClient {
    client: Client,
    base: Url,
    max_retries: u32,
    is_interrupted: fn() -> bool,
}

impl PypiClient {
    /// Create a client from the `[index]` config section
    pub fn new(config: &IndexSection) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid index URL '{}': {e}", config.url)))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            max_retries: config.retries.max(1),
            is_interrupted: interrupt::interrupted,
        })
    }

    /// Replace the interrupt check (defaults to the process signal flag)
    pub fn with_interrupt_check(mut self, is_interrupted: fn() -> bool) -> Self {
        self.is_interrupted = is_interrupted;
        self
    }

    /// URL of the JSON metadata document for a project
    pub fn project_url(&self, project: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Index URL {} cannot be a base", self.base)))?
            .pop_if_empty()
            .push(project)
            .push("json");
        Ok(url)
    }

    /// Sleep before the next attempt, unless an interrupt is pending
    fn backoff(&self, attempt: u32) -> Result<()> {
        interrupt::check(self.is_interrupted)?;
        std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)));
        Ok(())
    }

    fn fetch_body(&self, project: &str) -> Result<String> {
        let url = self.project_url(project)?;
        debug!("Fetching data from index: {}", url);

        let mut attempt: u32 = 0;
        loop {
            interrupt::check(self.is_interrupted)?;
            attempt += 1;
            match self.client.get(url.clone()).send() {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(Error::NotFound(format!("{project} is not on the index")));
                    }
                    if status.is_server_error() && attempt < self.max_retries {
                        warn!("Index returned HTTP {} for {}, retrying...", status, project);
                        self.backoff(attempt)?;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(Error::Download(format!("HTTP {status} from {url}")));
                    }

                    return response.text().map_err(|e| {
                        Error::Download(format!("Failed to read response from {url}: {e}"))
                    });
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::Download(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Index fetch attempt {} for {} failed: {}, retrying...", attempt, project, e);
                    self.backoff(attempt)?;
                }
            }
        }
    }
}

impl PackageIndex for PypiClient {
    fn fetch_dependencies(&self, request: &IndexRequest) -> Result<Vec<Requirement>> {
        let body = self.fetch_body(&request.name)?;
        let declared = parse_project_metadata(&request.name, &body)?;
        let selected = select_dependencies(declared, request);
        debug!(
            "Dependencies from index for {}: {:?}",
            request.name,
            selected.iter().map(|r| r.raw.as_str()).collect::<Vec<_>>()
        );
        Ok(selected)
    }
}
