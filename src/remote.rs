use std::thread;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::{API_KEY_ENV, RemoteConfig};
use crate::domain::{CategoryCount, Dataset, DatasetKind, Identifier};
use crate::error::CalldeckError;

/// Stored record for one `(identifier, dataset_kind)` key. Upsert semantics:
/// at most one live record per key, last write wins, no versioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub identifier: String,
    pub dataset_kind: DatasetKind,
    pub values: Vec<CategoryCount>,
    pub updated_at: String,
}

pub trait DatasetClient: Send + Sync {
    /// Looks up the unique record for the key. `Ok(None)` means no record
    /// exists, which is a valid outcome, not an error.
    fn fetch(
        &self,
        identifier: &Identifier,
        kind: DatasetKind,
    ) -> Result<Option<Dataset>, CalldeckError>;

    /// Upserts the record for the key, stamping `updated_at` with the
    /// current time. Overwrites any prior record for the exact key.
    fn save(
        &self,
        identifier: &Identifier,
        kind: DatasetKind,
        values: &[CategoryCount],
    ) -> Result<(), CalldeckError>;
}

/// PostgREST-style HTTP implementation. Filters are equality matches on the
/// key columns; upserts go through `Prefer: resolution=merge-duplicates`.
#[derive(Clone)]
pub struct RestDatasetClient {
    client: Client,
    records_url: String,
}

impl RestDatasetClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self, CalldeckError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("calldeck/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CalldeckError::RemoteHttp(err.to_string()))?,
        );

        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            if !api_key.trim().is_empty() {
                headers.insert(
                    "apikey",
                    HeaderValue::from_str(api_key.trim())
                        .map_err(|err| CalldeckError::RemoteHttp(err.to_string()))?,
                );
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                        .map_err(|err| CalldeckError::RemoteHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()
            .map_err(|err| CalldeckError::RemoteHttp(err.to_string()))?;

        Ok(Self {
            client,
            records_url: format!("{}/{}", remote.base_url.trim_end_matches('/'), remote.table),
        })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, CalldeckError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CalldeckError::RemoteHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CalldeckError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "remote store request failed".to_string());
        Err(CalldeckError::RemoteStatus { status, message })
    }
}

impl DatasetClient for RestDatasetClient {
    fn fetch(
        &self,
        identifier: &Identifier,
        kind: DatasetKind,
    ) -> Result<Option<Dataset>, CalldeckError> {
        let identifier_filter = format!("eq.{}", identifier.as_str());
        let kind_filter = format!("eq.{}", kind.as_str());
        let response = self.send_with_retries(|| {
            self.client.get(&self.records_url).query(&[
                ("identifier", identifier_filter.as_str()),
                ("dataset_kind", kind_filter.as_str()),
                ("select", "values"),
                ("limit", "1"),
            ])
        })?;
        let response = Self::handle_status(response)?;

        #[derive(Deserialize)]
        struct Row {
            values: Vec<CategoryCount>,
        }

        let rows: Vec<Row> = response
            .json()
            .map_err(|err| CalldeckError::RemoteDecode(err.to_string()))?;
        Ok(rows.into_iter().next().map(|row| row.values))
    }

    fn save(
        &self,
        identifier: &Identifier,
        kind: DatasetKind,
        values: &[CategoryCount],
    ) -> Result<(), CalldeckError> {
        let record = RemoteRecord {
            identifier: identifier.as_str().to_string(),
            dataset_kind: kind,
            values: values.to_vec(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let response = self.send_with_retries(|| {
            self.client
                .post(&self.records_url)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(std::slice::from_ref(&record))
        })?;
        Self::handle_status(response)?;
        Ok(())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
