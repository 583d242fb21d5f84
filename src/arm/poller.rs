//! Long-Running Operations
//!
//! Mutating ARM calls may finish asynchronously. The initial response tells
//! us how to follow up:
//!
//! 1. an `Azure-AsyncOperation` header: poll it and read `status`
//! 2. a `Location` header on a `202`: poll it until it stops returning `202`
//! 3. a body with a non-terminal `properties.provisioningState`: poll the
//!    resource itself
//! 4. none of the above: the operation is already complete
//!
//! `Retry-After` on any response overrides the poll interval, down to
//! [`MIN_POLL_INTERVAL`].

use super::client::ArmClient;
use super::http::{is_not_found, ArmResponse, ErrorDetail};
use crate::enums::OperationStatus;
use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Shortest wait between polls, whatever the service or config asks for
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why waiting on an operation stopped without success
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LroError {
    #[error("long-running operation failed: {}", .code.as_deref().unwrap_or("unknown error"))]
    Failed {
        code: Option<String>,
        message: Option<String>,
    },

    #[error("long-running operation was canceled by the service")]
    Canceled,

    #[error("timed out after {0:?} waiting for long-running operation")]
    TimedOut(Duration),

    #[error("stopped waiting for long-running operation")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PollingMethod {
    Done,
    AsyncOperation {
        url: String,
        /// Resource to re-read once the operation succeeds (PUT/PATCH)
        final_url: Option<String>,
    },
    Location {
        url: String,
    },
    ProvisioningState {
        url: String,
    },
}

#[derive(Debug, Deserialize)]
struct AsyncOperationBody {
    #[serde(default)]
    status: Option<OperationStatus>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// Tracks one long-running operation until it reaches a terminal state
#[derive(Debug)]
pub struct Poller {
    client: ArmClient,
    method: PollingMethod,
    status: OperationStatus,
    interval: Duration,
    error: Option<ErrorDetail>,
    result: Option<Value>,
    polls: usize,
}

impl Poller {
    /// Work out how to follow up on the initial response of `request_method`
    pub(crate) fn from_response(
        client: ArmClient,
        request_method: &Method,
        response: ArmResponse,
        resource_url: &str,
    ) -> Self {
        let interval = retry_after(&response)
            .unwrap_or(client.poll_settings.interval)
            .max(MIN_POLL_INTERVAL);
        let rereads_resource = *request_method == Method::PUT || *request_method == Method::PATCH;

        let (method, status) = if let Some(url) = response.header("Azure-AsyncOperation") {
            (
                PollingMethod::AsyncOperation {
                    url: url.to_string(),
                    final_url: rereads_resource.then(|| resource_url.to_string()),
                },
                OperationStatus::InProgress,
            )
        } else if let (StatusCode::ACCEPTED, Some(url)) = (response.status, response.header("Location")) {
            (
                PollingMethod::Location {
                    url: url.to_string(),
                },
                OperationStatus::InProgress,
            )
        } else {
            match provisioning_state(&response.body) {
                Some(state) if !state.is_terminal() => (
                    PollingMethod::ProvisioningState {
                        url: resource_url.to_string(),
                    },
                    state,
                ),
                Some(state) => (PollingMethod::Done, state),
                None => {
                    if response.status == StatusCode::ACCEPTED {
                        tracing::warn!(
                            "202 Accepted without polling headers for {}, treating as complete",
                            resource_url
                        );
                    }
                    (PollingMethod::Done, OperationStatus::Succeeded)
                },
            }
        };

        let error = (status == OperationStatus::Failed)
            .then(|| resource_error(&response.body))
            .flatten();
        let result = (!response.body.is_null()).then_some(response.body);

        Self {
            client,
            method,
            status,
            interval,
            error,
            result,
            polls: 0,
        }
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of follow-up requests made so far
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Latest resource body seen, if any
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Decode the latest resource body
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.result
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .context("failure decoding long-running operation result")
    }

    /// Issue one status check
    pub async fn poll(&mut self) -> Result<OperationStatus> {
        let method = self.method.clone();
        match method {
            PollingMethod::Done => return Ok(self.status.clone()),
            PollingMethod::AsyncOperation { url, final_url } => {
                let response = self
                    .client
                    .send(Method::GET, &url, None)
                    .await
                    .context("polling async operation")?;
                self.update_interval(&response);

                let body: AsyncOperationBody = serde_json::from_value(response.body)
                    .context("failure decoding async operation status")?;
                self.status = body.status.unwrap_or(OperationStatus::InProgress);
                self.error = body.error;

                if self.status.is_success() {
                    if let Some(final_url) = final_url {
                        let response = self
                            .client
                            .send(Method::GET, &final_url, None)
                            .await
                            .context("retrieving result of long-running operation")?;
                        self.result = Some(response.body);
                    }
                }
            },
            PollingMethod::Location { url } => {
                let response = self
                    .client
                    .send(Method::GET, &url, None)
                    .await
                    .context("polling operation location")?;
                self.update_interval(&response);

                if response.status == StatusCode::ACCEPTED {
                    self.status = OperationStatus::InProgress;
                } else {
                    self.status = OperationStatus::Succeeded;
                    if !response.body.is_null() {
                        self.result = Some(response.body);
                    }
                }
            },
            PollingMethod::ProvisioningState { url } => {
                match self.client.send(Method::GET, &url, None).await {
                    Ok(response) => {
                        self.update_interval(&response);
                        self.status = provisioning_state(&response.body)
                            .unwrap_or(OperationStatus::Succeeded);
                        if self.status == OperationStatus::Failed {
                            self.error = resource_error(&response.body);
                        }
                        self.result = Some(response.body);
                    },
                    Err(e) if is_not_found(&e) && self.status == OperationStatus::Deleting => {
                        self.status = OperationStatus::Succeeded;
                        self.result = None;
                    },
                    Err(e) => return Err(e.context("polling provisioning state")),
                }
            },
        }

        self.polls += 1;
        tracing::debug!("poll {}: status {}", self.polls, self.status);

        if self.is_done() {
            self.method = PollingMethod::Done;
            tracing::info!(
                "long-running operation finished with status {} after {} polls",
                self.status,
                self.polls
            );
        }

        Ok(self.status.clone())
    }

    /// Wait using the client's configured timeout
    pub async fn wait(&mut self) -> Result<()> {
        let timeout = self.client.poll_settings.timeout;
        self.wait_with_timeout(timeout).await
    }

    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.run_to_completion()).await {
            Ok(result) => result,
            Err(_) => Err(LroError::TimedOut(timeout).into()),
        }
    }

    /// Wait until done, or until `cancel` resolves
    pub async fn wait_until<F>(&mut self, cancel: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run_to_completion() => result,
            _ = cancel => Err(LroError::Cancelled.into()),
        }
    }

    async fn run_to_completion(&mut self) -> Result<()> {
        while !self.is_done() {
            tokio::time::sleep(self.interval).await;
            self.poll().await?;
        }
        self.outcome()
    }

    fn outcome(&self) -> Result<()> {
        match &self.status {
            OperationStatus::Succeeded => Ok(()),
            OperationStatus::Failed => {
                let detail = self.error.clone().unwrap_or_default();
                if let Some(message) = &detail.message {
                    tracing::error!("long-running operation failed: {}", message);
                }
                Err(LroError::Failed {
                    code: detail.code,
                    message: detail.message,
                }
                .into())
            },
            OperationStatus::Canceled | OperationStatus::Cancelled => Err(LroError::Canceled.into()),
            other => Err(anyhow::anyhow!(
                "long-running operation is not finished (status {})",
                other
            )),
        }
    }

    fn update_interval(&mut self, response: &ArmResponse) {
        if let Some(interval) = retry_after(response) {
            self.interval = interval.max(MIN_POLL_INTERVAL);
        }
    }
}

fn provisioning_state(body: &Value) -> Option<OperationStatus> {
    body.pointer("/properties/provisioningState")
        .and_then(Value::as_str)
        .map(OperationStatus::parse)
}

/// Error details a failed resource reports about itself
fn resource_error(body: &Value) -> Option<ErrorDetail> {
    body.pointer("/properties/error")
        .or_else(|| body.get("error"))
        .filter(|error| error.is_object())
        .and_then(|error| serde_json::from_value(error.clone()).ok())
}

/// `Retry-After` as delta-seconds or an HTTP-date
fn retry_after(response: &ArmResponse) -> Option<Duration> {
    let raw = response.header("Retry-After")?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = chrono::DateTime::parse_from_rfc2822(raw).ok()?;
    (at.with_timezone(&chrono::Utc) - chrono::Utc::now())
        .to_std()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::auth::AzureCredentials;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde_json::json;

    fn client() -> ArmClient {
        let creds = AzureCredentials::from_static_token("t").unwrap();
        ArmClient::with_endpoint("http://localhost:1", creds, "sub").unwrap()
    }

    fn response(status: StatusCode, headers: &[(&'static str, &str)], body: Value) -> ArmResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        ArmResponse {
            status,
            headers: map,
            body,
        }
    }

    #[test]
    fn test_async_operation_header_wins() {
        let initial = response(
            StatusCode::CREATED,
            &[
                ("Azure-AsyncOperation", "http://localhost:1/op"),
                ("Location", "http://localhost:1/loc"),
            ],
            json!({"properties": {"provisioningState": "Creating"}}),
        );
        let poller = Poller::from_response(client(), &Method::PUT, initial, "http://localhost:1/r");
        assert_eq!(
            poller.method,
            PollingMethod::AsyncOperation {
                url: "http://localhost:1/op".to_string(),
                final_url: Some("http://localhost:1/r".to_string()),
            }
        );
        assert!(!poller.is_done());
    }

    #[test]
    fn test_location_only_counts_on_202() {
        let accepted = response(StatusCode::ACCEPTED, &[("Location", "http://localhost:1/loc")], Value::Null);
        let poller = Poller::from_response(client(), &Method::DELETE, accepted, "http://localhost:1/r");
        assert!(matches!(poller.method, PollingMethod::Location { .. }));

        let ok = response(StatusCode::OK, &[("Location", "http://localhost:1/loc")], Value::Null);
        let poller = Poller::from_response(client(), &Method::DELETE, ok, "http://localhost:1/r");
        assert_eq!(poller.method, PollingMethod::Done);
        assert_eq!(poller.status(), &OperationStatus::Succeeded);
    }

    #[test]
    fn test_provisioning_state_in_body() {
        let creating = response(
            StatusCode::CREATED,
            &[],
            json!({"properties": {"provisioningState": "Updating"}}),
        );
        let poller = Poller::from_response(client(), &Method::PUT, creating, "http://localhost:1/r");
        assert!(matches!(poller.method, PollingMethod::ProvisioningState { .. }));
        assert_eq!(poller.status(), &OperationStatus::Updating);

        let done = response(
            StatusCode::OK,
            &[],
            json!({"properties": {"provisioningState": "succeeded"}}),
        );
        let poller = Poller::from_response(client(), &Method::PUT, done, "http://localhost:1/r");
        assert!(poller.is_done());
        assert!(poller.result().is_some());
    }

    #[test]
    fn test_retry_after_seconds() {
        let r = response(StatusCode::ACCEPTED, &[("Retry-After", "7")], Value::Null);
        assert_eq!(retry_after(&r), Some(Duration::from_secs(7)));

        let past = response(
            StatusCode::ACCEPTED,
            &[("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT")],
            Value::Null,
        );
        assert_eq!(retry_after(&past), None);
    }

    #[test]
    fn test_failed_outcome_carries_error() {
        let mut poller = Poller::from_response(
            client(),
            &Method::DELETE,
            response(StatusCode::OK, &[], Value::Null),
            "http://localhost:1/r",
        );
        poller.status = OperationStatus::Failed;
        poller.error = Some(ErrorDetail {
            code: Some("Conflict".to_string()),
            message: Some("busy".to_string()),
        });

        let err = poller.outcome().unwrap_err();
        let lro = err.downcast_ref::<LroError>().unwrap();
        assert_eq!(
            lro,
            &LroError::Failed {
                code: Some("Conflict".to_string()),
                message: Some("busy".to_string()),
            }
        );
    }

    #[test]
    fn test_failed_resource_reports_its_error() {
        let failed = response(
            StatusCode::OK,
            &[],
            json!({"properties": {
                "provisioningState": "Failed",
                "error": {"code": "QuotaExceeded", "message": "no cores left"}
            }}),
        );
        let poller = Poller::from_response(client(), &Method::PUT, failed, "http://localhost:1/r");
        let err = poller.outcome().unwrap_err();
        assert_eq!(
            err.downcast_ref::<LroError>(),
            Some(&LroError::Failed {
                code: Some("QuotaExceeded".to_string()),
                message: Some("no cores left".to_string()),
            })
        );

        let top_level = json!({"error": {"code": "Gone"}, "properties": {}});
        assert_eq!(
            resource_error(&top_level).and_then(|e| e.code).as_deref(),
            Some("Gone")
        );
        assert!(resource_error(&json!({"properties": {"error": "text"}})).is_none());
    }

    #[test]
    fn test_zero_intervals_are_floored() {
        let creds = AzureCredentials::from_static_token("t").unwrap();
        let eager = ArmClient::with_endpoint("http://localhost:1", creds, "sub")
            .unwrap()
            .with_poll_settings(crate::arm::client::PollSettings {
                interval: Duration::ZERO,
                timeout: Duration::from_secs(1),
            });

        let accepted = response(StatusCode::ACCEPTED, &[("Location", "http://localhost:1/loc")], Value::Null);
        let poller = Poller::from_response(eager, &Method::DELETE, accepted, "http://localhost:1/r");
        assert_eq!(poller.interval, MIN_POLL_INTERVAL);

        let mut poller = Poller::from_response(
            client(),
            &Method::DELETE,
            response(StatusCode::ACCEPTED, &[("Retry-After", "0"), ("Location", "http://localhost:1/loc")], Value::Null),
            "http://localhost:1/r",
        );
        assert_eq!(poller.interval, MIN_POLL_INTERVAL);
        poller.update_interval(&response(StatusCode::ACCEPTED, &[("Retry-After", "0")], Value::Null));
        assert_eq!(poller.interval, MIN_POLL_INTERVAL);
    }
}
