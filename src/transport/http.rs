use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::status::{AppState, StatusTx};
use crate::transport::{Command, DispatchError};

/// Header carrying the editor agent name on every request.
pub const EDITOR_AGENT_HEADER: &str = "MavensMate-Editor-Agent";

/// Agent name reported when none is configured.
pub const DEFAULT_EDITOR_AGENT: &str = "vscode";

/// Delay between status polls for asynchronous commands.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const AVAILABILITY_PATH: &str = "/app/home/index";
const EXECUTE_PATH: &str = "/execute";

/// Connection options for one desktop app session.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub project_id: Option<String>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: None,
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Project scope for outbound requests; empty ids count as unscoped.
    fn project_scope(&self) -> Option<&str> {
        self.project_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Outcome of classifying one job status response.
enum PollState {
    Pending { job_id: String },
    Terminal,
}

/// Client for the desktop app's command execution API.
///
/// Dispatches commands over HTTP and, for asynchronous commands, polls the
/// status endpoint until the job leaves the pending state. Holds no
/// per-command state, so one client may serve concurrent dispatches.
pub struct DesktopClient {
    options: ClientOptions,
    http: Client,
    status: Option<StatusTx>,
    agent: String,
    poll_interval: Duration,
    poll_limit: Option<u32>,
}

impl DesktopClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            http: Client::new(),
            status: None,
            agent: DEFAULT_EDITOR_AGENT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_limit: None,
        }
    }

    /// Broadcast liveness transitions to the given channel.
    pub fn with_status_channel(mut self, status: StatusTx) -> Self {
        self.status = Some(status);
        self
    }

    /// Report a different editor agent name to the server.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Cap the number of status polls per command. Unbounded when unset,
    /// matching the server's own contract for pending jobs.
    pub fn with_poll_limit(mut self, limit: u32) -> Self {
        self.poll_limit = Some(limit);
        self
    }

    /// Probe whether the desktop app is reachable.
    ///
    /// Resolves the liveness channel to `Available` or `Unavailable` and
    /// returns the same verdict. Probe failures are absorbed here, never
    /// surfaced as errors.
    pub async fn check_availability(&self) -> bool {
        let url = self.endpoint(AVAILABILITY_PATH);
        let available = match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(url = %url, error = %err, "availability probe failed");
                false
            }
        };

        if available {
            self.signal(AppState::Available);
        } else {
            self.signal(AppState::Unavailable);
        }
        available
    }

    /// Dispatch a command and drive it to its terminal response.
    ///
    /// Synchronous commands resolve with the immediate response body.
    /// Asynchronous commands enter the poll loop and resolve with the first
    /// non-pending body the status endpoint reports. Transport failures and
    /// non-success statuses at any step abort the dispatch.
    pub async fn send_command(&self, command: &Command) -> Result<Value> {
        if command.id().is_empty() {
            return Err(DispatchError::EmptyCommandId.into());
        }

        let url = self.endpoint(EXECUTE_PATH);
        let async_flag = if command.is_async() { "1" } else { "0" };
        let mut query: Vec<(&str, &str)> = vec![("command", command.id()), ("async", async_flag)];
        if let Some(project_id) = self.options.project_scope() {
            query.push(("pid", project_id));
        }

        debug!(
            command = %command.id(),
            asynchronous = command.is_async(),
            url = %url,
            "dispatching command"
        );
        self.signal(AppState::Busy);

        let response = self
            .http
            .post(&url)
            .query(&query)
            .header(CONTENT_TYPE, "application/json")
            .header(EDITOR_AGENT_HEADER, &self.agent)
            .json(command.body())
            .send()
            .await
            .context("command dispatch send")?;
        let body = read_json(response).await?;

        if !command.is_async() {
            return Ok(body);
        }
        self.drive_to_completion(body).await
    }

    /// Poll loop for an asynchronous command, starting from the execute
    /// endpoint's initial response. Every pending classification waits the
    /// configured interval, signals `Busy`, and re-requests job status.
    async fn drive_to_completion(&self, first: Value) -> Result<Value> {
        let mut response = first;
        let mut attempts: u32 = 0;

        loop {
            let job_id = match classify(&response)? {
                PollState::Terminal => {
                    debug!(polls = attempts, "command reached terminal status");
                    return Ok(response);
                }
                PollState::Pending { job_id } => job_id,
            };

            if let Some(limit) = self.poll_limit {
                if attempts >= limit {
                    return Err(DispatchError::PollBudgetExhausted { attempts }.into());
                }
            }
            attempts += 1;

            trace!(job = %job_id, attempt = attempts, "job still pending");
            sleep(self.poll_interval).await;
            self.signal(AppState::Busy);
            response = self.poll_status(&job_id).await?;
        }
    }

    async fn poll_status(&self, job_id: &str) -> Result<Value> {
        let url = self.endpoint(&format!("{EXECUTE_PATH}/{job_id}"));
        let response = self
            .http
            .get(&url)
            .header(EDITOR_AGENT_HEADER, &self.agent)
            .send()
            .await
            .context("status poll send")?;
        read_json(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.options.base_url.trim_end_matches('/'), path)
    }

    fn signal(&self, state: AppState) {
        if let Some(status) = &self.status {
            // Ignore send errors; liveness updates without subscribers are fine.
            let _ = status.send(state);
        }
    }
}

/// Split a job status body into pending and terminal outcomes.
/// A pending body without a usable job id is a protocol error; polling with
/// an undefined id would loop forever against the wrong resource.
fn classify(response: &Value) -> Result<PollState, DispatchError> {
    let pending = response.get("status").and_then(Value::as_str) == Some("pending");
    if !pending {
        return Ok(PollState::Terminal);
    }
    match response.get("id").and_then(Value::as_str) {
        Some(job_id) if !job_id.is_empty() => Ok(PollState::Pending {
            job_id: job_id.to_string(),
        }),
        _ => Err(DispatchError::MissingJobId),
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.context("read response body")?;
    if !status.is_success() {
        return Err(DispatchError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    serde_json::from_str(&body).context("parse response json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> DesktopClient {
        DesktopClient::new(ClientOptions::new(server.url()))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn classify_splits_pending_and_terminal() {
        let pending = json!({ "id": "job-1", "status": "pending" });
        assert!(matches!(
            classify(&pending),
            Ok(PollState::Pending { job_id }) if job_id == "job-1"
        ));

        let complete = json!({ "id": "job-1", "complete": true });
        assert!(matches!(classify(&complete), Ok(PollState::Terminal)));

        let odd_status = json!({ "id": "job-1", "status": "done" });
        assert!(matches!(classify(&odd_status), Ok(PollState::Terminal)));
    }

    #[test]
    fn classify_rejects_pending_without_job_id() {
        let anonymous = json!({ "status": "pending" });
        assert!(matches!(
            classify(&anonymous),
            Err(DispatchError::MissingJobId)
        ));

        let blank = json!({ "id": "", "status": "pending" });
        assert!(matches!(classify(&blank), Err(DispatchError::MissingJobId)));
    }

    #[tokio::test]
    async fn availability_probe_absorbs_failures() {
        let mut server = Server::new_async().await;
        let probe = server
            .mock("GET", "/app/home/index")
            .with_status(500)
            .create_async()
            .await;

        assert!(!client_for(&server).check_availability().await);
        probe.assert_async().await;

        // Connection refused, not just a server error.
        let dead = DesktopClient::new(ClientOptions::new("http://127.0.0.1:1"));
        assert!(!dead.check_availability().await);
    }

    #[tokio::test]
    async fn availability_probe_reports_success() {
        let mut server = Server::new_async().await;
        let probe = server
            .mock("GET", "/app/home/index")
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;

        assert!(client_for(&server).check_availability().await);
        probe.assert_async().await;
    }

    #[tokio::test]
    async fn empty_command_id_is_rejected_before_sending() {
        let server = Server::new_async().await;
        let err = client_for(&server)
            .send_command(&Command::new("", false))
            .await
            .expect_err("empty id must not dispatch");
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::EmptyCommandId)
        ));
    }

    #[tokio::test]
    async fn non_success_status_propagates_with_body() {
        let mut server = Server::new_async().await;
        let execute = server
            .mock("POST", "/execute")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client_for(&server)
            .send_command(&Command::new("open-ui", false))
            .await
            .expect_err("server error must propagate");
        match err.downcast_ref::<DispatchError>() {
            Some(DispatchError::Status { status, body }) => {
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        execute.assert_async().await;
    }

    #[tokio::test]
    async fn project_scope_is_attached_when_configured() {
        let mut server = Server::new_async().await;
        let execute = server
            .mock("POST", "/execute")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("command".into(), "open-ui".into()),
                Matcher::UrlEncoded("async".into(), "0".into()),
                Matcher::UrlEncoded("pid".into(), "p1".into()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = DesktopClient::new(
            ClientOptions::new(server.url()).with_project_id("p1"),
        );
        client
            .send_command(&Command::new("open-ui", false))
            .await
            .expect("scoped dispatch should succeed");
        execute.assert_async().await;
    }

    #[tokio::test]
    async fn blank_project_id_counts_as_unscoped() {
        let mut server = Server::new_async().await;
        let scoped = server
            .mock("POST", "/execute")
            .match_query(Matcher::UrlEncoded("pid".into(), "".into()))
            .expect(0)
            .create_async()
            .await;
        let unscoped = server
            .mock("POST", "/execute")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("command".into(), "open-ui".into()),
                Matcher::UrlEncoded("async".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = DesktopClient::new(
            ClientOptions::new(server.url()).with_project_id(""),
        );
        client
            .send_command(&Command::new("open-ui", false))
            .await
            .expect("unscoped dispatch should succeed");
        scoped.assert_async().await;
        unscoped.assert_async().await;
    }

    #[tokio::test]
    async fn pending_without_job_id_fails_fast() {
        let mut server = Server::new_async().await;
        let execute = server
            .mock("POST", "/execute")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "pending" }).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", Matcher::Regex("^/execute/.+$".into()))
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .send_command(&Command::new("open-ui", true))
            .await
            .expect_err("anonymous pending job must fail");
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::MissingJobId)
        ));
        execute.assert_async().await;
        status.assert_async().await;
    }

    #[tokio::test]
    async fn poll_limit_surfaces_as_distinct_error() {
        let mut server = Server::new_async().await;
        let pending = json!({ "id": "job-1", "status": "pending" }).to_string();
        let execute = server
            .mock("POST", "/execute")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(&pending)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/execute/job-1")
            .with_status(200)
            .with_body(&pending)
            .expect(2)
            .create_async()
            .await;

        let err = client_for(&server)
            .with_poll_limit(2)
            .send_command(&Command::new("open-ui", true))
            .await
            .expect_err("exhausted poll budget must fail");
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::PollBudgetExhausted { attempts: 2 })
        ));
        execute.assert_async().await;
        status.assert_async().await;
    }
}
