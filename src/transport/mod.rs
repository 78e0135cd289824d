pub mod http;

use serde_json::{json, Value};

pub use http::{ClientOptions, DesktopClient};

/// One remote operation the desktop app can execute.
///
/// The identifier and synchronicity flag are fixed at construction; only the
/// request body may be shaped before the command is sent.
#[derive(Debug, Clone)]
pub struct Command {
    id: String,
    is_async: bool,
    body: Value,
    allow_without_project: bool,
}

impl Command {
    pub fn new(id: impl Into<String>, is_async: bool) -> Self {
        Self {
            id: id.into(),
            is_async,
            body: json!({ "args": {} }),
            allow_without_project: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Request body sent to the execute endpoint.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn allows_without_project(&self) -> bool {
        self.allow_without_project
    }

    /// Set one entry under the `args` object of the request body.
    /// The body must be a JSON object, which `new` guarantees.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body["args"][key.into()] = value.into();
        self
    }

    /// Replace the entire request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Mark the command as runnable without a project scope.
    pub fn allow_without_project(mut self) -> Self {
        self.allow_without_project = true;
        self
    }
}

/// Protocol failures callers may need to tell apart from plain transport
/// errors. Wrapped into `anyhow::Error` at the dispatch boundary.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("command id must not be empty")]
    EmptyCommandId,

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("pending job status carried no job id")]
    MissingJobId,

    #[error("job still pending after {attempts} status polls")]
    PollBudgetExhausted { attempts: u32 },
}
