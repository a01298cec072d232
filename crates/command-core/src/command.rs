//! Command System
//!
//! Slash commands are registered at startup and dispatched by name.
//! Each invocation is validated against the command's schema and runs
//! inside its own tracing span.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{CommandError, Result};

/// Default upper bound for a single command invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Slash-command invocation from the chat transport
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandCall {
    /// Command name without the leading slash
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,

    /// Display name of the invoking user
    #[serde(default)]
    pub invoked_by: Option<String>,

    /// When the transport received the call
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl CommandCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            id: None,
            invoked_by: None,
            received_at: Utc::now(),
        }
    }

    /// Builder-style argument setter
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn invoked_by(mut self, user: impl Into<String>) -> Self {
        self.invoked_by = Some(user.into());
        self
    }

    /// String argument, trimmed; empty strings count as absent
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric argument. Accepts JSON numbers and numeric strings.
    pub fn f64_arg(&self, name: &str) -> Result<Option<f64>> {
        match self.arguments.get(name) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => value_as_f64(value)
                .map(Some)
                .ok_or_else(|| CommandError::invalid_argument(name, "expected a number")),
        }
    }

    /// Integer argument. Accepts JSON integers and integer strings.
    pub fn i64_arg(&self, name: &str) -> Result<Option<i64>> {
        match self.arguments.get(name) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| CommandError::invalid_argument(name, "expected a whole number")),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CommandError::invalid_argument(name, "expected a whole number")),
            Some(_) => Err(CommandError::invalid_argument(name, "expected a whole number")),
        }
    }

    pub fn required_str(&self, name: &str) -> Result<&str> {
        self.str_arg(name)
            .ok_or_else(|| CommandError::Validation(format!("Missing required parameter: {name}")))
    }

    pub fn required_f64(&self, name: &str) -> Result<f64> {
        self.f64_arg(name)?
            .ok_or_else(|| CommandError::Validation(format!("Missing required parameter: {name}")))
    }

    pub fn required_i64(&self, name: &str) -> Result<i64> {
        self.i64_arg(name)?
            .ok_or_else(|| CommandError::Validation(format!("Missing required parameter: {name}")))
    }
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Reply produced by a command
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandReply {
    /// Command that was called
    pub name: String,

    /// Call ID
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Plain-text reply (success message or user-facing error)
    pub output: String,

    /// Structured render payload (embeds, chart series)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandReply {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Parameter definition for command schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    /// Inclusive lower bound for numeric parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Inclusive upper bound for numeric parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl ParameterSchema {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
            minimum: None,
            maximum: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.enum_values = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

/// Command definition schema (used for registration with the chat platform)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandSchema {
    /// Unique command identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,
}

/// Command trait - implement to add a new slash command
#[async_trait]
pub trait Command: Send + Sync {
    /// Get the command's schema
    fn schema(&self) -> CommandSchema;

    /// Execute the command with given arguments
    async fn execute(&self, call: &CommandCall) -> Result<CommandReply>;

    /// Validate arguments before execution
    fn validate(&self, call: &CommandCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            let Some(value) = call.arguments.get(&param.name).filter(|v| !v.is_null()) else {
                if param.required {
                    return Err(CommandError::Validation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                continue;
            };

            if let Some(allowed) = &param.enum_values {
                if !allowed.contains(value) {
                    let choices: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                    return Err(CommandError::invalid_argument(
                        &param.name,
                        format!("must be one of {}", choices.join(", ")),
                    ));
                }
            }

            if param.minimum.is_some() || param.maximum.is_some() {
                let number = value_as_f64(value).ok_or_else(|| {
                    CommandError::invalid_argument(&param.name, "expected a number")
                })?;
                if param.minimum.is_some_and(|min| number < min)
                    || param.maximum.is_some_and(|max| number > max)
                {
                    return Err(CommandError::invalid_argument(
                        &param.name,
                        format!(
                            "must be between {} and {}",
                            param.minimum.map_or_else(|| "-inf".into(), |v| v.to_string()),
                            param.maximum.map_or_else(|| "inf".into(), |v| v.to_string()),
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Registry for available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    timeout: Duration,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a new command
    pub fn register<C: Command + 'static>(&mut self, command: C) {
        let schema = command.schema();
        self.commands.insert(schema.name, Arc::new(command));
    }

    /// Register a shared command
    pub fn register_shared(&mut self, command: Arc<dyn Command>) {
        let schema = command.schema();
        self.commands.insert(schema.name, command);
    }

    /// Get a command by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Validate and execute a command call
    pub async fn execute(&self, call: &CommandCall) -> Result<CommandReply> {
        let command = self
            .get(&call.name)
            .ok_or_else(|| CommandError::NotFound(call.name.clone()))?;

        command.validate(call)?;

        let request_id = call
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = tracing::info_span!(
            "command",
            name = %call.name,
            request_id = %request_id,
            user = call.invoked_by.as_deref().unwrap_or("-")
        );

        // Run on its own task so a panicking command fails only this call
        let started = Instant::now();
        let mut task = tokio::spawn({
            let call = call.clone();
            async move { command.execute(&call).await }.instrument(span.clone())
        });
        let outcome = tokio::time::timeout(self.timeout, &mut task).await;

        let _entered = span.enter();
        match outcome {
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "command aborted");
                Err(CommandError::Execution(format!(
                    "'{}' aborted: {join_error}",
                    call.name
                )))
            }
            Ok(Ok(Ok(reply))) => {
                tracing::info!(
                    success = reply.success,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "command finished"
                );
                Ok(reply.with_id(request_id))
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "command failed");
                Err(e)
            }
            Err(_) => {
                task.abort();
                tracing::warn!(timeout = ?self.timeout, "command timed out");
                Err(CommandError::Timeout {
                    name: call.name.clone(),
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    /// Execute and translate any dispatch error into a failed reply.
    ///
    /// This is the boundary the transport talks to; it never returns an error.
    pub async fn dispatch(&self, call: &CommandCall) -> CommandReply {
        match self.execute(call).await {
            Ok(reply) => reply,
            Err(e) => {
                let reply = CommandReply::failure(&call.name, e.user_message());
                match &call.id {
                    Some(id) => reply.with_id(id.clone()),
                    None => reply,
                }
            }
        }
    }

    /// All command schemas, ordered by name
    pub fn schemas(&self) -> Vec<CommandSchema> {
        let mut schemas: Vec<CommandSchema> = self.commands.values().map(|c| c.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Command names, ordered
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Human-readable command reference
    pub fn help_text(&self) -> String {
        let mut help = String::from("## Available Commands\n\n");

        for schema in self.schemas() {
            help.push_str(&format!("### /{}\n", schema.name));
            help.push_str(&format!("{}\n", schema.description));

            if !schema.parameters.is_empty() {
                help.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    help.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            help.push('\n');
        }

        help
    }
}

// ============================================================================
// Built-in Commands
// ============================================================================

/// Greets the invoking user
pub struct HelloCommand;

#[async_trait]
impl Command for HelloCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: "hello".into(),
            description: "The bot greets you back".into(),
            parameters: vec![ParameterSchema::new(
                "user",
                "string",
                "Name to greet (defaults to the invoking user)",
            )],
            category: Some("basic".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> Result<CommandReply> {
        let name = call
            .str_arg("user")
            .or(call.invoked_by.as_deref())
            .unwrap_or("there");

        Ok(CommandReply::success("hello", format!("Hello, {name}!")))
    }
}
