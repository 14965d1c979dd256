//! Output formatting for CLI results
//!
//! Every command renders through [`OutputFormatter`] in one of three formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use ping_client::{Agent, Contact, Message, SendResult, SignedEnvelope};
use serde::Serialize;
use serde_json::Value;

use crate::ExitCode;

/// Width of the content column in message tables.
const SUMMARY_WIDTH: usize = 60;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// Identity details shown by `keygen` and `whoami`
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Only set right after generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub server_url: String,
}

/// Result of offline verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutput {
    pub valid: bool,
    pub from: String,
    pub message_type: String,
    pub signed_bytes: usize,
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Get the current output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    pub fn format_agent(&self, agent: &Agent, command: &str) -> String {
        match self.format {
            OutputFormat::Table => agent_table(agent),
            OutputFormat::Json => self.to_json_response(agent, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_agents(&self, agents: &[Agent], command: &str) -> String {
        match self.format {
            OutputFormat::Table => agents_table(agents),
            OutputFormat::Json => self.to_json_response(agents, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_contacts(&self, contacts: &[Contact]) -> String {
        match self.format {
            OutputFormat::Table => contacts_table(contacts),
            OutputFormat::Json => self.to_json_response(contacts, "contacts list"),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_messages(&self, messages: &[Message], command: &str) -> String {
        match self.format {
            OutputFormat::Table => messages_table(messages),
            OutputFormat::Json => self.to_json_response(messages, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_send_result(&self, result: &SendResult, command: &str) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec!["Message ID", &result.id]);
                table.add_row(vec!["Delivered", yes_no(result.delivered)]);
                table.add_row(vec![
                    "Delivery Method",
                    result.delivery_method.as_deref().unwrap_or("-"),
                ]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(result, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_identity(&self, identity: &IdentityOutput, command: &str) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec![
                    "Agent ID",
                    identity.agent_id.as_deref().unwrap_or("(not registered)"),
                ]);
                table.add_row(vec![
                    "Public Key",
                    identity.public_key.as_deref().unwrap_or("(no key loaded)"),
                ]);
                if let Some(fingerprint) = &identity.fingerprint {
                    table.add_row(vec!["Fingerprint", fingerprint]);
                }
                if let Some(private_key) = &identity.private_key {
                    table.add_row(vec!["Private Key", private_key]);
                }
                table.add_row(vec!["Server", &identity.server_url]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(identity, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Signed envelope: compact wire JSON in table mode so it can be piped
    /// straight into `ping verify`.
    pub fn format_envelope(&self, envelope: &SignedEnvelope) -> String {
        match self.format {
            OutputFormat::Table => serde_json::to_string(envelope)
                .unwrap_or_else(|e| format!("Serialization error: {e}")),
            OutputFormat::Json => self.to_json_response(envelope, "sign"),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_verify(&self, result: &VerifyOutput) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec!["Signature", if result.valid { "valid" } else { "INVALID" }]);
                table.add_row(vec!["From", &result.from]);
                table.add_row(vec!["Type", &result.message_type]);
                table.add_row(vec!["Signed Bytes", &result.signed_bytes.to_string()]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(result, "verify"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a generic success result
    pub fn format_success<T: Serialize>(&self, data: &T, command: &str) -> String {
        match self.format {
            OutputFormat::Table => String::new(),
            OutputFormat::Json => self.to_json_response(data, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, message: &str, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {message}"),
            OutputFormat::Json => {
                let response = JsonResponse::error(message);
                let mut output = serde_json::to_value(&response).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut output {
                    map.insert("exit_code".to_string(), i32::from(code).into());
                    map.insert("exit_code_name".to_string(), code.name().into());
                }
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Print output produced by one of the `format_*` methods.
    pub fn print(&self, rendered: &str) {
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }

    /// Format progress message (only shown in verbose mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    /// Format success message
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }

    /// Format warning message
    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("⚠ {message}");
        }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Format data with consistent JSON response wrapper
    fn to_json_response<T: Serialize + ?Sized>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            self.to_json(&JsonResponse::error(&format!("Serialization error: {e}")))
        })
    }
}

fn property_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    table
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn agent_table(agent: &Agent) -> String {
    let mut table = property_table();
    table.add_row(vec!["Agent ID", &agent.id]);
    table.add_row(vec!["Name", &agent.name]);
    table.add_row(vec!["Provider", &agent.provider]);
    table.add_row(vec!["Public Key", &agent.public_key]);
    table.add_row(vec!["Capabilities", &agent.capabilities.join(", ")]);
    table.add_row(vec!["Webhook", agent.webhook_url.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Public", yes_no(agent.is_public)]);
    table.add_row(vec!["Created At", &agent.created_at]);
    table.to_string()
}

fn agents_table(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return "No agents found.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Agent ID", "Name", "Provider", "Capabilities", "Public"]);
    for agent in agents {
        table.add_row(vec![
            agent.id.as_str(),
            &agent.name,
            &agent.provider,
            &agent.capabilities.join(", "),
            yes_no(agent.is_public),
        ]);
    }
    table.to_string()
}

fn contacts_table(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "No contacts found.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Contact ID", "Alias", "Notes", "Added At"]);
    for contact in contacts {
        table.add_row(vec![
            contact.contact_id.as_str(),
            contact.alias.as_deref().unwrap_or("-"),
            contact.notes.as_deref().unwrap_or("-"),
            &contact.added_at,
        ]);
    }
    table.to_string()
}

fn messages_table(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Type", "From", "To", "Content", "Sent", "Status"]);
    for message in messages {
        let sent = message
            .timestamp
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        let status = if message.acknowledged {
            "acked"
        } else if message.delivered {
            "delivered"
        } else {
            "pending"
        };
        table.add_row(vec![
            message.id.as_str(),
            &message.message_type,
            &message.from,
            &message.to,
            &summarize(message),
            &sent,
            status,
        ]);
    }
    table.to_string()
}

/// One-line content preview: the text of text messages, compact JSON otherwise.
pub fn summarize(message: &Message) -> String {
    let full = match message.text() {
        Some(text) => text.replace('\n', " "),
        None => serde_json::to_string(&message.payload).unwrap_or_default(),
    };
    truncate(&full, SUMMARY_WIDTH)
}

/// Shorten to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
