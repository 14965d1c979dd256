//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ping_client::client::DEFAULT_HISTORY_LIMIT;
use ping_client::{PingClient, RegisterOptions, SearchOptions, SignedEnvelope, SignerError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{CliOverrides, Config};
use crate::output::{IdentityOutput, OutputFormat, OutputFormatter, VerifyOutput};
use crate::ExitCode;

/// PING CLI - agent-to-agent messenger client
#[derive(Parser, Debug)]
#[command(name = "ping")]
#[command(version, about = "PING CLI - agent-to-agent messenger client")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet [default: from config]
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (request-level tracing)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// PING server URL
    #[arg(long, env = "PING_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Registered agent id
    #[arg(long, env = "PING_AGENT_ID", global = true)]
    pub agent_id: Option<String>,

    /// Hex-encoded Ed25519 private key
    #[arg(long, env = "PING_PRIVATE_KEY", global = true, hide_env_values = true)]
    pub private_key: Option<String>,
}

impl Cli {
    /// Config values supplied on the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            server_url: self.server_url.clone(),
            agent_id: self.agent_id.clone(),
            output_format: self.output.map(|format| format.to_string()),
            verbose: if self.verbose { Some(true) } else { None },
            debug: if self.debug { Some(true) } else { None },
        }
    }

    /// Execute the CLI command with a resolved configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let format = config.output.format.parse().unwrap_or_default();
        let ctx = CommandContext {
            formatter: OutputFormatter::new(format, config.output.verbose),
            config,
            config_path: self.config.or_else(Config::default_path),
            private_key: self.private_key,
        };

        match self.command {
            Commands::Keygen => keygen(&ctx),
            Commands::Whoami => whoami(&ctx),
            Commands::Register(args) => args.execute(&ctx).await,
            Commands::Agent { id } => {
                let agent = ctx.client()?.get_agent(&id).await?;
                ctx.formatter.print(&ctx.formatter.format_agent(&agent, "agent"));
                Ok(ExitCode::Success)
            }
            Commands::Unregister => unregister(&ctx).await,
            Commands::Directory => {
                let agents = ctx.client()?.directory().await?;
                ctx.formatter.print(&ctx.formatter.format_agents(&agents, "directory"));
                Ok(ExitCode::Success)
            }
            Commands::Search(args) => args.execute(&ctx).await,
            Commands::Contacts(args) => args.execute(&ctx).await,
            Commands::Send(args) => args.execute(&ctx).await,
            Commands::Text { to, text } => {
                let result = ctx.client()?.text(&to, &text).await?;
                ctx.formatter.print(&ctx.formatter.format_send_result(&result, "text"));
                Ok(ExitCode::Success)
            }
            Commands::Ping { to } => {
                let result = ctx.client()?.ping(&to).await?;
                ctx.formatter.print(&ctx.formatter.format_send_result(&result, "ping"));
                Ok(ExitCode::Success)
            }
            Commands::Inbox { all } => {
                let messages = ctx.client()?.inbox(all).await?;
                ctx.formatter.print(&ctx.formatter.format_messages(&messages, "inbox"));
                Ok(ExitCode::Success)
            }
            Commands::History { other, limit } => {
                let messages = ctx.client()?.history(&other, limit).await?;
                ctx.formatter.print(&ctx.formatter.format_messages(&messages, "history"));
                Ok(ExitCode::Success)
            }
            Commands::Ack { message_id } => {
                ctx.client()?.ack(&message_id).await?;
                ctx.formatter.success(&format!("Acknowledged {message_id}"));
                ctx.formatter.print(&ctx.formatter.format_success(
                    &json!({ "message_id": message_id, "acknowledged": true }),
                    "ack",
                ));
                Ok(ExitCode::Success)
            }
            Commands::Sign(args) => args.execute(&ctx),
            Commands::Verify(args) => args.execute(&ctx),
            Commands::Config(args) => args.execute(&ctx),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new Ed25519 identity (offline)
    Keygen,
    /// Show the configured agent id and key
    Whoami,
    /// Register a new agent
    Register(RegisterArgs),
    /// Look up an agent by id
    Agent {
        /// Agent id
        id: String,
    },
    /// Delete the configured agent
    Unregister,
    /// List public agents
    Directory,
    /// Search the directory
    Search(SearchArgs),
    /// Manage contacts
    Contacts(ContactsArgs),
    /// Send a signed message of any type
    Send(SendArgs),
    /// Send a text message
    Text {
        /// Recipient agent id
        to: String,
        /// Message text
        text: String,
    },
    /// Send a ping
    Ping {
        /// Recipient agent id
        to: String,
    },
    /// Show received messages
    Inbox {
        /// Include acknowledged messages
        #[arg(long)]
        all: bool,
    },
    /// Show the conversation with another agent
    History {
        /// Other agent id
        other: String,
        /// Maximum number of messages
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
    /// Acknowledge a message
    Ack {
        /// Message id
        message_id: String,
    },
    /// Sign a message without sending it (offline)
    Sign(SignArgs),
    /// Verify a signed envelope (offline)
    Verify(VerifyArgs),
    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Resolved state shared by all commands
pub struct CommandContext {
    pub config: Config,
    pub formatter: OutputFormatter,
    config_path: Option<PathBuf>,
    private_key: Option<String>,
}

impl CommandContext {
    /// API client carrying the configured agent id and key.
    fn client(&self) -> anyhow::Result<PingClient> {
        let mut client = PingClient::with_config(&self.config.client_config())?;
        if let Some(agent_id) = &self.config.agent.id {
            client = client.with_agent_id(agent_id.clone());
        }
        if let Some(private_key) = &self.private_key {
            client = client
                .with_private_key(private_key)
                .context("loading private key")?;
        }
        debug!(
            server = client.base_url(),
            agent_id = client.agent_id().unwrap_or("-"),
            has_key = client.public_key().is_some(),
            "client ready"
        );
        Ok(client)
    }

    fn config_path(&self) -> anyhow::Result<&Path> {
        self.config_path
            .as_deref()
            .context("no config directory on this platform; pass --config")
    }
}

fn keygen(ctx: &CommandContext) -> anyhow::Result<ExitCode> {
    let mut client = ctx.client()?;
    let identity = client.generate_keys();

    let output = IdentityOutput {
        agent_id: None,
        public_key: Some(identity.public_key.clone()),
        fingerprint: client.signer().fingerprint(),
        private_key: Some(identity.private_key.clone()),
        server_url: client.base_url().to_string(),
    };
    ctx.formatter.print(&ctx.formatter.format_identity(&output, "keygen"));
    ctx.formatter
        .warning("The private key is shown once. Store it securely, e.g. in PING_PRIVATE_KEY.");
    Ok(ExitCode::Success)
}

fn whoami(ctx: &CommandContext) -> anyhow::Result<ExitCode> {
    let client = ctx.client()?;
    let output = IdentityOutput {
        agent_id: client.agent_id().map(str::to_string),
        public_key: client.public_key(),
        fingerprint: client.signer().fingerprint(),
        private_key: None,
        server_url: client.base_url().to_string(),
    };
    ctx.formatter.print(&ctx.formatter.format_identity(&output, "whoami"));
    Ok(ExitCode::Success)
}

async fn unregister(ctx: &CommandContext) -> anyhow::Result<ExitCode> {
    let mut client = ctx.client()?;
    let agent_id = client.agent_id().unwrap_or_default().to_string();
    ctx.formatter.progress(&format!("Deleting agent {agent_id}..."));
    client.delete_agent().await?;

    ctx.formatter.success(&format!("Deleted agent {agent_id}"));
    ctx.formatter.print(&ctx.formatter.format_success(
        &json!({ "agent_id": agent_id, "deleted": true }),
        "unregister",
    ));
    Ok(ExitCode::Success)
}

/// Parse an optional `--payload` argument; absent means `{}`.
fn parse_payload(payload: Option<&str>) -> anyhow::Result<Value> {
    match payload {
        Some(raw) => serde_json::from_str(raw).context("--payload is not valid JSON"),
        None => Ok(json!({})),
    }
}

/// Arguments for the register command
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Display name
    pub name: String,

    /// Provider name [default: from config]
    #[arg(long)]
    pub provider: Option<String>,

    /// Capability tag (repeatable)
    #[arg(long = "capability", short = 'c')]
    pub capabilities: Vec<String>,

    /// Webhook URL for push delivery
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// List the agent in the public directory
    #[arg(long)]
    pub public: bool,

    /// Store the new agent id in the config file
    #[arg(long)]
    pub save: bool,
}

#[derive(Serialize)]
struct RegisterOutput<'a> {
    agent: &'a ping_client::Agent,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<&'a str>,
}

impl RegisterArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        let mut client = ctx.client()?;

        let generated = if client.public_key().is_none() {
            formatter.progress("No private key given, generating a new identity...");
            Some(client.generate_keys())
        } else {
            None
        };

        let options = RegisterOptions {
            provider: self
                .provider
                .unwrap_or_else(|| ctx.config.agent.provider.clone()),
            capabilities: self.capabilities,
            webhook_url: self.webhook_url,
            is_public: self.public,
        };

        formatter.progress(&format!("Registering '{}'...", self.name));
        let agent = client.register(&self.name, options).await?;

        if self.save {
            let path = ctx.config_path()?;
            let mut stored = if path.exists() {
                Config::load(path)?
            } else {
                Config::default()
            };
            stored.agent.id = Some(agent.id.clone());
            stored.save(path)?;
            formatter.progress(&format!("Saved agent id to {}", path.display()));
        }

        let private_key = generated.as_ref().map(|g| g.private_key.as_str());
        match formatter.format() {
            OutputFormat::Table => {
                formatter.print(&formatter.format_agent(&agent, "register"));
                formatter.success(&format!("Registered agent {}", agent.id));
                if let Some(private_key) = private_key {
                    formatter.warning("A new key was generated. It is not stored anywhere:");
                    println!("PING_PRIVATE_KEY={private_key}");
                }
                if !self.save {
                    println!("PING_AGENT_ID={}", agent.id);
                }
            }
            OutputFormat::Json => {
                let output = RegisterOutput {
                    agent: &agent,
                    private_key,
                };
                formatter.print(&formatter.format_success(&output, "register"));
            }
            OutputFormat::Quiet => {
                if let Some(private_key) = private_key {
                    eprintln!("PING_PRIVATE_KEY={private_key}");
                }
            }
        }
        Ok(ExitCode::Success)
    }
}

/// Arguments for the search command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Required capability
    #[arg(long)]
    pub capability: Option<String>,

    /// Provider name
    #[arg(long)]
    pub provider: Option<String>,
}

impl SearchArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let options = SearchOptions {
            query: self.query,
            capability: self.capability,
            provider: self.provider,
        };
        let agents = ctx.client()?.search(&options).await?;
        ctx.formatter.print(&ctx.formatter.format_agents(&agents, "search"));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the contacts command
#[derive(Parser, Debug)]
pub struct ContactsArgs {
    #[command(subcommand)]
    pub action: ContactsAction,
}

/// Contacts subcommands
#[derive(Subcommand, Debug)]
pub enum ContactsAction {
    /// List contacts
    List,
    /// Add a contact
    Add {
        /// Contact agent id
        contact_id: String,
        /// Local alias
        #[arg(long)]
        alias: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a contact
    Remove {
        /// Contact agent id
        contact_id: String,
    },
}

impl ContactsArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        match self.action {
            ContactsAction::List => {
                let contacts = client.contacts().await?;
                ctx.formatter.print(&ctx.formatter.format_contacts(&contacts));
            }
            ContactsAction::Add {
                contact_id,
                alias,
                notes,
            } => {
                client
                    .add_contact(&contact_id, alias.as_deref(), notes.as_deref())
                    .await?;
                ctx.formatter.success(&format!("Added contact {contact_id}"));
                ctx.formatter.print(&ctx.formatter.format_success(
                    &json!({ "contact_id": contact_id, "added": true }),
                    "contacts add",
                ));
            }
            ContactsAction::Remove { contact_id } => {
                client.remove_contact(&contact_id).await?;
                ctx.formatter.success(&format!("Removed contact {contact_id}"));
                ctx.formatter.print(&ctx.formatter.format_success(
                    &json!({ "contact_id": contact_id, "removed": true }),
                    "contacts remove",
                ));
            }
        }
        Ok(ExitCode::Success)
    }
}

/// Arguments for the send command
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Recipient agent id
    pub to: String,

    /// Message type, e.g. text, request, proposal
    pub message_type: String,

    /// JSON payload [default: {}]
    #[arg(long)]
    pub payload: Option<String>,

    /// Id of the message being answered
    #[arg(long)]
    pub reply_to: Option<String>,
}

impl SendArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let payload = parse_payload(self.payload.as_deref())?;
        let client = ctx.client()?;
        ctx.formatter
            .progress(&format!("Sending {} to {}...", self.message_type, self.to));
        let result = client
            .send(&self.to, &self.message_type, &payload, self.reply_to.as_deref())
            .await?;
        ctx.formatter.print(&ctx.formatter.format_send_result(&result, "send"));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the sign command
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Recipient agent id
    pub to: String,

    /// Message type
    pub message_type: String,

    /// JSON payload [default: {}]
    #[arg(long)]
    pub payload: Option<String>,

    /// Id of the message being answered
    #[arg(long)]
    pub reply_to: Option<String>,

    /// Timestamp in milliseconds since the Unix epoch [default: now]
    #[arg(long)]
    pub timestamp: Option<i64>,
}

impl SignArgs {
    pub fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let payload = parse_payload(self.payload.as_deref())?;
        let client = ctx.client()?;
        let envelope = client.sign_message(
            &self.to,
            &self.message_type,
            &payload,
            self.reply_to.as_deref(),
            self.timestamp,
        )?;
        ctx.formatter.print(&ctx.formatter.format_envelope(&envelope));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Signer's hex public key
    pub public_key: String,

    /// Signed envelope JSON, or "-" to read it from stdin
    pub envelope: String,
}

impl VerifyArgs {
    pub fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let raw = if self.envelope == "-" {
            std::io::read_to_string(std::io::stdin()).context("reading envelope from stdin")?
        } else {
            self.envelope
        };
        let envelope: SignedEnvelope =
            serde_json::from_str(raw.trim()).context("envelope is not valid JSON")?;

        let signed_bytes = envelope.content_bytes()?.len();
        let (valid, code) = match envelope.verify(&self.public_key) {
            Ok(()) => (true, ExitCode::Success),
            Err(SignerError::BadSignature) => (false, ExitCode::GeneralError),
            Err(e) => return Err(e.into()),
        };

        let output = VerifyOutput {
            valid,
            from: envelope.envelope.from,
            message_type: envelope.envelope.message_type,
            signed_bytes,
        };
        ctx.formatter.print(&ctx.formatter.format_verify(&output));
        Ok(code)
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}

impl ConfigArgs {
    pub fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        match self.action {
            ConfigAction::Init { force } => {
                let path = ctx.config_path()?;
                let written = Config::write_default(path, force)
                    .with_context(|| format!("writing {}", path.display()))?;
                if !written {
                    formatter.warning(&format!(
                        "{} already exists; use --force to overwrite",
                        path.display()
                    ));
                    return Ok(ExitCode::InvalidInput);
                }
                formatter.success(&format!("Wrote {}", path.display()));
                formatter.print(&formatter.format_success(
                    &json!({ "path": path.display().to_string() }),
                    "config init",
                ));
            }
            ConfigAction::Show => match formatter.format() {
                OutputFormat::Table => println!("{}", toml::to_string_pretty(&ctx.config)?),
                _ => formatter.print(&formatter.format_success(&ctx.config, "config show")),
            },
            ConfigAction::Path => {
                let path = ctx.config_path()?;
                match formatter.format() {
                    OutputFormat::Table => println!("{}", path.display()),
                    _ => formatter.print(&formatter.format_success(
                        &json!({ "path": path.display().to_string() }),
                        "config path",
                    )),
                }
            }
        }
        Ok(ExitCode::Success)
    }
}
