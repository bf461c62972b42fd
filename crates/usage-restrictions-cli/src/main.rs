// crates/usage-restrictions-cli/src/main.rs
// ============================================================================
// Module: Usage Restrictions CLI Entry Point
// Description: Command dispatcher for offline restriction tooling.
// Purpose: Validate, intersect, and evaluate restrictions from JSON files.
// Dependencies: clap, serde, serde_json, thiserror, usage-restrictions-{config,core}
// ============================================================================

//! ## Overview
//! The `usage-restrictions` binary runs the restriction engine over JSON
//! inputs without a backing store. Inputs are untrusted: every file read is
//! size-bounded and restriction documents go through strict validation unless
//! the caller asks for the lenient read path.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use usage_restrictions_config::UsageRestrictionsConfig;
use usage_restrictions_core::AccessDecision;
use usage_restrictions_core::AccessRequest;
use usage_restrictions_core::AccountTopology;
use usage_restrictions_core::AppId;
use usage_restrictions_core::EnvId;
use usage_restrictions_core::PermissionSnapshot;
use usage_restrictions_core::RestrictionAuditSink;
use usage_restrictions_core::RestrictionError;
use usage_restrictions_core::RestrictionLimits;
use usage_restrictions_core::UsageRestrictionService;
use usage_restrictions_core::UsageRestrictionsDocument;
use usage_restrictions_core::UserGroup;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a restriction document input.
const MAX_DOCUMENT_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of an account topology input.
const MAX_TOPOLOGY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of an access check input.
const MAX_CHECK_INPUT_BYTES: usize = 16 * 1024 * 1024;
/// Exit code reported when an access check denies.
const ACCESS_DENIED_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "usage-restrictions", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a restriction document and print its normalized form.
    Validate(ValidateCommand),
    /// Print the restrictions two documents have in common.
    Intersect(IntersectCommand),
    /// Evaluate whether a principal may use an entity.
    CheckAccess(CheckAccessCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a usage restrictions configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Path to the restriction document JSON file.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Optional config file supplying structural limits.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Drop malformed pairs instead of rejecting the document.
    #[arg(long, action = ArgAction::SetTrue)]
    lenient: bool,
}

/// Arguments for `intersect`.
#[derive(Args, Debug)]
struct IntersectCommand {
    /// Path to the first restriction document.
    #[arg(long, value_name = "PATH")]
    left: PathBuf,
    /// Path to the second restriction document.
    #[arg(long, value_name = "PATH")]
    right: PathBuf,
    /// Path to the account topology JSON file.
    #[arg(long, value_name = "PATH")]
    topology: PathBuf,
    /// Optional config file supplying structural limits.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `check-access`.
#[derive(Args, Debug)]
struct CheckAccessCommand {
    /// Path to the access check input JSON file.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Optional config file supplying the audit sink.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to usage-restrictions.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Access check input file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CheckAccessInput {
    /// Account topology the check runs against.
    topology: AccountTopology,
    /// True when the principal is an account administrator.
    #[serde(default)]
    is_account_admin: bool,
    /// Groups the principal belongs to.
    #[serde(default)]
    user_groups: Vec<UserGroup>,
    /// Precomputed permission view of the principal.
    #[serde(default)]
    permissions: PermissionSnapshot,
    /// Restrictions attached to the entity.
    #[serde(default)]
    entity_restrictions: Option<UsageRestrictionsDocument>,
    /// True when the entity is scoped to the whole account.
    #[serde(default)]
    scoped_to_account: bool,
    /// Target application.
    #[serde(default)]
    app_id: Option<AppId>,
    /// Target environment.
    #[serde(default)]
    env_id: Option<EnvId>,
    /// True when the target is an application being created.
    #[serde(default)]
    for_new_app: bool,
}

/// Access check output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckAccessOutput {
    /// Account evaluated.
    account_id: String,
    /// Decision and reason label.
    decision: AccessDecision,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Validate(command) => command_validate(&command),
        Commands::Intersect(command) => command_intersect(&command),
        Commands::CheckAccess(command) => command_check_access(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Restriction Commands
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let limits = load_limits(command.config.as_deref())?;
    let document: UsageRestrictionsDocument =
        read_json(&command.input, "restrictions", MAX_DOCUMENT_BYTES)?;
    let normalized = validate_document(&document, &limits, command.lenient)?;
    write_json(&normalized)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `intersect` command.
fn command_intersect(command: &IntersectCommand) -> CliResult<ExitCode> {
    let limits = load_limits(command.config.as_deref())?;
    let left: UsageRestrictionsDocument =
        read_json(&command.left, "restrictions", MAX_DOCUMENT_BYTES)?;
    let right: UsageRestrictionsDocument =
        read_json(&command.right, "restrictions", MAX_DOCUMENT_BYTES)?;
    let topology: AccountTopology = read_json(&command.topology, "topology", MAX_TOPOLOGY_BYTES)?;
    let common = intersect_documents(&left, &right, topology, limits)?;
    write_json(&common)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `check-access` command.
fn command_check_access(command: &CheckAccessCommand) -> CliResult<ExitCode> {
    let audit = match command.config.as_deref() {
        Some(path) => Some(load_config(Some(path))?.build_audit_sink().map_err(|err| {
            CliError::new(format!("failed to open audit sink: {err}"))
        })?),
        None => None,
    };
    let input: CheckAccessInput = read_json(&command.input, "access check", MAX_CHECK_INPUT_BYTES)?;
    let output = check_access(input, audit);
    write_json(&output)?;
    if output.decision.allowed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(ACCESS_DENIED_EXIT_CODE))
    }
}

/// Converts a document through the strict or lenient path.
fn validate_document(
    document: &UsageRestrictionsDocument,
    limits: &RestrictionLimits,
    lenient: bool,
) -> CliResult<UsageRestrictionsDocument> {
    let restrictions = if lenient {
        document.to_restrictions_lenient()
    } else {
        document.to_restrictions(limits).map_err(|err| restriction_error(&err))?
    };
    Ok(UsageRestrictionsDocument::from(restrictions))
}

/// Intersects two strict documents over a topology.
fn intersect_documents(
    left: &UsageRestrictionsDocument,
    right: &UsageRestrictionsDocument,
    topology: AccountTopology,
    limits: RestrictionLimits,
) -> CliResult<UsageRestrictionsDocument> {
    let left = left.to_restrictions(&limits).map_err(|err| restriction_error(&err))?;
    let right = right.to_restrictions(&limits).map_err(|err| restriction_error(&err))?;
    let account_id = topology.account_id.clone();
    let service = UsageRestrictionService::new(account_id, topology).with_limits(limits);
    Ok(UsageRestrictionsDocument::from(service.common_restrictions(&left, &right)))
}

/// Evaluates an access check input against its read view.
fn check_access(
    input: CheckAccessInput,
    audit: Option<Arc<dyn RestrictionAuditSink>>,
) -> CheckAccessOutput {
    let entity = input.entity_restrictions.as_ref().map(UsageRestrictionsDocument::to_restrictions_lenient);
    let account_id = input.topology.account_id.clone();
    let mut service = UsageRestrictionService::new(account_id.clone(), input.topology);
    if let Some(audit) = audit {
        service = service.with_audit_sink(audit);
    }
    let actor =
        service.principal_context(input.is_account_admin, &input.user_groups, &input.permissions);
    let request = AccessRequest {
        is_account_admin: actor.is_account_admin,
        app_id: input.app_id.as_ref(),
        env_id: input.env_id.as_ref(),
        for_new_app: input.for_new_app,
        entity_restrictions: entity.as_ref(),
        scoped_to_account: input.scoped_to_account,
        ..AccessRequest::new(&account_id)
    }
    .with_principal(&actor.read);
    CheckAccessOutput {
        account_id: account_id.to_string(),
        decision: service.evaluate_access(&request),
    }
}

/// Formats a restriction error with its stable kind label.
fn restriction_error(error: &RestrictionError) -> CliError {
    CliError::new(format!("restrictions rejected ({}): {error}", error.kind()))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration using the config crate's resolution rules.
fn load_config(path: Option<&Path>) -> CliResult<UsageRestrictionsConfig> {
    UsageRestrictionsConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Returns configured limits, or the defaults when no config is given.
fn load_limits(path: Option<&Path>) -> CliResult<RestrictionLimits> {
    match path {
        Some(path) => Ok(load_config(Some(path))?.limits()),
        None => Ok(RestrictionLimits::default()),
    }
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and parses a bounded JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} input {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} input {} is too large ({size} bytes, limit {limit})",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(format!("failed to parse {kind} input {}: {err}", path.display()))
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
