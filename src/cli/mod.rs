//! CLI entry point for sessiongate.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::flow::FlowMode;

/// Inspect route decisions and exercise credential flows.
#[derive(Parser, Debug)]
#[command(name = "sessiongate", version, about = "Session gate CLI")]
pub struct Cli {
    /// Config file (defaults to ~/.sessiongate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one navigation request
    Route(RouteArgs),
    /// Print the route policy for every status
    Table,
    /// Run a credential flow against a seeded in-memory provider
    Flow(FlowArgs),
}

/// Status to resolve a route for.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Arguments for `sessiongate route`.
#[derive(Parser, Debug)]
pub struct RouteArgs {
    /// Requested path, e.g. /home
    pub path: String,

    #[arg(long, value_enum, default_value_t = StatusArg::Unauthenticated)]
    pub status: StatusArg,

    /// Treat the authenticated identity as having an unverified email
    #[arg(long)]
    pub unverified: bool,
}

/// Flow to run.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowCommand {
    SignIn,
    Register,
    Reset,
    Federated,
}

impl FlowCommand {
    pub fn mode(self) -> FlowMode {
        match self {
            Self::SignIn | Self::Federated => FlowMode::SignIn,
            Self::Register => FlowMode::Register,
            Self::Reset => FlowMode::ResetPassword,
        }
    }
}

/// Account seeded into the in-memory provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedAccount {
    pub email: String,
    pub password: String,
    pub verified: bool,
}

impl std::str::FromStr for SeedAccount {
    type Err = String;

    /// `email:password[:verified|unverified]`, verified by default.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.splitn(3, ':');
        let email = parts.next().unwrap_or_default().trim();
        let password = parts.next().unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(format!(
                "expected email:password[:verified], got {raw:?}"
            ));
        }
        let verified = match parts.next().map(str::trim) {
            None | Some("verified") | Some("true") => true,
            Some("unverified") | Some("false") => false,
            Some(other) => return Err(format!("unknown verification flag {other:?}")),
        };
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
            verified,
        })
    }
}

/// Arguments for `sessiongate flow`.
#[derive(Parser, Debug)]
pub struct FlowArgs {
    #[arg(value_enum)]
    pub operation: FlowCommand,

    /// Email entered in the form (the popup identity for `federated`)
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Seed account, repeatable: email:password[:verified|unverified]
    #[arg(long = "account")]
    pub accounts: Vec<SeedAccount>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
