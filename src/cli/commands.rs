//! CLI command handlers for route, table and flow.

use std::sync::Arc;

use tracing::debug;

use super::{FlowArgs, FlowCommand, RouteArgs, StatusArg};
use crate::auth::{Identity, MemoryIdentityProvider};
use crate::config::GateConfig;
use crate::error::GateError;
use crate::flow::{CredentialFlowController, FlowOutcome};
use crate::route::{Resolution, RouteGate};
use crate::session::{SessionController, SessionStatus};

/// Handle `sessiongate route <path>`.
pub fn handle_route(config: &GateConfig, args: &RouteArgs) -> Result<(), GateError> {
    let gate = RouteGate::from_config(config);
    let status = status_for(args.status, !args.unverified);
    println!("{}", gate.resolve(&status, &args.path));
    Ok(())
}

/// Handle `sessiongate table`.
pub fn handle_table(config: &GateConfig) -> Result<(), GateError> {
    let gate = RouteGate::from_config(config);
    println!("{:<26} {:<12} resolution", "status", "path");
    for row in policy_table(&gate) {
        println!("{:<26} {:<12} {}", row.status, row.path, row.resolution);
    }
    Ok(())
}

/// One row of the printed policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRow {
    pub status: String,
    pub path: String,
    pub resolution: Resolution,
}

/// Resolution of every configured path, plus an unmatched one, for each
/// status.
pub fn policy_table(gate: &RouteGate) -> Vec<PolicyRow> {
    let statuses = [
        ("unknown", status_for(StatusArg::Unknown, true)),
        ("unauthenticated", status_for(StatusArg::Unauthenticated, true)),
        ("authenticated", status_for(StatusArg::Authenticated, true)),
        (
            "authenticated (unverified)",
            status_for(StatusArg::Authenticated, false),
        ),
    ];
    let routes = gate.routes();
    let paths = [
        routes.auth_path.as_str(),
        routes.home_path.as_str(),
        routes.profile_path.as_str(),
        "/elsewhere",
    ];

    statuses
        .iter()
        .flat_map(|(label, status)| {
            paths.iter().map(move |path| PolicyRow {
                status: label.to_string(),
                path: path.to_string(),
                resolution: gate.resolve(status, path),
            })
        })
        .collect()
}

/// Handle `sessiongate flow <operation>`.
pub async fn handle_flow(config: &GateConfig, args: &FlowArgs) -> Result<(), GateError> {
    let provider = Arc::new(seeded_provider(args));
    let session = SessionController::new(provider.clone());
    let handle = session.start(|status| debug!(status = status.label(), "cli session update"))?;

    let gate = RouteGate::from_config(config);
    let mut flow = CredentialFlowController::from_config(provider, config)
        .with_session(session.watch_status());

    flow.switch_mode(args.operation.mode());
    let result = match args.operation {
        FlowCommand::Federated => flow.sign_in_federated().await,
        FlowCommand::SignIn | FlowCommand::Register | FlowCommand::Reset => {
            let email = args.email.clone().ok_or_else(|| {
                GateError::InvalidArgument(format!(
                    "--email is required for {:?}",
                    args.operation
                ))
            })?;
            flow.set_email(email);
            flow.set_password(args.password.clone().unwrap_or_default());
            flow.submit().await
        }
    };

    match &result {
        Ok(outcome) => {
            println!("{}", outcome.notice());
            if let FlowOutcome::SignedIn(identity) = outcome {
                println!("identity: {} <{}>", identity.display_label(), identity.contact_label());
            }
        }
        Err(err) => println!("{}", err.user_message()),
    }
    let status = session.status();
    println!("session: {}", status.label());
    println!("landing: {}", gate.landing(&status));

    session.stop(handle);
    result.map(|_| ()).map_err(GateError::from)
}

fn seeded_provider(args: &FlowArgs) -> MemoryIdentityProvider {
    let provider = MemoryIdentityProvider::new();
    for account in &args.accounts {
        provider.add_account(&account.email, &account.password, account.verified);
    }
    if args.operation == FlowCommand::Federated {
        let identity = args.email.as_ref().map(|email| {
            Identity::builder()
                .uid(format!("federated:{email}"))
                .email(email.clone())
                .email_verified(true)
                .build()
        });
        provider.set_federated_identity(identity);
    }
    provider
}

fn status_for(status: StatusArg, verified: bool) -> SessionStatus {
    match status {
        StatusArg::Unknown => SessionStatus::Unknown,
        StatusArg::Unauthenticated => SessionStatus::Unauthenticated,
        StatusArg::Authenticated => SessionStatus::Authenticated(
            Identity::builder()
                .uid("cli-user")
                .email("user@example.com")
                .email_verified(verified)
                .build(),
        ),
    }
}
