//! Portal CLI - Command-line front end for the academic portal
//!
//! Drives the session and authorization core from a terminal: log in and
//! out, inspect the current session, and simulate navigation against the
//! portal's protected routes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use portal_client::{
    authz, ApiClient, ApiClientConfig, AuthService, NewAccount, SessionStorage, SessionStore,
    UserUpdate,
};
use portal_core::{init_logging, PortalConfig, Role};
use std::path::PathBuf;
use tracing::debug;

/// Protected navigation surface: each route with the roles allowed to view
/// it. An empty set means any authenticated user.
const PROTECTED_ROUTES: &[(&str, &[Role])] = &[
    ("/dashboard", &[]),
    ("/student/dashboard", &[Role::Student]),
    ("/student/subjects", &[Role::Student]),
    ("/student/profile", &[Role::Student]),
    ("/registrar/dashboard", &[Role::Registrar]),
    ("/admissions/dashboard", &[Role::Admissions]),
    ("/head/dashboard", &[Role::Head]),
    ("/professor/dashboard", &[Role::Professor]),
    ("/admin/dashboard", &[Role::Admin]),
];

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Role-based academic portal client")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Log out and clear the persisted session
    Logout,

    /// Show the current session
    Whoami {
        /// Fetch the profile from the backend instead of the local session
        #[arg(long)]
        remote: bool,
    },

    /// Register a new account
    Register {
        username: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Portal role
        #[arg(long, default_value = "student")]
        role: Role,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Update profile fields on the current account
    Update {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Simulate navigating to a route and print the gate's decision
    Open {
        /// Route path, e.g. /registrar/dashboard
        path: String,
    },

    /// Print the landing route for every role
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PortalConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PortalConfig::default(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("logging setup failed: {}", e))?;
    debug!(base_url = %config.api.base_url, "Portal CLI starting");

    let store = if config.storage.persist_session {
        let storage = SessionStorage::new(&config.storage.data_dir)?;
        SessionStore::with_storage(storage)
    } else {
        SessionStore::in_memory()
    };

    let client = ApiClient::new(ApiClientConfig::from(&config.api), store.clone())?;
    let auth = AuthService::new(client);

    match cli.command {
        Commands::Login { username, password } => {
            let profile = auth.login(&username, &password).await?;
            println!("Logged in as {}", profile.display_string());
            println!("Landing page: {}", authz::default_route_for(profile.role));
        }

        Commands::Logout => {
            auth.logout().await?;
            println!("Logged out");
        }

        Commands::Whoami { remote } => {
            if remote {
                let profile = auth.current_user().await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                let session = store.current().await;
                match session.user {
                    Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                    None => println!("Not logged in"),
                }
            }
        }

        Commands::Register {
            username,
            email,
            password,
            role,
            first_name,
            last_name,
        } => {
            let created = auth
                .register(&NewAccount {
                    username,
                    email,
                    password: password.clone(),
                    password_confirm: password,
                    first_name,
                    last_name,
                    role,
                })
                .await?;
            println!("Registered {}", created.display_string());
        }

        Commands::Update {
            email,
            first_name,
            last_name,
        } => {
            let updated = auth
                .update_profile(&UserUpdate {
                    username: None,
                    email,
                    first_name,
                    last_name,
                })
                .await?;
            println!("Updated profile for {}", updated.display_string());
        }

        Commands::Open { path } => {
            let required = PROTECTED_ROUTES
                .iter()
                .find(|(route, _)| *route == path)
                .map(|(_, roles)| *roles)
                .with_context(|| format!("unknown route: {}", path))?;

            let session = store.current().await;
            match authz::authorize(required, &session) {
                authz::AccessDecision::Allow => println!("{}: allowed", path),
                decision => {
                    let target = decision.redirect_target().unwrap_or(authz::LOGIN_ROUTE);
                    println!("{}: redirect to {}", path, target);
                }
            }
        }

        Commands::Routes => {
            for role in Role::ALL {
                println!("{:<10} {}", role.to_string(), authz::default_route_for(role));
            }
        }
    }

    Ok(())
}
