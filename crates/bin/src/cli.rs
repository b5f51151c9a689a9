//! CLI argument definitions for the Userbase binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and tests)
    Inmemory,
}

/// Userbase user account server
#[derive(Parser, Debug)]
#[command(name = "userbase")]
#[command(about = "Userbase: user accounts over HTTP")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Check health of a running server
    Health(HealthArgs),
    /// Show backend and user count
    Info(InfoArgs),
    /// Manage user records directly in storage
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Work with issued tokens
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
}

/// Storage selection shared by every command that opens the backend
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "USERBASE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores userbase.db
    /// For InMemory: stores userbase.json
    #[arg(short = 'D', long, env = "USERBASE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "USERBASE_POSTGRES_URL")]
    pub postgres_url: Option<String>,

    /// Deadline for a single storage operation, in milliseconds
    #[arg(long, default_value_t = 10_000, env = "USERBASE_OP_TIMEOUT_MS")]
    pub op_timeout_ms: u64,
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "USERBASE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "USERBASE_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Secret used to sign tokens. A random one is generated when unset.
    #[arg(long, env = "USERBASE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in seconds
    #[arg(long, default_value_t = 86_400, env = "USERBASE_TOKEN_TTL_SECS")]
    pub token_ttl_secs: u64,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "USERBASE_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List stored users (hashes are never printed)
    List(UsersListArgs),
    /// Create a user without going through the server
    Create(UsersCreateArgs),
}

#[derive(clap::Args, Debug)]
pub struct UsersListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(clap::Args, Debug)]
pub struct UsersCreateArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Username of the new account
    pub username: String,

    /// Password of the new account
    #[arg(long, env = "USERBASE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Grant the admin role
    #[arg(long)]
    pub admin: bool,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Verify a token and print its claims
    Inspect(TokenInspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct TokenInspectArgs {
    /// The token to inspect
    pub token: String,

    /// Secret the token was signed with
    #[arg(long, env = "USERBASE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,
}
