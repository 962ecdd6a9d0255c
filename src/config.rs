/// Configuration: command-line flags, environment fallbacks, and an optional
/// `~/.cheetah.toml` defaults file. Flags win over the file, the file wins
/// over built-in defaults.
use crate::driver::ConnectOptions;
use crate::error::{CheetahError, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "cheetah", version, about = "Command-line SQL client")]
pub struct Cli {
    /// SQL file to execute; reads from stdin when omitted
    pub file: Option<PathBuf>,

    /// Server or hostname
    #[arg(short = 'S', long, env = "CHEETAH_SERVER")]
    pub server: Option<String>,

    /// Server port
    #[arg(short = 'p', long, env = "CHEETAH_PORT")]
    pub port: Option<u16>,

    /// Login id
    #[arg(short = 'U', long = "username", env = "CHEETAH_USER")]
    pub user: Option<String>,

    /// Password
    #[arg(short = 'P', long, env = "CHEETAH_PASSWORD")]
    pub password: Option<String>,

    /// Database name (a file path or `:memory:` for the bundled backend)
    #[arg(short = 'd', long, env = "CHEETAH_DATABASE")]
    pub database: Option<String>,

    /// Login timeout in seconds
    #[arg(short = 'l', long = "login-timeout")]
    pub login_timeout: Option<u64>,

    /// Per-query timeout in seconds
    #[arg(short = 't', long = "query-timeout")]
    pub query_timeout: Option<u64>,

    /// Run an interactive session
    #[arg(short = 'I', long)]
    pub interactive: bool,

    /// Encrypt the connection
    #[arg(long, env = "CHEETAH_ENCRYPT")]
    pub encrypt: bool,

    /// Print a timing line after each batch
    #[arg(long)]
    pub timing: bool,

    /// Echo each batch before it runs
    #[arg(long)]
    pub verbose: bool,
}

/// Shape of `~/.cheetah.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileDefaults {
    pub connection: Option<ConnectionDefaults>,
    pub display: Option<DisplayDefaults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectionDefaults {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub encrypt: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisplayDefaults {
    pub timing: Option<bool>,
    pub verbose: Option<bool>,
}

/// Reads the defaults file from the home directory. A missing file yields
/// empty defaults; a file that fails to parse is an error.
pub fn load_defaults() -> Result<FileDefaults> {
    match dirs::home_dir() {
        Some(home) => load_defaults_from(&home.join(".cheetah.toml")),
        None => Ok(FileDefaults::default()),
    }
}

pub fn load_defaults_from(path: &Path) -> Result<FileDefaults> {
    if !path.exists() {
        return Ok(FileDefaults::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| CheetahError::Config(format!("{}: {}", path.display(), e)))
}

/// How the input reaches the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    File(PathBuf),
    Stdin,
    Interactive,
}

/// Fully resolved runtime configuration.
#[derive(Debug)]
pub struct Config {
    pub connect: ConnectOptions,
    pub mode: Mode,
    pub timing: bool,
    pub verbose: bool,
}

impl Config {
    /// Merges flags over file defaults over built-ins, and picks the mode.
    pub fn resolve(cli: Cli, defaults: FileDefaults) -> Result<Config> {
        let conn = defaults.connection.unwrap_or_default();
        let display = defaults.display.unwrap_or_default();
        let base = ConnectOptions::default();

        let mode = match (cli.interactive, cli.file) {
            (true, Some(_)) => {
                return Err(CheetahError::Config(
                    "an input file and --interactive are mutually exclusive".to_string(),
                ))
            }
            (true, None) => Mode::Interactive,
            (false, Some(path)) => Mode::File(path),
            (false, None) => Mode::Stdin,
        };

        Ok(Config {
            connect: ConnectOptions {
                server: cli.server.or(conn.server).unwrap_or(base.server),
                port: cli.port.or(conn.port).unwrap_or(base.port),
                user: cli.user.or(conn.user).unwrap_or(base.user),
                password: cli.password.or(conn.password).unwrap_or(base.password),
                database: cli.database.or(conn.database).unwrap_or(base.database),
                connection_timeout: cli.login_timeout.unwrap_or(base.connection_timeout),
                request_timeout: cli.query_timeout.unwrap_or(base.request_timeout),
                encrypt: cli.encrypt || conn.encrypt.unwrap_or(false),
            },
            mode,
            timing: cli.timing || display.timing.unwrap_or(false),
            verbose: cli.verbose || display.verbose.unwrap_or(false),
        })
    }

    /// Primary prompt for interactive sessions.
    pub fn prompt(&self) -> String {
        format!("{}/{}= ", self.connect.user, self.connect.database)
    }
}
