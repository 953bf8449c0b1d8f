use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ingress")]
#[command(about = "Load-test and health-check an SFTP ingress endpoint")]
#[command(after_help = "Values missing from flags and the config file are prompted for.")]
pub struct Cli {
    /// Configuration file (TOML). Defaults to ./ingress.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    /// Never prompt; fail when a required value is missing
    #[arg(long, global = true)]
    pub no_input: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the local file set once per batch size and write a TAP report
    LoadTest(LoadTestArgs),
    /// Repeatedly connect and disconnect, alerting when a connection fails
    Health(HealthArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// SFTP host, optionally with a port (host:port, [v6]:port)
    #[arg(long)]
    pub host: Option<String>,
    /// SFTP port (overrides a port given in --host)
    #[arg(long)]
    pub port: Option<u16>,
    /// Username for password authentication
    #[arg(long, short = 'u')]
    pub username: Option<String>,
    /// Password (prefer INGRESS_PASSWORD or the prompt)
    #[arg(long)]
    pub password: Option<String>,
    /// Seconds to wait for the TCP connection
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
    /// Seconds allowed for the SSH handshake and login
    #[arg(long, value_name = "SECS")]
    pub handshake_timeout: Option<u64>,
    /// Seconds before a blocked SSH operation gives up once logged in (0 = never)
    #[arg(long, value_name = "SECS")]
    pub io_timeout: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct LoadTestArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Local directory whose files are uploaded
    #[arg(long, value_name = "PATH")]
    pub local_dir: Option<PathBuf>,
    /// Remote ingress directory
    #[arg(long, value_name = "PATH")]
    pub remote_dir: Option<String>,
    /// Seconds to wait between batch sizes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
    /// Batch multipliers, run in order (e.g. 1,2,5)
    #[arg(long, short = 'b', value_name = "LIST")]
    pub batch_sizes: Option<String>,
    /// Remote naming scheme: timestamp, sequence or timestamp-sequence
    #[arg(long, value_name = "SCHEME")]
    pub naming: Option<String>,
    /// Skip local files matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Path of the TAP report (truncated at start)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub report: Option<PathBuf>,
    /// Add a YAML diagnostic block after failing results
    #[arg(long)]
    pub diagnostics: bool,
    /// Append a `1..N` plan line when the run finishes
    #[arg(long)]
    pub plan: bool,
    /// Show a progress bar per batch size
    #[arg(long, short = 'p')]
    pub progress: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
    /// Exit non-zero when any attempt failed
    #[arg(long)]
    pub fail_on_error: bool,
}

#[derive(Args, Clone, Debug, Default)]
pub struct HealthArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Seconds between connection attempts
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
    /// Stop after this many checks (default: run until interrupted)
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,
    /// Program to run when a check fails (e.g. say)
    #[arg(long, value_name = "PROGRAM")]
    pub alert_command: Option<String>,
    /// Argument for --alert-command (repeatable)
    #[arg(long = "alert-arg", value_name = "ARG", requires = "alert_command")]
    pub alert_args: Vec<String>,
    /// Do not ring the terminal bell on failure
    #[arg(long)]
    pub no_bell: bool,
}
