use eyre::{bail, eyre, Context, Result};
use ingress_core::config::parse_batch_size;
use ingress_core::enumeration::FileFilter;
use ingress_core::{
    parse_batch_sizes, Credential, Endpoint, HealthConfig, LoadTestConfig, NamingScheme,
    ReportOptions, SftpConnector,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{ConnectionArgs, HealthArgs, LoadTestArgs};
use crate::prompt::Prompter;

pub(crate) const PASSWORD_ENV: &str = "INGRESS_PASSWORD";

const DEFAULT_CONFIG_FILE: &str = "ingress.toml";
const DEFAULT_REMOTE_DIR: &str = "/ingress";
const DEFAULT_INTERVAL_SECS: u64 = 10;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;
const DEFAULT_BATCH_SIZES: &str = "1";
const DEFAULT_REPORT: &str = "loadtest.tap";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    endpoint: RawEndpoint,
    #[serde(default)]
    load_test: RawLoadTest,
    #[serde(default)]
    health: RawHealth,
}

#[derive(Debug, Default, Deserialize)]
struct RawEndpoint {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    connect_timeout_secs: Option<u64>,
    handshake_timeout_secs: Option<u64>,
    io_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLoadTest {
    local_dir: Option<PathBuf>,
    remote_dir: Option<String>,
    interval_secs: Option<u64>,
    batch_sizes: Option<Vec<u32>>,
    naming: Option<NamingScheme>,
    #[serde(default)]
    exclude: Vec<String>,
    report: Option<PathBuf>,
    diagnostics: Option<bool>,
    plan: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHealth {
    interval_secs: Option<u64>,
    count: Option<u64>,
    /// Program followed by its arguments, e.g. `["say", "Connection failed"]`.
    alert_command: Option<Vec<String>>,
    bell: Option<bool>,
}

/// Read the config file. An explicit path must exist; otherwise
/// `./ingress.toml` is used when present and an empty config when not.
pub(crate) fn read_config(explicit: Option<&Path>) -> Result<RawConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                return Ok(RawConfig::default());
            }
            candidate
        }
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("failed to parse config file {}", path.display()))
}

pub(crate) fn parse_config(contents: &str) -> Result<RawConfig> {
    Ok(toml::from_str::<RawConfig>(contents)?)
}

#[derive(Debug)]
pub(crate) struct ConnectionSettings {
    pub(crate) endpoint: Endpoint,
    pub(crate) credential: Credential,
    pub(crate) connector: SftpConnector,
}

#[derive(Debug)]
pub(crate) struct LoadTestRuntime {
    pub(crate) config: LoadTestConfig,
    pub(crate) connector: SftpConnector,
    pub(crate) report_path: PathBuf,
    pub(crate) report_options: ReportOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AlertSettings {
    pub(crate) bell: bool,
    /// Program followed by its arguments.
    pub(crate) command: Option<Vec<String>>,
}

#[derive(Debug)]
pub(crate) struct HealthRuntime {
    pub(crate) config: HealthConfig,
    pub(crate) connector: SftpConnector,
    pub(crate) count: Option<u64>,
    pub(crate) alert: AlertSettings,
}

fn resolve_connection(
    args: &ConnectionArgs,
    raw: &RawEndpoint,
    env_password: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<ConnectionSettings> {
    let host_raw = match args.host.clone().or_else(|| raw.host.clone()) {
        Some(host) => host,
        None => prompter.ask("Hostname", None)?,
    };
    let mut endpoint = Endpoint::parse(&host_raw)
        .with_context(|| format!("parsing host '{}'", host_raw))?;

    if let Some(port) = args.port.or(raw.port) {
        endpoint.port = port;
    } else if !has_port(&host_raw) {
        let answer = prompter.ask("Port", Some(&Endpoint::DEFAULT_PORT.to_string()))?;
        endpoint.port = match answer.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => bail!("invalid port '{}'", answer),
        };
    }

    let username = match args.username.clone().or_else(|| raw.username.clone()) {
        Some(username) => username,
        None => prompter.ask("Username", None)?,
    };
    let password = match args
        .password
        .clone()
        .or(env_password)
        .or_else(|| raw.password.clone())
    {
        Some(password) => password,
        None => prompter.ask_secret("Password")?,
    };

    let connect_timeout = args
        .connect_timeout
        .or(raw.connect_timeout_secs)
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    let handshake_timeout = args
        .handshake_timeout
        .or(raw.handshake_timeout_secs)
        .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS);
    let io_timeout = args
        .io_timeout
        .or(raw.io_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let connector = SftpConnector::new()
        .connect_timeout(Duration::from_secs(connect_timeout.max(1)))
        .handshake_timeout(Duration::from_secs(handshake_timeout.max(1)))
        .io_timeout(io_timeout);

    Ok(ConnectionSettings {
        endpoint,
        credential: Credential::new(username, password),
        connector,
    })
}

fn has_port(host: &str) -> bool {
    if host.starts_with('[') {
        host.contains("]:")
    } else {
        host.matches(':').count() == 1
    }
}

pub(crate) fn load_test_runtime(
    args: &LoadTestArgs,
    raw: &RawConfig,
    env_password: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<LoadTestRuntime> {
    let settings = resolve_connection(&args.connection, &raw.endpoint, env_password, prompter)?;
    let section = &raw.load_test;

    let local_dir = match args.local_dir.clone().or_else(|| section.local_dir.clone()) {
        Some(dir) => dir,
        None => PathBuf::from(prompter.ask("Local directory", None)?),
    };
    let remote_dir = match args.remote_dir.clone().or_else(|| section.remote_dir.clone()) {
        Some(dir) => dir,
        None => prompter.ask("Remote directory", Some(DEFAULT_REMOTE_DIR))?,
    };

    let interval_secs = match args.interval.or(section.interval_secs) {
        Some(secs) => secs,
        None => {
            let answer = prompter.ask(
                "Interval between batch sizes in seconds",
                Some(&DEFAULT_INTERVAL_SECS.to_string()),
            )?;
            answer
                .parse::<u64>()
                .map_err(|_| eyre!("invalid interval '{}'", answer))?
        }
    };

    let batch_sizes = if let Some(list) = &args.batch_sizes {
        parse_batch_sizes(list)?
    } else if let Some(list) = &section.batch_sizes {
        list.iter()
            .map(|size| parse_batch_size(&size.to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        let answer = prompter.ask("Batch sizes (comma separated)", Some(DEFAULT_BATCH_SIZES))?;
        parse_batch_sizes(&answer)?
    };

    let naming = match &args.naming {
        Some(raw_scheme) => raw_scheme.parse::<NamingScheme>().map_err(|err| eyre!(err))?,
        None => section.naming.unwrap_or_default(),
    };

    let exclude = if args.exclude.is_empty() {
        section.exclude.clone()
    } else {
        args.exclude.clone()
    };
    let filter = FileFilter::new(exclude)?;

    let config = LoadTestConfig {
        endpoint: settings.endpoint,
        credential: settings.credential,
        local_dir,
        remote_dir,
        interval: Duration::from_secs(interval_secs),
        batch_sizes,
        naming,
        filter,
    };
    config.validate()?;

    let report_path = args
        .report
        .clone()
        .or_else(|| section.report.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT));
    let report_options = ReportOptions {
        diagnostics: args.diagnostics || section.diagnostics.unwrap_or(false),
        plan: args.plan || section.plan.unwrap_or(false),
    };

    Ok(LoadTestRuntime {
        config,
        connector: settings.connector,
        report_path,
        report_options,
    })
}

pub(crate) fn health_runtime(
    args: &HealthArgs,
    raw: &RawConfig,
    env_password: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<HealthRuntime> {
    let settings = resolve_connection(&args.connection, &raw.endpoint, env_password, prompter)?;
    let section = &raw.health;

    let interval_secs = args
        .interval
        .or(section.interval_secs)
        .unwrap_or(DEFAULT_HEALTH_INTERVAL_SECS);

    let command = match &args.alert_command {
        Some(program) => {
            let mut command = vec![program.clone()];
            command.extend(args.alert_args.iter().cloned());
            Some(command)
        }
        None => section.alert_command.clone(),
    };
    if let Some(command) = &command {
        if command.first().map_or(true, |program| program.trim().is_empty()) {
            bail!("alert command must name a program");
        }
    }

    Ok(HealthRuntime {
        config: HealthConfig {
            endpoint: settings.endpoint,
            credential: settings.credential,
            interval: Duration::from_secs(interval_secs),
        },
        connector: settings.connector,
        count: args.count.or(section.count),
        alert: AlertSettings {
            bell: !args.no_bell && section.bell.unwrap_or(true),
            command,
        },
    })
}
