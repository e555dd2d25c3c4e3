use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, Level};
use crate::args::Args;
use crate::channel::{ChannelOptions, DEFAULT_MAX_DATAGRAM_SIZE, DEFAULT_TIMEOUT};
use crate::duration;
use crate::fs::get_home_dir;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 53;

#[derive(Default, Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Default, Deserialize, Debug)]
pub struct ChannelConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout: Option<String>,
    pub max_datagram_size: Option<usize>,
}

#[derive(Default, Deserialize, Debug)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl Config {
    pub fn apply_args(mut self, args: &Args) -> Self {
        self.channel.host = args.server.clone().or(self.channel.host);
        self.channel.port = args.port.or(self.channel.port);
        self.channel.timeout = args.timeout.clone().or(self.channel.timeout);

        self
    }

    /// Channel options without callbacks attached.
    pub fn channel_options(&self) -> Result<ChannelOptions> {
        let timeout = match &self.channel.timeout {
            Some(timeout) => duration::parse(timeout)
                .with_context(|| format!("invalid channel timeout `{}`", timeout))?,
            None => DEFAULT_TIMEOUT,
        };

        let options = ChannelOptions::new(
            self.channel.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.channel.port.unwrap_or(DEFAULT_PORT),
        )
        .with_timeout(timeout)
        .with_max_datagram_size(self.channel.max_datagram_size.unwrap_or(DEFAULT_MAX_DATAGRAM_SIZE));

        Ok(options)
    }

    /// `-v` flags win over the configured level.
    pub fn log_level(&self, verbose: u8) -> Result<Level> {
        let level = match verbose {
            0 => match &self.log.level {
                Some(level) => Level::from_str(level)
                    .with_context(|| format!("invalid log level `{}`", level))?,
                None => Level::WARN,
            },
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        Ok(level)
    }
}

/// Loads `path`, or the file in the home directory when no path is given.
///
/// A missing default file yields the default config.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return load(path);
    }

    if let Some(path) = default_path() {
        if path.exists() {
            return load(&path);
        }

        debug!("no config file at {}", path.display());
    }

    Ok(Config::default())
}

fn load(p: &Path) -> Result<Config> {
    let file = std::fs::read_to_string(p)
        .with_context(|| format!("couldn't read config file {}", p.display()))?;

    parse(&file).with_context(|| format!("couldn't parse config file {}", p.display()))
}

fn parse(src: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(src)?;

    Ok(cfg)
}

fn default_path() -> Option<PathBuf> {
    get_home_dir().map(|dir| dir.join("conf.toml"))
}
