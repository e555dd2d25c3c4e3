use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use crate::record_type::RecordType;

/// Send DNS queries over a single UDP channel.
#[derive(Parser, Debug)]
#[command(about)]
pub struct Args {
    /// Config file, defaults to ~/.dnschan/conf.toml
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    /// Resolver to query
    #[arg(long, short)]
    pub server: Option<String>,
    #[arg(long, short)]
    pub port: Option<u16>,
    /// Per-query timeout, such as 5s or 1500ms
    #[arg(long, short)]
    pub timeout: Option<String>,
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
    pub name: String,
    /// Record types to ask for
    #[arg(default_value = "A")]
    pub types: Vec<String>,
}

impl Args {
    pub fn record_types(&self) -> Result<Vec<RecordType>> {
        self.types.iter().map(|t| t.parse()).collect()
    }
}
