use std::path::PathBuf;

use clap::Parser;

use crate::infrastructure::ProviderKind;

#[derive(Debug, Parser)]
#[command(name = "clubvote", version, about = "Propose and vote on club decisions from the terminal")]
pub struct Cli {
    /// Settings file (defaults to clubvote.toml in the config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wallet provider to talk to
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// JSON-RPC endpoint for the rpc provider
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Start with an empty proposal list
    #[arg(long)]
    pub no_seed: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut crate::infrastructure::Settings) {
        if let Some(kind) = self.provider {
            settings.provider.kind = kind;
        }
        if let Some(url) = &self.rpc_url {
            settings.provider.rpc_url = url.clone();
        }
        if self.no_seed {
            settings.ui.seed_demo_proposals = false;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
    }
}
