use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shush",
    version,
    about = "Versioned secret manager with policy-driven local caching"
)]
pub struct Cli {
    /// Config profile to use.
    #[arg(short, long, global = true, default_value = "default", env = "SHUSH_PROFILE")]
    pub profile: String,

    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a secret and print its value and version.
    Get(GetOpts),
    /// Write a secret; the storage provider assigns the next version.
    Set(SetOpts),
    /// Hydrate the cache for every key under the sync prefixes.
    Sync(SyncOpts),
    /// Resolve a shush:// reference held in an environment variable.
    Env(EnvOpts),
    /// Inspect or manage the configuration file.
    Config(ConfigOpts),
}

#[derive(clap::Args)]
pub struct GetOpts {
    pub key: String,
}

#[derive(clap::Args)]
pub struct SetOpts {
    pub key: String,
    pub value: String,
}

#[derive(clap::Args)]
pub struct SyncOpts {
    /// Prefixes to hydrate; defaults to the profile's configured prefixes.
    pub prefixes: Vec<String>,
}

#[derive(clap::Args)]
pub struct EnvOpts {
    /// Name of the environment variable holding the reference.
    pub var: String,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}
