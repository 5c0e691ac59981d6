use clap::Parser;
use shush::cli::{Cli, Commands, ConfigAction};
use shush::config::Config;
use shush::logging;
use shush::Session;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get(ref opts) => {
            let session = open_session(&cli).await?;
            let (value, version) = session.get(&opts.key).await?;
            println!("version: {version}");
            println!("value: {value}");
        }
        Commands::Set(ref opts) => {
            let session = open_session(&cli).await?;
            session.set(&opts.key, &opts.value).await?;
        }
        Commands::Sync(opts) => {
            let config = Config::load(cli.config.as_deref())?;
            let profile = config.profile(&cli.profile)?;

            let prefixes = if opts.prefixes.is_empty() {
                profile.sync_prefixes().to_vec()
            } else {
                opts.prefixes
            };
            if prefixes.is_empty() {
                anyhow::bail!("no prefixes listed for sync config on profile {}", cli.profile);
            }

            let session = profile.build_session().await;
            session.sync(&prefixes).await?;
            info!("sync complete");
        }
        Commands::Env(ref opts) => {
            let session = open_session(&cli).await?;
            let value = session.get_env(&opts.var).await?;
            println!("{value}");
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                let config = Config::load(cli.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                let config = Config::load(cli.config.as_deref())?;
                let errors = config.validate();
                if errors.is_empty() {
                    info!("Configuration is valid");
                } else {
                    for error in &errors {
                        eprintln!("{error}");
                    }
                    anyhow::bail!("configuration has {} problem(s)", errors.len());
                }
            }
            ConfigAction::Init => {
                let path = cli.config.as_deref().unwrap_or("shush.json");
                Config::write_default(path)?;
                info!("Configuration file created at {path}");
            }
        },
    }

    Ok(())
}

async fn open_session(cli: &Cli) -> anyhow::Result<Session> {
    let config = Config::load(cli.config.as_deref())?;
    let profile = config.profile(&cli.profile)?;
    Ok(profile.build_session().await)
}
