use clap::Parser;
use gist_bridge::utils::{logger, validation::Validate};
use gist_bridge::{create_backend, BridgeConfig, CliConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting gist-bridge CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let bridge_config = match BridgeConfig::from_file(&config.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", config.config, e);
            eprintln!("❌ Failed to load {}: {}", config.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = bridge_config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let token = match config
        .token
        .or_else(|| std::env::var("GIST_BRIDGE_TOKEN").ok())
    {
        Some(token) => token,
        None => {
            eprintln!("❌ No access token: pass --token or set GIST_BRIDGE_TOKEN");
            std::process::exit(1);
        }
    };

    let backend = create_backend(&bridge_config)?;
    tracing::info!("Using {} backend", backend.provider());

    let profile = backend.get_user_profile(&token).await?;
    tracing::info!("Authenticated as {}", profile.login);

    let gists = backend.get_all_gists(&token, &profile).await?;
    tracing::info!("Fetched {} gists", gists.len());

    match config.gist_id {
        Some(gist_id) => {
            let brief = gists
                .iter()
                .find(|gist| gist.id == gist_id)
                .ok_or_else(|| format!("no gist with id {}", gist_id))?;
            let gist = backend.get_single_gist(&token, &gist_id, brief).await?;
            println!("{}", serde_json::to_string_pretty(&gist)?);
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&gists)?);
        }
    }

    Ok(())
}
