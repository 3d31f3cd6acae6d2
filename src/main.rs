use clap::Parser;
use log::error;

use clipscribe::cli::{Cli, Commands};
use clipscribe::client::run_client;
use clipscribe::config::{ClientConfig, ServiceConfig};
use clipscribe::download::{download_model, model_listing};
use clipscribe::server::run_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().into_command() {
        Commands::Serve(args) => {
            run_server(ServiceConfig::from(args)).await?;
        }
        Commands::TranscribeFile {
            media_file,
            language,
            server_url,
        } => {
            run_client(ClientConfig::new(server_url, media_file, language)).await?;
        }
        Commands::Download { model, models_dir } => {
            let path = tokio::task::spawn_blocking(move || download_model(&model, &models_dir))
                .await?
                .inspect_err(|e| error!("Model download failed: {e:#}"))?;
            println!("Done! Model saved in '{}'", path.display());
            println!("You can now use it like this:");
            println!("  $ clipscribe serve --model-path {}", path.display());
        }
        Commands::ListModels => {
            print!("{}", model_listing());
        }
    }

    Ok(())
}
