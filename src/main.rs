use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use creativa::compose::{self, CreativeParams};
use creativa::server::{self, ServerConfig};
use creativa::Result;

#[derive(Parser)]
#[command(name = "creativa", version, about = "Marketing content generation service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server.
    Serve {
        /// Listen address.
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
    /// Compose one creative offline from local images.
    Compose {
        /// Background image file.
        #[arg(long)]
        background: PathBuf,
        /// Packshot image file.
        #[arg(long)]
        packshot: PathBuf,
        /// Output PNG path.
        #[arg(long, default_value = "creative.png")]
        out: PathBuf,
        #[arg(long, default_value = "")]
        headline: String,
        #[arg(long, default_value = "")]
        subheadline: String,
        #[arg(long, default_value = "")]
        cta: String,
        #[arg(long, default_value_t = compose::CANVAS_IG_FEED.0)]
        width: u32,
        #[arg(long, default_value_t = compose::CANVAS_IG_FEED.1)]
        height: u32,
        /// Disable the ray burst layer.
        #[arg(long)]
        no_rays: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { listen } => {
            server::serve(ServerConfig {
                listen_addr: listen,
            })
            .await
        }
        Command::Compose {
            background,
            packshot,
            out,
            headline,
            subheadline,
            cta,
            width,
            height,
            no_rays,
        } => {
            let background = image::open(&background)?;
            let packshot = std::fs::read(&packshot)?;
            let mut params = CreativeParams {
                width,
                height,
                headline,
                subheadline,
                cta,
                ..Default::default()
            };
            params.rays.enabled = !no_rays;

            let creative = compose::compose(&background, &packshot, &params)?;
            creative.save(&out)?;
            tracing::info!(path = %out.display(), "creative written");
            Ok(())
        }
    }
}
