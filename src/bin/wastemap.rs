//! wastemap: classify a waste photo and list nearby bins.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use wastemap::workflow::NoticeKind;
use wastemap::{
    AlertSink, BinQuery, Config, Coordinates, ImageUpload, ResultsView, Secrets, WasteLabel,
};

/// Waste classification and nearby bin lookup
#[derive(Parser)]
#[command(name = "wastemap")]
#[command(version = wastemap::PKG_VERSION)]
#[command(about = "Classify a waste photo and find nearby disposal bins")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "WASTEMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an image, then look up bins near your location
    Classify {
        /// Image file to upload
        image: PathBuf,
        /// Latitude (overrides [location] in the config)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude (overrides [location] in the config)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up bins for a label without classifying an image
    Bins {
        /// Waste label, e.g. "plastic"
        label: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration
    Config,
}

/// Alerts go straight to the terminal.
struct StderrAlerts;

impl AlertSink for StderrAlerts {
    fn alert(&self, message: &str) {
        eprintln!("alert: {message}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }

        Command::Classify {
            image,
            lat,
            lon,
            json,
        } => {
            let secrets = Secrets::load()?;
            let mut builder = config.builder(&secrets).alerts(Arc::new(StderrAlerts));
            if let (Some(lat), Some(lon)) = (lat, lon) {
                builder = builder.location(Coordinates::new(lat, lon));
            }
            let mut workflow = builder.build()?;

            info!(build = %wastemap::BuildInfo::current(), image = %image.display(), "classifying");
            let upload = workflow.select_image(&image).await?;
            let view = workflow.run(upload).await;
            print_view(&view, json)?;

            if view
                .notice
                .as_ref()
                .is_some_and(|n| n.kind == NoticeKind::ClassificationFailed)
            {
                std::process::exit(1);
            }
        }

        Command::Bins {
            label,
            lat,
            lon,
            json,
        } => {
            let secrets = Secrets::load()?;
            let services = config.builder(&secrets).build_services()?;

            let label = WasteLabel::new(label)?;
            let position = Coordinates::new(lat, lon);
            position.validate()?;
            let query = BinQuery::for_label(&label, position, &config.search_settings());
            let bins = services.places.search(&query).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&bins)?);
            } else if bins.is_empty() {
                println!("no {} found within {} m", query.category, query.radius_m);
            } else {
                println!("{} near {position}:", query.category);
                for bin in &bins {
                    println!("  - {} @ {}", bin.kind, bin.location);
                }
            }
        }
    }

    Ok(())
}

fn print_view(view: &ResultsView, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{view}");
    }
    Ok(())
}
