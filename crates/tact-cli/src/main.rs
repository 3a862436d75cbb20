mod catalog;
mod event;
mod quiz;

use clap::{Parser, Subcommand};
use tact_core::{KitchenShape, Material};
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogCommands;
use crate::event::EventCommands;

#[derive(Debug, Parser)]
#[command(name = "tact-cli")]
#[command(about = "Tact kitchens funnel command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk the cost-calculator wizard and submit the resulting lead
    Quiz {
        /// Kitchen shape: straight, L or U
        #[arg(long)]
        shape: KitchenShape,
        /// Wall length in meters; repeat once per wall
        #[arg(long = "wall", value_parser = quiz::parse_wall)]
        walls: Vec<f64>,
        /// Catalog id of a chosen design; repeat for up to three
        #[arg(long = "design")]
        designs: Vec<String>,
        /// Cabinet material: hdf, plywood or acrylic
        #[arg(long)]
        material: Material,
        /// Local mobile number (07XXXXXXXXX)
        #[arg(long)]
        phone: String,
        /// Governorate name; defaults to the capital
        #[arg(long)]
        governorate: Option<String>,
        /// Page the lead is attributed to
        #[arg(long, default_value = quiz::DEFAULT_PAGE_URL)]
        page_url: String,
        /// Skip the calculating interstitial
        #[arg(long)]
        fast: bool,
        /// Print the lead and conversion payload without storing or sending
        #[arg(long)]
        dry_run: bool,
    },
    /// Submit a general contact-form message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        governorate: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// Page the message is attributed to
        #[arg(long, default_value = quiz::DEFAULT_PAGE_URL)]
        page_url: String,
    },
    /// Server-side conversion events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// Reference data shown by the wizard
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Print the loaded configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tact_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Quiz {
            shape,
            walls,
            designs,
            material,
            phone,
            governorate,
            page_url,
            fast,
            dry_run,
        }) => {
            let input = quiz::QuizInput {
                shape,
                walls,
                designs,
                material,
                phone,
                governorate,
            };
            quiz::run_quiz(&config, input, &page_url, fast, dry_run).await?;
        }
        Some(Commands::Contact {
            name,
            phone,
            governorate,
            area,
            message,
            page_url,
        }) => {
            let form = tact_core::ContactForm {
                name,
                phone,
                governorate,
                area,
                message,
            };
            quiz::run_contact(&config, form, &page_url).await?;
        }
        Some(Commands::Event { command }) => event::run(&config, command).await?,
        Some(Commands::Catalog { command }) => catalog::run(&config, command).await?,
        Some(Commands::Config) => println!("{config:#?}"),
        None => println!("tact-cli ready; run with --help for commands"),
    }

    Ok(())
}
