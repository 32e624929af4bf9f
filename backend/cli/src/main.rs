use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{ArchiveOptions, utils::parse_status};
use feedback::{Endpoints, FeedbackClient, RoundStatus};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the feedback server
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List feedback points
    List {
        #[arg(long)]
        page: Option<String>,
    },

    /// Pin a new point
    Add {
        #[arg(long)]
        page: String,

        #[arg(long)]
        comment: String,

        /// Percent of the viewport width
        #[arg(long, default_value_t = 0.0)]
        x: f64,

        /// Pixels from the top of the document
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },

    Resolve {
        id: String,

        #[arg(long)]
        resolution: Option<String>,
    },

    Delete {
        id: String,
    },

    /// Snapshot the live points into a round file
    Archive {
        #[arg(long)]
        name: String,

        #[arg(long)]
        rounds_dir: PathBuf,

        #[arg(long)]
        page: Option<String>,

        #[arg(long, default_value = "completed", value_parser = parse_status)]
        status: RoundStatus,

        /// Delete the archived points afterwards
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let client = FeedbackClient::new(Endpoints::with_default_paths(&args.server));

    match args.command {
        Command::List { page } => cli::list(&client, page.as_deref()).await,
        Command::Add {
            page,
            comment,
            x,
            y,
        } => cli::add(&client, page, comment, x, y).await,
        Command::Resolve { id, resolution } => cli::resolve(&client, &id, resolution).await,
        Command::Delete { id } => cli::delete(&client, &id).await,
        Command::Archive {
            name,
            rounds_dir,
            page,
            status,
            clear,
        } => {
            let options = ArchiveOptions {
                name,
                rounds_dir,
                page,
                status,
                clear,
            };

            cli::archive(&client, options).await
        }
    }
}
