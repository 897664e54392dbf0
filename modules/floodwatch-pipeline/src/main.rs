use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use floodwatch_common::{Config, ReportRequest};
use floodwatch_pipeline::{dispatch, infra, FloodPipeline};

#[derive(Parser)]
#[command(name = "floodwatch", about = "Flood report verification pipeline")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a report through the full pipeline and print the response
    Process {
        #[arg(long)]
        text: String,
        #[arg(long = "image-file")]
        image_files: Vec<String>,
        #[arg(long = "image-url")]
        image_urls: Vec<String>,
        /// Archive local images to the storage target
        #[arg(long)]
        save_images: bool,
        /// Storage target (defaults to REPORT_BUCKET)
        #[arg(long)]
        bucket: Option<String>,
        /// Skip persistence and alerting
        #[arg(long)]
        no_dispatch: bool,
    },
    /// Gatekeeper only
    Classify {
        #[arg(long)]
        text: String,
        #[arg(long = "image-file")]
        image_files: Vec<String>,
        #[arg(long = "image-url")]
        image_urls: Vec<String>,
    },
    /// Location resolver only
    Resolve {
        location: String,
    },
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("floodwatch=info".parse()?)
        .add_directive("floodwatch_pipeline=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn request(text: String, image_files: Vec<String>, image_urls: Vec<String>) -> ReportRequest {
    ReportRequest::builder()
        .text_input(text)
        .image_files(image_files)
        .image_urls(image_urls)
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let config = Config::from_env()?;
    config.log_redacted();

    let ctx = infra::build_context(&config).await?;
    let pipeline = FloodPipeline::new(ctx);

    match cli.command {
        Command::Process {
            text,
            image_files,
            image_urls,
            save_images,
            bucket,
            no_dispatch,
        } => {
            let mut req = request(text, image_files, image_urls);
            req.save_images = save_images;
            req.storage_target = bucket;

            let outcome = pipeline.process(&req).await?;
            if let (Some(report), false) = (outcome.report(), no_dispatch) {
                let summary = dispatch(pipeline.context(), &req, report).await;
                info!(
                    persisted_to = ?summary.persisted_to,
                    notified = summary.notified,
                    "Dispatch finished"
                );
            }
            println!("{}", serde_json::to_string_pretty(&outcome.into_response())?);
        }
        Command::Classify {
            text,
            image_files,
            image_urls,
        } => {
            let verdict = pipeline.classify(&request(text, image_files, image_urls)).await;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Command::Resolve { location } => {
            let classification = pipeline.resolve(&location).await;
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
    }

    Ok(())
}
