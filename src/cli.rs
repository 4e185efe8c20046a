use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s3mirror")]
#[command(about = "Mirror S3 objects announced on an SQS queue to local disk", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the queue and mirror objects until stopped
    Run(RunArgs),
    /// Decode a message body and show the objects it references
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Configuration file (defaults to $S3MIRROR_CONFIG or config/s3mirror.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// File holding the message body; reads stdin when omitted
    pub file: Option<PathBuf>,

    /// Also fetch the objects into the download root, as the worker would
    #[arg(long)]
    pub fetch: bool,

    /// Configuration file used with --fetch
    #[arg(long)]
    pub config: Option<PathBuf>,
}
