use std::{net::SocketAddr, path::PathBuf};

use anyhow::Result;
use cfgform_cli::{commands::CommandHandler, ctx::AppContext};
use clap::{Parser, Subcommand};

/// Edit structured configuration files through flat, path-addressed fields
#[derive(Parser, Debug)]
#[command(name = "cfgform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Schema registry file (.toml or .json) replacing the built-in one
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every editable field
    Fields {
        /// Print the projection and bindings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a JSON array of field bindings and save
    Apply {
        /// File holding the edits
        edits: PathBuf,
    },

    /// Verify the config survives projection and reassembly
    Check,

    /// Print the JSON schema of the field binding wire format
    Schema,

    /// Serve the HTTP editing API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,

        /// Directory of static files served next to the API
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config, cli.schema);

    match cli.command {
        Command::Fields { json } => CommandHandler::fields(&ctx, json).await,
        Command::Apply { edits } => CommandHandler::apply(&ctx, &edits).await,
        Command::Check => CommandHandler::check(&ctx).await,
        Command::Schema => CommandHandler::schema(),
        Command::Serve { addr, static_dir } => CommandHandler::serve(&ctx, addr, static_dir).await,
    }
}
