use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonotag", about = "Musical descriptor extraction for audio files")]
pub struct Cli {
    /// Config file (defaults to sonotag.toml or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one audio source and print its feature record as JSON
    Analyze {
        /// Local path or http(s) URL
        source: String,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Analyze many sources, skipping failures, and emit a JSON table
    Batch {
        /// Local paths or http(s) URLs
        sources: Vec<String>,

        /// Write the table to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Run the HTTP analysis service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(long, default_value_t = 8530)]
        port: u16,
    },
}
