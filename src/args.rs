use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sitesift")]
#[command(about = "Extracts structured sections from web pages, rendering them in a browser when needed")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape one URL and print the result as JSON
    Scrape {
        /// Absolute http(s) URL of the page
        url: String,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
