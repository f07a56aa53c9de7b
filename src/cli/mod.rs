//! CLI module for PMP Content Testing
//!
//! Provides subcommands:
//! - `serve`: HTTP server with in-memory stores

pub mod serve;

use clap::{Parser, Subcommand};

/// PMP Content Testing - exposure decisions for content experiments
#[derive(Parser)]
#[command(name = "pmp-content-testing")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),
}
