// src/cli/mod.rs — CLI definition (clap derive)

pub mod analyze;
pub mod chat;
pub mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "healthmate", about = "AI assistant for X-ray image analysis", version)]
pub struct Cli {
    /// Gemini model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Suppress progress output (only emit responses)
    #[arg(long)]
    pub quiet: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session: upload an X-ray, analyze it, chat about the findings
    Chat {
        /// Image to upload at startup
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// One-shot analysis of a single image
    Analyze {
        /// X-ray image to analyze (png or jpeg, under 5 MiB)
        image: PathBuf,
        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also synthesize the report to this mp3 file
        #[arg(long)]
        speak: Option<PathBuf>,
    },
}
