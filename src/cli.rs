//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gesture Lab - collect pose-landmark gesture datasets and train a classifier
#[derive(Parser, Debug)]
#[command(name = "gesture-lab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.gesture_lab/config/settings.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record labeled sessions, one gesture and frame count at a time
    Collect {
        /// Pose log to read frames from (JSON lines)
        #[arg(short, long)]
        source: PathBuf,

        /// Override the dataset output directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Label frames by key press; the whole run is saved as one file
    CollectKeys {
        /// Pose log to read frames from (JSON lines)
        #[arg(short, long)]
        source: PathBuf,

        /// Override the dataset output directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Train and evaluate the classifier on every collected dataset file
    Train {
        /// Override the dataset directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Override where the model and label encoder are written
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
