//! Command-line argument definitions for the Flowsketch CLI.
//!
//! [`Args`] holds the global options (configuration file, log level) and one
//! [`Command`].

use clap::{Parser, Subcommand};

/// Command-line arguments for the Flowsketch diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract a diagram image and write the model, MDL text and summary
    Analyze {
        /// Path to a PNG or JPEG diagram image
        image: String,

        /// Directory for analysis.json, model.mdl and summary.txt
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: String,

        /// Skip the summary call
        #[arg(long)]
        no_summary: bool,
    },

    /// Render a diagram model JSON file into MDL text
    Render {
        /// Path to the diagram model JSON file
        model: String,

        /// Path to the output MDL file
        #[arg(short, long, default_value = "model.mdl")]
        output: String,
    },

    /// Summarize a diagram model JSON file, or any text file with --text
    Summarize {
        /// Path to the input file
        input: String,

        /// Treat the input as free text instead of a diagram model
        #[arg(long)]
        text: bool,

        /// Path to the output summary file
        #[arg(short, long, default_value = "summary.txt")]
        output: String,
    },

    /// Check that a file holds well-formed MDL text
    Check {
        /// Path to the MDL file
        input: String,
    },
}
