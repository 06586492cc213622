mod commands;
mod completions;
mod config;
mod media;
mod pipeline;
mod subtitles;
mod transcript;
mod ui;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::subtitles::style::OverflowStrategy;
use crate::transcript::TranscriptFormat;
use crate::ui::prelude::*;

/// Subtitle direction engine: timed speech in, placed and styled scene timeline out
#[derive(Parser, Debug)]
#[command(name = "subdirector", author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for messages
    #[arg(long, value_enum, global = true, default_value = "text")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Build a scene timeline from a request document
    Timeline {
        /// TimelineRequest JSON file
        request: PathBuf,
        /// Write the timeline here instead of stdout
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        /// JSON manifest mapping scene IDs to image or video URLs
        #[arg(long)]
        media: Option<PathBuf>,
        /// Credit budget for media attachment (unlimited when omitted)
        #[arg(long, requires = "media")]
        credits: Option<u64>,
        /// Replace media already present on scenes
        #[arg(long, requires = "media")]
        force: bool,
    },

    /// Split one piece of text into timed lines
    Split {
        #[arg(long)]
        text: String,
        #[arg(long, allow_negative_numbers = true)]
        start: f64,
        #[arg(long, allow_negative_numbers = true)]
        end: f64,
        #[arg(long)]
        max_chars: Option<usize>,
        #[arg(long)]
        max_lines: Option<usize>,
        /// REBALANCE, SHRINK or REBALANCE_THEN_SHRINK
        #[arg(long, value_parser = parse_overflow)]
        overflow: Option<OverflowStrategy>,
    },

    /// Convert a WhisperX or SRT transcript into a request skeleton
    Segments {
        transcript: PathBuf,
        /// Input format (guessed from the extension when omitted)
        #[arg(long, value_enum)]
        format: Option<TranscriptFormat>,
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },

    /// Export a timeline as an ASS subtitle script
    Ass {
        /// Timeline JSON file
        timeline: PathBuf,
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        /// Script resolution as WIDTHxHEIGHT
        #[arg(long, value_name = "WxH", value_parser = parse_play_res)]
        play_res: Option<(u32, u32)>,
        #[arg(long)]
        font: Option<String>,
    },

    /// List subtitle styles, direction presets and themes
    Presets,

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CompletionCommands {
    /// Print the completion script to stdout
    Generate {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Write the completion script where the shell looks for it
    Install {
        #[arg(value_enum)]
        shell: Shell,
        /// Target file instead of the default location
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Overwrite an existing script
        #[arg(long)]
        force: bool,
    },
}

fn parse_overflow(value: &str) -> Result<OverflowStrategy, String> {
    OverflowStrategy::parse(value).ok_or_else(|| {
        let known: Vec<&str> = OverflowStrategy::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown overflow strategy '{value}', expected one of {}", known.join(", "))
    })
}

fn parse_play_res(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width.trim().parse().map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("resolution must be non-zero".to_string());
    }
    Ok((width, height))
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = commands::dispatch(cli).await {
        emit(
            Level::Error,
            "subdirector.error",
            &format!("Error: {err:#}"),
            None,
        );
        std::process::exit(1);
    }
}
