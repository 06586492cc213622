//! Command handlers behind the CLI.

use anyhow::{Context, Result, bail};
use colored::*;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::completions;
use crate::config::{self, DirectorConfig};
use crate::media::{
    CreditBalance, CreditGate, ManifestMediaProvider, MediaOptions, Unmetered, attach_media,
    summarize,
};
use crate::pipeline::{TimelineRequest, build_timeline};
use crate::subtitles::ass::{AssOptions, generate_ass};
use crate::subtitles::presets::{direction_profiles, style_presets, themes};
use crate::subtitles::splitter::split;
use crate::subtitles::style::OverflowStrategy;
use crate::subtitles::timeline::TimelineResponse;
use crate::transcript::{TranscriptFormat, parse_transcript};
use crate::ui::catppuccin::swatch;
use crate::ui::prelude::*;
use crate::ui::{self, OutputFormat};
use crate::{Cli, Commands, CompletionCommands, ConfigCommands};

pub(crate) async fn dispatch(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::Timeline {
            request,
            out,
            media,
            credits,
            force,
        } => {
            let config = DirectorConfig::load(config_path.as_deref())?;
            let options = MediaOptions {
                concurrency: config.media_concurrency,
                force,
                ..MediaOptions::default()
            };
            run_timeline(&request, out.as_deref(), media.as_deref(), credits, &options, &config)
                .await
        }
        Commands::Split {
            text,
            start,
            end,
            max_chars,
            max_lines,
            overflow,
        } => {
            let config = DirectorConfig::load(config_path.as_deref())?;
            run_split(&text, start, end, max_chars, max_lines, overflow, &config)
        }
        Commands::Segments {
            transcript,
            format,
            out,
        } => run_segments(&transcript, format, out.as_deref()),
        Commands::Ass {
            timeline,
            out,
            play_res,
            font,
        } => {
            let mut options = AssOptions::default();
            if let Some(play_res) = play_res {
                options.play_res = play_res;
            }
            if let Some(font) = font {
                options.font_name = font;
            }
            run_ass(&timeline, out.as_deref(), &options)
        }
        Commands::Presets => {
            print_presets();
            Ok(())
        }
        Commands::Config { command } => run_config(command, config_path),
        Commands::Completions { command } => run_completions(command),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading {what} from {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {what} at {}", path.display()))
}

/// Write a document to `out`, or to stdout when no path is given.
fn write_document(contents: &str, out: Option<&Path>, what: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
            fs::write(path, contents)
                .with_context(|| format!("writing {what} to {}", path.display()))?;
            emit(
                Level::Success,
                "document.write.done",
                &format!("Wrote {what} to {}", path.display()),
                Some(json!({ "path": path.display().to_string() })),
            );
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn to_pretty_json<T: Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("serializing {what}"))
}

async fn run_timeline(
    request_path: &Path,
    out: Option<&Path>,
    media: Option<&Path>,
    credits: Option<u64>,
    options: &MediaOptions,
    config: &DirectorConfig,
) -> Result<()> {
    let request: TimelineRequest = read_json(request_path, "timeline request")?;
    if request.segments.is_empty() {
        emit(
            Level::Warn,
            "timeline.request.empty",
            "Request has no segments, the timeline will be empty",
            None,
        );
    }

    let mut timeline = build_timeline(request, config);

    if let Some(manifest_path) = media {
        let provider = Arc::new(ManifestMediaProvider::load(manifest_path)?);
        let balance = credits.map(|amount| Arc::new(CreditBalance::new(amount)));
        let gate: Arc<dyn CreditGate> = match &balance {
            Some(balance) => balance.clone(),
            None => Arc::new(Unmetered),
        };
        let outcomes = attach_media(&mut timeline, provider, gate, options).await;
        let (attached, skipped, failed) = summarize(&outcomes);
        emit(
            if failed > 0 { Level::Warn } else { Level::Info },
            "timeline.media.summary",
            &format!("Media: {attached} attached, {skipped} skipped, {failed} failed"),
            Some(json!({ "attached": attached, "skipped": skipped, "failed": failed })),
        );
        if let Some(balance) = &balance {
            emit(
                Level::Info,
                "timeline.media.credits",
                &format!("{} credits left", balance.available()),
                Some(json!({ "available": balance.available() })),
            );
        }
    }

    let document = to_pretty_json(&timeline, "timeline")?;
    write_document(&document, out, "timeline")
}

#[allow(clippy::too_many_arguments)]
fn run_split(
    text: &str,
    start: f64,
    end: f64,
    max_chars: Option<usize>,
    max_lines: Option<usize>,
    overflow: Option<OverflowStrategy>,
    config: &DirectorConfig,
) -> Result<()> {
    let max_chars = max_chars.filter(|n| *n > 0).unwrap_or(config.max_chars_per_line);
    let max_lines = max_lines.filter(|n| *n > 0).unwrap_or(config.max_lines);
    let overflow = overflow.unwrap_or(config.overflow_strategy);

    let lines = split(text, start, end, max_chars, max_lines, overflow);

    match ui::get_output_format() {
        OutputFormat::Json => {
            println!("{}", to_pretty_json(&lines, "lines")?);
        }
        OutputFormat::Text => {
            if lines.is_empty() {
                emit(Level::Warn, "split.empty", "No lines: the text is empty", None);
            }
            for line in &lines {
                println!(
                    "{} {}",
                    format!("[{:>7.3} → {:>7.3}]", line.start, line.end).dimmed(),
                    line.text
                );
            }
        }
    }
    Ok(())
}

fn run_segments(path: &Path, format: Option<TranscriptFormat>, out: Option<&Path>) -> Result<()> {
    let format = format.unwrap_or_else(|| TranscriptFormat::detect(path));
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading transcript from {}", path.display()))?;
    let segments = parse_transcript(&contents, format)
        .with_context(|| format!("parsing transcript {}", path.display()))?;

    emit(
        Level::Debug,
        "segments.parsed",
        &format!("Parsed {} segments", segments.len()),
        None,
    );

    let request = TimelineRequest::from_segments(segments);
    let document = to_pretty_json(&request, "timeline request")?;
    write_document(&document, out, "timeline request")
}

fn run_ass(path: &Path, out: Option<&Path>, options: &AssOptions) -> Result<()> {
    let timeline: TimelineResponse = read_json(path, "timeline")?;
    let script = generate_ass(&timeline, options).context("rendering ASS script")?;
    write_document(&script, out, "ASS script")
}

fn print_presets() {
    if ui::get_output_format() == OutputFormat::Json {
        let styles: Vec<_> = style_presets()
            .iter()
            .map(|p| {
                json!({
                    "style": p.style.as_str(),
                    "size": p.size.as_str(),
                    "maxLines": p.max_lines,
                    "description": p.description,
                })
            })
            .collect();
        let directions: Vec<_> = direction_profiles()
            .iter()
            .map(|p| {
                json!({
                    "preset": p.preset.as_str(),
                    "creativity": p.creativity,
                    "defaultAnimation": p.default_animation.as_str(),
                    "centerAnimation": p.center_animation.as_str(),
                    "edgeSize": p.edge_size.as_str(),
                    "centerSize": p.center_size.as_str(),
                })
            })
            .collect();
        let theme_list: Vec<_> = themes()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "accentColor": t.accent_color,
                    "textColor": t.text_color,
                    "outlineColor": t.outline_color,
                })
            })
            .collect();
        emit(
            Level::Info,
            "presets.list",
            "Available presets",
            Some(json!({ "styles": styles, "directionPresets": directions, "themes": theme_list })),
        );
        return;
    }

    let color = ui::color_enabled();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Style", "Size", "Max lines", "Description"]);
    for preset in style_presets() {
        table.add_row(vec![
            preset.style.to_string(),
            preset.size.to_string(),
            preset
                .max_lines
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            preset.description.to_string(),
        ]);
    }
    println!("{}\n{table}\n", "Subtitle styles".bold());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Preset", "Creativity", "Animation (edge / center)", "Size (edge / center)"]);
    for profile in direction_profiles() {
        table.add_row(vec![
            profile.preset.to_string(),
            format!("{:.1}", profile.creativity),
            format!("{} / {}", profile.default_animation, profile.center_animation),
            format!("{} / {}", profile.edge_size, profile.center_size),
        ]);
    }
    println!("{}\n{table}\n", "Direction presets".bold());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Theme", "Accent", "Text", "Outline"]);
    for theme in themes() {
        table.add_row(vec![
            theme.name.to_string(),
            swatch(theme.accent_color, color),
            swatch(theme.text_color, color),
            swatch(theme.outline_color, color),
        ]);
    }
    println!("{}\n{table}", "Themes".bold());
}

fn run_config(command: ConfigCommands, explicit: Option<PathBuf>) -> Result<()> {
    let path = match explicit {
        Some(path) => path,
        None => config::config_path()?,
    };

    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = DirectorConfig::load_from_path(&path)?;
            match ui::get_output_format() {
                OutputFormat::Json => emit(
                    Level::Info,
                    "config.show",
                    &format!("Configuration at {}", path.display()),
                    Some(serde_json::to_value(&config).context("serializing config")?),
                ),
                OutputFormat::Text => {
                    println!("{}", format!("# {}", path.display()).dimmed());
                    print!("{}", toml::to_string_pretty(&config).context("serializing config")?);
                }
            }
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", path.display());
            }
            DirectorConfig::default().save_to_path(&path)?;
            emit(
                Level::Success,
                "config.init.done",
                &format!("Wrote default configuration to {}", path.display()),
                None,
            );
        }
    }
    Ok(())
}

fn run_completions(command: CompletionCommands) -> Result<()> {
    match command {
        CompletionCommands::Generate { shell } => {
            print!("{}", completions::render(shell)?);
        }
        CompletionCommands::Install {
            shell,
            output,
            force,
        } => {
            let path = completions::install(shell, output, force)?;
            emit(
                Level::Success,
                "completions.install.done",
                &format!("Installed {shell} completions to {}", path.display()),
                Some(json!({ "shell": shell.to_string(), "path": path.display().to_string() })),
            );
            if let Some(hint) = completions::activation_hint(shell, &path) {
                emit(Level::Info, "completions.install.hint", &hint, None);
            }
        }
    }
    Ok(())
}
