//! CLI logic for the Flowsketch diagram tool.
//!
//! Each subcommand of [`Args`] maps to one `run_*` function. Only `analyze`
//! and `summarize` call the language model.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, path::Path};

use log::{info, warn};

use flowsketch::{
    Analyzer, FlowsketchError,
    config::AppConfig,
    image::ImageInput,
    mdl::{self, MdlWriter, validate_rendered_text},
    model::DiagramModel,
    summary::SummarySource,
    validate::structure_issues,
};

/// File names written by `analyze`.
pub const ANALYSIS_FILE: &str = "analysis.json";
pub const MDL_FILE: &str = "model.mdl";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Run the Flowsketch CLI application
///
/// # Errors
///
/// Returns `FlowsketchError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Model call failures
/// - Invalid diagram model JSON or MDL text
pub fn run(args: &Args) -> Result<(), FlowsketchError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Analyze {
            image,
            output_dir,
            no_summary,
        } => run_analyze(app_config, image, output_dir, !no_summary),
        Command::Render { model, output } => run_render(model, output),
        Command::Summarize {
            input,
            text,
            output,
        } => run_summarize(app_config, input, *text, output),
        Command::Check { input } => run_check(input),
    }
}

fn run_analyze(
    config: AppConfig,
    image_path: &str,
    output_dir: &str,
    with_summary: bool,
) -> Result<(), FlowsketchError> {
    info!(image_path, output_dir; "Analyzing diagram image");

    let image = ImageInput::from_path(image_path, config.limits().max_image_bytes())?;
    let analyzer = Analyzer::new(config)?;
    let analysis = analyzer.analyze(&image, with_summary)?;

    let output_dir = Path::new(output_dir);
    fs::create_dir_all(output_dir)?;

    let json = serde_json::to_string_pretty(analysis.model())?;
    fs::write(output_dir.join(ANALYSIS_FILE), json)?;
    fs::write(output_dir.join(MDL_FILE), analysis.diagram_text())?;
    if let Some(summary) = analysis.summary() {
        fs::write(output_dir.join(SUMMARY_FILE), summary)?;
    }

    info!(output_dir = output_dir.display().to_string(); "Analysis written");
    Ok(())
}

fn run_render(model_path: &str, output: &str) -> Result<(), FlowsketchError> {
    info!(model_path, output; "Rendering diagram model");

    let model = read_model(model_path)?;
    for issue in structure_issues(&model) {
        warn!(issue:% = issue; "Diagram model is incomplete");
    }

    let text = MdlWriter::new().render(&model);
    fs::write(output, text)?;

    info!(output_file = output; "MDL text exported successfully");
    Ok(())
}

fn run_summarize(
    config: AppConfig,
    input: &str,
    as_text: bool,
    output: &str,
) -> Result<(), FlowsketchError> {
    info!(input, as_text; "Summarizing");

    let analyzer = Analyzer::new(config)?;
    let summary = if as_text {
        let text = fs::read_to_string(input)?;
        analyzer.summarize(SummarySource::Text(&text))?
    } else {
        let model = read_model(input)?;
        analyzer.summarize(SummarySource::Model(&model))?
    };
    fs::write(output, summary)?;

    info!(output_file = output; "Summary written");
    Ok(())
}

fn run_check(input: &str) -> Result<(), FlowsketchError> {
    let text = fs::read_to_string(input)?;

    let root = mdl::read(&text).map_err(|err| FlowsketchError::new_read_error(err, &*text))?;
    if !validate_rendered_text(&text) {
        return Err(FlowsketchError::InvalidDiagramText(format!(
            "{input} lacks a `Model {{` or `System {{` section or a closing brace"
        )));
    }

    let system = root.section("System");
    let blocks = system.map_or(0, |system| system.sections_named("Block").count());
    let lines = system.map_or(0, |system| system.sections_named("Line").count());
    info!(input, blocks, lines; "MDL text is well formed");
    Ok(())
}

fn read_model(path: &str) -> Result<DiagramModel, FlowsketchError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
