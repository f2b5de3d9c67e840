use std::path::PathBuf;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::pass::PassId;
use crate::pipeline::{ShaderStage, compile_stages, group_entries};

use config::PipelineConfig;

pub mod config;
pub mod demo;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct DriverArgs {
    /// The pipeline config file. Uses the built-in pipeline when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the optimizer before any other pass.
    #[arg(short, long, default_value_t = false)]
    optimize: bool,

    /// Overrides the final backend.
    #[arg(short, long, value_enum)]
    backend: Option<PassId>,

    /// Only translate the given stage.
    #[arg(short, long, value_enum)]
    stage: Option<ShaderStage>,

    /// Print the reflection data of every stage.
    #[arg(short, long, default_value_t = false)]
    reflection: bool,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = DriverArgs::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => demo::demo_config(),
    };
    if args.optimize && !config.pipeline.tool_passes.contains(&PassId::Optimizer) {
        config.pipeline.tool_passes.insert(0, PassId::Optimizer);
    }
    if let Some(backend) = args.backend {
        config.pipeline.backend = Some(backend);
    }
    tracing::debug!("using config: {:#?}", config);

    let description = config.to_description()?;
    let library = demo::demo_library();

    let mut stages = if config.stages.is_empty() {
        demo::demo_stages()
    } else {
        config.stage_definitions()
    };
    if let Some(stage) = args.stage {
        stages.retain(|definition| definition.stage == stage);
    }

    let translations = compile_stages(&library, &stages, &description);
    for entry in group_entries(&translations) {
        println!("{}", format!("=== {} ===", entry.name).bold().cyan());
        println!("{}\n", entry.value);
    }

    for translation in &translations {
        let name = translation.stage.name();
        let red = name.red();
        let stage = red.bold();
        match &translation.results {
            Ok(results) => {
                for failure in &results.failures {
                    eprintln!("{stage}: {failure}");
                }
            }
            Err(err) => eprintln!("{stage}: {err}"),
        }
    }

    if args.reflection {
        for translation in &translations {
            let Some(binary) = translation
                .results
                .as_ref()
                .ok()
                .and_then(|results| results.binary())
            else {
                continue;
            };
            let name = format!("=== Reflection{} ===", translation.stage.name());
            println!("{}", name.bold().green());
            println!("{}", toml::to_string_pretty(&binary.reflection)?);
        }
    }

    Ok(())
}
