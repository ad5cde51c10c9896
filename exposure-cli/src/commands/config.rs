use crate::config::{ConfigLoader, ConfigSources, ExposureConfig, PROJECT_CONFIG_DIR_ENV};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration and where each value came from
    Show,
    /// Show configuration layers and whether they exist
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let (config, sources) = ConfigLoader::load_with_sources()?;
            print!("{}", render_config(&config, &sources)?);
            Ok(())
        }
        ConfigCommands::Path => {
            print_layer("User config:   ", ConfigLoader::user_config_path().as_deref(), None);
            let project = ConfigLoader::project_config_path();
            let relocated = ConfigLoader::project_config_override()
                .map(|_| format!("set by {PROJECT_CONFIG_DIR_ENV}"));
            print_layer("Project config:", Some(&project), relocated);
            Ok(())
        }
    }
}

/// TOML of the merged config followed by one source line per value
fn render_config(config: &ExposureConfig, sources: &ConfigSources) -> Result<String> {
    let mut out = toml::to_string_pretty(config)?;
    out.push('\n');
    out.push_str(&format!(
        "# aggregation.enabled <- {}\n",
        sources.aggregation_enabled
    ));
    out.push_str(&format!("# output.format <- {}\n", sources.output_format));
    Ok(out)
}

fn print_layer(label: &str, path: Option<&Path>, note: Option<String>) {
    let Some(path) = path else {
        println!("{label} unavailable (no home directory)");
        return;
    };
    let status = if path.exists() { "found" } else { "not found" };
    match note {
        Some(note) => println!("{label} {} ({status}, {note})", path.display()),
        None => println!("{label} {} ({status})", path.display()),
    }
}
