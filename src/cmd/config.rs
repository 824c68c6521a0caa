//! Configuration view and validation commands (`stepsite config`).

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use stepsite::config::Config;
    use stepsite::site_config::{CONFIG_FILE_NAME, SiteToml};

    let config_path = SiteToml::path_in(project_dir);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Stepsite Configuration");
            println!("======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                SiteToml::load(&config_path)?
            } else {
                println!("No {} found at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Using default configuration:");
                SiteToml::default()
            };
            println!();

            println!("[project]");
            println!("  title = \"{}\"", toml.project.title);
            println!();
            println!("[tags]");
            println!("  prefix = \"{}\"", toml.tags.prefix);
            println!();
            println!("[build]");
            println!("  install_cmd = \"{}\"", toml.build.install_cmd);
            println!("  build_cmd = \"{}\"", toml.build.build_cmd);
            println!("  config_file = \"{}\"", toml.build.config_file);
            println!("  config_anchor = \"{}\"", toml.build.config_anchor);
            println!("  base_path = \"{}\"", toml.build.base_path);
            println!("  raw_output_dir = \"{}\"", toml.build.raw_output_dir);
            println!(
                "  reinstall_after_restore = {}",
                toml.build.reinstall_after_restore
            );
            println!();
            println!("[docs]");
            println!("  notes_dir = \"{}\"", toml.docs.notes_dir);
            println!("  prompts_dir = \"{}\"", toml.docs.prompts_dir);
            println!();
            println!("[output]");
            println!("  dir = \"{}\"", toml.output.dir);
            println!("  pages_dir = \"{}\"", toml.output.pages_dir);
            println!();

            // Effective values (including env overrides)
            println!("Effective values (with env overrides):");
            let config = Config::new(project_dir.to_path_buf(), None, false, false)?;
            println!("  install_cmd = \"{}\"", config.install_cmd);
            println!("  build_cmd = \"{}\"", config.build_cmd);
            println!("  output_dir = \"{}\"", config.output_dir.display());
            println!();

            if !config_path.exists() {
                println!("Run 'stepsite config init' to create a {} file.", CONFIG_FILE_NAME);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
                return Ok(());
            }

            let toml = SiteToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            SiteToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [project] title");
            println!("  - [tags] prefix");
            println!("  - [build] install_cmd, build_cmd, config_file, base_path");
            println!("  - [docs] notes_dir, prompts_dir");
            println!("  - [output] dir, pages_dir");
            println!();
        }
    }

    Ok(())
}
