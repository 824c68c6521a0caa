//! Full multi-version site build (`stepsite build`).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub async fn cmd_build(
    project_dir: &Path,
    output: Option<PathBuf>,
    keep_output: bool,
    verbose: bool,
) -> Result<()> {
    use console::style;
    use stepsite::config::Config;
    use stepsite::orchestrator::Orchestrator;

    let config = Config::new(project_dir.to_path_buf(), output, verbose, keep_output)?;
    tracing::debug!(?config, "resolved configuration");

    println!();
    println!(
        "{} {}",
        style("Building").bold(),
        style(&config.site_title).cyan()
    );

    let orchestrator = Orchestrator::new(config);
    match orchestrator.run().await {
        Ok(report) => {
            orchestrator.ui().finish(report.built(), &report.output_dir);
            if !report.warnings.is_empty() {
                println!(
                    "{}",
                    style(format!(
                        "Completed with {} warning(s); check your working tree",
                        report.warnings.len()
                    ))
                    .yellow()
                );
            }
            Ok(())
        }
        Err(e) => {
            orchestrator.ui().finish_and_clear();
            Err(e).context("Site build failed")
        }
    }
}
