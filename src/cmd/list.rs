//! Revision listing (`stepsite list`).

use anyhow::Result;
use std::path::Path;

/// Print the revisions a build would include, in build order.
pub fn cmd_list(project_dir: &Path) -> Result<()> {
    use stepsite::config::Config;
    use stepsite::tracker::GitTracker;

    let config = Config::new(project_dir.to_path_buf(), None, false, false)?;
    let tracker = GitTracker::new(&config.project_dir)?;
    let revisions = tracker.discover(&config.tag_pattern(), &config.tag_prefix)?;

    println!();
    println!("{:<12} {:<6} Description", "Tag", "Step");
    println!("{:<12} {:<6} -----------", "------------", "------");
    for revision in &revisions {
        println!(
            "{:<12} {:<6} {}",
            revision.tag,
            revision.ordinal,
            revision.description()
        );
    }
    println!();
    println!("{} step(s)", revisions.len());
    println!();
    Ok(())
}
