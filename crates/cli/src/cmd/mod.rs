mod assemble;
mod check;
mod publish;
mod resolve;

use std::path::Path;

use anyhow::{Context, Result};

use stitch_lib::config::{self, Project};

pub use assemble::cmd_assemble;
pub use check::cmd_check;
pub use publish::cmd_publish;
pub use resolve::cmd_resolve;

/// Load the project, naming the file on failure.
fn load_project(config: &Path) -> Result<Project> {
  config::load(config).with_context(|| format!("Failed to load {}", config.display()))
}
