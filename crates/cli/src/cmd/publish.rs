//! Implementation of the `stitch publish` command.

use std::path::Path;

use anyhow::{Context, Result};

use stitch_lib::cancel::CancelToken;
use stitch_lib::publish::{PublicationDescriptor, write_publication};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

/// Write the POM and JSON descriptor. Uploading is left to the build engine.
pub fn cmd_publish(config: &Path, out: Option<&Path>, format: OutputFormat) -> Result<()> {
  let project = super::load_project(config)?;
  let resolution = project
    .resolver(CancelToken::new())
    .resolve(&project.modules)
    .context("Resolution failed")?;

  let descriptor =
    PublicationDescriptor::from_resolution(&project.identity, project.publication.clone(), &resolution);
  let dest = out.unwrap_or(&project.destination);
  let files = write_publication(&descriptor, dest).context("Failed to write publication")?;

  if format.is_json() {
    return print_json(&serde_json::json!({ "files": files, "descriptor": descriptor }));
  }

  print_success(&format!(
    "Published {}:{}:{}",
    descriptor.group_id, descriptor.artifact_id, descriptor.version
  ));
  print_stat("POM", &files.pom.display().to_string());
  print_stat("Descriptor", &files.descriptor.display().to_string());
  print_stat("Dependencies", &descriptor.dependencies.len().to_string());

  Ok(())
}
