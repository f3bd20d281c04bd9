//! Implementation of the `stitch check` command.

use std::path::Path;

use anyhow::{Context, Result};

use stitch_lib::cancel::CancelToken;

use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

/// Load and resolve the configuration without writing anything.
pub fn cmd_check(config: &Path, format: OutputFormat) -> Result<()> {
  let project = super::load_project(config)?;
  let resolution = project
    .resolver(CancelToken::new())
    .resolve(&project.modules)
    .context("Resolution failed")?;

  if format.is_json() {
    let json = serde_json::json!({
      "project": project.identity,
      "modules": resolution.order,
      "aggregated": project.modules.aggregate_order(),
      "policy": project.policy,
      "conflicts": resolution.audit,
    });
    return print_json(&json);
  }

  print_success(&format!(
    "{}:{}:{} is consistent",
    project.identity.group, project.identity.artifact, project.identity.version
  ));
  print_stat("Modules", &resolution.order.len().to_string());
  print_stat("Aggregated", &project.modules.aggregate_order().join(", "));
  print_stat("Conflict policy", &project.policy.to_string());

  for record in &resolution.audit {
    print_warning(&format!(
      "{} in {} ({}): requested {}, selected {}",
      record.coordinate,
      record.module,
      record.classpath,
      record.requested.join(", "),
      record.selected
    ));
  }

  Ok(())
}
