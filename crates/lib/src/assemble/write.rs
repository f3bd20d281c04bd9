//! Writing an artifact as a jar.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::cancel::CancelToken;
use crate::consts::{BUNDLE_MANIFEST_PATH, CREATED_BY, JAR_MANIFEST_PATH};

use super::types::{Artifact, AssembleError};

/// Write the artifact to `<dest_dir>/<artifact>-<version>.jar`.
///
/// The jar is byte-for-byte reproducible: entries are sorted and carry a fixed
/// timestamp. It is written to a temporary file and renamed into place, so a
/// failed or cancelled write leaves no partial jar behind.
pub fn write_jar(artifact: &Artifact, dest_dir: &Path, cancel: &CancelToken) -> Result<PathBuf, AssembleError> {
  fs::create_dir_all(dest_dir).map_err(|e| AssembleError::Io {
    path: dest_dir.to_path_buf(),
    source: e,
  })?;

  let path = dest_dir.join(artifact.file_name());
  let temp_path = dest_dir.join(format!(".{}.tmp", artifact.file_name()));

  if let Err(e) = write_zip(artifact, &temp_path, cancel) {
    if let Err(cleanup) = fs::remove_file(&temp_path)
      && cleanup.kind() != io::ErrorKind::NotFound
    {
      warn!(path = %temp_path.display(), error = %cleanup, "failed to remove partial jar");
    }
    return Err(e);
  }

  fs::rename(&temp_path, &path).map_err(|e| AssembleError::Io {
    path: path.clone(),
    source: e,
  })?;

  info!(path = %path.display(), entries = artifact.entries.len(), "wrote jar");
  Ok(path)
}

fn write_zip(artifact: &Artifact, temp_path: &Path, cancel: &CancelToken) -> Result<(), AssembleError> {
  let file = fs::File::create(temp_path).map_err(|e| AssembleError::Io {
    path: temp_path.to_path_buf(),
    source: e,
  })?;
  let mut zip = ZipWriter::new(file);
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .unix_permissions(0o644);

  zip.start_file(JAR_MANIFEST_PATH, options)?;
  zip
    .write_all(jar_manifest(artifact).as_bytes())
    .map_err(|e| io_error(temp_path, e))?;

  zip.start_file(BUNDLE_MANIFEST_PATH, options)?;
  let manifest = serde_json::to_vec_pretty(&artifact.manifest)?;
  zip.write_all(&manifest).map_err(|e| io_error(temp_path, e))?;

  for (path, entry) in &artifact.entries {
    if cancel.is_cancelled() {
      return Err(AssembleError::Cancelled);
    }
    zip.start_file(path.as_str(), options)?;
    let mut source = fs::File::open(&entry.source).map_err(|e| io_error(&entry.source, e))?;
    io::copy(&mut source, &mut zip).map_err(|e| io_error(&entry.source, e))?;
  }

  let file = zip.finish()?;
  file.sync_all().map_err(|e| io_error(temp_path, e))?;
  Ok(())
}

fn io_error(path: &Path, source: io::Error) -> AssembleError {
  AssembleError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// The `META-INF/MANIFEST.MF` text for an artifact.
fn jar_manifest(artifact: &Artifact) -> String {
  let identity = &artifact.manifest.identity;
  format!(
    "Manifest-Version: 1.0\r\nCreated-By: {}\r\nImplementation-Title: {}\r\nImplementation-Version: {}\r\nImplementation-Vendor-Id: {}\r\n\r\n",
    CREATED_BY, identity.artifact, identity.version, identity.group
  )
}
