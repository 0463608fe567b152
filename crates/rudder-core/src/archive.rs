//! Chart archive (`.tgz`) reading and creation
//!
//! Chart archives are gzip-compressed tarballs whose entries all live under a
//! single top-level directory named after the chart (`mychart/Chart.yaml`).

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use walkdir::WalkDir;

use crate::error::{CoreError, Result};

/// Whether a path looks like a chart archive
pub fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.ends_with(".tgz") || name.ends_with(".tar.gz")
}

/// Read every regular file of an archive, keyed by its path relative to the
/// archive's top-level directory.
pub fn read_archive(data: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    let decoder = GzDecoder::new(data);
    let mut archive = Archive::new(decoder);
    let mut files = BTreeMap::new();
    let mut top_level: Option<String> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw = entry.path()?.to_string_lossy().replace('\\', "/");
        let raw = raw.trim_start_matches("./").to_string();
        let Some((root, rest)) = raw.split_once('/') else {
            return Err(CoreError::Archive {
                message: format!("file '{}' is outside of the chart directory", raw),
            });
        };

        match &top_level {
            None => top_level = Some(root.to_string()),
            Some(existing) if existing != root => {
                return Err(CoreError::Archive {
                    message: format!(
                        "archive contains more than one top-level directory ({} and {})",
                        existing, root
                    ),
                });
            }
            Some(_) => {}
        }

        if rest.split('/').any(|part| part == "..") {
            return Err(CoreError::Archive {
                message: format!("illegal path in archive: {}", raw),
            });
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        files.insert(rest.to_string(), data);
    }

    if files.is_empty() {
        return Err(CoreError::Archive {
            message: "archive is empty".to_string(),
        });
    }

    Ok(files)
}

/// Read a chart directory into the same path → content map as [`read_archive`]
pub fn read_directory(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.insert(rel, std::fs::read(entry.path())?);
    }

    Ok(files)
}

/// Package a chart directory as `<output_dir>/<name>-<version>.tgz`
///
/// The name and version are read from the directory's `Chart.yaml`.
pub fn create_archive(chart_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let chart = crate::chart::Chart::load(chart_dir)?;
    let base = chart.metadata.name.clone();
    let output = output_dir.join(format!("{}-{}.tgz", base, chart.metadata.version));

    let file = std::fs::File::create(&output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.append_dir_all(&base, chart_dir)?;

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    Ok(output)
}
