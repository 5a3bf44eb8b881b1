//! Candidate file discovery

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use specsniff_core::ClassificationRequest;
use std::path::{Path, PathBuf};

/// Files larger than this are never API specs worth a paid call
pub const MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

const CANDIDATE_PATTERNS: [&str; 5] = ["*.yaml", "*.yml", "*.json", "*.graphql", "*.gql"];

fn candidate_globs() -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in CANDIDATE_PATTERNS {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Walk `root` (.gitignore aware) and load every candidate file.
///
/// Paths in the returned requests are relative to `root`, sorted.
pub fn discover(root: &Path) -> anyhow::Result<Vec<ClassificationRequest>> {
    let globs = candidate_globs()?;
    let mut paths = Vec::new();

    for result in WalkBuilder::new(root).hidden(false).git_ignore(true).build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        // .git internals are hidden but not gitignored
        if entry.path().components().any(|c| c.as_os_str() == ".git") {
            continue;
        }

        let Some(file_name) = entry.path().file_name() else {
            continue;
        };
        if !globs.is_match(file_name) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if meta.len() > MAX_FILE_SIZE_BYTES {
                tracing::debug!(
                    "Skipping large file {} ({} bytes)",
                    entry.path().display(),
                    meta.len()
                );
                continue;
            }
        }
        paths.push(entry.into_path());
    }
    paths.sort();

    let mut requests = Vec::with_capacity(paths.len());
    for path in paths {
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if let Some(request) = load(&path, &relative)? {
            requests.push(request);
        }
    }

    tracing::info!("Found {} candidate files under {}", requests.len(), root.display());
    Ok(requests)
}

/// Load explicitly named files; a missing file is an error.
pub fn load_files(files: &[PathBuf]) -> anyhow::Result<Vec<ClassificationRequest>> {
    let mut requests = Vec::with_capacity(files.len());
    for path in files {
        if !path.is_file() {
            anyhow::bail!("not a file: {}", path.display());
        }
        if let Some(request) = load(path, path)? {
            requests.push(request);
        }
    }
    Ok(requests)
}

/// Returns `None` for non-UTF-8 content.
fn load(path: &Path, display: &Path) -> anyhow::Result<Option<ClassificationRequest>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(ClassificationRequest::new(
            display.to_string_lossy().replace('\\', "/"),
            content,
        ))),
        Err(_) => {
            tracing::debug!("Skipping non-UTF-8 file {}", path.display());
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_filters_candidates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("api")).unwrap();
        fs::write(dir.path().join("api/openapi.yaml"), "openapi: 3.0.0\n").unwrap();
        fs::write(dir.path().join("schema.graphql"), "type Query { a: Int }\n").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("binary.json"), [0xff, 0xfe, 0x00]).unwrap();

        let requests = discover(dir.path()).unwrap();
        let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();

        assert_eq!(paths, vec!["api/openapi.yaml", "schema.graphql"]);
    }

    #[test]
    fn test_discover_skips_large_files() {
        let dir = TempDir::new().unwrap();
        let big = "a".repeat(MAX_FILE_SIZE_BYTES as usize + 1);
        fs::write(dir.path().join("huge.json"), big).unwrap();

        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_files(&[PathBuf::from("/definitely/not/here.yaml")]).is_err());
    }
}
