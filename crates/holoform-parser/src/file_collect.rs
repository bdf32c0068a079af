use holoform_core::{ConfigError, HoloformError, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration for file collection
#[derive(Debug, Clone)]
pub struct FileCollectionConfig {
    pub recursive: bool,
    /// Extensions without the dot; empty means every Python extension
    pub extensions: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FileCollectionConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            extensions: vec![],
            include_patterns: vec![],
            exclude_patterns: vec![],
        }
    }
}

/// Source files under `dir`, sorted by path so every pass visits them in the same order.
pub fn collect_source_files_with_config(
    dir: &Path,
    config: &FileCollectionConfig,
) -> Result<Vec<PathBuf>> {
    info!("Collecting source files from: {:?}", dir);
    debug!(
        "Collection config: recursive={}, extensions={:?}",
        config.recursive, config.extensions
    );

    let mut ovr = OverrideBuilder::new(dir);

    // Add default exclusions for common non-source directories
    let default_excludes = [
        "!**/.git/**",
        "!**/__pycache__/**",
        "!**/.pytest_cache/**",
        "!**/.mypy_cache/**",
        "!**/.tox/**",
        "!**/node_modules/**",
    ];

    for exclude in default_excludes {
        add_pattern(&mut ovr, exclude)?;
    }

    // Add user-specified exclude patterns
    for exclude in &config.exclude_patterns {
        let pattern = if exclude.starts_with('!') {
            exclude.clone()
        } else {
            format!("!{}", exclude)
        };
        add_pattern(&mut ovr, &pattern)?;
        debug!("Added exclude pattern: {}", pattern);
    }

    // Add user-specified include patterns
    for include in &config.include_patterns {
        add_pattern(&mut ovr, include)?;
        debug!("Added include pattern: {}", include);
    }

    let overrides = ovr
        .build()
        .map_err(|e| HoloformError::Config(ConfigError::ValidationError(e.to_string())))?;

    let mut walker_builder = WalkBuilder::new(dir);
    walker_builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true)
        .overrides(overrides);

    if !config.recursive {
        walker_builder.max_depth(Some(1));
        debug!("Non-recursive: limited to depth 1");
    }

    let supported_extensions = supported_extensions(&config.extensions);
    debug!("Supported extensions: {:?}", supported_extensions);

    let mut paths = Vec::new();
    let mut total_files = 0;

    for dent in walker_builder.build() {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!("Walker error: {}", e);
                continue;
            }
        };

        let path = dent.path();
        if !path.is_file() {
            continue;
        }
        total_files += 1;

        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| supported_extensions.contains(ext));
        if matches {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();

    info!(
        "File collection complete: {} files found, {} passed filters",
        total_files,
        paths.len()
    );

    if paths.is_empty() && total_files > 0 {
        warn!("No files passed extension filters. Supported extensions: {:?}", supported_extensions);
    }

    Ok(paths)
}

fn add_pattern(ovr: &mut OverrideBuilder, pattern: &str) -> Result<()> {
    ovr.add(pattern).map_err(|e| {
        HoloformError::Config(ConfigError::ValidationError(format!(
            "Invalid glob pattern '{}': {}",
            pattern, e
        )))
    })?;
    Ok(())
}

fn supported_extensions(extensions: &[String]) -> HashSet<String> {
    let mut set: HashSet<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    if set.is_empty() {
        set.extend(["py".to_string(), "pyi".to_string()]);
    }
    set
}

/// Recursive collection of Python sources with default settings
pub fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    collect_source_files_with_config(dir, &FileCollectionConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collects_sorted_python_files_and_skips_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::write(root.join("b.py"), "x = 1\n").unwrap();
        fs::write(root.join("a.py"), "x = 1\n").unwrap();
        fs::write(root.join("pkg/c.py"), "x = 1\n").unwrap();
        fs::write(root.join("notes.txt"), "not python\n").unwrap();
        fs::write(root.join("__pycache__/a.py"), "x = 1\n").unwrap();

        let files = collect_source_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.py", "b.py", "pkg/c.py"]);
    }

    #[test]
    fn user_excludes_and_non_recursive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("venv/lib")).unwrap();
        fs::write(root.join("main.py"), "x = 1\n").unwrap();
        fs::write(root.join("venv/lib/site.py"), "x = 1\n").unwrap();

        let config = FileCollectionConfig {
            exclude_patterns: vec!["**/venv/**".to_string()],
            ..Default::default()
        };
        assert_eq!(collect_source_files_with_config(root, &config).unwrap().len(), 1);

        let config = FileCollectionConfig {
            recursive: false,
            ..Default::default()
        };
        assert_eq!(collect_source_files_with_config(root, &config).unwrap().len(), 1);
    }
}
