// ABOUTME: Incremental whole-project pass: collect files, skip unchanged ones, build the call graph
// ABOUTME: One file's failure is logged and counted; the pass always completes

use crate::cache::{content_hash, FileHashCache, RecordStore};
use crate::call_graph::CallGraph;
use holoform_core::{Holoform, HoloformError, HoloformParser, ProjectSettings, Result};
use holoform_parser::{collect_source_files_with_config, FileCollectionConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters for one project pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub files_seen: usize,
    pub files_parsed: usize,
    /// Unchanged since the last pass; previous records reused.
    pub files_skipped: usize,
    pub files_failed: usize,
    pub files_removed: usize,
    pub holoforms: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectIndex {
    pub holoforms: Vec<Holoform>,
    pub call_graph: CallGraph,
    pub stats: ParseStats,
}

impl ProjectIndex {
    pub fn find(&self, id: &str) -> Option<&Holoform> {
        self.holoforms.iter().find(|h| h.id() == id)
    }
}

pub struct ProjectParser<P: HoloformParser> {
    parser: P,
    settings: ProjectSettings,
}

impl<P: HoloformParser> ProjectParser<P> {
    pub fn new(parser: P, settings: ProjectSettings) -> Self {
        Self { parser, settings }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Run one pass over `root`.
    ///
    /// Cache and record state is read once at the start and written once at
    /// the end. Concurrent passes over the same root are not supported.
    pub fn parse_project(&self, root: &Path) -> Result<ProjectIndex> {
        if !root.is_dir() {
            return Err(HoloformError::NotFound(format!(
                "Project directory not found: {}",
                root.display()
            )));
        }
        info!("Parsing project at {}", root.display());

        let mut cache = FileHashCache::load(root.join(&self.settings.cache_file));
        let mut records = RecordStore::load(root.join(&self.settings.records_file));
        let files = self.collect_files(root)?;

        let mut stats = ParseStats::default();
        let mut present = HashSet::new();
        let mut order = Vec::with_capacity(files.len());

        for path in &files {
            let relative = relative_path(root, path);
            stats.files_seen += 1;
            present.insert(relative.clone());

            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Failed to read {}: {}", relative, e);
                    self.forget(&relative, &mut cache, &mut records);
                    stats.files_failed += 1;
                    continue;
                }
            };
            let hash = content_hash(&bytes);

            if cache.is_fresh(&relative, &hash) && records.contains(&relative) {
                debug!("Unchanged, skipping {}", relative);
                stats.files_skipped += 1;
                order.push(relative);
                continue;
            }

            match self.parse_file(&relative, bytes) {
                Ok(holoforms) => {
                    debug!("Parsed {} ({} Holoforms)", relative, holoforms.len());
                    records.replace(relative.clone(), holoforms);
                    cache.insert(relative.clone(), hash);
                    stats.files_parsed += 1;
                    order.push(relative);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", relative, e);
                    self.forget(&relative, &mut cache, &mut records);
                    stats.files_failed += 1;
                }
            }
        }

        let removed_from_cache = cache.retain_present(&present);
        let removed_from_records = records.retain_present(&present);
        let removed: HashSet<&String> = removed_from_cache
            .iter()
            .chain(removed_from_records.iter())
            .collect();
        stats.files_removed = removed.len();
        for path in &removed {
            debug!("Dropped vanished file {}", path);
        }

        cache.save()?;
        records.save()?;

        let holoforms: Vec<Holoform> = order
            .iter()
            .filter_map(|relative| records.get(relative))
            .flat_map(|h| h.iter().cloned())
            .collect();
        stats.holoforms = holoforms.len();

        let call_graph = CallGraph::from_holoforms(&holoforms);
        info!(
            "Project pass complete: {} seen, {} parsed, {} skipped, {} failed, {} removed, {} Holoforms, {} call edges",
            stats.files_seen,
            stats.files_parsed,
            stats.files_skipped,
            stats.files_failed,
            stats.files_removed,
            stats.holoforms,
            call_graph.edge_count()
        );

        Ok(ProjectIndex {
            holoforms,
            call_graph,
            stats,
        })
    }

    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let config = FileCollectionConfig {
            recursive: true,
            extensions: self.settings.extensions.clone(),
            include_patterns: vec![],
            exclude_patterns: self.settings.exclude_patterns.clone(),
        };
        collect_source_files_with_config(root, &config)
    }

    fn parse_file(&self, relative: &str, bytes: Vec<u8>) -> Result<Vec<Holoform>> {
        let source = String::from_utf8(bytes)
            .map_err(|e| HoloformError::Parse(format!("{} is not valid UTF-8: {}", relative, e)))?;
        self.parser.parse_source(&source, &module_id(relative))
    }

    /// Failed files are not cached, so the next pass retries them.
    fn forget(&self, relative: &str, cache: &mut FileHashCache, records: &mut RecordStore) {
        cache.remove(relative);
        records.remove(relative);
    }
}

/// `/`-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Dotted module path: `pkg/util.py` -> `pkg.util`.
pub fn module_id(relative: &str) -> String {
    let without_ext = match relative.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() && !stem.ends_with('/') => stem,
        _ => relative,
    };
    without_ext.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_ids_are_dotted() {
        assert_eq!(module_id("pkg/util.py"), "pkg.util");
        assert_eq!(module_id("main.py"), "main");
        assert_eq!(module_id("pkg/__init__.py"), "pkg.__init__");
        assert_eq!(module_id("Makefile"), "Makefile");
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/project");
        assert_eq!(relative_path(root, &root.join("pkg").join("a.py")), "pkg/a.py");
    }
}
