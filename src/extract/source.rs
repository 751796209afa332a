//! Source tree walking and the parallel scan pool.
//!
//! Per-file parsing shares no mutable state, so extraction runs over a pool
//! of worker coroutines fed by an mpsc file queue. Workers send per-file
//! record batches back over a result channel; the merge sorts by (file,
//! line) so the output is deterministic regardless of which worker finished
//! first.

use crate::record::RouteRecord;
use crate::runtime_config::RuntimeConfig;
use anyhow::Context;
use may::sync::mpsc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A filesystem tree to scan, with an optional subtree scope filter.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    scope: Option<String>,
}

/// Directories never worth descending into.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".git",
    "dist",
    "build",
    "target",
];

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SourceTree {
            root: root.into(),
            scope: None,
        }
    }

    /// Restrict the scan to paths under `scope`, relative to the root.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect every file under the root with one of the given extensions.
    ///
    /// A missing root is a structural error and aborts the run; a tree that
    /// walks fine but yields zero files is left to the caller to judge,
    /// since only required layers treat that as fatal.
    pub fn files_with_extensions(&self, extensions: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
        if !self.root.exists() {
            anyhow::bail!("source tree {} does not exist", self.root.display());
        }
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot canonicalize {}", self.root.display()))?;

        let mut files = Vec::new();
        let walker = WalkDir::new(&root).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && (SKIP_DIRS.contains(&name.as_ref()) || name.starts_with('.')))
        });
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    // Extraction-local: skip the entry, never abort the walk.
                    warn!(error = %err, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let ext_matches = entry
                .path()
                .extension()
                .map(|e| extensions.iter().any(|x| e == *x))
                .unwrap_or(false);
            if !ext_matches {
                continue;
            }
            if let Some(scope) = &self.scope {
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                if !relative.starts_with(scope) {
                    continue;
                }
            }
            files.push(entry.into_path());
        }
        files.sort();
        debug!(
            root = %root.display(),
            scope = ?self.scope,
            files = files.len(),
            "Source tree walked"
        );
        Ok(files)
    }
}

/// Run `extract_fn` over every file, in parallel when the pool is worth it.
///
/// Files that fail to read are skipped with a warning (extraction-local
/// recovery). The returned records are sorted by (file, line).
pub fn scan_files<F>(files: Vec<PathBuf>, config: RuntimeConfig, extract_fn: F) -> Vec<RouteRecord>
where
    F: Fn(&Path, &str) -> Vec<RouteRecord> + Send + Sync + 'static,
{
    let mut records = if config.scan_workers <= 1 || files.len() <= 1 {
        scan_sequential(&files, &extract_fn)
    } else {
        scan_parallel(files, config, Arc::new(extract_fn))
    };
    records.sort_by(|a, b| {
        (&a.source_file, a.source_line, &a.raw_path).cmp(&(
            &b.source_file,
            b.source_line,
            &b.raw_path,
        ))
    });
    records
}

fn scan_sequential<F>(files: &[PathBuf], extract_fn: &F) -> Vec<RouteRecord>
where
    F: Fn(&Path, &str) -> Vec<RouteRecord>,
{
    let mut out = Vec::new();
    for file in files {
        match std::fs::read_to_string(file) {
            Ok(source) => out.extend(extract_fn(file, &source)),
            Err(err) => {
                warn!(file = %file.display(), error = %err, "Skipping unreadable file");
            }
        }
    }
    out
}

fn scan_parallel<F>(
    files: Vec<PathBuf>,
    config: RuntimeConfig,
    extract_fn: Arc<F>,
) -> Vec<RouteRecord>
where
    F: Fn(&Path, &str) -> Vec<RouteRecord> + Send + Sync + 'static,
{
    let (work_tx, work_rx) = mpsc::channel::<PathBuf>();
    let (result_tx, result_rx) = mpsc::channel::<Vec<RouteRecord>>();

    // All workers share one receiver and load balance off the queue.
    let work_rx = Arc::new(work_rx);
    let workers = config.scan_workers.min(files.len());

    debug!(
        workers,
        files = files.len(),
        stack_size = config.stack_size,
        "Starting scan pool"
    );

    for worker_id in 0..workers {
        let work_rx = Arc::clone(&work_rx);
        let result_tx = result_tx.clone();
        let extract_fn = Arc::clone(&extract_fn);

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the
        // may runtime. Safe because the closure is Send + 'static and only
        // touches channel endpoints and the shared extract function.
        let spawned = unsafe {
            may::coroutine::Builder::new()
                .stack_size(config.stack_size)
                .spawn(move || {
                    while let Ok(file) = work_rx.recv() {
                        let batch = match std::fs::read_to_string(&file) {
                            Ok(source) => extract_fn(&file, &source),
                            Err(err) => {
                                warn!(
                                    file = %file.display(),
                                    error = %err,
                                    worker_id,
                                    "Skipping unreadable file"
                                );
                                Vec::new()
                            }
                        };
                        if result_tx.send(batch).is_err() {
                            break;
                        }
                    }
                })
        };
        if let Err(err) = spawned {
            warn!(worker_id, error = %err, "Failed to spawn scan worker");
        }
    }
    drop(result_tx);

    let total = files.len();
    for file in files {
        if work_tx.send(file).is_err() {
            break;
        }
    }
    drop(work_tx);

    let mut out = Vec::new();
    for _ in 0..total {
        match result_rx.recv() {
            Ok(batch) => out.extend(batch),
            Err(_) => break,
        }
    }
    out
}
