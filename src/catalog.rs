//! Run discovery over local CMIP6 archives
//!
//! The pipeline consumes a mapping from run identity to a loadable dataset
//! handle; where that mapping comes from is behind [`DatasetSource`] so a
//! directory tree, an object store or a test fixture can all feed the same
//! pipeline. Discovery reads identity attributes only, leaving normalization
//! and data reads to later stages where failures are tracked per run.

use crate::errors::{GmstError, Result};
use crate::loader::{global_attr_string, read_run_id};
use crate::run_id::RunId;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Selection criteria for a discovery pass
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Experiments to include, e.g. `["historical", "ssp245"]`; empty
    /// selects every experiment
    pub experiments: Vec<String>,
    /// Variable the files must provide, matched against `variable_id`
    pub variable: String,
    /// Temporal resolution tag, matched against the `frequency` attribute
    pub frequency: String,
    /// Restrict to one ensemble member, e.g. `r1i1p1f1`; `None` keeps all
    pub member: Option<String>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            experiments: Vec::new(),
            variable: "tas".to_string(),
            frequency: "mon".to_string(),
            member: None,
        }
    }
}

impl CatalogQuery {
    /// Whether a probed file satisfies the query.
    ///
    /// Attribute filters only apply when the file carries the attribute;
    /// archives without `variable_id`/`frequency` fall through to the
    /// loader, which rejects files lacking the requested variable anyway.
    pub fn matches(&self, handle: &RunHandle) -> bool {
        if !self.experiments.is_empty() && !self.experiments.contains(&handle.run.experiment) {
            return false;
        }
        if let Some(member) = &self.member {
            if &handle.run.member != member {
                return false;
            }
        }
        if let Some(variable_id) = &handle.variable_id {
            if variable_id != &self.variable {
                return false;
            }
        }
        if let Some(frequency) = &handle.frequency {
            if frequency != &self.frequency {
                return false;
            }
        }
        true
    }
}

/// A discovered run: identity plus the file it lives in.
///
/// Holding the path instead of an open file keeps handles `Send` and lets
/// each worker open its own descriptor when it forces the load.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub run: RunId,
    pub path: PathBuf,
    pub variable_id: Option<String>,
    pub frequency: Option<String>,
}

/// Source of runs for the pipeline
#[async_trait]
pub trait DatasetSource {
    /// Human-readable description of where runs come from
    fn describe(&self) -> String;

    /// Discover all runs matching the query, keyed by identity
    async fn discover(&self, query: &CatalogQuery) -> Result<BTreeMap<RunId, RunHandle>>;
}

/// A directory tree of CMIP6 NetCDF files
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    /// Open an archive rooted at a directory.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the path does not exist or is not a
    /// directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(GmstError::CatalogError(format!(
                "Archive path does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(GmstError::CatalogError(format!(
                "Archive path is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DatasetSource for LocalArchive {
    fn describe(&self) -> String {
        format!("local archive at {}", self.root.display())
    }

    async fn discover(&self, query: &CatalogQuery) -> Result<BTreeMap<RunId, RunHandle>> {
        let mut runs: BTreeMap<RunId, RunHandle> = BTreeMap::new();
        let mut files = discover_files(&self.root);

        while let Some(path) = files.next().await {
            let path = path?;
            // A file that is not a CMIP6 product is a bystander, not a
            // failed run; note it and move on
            let handle = match probe_file(&path) {
                Ok(handle) => handle,
                Err(err) => {
                    println!("⚠ Skipping {}: {}", path.display(), err);
                    continue;
                }
            };

            if !query.matches(&handle) {
                continue;
            }

            if let Some(existing) = runs.get(&handle.run) {
                println!(
                    "⚠ Duplicate run {} in {} (keeping {})",
                    handle.run,
                    path.display(),
                    existing.path.display()
                );
                continue;
            }

            runs.insert(handle.run.clone(), handle);
        }

        Ok(runs)
    }
}

/// Reads run identity and filter attributes from one file without touching
/// coordinate or field data.
///
/// # Errors
///
/// Returns `UnsupportedSchema` if the file lacks the CMIP6 identity
/// attributes, or a NetCDF error if it cannot be opened.
pub fn probe_file(path: &Path) -> Result<RunHandle> {
    let file = netcdf::open(path)?;
    let run = read_run_id(&file, &path.display().to_string())?;
    let variable_id = global_attr_string(&file, "variable_id");
    let frequency = global_attr_string(&file, "frequency");

    Ok(RunHandle {
        run,
        path: path.to_path_buf(),
        variable_id,
        frequency,
    })
}

/// Streams every `.nc` file under a directory tree, depth first with
/// sorted entries so discovery order is reproducible
pub fn discover_files(root: &Path) -> Pin<Box<dyn Stream<Item = Result<PathBuf>> + Send + 'static>> {
    let root = root.to_path_buf();

    Box::pin(async_stream::stream! {
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    yield Err(GmstError::IoError(err));
                    continue;
                }
            };

            let mut paths = Vec::new();
            for entry in entries {
                match entry {
                    Ok(entry) => paths.push(entry.path()),
                    Err(err) => yield Err(GmstError::IoError(err)),
                }
            }
            paths.sort();

            let mut subdirs = Vec::new();
            for path in paths {
                if path.is_dir() {
                    subdirs.push(path);
                } else if path.extension().is_some_and(|ext| ext == "nc") {
                    yield Ok(path);
                }
            }
            // Reverse so the stack pops subdirectories in sorted order
            for dir in subdirs.into_iter().rev() {
                pending.push(dir);
            }
        }
    })
}
