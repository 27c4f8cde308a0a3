//! Data folder layout and event shuffling.
//!
//! A data folder holds one subfolder per camera view. Each subfolder holds one
//! image per event, in the same order across views. Events are presented in
//! a shuffled order that is shared by all views, so that event `k` of view 1
//! and event `k` of view 2 are the same photograph.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, SessionError};

/// Substrings identifying the three view folders (matched case-insensitively).
pub const VIEW_NAMES: [&str; 3] = ["view1", "view2", "view3"];

/// One view folder and its image files, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFolder {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
}

/// A validated data folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLayout {
    pub root: PathBuf,
    /// Folders in view order.
    pub views: [ViewFolder; 3],
}

impl ViewLayout {
    /// Validate `dir` and list its images.
    ///
    /// The folder must contain exactly three subfolders whose names contain
    /// `view1`, `view2` and `view3`, each holding the same number (more than
    /// one) of files. Hidden files are ignored.
    ///
    /// # Errors
    ///
    /// [`SessionError::Layout`] when the structure does not match, or
    /// [`SessionError::Io`] when the folder cannot be read.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();

        let mut subdirs = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                subdirs.push(entry.path());
            }
        }
        if subdirs.len() != 3 {
            return Err(SessionError::Layout(format!(
                "expected three view folders in {}, found {}",
                root.display(),
                subdirs.len()
            )));
        }

        let mut ordered: Vec<ViewFolder> = Vec::with_capacity(3);
        for view in VIEW_NAMES {
            let path = subdirs
                .iter()
                .find(|p| folder_name(p).contains(view))
                .ok_or_else(|| SessionError::Layout(format!("no folder named like {view:?}")))?;
            if ordered.iter().any(|v| &v.path == path) {
                return Err(SessionError::Layout(format!(
                    "folder {} matches more than one view",
                    path.display()
                )));
            }
            ordered.push(ViewFolder {
                files: list_files(path)?,
                path: path.clone(),
            });
        }

        let count = ordered[0].files.len();
        if count <= 1 {
            return Err(SessionError::Layout(format!(
                "each view needs more than one image, found {count}"
            )));
        }
        if let Some(v) = ordered.iter().find(|v| v.files.len() != count) {
            return Err(SessionError::Layout(format!(
                "{} holds {} images, expected {count}",
                v.path.display(),
                v.files.len()
            )));
        }

        let views: [ViewFolder; 3] = ordered
            .try_into()
            .map_err(|_| SessionError::Layout("expected three views".to_string()))?;
        info!("data folder {}: {count} events per view", root.display());
        Ok(Self { root, views })
    }

    pub fn event_count(&self) -> usize {
        self.views[0].files.len()
    }

    /// Image files per event, after applying the shared permutation.
    ///
    /// Entry `k` holds the view 1, view 2 and view 3 image of the `k`-th
    /// displayed event.
    pub fn shuffled_events(&self, seed: u64) -> Vec<[&Path; 3]> {
        event_permutation(self.event_count(), seed)
            .into_iter()
            .map(|i| self.views.each_ref().map(|v| v.files[i].as_path()))
            .collect()
    }
}

/// Deterministic permutation of `0..n` for the given seed.
pub fn event_permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    debug!("event permutation of {n} with seed {seed}");
    order
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
