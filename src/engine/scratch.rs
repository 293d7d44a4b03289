//! Scoped files and directories that clean up after themselves

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Create a unique per-job scratch directory under `root`, removed on drop.
///
/// Call [`TempDir::keep`] to leave it on disk.
pub fn create_scratch_dir(root: &Path, job_id: &str) -> io::Result<TempDir> {
    fs::create_dir_all(root)?;
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-", job_id))
        .tempdir_in(root)?;
    debug!("Created scratch directory {}", dir.path().display());
    Ok(dir)
}

/// Encoder output under construction. Deleted on drop unless persisted.
#[derive(Debug)]
pub struct TempOutput {
    path: PathBuf,
    armed: bool,
}

impl TempOutput {
    /// Claim `path`, removing any stale file left there by an earlier run
    pub fn new(path: PathBuf) -> Self {
        let _ = fs::remove_file(&path);
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the produced file; missing counts as empty
    pub fn len(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically move the finished file to `destination`
    pub fn persist(mut self, destination: &Path) -> io::Result<()> {
        fs::rename(&self.path, destination)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        if self.armed {
            match fs::remove_file(&self.path) {
                Ok(()) => debug!("Removed partial output {}", self.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove partial output {}: {}", self.path.display(), e),
            }
        }
    }
}

/// Intermediate documents written for one mux, removed on drop unless kept
#[derive(Debug, Default)]
pub struct ArtifactSet {
    files: Vec<PathBuf>,
    keep: bool,
}

impl ArtifactSet {
    pub fn new(keep: bool) -> Self {
        Self {
            files: Vec::new(),
            keep,
        }
    }

    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    /// Write a document and track it
    pub fn write(&mut self, path: PathBuf, content: &str) -> io::Result<PathBuf> {
        fs::write(&path, content)?;
        self.files.push(path.clone());
        Ok(path)
    }

    /// Files that survive the drop
    pub fn retained(&self) -> Vec<PathBuf> {
        if self.keep {
            self.files.clone()
        } else {
            Vec::new()
        }
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for file in &self.files {
            let _ = fs::remove_file(file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_removed_unless_kept() {
        let root = tempfile::tempdir().unwrap();
        let nested_root = root.path().join("bisub");
        let removed = {
            let scratch = create_scratch_dir(&nested_root, "job-a").unwrap();
            fs::write(scratch.path().join("x.ass"), "x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!removed.exists());

        let kept = create_scratch_dir(&nested_root, "job-b").unwrap().keep();
        assert!(kept.is_dir());
        assert!(kept.starts_with(&nested_root));
    }

    #[test]
    fn test_scratch_dirs_are_unique_for_the_same_job_name() {
        let root = tempfile::tempdir().unwrap();
        let first = create_scratch_dir(root.path(), "lezione").unwrap();
        let second = create_scratch_dir(root.path(), "lezione").unwrap();
        assert_ne!(first.path(), second.path());
        let name = first.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("lezione-"));
    }

    #[test]
    fn test_temp_output_cleanup_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let part = dir.path().join(".out.part.mp4");
        {
            let temp = TempOutput::new(part.clone());
            fs::write(temp.path(), b"partial").unwrap();
            assert_eq!(temp.len(), 7);
        }
        assert!(!part.exists());

        let final_path = dir.path().join("out.mp4");
        let temp = TempOutput::new(part.clone());
        fs::write(temp.path(), b"done").unwrap();
        temp.persist(&final_path).unwrap();
        assert!(!part.exists());
        assert_eq!(fs::read(&final_path).unwrap(), b"done");
    }

    #[test]
    fn test_artifacts_kept_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let kept_path = {
            let mut kept = ArtifactSet::new(true);
            let path = kept.write(dir.path().join("a.srt"), "1").unwrap();
            assert_eq!(kept.retained(), vec![path.clone()]);
            path
        };
        assert!(kept_path.exists());

        let dropped_path = {
            let mut dropped = ArtifactSet::new(false);
            let path = dropped.write(dir.path().join("b.srt"), "1").unwrap();
            assert!(dropped.retained().is_empty());
            path
        };
        assert!(!dropped_path.exists());
    }
}
