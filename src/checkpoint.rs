use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CheckpointError;

/// Policy checkpoint file name under the model directory.
pub const POLICY_CHECKPOINT: &str = "ddpg.pkl";

/// Perception checkpoint file name under the model directory.
pub const PERCEPTION_CHECKPOINT: &str = "vae.ckpt";

/// The checkpoint file pair under one model directory.
///
/// Both files co-existing is the sole precondition for "precompiled models
/// available".
#[derive(Debug, Clone)]
pub struct CheckpointPair {
    policy: PathBuf,
    perception: PathBuf,
}

impl CheckpointPair {
    /// Resolve the pair under `model_dir`. Fails if the directory is absent.
    pub fn new(model_dir: &Path) -> Result<Self, CheckpointError> {
        if !model_dir.is_dir() {
            return Err(CheckpointError::DirNotFound(model_dir.to_path_buf()));
        }
        Ok(CheckpointPair {
            policy: model_dir.join(POLICY_CHECKPOINT),
            perception: model_dir.join(PERCEPTION_CHECKPOINT),
        })
    }

    pub fn policy_path(&self) -> &Path {
        &self.policy
    }

    pub fn perception_path(&self) -> &Path {
        &self.perception
    }

    pub fn both_exist(&self) -> bool {
        self.policy.exists() && self.perception.exists()
    }
}

/// Write a checkpoint file atomically: `write` produces `<dest>.tmp`, which
/// is then renamed over `dest`. Readers never observe a half-written file.
pub fn write_atomic<F>(dest: &Path, write: F) -> Result<(), CheckpointError>
where
    F: FnOnce(&Path) -> anyhow::Result<()>,
{
    let mut tmp_name = dest
        .file_name()
        .ok_or_else(|| CheckpointError::ModelSave(format!("bad path: {}", dest.display())))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = dest.with_file_name(tmp_name);

    write(&tmp).map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
    fs::rename(&tmp, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");
        let err = CheckpointPair::new(&missing).unwrap_err();
        assert!(matches!(err, CheckpointError::DirNotFound(p) if p == missing));
    }

    #[test]
    fn test_both_exist_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = CheckpointPair::new(dir.path()).unwrap();
        assert!(!pair.both_exist());

        fs::write(pair.policy_path(), b"policy").unwrap();
        assert!(!pair.both_exist());

        fs::write(pair.perception_path(), b"perception").unwrap();
        assert!(pair.both_exist());
    }

    #[test]
    fn test_paths_use_fixed_names() {
        let dir = tempfile::tempdir().unwrap();
        let pair = CheckpointPair::new(dir.path()).unwrap();
        assert_eq!(pair.policy_path(), dir.path().join("ddpg.pkl"));
        assert_eq!(pair.perception_path(), dir.path().join("vae.ckpt"));
    }

    #[test]
    fn test_write_atomic_publishes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ddpg.pkl");

        write_atomic(&dest, |tmp| {
            fs::write(tmp, b"weights")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"weights");
        assert!(!dir.path().join("ddpg.pkl.tmp").exists());
    }

    #[test]
    fn test_write_atomic_failure_leaves_dest_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("vae.ckpt");
        fs::write(&dest, b"old").unwrap();

        let result = write_atomic(&dest, |_| anyhow::bail!("collaborator refused"));
        assert!(matches!(result, Err(CheckpointError::ModelSave(_))));
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }
}
