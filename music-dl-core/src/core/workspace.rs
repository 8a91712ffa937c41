use std::io;
use std::path::{Path, PathBuf};

const MAX_NAME_ATTEMPTS: i64 = 16;

/// Scratch directory owned by a single job.
///
/// Lives next to the final file as `.<basename>.<suffix>_<millis>` and is
/// removed recursively when dropped. Removal never fails loudly.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn create_for(output_path: &Path, suffix: &str) -> io::Result<Self> {
        let base_dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "job".to_string());

        let stamp = chrono::Utc::now().timestamp_millis();
        let mut last_err = None;

        for offset in 0..MAX_NAME_ATTEMPTS {
            let path = base_dir.join(format!(".{}.{}_{}", base_name, suffix, stamp + offset));
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!("workspace created at {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::other("workspace name exhausted")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        remove_dir_quietly(&self.path);
    }
}

pub fn remove_dir_quietly(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::debug!("removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::debug!("could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_hidden_sibling_of_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Artist - Song.mp3");
        let ws = Workspace::create_for(&output, "audiowork").unwrap();

        assert_eq!(ws.path().parent(), Some(dir.path()));
        let name = ws.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".Artist - Song.mp3.audiowork_"), "{}", name);
        assert!(ws.path().is_dir());
    }

    #[test]
    fn workspace_removed_on_drop_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::create_for(&dir.path().join("out.mp3"), "audiowork").unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(ws.join("temp_abc.webm"), b"data").unwrap();
        std::fs::create_dir(ws.join("nested")).unwrap();

        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn two_workspaces_for_same_target_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("same.mp3");
        let a = Workspace::create_for(&output, "audiowork").unwrap();
        let b = Workspace::create_for(&output, "audiowork").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_tolerates_already_removed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::create_for(&dir.path().join("gone.mp3"), "audiowork").unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        drop(ws);
    }
}
