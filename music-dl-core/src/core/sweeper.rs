use std::path::{Path, PathBuf};

/// Extensions left behind by yt-dlp: raw streams, fragments, partials.
pub const TRASH_EXTENSIONS: &[&str] = &[
    ".webm", ".m4a", ".mkv", ".mpd", ".m3u8", ".part", ".ytdl", ".ytdl.tmp", ".f234", ".f140",
    ".frag", ".opus", ".temp",
];

/// yt-dlp sometimes treats `--paths ALL:<dir>` as a relative folder name and
/// creates `ALL...` directories in the working directory.
pub const LEAKED_DIR_MARKER: &str = "ALL";

const TEMP_SUFFIXES: &[&str] = &[".temp.mp4", ".temp.m4a"];
const TEMP_MARKERS: &[&str] = &["fragment", "ytdl"];

fn lower_extension(lower_name: &str) -> String {
    Path::new(lower_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn is_temp_pattern(lower_name: &str) -> bool {
    TEMP_SUFFIXES.iter().any(|s| lower_name.ends_with(s))
        || TEMP_MARKERS.iter().any(|m| lower_name.contains(m))
}

fn remove_file_quietly(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("swept {}", path.display());
            true
        }
        Err(e) => {
            tracing::debug!("could not sweep {}: {}", path.display(), e);
            false
        }
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a.file_name() != b.file_name() {
        return false;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Removes download leftovers from the directory holding a finished file.
///
/// A file is trash when its extension is a trash extension not listed in
/// `keep_exts`, or its name looks like a yt-dlp temp file. A file whose
/// extension is in `keep_exts` and whose name starts with `final_stem` is
/// never touched. Returns how many files were removed; never fails.
pub fn sweep_local(dir: &Path, final_stem: &str, keep_exts: &[&str]) -> usize {
    let keep: Vec<String> = keep_exts.iter().map(|e| e.to_lowercase()).collect();
    let stem = final_stem.to_lowercase();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("local sweep skipped {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let lower = entry.file_name().to_string_lossy().to_lowercase();
        let ext = lower_extension(&lower);

        let is_trash_ext = TRASH_EXTENSIONS.contains(&ext.as_str()) && !keep.contains(&ext);
        let is_final = keep.contains(&ext) && lower.starts_with(&stem);

        if (is_trash_ext || is_temp_pattern(&lower)) && !is_final && remove_file_quietly(&entry.path()) {
            removed += 1;
        }
    }

    removed
}

/// Removes leaked `ALL*` folders and trash-extension files from each base
/// directory. `protect` is never removed. Never fails.
pub fn sweep_global(dirs: &[PathBuf], protect: Option<&Path>) -> usize {
    let mut removed = 0;

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("global sweep skipped {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if protect.is_some_and(|p| is_same_file(p, &path)) {
                continue;
            }

            let Ok(meta) = std::fs::metadata(&path) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();

            if meta.is_dir() {
                if name.starts_with(LEAKED_DIR_MARKER) {
                    tracing::warn!("removing leaked temp folder {}", path.display());
                    match std::fs::remove_dir_all(&path) {
                        Ok(()) => removed += 1,
                        Err(e) => tracing::debug!("could not remove {}: {}", path.display(), e),
                    }
                }
                continue;
            }

            let ext = lower_extension(&name.to_lowercase());
            if TRASH_EXTENSIONS.contains(&ext.as_str()) && remove_file_quietly(&path) {
                removed += 1;
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn local_sweep_removes_trash_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let webm = touch(dir.path(), "temp_abc.webm");
        let part = touch(dir.path(), "Song.mp3.part");
        let frag = touch(dir.path(), "x.F140");
        let notes = touch(dir.path(), "notes.txt");

        let removed = sweep_local(dir.path(), "Song", &[".mp3"]);

        assert_eq!(removed, 3);
        assert!(!webm.exists());
        assert!(!part.exists());
        assert!(!frag.exists());
        assert!(notes.exists());
    }

    #[test]
    fn local_sweep_removes_temp_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let temp_mp4 = touch(dir.path(), "clip.temp.mp4");
        let fragment = touch(dir.path(), "stream-Fragment1");
        let ytdl = touch(dir.path(), "a.ytdl.tmp");

        sweep_local(dir.path(), "Other", &[".mp4"]);

        assert!(!temp_mp4.exists());
        assert!(!fragment.exists());
        assert!(!ytdl.exists());
    }

    #[test]
    fn local_sweep_protects_final_file_even_when_it_looks_like_trash() {
        let dir = tempfile::tempdir().unwrap();
        let final_file = touch(dir.path(), "Fragment Of Time - ytdl Remix.mp3");
        let other_mp3 = touch(dir.path(), "Unrelated fragment.mp3");

        sweep_local(dir.path(), "Fragment Of Time - ytdl Remix", &[".mp3"]);

        assert!(final_file.exists());
        assert!(!other_mp3.exists());
    }

    #[test]
    fn local_sweep_keep_extension_is_not_trash() {
        let dir = tempfile::tempdir().unwrap();
        let m4a = touch(dir.path(), "Some Other Song.m4a");

        sweep_local(dir.path(), "Target", &[".m4a"]);

        assert!(m4a.exists());
    }

    #[test]
    fn local_sweep_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("fragments.webm");
        std::fs::create_dir(&sub).unwrap();

        assert_eq!(sweep_local(dir.path(), "x", &[".mp3"]), 0);
        assert!(sub.is_dir());
    }

    #[test]
    fn local_sweep_missing_dir_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(sweep_local(&dir.path().join("missing"), "x", &[".mp3"]), 0);
    }

    #[test]
    fn global_sweep_removes_leaked_dirs_and_trash() {
        let dir = tempfile::tempdir().unwrap();
        let leaked = dir.path().join("ALL:tmp");
        std::fs::create_dir(&leaked).unwrap();
        touch(&leaked, "temp_abc.webm");
        let regular_dir = dir.path().join("music");
        std::fs::create_dir(&regular_dir).unwrap();
        let opus = touch(dir.path(), "temp_abc.opus");
        let mp3 = touch(dir.path(), "Keep Me.mp3");
        let mp4 = touch(dir.path(), "Keep Me.mp4");

        let removed = sweep_global(&[dir.path().to_path_buf()], None);

        assert_eq!(removed, 2);
        assert!(!leaked.exists());
        assert!(!opus.exists());
        assert!(regular_dir.exists());
        assert!(mp3.exists());
        assert!(mp4.exists());
    }

    #[test]
    fn global_sweep_respects_protected_path() {
        let dir = tempfile::tempdir().unwrap();
        let protected = touch(dir.path(), "Artist - Title.m4a");

        sweep_global(&[dir.path().to_path_buf()], Some(&protected));

        assert!(protected.exists());
    }

    #[test]
    fn global_sweep_tolerates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(sweep_global(&[missing, dir.path().to_path_buf()], None), 0);
    }
}
