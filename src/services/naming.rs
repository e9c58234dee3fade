//! Auto-save and batch-save file naming
//!
//! Name derivation is deterministic and side-effect-free: collision
//! resolution only probes the filesystem, nothing is written until the
//! caller performs the actual save.

use std::path::{Path, PathBuf};

/// Derive an auto-save file name for a completed result
///
/// Uses the source's base name with a `_processed` suffix; falls back to a
/// numbered name when no source path is available (`index` is 0-based, the
/// produced name 1-based).
///
/// # Examples
/// ```rust
/// use cutout::services::auto_save_name;
/// use std::path::Path;
///
/// assert_eq!(auto_save_name(Some(Path::new("/in/photo.jpg")), 0), "photo_processed.png");
/// assert_eq!(auto_save_name(None, 2), "processed_3.png");
/// ```
#[must_use]
pub fn auto_save_name(source: Option<&Path>, index: usize) -> String {
    match source.and_then(|p| p.file_stem()).and_then(|s| s.to_str()) {
        Some(stem) => format!("{stem}_processed.png"),
        None => format!("processed_{}.png", index + 1),
    }
}

/// Resolve a candidate path against existing files
///
/// If the candidate is free it is returned unchanged; otherwise a numeric
/// suffix is inserted before the extension and incremented until a free name
/// is found (`photo_processed.png` -> `photo_processed_1.png` -> ...).
#[must_use]
pub fn resolve_collision(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let stem = candidate
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("processed");
    let extension = candidate.extension().and_then(|s| s.to_str());
    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1;
    loop {
        let name = match extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let next = parent.join(name);
        if !next.exists() {
            log::debug!(
                "auto-save name collision: {} -> {}",
                candidate.display(),
                next.display()
            );
            return next;
        }
        counter += 1;
    }
}

/// Apply a batch naming pattern to a 1-based index
///
/// The `{index}` placeholder is substituted; a pattern without the
/// placeholder gets `_{index}` appended. The returned name carries no
/// extension, the caller adds one per output format.
///
/// # Examples
/// ```rust
/// use cutout::services::apply_pattern;
///
/// assert_eq!(apply_pattern("processed_{index}", 1), "processed_1");
/// assert_eq!(apply_pattern("cutout", 2), "cutout_2");
/// ```
#[must_use]
pub fn apply_pattern(pattern: &str, index: usize) -> String {
    if pattern.contains("{index}") {
        pattern.replace("{index}", &index.to_string())
    } else {
        format!("{pattern}_{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_auto_save_name_from_source() {
        assert_eq!(
            auto_save_name(Some(Path::new("/photos/cat.jpeg")), 5),
            "cat_processed.png"
        );
    }

    #[test]
    fn test_auto_save_name_fallback_is_one_based() {
        assert_eq!(auto_save_name(None, 0), "processed_1.png");
        assert_eq!(auto_save_name(None, 9), "processed_10.png");
    }

    #[test]
    fn test_resolve_collision_free_path_unchanged() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("photo_processed.png");
        assert_eq!(resolve_collision(&candidate), candidate);
    }

    #[test]
    fn test_resolve_collision_increments_suffix() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("photo_processed.png");

        fs::write(&candidate, b"x").unwrap();
        let first = resolve_collision(&candidate);
        assert_eq!(first, dir.path().join("photo_processed_1.png"));

        fs::write(&first, b"x").unwrap();
        let second = resolve_collision(&candidate);
        assert_eq!(second, dir.path().join("photo_processed_2.png"));
    }

    #[test]
    fn test_resolve_collision_probe_only() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("photo_processed.png");
        fs::write(&candidate, b"x").unwrap();

        let _resolved = resolve_collision(&candidate);

        // Probing must not create files.
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_apply_pattern_placeholder() {
        assert_eq!(apply_pattern("img_{index}", 3), "img_3");
        assert_eq!(apply_pattern("{index}_shot", 7), "7_shot");
    }

    #[test]
    fn test_apply_pattern_without_placeholder() {
        assert_eq!(apply_pattern("result", 1), "result_1");
    }
}
