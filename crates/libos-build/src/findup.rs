use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub fn find_upwards(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent().unwrap_or(start).to_path_buf()
    };

    loop {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        if !dir.pop() {
            break;
        }
    }

    None
}

/// Directory holding `Cargo.lock`, searched from the working directory first.
pub fn workspace_root() -> Result<PathBuf> {
    let start = std::env::current_dir()?;
    let lock = find_upwards(&start, "Cargo.lock")
        .or_else(|| find_upwards(Path::new(env!("CARGO_MANIFEST_DIR")), "Cargo.lock"))
        .ok_or_else(|| anyhow!("Cargo.lock not found (run from within the repo or pass --config)"))?;

    Ok(lock.parent().unwrap_or(lock.as_path()).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_upwards_from_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("Cargo.lock"), "").unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_upwards(&nested, "Cargo.lock").unwrap();
        assert_eq!(found, root.path().join("Cargo.lock"));
        assert!(find_upwards(&nested, "no-such-file.toml").is_none());
    }
}
