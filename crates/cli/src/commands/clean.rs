//! Handler for the clean command

use std::fs;
use std::path::PathBuf;

use crate::error::CliError;

/// Arguments for the `clean` command
pub struct CleanArgs {
    pub output_dir: PathBuf,
    pub store_file: Option<PathBuf>,
}

/// Handle the `clean` command
///
/// Removes exported `.jsonl` artifacts from the output directory and,
/// when requested, the analytical store file itself.
pub fn handle_clean(args: &CleanArgs) -> Result<(), CliError> {
    let mut removed = 0usize;

    if args.output_dir.is_dir() {
        for entry in fs::read_dir(&args.output_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
                fs::remove_file(&path)?;
                tracing::debug!(path = %path.display(), "removed artifact");
                removed += 1;
            }
        }
    }
    println!(
        "Removed {} artifact(s) from {}",
        removed,
        args.output_dir.display()
    );

    if let Some(store) = &args.store_file {
        if store.is_file() {
            fs::remove_file(store)?;
            println!("Removed store file {}", store.display());
        } else {
            println!("Store file {} not present, nothing to do", store.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_only_jsonl() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{}\n").unwrap();
        fs::write(dir.path().join("b.jsonl"), "{}\n").unwrap();
        fs::write(dir.path().join("keep.csv"), "x,y\n").unwrap();

        let args = CleanArgs {
            output_dir: dir.path().to_path_buf(),
            store_file: None,
        };
        handle_clean(&args).unwrap();

        assert!(!dir.path().join("a.jsonl").exists());
        assert!(!dir.path().join("b.jsonl").exists());
        assert!(dir.path().join("keep.csv").exists());
    }

    #[test]
    fn test_clean_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        let args = CleanArgs {
            output_dir: dir.path().join("nope"),
            store_file: None,
        };
        assert!(handle_clean(&args).is_ok());
    }

    #[test]
    fn test_clean_removes_store_file_when_asked() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("data.duckdb");
        fs::write(&store, b"stub").unwrap();

        let args = CleanArgs {
            output_dir: dir.path().to_path_buf(),
            store_file: Some(store.clone()),
        };
        handle_clean(&args).unwrap();
        assert!(!store.exists());
    }
}
