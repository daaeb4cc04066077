use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use tokio::fs;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn home_path(to_join: &str) -> Result<PathBuf> {
    let path = dirs::home_dir()
        .context("Could not find `home` directory")?
        .join(to_join);

    log::debug!("Home path + joined: {:?}", path);

    Ok(path)
}

/// Replaces `path` with `contents` through a sibling temp file and a rename.
/// Other processes reading the store see the old file or the new one, never
/// a truncated one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().context("Failed to get store directory")?;

    fs::create_dir_all(dir)
        .await
        .context("Failed to create store directory")?;

    let name = path
        .file_name()
        .context("Store path has no file name")?
        .to_string_lossy();

    let temp = dir.join(format!(
        ".{name}.{}.{}.tmp",
        std::process::id(),
        TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp, contents)
        .await
        .with_context(|| format!("Failed to write {}", temp.display()))?;

    if let Err(why) = fs::rename(&temp, path).await {
        fs::remove_file(&temp).await.ok();

        return Err(why).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    #[tokio::test]
    async fn test_write_atomic_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".vendaplus").join("session.json");

        write_atomic(&path, b"{\"a\":1}").await.unwrap();
        write_atomic(&path, b"{\"a\":2}").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "{\"a\":2}");

        // no temp files left behind
        let mut entries = fs::read_dir(path.parent().unwrap()).await.unwrap();
        let mut names = vec![];
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["session.json".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let body = |n: usize| {
            serde_json::to_vec(&json!({
                "access_token": "x".repeat(200_000),
                "refresh_token": format!("refresh-{n}"),
            }))
            .unwrap()
        };

        write_atomic(&path, &body(0)).await.unwrap();

        let writer = {
            let path = path.clone();

            tokio::spawn(async move {
                for n in 1..=300 {
                    write_atomic(&path, &body(n)).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let raw = fs::read(&path).await.unwrap();
            let parsed = serde_json::from_slice::<Value>(&raw);

            assert!(parsed.is_ok(), "read {} bytes of a partial file", raw.len());
        }

        writer.await.unwrap();
    }
}
