//! Filesystem helpers used by the renderer and the lifecycle controllers

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Check whether a path exists (dangling symlinks count as existing)
pub async fn path_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Create a directory and its parents if it does not exist yet
pub async fn create_dir_recursive(path: &Path, mode: u32) -> io::Result<()> {
    if path_exists(path).await {
        return Ok(());
    }
    tokio::fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .await
}

/// Delete a file or a directory tree. A missing path is not an error.
pub async fn delete_recursive(path: &Path) -> io::Result<()> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

pub async fn read_file_bytes(path: &Path) -> io::Result<Vec<u8>> {
    tokio::fs::read(path).await
}

/// Write `contents` to `path`, replacing any previous file, then apply `mode`
pub async fn write_file(path: &Path, contents: &str, mode: u32) -> io::Result<()> {
    tokio::fs::write(path, contents).await?;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sysguard-fs-{}-{}", std::process::id(), tag));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_create_and_delete_tree() {
        let dir = scratch("tree");
        let nested = dir.join("a/b/c");

        assert!(!path_exists(&nested).await);
        create_dir_recursive(&nested, 0o755).await.unwrap();
        assert!(path_exists(&nested).await);

        // Creating again is a no-op
        create_dir_recursive(&nested, 0o755).await.unwrap();

        write_file(&nested.join("f.txt"), "x", 0o644).await.unwrap();
        delete_recursive(&dir).await.unwrap();
        assert!(!path_exists(&dir).await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = scratch("missing");
        delete_recursive(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_file_sets_mode_and_overwrites() {
        let dir = scratch("mode");
        create_dir_recursive(&dir, 0o755).await.unwrap();
        let path = dir.join("script");

        write_file(&path, "first version, longer", 0o755).await.unwrap();
        write_file(&path, "second", 0o755).await.unwrap();

        assert_eq!(read_file_bytes(&path).await.unwrap(), b"second");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        delete_recursive(&dir).await.unwrap();
    }
}
