use std::io::Write;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;

/// Replaces `path` with `bytes` so readers see either the old or the new
/// document, never a truncated one.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = AtomicWriteFile::options().open(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_existing_content() {
        let dir = std::env::temp_dir().join(format!("dramarr-persist-{}", std::process::id()));
        let path = dir.join("nested").join("db.json");

        write_atomically(&path, b"[1,2,3]").unwrap();
        write_atomically(&path, b"[]").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"[]");
        std::fs::remove_dir_all(&dir).ok();
    }
}
