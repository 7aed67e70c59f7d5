//! File access collaborators.
//!
//! The graph builder only talks to [`InputReader`] and [`OutputWriter`], so it
//! can run against a resource-pack directory, an archive or an in-memory
//! store. Paths are relative to the reader's or writer's root.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

/// Read side of a resource pack.
pub trait InputReader: Send + Sync {
    fn file_exists(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Files in `dir` whose names match a glob `pattern`.
    fn enumerate_files(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;

    /// Directories in `dir` whose names match a glob `pattern`.
    fn enumerate_directories(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;

    /// Last modification time, or `None` when unknown.
    fn write_time(&self, path: &Path) -> Option<SystemTime>;

    /// Read a whole file.
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.open(path)?.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// A pending output file.
///
/// Bytes only become visible at `path` after [`OutputSink::commit`]; dropping
/// an uncommitted sink discards them.
pub trait OutputSink: Write + Send {
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Write side of a resource pack.
pub trait OutputWriter: Send + Sync {
    /// Create `dir` and its parents.
    fn prepare_directory(&self, dir: &Path) -> io::Result<()>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn OutputSink>>;

    /// Last modification time of a published file, or `None` when unknown.
    fn write_time(&self, path: &Path) -> Option<SystemTime>;

    /// Read back a published file; writers that cannot do so return `Ok(None)`.
    fn read(&self, _path: &Path) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Write `data` to `path` and commit it.
pub fn write_file(writer: &dyn OutputWriter, path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            writer.prepare_directory(parent)?;
        }
    }
    let mut sink = writer.open(path)?;
    sink.write_all(data)?;
    sink.flush()?;
    sink.commit()
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn glob_entries(root: &Path, dir: &Path, pattern: &str, dirs: bool) -> io::Result<Vec<PathBuf>> {
    let full = root.join(dir).join(pattern);
    let full = full.to_string_lossy();
    let entries =
        glob::glob(&full).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_dir() != dirs {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        paths.push(relative);
    }
    paths.sort();
    Ok(paths)
}

/// Reads from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalInputReader {
    root: PathBuf,
}

impl LocalInputReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl InputReader for LocalInputReader {
    fn file_exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(self.root.join(path))?))
    }

    fn enumerate_files(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        glob_entries(&self.root, dir, pattern, false)
    }

    fn enumerate_directories(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        glob_entries(&self.root, dir, pattern, true)
    }

    fn write_time(&self, path: &Path) -> Option<SystemTime> {
        modified(&self.root.join(path))
    }
}

/// Writes into a directory on disk through temporary files that are renamed
/// into place on commit.
#[derive(Debug, Clone)]
pub struct LocalOutputWriter {
    root: PathBuf,
}

impl LocalOutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

struct LocalSink {
    file: NamedTempFile,
    target: PathBuf,
}

impl Write for LocalSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl OutputSink for LocalSink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let LocalSink { file, target } = *self;
        file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl OutputWriter for LocalOutputWriter {
    fn prepare_directory(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(self.root.join(dir))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn OutputSink>> {
        let target = self.root.join(path);
        let parent = match target.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.root.clone(),
        };
        fs::create_dir_all(&parent)?;
        let file = NamedTempFile::new_in(&parent)?;
        Ok(Box::new(LocalSink { file, target }))
    }

    fn write_time(&self, path: &Path) -> Option<SystemTime> {
        modified(&self.root.join(path))
    }

    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sink_is_invisible_until_commit() {
        let dir = tempdir().unwrap();
        let writer = LocalOutputWriter::new(dir.path());
        let path = Path::new("stone/color.png");

        let mut sink = writer.open(path).unwrap();
        sink.write_all(b"abc").unwrap();
        assert!(!dir.path().join(path).exists());
        sink.commit().unwrap();
        assert_eq!(fs::read(dir.path().join(path)).unwrap(), b"abc");
        assert!(writer.write_time(path).is_some());
        assert_eq!(writer.read(path).unwrap(), Some(b"abc".to_vec()));
        assert_eq!(writer.read(Path::new("missing.png")).unwrap(), None);
    }

    #[test]
    fn test_dropped_sink_leaves_nothing() {
        let dir = tempdir().unwrap();
        let writer = LocalOutputWriter::new(dir.path());
        {
            let mut sink = writer.open(Path::new("a/b.png")).unwrap();
            sink.write_all(b"partial").unwrap();
        }
        assert!(!dir.path().join("a/b.png").exists());
        assert_eq!(fs::read_dir(dir.path().join("a")).unwrap().count(), 0);
    }

    #[test]
    fn test_reader_enumeration() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blocks/stone")).unwrap();
        fs::create_dir_all(dir.path().join("blocks/dirt")).unwrap();
        fs::write(dir.path().join("blocks/stone/color.png"), b"x").unwrap();
        fs::write(dir.path().join("blocks/stone/normal.png"), b"y").unwrap();
        fs::write(dir.path().join("blocks/stone/notes.txt"), b"z").unwrap();

        let reader = LocalInputReader::new(dir.path());
        let files = reader
            .enumerate_files(Path::new("blocks/stone"), "*.png")
            .unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("blocks/stone/color.png"),
                PathBuf::from("blocks/stone/normal.png"),
            ]
        );
        let dirs = reader
            .enumerate_directories(Path::new("blocks"), "*")
            .unwrap();
        assert_eq!(
            dirs,
            vec![PathBuf::from("blocks/dirt"), PathBuf::from("blocks/stone")]
        );

        assert!(reader.file_exists(Path::new("blocks/stone/color.png")));
        assert!(!reader.file_exists(Path::new("blocks/stone")));
        assert_eq!(
            reader.read_all(Path::new("blocks/stone/normal.png")).unwrap(),
            b"y"
        );
    }
}
