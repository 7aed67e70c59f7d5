//! Incremental publishing.
//!
//! A tag is skipped when all of its expected outputs exist, every source file
//! it reads is older than the newest of those outputs, and the configuration
//! fingerprint recorded at the last publish is unchanged. Any missing
//! timestamp forces regeneration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use pbrbake_spec::MaterialProperties;

use crate::io::{InputReader, OutputWriter};

/// Directory (relative to the output root) holding publish manifests.
pub const MANIFEST_DIR: &str = ".pbrbake";

/// Record of the last successful publish of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishManifest {
    pub material: String,
    pub fingerprint: String,
    pub files: Vec<PathBuf>,
}

/// Manifest location for a material.
pub fn manifest_path(material: &MaterialProperties) -> PathBuf {
    let mut path = PathBuf::from(MANIFEST_DIR);
    if let Some(dir) = &material.local_path {
        path.push(dir);
    }
    path.push(format!("{}.json", material.name));
    path
}

/// Read a manifest back; unreadable or malformed manifests count as missing.
pub fn read_manifest(writer: &dyn OutputWriter, path: &Path) -> Option<PublishManifest> {
    match writer.read(path) {
        Ok(Some(data)) => match serde_json::from_slice(&data) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!("ignoring malformed manifest {}: {}", path.display(), e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            debug!("cannot read manifest {}: {}", path.display(), e);
            None
        }
    }
}

/// Timestamp comparison for one tag.
pub fn is_up_to_date(
    reader: &dyn InputReader,
    writer: &dyn OutputWriter,
    sources: &BTreeSet<PathBuf>,
    outputs: &[PathBuf],
) -> bool {
    if outputs.is_empty() {
        return false;
    }
    let mut newest = None;
    for output in outputs {
        match writer.write_time(output) {
            Some(time) => newest = newest.max(Some(time)),
            None => return false,
        }
    }
    let Some(newest) = newest else {
        return false;
    };
    sources
        .iter()
        .all(|source| matches!(reader.write_time(source), Some(time) if time < newest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    use tempfile::tempdir;

    use crate::io::{write_file, LocalInputReader, LocalOutputWriter};

    fn age(path: &Path, by: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_manifest_path() {
        let material = MaterialProperties::new("stone", "blocks");
        assert_eq!(
            manifest_path(&material),
            PathBuf::from(".pbrbake/blocks/stone.json")
        );
    }

    #[test]
    fn test_manifest_round_trip_through_writer() {
        let out = tempdir().unwrap();
        let writer = LocalOutputWriter::new(out.path());
        let path = PathBuf::from(".pbrbake/stone.json");
        assert_eq!(read_manifest(&writer, &path), None);

        let manifest = PublishManifest {
            material: "stone".to_string(),
            fingerprint: "abc".to_string(),
            files: vec![PathBuf::from("stone.png")],
        };
        write_file(&writer, &path, &serde_json::to_vec(&manifest).unwrap()).unwrap();
        assert_eq!(read_manifest(&writer, &path), Some(manifest));

        write_file(&writer, &path, b"not json").unwrap();
        assert_eq!(read_manifest(&writer, &path), None);
    }

    #[test]
    fn test_timestamps() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(src.path().join("height.png"), b"h").unwrap();
        fs::write(out.path().join("stone_n.png"), b"n").unwrap();
        age(&src.path().join("height.png"), Duration::from_secs(3600));

        let reader = LocalInputReader::new(src.path());
        let writer = LocalOutputWriter::new(out.path());
        let sources: BTreeSet<PathBuf> = [PathBuf::from("height.png")].into_iter().collect();
        let outputs = vec![PathBuf::from("stone_n.png")];
        assert!(is_up_to_date(&reader, &writer, &sources, &outputs));

        // Missing output.
        let missing = vec![PathBuf::from("stone_n.png"), PathBuf::from("stone_s.png")];
        assert!(!is_up_to_date(&reader, &writer, &sources, &missing));

        // Missing source timestamp.
        let gone: BTreeSet<PathBuf> = [PathBuf::from("gone.png")].into_iter().collect();
        assert!(!is_up_to_date(&reader, &writer, &gone, &outputs));

        // Source newer than the output.
        age(&out.path().join("stone_n.png"), Duration::from_secs(7200));
        assert!(!is_up_to_date(&reader, &writer, &sources, &outputs));
    }
}
