//! Publishing many materials.
//!
//! Materials share no mutable state, so they are processed in parallel. A
//! fatal error in one material is recorded and never stops its siblings.

use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use pbrbake_spec::{BackendError, MaterialProperties, PackProfile, SpecError};

use crate::cancel::CancellationToken;
use crate::error::PublishError;
use crate::graph::{PublishSummary, TextureGraphBuilder, TextureGraphContext};
use crate::io::{InputReader, OutputWriter};
use crate::naming::{DefaultNaming, NamingResolver};
use crate::region::{DefaultRegionEnumerator, RegionEnumerator};

/// A material that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMaterial {
    pub material: String,
    /// Stable `PUBLISH_0xx` code.
    pub code: String,
    pub message: String,
    /// Raised before any pixel work.
    pub configuration: bool,
}

impl FailedMaterial {
    fn from_error(err: &PublishError) -> Self {
        Self {
            material: err.material().to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
            configuration: err.is_configuration(),
        }
    }
}

/// Outcome of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub published: Vec<PublishSummary>,
    pub failed: Vec<FailedMaterial>,
    pub cancelled: Vec<String>,
}

impl BatchReport {
    /// Returns true when no material failed or was cancelled.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// Total number of files written.
    pub fn files_written(&self) -> usize {
        self.published.iter().map(|s| s.written.len()).sum()
    }
}

enum Outcome {
    Published(PublishSummary),
    Failed(FailedMaterial),
    Cancelled(String),
}

/// Publishes a list of materials with one profile.
pub struct BatchPublisher<'a> {
    reader: &'a dyn InputReader,
    writer: &'a dyn OutputWriter,
    profile: PackProfile,
    naming: &'a dyn NamingResolver,
    regions: &'a dyn RegionEnumerator,
    cancel: CancellationToken,
    force: bool,
    import: bool,
}

impl<'a> BatchPublisher<'a> {
    pub fn new(
        reader: &'a dyn InputReader,
        writer: &'a dyn OutputWriter,
        profile: PackProfile,
    ) -> Self {
        Self {
            reader,
            writer,
            profile,
            naming: &DefaultNaming,
            regions: &DefaultRegionEnumerator,
            cancel: CancellationToken::new(),
            force: false,
            import: false,
        }
    }

    pub fn with_naming(mut self, naming: &'a dyn NamingResolver) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_regions(mut self, regions: &'a dyn RegionEnumerator) -> Self {
        self.regions = regions;
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Convert a published pack back into per-material folders.
    pub fn with_import(mut self, import: bool) -> Self {
        self.import = import;
        self
    }

    /// Token that cancels the batch.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Publish every material.
    pub fn publish_all(&self, materials: &[MaterialProperties]) -> BatchReport {
        let outcomes: Vec<Outcome> = materials
            .par_iter()
            .map(|material| self.publish_one(material))
            .collect();

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Published(summary) => report.published.push(summary),
                Outcome::Failed(failed) => report.failed.push(failed),
                Outcome::Cancelled(name) => report.cancelled.push(name),
            }
        }
        info!(
            "published {} material(s), {} file(s); {} failed, {} cancelled",
            report.published.len(),
            report.files_written(),
            report.failed.len(),
            report.cancelled.len()
        );
        report
    }

    fn publish_one(&self, material: &MaterialProperties) -> Outcome {
        if self.cancel.is_cancelled() {
            return Outcome::Cancelled(material.name.clone());
        }

        let builder = TextureGraphBuilder::new(self.reader, self.writer)
            .with_naming(self.naming)
            .with_regions(self.regions)
            .with_cancellation(self.cancel.clone())
            .with_force(self.force);

        let ctx = if self.import {
            TextureGraphContext::for_import(material.clone(), self.profile.clone())
        } else {
            TextureGraphContext::new(material.clone(), self.profile.clone())
        };
        match ctx.and_then(|mut ctx| builder.publish(&mut ctx)) {
            Ok(summary) => Outcome::Published(summary),
            Err(err) if !err.is_fatal() => Outcome::Cancelled(err.material().to_string()),
            Err(err) => {
                error!("{}", err);
                Outcome::Failed(FailedMaterial::from_error(&err))
            }
        }
    }
}

/// Material documents found by [`discover_materials`].
#[derive(Debug, Default)]
pub struct Discovery {
    pub materials: Vec<MaterialProperties>,
    /// Documents that could not be parsed.
    pub invalid: Vec<(PathBuf, SpecError)>,
}

/// Load every material document in `dir` matching a glob `pattern`
/// (`*/material.yml`, `**/*.mat.json`, ...).
///
/// A document without a name is named after its file, or after its folder
/// when the file is called `material`; without a local path it uses its
/// folder.
pub fn discover_materials(
    reader: &dyn InputReader,
    dir: &Path,
    pattern: &str,
) -> io::Result<Discovery> {
    let mut discovery = Discovery::default();
    for path in reader.enumerate_files(dir, pattern)? {
        let data = reader.read_all(&path)?;
        let text = String::from_utf8(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => MaterialProperties::from_json_str(&text),
            _ => MaterialProperties::from_yaml_str(&text),
        };
        match parsed {
            Ok(material) => discovery.materials.push(with_defaults(material, &path)),
            Err(err) => {
                warn!("ignoring material document {}: {}", path.display(), err);
                discovery.invalid.push((path, err));
            }
        }
    }
    Ok(discovery)
}

fn with_defaults(mut material: MaterialProperties, document: &Path) -> MaterialProperties {
    let folder = document.parent().filter(|p| !p.as_os_str().is_empty());
    if material.name.is_empty() {
        let stem = document
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.split('.').next().unwrap_or(s));
        let folder_name = folder.and_then(|f| f.file_name()).and_then(|f| f.to_str());
        material.name = match (stem, folder_name) {
            (Some("material"), Some(folder)) => folder.to_string(),
            (Some(stem), _) => stem.to_string(),
            (None, _) => String::new(),
        };
    }
    if material.local_path.is_none() {
        material.local_path = folder.map(Path::to_path_buf);
    }
    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::tempdir;

    use crate::io::{LocalInputReader, LocalOutputWriter};

    #[test]
    fn test_discover_defaults() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("stone")).unwrap();
        fs::create_dir_all(dir.path().join("brick")).unwrap();
        fs::write(dir.path().join("stone/material.yml"), "wrap: true\n").unwrap();
        fs::write(
            dir.path().join("brick/material.yml"),
            "name: red-brick\nlocal-path: bricks\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.mat.yml"), "wrap: [").unwrap();

        let reader = LocalInputReader::new(dir.path());
        let found = discover_materials(&reader, Path::new(""), "*/material.yml").unwrap();
        assert_eq!(found.materials.len(), 2);
        assert_eq!(found.materials[0].name, "red-brick");
        assert_eq!(found.materials[0].local_path, Some(PathBuf::from("bricks")));
        assert_eq!(found.materials[1].name, "stone");
        assert_eq!(found.materials[1].local_path, Some(PathBuf::from("stone")));
        assert_eq!(found.materials[1].wrap, Some(true));

        let found = discover_materials(&reader, Path::new(""), "*.mat.yml").unwrap();
        assert!(found.materials.is_empty());
        assert_eq!(found.invalid.len(), 1);
    }

    #[test]
    fn test_cancelled_batch_touches_nothing() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let reader = LocalInputReader::new(src.path());
        let writer = LocalOutputWriter::new(out.path());

        let publisher = BatchPublisher::new(&reader, &writer, PackProfile::default());
        publisher.cancellation().cancel();
        let report = publisher.publish_all(&[
            MaterialProperties::new("a", "a"),
            MaterialProperties::new("b", "b"),
        ]);
        assert_eq!(report.cancelled, vec!["a".to_string(), "b".to_string()]);
        assert!(!report.is_success());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_encoding_fails_only_that_material() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let reader = LocalInputReader::new(src.path());
        let writer = LocalOutputWriter::new(out.path());

        let mut bad = MaterialProperties::new("bad", "bad");
        bad.input = Some(pbrbake_spec::InputEncoding {
            format: Some("nope".to_string()),
            ..Default::default()
        });
        let report = BatchPublisher::new(&reader, &writer, PackProfile::default())
            .publish_all(&[bad, MaterialProperties::new("empty", "empty")]);

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].material, "bad");
        assert_eq!(report.failed[0].code, "PUBLISH_001");
        assert!(report.failed[0].configuration);
        assert_eq!(report.published.len(), 1);
        assert!(report.published[0].written.is_empty());
    }
}
