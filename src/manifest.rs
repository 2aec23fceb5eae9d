//! Bundle manifest and file-type classification.
//!
//! The manifest maps each emitted file name (relative to the output
//! directory) to its metadata. Iteration order is the order the bundler
//! reported, which keeps the injected markup deterministic.

use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// A single emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: String,
    pub is_entry: bool,
}

/// Per-file metadata as it appears in a manifest document. Bundlers emit
/// many more fields than `isEntry`; they are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryMeta {
    #[serde(default)]
    is_entry: bool,
}

/// Ordered, key-unique collection of emitted files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleManifest {
    entries: Vec<ManifestEntry>,
}

impl BundleManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a file. An existing key keeps its position.
    pub fn insert(&mut self, file_name: impl Into<String>, is_entry: bool) {
        let file_name = file_name.into();
        match self.entries.iter_mut().find(|e| e.file_name == file_name) {
            Some(entry) => entry.is_entry = is_entry,
            None => self.entries.push(ManifestEntry {
                file_name,
                is_entry,
            }),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, file_name: impl Into<String>, is_entry: bool) -> Self {
        self.insert(file_name, is_entry);
        self
    }

    pub fn get(&self, file_name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.file_name == file_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.file_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a BundleManifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for BundleManifest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = BundleManifest;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of emitted file names to entry metadata")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut manifest = BundleManifest::new();
                while let Some(file_name) = map.next_key::<String>()? {
                    let meta: Option<EntryMeta> = map.next_value()?;
                    manifest.insert(file_name, meta.unwrap_or_default().is_entry);
                }
                Ok(manifest)
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Manifest keys partitioned by asset type, manifest order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedAssets<'a> {
    pub styles: Vec<&'a str>,
    pub scripts: Vec<&'a str>,
}

/// Split manifest keys into `.css` and `.js` files. Everything else
/// (source maps, images, ...) is left out.
pub fn classify(manifest: &BundleManifest) -> ClassifiedAssets<'_> {
    let mut assets = ClassifiedAssets::default();
    for name in manifest.file_names() {
        match extension(name) {
            Some("css") => assets.styles.push(name),
            Some("js") => assets.scripts.push(name),
            _ => {}
        }
    }
    assets
}

fn extension(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|e| e.to_str())
}

/// Keys flagged as entry points, in manifest order.
pub fn entry_points(manifest: &BundleManifest) -> Vec<&str> {
    manifest
        .iter()
        .filter(|e| e.is_entry)
        .map(|e| e.file_name.as_str())
        .collect()
}
