//! # HTML Template Plugin
//!
//! Post-build hook for a module bundler. Takes the finished build manifest
//! and an HTML template, and writes the final document with `<link>` and
//! `<script>` references (or inlined script bodies) injected before the
//! closing `</head>` and `</body>` tags.
//!
//! The hook must run **after** every bundle file is on disk. Inlining reads
//! the emitted files back, so running it earlier would embed missing or
//! stale code.

pub mod compose;
pub mod inject;
pub mod manifest;
pub mod markup;
pub mod paths;
pub mod plugin;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use manifest::{entry_points, BundleManifest, ManifestEntry};
pub use plugin::HtmlTemplatePlugin;

/// Message carried by the configuration error raised when neither a
/// template nor a target was supplied.
pub const INVALID_ARGS_ERROR: &str =
    "[html-template] You did not provide a template or target!";

// ---------------------------------------------------------------------------
// Build Output Config
// ---------------------------------------------------------------------------

/// Where the bundler wrote its output. The bundler populates exactly one of
/// the two fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutputConfig {
    /// Output directory (`output.dir`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Single output file (`output.file`).
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl BuildOutputConfig {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            file: None,
        }
    }

    pub fn from_file(file: impl Into<PathBuf>) -> Self {
        Self {
            dir: None,
            file: Some(file.into()),
        }
    }

    /// Normalize to the single directory holding the bundle files.
    pub fn output_dir(&self) -> Result<PathBuf, InjectError> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        match &self.file {
            Some(file) => Ok(match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }),
            None => Err(InjectError::Configuration(
                "output config has neither a directory nor a file".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Replace Vars
// ---------------------------------------------------------------------------

/// Ordered `(pattern, replacement)` pairs applied to the template text.
///
/// Order matters: each pair runs over the output of the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceVars {
    pairs: Vec<(String, String)>,
}

impl ReplaceVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Re-inserting an existing pattern updates its
    /// replacement without moving it.
    pub fn insert(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let pattern = pattern.into();
        let replacement = replacement.into();
        match self.pairs.iter_mut().find(|(p, _)| *p == pattern) {
            Some(slot) => slot.1 = replacement,
            None => self.pairs.push((pattern, replacement)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(p, r)| (p.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<P, R> FromIterator<(P, R)> for ReplaceVars
where
    P: Into<String>,
    R: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, R)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (pattern, replacement) in iter {
            vars.insert(pattern, replacement);
        }
        vars
    }
}

impl<'de> Deserialize<'de> for ReplaceVars {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> serde::de::Visitor<'de> for PairsVisitor {
            type Value = ReplaceVars;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of pattern to replacement strings")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut vars = ReplaceVars::new();
                while let Some((pattern, replacement)) = map.next_entry::<String, String>()? {
                    vars.insert(pattern, replacement);
                }
                Ok(vars)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

// ---------------------------------------------------------------------------
// Injection Options
// ---------------------------------------------------------------------------

/// Options fixed when the plugin is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InjectionOptions {
    /// Source HTML. Also names the output file when `target` is absent.
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Destination HTML path, may include directories.
    #[serde(default)]
    pub target: Option<PathBuf>,
    /// Literal string prefixed to every asset URL.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Attribute tokens copied verbatim into every `<script>` tag.
    #[serde(default)]
    pub attrs: Vec<String>,
    /// Inline script bodies instead of referencing them via `src`.
    #[serde(default)]
    pub embed_content: bool,
    /// Literal substitutions applied to the template text.
    #[serde(default)]
    pub replace_vars: Option<ReplaceVars>,
}

impl InjectionOptions {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// The template/target pair must not be empty.
    pub fn validate(&self) -> Result<(), InjectError> {
        if self.template.is_none() && self.target.is_none() {
            return Err(InjectError::Configuration(INVALID_ARGS_ERROR.into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InjectError
// ---------------------------------------------------------------------------

/// Errors that abort the injection. No output file is written when any of
/// these is returned.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read template '{}': {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read asset '{}': {source}", .path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InjectError {
    pub(crate) fn template_read(path: &Path, source: std::io::Error) -> Self {
        Self::TemplateRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn asset_read(path: &Path, source: std::io::Error) -> Self {
        Self::AssetRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run one injection: resolve paths, classify the manifest, render markup,
/// compose the template and write the result.
///
/// Must be called after the bundler has flushed every output file.
pub async fn inject_template(
    options: &InjectionOptions,
    output: &BuildOutputConfig,
    manifest: &BundleManifest,
) -> Result<(), InjectError> {
    inject::execute_injection(options, output, manifest).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_prefers_dir() {
        let config = BuildOutputConfig {
            dir: Some("dist".into()),
            file: Some("other/bundle.js".into()),
        };
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("dist"));
    }

    #[test]
    fn output_dir_from_file_parent() {
        let config = BuildOutputConfig::from_file("build/js/bundle.js");
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("build/js"));
    }

    #[test]
    fn output_dir_from_bare_file_is_cwd() {
        let config = BuildOutputConfig::from_file("bundle.js");
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("."));
    }

    #[test]
    fn output_dir_missing_is_configuration_error() {
        let err = BuildOutputConfig::default().output_dir().unwrap_err();
        assert!(matches!(err, InjectError::Configuration(_)));
    }

    #[test]
    fn validate_requires_template_or_target() {
        let err = InjectionOptions::default().validate().unwrap_err();
        match err {
            InjectError::Configuration(msg) => assert_eq!(msg, INVALID_ARGS_ERROR),
            other => panic!("Expected Configuration, got {other:?}"),
        }

        let only_target = InjectionOptions {
            target: Some("out.html".into()),
            ..Default::default()
        };
        assert!(only_target.validate().is_ok());
    }

    #[test]
    fn options_deserialize_camel_case() {
        let json = r#"{
            "template": "src/main.html",
            "target": "dist/index.html",
            "prefix": "/static/",
            "attrs": ["defer", "type=\"module\""],
            "embedContent": true,
            "replaceVars": { "b": "c", "a": "b" }
        }"#;
        let options: InjectionOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.template, Some(PathBuf::from("src/main.html")));
        assert_eq!(options.prefix(), "/static/");
        assert_eq!(options.attrs, vec!["defer", "type=\"module\""]);
        assert!(options.embed_content);

        let pairs: Vec<_> = options.replace_vars.as_ref().unwrap().iter().collect();
        assert_eq!(pairs, vec![("b", "c"), ("a", "b")]);
    }

    #[test]
    fn options_reject_unknown_fields() {
        let json = r#"{ "template": "a.html", "inject": "head" }"#;
        assert!(serde_json::from_str::<InjectionOptions>(json).is_err());
    }

    #[test]
    fn replace_vars_reinsert_keeps_position() {
        let mut vars = ReplaceVars::new();
        vars.insert("x", "1");
        vars.insert("y", "2");
        vars.insert("x", "3");
        let pairs: Vec<_> = vars.iter().collect();
        assert_eq!(pairs, vec![("x", "3"), ("y", "2")]);
    }
}
