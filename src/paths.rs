//! Path resolution for the generated HTML file.
//!
//! Works out where the document goes, what it is called, and how asset
//! URLs inside it reach back to the bundle output directory.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::{InjectError, INVALID_ARGS_ERROR};

const HTML_SUFFIX: &str = ".html";

/// Result of resolving the template/target pair against the output dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Directory the HTML file is written to.
    pub target_dir: PathBuf,
    /// File name, always ending in `.html`.
    pub target_file_name: OsString,
    /// Relative URL segment from `target_dir` to the output dir. Empty or
    /// ending with `/`.
    pub asset_path_prefix: String,
}

impl ResolvedPaths {
    pub fn target_path(&self) -> PathBuf {
        self.target_dir.join(&self.target_file_name)
    }
}

/// Resolve the target location and asset prefix.
pub fn resolve_paths(
    template: Option<&Path>,
    target: Option<&Path>,
    output_dir: &Path,
) -> Result<ResolvedPaths, InjectError> {
    let source = target
        .or(template)
        .ok_or_else(|| InjectError::Configuration(INVALID_ARGS_ERROR.into()))?;

    let target_file_name = html_file_name(source);

    let target_parent = target.and_then(Path::parent).filter(|p| !is_current_dir(p));
    let (target_dir, asset_path_prefix) = match target_parent {
        Some(dir) => {
            let rel = relative_path(dir, output_dir);
            let prefix = if rel.is_empty() {
                String::new()
            } else {
                format!("{rel}/")
            };
            (dir.to_path_buf(), prefix)
        }
        None => (output_dir.to_path_buf(), String::new()),
    };

    Ok(ResolvedPaths {
        target_dir,
        target_file_name,
        asset_path_prefix,
    })
}

/// Base name of `path`, with `.html` appended when missing. Non-UTF-8
/// names are kept byte for byte.
pub fn html_file_name(path: &Path) -> OsString {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    if !name.as_encoded_bytes().ends_with(HTML_SUFFIX.as_bytes()) {
        name.push(HTML_SUFFIX);
    }
    name
}

fn is_current_dir(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::CurDir))
}

/// Relative path from directory `from` to directory `to`, `/`-joined.
///
/// Relative inputs are resolved against the process working directory
/// first, so a leading `..` climbs past real directories. Returns an empty
/// string when both point at the same place.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(&anchor(from));
    let to = normalize(&anchor(to));

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat("..".to_string()).take(from.len() - common);
    let downs = to[common..].iter().cloned();
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

fn anchor(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Lexical normalization into string segments. A root or prefix component
/// is kept as its own leading segment so absolute paths only share a
/// prefix with paths on the same root.
fn normalize(path: &Path) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match segments.last().map(String::as_str) {
                Some("..") | None => segments.push("..".into()),
                Some(last) if is_root_segment(last) => {}
                Some(_) => {
                    segments.pop();
                }
            },
            Component::RootDir => segments.push("/".into()),
            Component::Prefix(prefix) => {
                segments.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
        }
    }
    segments
}

fn is_root_segment(segment: &str) -> bool {
    segment == "/" || segment.ends_with(':')
}
