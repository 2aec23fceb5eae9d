//! Template composition.
//!
//! Each step takes the previous step's text and returns a new string:
//! variable substitution, then style markup before the last `</head>`,
//! then script markup before the last `</body>`.

use std::path::Path;

use tracing::warn;

use crate::markup::RenderedAsset;
use crate::{InjectError, ReplaceVars};

pub const HEAD_CLOSE_TAG: &str = "</head>";
pub const BODY_CLOSE_TAG: &str = "</body>";

/// Apply every `(pattern, replacement)` pair in order, each over the
/// result of the previous one. Patterns match literally.
pub fn apply_replacements(text: &str, vars: &ReplaceVars) -> String {
    vars.iter()
        .filter(|(pattern, _)| !pattern.is_empty())
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}

/// Insert `fragments` right before the last occurrence of `tag`.
///
/// Returns `None` when the tag is absent; the text is left untouched.
pub fn splice_before_last(text: &str, tag: &str, fragments: &[RenderedAsset]) -> Option<String> {
    let at = text.rfind(tag)?;
    let inserted: usize = fragments.iter().map(|f| f.markup.len()).sum();

    let mut out = String::with_capacity(text.len() + inserted);
    out.push_str(&text[..at]);
    for fragment in fragments {
        out.push_str(&fragment.markup);
    }
    out.push_str(&text[at..]);
    Some(out)
}

fn splice_or_keep(text: String, tag: &str, fragments: &[RenderedAsset]) -> String {
    if fragments.is_empty() {
        return text;
    }
    match splice_before_last(&text, tag, fragments) {
        Some(spliced) => spliced,
        None => {
            warn!(tag, dropped = fragments.len(), "closing tag not found, markup dropped");
            text
        }
    }
}

/// Build the final document in memory.
pub fn compose_document(
    template: &str,
    vars: Option<&ReplaceVars>,
    styles: &[RenderedAsset],
    scripts: &[RenderedAsset],
) -> String {
    let text = match vars {
        Some(vars) => apply_replacements(template, vars),
        None => template.to_string(),
    };
    let text = splice_or_keep(text, HEAD_CLOSE_TAG, styles);
    splice_or_keep(text, BODY_CLOSE_TAG, scripts)
}

/// Read the template and decode it as UTF-8.
pub async fn read_template(path: &Path) -> Result<String, InjectError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| InjectError::template_read(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the document, creating missing parent directories. Overwrites.
pub async fn write_document(path: &Path, contents: &str) -> Result<(), InjectError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InjectError::write(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| InjectError::write(path, e))
}
