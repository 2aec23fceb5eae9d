//! Markup rendering for style and script assets.
//!
//! Styles always become `<link>` tags. Scripts become `<script src>` tags,
//! or, with content embedding on, `<script>` tags carrying the file body
//! read back from the bundle output directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use futures::future::try_join_all;
use tracing::debug;

use crate::InjectError;

/// One rendered tag, tied to the manifest key it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAsset {
    pub original_file_name: String,
    pub markup: String,
}

/// Inputs shared by every rendered script tag.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    /// Caller-supplied URL prefix.
    pub prefix: &'a str,
    /// Relative segment from the target directory to the output directory.
    pub asset_path_prefix: &'a str,
    /// Attribute tokens, emitted verbatim.
    pub attrs: &'a [String],
    /// Where the bundler wrote its files. Inlined bodies are read from here.
    pub output_dir: &'a Path,
}

/// `<link>` tags for every style file. Only the caller prefix is applied.
pub fn render_styles(styles: &[&str], prefix: &str) -> Vec<RenderedAsset> {
    styles
        .iter()
        .map(|name| RenderedAsset {
            original_file_name: name.to_string(),
            markup: format!(r#"<link rel="stylesheet" type="text/css" href="{prefix}{name}">"#)
                + "\n",
        })
        .collect()
}

/// `<script src>` tags for every script file.
pub fn render_script_refs(scripts: &[&str], ctx: &ScriptContext<'_>) -> Vec<RenderedAsset> {
    let attrs = attr_list(ctx.attrs);
    scripts
        .iter()
        .map(|name| RenderedAsset {
            original_file_name: name.to_string(),
            markup: format!(
                r#"<script{attrs} src="{}{}{name}"></script>"#,
                ctx.asset_path_prefix, ctx.prefix
            ) + "\n",
        })
        .collect()
}

/// Inline `<script>` tags. Every file is read concurrently; a single
/// failed read fails the whole batch.
pub async fn render_script_inline(
    scripts: &[&str],
    ctx: &ScriptContext<'_>,
) -> Result<Vec<RenderedAsset>, InjectError> {
    let attrs = attr_list(ctx.attrs);

    let reads = scripts.iter().map(|name| {
        let path = inline_source_path(ctx.output_dir, ctx.prefix, name);
        async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| InjectError::asset_read(&path, e))?;
            debug!(path = %path.display(), bytes = bytes.len(), "read script for inlining");
            Ok::<_, InjectError>((name, bytes))
        }
    });
    let bodies = try_join_all(reads).await?;

    Ok(bodies
        .into_iter()
        .map(|(name, bytes)| {
            let body = String::from_utf8_lossy(&bytes);
            RenderedAsset {
                original_file_name: name.to_string(),
                markup: format!("<script{attrs}>{}</script>\n", body.trim()),
            }
        })
        .collect())
}

/// Render scripts in whichever mode `embed` selects.
pub async fn render_scripts(
    scripts: &[&str],
    ctx: &ScriptContext<'_>,
    embed: bool,
) -> Result<Vec<RenderedAsset>, InjectError> {
    if embed {
        render_script_inline(scripts, ctx).await
    } else {
        Ok(render_script_refs(scripts, ctx))
    }
}

/// `output_dir` + separator + `prefix` + `name`, concatenated literally so
/// a prefix starting with `/` does not reset the path to the root.
pub fn inline_source_path(output_dir: &Path, prefix: &str, name: &str) -> PathBuf {
    let mut raw = OsString::from(output_dir.as_os_str());
    raw.push(MAIN_SEPARATOR_STR);
    raw.push(prefix);
    raw.push(name);
    PathBuf::from(raw)
}

fn attr_list(attrs: &[String]) -> String {
    attrs.iter().map(|a| format!(" {a}")).collect()
}
