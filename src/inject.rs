//! Injection pipeline.
//!
//! 1. Resolve the target location and asset prefix
//! 2. Classify manifest keys into styles and scripts
//! 3. Render markup (reading scripts back from disk when embedding)
//! 4. Compose the template and write it
//!
//! The template read and the inline reads are independent and run under a
//! single join. Nothing touches the target path until the whole document
//! exists in memory.

use std::path::Path;

use tracing::{debug, info};

use crate::compose::{compose_document, read_template, write_document};
use crate::manifest::classify;
use crate::markup::{render_scripts, render_styles, ScriptContext};
use crate::paths::resolve_paths;
use crate::{BuildOutputConfig, BundleManifest, InjectError, InjectionOptions};

/// Run the full pipeline for one build.
pub async fn execute_injection(
    options: &InjectionOptions,
    output: &BuildOutputConfig,
    manifest: &BundleManifest,
) -> Result<(), InjectError> {
    options.validate()?;
    let output_dir = output.output_dir()?;

    let resolved = resolve_paths(
        options.template.as_deref(),
        options.target.as_deref(),
        &output_dir,
    )?;
    debug!(
        target_dir = %resolved.target_dir.display(),
        file = %resolved.target_file_name.to_string_lossy(),
        asset_prefix = %resolved.asset_path_prefix,
        "resolved target"
    );

    let assets = classify(manifest);
    debug!(
        styles = assets.styles.len(),
        scripts = assets.scripts.len(),
        "classified manifest"
    );

    let prefix = options.prefix();
    let styles = render_styles(&assets.styles, prefix);
    let ctx = ScriptContext {
        prefix,
        asset_path_prefix: &resolved.asset_path_prefix,
        attrs: &options.attrs,
        output_dir: &output_dir,
    };

    let target_path = resolved.target_path();
    let (template, scripts) = tokio::try_join!(
        load_template(options.template.as_deref(), &target_path),
        render_scripts(&assets.scripts, &ctx, options.embed_content),
    )?;

    let document = compose_document(
        &template,
        options.replace_vars.as_ref(),
        &styles,
        &scripts,
    );

    let target_path = resolved.target_path();
    write_document(&target_path, &document).await?;
    info!(
        path = %target_path.display(),
        styles = styles.len(),
        scripts = scripts.len(),
        embedded = options.embed_content,
        "wrote html"
    );

    Ok(())
}

/// A target without a template has nothing to read; the error names the
/// target it was meant to produce.
async fn load_template(template: Option<&Path>, target: &Path) -> Result<String, InjectError> {
    match template {
        Some(path) => read_template(path).await,
        None => Err(InjectError::TemplateRead {
            path: target.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no template configured for this target",
            ),
        }),
    }
}
