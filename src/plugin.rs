//! HtmlTemplatePlugin - bundler-facing adapter.
//!
//! Holds the injection options fixed at construction and exposes the
//! `write_bundle` hook. The host invokes the hook once, after every output
//! file has been written.

use std::path::PathBuf;

use crate::{inject, BuildOutputConfig, BundleManifest, InjectError, InjectionOptions, ReplaceVars};

/// The HTML template plugin.
#[derive(Debug, Clone, Default)]
pub struct HtmlTemplatePlugin {
    options: InjectionOptions,
}

impl HtmlTemplatePlugin {
    pub const NAME: &'static str = "html-template";

    pub fn new(options: InjectionOptions) -> Self {
        Self { options }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.options.template = Some(template.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.options.target = Some(target.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = Some(prefix.into());
        self
    }

    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.options.attrs.push(attr.into());
        self
    }

    pub fn with_embed_content(mut self, embed: bool) -> Self {
        self.options.embed_content = embed;
        self
    }

    pub fn with_replace_var(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.options
            .replace_vars
            .get_or_insert_with(ReplaceVars::new)
            .insert(pattern, replacement);
        self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn options(&self) -> &InjectionOptions {
        &self.options
    }

    /// Post-write hook. Must not run before the bundle is flushed to disk.
    pub async fn write_bundle(
        &self,
        output: &BuildOutputConfig,
        manifest: &BundleManifest,
    ) -> Result<(), InjectError> {
        inject::execute_injection(&self.options, output, manifest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_options() {
        let plugin = HtmlTemplatePlugin::default()
            .with_template("src/main.html")
            .with_target("dist/index.html")
            .with_prefix("/s/")
            .with_attr("defer")
            .with_attr("nomodule")
            .with_embed_content(true)
            .with_replace_var("{{A}}", "1")
            .with_replace_var("{{B}}", "2");

        let opts = plugin.options();
        assert_eq!(plugin.name(), "html-template");
        assert_eq!(opts.template, Some(PathBuf::from("src/main.html")));
        assert_eq!(opts.prefix(), "/s/");
        assert_eq!(opts.attrs, vec!["defer", "nomodule"]);
        assert!(opts.embed_content);
        assert_eq!(opts.replace_vars.as_ref().map(ReplaceVars::len), Some(2));
    }

    #[tokio::test]
    async fn hook_rejects_missing_template_and_target() {
        let plugin = HtmlTemplatePlugin::default();
        let err = plugin
            .write_bundle(&BuildOutputConfig::from_dir("dist"), &BundleManifest::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InjectError::Configuration(_)));
    }
}
