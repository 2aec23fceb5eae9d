use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use html_template::{BuildOutputConfig, BundleManifest, HtmlTemplatePlugin};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sha256_file(path: &Path) -> String {
    let bytes = fs::read(path).expect("Failed to read output");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

fn setup() -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(
        root.path().join("page.html"),
        "<html><head><title>%NAME%</title></head><body>%NAME%</body></html>",
    )
    .unwrap();
    fs::create_dir_all(root.path().join("dist")).unwrap();
    fs::write(root.path().join("dist/app.js"), "export const a = 1;\n").unwrap();
    fs::write(root.path().join("dist/lazy.js"), "export const b = 2;\n").unwrap();
    root
}

fn manifest() -> BundleManifest {
    BundleManifest::new()
        .with("app.js", true)
        .with("app.css", false)
        .with("lazy.js", false)
}

fn plugin(root: &Path, embed: bool) -> HtmlTemplatePlugin {
    HtmlTemplatePlugin::default()
        .with_template(root.join("page.html"))
        .with_target(root.join("out/nested/index"))
        .with_attr("defer")
        .with_embed_content(embed)
        .with_replace_var("%NAME%", "Demo")
}

// ============================================================================
// Re-running produces identical bytes
// ============================================================================

#[tokio::test]
async fn repeated_runs_are_byte_identical() {
    for embed in [false, true] {
        let root = setup();
        let output = BuildOutputConfig::from_dir(root.path().join("dist"));
        let target = root.path().join("out/nested/index.html");
        let plugin = plugin(root.path(), embed);

        plugin.write_bundle(&output, &manifest()).await.unwrap();
        let first = sha256_file(&target);

        plugin.write_bundle(&output, &manifest()).await.unwrap();
        let second = sha256_file(&target);

        assert_eq!(first, second, "Runs must produce identical bytes (embed={embed})");
    }
}

#[tokio::test]
async fn rerun_overwrites_instead_of_appending() {
    let root = setup();
    let output = BuildOutputConfig::from_dir(root.path().join("dist"));
    let target = root.path().join("out/nested/index.html");
    let plugin = plugin(root.path(), false);

    plugin.write_bundle(&output, &manifest()).await.unwrap();
    plugin.write_bundle(&output, &manifest()).await.unwrap();

    let html = fs::read_to_string(&target).unwrap();
    assert_eq!(html.matches("app.js").count(), 1);
    assert_eq!(html.matches("app.css").count(), 1);
    assert!(html.contains(r#"<script defer src="../../dist/lazy.js"></script>"#));
    assert!(html.contains("<title>Demo</title>"));
}

#[tokio::test]
async fn manifest_order_drives_tag_order() {
    let root = setup();
    let output = BuildOutputConfig::from_dir(root.path().join("dist"));
    let target = root.path().join("out/nested/index.html");

    let forward = manifest();
    let reversed = BundleManifest::new()
        .with("lazy.js", false)
        .with("app.css", false)
        .with("app.js", true);

    let plugin = plugin(root.path(), false);
    plugin.write_bundle(&output, &forward).await.unwrap();
    let html = fs::read_to_string(&target).unwrap();
    assert!(html.find("app.js").unwrap() < html.find("lazy.js").unwrap());

    plugin.write_bundle(&output, &reversed).await.unwrap();
    let html = fs::read_to_string(&target).unwrap();
    assert!(html.find("lazy.js").unwrap() < html.find("app.js").unwrap());
}
