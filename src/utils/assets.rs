use crate::config::SiteConfig;
use crate::utils::log::Reporter;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    File,
    Directory,
}

pub struct StaticAsset {
    pub name: &'static str,
    pub kind: AssetKind,
}

/// The fixed set of static items published alongside the compiled posts.
pub const STATIC_ASSETS: &[StaticAsset] = &[
    StaticAsset { name: "assets", kind: AssetKind::Directory },
    StaticAsset { name: "index.html", kind: AssetKind::File },
    StaticAsset { name: "favicon.ico", kind: AssetKind::File },
    StaticAsset { name: "robots.txt", kind: AssetKind::File },
];

/// Copy the static asset list into the output root.
///
/// Best-effort: a missing item is a warning, a failed copy an error, and the
/// stage always runs through the whole list.
pub fn copy_assets(config: &SiteConfig, report: &mut Reporter) {
    report.section("copying static assets");

    let root = config.get_root();
    let output_root = config.output_path();

    for asset in STATIC_ASSETS {
        let source = root.join(asset.name);
        if !source.exists() {
            report.warning(&format!("`{}` not found, skipped", asset.name));
            continue;
        }

        let target = output_root.join(asset.name);
        let result = match asset.kind {
            AssetKind::Directory => copy_dir_recursively(&source, &target, report),
            AssetKind::File => fs::copy(&source, &target).map(|_| ()).with_context(|| {
                format!("failed to copy `{}` to `{}`", source.display(), target.display())
            }),
        };

        match result {
            Ok(()) => report.status("assets", &format!("copied `{}`", asset.name)),
            Err(err) => report.error(&format!("{err:#}")),
        }
    }
}

pub fn copy_dir_recursively(src: &Path, dst: &Path, report: &Reporter) -> Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst).context("failed to create destination directory")?;
    }

    for entry in fs::read_dir(src).context("failed to read source directory")? {
        let entry = entry.context("invalid directory entry")?;
        let entry_path = entry.path();
        let dest_path = dst.join(entry.file_name());

        if entry_path.is_dir() {
            copy_dir_recursively(&entry_path, &dest_path, report)?;
        } else {
            fs::copy(&entry_path, &dest_path).with_context(|| {
                format!("failed to copy {entry_path:?} to {dest_path:?}")
            })?;
            report.step("assets", &dest_path.display().to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site_root() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();

        let mut config = SiteConfig::default();
        config.build.root_dir = dir.path().to_path_buf();
        (dir, config)
    }

    #[test]
    fn missing_item_is_exactly_one_warning() {
        let (dir, config) = site_root();
        fs::create_dir_all(dir.path().join("assets/js")).unwrap();
        fs::write(dir.path().join("assets/js/app.js"), "var x = 1;").unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("favicon.ico"), [0u8; 4]).unwrap();
        // robots.txt deliberately absent

        let mut report = Reporter::new();
        copy_assets(&config, &mut report);

        assert_eq!(report.warnings, 1);
        assert_eq!(report.errors, 0);
        assert!(dir.path().join("out/assets/js/app.js").is_file());
        assert!(dir.path().join("out/index.html").is_file());
        assert!(dir.path().join("out/favicon.ico").is_file());
        assert!(!dir.path().join("out/robots.txt").exists());
    }

    #[test]
    fn overwrites_a_pre_existing_output_directory() {
        let (dir, config) = site_root();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/style.css"), "body{}").unwrap();
        fs::create_dir_all(dir.path().join("out/assets")).unwrap();
        fs::write(dir.path().join("out/assets/style.css"), "stale").unwrap();

        let mut report = Reporter::new();
        copy_assets(&config, &mut report);

        let copied = fs::read_to_string(dir.path().join("out/assets/style.css")).unwrap();
        assert_eq!(copied, "body{}");
    }
}
