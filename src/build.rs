use crate::config::SiteConfig;
use crate::utils::{
    assets::{copy_assets, copy_dir_recursively},
    checker::check_tools,
    compile::{DocumentCompiler, TypstCompiler, collect_files, compile_documents, has_extension, output_path},
    log::Reporter,
    minify::{JsMinifier, TerserMinifier, minify_html_files, minify_js_files},
};
use anyhow::{Context, Result, bail};
use std::fs;

/// Full pipeline: dependency check, output preparation, compilation, asset
/// copy, minification.
pub fn build_site(config: &SiteConfig, report: &mut Reporter) -> Result<()> {
    let tools = [
        config.tools.typst_command.as_str(),
        config.tools.terser_command.as_str(),
    ];
    if !check_tools(&tools, config.tool_timeout(), report) {
        bail!("missing required dependencies");
    }

    let compiler = TypstCompiler::from_config(config);
    let minifier = TerserMinifier::from_config(config);
    run_pipeline(&compiler, &minifier, config, report)
}

/// The pipeline behind `build_site`, with the external tools injected so the
/// stages can run against fakes.
pub fn run_pipeline(
    compiler: &dyn DocumentCompiler,
    minifier: &dyn JsMinifier,
    config: &SiteConfig,
    report: &mut Reporter,
) -> Result<()> {
    prepare_output(config, report)?;
    compile_documents(compiler, config, report)?;
    copy_assets(config, report);

    if config.build.minify {
        minify_html_files(config, report);
        minify_js_files(minifier, config, report);
    }

    Ok(())
}

/// Clean-only mode: empty the output tree and repopulate it from documents
/// that are already compiled (pre-existing `.html` files in the posts tree),
/// plus the static assets. No compilation.
pub fn clean_site(config: &SiteConfig, report: &mut Reporter) -> Result<()> {
    if config.build.minify && !check_tools(&[config.tools.terser_command.as_str()], config.tool_timeout(), report) {
        bail!("missing required dependencies");
    }

    prepare_output(config, report)?;
    copy_compiled_documents(config, report)?;
    copy_assets(config, report);

    if config.build.minify {
        minify_html_files(config, report);
        let minifier = TerserMinifier::from_config(config);
        minify_js_files(&minifier, config, report);
    }

    Ok(())
}

/// Legacy copy-only mode: the posts directory already holds compiled html,
/// so it and the static assets are copied verbatim. No compilation, no
/// minification.
pub fn copy_site(config: &SiteConfig, report: &mut Reporter) -> Result<()> {
    prepare_output(config, report)?;

    report.section("copying compiled posts");
    let posts = config.posts_path();
    if posts.is_dir() {
        let target = config.output_path().join(&config.build.posts_dir);
        copy_dir_recursively(&posts, &target, report)
            .with_context(|| format!("failed to copy `{}`", posts.display()))?;
        report.status("posts", &format!("copied `{}`", config.build.posts_dir.display()));
    } else {
        report.warning(&format!("posts directory `{}` not found, skipped", posts.display()));
    }

    copy_assets(config, report);
    Ok(())
}

/// Delete and recreate the output root. Any filesystem error here is fatal.
pub fn prepare_output(config: &SiteConfig, report: &mut Reporter) -> Result<()> {
    report.section("preparing output directory");

    let output = config.output_path();
    if output.exists() {
        fs::remove_dir_all(&output)
            .with_context(|| format!("failed to clear output directory `{}`", output.display()))?;
        report.info(&format!("removed existing `{}`", output.display()));
    }

    fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory `{}`", output.display()))?;
    report.success(&format!("output directory `{}` ready", output.display()));

    Ok(())
}

fn copy_compiled_documents(config: &SiteConfig, report: &mut Reporter) -> Result<()> {
    report.section("copying compiled posts");

    let posts = config.posts_path();
    if !posts.is_dir() {
        report.warning(&format!("posts directory `{}` not found, skipped", posts.display()));
        return Ok(());
    }

    let documents = collect_files(&posts, &|path| has_extension(path, "html"))?;
    if documents.is_empty() {
        report.info("no compiled posts found");
        return Ok(());
    }

    let root = config.get_root();
    let output_root = config.output_path();

    for source in &documents {
        let relative = source.strip_prefix(root).unwrap_or(source);
        let target = output_path(source, root, &output_root)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }

        match fs::copy(source, &target) {
            Ok(_) => report.step("posts", &relative.display().to_string()),
            Err(err) => report.error(&format!("failed to copy {}: {err}", relative.display())),
        }
    }

    report.success(&format!("{} compiled posts copied", documents.len()));
    Ok(())
}
