use crate::config::SiteConfig;
use crate::utils::command::{CommandError, run_tool};
use crate::utils::log::Reporter;
use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Capability seam over the external document compiler, so tests can
/// substitute a fake without spawning processes.
pub trait DocumentCompiler {
    fn compile(&self, input: &Path, output: &Path) -> Result<(), CommandError>;
}

pub struct TypstCompiler {
    command: String,
    timeout: Option<Duration>,
}

impl TypstCompiler {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            command: config.tools.typst_command.clone(),
            timeout: config.tool_timeout(),
        }
    }
}

impl DocumentCompiler for TypstCompiler {
    fn compile(&self, input: &Path, output: &Path) -> Result<(), CommandError> {
        run_tool(
            &self.command,
            [
                OsStr::new("compile"),
                OsStr::new("--features"),
                OsStr::new("html"),
                OsStr::new("--format"),
                OsStr::new("html"),
                input.as_os_str(),
                output.as_os_str(),
            ],
            self.timeout,
        )
        .map(|_| ())
    }
}

/// Collect all files under `dir` matching the predicate, sorted per
/// directory for a deterministic traversal order.
pub fn collect_files<P>(dir: &Path, keep: &P) -> Result<Vec<PathBuf>>
where
    P: Fn(&Path) -> bool,
{
    let mut files = Vec::new();

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory `{}`", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files(&path, keep)?);
        } else if path.is_file() && keep(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Derive the output path of a source document: same path relative to the
/// site root, re-rooted under the output directory, extension swapped for
/// `.html`.
pub fn output_path(source: &Path, root: &Path, output_root: &Path) -> Result<PathBuf> {
    let relative = source
        .strip_prefix(root)
        .with_context(|| format!("`{}` is outside the site root", source.display()))?;

    Ok(output_root.join(relative).with_extension("html"))
}

/// Compile every `.typ` post into the output tree.
///
/// Fail-fast: the first compiler failure is logged, counted, and halts both
/// the stage and the overall build.
pub fn compile_documents(
    compiler: &dyn DocumentCompiler,
    config: &SiteConfig,
    report: &mut Reporter,
) -> Result<()> {
    report.section("compiling posts");

    let posts = config.posts_path();
    if !posts.is_dir() {
        report.warning(&format!("posts directory `{}` not found, nothing to compile", posts.display()));
        return Ok(());
    }

    let documents = collect_files(&posts, &|path| has_extension(path, "typ"))?;
    report.discovered = documents.len();

    if documents.is_empty() {
        report.info("no posts found");
        return Ok(());
    }

    let root = config.get_root();
    let output_root = config.output_path();

    for (index, source) in documents.iter().enumerate() {
        let relative = source.strip_prefix(root).unwrap_or(source);
        report.progress(index + 1, documents.len(), &format!("compiling {}", relative.display()));

        let target = output_path(source, root, &output_root)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }

        match compiler.compile(source, &target) {
            Ok(()) => {
                report.compiled += 1;
                report.status("posts", &format!("compiled {}", relative.display()));
            }
            Err(err) => {
                report.error(&format!("failed to compile {}: {err}", relative.display()));
                bail!("compilation halted at {}", relative.display());
            }
        }
    }

    report.success(&format!("{}/{} posts compiled", report.compiled, report.discovered));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct FakeCompiler {
        // relative file name of the document that should fail, if any
        fail_on: Option<&'static str>,
        invoked: RefCell<Vec<PathBuf>>,
    }

    impl FakeCompiler {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self { fail_on, invoked: RefCell::new(Vec::new()) }
        }
    }

    impl DocumentCompiler for FakeCompiler {
        fn compile(&self, input: &Path, output: &Path) -> Result<(), CommandError> {
            self.invoked.borrow_mut().push(input.to_path_buf());

            if self.fail_on.is_some_and(|name| input.ends_with(name)) {
                return Err(CommandError::Failed {
                    command: "typst".into(),
                    code: Some(1),
                    stderr: "error: unexpected token".into(),
                });
            }

            fs::write(output, "<html><body>post</body></html>").unwrap();
            Ok(())
        }
    }

    fn site_with_posts(posts: &[&str]) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        for post in posts {
            let path = dir.path().join("posts").join(post);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "= hello").unwrap();
        }
        fs::create_dir_all(dir.path().join("out")).unwrap();

        let mut config = SiteConfig::default();
        config.build.root_dir = dir.path().to_path_buf();
        (dir, config)
    }

    #[test]
    fn output_path_mirrors_the_source_tree() {
        let derived = output_path(
            Path::new("site/posts/a/b/c.typ"),
            Path::new("site"),
            Path::new("site/out"),
        )
        .unwrap();
        assert_eq!(derived, Path::new("site/out/posts/a/b/c.html"));
    }

    #[test]
    fn collects_documents_in_lexical_order() {
        let (_dir, config) = site_with_posts(&["z.typ", "a.typ", "sub/m.typ", "notes.txt"]);
        let files = collect_files(&config.posts_path(), &|p| has_extension(p, "typ")).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(config.posts_path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, [Path::new("a.typ"), Path::new("sub/m.typ"), Path::new("z.typ")]);
    }

    #[test]
    fn compiles_every_post_into_mirrored_paths() {
        let (dir, config) = site_with_posts(&["a.typ", "sub/b.typ"]);
        let compiler = FakeCompiler::new(None);
        let mut report = Reporter::new();

        compile_documents(&compiler, &config, &mut report).unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.compiled, 2);
        assert_eq!(report.errors, 0);
        assert!(dir.path().join("out/posts/a.html").is_file());
        assert!(dir.path().join("out/posts/sub/b.html").is_file());
    }

    #[test]
    fn first_failure_halts_the_stage() {
        let (dir, config) = site_with_posts(&["a.typ", "b.typ", "c.typ"]);
        let compiler = FakeCompiler::new(Some("b.typ"));
        let mut report = Reporter::new();

        let result = compile_documents(&compiler, &config, &mut report);

        assert!(result.is_err());
        assert_eq!(report.compiled, 1);
        assert_eq!(report.errors, 1);
        // c.typ is never attempted
        assert_eq!(compiler.invoked.borrow().len(), 2);
        assert!(dir.path().join("out/posts/a.html").is_file());
        assert!(!dir.path().join("out/posts/c.html").exists());
    }

    #[test]
    fn empty_posts_tree_is_a_successful_no_op() {
        let (_dir, config) = site_with_posts(&["readme.txt"]);
        let compiler = FakeCompiler::new(None);
        let mut report = Reporter::new();

        compile_documents(&compiler, &config, &mut report).unwrap();

        assert_eq!(report.discovered, 0);
        assert_eq!(report.compiled, 0);
        assert_eq!(report.errors, 0);
        assert!(compiler.invoked.borrow().is_empty());
    }
}
