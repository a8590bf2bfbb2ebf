use crate::cli::Cli;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(
        PathBuf,
        #[source] std::io::Error,
    ),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config file validation error: {0}")]
    Validation(String),
}

// for default value in serde
pub mod serde_defaults {
    pub fn r#true() -> bool { true }

    pub mod build {
        use std::path::PathBuf;

        pub fn root_dir() -> PathBuf { "./".into() }
        pub fn posts_dir() -> PathBuf { "posts".into() }
        pub fn output_dir() -> PathBuf { "out".into() }
    }

    pub mod tools {
        pub fn typst_command() -> String { "typst".into() }
        pub fn terser_command() -> String { "terser".into() }
        pub fn timeout_secs() -> u64 { 120 }
    }
}

// `[build]` in toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    // root directory path
    #[serde(default = "serde_defaults::build::root_dir")]
    #[educe(Default = serde_defaults::build::root_dir())]
    pub root_dir: PathBuf,

    // Posts directory path related to `root_dir`
    #[serde(default = "serde_defaults::build::posts_dir")]
    #[educe(Default = serde_defaults::build::posts_dir())]
    pub posts_dir: PathBuf,

    // Output directory path related to `root_dir`
    #[serde(default = "serde_defaults::build::output_dir")]
    #[educe(Default = serde_defaults::build::output_dir())]
    pub output_dir: PathBuf,

    // minify the generated html/js
    #[serde(default = "serde_defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,
}

// `[tools]` in toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    // command name of the typst compiler
    #[serde(default = "serde_defaults::tools::typst_command")]
    #[educe(Default = serde_defaults::tools::typst_command())]
    pub typst_command: String,

    // command name of the terser js minifier
    #[serde(default = "serde_defaults::tools::terser_command")]
    #[educe(Default = serde_defaults::tools::terser_command())]
    pub terser_command: String,

    // per-invocation timeout for external tools, 0 disables it
    #[serde(default = "serde_defaults::tools::timeout_secs")]
    #[educe(Default = serde_defaults::tools::timeout_secs())]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub build: BuildConfig,
    pub tools: ToolsConfig,
}

impl SiteConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn update_with_cli(&mut self, cli: &Cli) {
        self.build.root_dir = cli.root.clone();
        if let Some(output) = &cli.output {
            self.build.output_dir = output.clone();
        }
        if let Some(posts) = &cli.posts {
            self.build.posts_dir = posts.clone();
        }
        if let Some(minify) = cli.minify {
            self.build.minify = minify;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = self.build.output_dir.as_os_str();
        if output.is_empty() || output == "." || output == "./" || output == "/" {
            return Err(ConfigError::Validation(
                "`output_dir` would be removed recursively, refusing to use the site root".into()
            ));
        }

        if self.build.output_dir == self.build.posts_dir {
            return Err(ConfigError::Validation(
                "`output_dir` and `posts_dir` must be different directories".into()
            ));
        }

        Ok(())
    }

    pub fn get_root(&self) -> &Path {
        self.build.root_dir.as_path()
    }

    pub fn posts_path(&self) -> PathBuf {
        self.build.root_dir.join(&self.build.posts_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.build.root_dir.join(&self.build.output_dir)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        match self.tools.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
        [build]
        posts_dir = "articles"
        output_dir = "public"
        minify = false

        [tools]
        typst_command = "typst-nightly"
        timeout_secs = 30
    "#;

    #[test]
    fn parse_config() {
        let config = SiteConfig::from_str(SAMPLE_CONFIG).unwrap();

        assert_eq!(config.build.posts_dir, PathBuf::from("articles"));
        assert_eq!(config.build.output_dir, PathBuf::from("public"));
        assert!(!config.build.minify);
        assert_eq!(config.tools.typst_command, "typst-nightly");
        assert_eq!(config.tools.terser_command, "terser");
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn default_values() {
        let config = SiteConfig::from_str("").unwrap();

        assert_eq!(config.build.posts_dir, PathBuf::from("posts"));
        assert_eq!(config.build.output_dir, PathBuf::from("out"));
        assert!(config.build.minify);
        assert_eq!(config.tools.typst_command, "typst");
        assert_eq!(config.tools.timeout_secs, 120);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = SiteConfig::from_str("[tools]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.tool_timeout(), None);
    }

    #[test]
    fn config_validation() {
        let root_output = r#"
            [build]
            output_dir = "."
        "#;
        assert!(SiteConfig::from_str(root_output).unwrap().validate().is_err());

        let clashing = r#"
            [build]
            posts_dir = "site"
            output_dir = "site"
        "#;
        assert!(SiteConfig::from_str(clashing).unwrap().validate().is_err());

        assert!(SiteConfig::from_str("").unwrap().validate().is_ok());
    }
}
