//! Build identification for log lines and `--version` output.

use std::fmt;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";
const SHORT_SHA_LEN: usize = 7;

/// Where this binary was built from, as recorded by vergen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub sha: &'static str,
    pub dirty: bool,
}

impl BuildInfo {
    /// Metadata baked in at compile time; git fields are "unknown" outside
    /// a checkout.
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: match option_env!("VERGEN_GIT_BRANCH") {
                Some(branch) => branch,
                None => UNKNOWN,
            },
            sha: match option_env!("VERGEN_GIT_SHA") {
                Some(sha) => sha,
                None => UNKNOWN,
            },
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        }
    }

    pub fn short_sha(&self) -> &'static str {
        self.sha.get(..SHORT_SHA_LEN).unwrap_or(self.sha)
    }
}

/// `0.1.0+main.abc1234`, with `.dirty` appended for modified trees.
impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}.{}", self.version, self.branch, self.short_sha())?;
        if self.dirty {
            f.write_str(".dirty")?;
        }
        Ok(())
    }
}

/// [`BuildInfo::current`] rendered for logs.
pub fn version_string() -> String {
    BuildInfo::current().to_string()
}
