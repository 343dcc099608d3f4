//! Build metadata stamped in by `build.rs`.

use std::fmt;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where a muninn build came from.
///
/// Displays as `{version}` when built outside a git checkout, otherwise
/// `{version}+{branch}.{short sha}`, with `.dirty` appended for uncommitted
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: Option<&'static str>,
    pub commit: Option<&'static str>,
    pub dirty: bool,
}

impl BuildInfo {
    /// Metadata of the running binary.
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: option_env!("VERGEN_GIT_BRANCH"),
            commit: option_env!("VERGEN_GIT_SHA"),
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version)?;
        let Some(commit) = self.commit else {
            return Ok(());
        };
        let short = commit.get(..7).unwrap_or(commit);
        write!(f, "+{}.{short}", self.branch.unwrap_or("detached"))?;
        if self.dirty {
            f.write_str(".dirty")?;
        }
        Ok(())
    }
}
