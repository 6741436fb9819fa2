//! `graceful-run version`

use std::fmt;

/// What `build.rs` recorded about this binary
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub dirty: bool,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: env!("GRACEFUL_RUN_GIT_HASH"),
            dirty: env!("GRACEFUL_RUN_GIT_DIRTY") == "true",
            built_at: env!("GRACEFUL_RUN_BUILD_TIMESTAMP"),
            target: env!("GRACEFUL_RUN_TARGET"),
            profile: env!("GRACEFUL_RUN_PROFILE"),
            rustc: env!("GRACEFUL_RUN_RUSTC_VERSION"),
        }
    }

    /// `0.1.0+abc1234`, with `.dirty` appended for uncommitted builds
    pub fn full_version(&self) -> String {
        let mut full = format!("{}+{}", self.version, self.commit);
        if self.dirty {
            full.push_str(".dirty");
        }
        full
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", env!("CARGO_PKG_NAME"), self.full_version())?;
        writeln!(f, "commit   {}{}", self.commit, if self.dirty { " (dirty)" } else { "" })?;
        writeln!(f, "built    {} ({})", self.built_at, self.profile)?;
        writeln!(f, "target   {}", self.target)?;
        writeln!(f, "rustc    {}", self.rustc)
    }
}
