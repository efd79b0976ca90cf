//! Run journal: every workflow run's context, as pretty JSON on disk.
//!
//! A journal file is enough to run the compensator again later
//! (`tablerescue cleanup --journal <file>`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::run_context::RunContext;

#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `ctx` to `<dir>/<run_id>.json`, never overwriting an earlier run.
    pub fn save(&self, ctx: &RunContext) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let mut path = self.dir.join(format!("{}.json", ctx.run_id()));
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = self.dir.join(format!("{}-{}.json", ctx.run_id(), n));
        }

        let content = serde_json::to_string_pretty(ctx)?;
        fs::write(&path, content)?;
        info!(path = %path.display(), "run journal written");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<RunContext> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
