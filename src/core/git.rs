//! Working-tree change discovery via the `git` CLI.

use crate::core::config::Config;
use crate::core::error::CanonError;
use std::collections::BTreeSet;
use std::process::Command;

/// Root-relative paths changed against `HEAD`, unstaged and staged, sorted
/// and deduplicated. Empty when either diff fails (no repository, no `HEAD`).
pub fn changed_files(config: &Config) -> Result<Vec<String>, CanonError> {
    let mut changed = BTreeSet::new();
    for args in [&["diff", "--name-only", "HEAD"][..], &["diff", "--name-only", "--cached"][..]] {
        let output = Command::new("git")
            .args(args)
            .current_dir(&config.root)
            .output()
            .map_err(CanonError::IoError)?;
        if !output.status.success() {
            tracing::debug!(
                args = ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git diff failed; treating as no changes"
            );
            return Ok(Vec::new());
        }
        changed.extend(
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    Ok(changed.into_iter().collect())
}
