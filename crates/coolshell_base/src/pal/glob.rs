use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::CoolshellResult;

/// Compile glob patterns into one set. Patterns match paths relative to the
/// walked directory.
pub(crate) fn build_glob_set(globs: &[String]) -> CoolshellResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for (idx, glob) in globs.iter().enumerate() {
        let compiled = GlobBuilder::new(glob).build().map_err(|e| {
            debug!(index = idx, pattern = %glob, error = %e, "failed to compile glob pattern");
            crate::err!("Invalid glob pattern '{}': {}", glob, e)
        })?;
        builder.add(compiled);
    }
    builder
        .build()
        .map_err(|e| crate::err!("Failed to build glob set: {}", e))
}
