// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::path::PathBuf;

/// Errors surfaced by the public [`crate::CompilerService`] API.
///
/// Per-task compiler/linker failures are *not* represented here: they are
/// recorded on the scheduler's snapshot (`last_failed`/`last_messages`) and
/// observers are notified, since the task that failed ran asynchronously
/// with respect to whichever call enqueued it.
#[derive(Debug, onlyerror::Error)]
pub enum Error {
    #[error("failed to create output directory {path:?}: {source}")]
    OutputDirCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to load settings: {0}")]
    Config(#[from] ConfigError),
    #[error("service was used after shutdown_global()")]
    ServiceNotInitialized,
}

#[derive(Debug, onlyerror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings toml: {0}")]
    Parse(#[from] toml::de::Error),
}
