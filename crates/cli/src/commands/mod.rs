//! CLI command handlers

pub mod batch;
pub mod clean;
pub mod fetch;
pub mod summary;

use std::path::PathBuf;

use drover_core::{LocalSource, MongoSource, SourceConfig, SourceStore};

/// Build the source store for one invocation: a directory of JSONL
/// dumps when `--from-dir` is given, the MongoDB CLI tooling otherwise.
pub fn make_source(
    host: &str,
    port: u16,
    database: &str,
    from_dir: Option<&PathBuf>,
) -> Box<dyn SourceStore> {
    match from_dir {
        Some(dir) => Box::new(LocalSource::new(dir)),
        None => {
            let mut config = SourceConfig::new(database);
            config.host = host.to_string();
            config.port = port;
            Box::new(MongoSource::new(config))
        }
    }
}
