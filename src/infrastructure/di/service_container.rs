//! Service container for dependency injection
//!
//! Wires up the restructure service with its settings, reporter and I/O.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::RestructureService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileLineSource, OutputSink, Reporter, StderrReporter};
use crate::infrastructure::{InfraError, InfraResult};

/// Path argument meaning stdin/stdout.
pub const STDIO: &str = "-";

/// Container holding all application services.
pub struct ServiceContainer {
    /// Where diagnostics go
    pub reporter: Arc<dyn Reporter>,

    pub restructure: RestructureService,
}

impl ServiceContainer {
    /// Create a new service container reporting to stderr.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(StderrReporter))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter,
            restructure: RestructureService::new(settings),
        }
    }

    /// Open the input document; `None` or `-` spools stdin.
    pub fn open_input(&self, path: Option<&Path>) -> InfraResult<FileLineSource> {
        match path.filter(|p| p.as_os_str() != STDIO) {
            Some(path) => {
                debug!("open_input: {}", path.display());
                FileLineSource::open(path).map_err(|source| InfraError::Input {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => {
                debug!("open_input: stdin");
                FileLineSource::spool(io::stdin().lock())
                    .map_err(|e| InfraError::io("spool stdin", e))
            }
        }
    }

    /// Open the output sink; `None` or `-` writes to stdout.
    pub fn open_output(&self, path: Option<&Path>) -> InfraResult<OutputSink> {
        match path.filter(|p| p.as_os_str() != STDIO) {
            Some(path) => {
                debug!("open_output: {}", path.display());
                OutputSink::file(path).map_err(|source| InfraError::Output {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Ok(OutputSink::stdout()),
        }
    }

    /// Publish the output of a successful run.
    pub fn commit_output(&self, sink: OutputSink) -> InfraResult<()> {
        let target = sink.target().map(Path::to_path_buf);
        sink.commit().map_err(|source| match target {
            Some(path) => InfraError::Output { path, source },
            None => InfraError::io("flush stdout", source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::{LineSource, MemoryReporter};

    #[test]
    fn test_open_input_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.texi");
        std::fs::write(&path, "@node Top\n").unwrap();
        let container = ServiceContainer::with_deps(Settings::default(), Arc::new(MemoryReporter::new()));

        let mut source = container.open_input(Some(&path)).unwrap();

        assert_eq!(source.next_line().unwrap().as_deref(), Some("@node Top\n"));
    }

    #[test]
    fn test_open_input_missing_file_is_input_error() {
        let container = ServiceContainer::new(Settings::default());
        let err = container
            .open_input(Some(Path::new("/nonexistent/prepinfo/doc.texi")))
            .unwrap_err();
        assert!(matches!(err, InfraError::Input { .. }), "{:?}", err);
    }

    #[test]
    fn test_open_output_in_missing_dir_is_output_error() {
        let container = ServiceContainer::new(Settings::default());
        let err = container
            .open_output(Some(Path::new("/nonexistent/prepinfo/out.texi")))
            .err()
            .unwrap();
        assert!(matches!(err, InfraError::Output { .. }), "{:?}", err);
    }

    #[test]
    fn test_commit_output_writes_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.texi");
        let container = ServiceContainer::new(Settings::default());

        let mut sink = container.open_output(Some(&path)).unwrap();
        std::io::Write::write_all(&mut sink, b"done\n").unwrap();
        container.commit_output(sink).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "done\n");
    }
}
