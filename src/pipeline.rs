use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::{summarize, ComparativeSummary, EmptyCaptureError, Metadata, ProtocolCount, SummaryStats};
use crate::capture::{find_capture_files, trace_name, Capture, CaptureError, CaptureSource, ProtocolTag};
use crate::config::Config;
use crate::output::Renderer;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("found no .{0} files.")]
    NoInputFiles(String),

    #[error("no packets found in capture.")]
    EmptyCaptureSet,

    #[error("no packets found in capture {name}.")]
    EmptyCapture {
        name: String,
        #[source]
        source: EmptyCaptureError,
    },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("rendering failed: {0}")]
    Render(#[source] anyhow::Error),
}

impl RunError {
    /// Errors that are reported with a plain message instead of a failure trace.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            RunError::NoInputFiles(_) | RunError::EmptyCaptureSet | RunError::EmptyCapture { .. }
        )
    }
}

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub directory: PathBuf,
    pub extension: String,
    pub protocols: Vec<ProtocolTag>,
    pub parallel: bool,
}

impl RunOptions {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
            protocols: ProtocolTag::DEFAULT_DISTRIBUTION.to_vec(),
            parallel: true,
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            directory: config.discovery.directory.clone(),
            extension: config.discovery.extension.clone(),
            protocols: config.analysis.protocols.clone(),
            parallel: config.analysis.parallel,
        }
    }
}

/// Derived view of one trace, handed to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub name: String,
    pub metadata: Metadata,
    pub counts: ProtocolCount,
    pub summary: SummaryStats,
}

impl TraceReport {
    pub fn analyze(capture: &Capture, tags: &[ProtocolTag]) -> Result<Self, RunError> {
        let empty = |source| RunError::EmptyCapture {
            name: capture.name().to_string(),
            source,
        };
        let metadata = Metadata::derive(capture).map_err(empty)?;
        let summary = summarize(&metadata).map_err(empty)?;
        let counts = ProtocolCount::from_capture(capture, tags);

        Ok(Self {
            name: capture.name().to_string(),
            metadata,
            counts,
            summary,
        })
    }
}

/// State of one batch run: loaded captures, then the reports derived from them.
pub struct RunContext {
    options: RunOptions,
    captures: Vec<Arc<Capture>>,
    reports: Vec<TraceReport>,
}

impl RunContext {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            captures: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn captures(&self) -> &[Arc<Capture>] {
        &self.captures
    }

    pub fn reports(&self) -> &[TraceReport] {
        &self.reports
    }

    pub fn comparison(&self) -> ComparativeSummary {
        ComparativeSummary::across(self.reports.iter().map(|r| (&r.metadata, &r.counts)))
    }

    pub fn discover(&self) -> Result<Vec<PathBuf>, RunError> {
        let files = find_capture_files(&self.options.directory, &self.options.extension)?;
        if files.is_empty() {
            return Err(RunError::NoInputFiles(
                self.options.extension.trim_start_matches('.').to_string(),
            ));
        }
        log::info!("found {} .{} files in {}", files.len(), self.options.extension, self.options.directory.display());
        Ok(files)
    }

    /// Loads every file, keeping the discovery order.
    pub async fn load(&mut self, source: Arc<dyn CaptureSource>, files: &[PathBuf]) -> Result<(), RunError> {
        if self.options.parallel {
            let mut handles = Vec::with_capacity(files.len());
            for path in files {
                eprintln!("loading {}", trace_name(path));
                let source = Arc::clone(&source);
                let path = path.clone();
                handles.push(tokio::task::spawn_blocking(move || load_one(source.as_ref(), &path)));
            }
            for handle in handles {
                self.captures.push(Arc::new(handle.await??));
            }
        } else {
            for path in files {
                eprintln!("loading {}", trace_name(path));
                self.captures.push(Arc::new(load_one(source.as_ref(), path)?));
            }
        }
        Ok(())
    }

    /// Rejects a run where no capture holds a single packet.
    pub fn validate(&self) -> Result<(), RunError> {
        let total: usize = self.captures.iter().map(|c| c.len()).sum();
        if total == 0 {
            return Err(RunError::EmptyCaptureSet);
        }
        Ok(())
    }

    pub async fn derive(&mut self) -> Result<(), RunError> {
        let tags = Arc::new(self.options.protocols.clone());
        self.reports.clear();

        if self.options.parallel {
            let mut handles = Vec::with_capacity(self.captures.len());
            for capture in &self.captures {
                let capture = Arc::clone(capture);
                let tags = Arc::clone(&tags);
                handles.push(tokio::task::spawn_blocking(move || {
                    TraceReport::analyze(&capture, &tags)
                }));
            }
            for handle in handles {
                self.reports.push(handle.await??);
            }
        } else {
            for capture in &self.captures {
                self.reports.push(TraceReport::analyze(capture, &tags)?);
            }
        }

        log::info!("derived metadata for {} traces", self.reports.len());
        Ok(())
    }
}

fn load_one(source: &dyn CaptureSource, path: &Path) -> Result<Capture, RunError> {
    let packets = source.load(path)?;
    log::debug!("{}: {} packets", path.display(), packets.len());
    Ok(Capture::new(trace_name(path), packets))
}

/// Runs the whole batch: discover, load, validate, derive, render.
pub async fn run(
    options: RunOptions,
    source: Arc<dyn CaptureSource>,
    renderer: &mut dyn Renderer,
) -> Result<RunContext, RunError> {
    let mut context = RunContext::new(options);

    let files = context.discover()?;
    context.load(source, &files).await?;
    context.validate()?;
    context.derive().await?;

    let comparison = context.comparison();
    renderer
        .render(context.reports(), &comparison)
        .map_err(RunError::Render)?;

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;
    use std::collections::HashMap;
    use std::fs;

    struct FakeSource {
        traces: HashMap<String, Vec<PacketRecord>>,
    }

    impl CaptureSource for FakeSource {
        fn load(&self, path: &Path) -> Result<Vec<PacketRecord>, CaptureError> {
            Ok(self.traces.get(&trace_name(path)).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Vec<String>,
        calls: usize,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, reports: &[TraceReport], _comparison: &ComparativeSummary) -> anyhow::Result<()> {
            self.calls += 1;
            self.rendered = reports.iter().map(|r| r.name.clone()).collect();
            Ok(())
        }
    }

    fn scratch_dir(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("capture-metrics-run-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), b"").unwrap();
        }
        dir
    }

    fn source(traces: &[(&str, Vec<PacketRecord>)]) -> Arc<dyn CaptureSource> {
        Arc::new(FakeSource {
            traces: traces.iter().map(|(n, p)| (n.to_string(), p.clone())).collect(),
        })
    }

    fn web_trace() -> Vec<PacketRecord> {
        vec![
            PacketRecord::new(100.0, 40).with_layer(ProtocolTag::Udp),
            PacketRecord::new(100.1, 60).with_tcp(1000, 0x02),
            PacketRecord::new(100.3, 55).with_tcp(2000, 0x10).with_layer(ProtocolTag::Http),
        ]
    }

    #[tokio::test]
    async fn test_no_matching_files() {
        let dir = scratch_dir("nofiles", &["capture.pcap", "readme.md"]);
        let mut renderer = RecordingRenderer::default();

        let result = run(RunOptions::new(&dir, "pcapng"), source(&[]), &mut renderer).await;
        match result {
            Err(err @ RunError::NoInputFiles(_)) => {
                assert_eq!(err.to_string(), "found no .pcapng files.");
                assert!(err.is_expected());
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert_eq!(renderer.calls, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_single_empty_capture() {
        let dir = scratch_dir("empty", &["idle.pcapng"]);
        let mut renderer = RecordingRenderer::default();

        let result = run(
            RunOptions::new(&dir, "pcapng"),
            source(&[("idle.pcapng", Vec::new())]),
            &mut renderer,
        )
        .await;
        match result {
            Err(err @ RunError::EmptyCaptureSet) => {
                assert_eq!(err.to_string(), "no packets found in capture.");
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert_eq!(renderer.calls, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_one_empty_capture_among_others_is_fatal() {
        let dir = scratch_dir("mixed", &["a.pcapng", "b.pcapng"]);
        let mut renderer = RecordingRenderer::default();

        let result = run(
            RunOptions::new(&dir, "pcapng"),
            source(&[("a.pcapng", web_trace()), ("b.pcapng", Vec::new())]),
            &mut renderer,
        )
        .await;
        match result {
            Err(RunError::EmptyCapture { name, .. }) => assert_eq!(name, "b.pcapng"),
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert_eq!(renderer.calls, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_full_run_sequential_and_parallel_agree() {
        let dir = scratch_dir("full", &["b.pcapng", "a.pcapng"]);
        let traces = [("a.pcapng", web_trace()), ("b.pcapng", web_trace()[..2].to_vec())];

        let mut reports = Vec::new();
        for parallel in [false, true] {
            let mut options = RunOptions::new(&dir, ".pcapng");
            options.parallel = parallel;
            let mut renderer = RecordingRenderer::default();

            let context = run(options, source(&traces), &mut renderer).await.unwrap();
            assert_eq!(renderer.calls, 1);
            assert_eq!(renderer.rendered, vec!["a.pcapng", "b.pcapng"]);
            assert_eq!(context.captures().len(), 2);
            reports.push(context.reports().to_vec());
        }

        let (sequential, parallel) = (&reports[0], &reports[1]);
        for (s, p) in sequential.iter().zip(parallel) {
            assert_eq!(s.metadata, p.metadata);
            assert_eq!(s.counts, p.counts);
        }

        let first = &sequential[0];
        assert_eq!(first.metadata.window(), &[0, 1000, 2000]);
        assert_eq!(first.counts.get(ProtocolTag::Tcp), 2);
        assert_eq!(first.counts.get(ProtocolTag::Http), 1);
        assert!((first.summary.mean_size - 155.0 / 3.0).abs() < 1e-9);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.analysis.parallel = false;
        config.analysis.protocols = vec![ProtocolTag::Dns];
        let options = RunOptions::from(&config);
        assert_eq!(options.extension, "pcapng");
        assert!(!options.parallel);
        assert_eq!(options.protocols, vec![ProtocolTag::Dns]);
    }
}
