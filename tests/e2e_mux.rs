// logmux - tests/e2e_mux.rs
//
// End-to-end tests for the multiplexing pipeline: discovery -> selection ->
// concurrent tailers -> aggregator -> sink.
//
// The in-memory provider drives the ordering and failure-isolation cases;
// the directory provider cases use real files under a tempdir, real walkdir
// traversal and the real follow reader.

use logmux::app::mux::{run, MuxOptions};
use logmux::core::model::{Selector, SourceDescriptor, SourceEntry, SourceSet, TailExit};
use logmux::core::source::{ByteStream, SourceProvider, StreamOptions};
use logmux::platform::dir_source::{DirectorySource, DirectorySourceConfig};
use logmux::util::error::{DiscoveryError, LogMuxError, SelectionError};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// =============================================================================
// Helpers
// =============================================================================

/// Colour codes off so prefixes can be compared as plain text.
fn plain() {
    colored::control::set_override(false);
}

#[derive(Clone)]
enum Script {
    /// All lines available at once, then EOF.
    Lines(Vec<String>),
    /// One line per read, `delay` apart, then EOF.
    Paced(Vec<String>, Duration),
    /// The given lines, then a read error.
    FailAfter(Vec<String>),
}

struct Paced {
    lines: std::vec::IntoIter<String>,
    delay: Duration,
    current: Cursor<Vec<u8>>,
}

impl Read for Paced {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.current.read(buf)?;
        if n > 0 {
            return Ok(n);
        }
        match self.lines.next() {
            Some(line) => {
                std::thread::sleep(self.delay);
                self.current = Cursor::new(line.into_bytes());
                self.current.read(buf)
            }
            None => Ok(0),
        }
    }
}

struct Failing {
    data: Cursor<Vec<u8>>,
}

impl Read for Failing {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionAborted, "stream dropped")),
            n => Ok(n),
        }
    }
}

struct MemoryProvider {
    set: SourceSet,
    scripts: HashMap<SourceDescriptor, Script>,
}

impl MemoryProvider {
    fn new(scripts: Vec<(&str, &str, Script)>) -> Self {
        let mut entries: Vec<SourceEntry> = Vec::new();
        let mut map = HashMap::new();
        for (source, sub, script) in scripts {
            match entries.iter_mut().find(|e| e.name == source) {
                Some(entry) => entry.sub_sources.push(sub.to_string()),
                None => entries.push(SourceEntry::new(source, [sub])),
            }
            map.insert(SourceDescriptor::new(source, sub), script);
        }
        Self {
            set: SourceSet::new(entries),
            scripts: map,
        }
    }
}

impl SourceProvider for MemoryProvider {
    fn list_sources(&self) -> Result<SourceSet, DiscoveryError> {
        Ok(self.set.clone())
    }

    fn open_stream(
        &self,
        descriptor: &SourceDescriptor,
        _options: &StreamOptions,
    ) -> io::Result<ByteStream> {
        let script = self
            .scripts
            .get(descriptor)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown stream"))?;
        Ok(match script {
            Script::Lines(lines) => Box::new(Cursor::new(lines.concat().into_bytes())),
            Script::Paced(lines, delay) => Box::new(Paced {
                lines: lines.into_iter(),
                delay,
                current: Cursor::new(Vec::new()),
            }),
            Script::FailAfter(lines) => Box::new(Failing {
                data: Cursor::new(lines.concat().into_bytes()),
            }),
        })
    }
}

fn lines(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}-{i}\n")).collect()
}

fn one_shot() -> MuxOptions {
    MuxOptions {
        follow: false,
        ..Default::default()
    }
}

fn run_to_string(provider: Arc<dyn SourceProvider>, selector: Selector) -> (Vec<String>, usize) {
    let mut out = Vec::new();
    let summary = run(
        provider,
        &selector,
        &mut out,
        &one_shot(),
        Arc::new(AtomicBool::new(false)),
    )
    .expect("run should succeed");
    let text = String::from_utf8(out).expect("utf-8 output");
    (
        text.lines().map(str::to_string).collect(),
        summary.tailers_spawned,
    )
}

/// Lines carrying `tag`, with the tag stripped, in output order.
fn bodies(output: &[String], tag: &str) -> Vec<String> {
    output
        .iter()
        .filter_map(|l| l.strip_prefix(&format!("{tag} ")).map(str::to_string))
        .collect()
}

/// A `Write` that can be shared with the thread running the multiplexer.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// In-memory provider
// =============================================================================

/// Two sources, three lines each: six lines, per-source order preserved.
#[test]
fn e2e_unfiltered_run_interleaves_all_sources() {
    plain();
    let provider = Arc::new(MemoryProvider::new(vec![
        ("api", "stdout", Script::Lines(lines("api", 3))),
        ("worker", "stdout", Script::Lines(lines("worker", 3))),
    ]));

    let (output, spawned) = run_to_string(provider, Selector::default());

    assert_eq!(spawned, 2);
    assert_eq!(output.len(), 6, "output: {output:?}");
    assert_eq!(bodies(&output, "[api stdout]"), vec!["api-1", "api-2", "api-3"]);
    assert_eq!(
        bodies(&output, "[worker stdout]"),
        vec!["worker-1", "worker-2", "worker-3"]
    );
}

/// Unfiltered runs spawn one tailer per (source, sub-source) pair.
#[test]
fn e2e_unfiltered_spawns_tailer_per_pair() {
    plain();
    let provider = Arc::new(MemoryProvider::new(vec![
        ("api", "stdout", Script::Lines(lines("a", 1))),
        ("api", "proxy", Script::Lines(lines("b", 1))),
        ("worker", "stdout", Script::Lines(lines("c", 1))),
    ]));

    let (output, spawned) = run_to_string(provider, Selector::default());
    assert_eq!(spawned, 3);
    assert_eq!(output.len(), 3);
}

/// Selecting a source by name tails only that source.
#[test]
fn e2e_filtered_run_only_emits_selected_source() {
    plain();
    let provider = Arc::new(MemoryProvider::new(vec![
        ("api", "stdout", Script::Lines(lines("api", 3))),
        ("worker", "stdout", Script::Lines(lines("worker", 3))),
    ]));

    let (output, spawned) = run_to_string(
        provider,
        Selector::new(Some("worker".to_string()), Some(String::new())),
    );

    assert_eq!(spawned, 1);
    assert_eq!(output.len(), 3);
    assert!(output.iter().all(|l| l.starts_with("[worker stdout] ")));
    assert!(output.iter().all(|l| !l.contains("api")));
}

/// Selecting a sub-source tails exactly that pair, not its sibling.
#[test]
fn e2e_sub_source_selection_picks_exact_pair() {
    plain();
    let provider = Arc::new(MemoryProvider::new(vec![
        ("nameA", "subA", Script::Lines(lines("a", 2))),
        ("nameA", "subB", Script::Lines(lines("b", 2))),
    ]));

    let (output, _) = run_to_string(
        provider,
        Selector::new(Some("nameA".to_string()), Some("subB".to_string())),
    );
    assert_eq!(output, vec!["[nameA subB] b-1", "[nameA subB] b-2"]);
}

/// One source failing after a line never truncates the healthy source.
#[test]
fn e2e_failing_source_does_not_affect_healthy_one() {
    plain();
    let provider = Arc::new(MemoryProvider::new(vec![
        (
            "api",
            "stdout",
            Script::FailAfter(vec!["api-1\n".to_string()]),
        ),
        (
            "worker",
            "stdout",
            Script::Paced(lines("worker", 5), Duration::from_millis(20)),
        ),
    ]));

    let mut out = Vec::new();
    let summary = run(
        provider,
        &Selector::default(),
        &mut out,
        &one_shot(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    let output: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();

    assert_eq!(output.len(), 6, "output: {output:?}");
    assert_eq!(bodies(&output, "[api stdout]"), vec!["api-1"]);
    assert_eq!(bodies(&output, "[worker stdout]").len(), 5);

    let api_exit = summary
        .exits
        .iter()
        .find(|(d, _)| d.source == "api")
        .map(|(_, exit)| exit);
    assert!(matches!(api_exit, Some(TailExit::ReadFailed(_))));
    assert_eq!(summary.failed_sources(), 1);
}

#[test]
fn e2e_unknown_selection_is_not_found() {
    let provider = Arc::new(MemoryProvider::new(vec![(
        "api",
        "stdout",
        Script::Lines(lines("api", 1)),
    )]));
    let err = run(
        provider,
        &Selector::new(Some("missing".to_string()), None),
        &mut Vec::new(),
        &one_shot(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap_err();
    match err {
        LogMuxError::Selection(SelectionError::NotFound { source, sub_source }) => {
            assert_eq!(source, "missing");
            assert_eq!(sub_source, "");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

/// A failing sink ends the run with a typed error and cancels the tailers.
#[test]
fn e2e_sink_failure_is_fatal() {
    struct ClosedPipe;
    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let provider = Arc::new(MemoryProvider::new(vec![(
        "api",
        "stdout",
        Script::Lines(lines("api", 10)),
    )]));
    let cancel = Arc::new(AtomicBool::new(false));
    let err = run(
        provider,
        &Selector::default(),
        &mut ClosedPipe,
        &one_shot(),
        Arc::clone(&cancel),
    )
    .unwrap_err();

    assert!(matches!(err, LogMuxError::Sink(_)), "got {err:?}");
    assert!(cancel.load(Ordering::SeqCst), "tailers should be told to stop");
}

// =============================================================================
// Directory provider
// =============================================================================

fn make_source_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (source, body) in [("api", "api-1\napi-2\napi-3\n"), ("worker", "worker-1\nworker-2\nworker-3\n")] {
        let path = dir.path().join(source);
        fs::create_dir(&path).expect("mkdir");
        fs::write(path.join("stdout.log"), body).expect("write");
    }
    dir
}

fn dir_provider(root: &std::path::Path) -> Arc<dyn SourceProvider> {
    Arc::new(DirectorySource::new(DirectorySourceConfig {
        root: root.to_path_buf(),
        ..Default::default()
    }))
}

/// Non-following run over real files prints existing content and ends.
#[test]
fn e2e_directory_run_without_follow() {
    plain();
    let dir = make_source_tree();
    let (output, spawned) = run_to_string(dir_provider(dir.path()), Selector::default());

    assert_eq!(spawned, 2);
    assert_eq!(output.len(), 6);
    assert_eq!(
        bodies(&output, "[api stdout]"),
        vec!["api-1", "api-2", "api-3"]
    );
}

/// Empty root: discovery succeeds, selection reports no sources.
#[test]
fn e2e_directory_without_sources() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(
        dir_provider(dir.path()),
        &Selector::default(),
        &mut Vec::new(),
        &one_shot(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LogMuxError::Selection(SelectionError::NoSourcesAvailable)
    ));
}

/// Source directories with no log files leave nothing to tail.
#[test]
fn e2e_directory_with_only_empty_sources() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("api")).unwrap();
    fs::create_dir(dir.path().join("worker")).unwrap();
    fs::write(dir.path().join("worker").join("notes.txt"), "not a log\n").unwrap();

    let err = run(
        dir_provider(dir.path()),
        &Selector::default(),
        &mut Vec::new(),
        &one_shot(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LogMuxError::Selection(SelectionError::NoSourcesAvailable)
    ));
}

/// Following run sees appended lines and stops cleanly on cancel.
#[test]
fn e2e_follow_picks_up_appends_until_cancelled() {
    plain();
    let dir = make_source_tree();
    let provider = dir_provider(dir.path());
    let sink = SharedSink::default();
    let cancel = Arc::new(AtomicBool::new(false));

    let options = MuxOptions {
        follow: true,
        from_start: false,
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    };

    let runner = {
        let mut sink = sink.clone();
        let cancel = Arc::clone(&cancel);
        std::thread::spawn(move || {
            run(provider, &Selector::default(), &mut sink, &options, cancel)
        })
    };

    // Give the tailers time to open their files at the current end.
    std::thread::sleep(Duration::from_millis(200));
    let mut f = OpenOptions::new()
        .append(true)
        .open(dir.path().join("worker").join("stdout.log"))
        .unwrap();
    f.write_all(b"worker-4\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !sink.text().contains("worker-4") && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    cancel.store(true, Ordering::SeqCst);

    let summary = runner.join().unwrap().expect("run should end cleanly");
    assert_eq!(sink.text(), "[worker stdout] worker-4\n");
    assert_eq!(summary.lines_written, 1);
    assert_eq!(summary.detached, 0);
    assert!(summary
        .exits
        .iter()
        .all(|(_, exit)| matches!(exit, TailExit::Cancelled)));
}
