// logmux - app/mux.rs
//
// Run bootstrap: discovery -> selection -> one tailer thread per selected
// pair -> aggregator on the calling thread.
//
// Error policy:
//   - Discovery and selection failures return before any thread starts.
//   - Per-source open/read failures stay inside their tailer and show up
//     only in `MuxSummary::exits`.
//   - A sink failure raises the cancel flag, drops the receiver so stalled
//     senders wake up, and is returned as `LogMuxError::Sink`. Exit status is
//     the binary's decision.

use crate::app::aggregate::{self, DrainOutcome};
use crate::app::tail;
use crate::core::colour::ColorAssigner;
use crate::core::model::{FormattedLine, MuxSummary, Selector, SourceDescriptor, TailExit};
use crate::core::selection;
use crate::core::source::{SourceProvider, StreamOptions};
use crate::util::constants;
use crate::util::error::{Result, StreamError};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Options for one multiplexing run.
#[derive(Debug, Clone)]
pub struct MuxOptions {
    /// Keep following streams after their current end.
    pub follow: bool,

    /// Start following streams from their beginning.
    pub from_start: bool,

    /// Capacity of the shared fan-in channel (0 = rendezvous).
    pub channel_capacity: usize,

    /// Re-check interval for following streams.
    pub poll_interval: Duration,
}

impl Default for MuxOptions {
    fn default() -> Self {
        Self {
            follow: true,
            from_start: false,
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
            poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
        }
    }
}

type Tailer = (SourceDescriptor, JoinHandle<TailExit>);

/// Multiplex the sources selected by `selector` into `sink`.
///
/// Returns when every selected source has ended, when `cancel` is raised,
/// or with an error when discovery, selection or the sink fails.
pub fn run<W: Write>(
    provider: Arc<dyn SourceProvider>,
    selector: &Selector,
    sink: &mut W,
    options: &MuxOptions,
    cancel: Arc<AtomicBool>,
) -> Result<MuxSummary> {
    let set = provider.list_sources()?;
    tracing::info!(
        sources = set.entries.len(),
        pairs = set.pair_count(),
        "Sources discovered"
    );

    let selection = selection::resolve(selector, &set)?;
    let targets = selection.targets(&set);

    let colours = Arc::new(ColorAssigner::new());
    let (tx, rx) = mpsc::sync_channel::<FormattedLine>(options.channel_capacity);
    let stream_options = StreamOptions {
        follow: options.follow,
        from_start: options.from_start,
        poll_interval: options.poll_interval,
        cancel: Arc::clone(&cancel),
    };

    let mut summary = MuxSummary::default();
    let mut tailers: Vec<Tailer> = Vec::with_capacity(targets.len());

    for descriptor in targets {
        match tail::spawn_tailer(
            Arc::clone(&provider),
            descriptor.clone(),
            stream_options.clone(),
            Arc::clone(&colours),
            tx.clone(),
        ) {
            Ok(handle) => tailers.push((descriptor, handle)),
            Err(e) => {
                tracing::warn!(source = %descriptor, error = %e, "Cannot spawn tailer thread");
                summary.exits.push((
                    descriptor.clone(),
                    TailExit::OpenFailed(StreamError::Open {
                        descriptor,
                        source: e,
                    }),
                ));
            }
        }
    }
    // Only tailers hold senders from here on; the channel closes when the
    // last one returns.
    drop(tx);

    summary.tailers_spawned = tailers.len();
    tracing::info!(
        tailers = summary.tailers_spawned,
        follow = options.follow,
        "Multiplexing started"
    );

    let outcome = match aggregate::drain(&rx, sink, &cancel) {
        Ok(outcome) => outcome,
        Err(e) => {
            cancel.store(true, Ordering::SeqCst);
            drop(rx);
            tracing::error!(error = %e, "Output sink failed; stopping all tailers");
            return Err(e.into());
        }
    };

    summary.lines_written = outcome.lines_written();

    match outcome {
        DrainOutcome::AllSourcesEnded { .. } => join_tailers(tailers, None, &mut summary),
        DrainOutcome::Cancelled { .. } => {
            drop(rx);
            let deadline = Instant::now() + Duration::from_millis(constants::CANCEL_JOIN_GRACE_MS);
            join_tailers(tailers, Some(deadline), &mut summary);
        }
    }

    tracing::info!(
        lines = summary.lines_written,
        failed_sources = summary.failed_sources(),
        detached = summary.detached,
        "Multiplexing finished"
    );
    Ok(summary)
}

/// Join tailers, recording their exits. With a deadline, tailers still
/// running when it passes are left detached.
fn join_tailers(tailers: Vec<Tailer>, deadline: Option<Instant>, summary: &mut MuxSummary) {
    let slice = Duration::from_millis(constants::TAIL_CANCEL_CHECK_INTERVAL_MS);

    for (descriptor, handle) in tailers {
        if let Some(deadline) = deadline {
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(slice);
            }
            if !handle.is_finished() {
                tracing::debug!(source = %descriptor, "Tailer still blocked; detaching");
                summary.detached += 1;
                continue;
            }
        }

        let exit = handle.join().unwrap_or_else(|_| {
            tracing::error!(source = %descriptor, "Tailer thread panicked");
            TailExit::Panicked
        });
        summary.exits.push((descriptor, exit));
    }
}
