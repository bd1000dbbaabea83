// logmux - app/aggregate.rs
//
// The single consumer of the fan-in channel. Writes each line to the sink in
// the order it is received and flushes immediately, so output keeps pace
// with the sources.
//
// The loop ends when every sender is gone (all tailers finished and the
// channel is drained), when the cancel flag is raised, or when the sink
// fails. A sink failure is returned to the caller; exit behaviour belongs to
// the top-level runner.

use crate::core::model::FormattedLine;
use crate::util::constants::AGGREGATOR_CANCEL_CHECK_INTERVAL_MS;
use crate::util::error::SinkError;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// How the drain loop ended when the sink did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every sender was dropped and the channel is empty.
    AllSourcesEnded { lines_written: u64 },

    /// The cancel flag was raised; lines already queued were written.
    Cancelled { lines_written: u64 },
}

impl DrainOutcome {
    pub fn lines_written(&self) -> u64 {
        match self {
            Self::AllSourcesEnded { lines_written } | Self::Cancelled { lines_written } => {
                *lines_written
            }
        }
    }
}

/// Drain `rx` into `sink` until the channel closes, cancellation, or a write
/// error.
pub fn drain<W: Write>(
    rx: &Receiver<FormattedLine>,
    sink: &mut W,
    cancel: &AtomicBool,
) -> Result<DrainOutcome, SinkError> {
    let tick = Duration::from_millis(AGGREGATOR_CANCEL_CHECK_INTERVAL_MS);
    let mut lines_written: u64 = 0;

    loop {
        if cancel.load(Ordering::SeqCst) {
            // Flush what the tailers already handed over, then stop.
            while let Ok(line) = rx.try_recv() {
                write_line(sink, &line, lines_written)?;
                lines_written += 1;
            }
            tracing::debug!(lines_written, "Aggregator cancelled");
            return Ok(DrainOutcome::Cancelled { lines_written });
        }

        match rx.recv_timeout(tick) {
            Ok(line) => {
                write_line(sink, &line, lines_written)?;
                lines_written += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!(lines_written, "All sources ended");
                return Ok(DrainOutcome::AllSourcesEnded { lines_written });
            }
        }
    }
}

fn write_line<W: Write>(
    sink: &mut W,
    line: &FormattedLine,
    lines_written: u64,
) -> Result<(), SinkError> {
    sink.write_all(line.as_bytes())
        .and_then(|()| sink.flush())
        .map_err(|source| SinkError::Write {
            lines_written,
            source,
        })
}
