// logmux - app/tail.rs
//
// Source tailer: one background thread per selected (source, sub-source)
// pair, reading its byte stream line by line and pushing colour-tagged lines
// into the shared fan-in channel.
//
// Architecture:
//   - `spawn_tailer` opens the stream *inside* the new thread, so a slow or
//     failing open never delays the other sources.
//   - Each tailer owns its own `SyncSender` clone. When every tailer has
//     returned, all senders are dropped and the aggregator sees the channel
//     disconnect.
//   - The shared cancel flag is checked between lines. Following streams
//     (`platform::follow::FollowReader`) also watch it while idle.
//
// Failure policy:
//   - Open and read failures end this tailer only. They are logged as
//     warnings and reported through `TailExit`, never sent to the aggregator.
//   - A full channel blocks `send`; lines are never dropped.
//   - Lines longer than MAX_LINE_BYTES are emitted in chunks so the line
//     buffer stays bounded. Chunks end on a UTF-8 character boundary.

use crate::core::colour::ColorAssigner;
use crate::core::model::{FormattedLine, SourceDescriptor, TailExit};
use crate::core::source::{SourceProvider, StreamOptions};
use crate::util::constants::MAX_LINE_BYTES;
use crate::util::error::StreamError;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::JoinHandle;

// =============================================================================
// Spawning
// =============================================================================

/// Start a tailer thread for `descriptor`.
///
/// Returns an error only if the OS refuses to create the thread.
pub fn spawn_tailer(
    provider: Arc<dyn SourceProvider>,
    descriptor: SourceDescriptor,
    options: StreamOptions,
    colours: Arc<ColorAssigner>,
    tx: SyncSender<FormattedLine>,
) -> io::Result<JoinHandle<TailExit>> {
    std::thread::Builder::new()
        .name(format!("tail {descriptor}"))
        .spawn(move || {
            let stream = match provider.open_stream(&descriptor, &options) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(
                        source = %descriptor.source,
                        sub_source = %descriptor.sub_source,
                        error = %e,
                        "Cannot open stream; skipping source"
                    );
                    return TailExit::OpenFailed(StreamError::Open {
                        descriptor,
                        source: e,
                    });
                }
            };
            tail_stream(&descriptor, stream, &colours, &tx, &options.cancel)
        })
}

// =============================================================================
// Read loop
// =============================================================================

/// Read `stream` to completion, sending one `FormattedLine` per line.
///
/// The stream is consumed and dropped on every return path.
pub fn tail_stream<R: Read>(
    descriptor: &SourceDescriptor,
    stream: R,
    colours: &ColorAssigner,
    tx: &SyncSender<FormattedLine>,
    cancel: &AtomicBool,
) -> TailExit {
    let label = descriptor.label();
    let mut reader = BufReader::new(stream);
    // Holds at most one line: MAX_LINE_BYTES of content plus its newline.
    let mut buf: Vec<u8> = Vec::with_capacity(512);
    let mut lines: u64 = 0;
    let mut warned_long_line = false;

    tracing::debug!(
        source = %descriptor.source,
        sub_source = %descriptor.sub_source,
        "Tailer started"
    );

    let exit = loop {
        if cancel.load(Ordering::SeqCst) {
            break TailExit::Cancelled;
        }

        // `buf` may still hold the tail of a split line.
        let room = (MAX_LINE_BYTES + 1).saturating_sub(buf.len()) as u64;
        let read = reader.by_ref().take(room).read_until(b'\n', &mut buf);

        match read {
            Ok(0) if buf.is_empty() => {
                // Following readers report EOF once cancelled; tell the two apart.
                if cancel.load(Ordering::SeqCst) {
                    break TailExit::Cancelled;
                }
                break TailExit::EndOfStream;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    source = %descriptor.source,
                    sub_source = %descriptor.sub_source,
                    lines,
                    error = %e,
                    "Read error; tailer stopping"
                );
                break TailExit::ReadFailed(StreamError::Read {
                    descriptor: descriptor.clone(),
                    source: e,
                });
            }
        }

        let end = if buf.last() == Some(&b'\n') || buf.len() <= MAX_LINE_BYTES {
            buf.len()
        } else {
            if !warned_long_line {
                tracing::warn!(
                    source = %descriptor.source,
                    sub_source = %descriptor.sub_source,
                    limit = MAX_LINE_BYTES,
                    "Line exceeds maximum length; splitting"
                );
                warned_long_line = true;
            }
            split_point(&buf, MAX_LINE_BYTES)
        };

        let line = FormattedLine::new(
            &colours.paint(&label),
            &String::from_utf8_lossy(&buf[..end]),
        );
        buf.drain(..end);
        if tx.send(line).is_err() {
            break TailExit::OutputClosed;
        }
        lines += 1;
    };

    tracing::debug!(
        source = %descriptor.source,
        sub_source = %descriptor.sub_source,
        lines,
        exit = ?exit,
        "Tailer finished"
    );
    exit
}

/// Largest cut at or below `limit` that does not split a UTF-8 sequence.
/// Bytes that are not valid UTF-8 are cut at `limit` unchanged.
fn split_point(bytes: &[u8], limit: usize) -> usize {
    let limit = limit.min(bytes.len());
    for i in (limit.saturating_sub(3)..limit).rev() {
        let width = match bytes[i] {
            0x80..=0xBF => continue,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if i > 0 && i + width > limit { i } else { limit };
    }
    limit
}
