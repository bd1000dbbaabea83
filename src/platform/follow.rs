// logmux - platform/follow.rs
//
// `tail -f` style reader over a log file.
//
// At end-of-file a following reader sleeps and re-reads instead of reporting
// EOF. The sleep is cut into TAIL_CANCEL_CHECK_INTERVAL_MS slices so the
// shared cancel flag is noticed promptly; once it is set the reader reports
// EOF and the tailer above it finishes normally.
//
// A file that shrinks below the read offset was truncated (or rewritten in
// place); the offset resets to 0 so the new content is picked up.

use crate::core::source::StreamOptions;
use crate::util::constants::TAIL_CANCEL_CHECK_INTERVAL_MS;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct FollowReader {
    file: File,
    path: PathBuf,
    /// Byte position of the next read.
    offset: u64,
    follow: bool,
    poll_interval: Duration,
    cancel: Arc<AtomicBool>,
}

impl FollowReader {
    /// Open `path`. A following reader that does not start from the
    /// beginning is positioned at the current end of the file.
    pub fn open(path: &Path, options: &StreamOptions) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let offset = if options.follow && !options.from_start {
            file.seek(SeekFrom::End(0))?
        } else {
            0
        };

        tracing::debug!(
            file = %path.display(),
            offset,
            follow = options.follow,
            "Stream opened"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            offset,
            follow: options.follow,
            poll_interval: options.poll_interval,
            cancel: Arc::clone(&options.cancel),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sleep for one poll interval. Returns false if cancelled meanwhile.
    fn wait_for_content(&self) -> bool {
        let slice = Duration::from_millis(TAIL_CANCEL_CHECK_INTERVAL_MS).min(self.poll_interval);
        let slices = (self.poll_interval.as_millis() / slice.as_millis().max(1)).max(1);
        for _ in 0..slices {
            if self.cancel.load(Ordering::SeqCst) {
                return false;
            }
            std::thread::sleep(slice);
        }
        !self.cancel.load(Ordering::SeqCst)
    }

    /// Returns true when the offset was reset.
    fn reset_if_truncated(&mut self) -> io::Result<bool> {
        let len = self.file.metadata()?.len();
        if len < self.offset {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.offset,
                new_size = len,
                "File truncated; resetting offset to 0"
            );
            self.file.seek(SeekFrom::Start(0))?;
            self.offset = 0;
            return Ok(true);
        }
        Ok(false)
    }
}

impl Read for FollowReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.file.read(buf)?;
            if n > 0 {
                self.offset += n as u64;
                return Ok(n);
            }
            if !self.follow {
                return Ok(0);
            }
            if self.reset_if_truncated()? {
                continue;
            }
            if !self.wait_for_content() {
                return Ok(0);
            }
        }
    }
}
