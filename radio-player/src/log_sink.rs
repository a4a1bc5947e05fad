//! Size-capped truncate-and-rewind log writer: once the file passes a byte
//! threshold it truncates and seeks back to 0, rather than rotating to a
//! new numbered file. No crate in the stack implements this exact
//! semantic — `tracing-appender` only rotates on calendar boundaries — so
//! this is hand-written and wired in as a
//! `tracing_subscriber::fmt::MakeWriter`.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Mutex;

struct Inner {
    file: File,
    path: PathBuf,
    max_bytes: u64,
    written: u64,
}

/// Rewinds to byte 0 and truncates once `max_bytes` is exceeded, so the log
/// file never grows past roughly `max_bytes` plus one line.
pub struct RotatingLogSink {
    inner: Mutex<Inner>,
}

impl RotatingLogSink {
    pub fn open(path: PathBuf, max_bytes: u64) -> io::Result<Self> {
        let mut file = OpenOptions::new().create(true).read(true).write(true).open(&path)?;
        let written = file.metadata()?.len();
        file.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                path,
                max_bytes,
                written,
            }),
        })
    }
}

impl Write for &RotatingLogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.written >= inner.max_bytes {
            inner.file.set_len(0)?;
            inner.file.seek(SeekFrom::Start(0))?;
            inner.written = 0;
        }
        let n = inner.file.write(buf)?;
        inner.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().unwrap().file.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RotatingLogSink {
    type Writer = &'a RotatingLogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

impl RotatingLogSink {
    pub fn path(&self) -> PathBuf {
        self.inner.lock().unwrap().path.clone()
    }
}
