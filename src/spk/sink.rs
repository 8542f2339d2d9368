use std::io::{self, Write};

/// Append-only output with a stack of byte counters.
///
/// While at least one counter is active every write only bumps the innermost
/// counter and nothing reaches the inner writer. This lets a chunk header be
/// sized by building its payload once in counting mode and then once for real.
pub struct SpkSink<W: Write> {
    inner: W,
    written: u64,
    counters: Vec<u64>,
}

impl<W: Write> SpkSink<W> {
    pub fn new(writer: W) -> Self {
        SpkSink {
            inner: writer,
            written: 0,
            counters: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn is_measuring(&self) -> bool {
        !self.counters.is_empty()
    }

    // Committed bytes plus everything counted by the active measurements
    pub fn position(&self) -> u64 {
        self.written + self.counters.iter().sum::<u64>()
    }

    pub fn begin_measure(&mut self) {
        self.counters.push(0);
    }

    pub fn end_measure(&mut self) -> u64 {
        self.counters.pop().unwrap_or(0)
    }

    // Count `len` bytes without producing them, only valid while measuring
    pub fn count(&mut self, len: u64) {
        debug_assert!(self.is_measuring());
        if let Some(c) = self.counters.last_mut() {
            *c += len;
        }
    }

    pub fn measure<F, E>(&mut self, f: F) -> Result<u64, E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.begin_measure();
        let ret = f(self);
        let len = self.end_measure();
        ret.map(|()| len)
    }
}

impl<W: Write> Write for SpkSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.counters.last_mut() {
            Some(c) => {
                *c += buf.len() as u64;
                Ok(buf.len())
            }
            None => {
                let len = self.inner.write(buf)?;
                self.written += len as u64;
                Ok(len)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.is_measuring() {
            return Ok(());
        }
        self.inner.flush()
    }
}
