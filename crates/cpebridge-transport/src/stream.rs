use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{SerialTransport, LINE_TERMINATOR};

const READ_CHUNK_SIZE: usize = 256;

/// Serial link over arbitrary byte streams (stdin/stdout, a tty device file).
///
/// Blocking reads happen on a background thread; `read_byte` only drains
/// what that thread has already collected, so it never blocks.
pub struct StreamSerial<W> {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    writer: W,
    closed: bool,
}

impl<W: Write> StreamSerial<W> {
    /// Spawn a reader thread over `reader` and write lines to `writer`.
    pub fn spawn<R>(reader: R, writer: W) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || pump(reader, tx))?;

        Ok(Self {
            rx,
            pending: VecDeque::new(),
            writer,
            closed: false,
        })
    }

    /// True once the input side reached EOF and every byte was consumed.
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    fn fill(&mut self) {
        if self.closed {
            return;
        }
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    debug!("serial input closed");
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

impl<W: Write> SerialTransport for StreamSerial<W> {
    fn read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.pop_front()
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        write_all_retrying(&mut self.writer, text.as_bytes())?;
        write_all_retrying(&mut self.writer, LINE_TERMINATOR.as_bytes())?;
        loop {
            match self.writer.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<W> std::fmt::Debug for StreamSerial<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSerial")
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

fn write_all_retrying<W: Write>(writer: &mut W, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => buf = &buf[n..],
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

fn pump<R: Read>(mut reader: R, tx: mpsc::Sender<Vec<u8>>) {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "serial read failed");
                return;
            }
        };
        if tx.send(chunk[..read].to_vec()).is_err() {
            return;
        }
    }
}
