/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::io::Write;
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};

use super::option::{FileSink, ReadFn, WriteFn};
use crate::engine::NativeHandle;

/// Destination of body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Emit to the inline output sink (stdout).
    Stdout,
    /// Write to the stored file stream.
    File,
    /// Accumulate into the response buffer.
    Buffer,
    /// Hand to the user callback; its return is the accepted count.
    Callback,
}

/// Destination of header bytes; one extra mode over the body channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    Stdout,
    File,
    Callback,
    /// Report success without storing anything (the default).
    Ignore,
}

/// Source of request body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Read from the stored input stream.
    Direct,
    /// Ask the user callback for bytes.
    Callback,
}

/// How the accumulated content is to be interpreted downstream. Only a tag;
/// nothing in the core enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Engine diagnostic event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEvent {
    Text,
    HeaderIn,
    HeaderOut,
    DataIn,
    DataOut,
}

pub(crate) struct WriteChannel {
    pub(crate) mode: WriteMode,
    pub(crate) kind: ContentKind,
    pub(crate) file: Option<FileSink>,
    pub(crate) callback: Option<WriteFn>,
    pub(crate) buf: BytesMut,
    pub(crate) content: Option<Bytes>,
}

pub(crate) struct HeaderChannel {
    pub(crate) mode: HeaderMode,
    pub(crate) file: Option<FileSink>,
    pub(crate) callback: Option<WriteFn>,
}

pub(crate) struct ReadChannel {
    pub(crate) mode: ReadMode,
    pub(crate) file: Option<FileSink>,
    pub(crate) descriptor: i64,
    pub(crate) callback: Option<ReadFn>,
}

/// Per-resource I/O dispatcher, registered once on the native handle.
///
/// The engine invokes the `recv_*`/`fill_body` methods from the thread
/// performing the transfer; invocation order on one transfer matches wire
/// arrival order.
pub struct TransferIo {
    handle: NativeHandle,
    pub(crate) write: WriteChannel,
    pub(crate) header: HeaderChannel,
    pub(crate) read: ReadChannel,
    pub(crate) header_in_body: bool,
    pub(crate) capture_sent_headers: bool,
    pub(crate) sent_headers: String,
}

pub type SharedIo = Arc<Mutex<TransferIo>>;

impl TransferIo {
    pub(crate) fn new(handle: NativeHandle) -> Self {
        TransferIo {
            handle,
            write: WriteChannel {
                mode: WriteMode::Stdout,
                kind: ContentKind::Text,
                file: None,
                callback: None,
                buf: BytesMut::new(),
                content: None,
            },
            header: HeaderChannel {
                mode: HeaderMode::Ignore,
                file: None,
                callback: None,
            },
            read: ReadChannel {
                mode: ReadMode::Direct,
                file: None,
                descriptor: 0,
                callback: None,
            },
            header_in_body: false,
            capture_sent_headers: false,
            sent_headers: String::new(),
        }
    }

    pub(crate) fn new_shared(handle: NativeHandle) -> SharedIo {
        Arc::new(Mutex::new(TransferIo::new(handle)))
    }

    /// Copy modes and destinations for a duplicated handle. Callbacks and
    /// file handles are shared with the source; buffers and captured state
    /// start fresh.
    pub(crate) fn duplicate_for(&self, handle: NativeHandle) -> TransferIo {
        TransferIo {
            handle,
            write: WriteChannel {
                mode: self.write.mode,
                kind: self.write.kind,
                file: self.write.file.clone(),
                callback: self.write.callback.clone(),
                buf: BytesMut::new(),
                content: None,
            },
            header: HeaderChannel {
                mode: self.header.mode,
                file: self.header.file.clone(),
                callback: self.header.callback.clone(),
            },
            read: ReadChannel {
                mode: self.read.mode,
                file: self.read.file.clone(),
                descriptor: self.read.descriptor,
                callback: self.read.callback.clone(),
            },
            header_in_body: self.header_in_body,
            capture_sent_headers: self.capture_sent_headers,
            sent_headers: String::new(),
        }
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Body bytes arrived. Returns the count accepted; any shortfall makes
    /// the engine abort the transfer.
    pub fn recv_body(&mut self, data: &[u8]) -> usize {
        match self.write.mode {
            WriteMode::Stdout => {
                let _ = std::io::stdout().write_all(data);
                data.len()
            }
            WriteMode::File => match &self.write.file {
                Some(f) => f.write(data),
                None => 0,
            },
            WriteMode::Buffer => {
                self.write.buf.extend_from_slice(data);
                data.len()
            }
            WriteMode::Callback => match self.write.callback.clone() {
                Some(cb) => match cb.lock() {
                    Ok(mut cb) => cb(self.handle, data),
                    Err(_) => 0,
                },
                None => 0,
            },
        }
    }

    /// Header bytes arrived. In Stdout mode with the body accumulating and
    /// the fold-in flag set, header bytes join the body buffer so the
    /// returned value carries the whole exchange.
    pub fn recv_header(&mut self, data: &[u8]) -> usize {
        match self.header.mode {
            HeaderMode::Stdout => {
                if self.header_in_body && self.write.mode == WriteMode::Buffer {
                    self.write.buf.extend_from_slice(data);
                } else {
                    let _ = std::io::stdout().write_all(data);
                }
                data.len()
            }
            HeaderMode::File => match &self.header.file {
                Some(f) => f.write(data),
                None => 0,
            },
            HeaderMode::Callback => match self.header.callback.clone() {
                Some(cb) => match cb.lock() {
                    Ok(mut cb) => cb(self.handle, data),
                    Err(_) => 0,
                },
                None => 0,
            },
            HeaderMode::Ignore => data.len(),
        }
    }

    /// The engine wants up to `buf.len()` request body bytes. `None` aborts
    /// the transfer; `Some(0)` is end of input.
    pub fn fill_body(&mut self, buf: &mut [u8]) -> Option<usize> {
        match self.read.mode {
            ReadMode::Direct => self.read.file.as_ref()?.read(buf),
            ReadMode::Callback => {
                let cb = self.read.callback.clone()?;
                let data = match cb.lock() {
                    Ok(mut cb) => cb(self.handle, self.read.descriptor, buf.len()),
                    Err(_) => return None,
                };
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Some(n)
            }
        }
    }

    /// Engine diagnostics. Only the outbound header text is kept, and only
    /// while capture is enabled.
    pub fn recv_debug(&mut self, event: DebugEvent, data: &[u8]) {
        if self.capture_sent_headers && event == DebugEvent::HeaderOut && !data.is_empty() {
            self.sent_headers = String::from_utf8_lossy(data).into_owned();
        }
    }

    /// Clear output state before a new perform.
    pub(crate) fn reset_output(&mut self) {
        self.write.buf.clear();
        self.write.content = None;
        self.sent_headers.clear();
    }

    pub(crate) fn clear_buffers(&mut self) {
        self.write.buf.clear();
        self.write.content = None;
    }

    /// Detach-once finalization of the accumulate buffer. A second call
    /// with nothing newly buffered hands back the same content.
    pub(crate) fn take_contents(&mut self) -> Bytes {
        if !self.write.buf.is_empty() {
            self.write.content = Some(self.write.buf.split().freeze());
        }
        self.write.content.clone().unwrap_or_default()
    }
}
