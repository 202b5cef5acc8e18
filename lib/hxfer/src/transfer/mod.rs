/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! The per-transfer resource: option state machine, pluggable I/O
//! redirection and blocking execution over one native engine handle.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use log::warn;

use crate::config;
use crate::engine::{
    EngineCode, EngineStatus, InfoField, InfoValue, NativeHandle, TransferEngine, TransportDriver,
};

pub mod cleanup;
use cleanup::{CleanupList, FormData, SharedCleanup, StringList};

pub mod option;
pub use option::{
    FileSink, IntOption, ListOption, OptValue, ReadFn, SinkOption, StrOption, TransferOption,
    WriteFn,
};

pub mod sink;
pub use sink::{ContentKind, DebugEvent, HeaderMode, ReadMode, SharedIo, TransferIo, WriteMode};

mod error;
pub use error::TransferError;

/// Transfers shared with a multi group; the group keeps members alive while
/// they are registered.
pub type SharedTransfer = Arc<Mutex<Transfer>>;

/// Result of a successful `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Accumulate mode: the finalized response bytes (possibly empty).
    Body(Bytes),
    /// Any other redirection mode.
    Done,
}

impl ExecOutcome {
    pub fn into_body(self) -> Option<Bytes> {
        match self {
            ExecOutcome::Body(b) => Some(b),
            ExecOutcome::Done => None,
        }
    }
}

/// One transfer resource over a native engine handle.
pub struct Transfer {
    engine: Option<Box<dyn TransferEngine>>,
    io: SharedIo,
    to_free: SharedCleanup,
    url: String,
    error_code: EngineCode,
    error_message: String,
    empty_post: bool,
    in_group: bool,
}

impl Transfer {
    /// Create a resource with the fixed baseline configuration applied to
    /// the fresh native handle.
    pub fn new(driver: &dyn TransportDriver, url: &str) -> Self {
        let mut engine = driver.new_transfer();
        let io = TransferIo::new_shared(engine.handle());
        engine.install_io(io.clone());

        let defaults = config::transfer_defaults();
        let _ = engine.set_value(IntOption::NoProgress, 1);
        let _ = engine.set_value(IntOption::Verbose, 0);
        // the global DNS cache is not thread safe; use a local one instead
        let _ = engine.set_value(IntOption::DnsUseGlobalCache, 0);
        let _ = engine.set_value(IntOption::DnsCacheTimeout, 120);
        // no infinite redirects
        let _ = engine.set_value(IntOption::MaxRedirs, 20);
        // no signal based timeouts, for multithreaded hosts
        let _ = engine.set_value(IntOption::NoSignal, 1);
        let _ = engine.set_value(
            IntOption::Timeout,
            defaults.transfer_timeout.as_secs() as i64,
        );
        let _ = engine.set_value(
            IntOption::ConnectTimeout,
            defaults.connect_timeout.as_secs() as i64,
        );

        let to_free = CleanupList::new_shared();
        if !url.is_empty() {
            let copy: Arc<str> = Arc::from(url);
            to_free.lock().unwrap().track_string(copy.clone());
            let _ = engine.set_string(StrOption::Url, copy);
        }

        Transfer {
            engine: Some(engine),
            io,
            to_free,
            url: url.to_string(),
            error_code: EngineCode::Ok,
            error_message: String::new(),
            empty_post: true,
            in_group: false,
        }
    }

    /// Duplicate this resource onto a new native handle.
    ///
    /// The duplicate handle references the same installed option strings,
    /// so the cleanup list is shared by reference and survives until both
    /// owners are closed. Redirection modes and destinations are copied;
    /// the sink dispatcher is re-installed so data lands in the duplicate.
    pub fn duplicate(&self) -> Result<Transfer, TransferError> {
        let engine = self.engine.as_ref().ok_or(TransferError::Closed)?;
        let mut dup_engine = engine.duplicate();
        let io = Arc::new(Mutex::new(
            self.io
                .lock()
                .unwrap()
                .duplicate_for(dup_engine.handle()),
        ));
        dup_engine.install_io(io.clone());

        Ok(Transfer {
            engine: Some(dup_engine),
            io,
            to_free: self.to_free.clone(),
            url: self.url.clone(),
            error_code: EngineCode::Ok,
            error_message: String::new(),
            empty_post: self.empty_post,
            in_group: false,
        })
    }

    fn engine_mut(&mut self) -> Result<&mut Box<dyn TransferEngine>, TransferError> {
        self.engine.as_mut().ok_or(TransferError::Closed)
    }

    fn record(&mut self, status: EngineStatus) -> Result<(), TransferError> {
        self.error_code = status.code;
        self.error_message = status.message;
        if self.error_code == EngineCode::Ok {
            Ok(())
        } else {
            Err(TransferError::Engine {
                code: self.error_code,
                message: self.error_message.clone(),
            })
        }
    }

    /// Apply one option. Configuration failures are recoverable: the
    /// resource can be retried with corrected input.
    pub fn set_option(
        &mut self,
        option: TransferOption,
        value: OptValue,
    ) -> Result<(), TransferError> {
        if self.engine.is_none() {
            return Err(TransferError::Closed);
        }

        match option {
            TransferOption::Int(opt) => {
                let v = value
                    .as_int()
                    .ok_or(TransferError::InvalidValue(opt.name()))?;
                let status = self.engine_mut()?.set_value(opt, v);
                self.record(status)
            }
            TransferOption::ReturnTransfer => {
                let on = value
                    .truthy()
                    .ok_or(TransferError::InvalidValue("return_transfer"))?;
                let mut io = self.io.lock().unwrap();
                io.write.mode = if on {
                    WriteMode::Buffer
                } else {
                    WriteMode::Stdout
                };
                Ok(())
            }
            TransferOption::BinaryTransfer => {
                let on = value
                    .truthy()
                    .ok_or(TransferError::InvalidValue("binary_transfer"))?;
                self.io.lock().unwrap().write.kind = if on {
                    ContentKind::Binary
                } else {
                    ContentKind::Text
                };
                Ok(())
            }
            TransferOption::HeaderInBody => {
                let on = value
                    .truthy()
                    .ok_or(TransferError::InvalidValue("header_in_body"))?;
                self.io.lock().unwrap().header_in_body = on;
                Ok(())
            }
            TransferOption::Str(opt) => {
                let OptValue::Str(s) = value else {
                    return Err(TransferError::InvalidValue(opt.name()));
                };
                let copy: Arc<str> = Arc::from(s);
                self.to_free.lock().unwrap().track_string(copy.clone());
                let status = self.engine_mut()?.set_string(opt, copy);
                self.record(status)
            }
            TransferOption::Sink(which) => {
                let OptValue::File(sink) = value else {
                    return Err(TransferError::InvalidValue(which.name()));
                };
                match which {
                    SinkOption::OutputFile => {
                        let mut io = self.io.lock().unwrap();
                        io.write.file = Some(sink);
                        io.write.mode = WriteMode::File;
                        Ok(())
                    }
                    SinkOption::HeaderFile => {
                        let mut io = self.io.lock().unwrap();
                        io.header.file = Some(sink);
                        io.header.mode = HeaderMode::File;
                        Ok(())
                    }
                    SinkOption::InputFile => {
                        {
                            let mut io = self.io.lock().unwrap();
                            io.read.descriptor = sink.descriptor();
                            io.read.file = Some(sink);
                            io.read.mode = ReadMode::Direct;
                        }
                        self.empty_post = false;
                        Ok(())
                    }
                    SinkOption::StderrFile => {
                        let status = self.engine_mut()?.set_stderr(sink);
                        self.record(status)
                    }
                }
            }
            TransferOption::WriteFunction => {
                let OptValue::WriteFn(f) = value else {
                    return Err(TransferError::InvalidValue("write_function"));
                };
                let mut io = self.io.lock().unwrap();
                io.write.callback = Some(f);
                io.write.mode = WriteMode::Callback;
                Ok(())
            }
            TransferOption::HeaderFunction => {
                let OptValue::WriteFn(f) = value else {
                    return Err(TransferError::InvalidValue("header_function"));
                };
                let mut io = self.io.lock().unwrap();
                io.header.callback = Some(f);
                io.header.mode = HeaderMode::Callback;
                Ok(())
            }
            TransferOption::ReadFunction => {
                let OptValue::ReadFn(f) = value else {
                    return Err(TransferError::InvalidValue("read_function"));
                };
                {
                    let mut io = self.io.lock().unwrap();
                    io.read.callback = Some(f);
                    io.read.mode = ReadMode::Callback;
                }
                self.empty_post = false;
                Ok(())
            }
            TransferOption::PostFields => {
                self.empty_post = false;
                match value {
                    OptValue::Fields(fields) => {
                        let form = Arc::new(FormData::from_fields(&fields)?);
                        self.to_free.lock().unwrap().track_form(form.clone());
                        let status = self.engine_mut()?.set_form(form);
                        self.record(status)
                    }
                    OptValue::Str(s) => self.install_raw_body(s.into_bytes()),
                    OptValue::Bytes(b) => self.install_raw_body(b),
                    _ => Err(TransferError::InvalidValue("post_fields")),
                }
            }
            TransferOption::List(opt) => {
                let OptValue::List(items) = value else {
                    warn!("option {} requires a list of strings", opt.name());
                    return Err(TransferError::InvalidValue(opt.name()));
                };
                let mut list = StringList::default();
                {
                    let mut to_free = self.to_free.lock().unwrap();
                    for item in items {
                        let entry: Arc<str> = Arc::from(item);
                        to_free.track_string(entry.clone());
                        list.append(entry);
                    }
                }
                let list = Arc::new(list);
                self.to_free.lock().unwrap().track_list(list.clone());
                let status = self.engine_mut()?.set_list(opt, list);
                self.record(status)
            }
            TransferOption::CaptureRequestHeader => {
                let on = value
                    .truthy()
                    .ok_or(TransferError::InvalidValue("capture_request_header"))?;
                self.io.lock().unwrap().capture_sent_headers = on;
                let status = self.engine_mut()?.set_value(IntOption::Verbose, on as i64);
                self.record(status)
            }
        }
    }

    fn install_raw_body(&mut self, bytes: Vec<u8>) -> Result<(), TransferError> {
        let body: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
        let size = body.len() as u64;
        self.to_free.lock().unwrap().track_bytes(body.clone());
        let status = self.engine_mut()?.set_body(body);
        self.record(status)?;
        let status = self.engine_mut()?.set_body_size(size);
        self.record(status)
    }

    /// Apply one option addressed by its wire-level identifier.
    pub fn set_option_id(&mut self, id: u32, value: OptValue) -> Result<(), TransferError> {
        let option = TransferOption::from_id(id).ok_or(TransferError::UnknownOption(id))?;
        self.set_option(option, value)
    }

    /// Apply a batch of options, stopping at the first failure.
    pub fn set_options<I>(&mut self, options: I) -> Result<(), TransferError>
    where
        I: IntoIterator<Item = (TransferOption, OptValue)>,
    {
        for (option, value) in options {
            self.set_option(option, value)?;
        }
        Ok(())
    }

    /// Run the transfer to completion, blocking the calling thread.
    ///
    /// A body-less request explicitly tells the engine its size is zero so
    /// the read channel is never consulted. Partial-file results count as
    /// success (the expected code for HEAD-style requests).
    pub fn execute(&mut self) -> Result<ExecOutcome, TransferError> {
        if self.engine.is_none() {
            return Err(TransferError::Closed);
        }
        if self.empty_post {
            let _ = self.engine_mut()?.set_body_size(0);
        }

        self.io.lock().unwrap().reset_output();
        self.error_code = EngineCode::Ok;
        self.error_message.clear();

        let status = self.engine_mut()?.perform();
        self.error_code = status.code;
        self.error_message = status.message;

        if self.error_code != EngineCode::Ok && self.error_code != EngineCode::PartialFile {
            self.io.lock().unwrap().clear_buffers();
            return Err(TransferError::Engine {
                code: self.error_code,
                message: self.error_message.clone(),
            });
        }

        let mut io = self.io.lock().unwrap();
        if io.write.mode == WriteMode::Buffer {
            Ok(ExecOutcome::Body(io.take_contents()))
        } else {
            Ok(ExecOutcome::Done)
        }
    }

    /// Accumulated response bytes, when the write channel accumulates.
    /// Detach-once: repeated calls after a transfer return the same bytes.
    pub fn contents(&self) -> Option<Bytes> {
        let mut io = self.io.lock().unwrap();
        if io.write.mode == WriteMode::Buffer {
            Some(io.take_contents())
        } else {
            None
        }
    }

    /// Captured outbound request header text, when diagnostic capture was
    /// enabled for the last transfer.
    pub fn captured_header(&self) -> Option<String> {
        let io = self.io.lock().unwrap();
        if io.sent_headers.is_empty() {
            None
        } else {
            Some(io.sent_headers.clone())
        }
    }

    /// Query one info field of the last transfer.
    pub fn info(&self, field: InfoField) -> Option<InfoValue> {
        if field == InfoField::RequestHeader {
            return self.captured_header().map(InfoValue::Str);
        }
        self.engine.as_ref()?.info(field)
    }

    /// Query every available info field, in reporting order.
    pub fn info_map(&self) -> Vec<(InfoField, InfoValue)> {
        let mut out = Vec::new();
        if let Some(engine) = &self.engine {
            for field in InfoField::ENGINE_FIELDS {
                if let Some(value) = engine.info(*field) {
                    out.push((*field, value));
                }
            }
        }
        if let Some(header) = self.captured_header() {
            out.push((InfoField::RequestHeader, InfoValue::Str(header)));
        }
        out
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.engine.as_ref().map(|e| e.handle())
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn error_code(&self) -> EngineCode {
        self.error_code
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub(crate) fn in_group(&self) -> bool {
        self.in_group
    }

    pub(crate) fn mark_in_group(&mut self, value: bool) {
        self.in_group = value;
    }

    /// Release the native handle and this owner's cleanup-list reference.
    /// Idempotent; every later operation fails with `Closed`.
    pub fn close(&mut self) {
        self.engine = None;
        self.to_free = CleanupList::new_shared();
    }
}

impl Drop for Transfer {
    fn drop(&mut self) {
        self.close();
    }
}
