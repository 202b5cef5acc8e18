/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Boundary to the underlying transport library.
//!
//! The engine owns sockets, TLS, DNS and redirect following; this crate only
//! drives it through the traits below. Implementations deliver response
//! bytes through the [`TransferIo`](crate::transfer::TransferIo) dispatcher
//! installed on each transfer handle.

use std::sync::Arc;
use std::time::Duration;

use crate::transfer::cleanup::{FormData, StringList};
use crate::transfer::option::{IntOption, ListOption, StrOption};
use crate::transfer::sink::SharedIo;
use crate::transfer::FileSink;

mod code;
pub use code::{EngineCode, EngineStatus};

mod info;
pub use info::{InfoField, InfoValue};

mod version;
pub use version::EngineVersion;

#[cfg(test)]
pub(crate) mod mock;

/// Identity of a native transfer or group handle.
///
/// The engine reports completion events by this value, so group membership
/// lookups compare it, never caller object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub const fn new(value: u64) -> Self {
        NativeHandle(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Kind of a drained completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Done,
}

/// One completion event drained from a multi handle.
#[derive(Debug, Clone)]
pub struct EngineMessage {
    pub kind: MessageKind,
    pub handle: NativeHandle,
    pub result: EngineCode,
}

/// One native transfer handle.
///
/// String, body, form and list setters take `Arc` values: the engine keeps a
/// cheap shared reference while the resource's cleanup list keeps the backing
/// allocation alive until the last owner is closed.
pub trait TransferEngine: Send {
    fn handle(&self) -> NativeHandle;

    /// Register the per-resource sink dispatcher. Called once at
    /// construction and again on every duplicated handle, so that data
    /// always lands in the duplicate's own channels.
    fn install_io(&mut self, io: SharedIo);

    fn set_value(&mut self, opt: IntOption, value: i64) -> EngineStatus;
    fn set_string(&mut self, opt: StrOption, value: Arc<str>) -> EngineStatus;
    fn set_body(&mut self, body: Arc<[u8]>) -> EngineStatus;
    fn set_body_size(&mut self, size: u64) -> EngineStatus;
    fn set_form(&mut self, form: Arc<FormData>) -> EngineStatus;
    fn set_list(&mut self, opt: ListOption, list: Arc<StringList>) -> EngineStatus;
    fn set_stderr(&mut self, sink: FileSink) -> EngineStatus;

    /// Run the transfer to completion, blocking the calling thread.
    fn perform(&mut self) -> EngineStatus;

    fn info(&self, field: InfoField) -> Option<InfoValue>;

    /// Duplicate the native handle. Option strings installed on the source
    /// are referenced, not re-allocated, by the duplicate.
    fn duplicate(&self) -> Box<dyn TransferEngine>;
}

/// One native multi handle driving a set of registered transfers.
pub trait MultiEngine: Send {
    fn handle(&self) -> NativeHandle;

    fn add(&mut self, transfer: NativeHandle) -> EngineStatus;
    fn remove(&mut self, transfer: NativeHandle) -> EngineStatus;

    /// Drive all registered transfers forward without blocking. Returns the
    /// call status and how many transfers are still running.
    fn perform(&mut self) -> (EngineStatus, usize);

    /// Block up to `timeout` waiting for any registered transfer to become
    /// ready for further progress. Returns the number of ready transfers.
    fn poll(&mut self, timeout: Duration) -> usize;

    /// Drain one completion event, if any is queued.
    fn next_message(&mut self) -> Option<EngineMessage>;
}

/// Factory for the two native handle kinds plus library introspection.
pub trait TransportDriver {
    fn new_transfer(&self) -> Box<dyn TransferEngine>;
    fn new_multi(&self) -> Box<dyn MultiEngine>;
    fn version(&self) -> EngineVersion;
}
