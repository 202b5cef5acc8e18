/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Concurrent transfer groups over one native multi handle.
//!
//! A group holds shared references to its member transfers so completion
//! events, which the engine reports by native handle, can be mapped back to
//! the member they belong to.

use std::time::Duration;

use thiserror::Error;

use crate::engine::{EngineCode, MultiEngine, NativeHandle, TransportDriver};
use crate::transfer::SharedTransfer;

/// Failures of a multi group. All are local and recoverable.
#[derive(Debug, Error)]
pub enum MultiError {
    #[error("multi handle is closed")]
    Closed,
    #[error("transfer handle is closed")]
    TransferClosed,
    #[error("transfer is already registered with a group")]
    AlreadyInGroup,
    #[error("multi engine error ({})", .0.as_num())]
    Engine(EngineCode),
}

/// One finished member transfer, drained from the group.
pub struct Completion {
    pub transfer: SharedTransfer,
    pub result: EngineCode,
}

/// A set of transfers driven concurrently by one native multi handle.
pub struct MultiGroup {
    engine: Option<Box<dyn MultiEngine>>,
    members: Vec<SharedTransfer>,
}

impl MultiGroup {
    pub fn new(driver: &dyn TransportDriver) -> Self {
        MultiGroup {
            engine: Some(driver.new_multi()),
            members: Vec::new(),
        }
    }

    /// Register a transfer with the group. A transfer belongs to at most
    /// one group at a time; membership keeps it alive until removal or
    /// group close.
    pub fn add(&mut self, transfer: SharedTransfer) -> Result<(), MultiError> {
        let engine = self.engine.as_mut().ok_or(MultiError::Closed)?;
        let handle = {
            let t = transfer.lock().unwrap();
            if t.in_group() {
                return Err(MultiError::AlreadyInGroup);
            }
            t.native_handle().ok_or(MultiError::TransferClosed)?
        };
        let status = engine.add(handle);
        if status.code != EngineCode::Ok {
            return Err(MultiError::Engine(status.code));
        }
        transfer.lock().unwrap().mark_in_group(true);
        self.members.push(transfer);
        Ok(())
    }

    /// Deregister a transfer: the first member with the same native handle
    /// is unregistered, matching by handle identity exactly like `find`.
    /// Removing a transfer that is not a member is not an error and leaves
    /// the engine untouched.
    pub fn remove(&mut self, transfer: &SharedTransfer) -> Result<(), MultiError> {
        let engine = self.engine.as_mut().ok_or(MultiError::Closed)?;
        let Some(handle) = transfer.lock().unwrap().native_handle() else {
            return Ok(());
        };
        let Some(pos) = self
            .members
            .iter()
            .position(|m| m.lock().unwrap().native_handle() == Some(handle))
        else {
            return Ok(());
        };
        let member = self.members.remove(pos);
        let _ = engine.remove(handle);
        member.lock().unwrap().mark_in_group(false);
        Ok(())
    }

    /// Map a native handle back to the member it belongs to. First
    /// registration order wins; comparison is by handle identity, never by
    /// caller object identity.
    pub fn find(&self, handle: NativeHandle) -> Option<SharedTransfer> {
        self.members
            .iter()
            .find(|m| m.lock().unwrap().native_handle() == Some(handle))
            .cloned()
    }

    /// Drive all members forward without blocking. Returns how many
    /// transfers are still running.
    pub fn perform(&mut self) -> Result<usize, MultiError> {
        let engine = self.engine.as_mut().ok_or(MultiError::Closed)?;
        let (status, running) = engine.perform();
        if status.code != EngineCode::Ok {
            return Err(MultiError::Engine(status.code));
        }
        Ok(running)
    }

    /// Block up to `timeout` for any member to become ready for further
    /// progress. Returns the number of ready transfers.
    pub fn poll(&mut self, timeout: Duration) -> Result<usize, MultiError> {
        let engine = self.engine.as_mut().ok_or(MultiError::Closed)?;
        Ok(engine.poll(timeout))
    }

    /// Drain the next completion event, mapped to its member. Events for
    /// handles no longer registered are discarded.
    pub fn next_completion(&mut self) -> Result<Option<Completion>, MultiError> {
        loop {
            let message = self
                .engine
                .as_mut()
                .ok_or(MultiError::Closed)?
                .next_message();
            let Some(message) = message else {
                return Ok(None);
            };
            if let Some(transfer) = self.find(message.handle) {
                return Ok(Some(Completion {
                    transfer,
                    result: message.result,
                }));
            }
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.engine.as_ref().map(|e| e.handle())
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    /// Release the native multi handle and every membership. Idempotent.
    /// Member transfers stay open; they can join another group afterwards.
    pub fn close(&mut self) {
        for member in self.members.drain(..) {
            member.lock().unwrap().mark_in_group(false);
        }
        self.engine = None;
    }
}

impl Drop for MultiGroup {
    fn drop(&mut self) {
        self.close();
    }
}
