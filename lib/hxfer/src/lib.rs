/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Embeddable HTTP transfer subsystem.
//!
//! A host program configures a [`Transfer`] resource with options, then
//! either executes it alone (one blocking exchange) or registers it with a
//! [`MultiGroup`] that drives many transfers cooperatively. The underlying
//! transport library (sockets, TLS, DNS, redirect following) is not part of
//! this crate: it plugs in through the traits in [`engine`].

pub mod config;
pub mod engine;
pub mod multi;
pub mod transfer;

pub use config::TransferDefaults;
pub use engine::{
    EngineCode, EngineMessage, EngineStatus, EngineVersion, InfoField, InfoValue, MessageKind,
    MultiEngine, NativeHandle, TransferEngine, TransportDriver,
};
pub use multi::{Completion, MultiError, MultiGroup};
pub use transfer::{
    ExecOutcome, FileSink, OptValue, SharedTransfer, Transfer, TransferError, TransferOption,
};
