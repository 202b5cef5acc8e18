/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Scriptable in-process engine for unit tests.
//!
//! Every handle records the options installed on it and replays a canned
//! transfer script through the registered sink dispatcher, exactly the way
//! a real engine would: outbound header diagnostics first, then header
//! chunks, then body chunks, honoring the accepted-count contract.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    EngineCode, EngineMessage, EngineStatus, EngineVersion, InfoField, InfoValue, MessageKind,
    MultiEngine, NativeHandle, TransferEngine, TransportDriver,
};
use crate::transfer::cleanup::{FormData, StringList};
use crate::transfer::option::{FileSink, IntOption, ListOption, StrOption};
use crate::transfer::sink::{DebugEvent, SharedIo};

#[derive(Default)]
pub(crate) struct MockScript {
    pub(crate) sent_header: Option<String>,
    pub(crate) header_chunks: Vec<Vec<u8>>,
    pub(crate) body_chunks: Vec<Vec<u8>>,
    /// When set, the transfer asks the read channel for request body bytes
    /// unless a zero body size was installed.
    pub(crate) wants_body: bool,
    pub(crate) result: EngineCode,
    pub(crate) info: Vec<(InfoField, InfoValue)>,
}

impl MockScript {
    fn duplicate(&self) -> MockScript {
        MockScript {
            sent_header: self.sent_header.clone(),
            header_chunks: self.header_chunks.clone(),
            body_chunks: self.body_chunks.clone(),
            wants_body: self.wants_body,
            result: self.result,
            info: self.info.clone(),
        }
    }
}

/// Recorded state of one mock transfer handle.
#[derive(Default)]
pub(crate) struct MockCore {
    pub(crate) io: Option<SharedIo>,
    pub(crate) int_opts: Vec<(IntOption, i64)>,
    pub(crate) str_opts: Vec<(StrOption, Arc<str>)>,
    pub(crate) body: Option<Arc<[u8]>>,
    pub(crate) body_sizes: Vec<u64>,
    pub(crate) forms: Vec<Arc<FormData>>,
    pub(crate) lists: Vec<(ListOption, Arc<StringList>)>,
    pub(crate) stderr_set: bool,
    pub(crate) script: MockScript,
    pub(crate) performs: u32,
    pub(crate) read_attempts: u32,
}

pub(crate) type SharedCore = Arc<Mutex<MockCore>>;

#[derive(Default)]
struct Registry {
    next: u64,
    cores: HashMap<u64, SharedCore>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn alloc_core(registry: &SharedRegistry, core: MockCore) -> (NativeHandle, SharedCore) {
    let mut reg = registry.lock().unwrap();
    reg.next += 1;
    let handle = NativeHandle::new(reg.next);
    let core = Arc::new(Mutex::new(core));
    reg.cores.insert(handle.value(), core.clone());
    (handle, core)
}

/// Replay one core's script through its installed dispatcher.
fn run_core(core: &SharedCore) -> EngineCode {
    let (io, script, skip_read) = {
        let core = core.lock().unwrap();
        let skip_read = core.body_sizes.last() == Some(&0) || core.body.is_some();
        (core.io.clone(), core.script.duplicate(), skip_read)
    };
    let Some(io) = io else {
        return EngineCode::FailedInit;
    };

    if script.wants_body && !skip_read {
        core.lock().unwrap().read_attempts += 1;
        let mut buf = [0u8; 256];
        if io.lock().unwrap().fill_body(&mut buf).is_none() {
            return EngineCode::ReadError;
        }
    }

    if let Some(header) = &script.sent_header {
        io.lock()
            .unwrap()
            .recv_debug(DebugEvent::HeaderOut, header.as_bytes());
    }
    for chunk in &script.header_chunks {
        if io.lock().unwrap().recv_header(chunk) != chunk.len() {
            return EngineCode::WriteError;
        }
    }
    for chunk in &script.body_chunks {
        if io.lock().unwrap().recv_body(chunk) != chunk.len() {
            return EngineCode::WriteError;
        }
    }

    core.lock().unwrap().performs += 1;
    script.result
}

pub(crate) struct MockDriver {
    registry: SharedRegistry,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        MockDriver {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Recorded state of a handle, for assertions. Cores outlive their
    /// engine so state stays inspectable after a resource is closed.
    pub(crate) fn core(&self, handle: NativeHandle) -> SharedCore {
        let reg = self.registry.lock().unwrap();
        reg.cores
            .get(&handle.value())
            .cloned()
            .unwrap_or_else(|| panic!("no mock core for handle {}", handle.value()))
    }
}

impl TransportDriver for MockDriver {
    fn new_transfer(&self) -> Box<dyn TransferEngine> {
        let (handle, core) = alloc_core(&self.registry, MockCore::default());
        Box::new(MockTransfer {
            handle,
            core,
            registry: self.registry.clone(),
        })
    }

    fn new_multi(&self) -> Box<dyn MultiEngine> {
        let mut reg = self.registry.lock().unwrap();
        reg.next += 1;
        Box::new(MockMulti {
            handle: NativeHandle::new(reg.next),
            registry: self.registry.clone(),
            members: Vec::new(),
            finished: VecDeque::new(),
            completed: Vec::new(),
        })
    }

    fn version(&self) -> EngineVersion {
        EngineVersion {
            version: "0.0-mock".to_string(),
            version_number: 0,
            age: 1,
            host: "test".to_string(),
            features: 0,
            ssl_version: None,
            ssl_version_number: 0,
            libz_version: None,
            protocols: vec!["http".to_string(), "https".to_string()],
        }
    }
}

struct MockTransfer {
    handle: NativeHandle,
    core: SharedCore,
    registry: SharedRegistry,
}

impl TransferEngine for MockTransfer {
    fn handle(&self) -> NativeHandle {
        self.handle
    }

    fn install_io(&mut self, io: SharedIo) {
        self.core.lock().unwrap().io = Some(io);
    }

    fn set_value(&mut self, opt: IntOption, value: i64) -> EngineStatus {
        self.core.lock().unwrap().int_opts.push((opt, value));
        EngineStatus::ok()
    }

    fn set_string(&mut self, opt: StrOption, value: Arc<str>) -> EngineStatus {
        self.core.lock().unwrap().str_opts.push((opt, value));
        EngineStatus::ok()
    }

    fn set_body(&mut self, body: Arc<[u8]>) -> EngineStatus {
        self.core.lock().unwrap().body = Some(body);
        EngineStatus::ok()
    }

    fn set_body_size(&mut self, size: u64) -> EngineStatus {
        self.core.lock().unwrap().body_sizes.push(size);
        EngineStatus::ok()
    }

    fn set_form(&mut self, form: Arc<FormData>) -> EngineStatus {
        self.core.lock().unwrap().forms.push(form);
        EngineStatus::ok()
    }

    fn set_list(&mut self, opt: ListOption, list: Arc<StringList>) -> EngineStatus {
        self.core.lock().unwrap().lists.push((opt, list));
        EngineStatus::ok()
    }

    fn set_stderr(&mut self, _sink: FileSink) -> EngineStatus {
        self.core.lock().unwrap().stderr_set = true;
        EngineStatus::ok()
    }

    fn perform(&mut self) -> EngineStatus {
        EngineStatus::from_code(run_core(&self.core))
    }

    fn info(&self, field: InfoField) -> Option<InfoValue> {
        let core = self.core.lock().unwrap();
        core.script
            .info
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.clone())
    }

    fn duplicate(&self) -> Box<dyn TransferEngine> {
        let copy = {
            let core = self.core.lock().unwrap();
            MockCore {
                io: None,
                int_opts: core.int_opts.clone(),
                str_opts: core.str_opts.clone(),
                body: core.body.clone(),
                body_sizes: core.body_sizes.clone(),
                forms: core.forms.clone(),
                lists: core.lists.clone(),
                stderr_set: core.stderr_set,
                script: core.script.duplicate(),
                performs: 0,
                read_attempts: 0,
            }
        };
        let (handle, core) = alloc_core(&self.registry, copy);
        Box::new(MockTransfer {
            handle,
            core,
            registry: self.registry.clone(),
        })
    }
}

struct MockMulti {
    handle: NativeHandle,
    registry: SharedRegistry,
    members: Vec<NativeHandle>,
    finished: VecDeque<EngineMessage>,
    completed: Vec<NativeHandle>,
}

impl MultiEngine for MockMulti {
    fn handle(&self) -> NativeHandle {
        self.handle
    }

    fn add(&mut self, transfer: NativeHandle) -> EngineStatus {
        self.members.push(transfer);
        EngineStatus::ok()
    }

    fn remove(&mut self, transfer: NativeHandle) -> EngineStatus {
        self.members.retain(|h| *h != transfer);
        self.completed.retain(|h| *h != transfer);
        self.finished.retain(|m| m.handle != transfer);
        EngineStatus::ok()
    }

    fn perform(&mut self) -> (EngineStatus, usize) {
        for handle in self.members.clone() {
            if self.completed.contains(&handle) {
                continue;
            }
            let core = {
                let reg = self.registry.lock().unwrap();
                reg.cores.get(&handle.value()).cloned()
            };
            let result = match core {
                Some(core) => run_core(&core),
                None => EngineCode::FailedInit,
            };
            self.completed.push(handle);
            self.finished.push_back(EngineMessage {
                kind: MessageKind::Done,
                handle,
                result,
            });
        }
        (EngineStatus::ok(), 0)
    }

    fn poll(&mut self, _timeout: Duration) -> usize {
        self.finished.len()
    }

    fn next_message(&mut self) -> Option<EngineMessage> {
        self.finished.pop_front()
    }
}
