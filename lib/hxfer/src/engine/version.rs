/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

/// Capability snapshot of the underlying transport library.
///
/// Stateless: querying it never touches any transfer handle.
#[derive(Debug, Clone)]
pub struct EngineVersion {
    pub version: String,
    pub version_number: u32,
    pub age: u32,
    pub host: String,
    pub features: u64,
    pub ssl_version: Option<String>,
    pub ssl_version_number: u32,
    pub libz_version: Option<String>,
    pub protocols: Vec<String>,
}

impl EngineVersion {
    pub fn supports_protocol(&self, proto: &str) -> bool {
        self.protocols.iter().any(|p| p.eq_ignore_ascii_case(proto))
    }
}
