/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use thiserror::Error;

use crate::engine::EngineCode;

/// Failures of a transfer resource. All are local and recoverable: the
/// resource stays usable after any of them.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer handle is closed")]
    Closed,
    #[error("unknown option identifier {0}")]
    UnknownOption(u32),
    #[error("invalid value for option {0}")]
    InvalidValue(&'static str),
    #[error("form construction failed: {0}")]
    FormBuild(String),
    #[error("engine error: {message} ({})", .code.as_num())]
    Engine { code: EngineCode, message: String },
}

impl TransferError {
    pub fn engine_code(&self) -> Option<EngineCode> {
        match self {
            TransferError::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}
