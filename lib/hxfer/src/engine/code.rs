/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::fmt;

/// Result code reported by the transport engine.
///
/// The numbering follows the classic transfer-library convention so that
/// embedders can surface the raw value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum EngineCode {
    #[default]
    Ok = 0,
    UnsupportedProtocol = 1,
    FailedInit = 2,
    UrlMalformat = 3,
    CouldntResolveProxy = 5,
    CouldntResolveHost = 6,
    CouldntConnect = 7,
    PartialFile = 18,
    HttpReturnedError = 22,
    WriteError = 23,
    ReadError = 26,
    OutOfMemory = 27,
    OperationTimedOut = 28,
    SslConnectError = 35,
    AbortedByCallback = 42,
    BadFunctionArgument = 43,
    TooManyRedirects = 47,
    GotNothing = 52,
    SendError = 55,
    RecvError = 56,
}

impl EngineCode {
    pub fn as_num(self) -> u32 {
        self as u32
    }

    pub fn message(self) -> &'static str {
        match self {
            EngineCode::Ok => "no error",
            EngineCode::UnsupportedProtocol => "unsupported protocol",
            EngineCode::FailedInit => "failed initialization",
            EngineCode::UrlMalformat => "URL using bad/illegal format",
            EngineCode::CouldntResolveProxy => "could not resolve proxy name",
            EngineCode::CouldntResolveHost => "could not resolve host name",
            EngineCode::CouldntConnect => "could not connect to server",
            EngineCode::PartialFile => "transferred a partial file",
            EngineCode::HttpReturnedError => "HTTP response code said error",
            EngineCode::WriteError => "failed writing received data",
            EngineCode::ReadError => "failed reading local data",
            EngineCode::OutOfMemory => "out of memory",
            EngineCode::OperationTimedOut => "timeout was reached",
            EngineCode::SslConnectError => "SSL connect error",
            EngineCode::AbortedByCallback => "operation was aborted by a callback",
            EngineCode::BadFunctionArgument => "a function was given a bad argument",
            EngineCode::TooManyRedirects => "number of redirects hit maximum amount",
            EngineCode::GotNothing => "server returned nothing",
            EngineCode::SendError => "failed sending data to the peer",
            EngineCode::RecvError => "failure when receiving data from the peer",
        }
    }
}

impl fmt::Display for EngineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.as_num())
    }
}

/// Outcome of one engine call: the result code plus the engine's error
/// buffer text for that call, empty on success.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    pub code: EngineCode,
    pub message: String,
}

impl EngineStatus {
    pub fn ok() -> Self {
        EngineStatus::default()
    }

    pub fn error(code: EngineCode, message: impl Into<String>) -> Self {
        EngineStatus {
            code,
            message: message.into(),
        }
    }

    pub fn from_code(code: EngineCode) -> Self {
        if code == EngineCode::Ok {
            EngineStatus::ok()
        } else {
            EngineStatus::error(code, code.message())
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == EngineCode::Ok
    }
}
