/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::io;

use thiserror::Error;

/// Failures of one client exchange.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("connect failed: {0:?}")]
    ConnectFailed(io::Error),
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
    #[error("exchange timed out")]
    TimedOut,
    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),
    #[error("response header too large")]
    TooLargeHeader,
    #[error("spawned exchange task failed")]
    TaskFailed,
}
