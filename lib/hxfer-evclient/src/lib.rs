/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Minimal async HTTP client with a process-wide idle connection cache.
//!
//! Independent of the transfer core: plain-http only, one exchange per
//! call. Keep-alive connections go back to a per-(host, port) bucket and
//! are reused by later exchanges to the same origin; a stale pooled
//! connection is retried once on a fresh one. Exchanges run inline
//! ([`get`], [`post`]) or on a spawned task ([`get_async`], [`post_async`])
//! whose [`ExchangeHandle`] is collected exactly once.

mod cache;
mod request;

mod error;
pub use error::ClientError;

pub mod url;
pub use url::Target;

pub mod response;
pub use response::HttpResponse;

pub mod exchange;
pub use exchange::{
    get, get_async, post, post_async, prepare, set_cache, ExchangeHandle, ExchangeMode,
};
