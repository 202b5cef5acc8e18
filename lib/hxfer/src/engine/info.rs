/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

/// Introspection fields a finished transfer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    EffectiveUrl,
    ContentType,
    HttpCode,
    HeaderSize,
    RequestSize,
    FileTime,
    SslVerifyResult,
    RedirectCount,
    TotalTime,
    NameLookupTime,
    ConnectTime,
    PreTransferTime,
    StartTransferTime,
    RedirectTime,
    SizeUpload,
    SizeDownload,
    SpeedDownload,
    SpeedUpload,
    ContentLengthDownload,
    ContentLengthUpload,
    RequestHeader,
}

impl InfoField {
    /// Every field the all-fields query walks, in its reporting order.
    /// `RequestHeader` is excluded: it is resource state, not engine state.
    pub(crate) const ENGINE_FIELDS: &'static [InfoField] = &[
        InfoField::EffectiveUrl,
        InfoField::ContentType,
        InfoField::HttpCode,
        InfoField::HeaderSize,
        InfoField::RequestSize,
        InfoField::FileTime,
        InfoField::SslVerifyResult,
        InfoField::RedirectCount,
        InfoField::TotalTime,
        InfoField::NameLookupTime,
        InfoField::ConnectTime,
        InfoField::PreTransferTime,
        InfoField::SizeUpload,
        InfoField::SizeDownload,
        InfoField::SpeedDownload,
        InfoField::SpeedUpload,
        InfoField::ContentLengthDownload,
        InfoField::ContentLengthUpload,
        InfoField::StartTransferTime,
        InfoField::RedirectTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InfoField::EffectiveUrl => "url",
            InfoField::ContentType => "content_type",
            InfoField::HttpCode => "http_code",
            InfoField::HeaderSize => "header_size",
            InfoField::RequestSize => "request_size",
            InfoField::FileTime => "filetime",
            InfoField::SslVerifyResult => "ssl_verify_result",
            InfoField::RedirectCount => "redirect_count",
            InfoField::TotalTime => "total_time",
            InfoField::NameLookupTime => "namelookup_time",
            InfoField::ConnectTime => "connect_time",
            InfoField::PreTransferTime => "pretransfer_time",
            InfoField::StartTransferTime => "starttransfer_time",
            InfoField::RedirectTime => "redirect_time",
            InfoField::SizeUpload => "size_upload",
            InfoField::SizeDownload => "size_download",
            InfoField::SpeedDownload => "speed_download",
            InfoField::SpeedUpload => "speed_upload",
            InfoField::ContentLengthDownload => "download_content_length",
            InfoField::ContentLengthUpload => "upload_content_length",
            InfoField::RequestHeader => "request_header",
        }
    }
}

/// Scalar value of one info field.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Str(String),
    Int(i64),
    Float(f64),
}
