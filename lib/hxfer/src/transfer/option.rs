/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use crate::engine::NativeHandle;

/// Scalar options forwarded verbatim to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOption {
    Verbose,
    IncludeHeader,
    NoProgress,
    NoBody,
    FailOnError,
    Upload,
    Post,
    HttpGet,
    Put,
    NetRc,
    Timeout,
    ConnectTimeout,
    LowSpeedLimit,
    LowSpeedTime,
    ResumeFrom,
    InFileSize,
    PostFieldSize,
    MaxRedirs,
    MaxConnects,
    FreshConnect,
    ForbidReuse,
    FollowLocation,
    AutoReferer,
    UnrestrictedAuth,
    HttpAuth,
    ProxyAuth,
    ProxyPort,
    ProxyType,
    HttpProxyTunnel,
    Port,
    BufferSize,
    TcpNoDelay,
    NoSignal,
    IpResolve,
    HttpVersion,
    SslVersion,
    SslVerifyPeer,
    SslVerifyHost,
    DnsUseGlobalCache,
    DnsCacheTimeout,
    CookieSession,
    FileTime,
    TimeValue,
    TimeCondition,
    TransferText,
    Crlf,
}

/// String options duplicated into the cleanup list and forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrOption {
    Url,
    Proxy,
    UserPwd,
    ProxyUserPwd,
    Range,
    CustomRequest,
    UserAgent,
    Referer,
    Interface,
    Cookie,
    CookieFile,
    CookieJar,
    Encoding,
    Private,
    CaInfo,
    CaPath,
    SslCert,
    SslCertType,
    SslKey,
    SslKeyType,
    SslKeyPasswd,
    SslEngine,
    SslCipherList,
    RandomFile,
    EgdSocket,
}

/// Options taking an ordered string list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOption {
    HttpHeaders,
    Quote,
    PostQuote,
    Http200Aliases,
}

/// Options taking an open-file capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOption {
    OutputFile,
    InputFile,
    HeaderFile,
    StderrFile,
}

/// The full option surface of a transfer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOption {
    Int(IntOption),
    Str(StrOption),
    List(ListOption),
    Sink(SinkOption),
    /// Local flag: accumulate the response and hand it back from `execute`
    /// instead of echoing it to standard output.
    ReturnTransfer,
    /// Local flag: tag the accumulated content as binary instead of text.
    BinaryTransfer,
    /// Local flag: when returning the transfer, also fold header bytes into
    /// the returned value (historical behavior, off by default).
    HeaderInBody,
    WriteFunction,
    ReadFunction,
    HeaderFunction,
    PostFields,
    /// Diagnostic toggle: capture the outbound request header text.
    CaptureRequestHeader,
}

impl TransferOption {
    pub fn name(self) -> &'static str {
        match self {
            TransferOption::Int(o) => o.name(),
            TransferOption::Str(o) => o.name(),
            TransferOption::List(o) => o.name(),
            TransferOption::Sink(o) => o.name(),
            TransferOption::ReturnTransfer => "return_transfer",
            TransferOption::BinaryTransfer => "binary_transfer",
            TransferOption::HeaderInBody => "header_in_body",
            TransferOption::WriteFunction => "write_function",
            TransferOption::ReadFunction => "read_function",
            TransferOption::HeaderFunction => "header_function",
            TransferOption::PostFields => "post_fields",
            TransferOption::CaptureRequestHeader => "capture_request_header",
        }
    }
}

impl IntOption {
    pub fn name(self) -> &'static str {
        match self {
            IntOption::Verbose => "verbose",
            IntOption::IncludeHeader => "include_header",
            IntOption::NoProgress => "no_progress",
            IntOption::NoBody => "no_body",
            IntOption::FailOnError => "fail_on_error",
            IntOption::Upload => "upload",
            IntOption::Post => "post",
            IntOption::HttpGet => "http_get",
            IntOption::Put => "put",
            IntOption::NetRc => "netrc",
            IntOption::Timeout => "timeout",
            IntOption::ConnectTimeout => "connect_timeout",
            IntOption::LowSpeedLimit => "low_speed_limit",
            IntOption::LowSpeedTime => "low_speed_time",
            IntOption::ResumeFrom => "resume_from",
            IntOption::InFileSize => "infile_size",
            IntOption::PostFieldSize => "post_field_size",
            IntOption::MaxRedirs => "max_redirs",
            IntOption::MaxConnects => "max_connects",
            IntOption::FreshConnect => "fresh_connect",
            IntOption::ForbidReuse => "forbid_reuse",
            IntOption::FollowLocation => "follow_location",
            IntOption::AutoReferer => "auto_referer",
            IntOption::UnrestrictedAuth => "unrestricted_auth",
            IntOption::HttpAuth => "http_auth",
            IntOption::ProxyAuth => "proxy_auth",
            IntOption::ProxyPort => "proxy_port",
            IntOption::ProxyType => "proxy_type",
            IntOption::HttpProxyTunnel => "http_proxy_tunnel",
            IntOption::Port => "port",
            IntOption::BufferSize => "buffer_size",
            IntOption::TcpNoDelay => "tcp_nodelay",
            IntOption::NoSignal => "no_signal",
            IntOption::IpResolve => "ip_resolve",
            IntOption::HttpVersion => "http_version",
            IntOption::SslVersion => "ssl_version",
            IntOption::SslVerifyPeer => "ssl_verify_peer",
            IntOption::SslVerifyHost => "ssl_verify_host",
            IntOption::DnsUseGlobalCache => "dns_use_global_cache",
            IntOption::DnsCacheTimeout => "dns_cache_timeout",
            IntOption::CookieSession => "cookie_session",
            IntOption::FileTime => "file_time",
            IntOption::TimeValue => "time_value",
            IntOption::TimeCondition => "time_condition",
            IntOption::TransferText => "transfer_text",
            IntOption::Crlf => "crlf",
        }
    }
}

impl StrOption {
    pub fn name(self) -> &'static str {
        match self {
            StrOption::Url => "url",
            StrOption::Proxy => "proxy",
            StrOption::UserPwd => "userpwd",
            StrOption::ProxyUserPwd => "proxy_userpwd",
            StrOption::Range => "range",
            StrOption::CustomRequest => "custom_request",
            StrOption::UserAgent => "user_agent",
            StrOption::Referer => "referer",
            StrOption::Interface => "interface",
            StrOption::Cookie => "cookie",
            StrOption::CookieFile => "cookie_file",
            StrOption::CookieJar => "cookie_jar",
            StrOption::Encoding => "encoding",
            StrOption::Private => "private",
            StrOption::CaInfo => "ca_info",
            StrOption::CaPath => "ca_path",
            StrOption::SslCert => "ssl_cert",
            StrOption::SslCertType => "ssl_cert_type",
            StrOption::SslKey => "ssl_key",
            StrOption::SslKeyType => "ssl_key_type",
            StrOption::SslKeyPasswd => "ssl_key_passwd",
            StrOption::SslEngine => "ssl_engine",
            StrOption::SslCipherList => "ssl_cipher_list",
            StrOption::RandomFile => "random_file",
            StrOption::EgdSocket => "egd_socket",
        }
    }
}

impl ListOption {
    pub fn name(self) -> &'static str {
        match self {
            ListOption::HttpHeaders => "http_headers",
            ListOption::Quote => "quote",
            ListOption::PostQuote => "post_quote",
            ListOption::Http200Aliases => "http200_aliases",
        }
    }
}

impl SinkOption {
    pub fn name(self) -> &'static str {
        match self {
            SinkOption::OutputFile => "output_file",
            SinkOption::InputFile => "input_file",
            SinkOption::HeaderFile => "header_file",
            SinkOption::StderrFile => "stderr_file",
        }
    }
}

// Boundary identifiers: the classic numbering scheme, kept only for
// translation at the embedding seam. Long options live below 10000, object
// options in the 10000 range, function options in the 20000 range; the two
// local flags use the host-assigned values outside every engine range.
const ID_LONG: u32 = 0;
const ID_OBJECT: u32 = 10_000;
const ID_FUNCTION: u32 = 20_000;
const ID_RETURN_TRANSFER: u32 = 19_913;
const ID_BINARY_TRANSFER: u32 = 19_914;
const ID_HEADER_IN_BODY: u32 = 19_915;
const ID_CAPTURE_REQUEST_HEADER: u32 = 2;

impl TransferOption {
    /// Translate a wire-level option identifier. Unknown identifiers yield
    /// `None`; callers report them without touching the engine.
    pub fn from_id(id: u32) -> Option<TransferOption> {
        use TransferOption as T;

        let opt = match id {
            ID_CAPTURE_REQUEST_HEADER => T::CaptureRequestHeader,
            ID_RETURN_TRANSFER => T::ReturnTransfer,
            ID_BINARY_TRANSFER => T::BinaryTransfer,
            ID_HEADER_IN_BODY => T::HeaderInBody,

            v if v == ID_LONG + 13 => T::Int(IntOption::Timeout),
            v if v == ID_LONG + 14 => T::Int(IntOption::InFileSize),
            v if v == ID_LONG + 19 => T::Int(IntOption::LowSpeedLimit),
            v if v == ID_LONG + 20 => T::Int(IntOption::LowSpeedTime),
            v if v == ID_LONG + 21 => T::Int(IntOption::ResumeFrom),
            v if v == ID_LONG + 27 => T::Int(IntOption::Crlf),
            v if v == ID_LONG + 32 => T::Int(IntOption::SslVersion),
            v if v == ID_LONG + 33 => T::Int(IntOption::TimeCondition),
            v if v == ID_LONG + 34 => T::Int(IntOption::TimeValue),
            v if v == ID_LONG + 41 => T::Int(IntOption::Verbose),
            v if v == ID_LONG + 42 => T::Int(IntOption::IncludeHeader),
            v if v == ID_LONG + 43 => T::Int(IntOption::NoProgress),
            v if v == ID_LONG + 44 => T::Int(IntOption::NoBody),
            v if v == ID_LONG + 45 => T::Int(IntOption::FailOnError),
            v if v == ID_LONG + 46 => T::Int(IntOption::Upload),
            v if v == ID_LONG + 47 => T::Int(IntOption::Post),
            v if v == ID_LONG + 51 => T::Int(IntOption::NetRc),
            v if v == ID_LONG + 52 => T::Int(IntOption::FollowLocation),
            v if v == ID_LONG + 53 => T::Int(IntOption::TransferText),
            v if v == ID_LONG + 54 => T::Int(IntOption::Put),
            v if v == ID_LONG + 58 => T::Int(IntOption::AutoReferer),
            v if v == ID_LONG + 59 => T::Int(IntOption::ProxyPort),
            v if v == ID_LONG + 60 => T::Int(IntOption::PostFieldSize),
            v if v == ID_LONG + 61 => T::Int(IntOption::HttpProxyTunnel),
            v if v == ID_LONG + 64 => T::Int(IntOption::SslVerifyPeer),
            v if v == ID_LONG + 68 => T::Int(IntOption::MaxRedirs),
            v if v == ID_LONG + 69 => T::Int(IntOption::FileTime),
            v if v == ID_LONG + 71 => T::Int(IntOption::MaxConnects),
            v if v == ID_LONG + 74 => T::Int(IntOption::FreshConnect),
            v if v == ID_LONG + 75 => T::Int(IntOption::ForbidReuse),
            v if v == ID_LONG + 78 => T::Int(IntOption::ConnectTimeout),
            v if v == ID_LONG + 80 => T::Int(IntOption::HttpGet),
            v if v == ID_LONG + 81 => T::Int(IntOption::SslVerifyHost),
            v if v == ID_LONG + 84 => T::Int(IntOption::HttpVersion),
            v if v == ID_LONG + 91 => T::Int(IntOption::DnsUseGlobalCache),
            v if v == ID_LONG + 92 => T::Int(IntOption::DnsCacheTimeout),
            v if v == ID_LONG + 96 => T::Int(IntOption::CookieSession),
            v if v == ID_LONG + 98 => T::Int(IntOption::BufferSize),
            v if v == ID_LONG + 99 => T::Int(IntOption::NoSignal),
            v if v == ID_LONG + 101 => T::Int(IntOption::ProxyType),
            v if v == ID_LONG + 105 => T::Int(IntOption::UnrestrictedAuth),
            v if v == ID_LONG + 107 => T::Int(IntOption::HttpAuth),
            v if v == ID_LONG + 111 => T::Int(IntOption::ProxyAuth),
            v if v == ID_LONG + 113 => T::Int(IntOption::IpResolve),
            v if v == ID_LONG + 121 => T::Int(IntOption::TcpNoDelay),
            v if v == ID_LONG + 3 => T::Int(IntOption::Port),

            v if v == ID_OBJECT + 2 => T::Str(StrOption::Url),
            v if v == ID_OBJECT + 4 => T::Str(StrOption::Proxy),
            v if v == ID_OBJECT + 5 => T::Str(StrOption::UserPwd),
            v if v == ID_OBJECT + 6 => T::Str(StrOption::ProxyUserPwd),
            v if v == ID_OBJECT + 7 => T::Str(StrOption::Range),
            v if v == ID_OBJECT + 16 => T::Str(StrOption::Referer),
            v if v == ID_OBJECT + 18 => T::Str(StrOption::UserAgent),
            v if v == ID_OBJECT + 22 => T::Str(StrOption::Cookie),
            v if v == ID_OBJECT + 25 => T::Str(StrOption::SslCert),
            v if v == ID_OBJECT + 26 => T::Str(StrOption::SslKeyPasswd),
            v if v == ID_OBJECT + 31 => T::Str(StrOption::CookieFile),
            v if v == ID_OBJECT + 36 => T::Str(StrOption::CustomRequest),
            v if v == ID_OBJECT + 62 => T::Str(StrOption::Interface),
            v if v == ID_OBJECT + 65 => T::Str(StrOption::CaInfo),
            v if v == ID_OBJECT + 76 => T::Str(StrOption::RandomFile),
            v if v == ID_OBJECT + 77 => T::Str(StrOption::EgdSocket),
            v if v == ID_OBJECT + 82 => T::Str(StrOption::CookieJar),
            v if v == ID_OBJECT + 83 => T::Str(StrOption::SslCipherList),
            v if v == ID_OBJECT + 86 => T::Str(StrOption::SslCertType),
            v if v == ID_OBJECT + 87 => T::Str(StrOption::SslKey),
            v if v == ID_OBJECT + 88 => T::Str(StrOption::SslKeyType),
            v if v == ID_OBJECT + 89 => T::Str(StrOption::SslEngine),
            v if v == ID_OBJECT + 97 => T::Str(StrOption::CaPath),
            v if v == ID_OBJECT + 102 => T::Str(StrOption::Encoding),
            v if v == ID_OBJECT + 103 => T::Str(StrOption::Private),

            v if v == ID_OBJECT + 23 => T::List(ListOption::HttpHeaders),
            v if v == ID_OBJECT + 28 => T::List(ListOption::Quote),
            v if v == ID_OBJECT + 39 => T::List(ListOption::PostQuote),
            v if v == ID_OBJECT + 104 => T::List(ListOption::Http200Aliases),

            v if v == ID_OBJECT + 1 => T::Sink(SinkOption::OutputFile),
            v if v == ID_OBJECT + 9 => T::Sink(SinkOption::InputFile),
            v if v == ID_OBJECT + 29 => T::Sink(SinkOption::HeaderFile),
            v if v == ID_OBJECT + 37 => T::Sink(SinkOption::StderrFile),

            v if v == ID_OBJECT + 15 => T::PostFields,

            v if v == ID_FUNCTION + 11 => T::WriteFunction,
            v if v == ID_FUNCTION + 12 => T::ReadFunction,
            v if v == ID_FUNCTION + 79 => T::HeaderFunction,

            _ => return None,
        };
        Some(opt)
    }
}

/// Body write / header write callback: gets the owning transfer's native
/// handle and the arrived chunk, returns how many bytes it accepted. A
/// shortfall aborts the transfer.
pub type WriteFn = Arc<Mutex<dyn FnMut(NativeHandle, &[u8]) -> usize + Send>>;

/// Body read callback: gets the native handle, the input descriptor and the
/// wanted size, returns the bytes to send (possibly fewer, empty for EOF).
pub type ReadFn = Arc<Mutex<dyn FnMut(NativeHandle, i64, usize) -> Vec<u8> + Send>>;

/// Open-file capability used for sink/source redirection.
///
/// Exposes the underlying stream for reads/writes and a stable descriptor
/// for the read channel; the core never parses the file itself.
#[derive(Clone)]
pub struct FileSink {
    file: Arc<Mutex<File>>,
    descriptor: i64,
}

impl FileSink {
    pub fn new(file: File) -> Self {
        let descriptor = raw_descriptor(&file);
        FileSink {
            file: Arc::new(Mutex::new(file)),
            descriptor,
        }
    }

    pub fn descriptor(&self) -> i64 {
        self.descriptor
    }

    /// Write a chunk to the stream, reporting bytes accepted. A short count
    /// makes the engine abort the transfer.
    pub(crate) fn write(&self, data: &[u8]) -> usize {
        match self.file.lock() {
            Ok(mut f) => f.write(data).unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub(crate) fn read(&self, buf: &mut [u8]) -> Option<usize> {
        match self.file.lock() {
            Ok(mut f) => f.read(buf).ok(),
            Err(_) => None,
        }
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(unix)]
fn raw_descriptor(file: &File) -> i64 {
    use std::os::fd::AsRawFd;
    file.as_raw_fd() as i64
}

#[cfg(not(unix))]
fn raw_descriptor(_file: &File) -> i64 {
    -1
}

/// Dynamic option value, the shape `set_option` dispatches on.
pub enum OptValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    File(FileSink),
    WriteFn(WriteFn),
    ReadFn(ReadFn),
    /// Ordered name/value pairs for multipart post fields.
    Fields(Vec<(String, String)>),
    List(Vec<String>),
}

impl OptValue {
    pub fn write_fn<F>(f: F) -> Self
    where
        F: FnMut(NativeHandle, &[u8]) -> usize + Send + 'static,
    {
        OptValue::WriteFn(Arc::new(Mutex::new(f)))
    }

    pub fn read_fn<F>(f: F) -> Self
    where
        F: FnMut(NativeHandle, i64, usize) -> Vec<u8> + Send + 'static,
    {
        OptValue::ReadFn(Arc::new(Mutex::new(f)))
    }

    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            OptValue::Int(v) => Some(*v),
            OptValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub(crate) fn truthy(&self) -> Option<bool> {
        self.as_int().map(|v| v != 0)
    }
}

impl fmt::Debug for OptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptValue::Int(v) => write!(f, "Int({v})"),
            OptValue::Bool(v) => write!(f, "Bool({v})"),
            OptValue::Str(v) => write!(f, "Str({v:?})"),
            OptValue::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            OptValue::File(v) => write!(f, "File({})", v.descriptor),
            OptValue::WriteFn(_) => f.write_str("WriteFn"),
            OptValue::ReadFn(_) => f.write_str("ReadFn"),
            OptValue::Fields(v) => write!(f, "Fields({} entries)", v.len()),
            OptValue::List(v) => write!(f, "List({} entries)", v.len()),
        }
    }
}
