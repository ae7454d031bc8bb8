// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Immutable response payloads.
//!
//! Built exactly once at process start and shared read-only by every scenario
//! and worker thread. Handlers hand out cheap `Bytes` clones; nothing is
//! rebuilt or copied per request.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

/// Character every text payload is made of.
pub const PAYLOAD_CHAR: u8 = b'a';
/// Byte every raw-byte payload is made of.
pub const PAYLOAD_BYTE: u8 = 0x5A;

pub const SIZE_100KB: usize = 100 * 1024;
pub const SIZE_1MB: usize = 1024 * 1024;

/// Body of `/hello`.
pub const HELLO_BODY: &str = "Hello World";

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    payload: &'a str,
}

#[derive(Serialize)]
struct SmallJson<'a> {
    message: &'a str,
}

/// Every payload a scenario can serve.
#[derive(Debug, Clone)]
pub struct PayloadBuffers {
    pub hello: Bytes,
    pub empty: Bytes,
    pub text_100kb: Bytes,
    pub text_1mb: Bytes,
    pub json_small: Bytes,
    pub json_100kb: Bytes,
    pub json_1mb: Bytes,
    pub bytes_100kb: Bytes,
    pub bytes_1mb: Bytes,
}

impl PayloadBuffers {
    /// Build every payload.
    pub fn build() -> Result<Self, serde_json::Error> {
        let text_100kb = repeated(PAYLOAD_CHAR, SIZE_100KB);
        let text_1mb = repeated(PAYLOAD_CHAR, SIZE_1MB);

        Ok(Self {
            hello: Bytes::from_static(HELLO_BODY.as_bytes()),
            empty: Bytes::new(),
            json_small: json(&SmallJson { message: HELLO_BODY })?,
            json_100kb: json_envelope(&text_100kb)?,
            json_1mb: json_envelope(&text_1mb)?,
            text_100kb,
            text_1mb,
            bytes_100kb: repeated(PAYLOAD_BYTE, SIZE_100KB),
            bytes_1mb: repeated(PAYLOAD_BYTE, SIZE_1MB),
        })
    }

    /// Build and wrap for sharing across scenarios and threads.
    pub fn shared() -> Result<Arc<Self>, serde_json::Error> {
        Self::build().map(Arc::new)
    }
}

fn repeated(byte: u8, len: usize) -> Bytes {
    Bytes::from(vec![byte; len])
}

fn json_envelope(text: &Bytes) -> Result<Bytes, serde_json::Error> {
    // Text payloads are ASCII by construction.
    let payload = std::str::from_utf8(text).unwrap_or_default();
    json(&JsonEnvelope { payload })
}

fn json<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(value).map(Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        let payloads = PayloadBuffers::build().unwrap();
        assert!(payloads.empty.is_empty());
        assert_eq!(payloads.text_100kb.len(), 100 * 1024);
        assert_eq!(payloads.text_1mb.len(), 1024 * 1024);
        assert_eq!(payloads.bytes_100kb.len(), 100 * 1024);
        assert_eq!(payloads.bytes_1mb.len(), 1024 * 1024);
        assert!(payloads.text_1mb.iter().all(|&b| b == PAYLOAD_CHAR));
    }

    #[test]
    fn test_json_payloads_wrap_text() {
        let payloads = PayloadBuffers::build().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payloads.json_100kb).unwrap();
        assert_eq!(value["payload"].as_str().unwrap().len(), 100 * 1024);

        let small: serde_json::Value = serde_json::from_slice(&payloads.json_small).unwrap();
        assert_eq!(small["message"], HELLO_BODY);
    }

    #[test]
    fn test_clones_share_storage() {
        let payloads = PayloadBuffers::build().unwrap();
        let clone = payloads.text_1mb.clone();
        assert_eq!(clone.as_ptr(), payloads.text_1mb.as_ptr());
    }
}
