//! Gzip body codec.
//!
//! Compression is an optimization: both directions degrade instead of
//! failing the call.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Outcome of compressing a request body.
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// False when the body is sent as-is (empty body or encoder failure).
    pub gzipped: bool,
}

/// Gzip `body`. Empty bodies stay empty; on failure the original bytes are
/// returned uncompressed.
pub fn compress(body: &[u8]) -> Encoded {
    if body.is_empty() {
        return Encoded { bytes: Vec::new(), gzipped: false };
    }
    match try_compress(body) {
        Ok(bytes) => Encoded { bytes, gzipped: true },
        Err(e) => {
            tracing::error!(error = %e, "gzip compress request body failed, sending uncompressed");
            Encoded { bytes: body.to_vec(), gzipped: false }
        }
    }
}

fn try_compress(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

/// Gunzip `body`. A corrupt stream is logged and yields an empty body.
pub fn decompress(body: &[u8], url: &str) -> Vec<u8> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(body.len() * 2);
    match GzDecoder::new(body).read_to_end(&mut out) {
        Ok(_) => out,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "gzip decompress response body failed");
            Vec::new()
        }
    }
}

/// Whether a `Content-Encoding` value announces gzip.
pub fn is_gzip(content_encoding: Option<&str>) -> bool {
    content_encoding.is_some_and(|v| v.to_ascii_lowercase().contains("gzip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let payloads: [&[u8]; 4] = [
            b"",
            b"x",
            b"{\"items\":[1,2,3],\"tenant\":\"demo\"}",
            &[0u8, 255, 1, 254, 2, 253],
        ];
        for body in payloads {
            let encoded = compress(body);
            assert_eq!(encoded.gzipped, !body.is_empty());
            let decoded = if encoded.gzipped {
                decompress(&encoded.bytes, "test")
            } else {
                encoded.bytes
            };
            assert_eq!(decoded, body);
        }
    }

    #[test]
    fn test_large_body_shrinks() {
        let body = vec![b'a'; 64 * 1024];
        let encoded = compress(&body);
        assert!(encoded.gzipped);
        assert!(encoded.bytes.len() < body.len());
        assert_eq!(decompress(&encoded.bytes, "test"), body);
    }

    #[test]
    fn test_corrupt_stream_yields_empty() {
        assert!(decompress(b"definitely not gzip", "test").is_empty());
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(Some("gzip")));
        assert!(is_gzip(Some("GZIP, deflate")));
        assert!(!is_gzip(Some("identity")));
        assert!(!is_gzip(None));
    }
}
