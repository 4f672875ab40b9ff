use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::{preview, strip_bom, DecodeError, Decoded, Decoder, Document};

const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Newline-delimited JSON decoder.
///
/// Every line is decoded on its own, so one malformed line produces one
/// [`DecodeError`] and the following lines are still decoded.
pub struct NdjsonDecoder<T> {
    max_line_bytes: usize,
    allow_empty_lines: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> NdjsonDecoder<T> {
    /// Create a decoder with default limits.
    pub fn new() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            allow_empty_lines: false,
            _marker: PhantomData,
        }
    }

    /// Maximum number of bytes allowed for a single NDJSON line.
    pub fn max_line_bytes(mut self, n: usize) -> Self {
        self.max_line_bytes = n;
        self
    }

    /// Whether blank lines should be ignored.
    pub fn allow_empty_lines(mut self, yes: bool) -> Self {
        self.allow_empty_lines = yes;
        self
    }
}

impl<T> Default for NdjsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NdjsonDecoder<T>
where
    T: DeserializeOwned,
{
    fn decode_line(&self, line: &[u8], number: usize) -> Option<Decoded<T>> {
        let line = strip_cr(line);

        if line.is_empty() && self.allow_empty_lines {
            return None;
        }

        if line.len() > self.max_line_bytes {
            return Some(Err(DecodeError::new(format!(
                "line exceeded max_line_bytes ({} > {})",
                line.len(),
                self.max_line_bytes
            ))
            .at_line(number)));
        }

        let decoded = serde_json::from_slice::<T>(line)
            .map(|payload| Document::new(payload).at_line(number))
            .map_err(|err| {
                DecodeError::new(format!(
                    "failed to parse line ({} bytes, preview: {:?}): {}",
                    line.len(),
                    preview(line),
                    err
                ))
                .at_line(number)
            });
        Some(decoded)
    }
}

impl<T> Decoder<T> for NdjsonDecoder<T>
where
    T: DeserializeOwned,
{
    fn decode(&self, input: &[u8]) -> Vec<Decoded<T>> {
        let input = strip_bom(input);
        let body = input.strip_suffix(b"\n").unwrap_or(input);
        if body.is_empty() {
            return Vec::new();
        }

        body.split(|&b| b == b'\n')
            .enumerate()
            .filter_map(|(i, line)| self.decode_line(line, i + 1))
            .collect()
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    if let Some(stripped) = line.strip_suffix(b"\r") {
        stripped
    } else {
        line
    }
}
