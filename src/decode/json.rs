use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Deserializer;

use super::{strip_bom, DecodeError, Decoded, Decoder, Document};

/// Decodes a stream of concatenated JSON documents.
///
/// Documents may be separated by any amount of whitespace. Each document is
/// tagged with the line it starts on. A syntax error ends the stream, since
/// the decoder cannot find the next document boundary after it.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Decoder<T> for JsonDecoder<T>
where
    T: DeserializeOwned,
{
    fn decode(&self, input: &[u8]) -> Vec<Decoded<T>> {
        let input = strip_bom(input);
        let mut stream = Deserializer::from_slice(input).into_iter::<T>();
        let mut out = Vec::new();

        loop {
            let start = skip_whitespace(input, stream.byte_offset());
            match stream.next() {
                None => break,
                Some(Ok(payload)) => {
                    out.push(Ok(Document::new(payload).at_line(line_at(input, start))));
                }
                Some(Err(err)) => {
                    let line = if err.line() > 0 {
                        err.line()
                    } else {
                        line_at(input, start)
                    };
                    out.push(Err(DecodeError::new(err.to_string()).at_line(line)));
                    break;
                }
            }
        }

        out
    }
}

fn skip_whitespace(input: &[u8], mut offset: usize) -> usize {
    while offset < input.len() && input[offset].is_ascii_whitespace() {
        offset += 1;
    }
    offset
}

fn line_at(input: &[u8], offset: usize) -> usize {
    let end = offset.min(input.len());
    1 + input[..end].iter().filter(|&&b| b == b'\n').count()
}
