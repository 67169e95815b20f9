use std::io;

use thiserror::Error;

/// Possible errors that arise from compressing or decompressing a game
/// format stream.
///
/// Decode and encode operations are all-or-nothing: when any of these is
/// returned, partial output must be discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// A write would extend a fixed-length stream view.
    #[error("write of {len} byte(s) at position {pos} exceeds fixed length {cap}")]
    OutOfRangeWrite { pos: u64, len: usize, cap: u64 },

    /// A sub-stream window does not fit inside its base source.
    #[error("range {offset}+{length} is outside the base stream of length {base}")]
    InvalidRange { offset: u64, length: u64, base: u64 },

    /// The compressed stream ended before the decoder was done with it.
    #[error("input ended early at offset {offset}")]
    TruncatedInput { offset: usize },

    /// A token in the compressed stream is not decodable.
    #[error("malformed token at offset {offset}: {reason}")]
    MalformedToken { offset: usize, reason: &'static str },

    /// A Huffman tree cannot be represented within the format's cap,
    /// either in code length or in serialised node distance.
    #[error("huffman value {value} exceeds the format cap of {cap}")]
    HuffmanCapExceeded { value: usize, cap: usize },

    /// Encoding was requested for a decode-only format.
    #[error("{0} does not support encoding")]
    UnsupportedOperation(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}
