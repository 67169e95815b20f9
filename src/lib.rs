//! Lossless compression codecs for legacy console game formats.
//!
//! Games of the cartridge and early optical eras shipped dozens of small
//! proprietary byte-stream compressors: the Nintendo LZ family
//! (LZ10/LZ11/LZ40/LZ60), MIO0/YAY0/YAZ0, the BIOS Huffman and RLE
//! schemes, ring-buffer LZSS variants, and stranger things like WP16's
//! 2-byte units or the backward parse used for overlay blobs. This crate
//! pairs a decoder with an encoder for each of them, with the encoders
//! producing streams the original engines can decode.
//!
//! All of the formats share one engine:
//!
//! * [`lz`] — a hash-chain match finder and a shortest-path optimal
//!   parser that picks the cheapest token sequence under each format's
//!   length/displacement limitations, scan direction, unit size,
//!   pre-buffer and post-match skip;
//! * [`huffman`] — deterministic tree construction over a flat node
//!   arena, canonical code assignment and a length-limiting pass;
//! * [`bits`] and [`substream`] — bit I/O with configurable bit order,
//!   byte order and refill unit, and a bounded positioned view over a
//!   backing stream.
//!
//! Format modules under [`formats`] are thin adapters over that engine:
//! they own their token layouts, headers and bit prices and nothing else.
//!
//! ## Example
//!
//! ```
//! use gamecomp::Format;
//!
//! let data = b"ABABABABAB";
//! let packed = Format::Lz10.encode(data)?;
//! assert_eq!(Format::Lz10.decode(&packed)?, data);
//! assert_eq!(gamecomp::identify(&packed), Some(Format::Lz10));
//! # Ok::<(), gamecomp::CodecError>(())
//! ```
//!
//! Each encode or decode runs single-threaded and owns all of its state;
//! independent operations are free to run on separate threads.

pub mod bits;
pub mod errors;
pub mod formats;
pub mod huffman;
pub mod lz;
pub mod substream;

pub use errors::CodecError;
pub use formats::{identify, Endian, Format};
pub use lz::{
    Direction, FindLimitations, FindOptions, Match, PriceCalculator, Token, UnitSize,
};
pub use substream::SubStream;
