//! The per-format codecs and their shared plumbing.
//!
//! Every format module owns its token bit layout and header and exposes
//! `decode`/`encode` over byte slices; the shared LZ/Huffman engines do
//! the rest. [`Format`] is the capability record over all of them.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::errors::CodecError;

pub mod backward_lz77;
pub mod huffman;
pub mod lz10;
pub mod lz11;
pub mod lz40;
pub mod lz60;
pub mod lz77;
pub mod lz_ecd;
pub mod lz_enc;
pub mod lze;
pub mod lzss;
pub mod lzss_vlc;
pub mod mio0;
pub mod rle;
pub mod taiko;
pub mod tales_of;
pub mod wp16;
pub mod yay0;
pub mod yaz0;

/// Every codec the crate ships, as a plain capability record: each member
/// knows how to decode, whether it can encode, and how to recognise
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    Lz10,
    Lz11,
    Lz40,
    Lz60,
    Lz77,
    BackwardLz77,
    Lzss,
    LzssVlc,
    LzEcd,
    LzEnc,
    Lze,
    Huffman4Le,
    Huffman4Be,
    Huffman8Le,
    Huffman8Be,
    Rle,
    Mio0Le,
    Mio0Be,
    Yay0Le,
    Yay0Be,
    Yaz0Le,
    Yaz0Be,
    TaikoLz80,
    TaikoLz81,
    Wp16,
    TalesOf01,
    TalesOf03,
}

impl Format {
    pub const fn name(self) -> &'static str {
        match self {
            Format::Lz10 => "Lz10",
            Format::Lz11 => "Lz11",
            Format::Lz40 => "Lz40",
            Format::Lz60 => "Lz60",
            Format::Lz77 => "Lz77",
            Format::BackwardLz77 => "BackwardLz77",
            Format::Lzss => "Lzss",
            Format::LzssVlc => "LzssVlc",
            Format::LzEcd => "LzEcd",
            Format::LzEnc => "LzEnc",
            Format::Lze => "Lze",
            Format::Huffman4Le => "Huffman4Le",
            Format::Huffman4Be => "Huffman4Be",
            Format::Huffman8Le => "Huffman8Le",
            Format::Huffman8Be => "Huffman8Be",
            Format::Rle => "Rle",
            Format::Mio0Le => "Mio0Le",
            Format::Mio0Be => "Mio0Be",
            Format::Yay0Le => "Yay0Le",
            Format::Yay0Be => "Yay0Be",
            Format::Yaz0Le => "Yaz0Le",
            Format::Yaz0Be => "Yaz0Be",
            Format::TaikoLz80 => "TaikoLz80",
            Format::TaikoLz81 => "TaikoLz81",
            Format::Wp16 => "Wp16",
            Format::TalesOf01 => "TalesOf01",
            Format::TalesOf03 => "TalesOf03",
        }
    }

    pub const fn supports_encode(self) -> bool {
        !matches!(
            self,
            Format::TalesOf01 | Format::TalesOf03 | Format::LzEnc
        )
    }

    /// Decompress a complete stream of this format.
    pub fn decode(self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        debug!("decoding {} ({} bytes)", self.name(), input.len());
        match self {
            Format::Lz10 => lz10::decode(input),
            Format::Lz11 => lz11::decode(input),
            Format::Lz40 => lz40::decode(input),
            Format::Lz60 => lz60::decode(input),
            Format::Lz77 => lz77::decode(input),
            Format::BackwardLz77 => backward_lz77::decode(input),
            Format::Lzss => lzss::decode(input),
            Format::LzssVlc => lzss_vlc::decode(input),
            Format::LzEcd => lz_ecd::decode(input),
            Format::LzEnc => lz_enc::decode(input),
            Format::Lze => lze::decode(input),
            Format::Huffman4Le => huffman::decode(input, 4, huffman::DataOrder::Le),
            Format::Huffman4Be => huffman::decode(input, 4, huffman::DataOrder::Be),
            Format::Huffman8Le => huffman::decode(input, 8, huffman::DataOrder::Le),
            Format::Huffman8Be => huffman::decode(input, 8, huffman::DataOrder::Be),
            Format::Rle => rle::decode(input),
            Format::Mio0Le => mio0::decode(input, Endian::Le),
            Format::Mio0Be => mio0::decode(input, Endian::Be),
            Format::Yay0Le => yay0::decode(input, Endian::Le),
            Format::Yay0Be => yay0::decode(input, Endian::Be),
            Format::Yaz0Le => yaz0::decode(input, Endian::Le),
            Format::Yaz0Be => yaz0::decode(input, Endian::Be),
            Format::TaikoLz80 => taiko::decode_lz80(input),
            Format::TaikoLz81 => taiko::decode_lz81(input),
            Format::Wp16 => wp16::decode(input),
            Format::TalesOf01 => tales_of::decode(input, tales_of::Variant::One),
            Format::TalesOf03 => tales_of::decode(input, tales_of::Variant::Three),
        }
    }

    /// Compress `input` into a stream of this format.
    ///
    /// Decode-only formats fail with
    /// [`CodecError::UnsupportedOperation`] before touching any I/O.
    pub fn encode(self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        if !self.supports_encode() {
            return Err(CodecError::UnsupportedOperation(self.name()));
        }
        debug!("encoding {} ({} bytes)", self.name(), input.len());
        match self {
            Format::Lz10 => lz10::encode(input),
            Format::Lz11 => lz11::encode(input),
            Format::Lz40 => lz40::encode(input),
            Format::Lz60 => lz60::encode(input),
            Format::Lz77 => lz77::encode(input),
            Format::BackwardLz77 => backward_lz77::encode(input),
            Format::Lzss => lzss::encode(input),
            Format::LzssVlc => lzss_vlc::encode(input),
            Format::LzEcd => lz_ecd::encode(input),
            Format::Lze => lze::encode(input),
            Format::Huffman4Le => huffman::encode(input, 4, huffman::DataOrder::Le),
            Format::Huffman4Be => huffman::encode(input, 4, huffman::DataOrder::Be),
            Format::Huffman8Le => huffman::encode(input, 8, huffman::DataOrder::Le),
            Format::Huffman8Be => huffman::encode(input, 8, huffman::DataOrder::Be),
            Format::Rle => rle::encode(input),
            Format::Mio0Le => mio0::encode(input, Endian::Le),
            Format::Mio0Be => mio0::encode(input, Endian::Be),
            Format::Yay0Le => yay0::encode(input, Endian::Le),
            Format::Yay0Be => yay0::encode(input, Endian::Be),
            Format::Yaz0Le => yaz0::encode(input, Endian::Le),
            Format::Yaz0Be => yaz0::encode(input, Endian::Be),
            Format::TaikoLz80 => taiko::encode_lz80(input),
            Format::TaikoLz81 => taiko::encode_lz81(input),
            Format::Wp16 => wp16::encode(input),
            Format::LzEnc | Format::TalesOf01 | Format::TalesOf03 => unreachable!(),
        }
    }
}

/// Best-effort identification from the leading bytes of a stream.
///
/// Requires at least four bytes. Magic-bearing formats are matched on
/// their magic; the Nintendo type-byte family on its leading type byte.
/// Variants that share on-disk magic (the LE/BE pairs) resolve to the
/// big-endian member.
pub fn identify(header: &[u8]) -> Option<Format> {
    if header.len() < 4 {
        return None;
    }
    match &header[..4] {
        b"MIO0" => return Some(Format::Mio0Be),
        b"Yay0" => return Some(Format::Yay0Be),
        b"Yaz0" => return Some(Format::Yaz0Be),
        b"Wp16" => return Some(Format::Wp16),
        b"SSZL" => return Some(Format::Lzss),
        _ => {}
    }
    match header[0] {
        0x10 => Some(Format::Lz10),
        0x11 => Some(Format::Lz11),
        0x24 => Some(Format::Huffman4Be),
        0x28 => Some(Format::Huffman8Be),
        0x30 => Some(Format::Rle),
        0x40 => Some(Format::Lz40),
        0x60 => Some(Format::Lz60),
        _ => None,
    }
}

/// Endianness selector for the formats that ship LE and BE variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Le,
    Be,
}

// ---------------------------------------------------------------------
// Cursor helpers shared by the byte-oriented decoders. `read_exact`
// failures on in-memory cursors are always truncation.

pub(crate) fn take_u8(cur: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    let at = cur.position() as usize;
    cur.read_u8().map_err(|e| trunc(e, at))
}

pub(crate) fn take_u16_le(cur: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    let at = cur.position() as usize;
    cur.read_u16::<LittleEndian>().map_err(|e| trunc(e, at))
}

pub(crate) fn take_u16_be(cur: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    let at = cur.position() as usize;
    cur.read_u16::<byteorder::BigEndian>().map_err(|e| trunc(e, at))
}

pub(crate) fn take_u32_le(cur: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    let at = cur.position() as usize;
    cur.read_u32::<LittleEndian>().map_err(|e| trunc(e, at))
}

pub(crate) fn take_bytes(
    cur: &mut Cursor<&[u8]>,
    buf: &mut [u8],
) -> Result<(), CodecError> {
    let at = cur.position() as usize;
    cur.read_exact(buf).map_err(|e| trunc(e, at))
}

fn trunc(e: io::Error, offset: usize) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::TruncatedInput { offset }
    } else {
        CodecError::Io(e)
    }
}

// ---------------------------------------------------------------------
// The Nintendo type-byte header: `type | size << 8` as a little-endian
// word, with sizes of 0 or above 0xFFFFFF spilling into a full 32-bit
// word that follows.

pub(crate) fn read_type_header(
    cur: &mut Cursor<&[u8]>,
    expected: u8,
) -> Result<usize, CodecError> {
    let word = take_u32_le(cur)?;
    if (word & 0xFF) as u8 != expected {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "unexpected compression type byte",
        });
    }
    let size = (word >> 8) as usize;
    if size == 0 {
        Ok(take_u32_le(cur)? as usize)
    } else {
        Ok(size)
    }
}

pub(crate) fn write_type_header(out: &mut Vec<u8>, kind: u8, size: usize) {
    if size == 0 || size > 0xFF_FFFF {
        out.extend_from_slice(&(kind as u32).to_le_bytes());
        out.extend_from_slice(&(size as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(kind as u32 | (size as u32) << 8).to_le_bytes());
    }
}

/// Copy `length` bytes from `displacement` back, byte at a time so
/// overlapping references self-extend the way the consoles do it.
pub(crate) fn copy_backref(
    out: &mut Vec<u8>,
    displacement: usize,
    length: usize,
    offset: usize,
) -> Result<(), CodecError> {
    if displacement == 0 || displacement > out.len() {
        return Err(CodecError::MalformedToken {
            offset,
            reason: "displacement reaches before the start of the output",
        });
    }
    for _ in 0..length {
        let byte = out[out.len() - displacement];
        out.push(byte);
    }
    Ok(())
}
