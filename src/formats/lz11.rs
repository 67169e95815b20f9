//! Nintendo LZ11 (compression type 0x11), the long-length extension of
//! LZ10.
//!
//! References keep the 12-bit displacement but grade the length through
//! the leading nibble: `2..=0xF` encodes `length - 1` directly, `0`
//! extends to a byte-and-a-half (`length - 0x11`), `1` to two and a half
//! bytes (`length - 0x111`).

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator};

use super::lz10::serialize_grouped;
use super::{copy_backref, read_type_header, take_u8, write_type_header};

pub(crate) const TYPE_BYTE: u8 = 0x11;

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x10110;
const MAX_DISPLACEMENT: usize = 0x1000;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = read_type_header(&mut cur, TYPE_BYTE)?;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let flags = take_u8(&mut cur)?;
        for bit in (0..8).rev() {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                let at = cur.position() as usize;
                let b0 = take_u8(&mut cur)? as usize;
                let (length, disp_high) = match b0 >> 4 {
                    0 => {
                        let b1 = take_u8(&mut cur)? as usize;
                        (((b0 & 0xF) << 4 | b1 >> 4) + 0x11, b1 & 0xF)
                    }
                    1 => {
                        let b1 = take_u8(&mut cur)? as usize;
                        let b2 = take_u8(&mut cur)? as usize;
                        (((b0 & 0xF) << 12 | b1 << 4 | b2 >> 4) + 0x111, b2 & 0xF)
                    }
                    nibble => (nibble + 1, b0 & 0xF),
                };
                let b_last = take_u8(&mut cur)? as usize;
                let displacement = (disp_high << 8 | b_last) + 1;
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                copy_backref(&mut out, displacement, length, at)?;
            } else {
                out.push(take_u8(&mut cur)?);
            }
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
    }
    fn match_price(&self, length: usize, _displacement: usize) -> u32 {
        match length {
            ..=0x10 => 17,
            0x11..=0x110 => 25,
            _ => 33,
        }
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    write_type_header(&mut out, TYPE_BYTE, input.len());
    serialize_grouped(&tokens, input, &mut out, |out, length, displacement| {
        let disp = (displacement - 1) as u16;
        match length {
            3..=0x10 => {
                let word = (((length - 1) as u16) << 12) | disp;
                out.extend_from_slice(&word.to_be_bytes());
            }
            0x11..=0x110 => {
                let stored = (length - 0x11) as u16;
                out.push((stored >> 4) as u8);
                out.push(((stored & 0xF) as u8) << 4 | (disp >> 8) as u8);
                out.push(disp as u8);
            }
            _ => {
                let stored = (length - 0x111) as u32;
                out.push(0x10 | (stored >> 12) as u8);
                out.push((stored >> 4) as u8);
                out.push(((stored & 0xF) as u8) << 4 | (disp >> 8) as u8);
                out.push(disp as u8);
            }
        }
    });
    Ok(out)
}
