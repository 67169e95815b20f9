//! Nintendo LZ40 (compression type 0x40), the little-endian cousin of
//! LZ11.
//!
//! Flag bytes are consumed LSB-first and references are little-endian
//! words holding the displacement directly in the low twelve bits. The
//! top nibble grades the length: `3..=0xF` is the length itself, `0`
//! extends through one byte (`length - 0x10`), `1` through a
//! little-endian word (`length - 0x110`).

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, read_type_header, take_u16_le, take_u8, write_type_header};

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x1010F;
const MAX_DISPLACEMENT: usize = 0xFFF;

pub(crate) fn decode_typed(input: &[u8], type_byte: u8) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = read_type_header(&mut cur, type_byte)?;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let flags = take_u8(&mut cur)?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                let at = cur.position() as usize;
                let word = take_u16_le(&mut cur)?;
                let displacement = (word & 0xFFF) as usize;
                if displacement == 0 {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference with zero displacement",
                    });
                }
                let length = match word >> 12 {
                    0 => take_u8(&mut cur)? as usize + 0x10,
                    1 => take_u16_le(&mut cur)? as usize + 0x110,
                    nibble => nibble as usize,
                };
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
            ..=0xF => 17,
            0x10..=0x10F => 25,
            _ => 33,
        }
    }
}

pub(crate) fn encode_typed(input: &[u8], type_byte: u8) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    write_type_header(&mut out, type_byte, input.len());

    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Match(_)) {
                flags |= 1 << i;
            }
        }
        out.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => out.push(input[*position]),
                Token::Match(m) => {
                    let disp = m.displacement as u16;
                    match m.length {
                        3..=0xF => {
                            let word = ((m.length as u16) << 12) | disp;
                            out.extend_from_slice(&word.to_le_bytes());
                        }
                        0x10..=0x10F => {
                            out.extend_from_slice(&disp.to_le_bytes());
                            out.push((m.length - 0x10) as u8);
                        }
                        _ => {
                            out.extend_from_slice(&(0x1000 | disp).to_le_bytes());
                            out.extend_from_slice(
                                &((m.length - 0x110) as u16).to_le_bytes(),
                            );
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    decode_typed(input, 0x40)
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    encode_typed(input, 0x40)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_grades_roundtrip() {
        for run in [6usize, 0x80, 0x400] {
            let mut input = b"lead-in ".to_vec();
            input.extend(std::iter::repeat(b'-').take(run));
            input.extend_from_slice(b" lead-out");
            assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input, "run {run}");
        }
    }

    #[test]
    fn zero_displacement_is_malformed() {
        // flag bit 0 set, reference word 0x3000: length 3, displacement 0
        let compressed = [0x40, 0x03, 0x00, 0x00, 0x01, 0x00, 0x30];
        assert!(matches!(
            decode(&compressed),
            Err(CodecError::MalformedToken { .. })
        ));
    }
}
