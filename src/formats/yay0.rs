//! YAY0: the MIO0 section layout with graded reference lengths.
//!
//! A reference nibble of `1..=0xF` encodes `length - 2`; a zero nibble
//! pulls one extra byte from the raw section and adds `0x12`, stretching
//! references to 0x111 units.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_bytes, Endian};

const MAGIC: &[u8; 4] = b"Yay0";

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x111;
const MAX_DISPLACEMENT: usize = 0x1000;

fn read_word(input: &[u8], at: usize, endian: Endian) -> Result<u32, CodecError> {
    let bytes: [u8; 4] = input
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(CodecError::TruncatedInput { offset: at })?;
    Ok(match endian {
        Endian::Le => u32::from_le_bytes(bytes),
        Endian::Be => u32::from_be_bytes(bytes),
    })
}

pub fn decode(input: &[u8], endian: Endian) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let mut magic = [0u8; 4];
    take_bytes(&mut cur, &mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "missing Yay0 magic",
        });
    }
    let size = read_word(input, 4, endian)? as usize;
    let mut refs_at = read_word(input, 8, endian)? as usize;
    let mut raw_at = read_word(input, 12, endian)? as usize;

    let mut take_raw = |raw_at: &mut usize| -> Result<u8, CodecError> {
        let byte = *input
            .get(*raw_at)
            .ok_or(CodecError::TruncatedInput { offset: *raw_at })?;
        *raw_at += 1;
        Ok(byte)
    };

    let mut out = Vec::with_capacity(size);
    let mut map_at = 16usize;
    let mut map_bit = 0u32;

    while out.len() < size {
        let flags = *input
            .get(map_at)
            .ok_or(CodecError::TruncatedInput { offset: map_at })?;
        let set = flags & (0x80 >> map_bit) != 0;
        map_bit += 1;
        if map_bit == 8 {
            map_bit = 0;
            map_at += 1;
        }

        if set {
            let byte = take_raw(&mut raw_at)?;
            out.push(byte);
        } else {
            let word = input
                .get(refs_at..refs_at + 2)
                .ok_or(CodecError::TruncatedInput { offset: refs_at })?;
            let word = u16::from_be_bytes([word[0], word[1]]);
            refs_at += 2;
            let displacement = ((word & 0xFFF) as usize) + 1;
            let nibble = (word >> 12) as usize;
            let length = if nibble == 0 {
                take_raw(&mut raw_at)? as usize + 0x12
            } else {
                nibble + 2
            };
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: refs_at - 2,
                    reason: "reference overruns the declared size",
                });
            }
            copy_backref(&mut out, displacement, length, refs_at - 2)?;
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
        if length > 0x11 {
            25
        } else {
            17
        }
    }
}

pub fn encode(input: &[u8], endian: Endian) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut map = Vec::new();
    let mut refs = Vec::new();
    let mut raw = Vec::new();
    let mut map_bits = 0u32;
    for token in &tokens {
        if map_bits % 8 == 0 {
            map.push(0u8);
        }
        match token {
            Token::Literal { position } => {
                *map.last_mut().expect("bitmap byte just pushed") |= 0x80 >> (map_bits % 8);
                raw.push(input[*position]);
            }
            Token::Match(m) => {
                let disp = (m.displacement - 1) as u16;
                if m.length > 0x11 {
                    refs.extend_from_slice(&disp.to_be_bytes());
                    raw.push((m.length - 0x12) as u8);
                } else {
                    let word = (((m.length - 2) as u16) << 12) | disp;
                    refs.extend_from_slice(&word.to_be_bytes());
                }
            }
        }
        map_bits += 1;
    }
    while map.len() % 4 != 0 {
        map.push(0);
    }

    let refs_at = 16 + map.len();
    let raw_at = refs_at + refs.len();
    let mut out = Vec::with_capacity(raw_at + raw.len());
    out.extend_from_slice(MAGIC);
    let mut word = |v: u32| match endian {
        Endian::Le => v.to_le_bytes(),
        Endian::Be => v.to_be_bytes(),
    };
    let words = [input.len() as u32, refs_at as u32, raw_at as u32];
    for v in words {
        let bytes = word(v);
        out.extend_from_slice(&bytes);
    }
    out.extend_from_slice(&map);
    out.extend_from_slice(&refs);
    out.extend_from_slice(&raw);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_both_endians() {
        let input = b"yay zero yay zero yay zero, sections again";
        for endian in [Endian::Le, Endian::Be] {
            let packed = encode(input, endian).unwrap();
            assert_eq!(decode(&packed, endian).unwrap(), input);
        }
    }

    #[test]
    fn long_references_take_the_extended_form() {
        let mut input = b"start ".to_vec();
        input.extend(std::iter::repeat(b'~').take(0x200));
        input.extend_from_slice(b" end");
        let packed = encode(&input, Endian::Be).unwrap();
        assert!(packed.len() < input.len() / 4);
        assert_eq!(decode(&packed, Endian::Be).unwrap(), input);
    }

    #[test]
    fn extended_length_bytes_interleave_with_literals() {
        // literal, long match, literal keeps the raw-section cursor honest
        let mut input = b"x".to_vec();
        input.extend(std::iter::repeat(b'x').take(0x60));
        input.push(b'y');
        input.extend(std::iter::repeat(b'x').take(0x40));
        let packed = encode(&input, Endian::Le).unwrap();
        assert_eq!(decode(&packed, Endian::Le).unwrap(), input);
    }
}
