//! WP16: LZ over 2-byte units.
//!
//! `"Wp16"`, a little-endian size word, then little-endian flag words of
//! 32 flags each, consumed MSB-first. A set flag copies one verbatim unit
//! (two bytes); a clear flag is a little-endian reference word with
//! `displacement/2 - 1` in its top eleven bits and `length/2 - 2` in the
//! low five. Everything the format measures is even.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token, UnitSize};

use super::{take_bytes, take_u16_le, take_u32_le};

const MAGIC: &[u8; 4] = b"Wp16";

// unit-space bounds: lengths 4..=0x42 bytes, displacements 2..=0xFFE
const MIN_LENGTH: usize = 2;
const MAX_LENGTH: usize = 0x21;
const MAX_DISPLACEMENT: usize = 0x7FF;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let mut magic = [0u8; 4];
    take_bytes(&mut cur, &mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "missing Wp16 magic",
        });
    }
    let size = take_u32_le(&mut cur)? as usize;
    if size % 2 != 0 {
        return Err(CodecError::MalformedToken {
            offset: 4,
            reason: "declared size is not unit aligned",
        });
    }

    let mut out = Vec::with_capacity(size);
    'outer: while out.len() < size {
        let flags = take_u32_le(&mut cur)?;
        for bit in (0..32).rev() {
            if out.len() >= size {
                break 'outer;
            }
            if flags & (1u32 << bit) != 0 {
                let mut unit = [0u8; 2];
                take_bytes(&mut cur, &mut unit)?;
                out.extend_from_slice(&unit);
            } else {
                let at = cur.position() as usize;
                let word = take_u16_le(&mut cur)?;
                let length = ((word & 0x1F) as usize + MIN_LENGTH) * 2;
                let displacement = ((word >> 5) as usize + 1) * 2;
                if displacement > out.len() {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "displacement reaches before the start of the output",
                    });
                }
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                for _ in 0..length {
                    let byte = out[out.len() - displacement];
                    out.push(byte);
                }
            }
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        17
    }
    fn match_price(&self, _length: usize, _displacement: usize) -> u32 {
        17
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let options = FindOptions {
        unit_size: UnitSize::Short,
        ..FindOptions::default()
    };
    let tokens = lz::parse(input, &limits, &options, &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    for group in tokens.chunks(32) {
        let mut flags = 0u32;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Literal { .. }) {
                flags |= 0x8000_0000 >> i;
            }
        }
        out.extend_from_slice(&flags.to_le_bytes());
        for token in group {
            match token {
                Token::Literal { position } => {
                    out.extend_from_slice(&input[position * 2..position * 2 + 2]);
                }
                Token::Match(m) => {
                    let word = (((m.displacement - 1) as u16) << 5)
                        | ((m.length - MIN_LENGTH) as u16);
                    out.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_byte_input_stays_unit_aligned() {
        let input: [u8; 16] = *b"AABBAABBAABBAABB";
        let options = FindOptions {
            unit_size: UnitSize::Short,
            ..FindOptions::default()
        };
        let limits = [FindLimitations::new(MIN_LENGTH, MAX_LENGTH, 1, MAX_DISPLACEMENT)];
        let tokens = lz::parse(&input, &limits, &options, &Price).unwrap();
        for t in &tokens {
            if let Token::Match(m) = t {
                // unit-space fields scale to even byte counts
                assert!(m.length * 2 % 2 == 0 && m.displacement * 2 % 2 == 0);
                assert!(m.length * 2 >= 4);
            }
        }
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn odd_length_input_is_rejected() {
        assert!(matches!(
            encode(b"odd"),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn unit_repeats_compress() {
        let mut input = Vec::new();
        for _ in 0..0x80 {
            input.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        }
        let packed = encode(&input).unwrap();
        assert!(packed.len() < input.len() / 4);
        assert_eq!(decode(&packed).unwrap(), input);
    }

    #[test]
    fn incompressible_units_roundtrip() {
        let input: Vec<u8> = (0..64u32).flat_map(|i| [(i * 7) as u8, (i * 13 + 1) as u8]).collect();
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }
}
