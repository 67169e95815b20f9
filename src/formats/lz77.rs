//! Bit-level LZ77 with a one-unit skip after every reference.
//!
//! The stream is a little-endian size word followed by an MSB-first bit
//! stream: a clear flag bit introduces eight literal bits, a set flag bit
//! an eight-bit displacement and eight-bit length. Every reference is
//! followed by one raw byte with no flag of its own, unless the reference
//! already completed the output.

use std::io::Cursor;

use crate::bits::{BitOrder, BitReader, BitUnit, BitWriter, ByteOrder};
use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_u32_le};

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 0xFF;
const MAX_DISPLACEMENT: usize = 0xFF;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = take_u32_le(&mut cur)? as usize;
    let data = &input[cur.position() as usize..];
    let mut bits = BitReader::new(
        data,
        BitOrder::MsbFirst,
        ByteOrder::BigEndian,
        BitUnit::Byte,
    );

    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        if bits.read_bit()? {
            let at = 4 + bits.bytes_consumed();
            let displacement = bits.read_bits(8)? as usize;
            let length = bits.read_bits(8)? as usize;
            if length == 0 || out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "reference length out of range",
                });
            }
            copy_backref(&mut out, displacement, length, at)?;
            // the unit after a reference is always raw
            if out.len() < size {
                out.push(bits.read_bits(8)? as u8);
            }
        } else {
            out.push(bits.read_bits(8)? as u8);
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
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
        skip_units_after_match: 1,
        ..FindOptions::default()
    };
    let tokens = lz::parse(input, &limits, &options, &Price)?;

    let mut out = Vec::with_capacity(input.len() + 8);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());
    let mut bits = BitWriter::new(
        &mut out,
        BitOrder::MsbFirst,
        ByteOrder::BigEndian,
        BitUnit::Byte,
    );

    let mut embed_next = false;
    for token in &tokens {
        match token {
            Token::Literal { position } => {
                if embed_next {
                    // the forced post-reference unit travels flagless
                    bits.write_bits(input[*position] as u32, 8)?;
                    embed_next = false;
                } else {
                    bits.write_bit(false)?;
                    bits.write_bits(input[*position] as u32, 8)?;
                }
            }
            Token::Match(m) => {
                bits.write_bit(true)?;
                bits.write_bits(m.displacement as u32, 8)?;
                bits.write_bits(m.length as u32, 8)?;
                embed_next = true;
            }
        }
    }
    bits.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lz::Match;

    #[test]
    fn skip_rule_shapes_the_parse() {
        let limits = [FindLimitations::new(MIN_LENGTH, MAX_LENGTH, 1, MAX_DISPLACEMENT)];
        let options = FindOptions {
            skip_units_after_match: 1,
            ..FindOptions::default()
        };
        let tokens = lz::parse(b"ABCABC", &limits, &options, &Price).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal { position: 0 },
                Token::Literal { position: 1 },
                Token::Literal { position: 2 },
                Token::Match(Match {
                    position: 3,
                    displacement: 3,
                    length: 3
                }),
            ]
        );
    }

    #[test]
    fn roundtrips_with_embedded_literals() {
        for input in [
            &b"ABCABC"[..],
            b"ABCABCX",
            b"to be or not to be, that is the question",
            b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        ] {
            assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
        }
    }

    #[test]
    fn empty_input_roundtrips() {
        assert_eq!(decode(&encode(&[]).unwrap()).unwrap(), Vec::<u8>::new());
    }
}
