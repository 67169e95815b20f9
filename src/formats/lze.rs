//! Lze: two reference shapes behind two-bit flags.
//!
//! Flags are consumed MSB-first, two bits per token: `0` is a word
//! reference (`length - 3` in the top nibble, `displacement - 5` below),
//! `1` a byte reference (`displacement - 1` in the top two bits,
//! `length - 2` below), `2` one verbatim byte, `3` three verbatim bytes.
//! The near shape only reaches four units back but pays a single byte,
//! which is what makes the dual limitation worthwhile.

use std::io::Cursor;

use crate::bits::{BitOrder, BitReader, BitUnit, BitWriter, ByteOrder};
use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_u32_le};

const FAR: FindLimitations = FindLimitations::new(3, 0x12, 5, 0x1004);
const NEAR: FindLimitations = FindLimitations::new(2, 0x41, 1, 4);

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = take_u32_le(&mut cur)? as usize;
    let data = &input[cur.position() as usize..];

    // one bit stream carries both the flag pairs and the token bodies
    let mut bits = BitReader::new(
        data,
        BitOrder::MsbFirst,
        ByteOrder::BigEndian,
        BitUnit::Byte,
    );

    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        let at = 4 + bits.bytes_consumed();
        match bits.read_bits(2)? {
            0 => {
                let word = bits.read_bits(16)? as usize;
                let length = (word >> 12) + 3;
                let displacement = (word & 0xFFF) + 5;
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                copy_backref(&mut out, displacement, length, at)?;
            }
            1 => {
                let byte = bits.read_bits(8)? as usize;
                let length = (byte & 0x3F) + 2;
                let displacement = (byte >> 6) + 1;
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                copy_backref(&mut out, displacement, length, at)?;
            }
            2 => out.push(bits.read_bits(8)? as u8),
            _ => {
                for _ in 0..3 {
                    if out.len() >= size {
                        return Err(CodecError::MalformedToken {
                            offset: at,
                            reason: "literal triple overruns the declared size",
                        });
                    }
                    out.push(bits.read_bits(8)? as u8);
                }
            }
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        10
    }
    fn match_price(&self, _length: usize, displacement: usize) -> u32 {
        if displacement <= NEAR.max_displacement {
            10
        } else {
            18
        }
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FAR, NEAR];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());
    let mut bits = BitWriter::new(
        &mut out,
        BitOrder::MsbFirst,
        ByteOrder::BigEndian,
        BitUnit::Byte,
    );

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Match(m) => {
                // the near shape is cheaper whenever it fits
                if m.displacement <= NEAR.max_displacement && m.length <= NEAR.max_length {
                    bits.write_bits(1, 2)?;
                    let byte = ((m.displacement - 1) << 6) | (m.length - 2);
                    bits.write_bits(byte as u32, 8)?;
                } else {
                    bits.write_bits(0, 2)?;
                    let word = ((m.length - 3) << 12) | (m.displacement - 5);
                    bits.write_bits(word as u32, 16)?;
                }
                i += 1;
            }
            Token::Literal { .. } => {
                let mut run = 0;
                while run < 3
                    && i + run < tokens.len()
                    && matches!(tokens[i + run], Token::Literal { .. })
                {
                    run += 1;
                }
                if run == 3 {
                    bits.write_bits(3, 2)?;
                } else {
                    run = 1;
                    bits.write_bits(2, 2)?;
                }
                for t in &tokens[i..i + run] {
                    if let Token::Literal { position } = t {
                        bits.write_bits(input[*position] as u32, 8)?;
                    }
                }
                i += run;
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
    fn near_matches_beat_far_matches_on_price() {
        // "abab..." repeats two back: the near shape must win the parse
        let input = b"abababababababab";
        let tokens = lz::parse(input, &[FAR, NEAR], &FindOptions::default(), &Price).unwrap();
        assert!(tokens.iter().any(|t| matches!(
            t,
            Token::Match(Match { displacement: 2, .. })
        )));
        assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
    }

    #[test]
    fn far_repeats_still_compress() {
        let mut input = b"prologue ".to_vec();
        input.extend(std::iter::repeat(b"0123456789abcdef").take(8).flatten());
        input.extend_from_slice(b" epilogue, prologue again");
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn literal_triples_roundtrip() {
        let input = b"every byte different: qwertyuiop";
        assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
    }

    #[test]
    fn every_match_fits_one_of_the_shapes() {
        let input = b"dual dual dual dual windows windows windows";
        let tokens = lz::parse(input, &[FAR, NEAR], &FindOptions::default(), &Price).unwrap();
        for t in &tokens {
            if let Token::Match(m) = t {
                let far_ok = m.length >= FAR.min_length
                    && m.length <= FAR.max_length
                    && m.displacement >= FAR.min_displacement
                    && m.displacement <= FAR.max_displacement;
                let near_ok = m.length >= NEAR.min_length
                    && m.length <= NEAR.max_length
                    && m.displacement >= NEAR.min_displacement
                    && m.displacement <= NEAR.max_displacement;
                assert!(far_ok || near_ok, "match {m:?} fits neither shape");
            }
        }
    }
}
