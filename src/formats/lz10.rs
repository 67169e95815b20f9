//! Nintendo LZ10 (compression type 0x10).
//!
//! Eight-token groups led by a flag byte read MSB-first: a set bit is a
//! big-endian reference word packing `length - 3` in the top nibble and
//! `displacement - 1` in the remaining twelve bits, a clear bit is one
//! verbatim byte.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, read_type_header, take_u16_be, take_u8, write_type_header};

pub(crate) const TYPE_BYTE: u8 = 0x10;

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x12;
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
                let word = take_u16_be(&mut cur)?;
                let length = ((word >> 12) as usize) + 3;
                let displacement = ((word & 0xFFF) as usize) + 1;
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
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    write_type_header(&mut out, TYPE_BYTE, input.len());
    serialize(&tokens, input, &mut out);
    Ok(out)
}

/// Group tokens by eight under a leading flag byte. Shared with LZ11,
/// which differs only in reference layout.
pub(crate) fn serialize_grouped(
    tokens: &[Token],
    input: &[u8],
    out: &mut Vec<u8>,
    mut write_ref: impl FnMut(&mut Vec<u8>, usize, usize),
) {
    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Match(_)) {
                flags |= 0x80 >> i;
            }
        }
        out.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => out.push(input[*position]),
                Token::Match(m) => write_ref(out, m.length, m.displacement),
            }
        }
    }
}

fn serialize(tokens: &[Token], input: &[u8], out: &mut Vec<u8>) {
    serialize_grouped(tokens, input, out, |out, length, displacement| {
        let word = (((length - 3) as u16) << 12) | ((displacement - 1) as u16);
        out.extend_from_slice(&word.to_be_bytes());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lz::Match;

    #[test]
    fn known_stream_decodes() {
        // "ABABABABAB": literals 'A' 'B', then an 8-byte reference with
        // displacement 2
        let compressed = [
            0x10, 0x0A, 0x00, 0x00, // type 0x10, size 10
            0b0010_0000, b'A', b'B', 0x50, 0x01,
        ];
        assert_eq!(decode(&compressed).unwrap(), b"ABABABABAB");
    }

    #[test]
    fn alternating_pair_parses_as_one_reference() {
        let input = b"ABABABABAB";
        let limits = [FindLimitations::new(MIN_LENGTH, MAX_LENGTH, 1, MAX_DISPLACEMENT)];
        let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal { position: 0 },
                Token::Literal { position: 1 },
                Token::Match(Match {
                    position: 2,
                    displacement: 2,
                    length: 8
                }),
            ]
        );
        assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
    }

    #[test]
    fn truncated_stream_is_reported() {
        let compressed = [0x10, 0x0A, 0x00, 0x00, 0b0000_0000, b'A'];
        assert!(matches!(
            decode(&compressed),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn overlong_reference_is_malformed() {
        // size 4, but the reference wants 8 bytes
        let compressed = [0x10, 0x04, 0x00, 0x00, 0b0100_0000, b'A', 0x50, 0x01];
        assert!(matches!(
            decode(&compressed),
            Err(CodecError::MalformedToken { .. })
        ));
    }
}
