//! LzEcd: ring-addressed LZSS over a 0x400-byte window that starts
//! 0x3BE bytes deep in zero fill.
//!
//! Both sides keep a ring of 0x400 bytes, initially zero, with the write
//! cursor starting at 0x3BE; references address the ring absolutely, so a
//! match may pull from the zero fill before any data has been written.
//! Flag bytes are LSB-first, a set bit meaning one verbatim byte. A
//! reference packs the low eight ring bits in its first byte, the top two
//! in bits 6-7 of the second, and `length - 3` in the remaining six.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{take_u32_le, take_u8};

const WINDOW: usize = 0x400;
const PRE_BUFFER: usize = 0x3BE;

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x42;
const MAX_DISPLACEMENT: usize = 0x400;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = take_u32_le(&mut cur)? as usize;

    let mut ring = [0u8; WINDOW];
    let mut write_at = PRE_BUFFER;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let flags = take_u8(&mut cur)?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                let byte = take_u8(&mut cur)?;
                out.push(byte);
                ring[write_at] = byte;
                write_at = (write_at + 1) % WINDOW;
            } else {
                let at = cur.position() as usize;
                let b0 = take_u8(&mut cur)? as usize;
                let b1 = take_u8(&mut cur)? as usize;
                let ring_at = b0 | (b1 & 0xC0) << 2;
                let length = (b1 & 0x3F) + MIN_LENGTH;
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                for i in 0..length {
                    let byte = ring[(ring_at + i) % WINDOW];
                    out.push(byte);
                    ring[write_at] = byte;
                    write_at = (write_at + 1) % WINDOW;
                }
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
    let options = FindOptions {
        pre_buffer_size: PRE_BUFFER,
        pre_buffer_fill: 0,
        ..FindOptions::default()
    };
    let tokens = lz::parse(input, &limits, &options, &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Literal { .. }) {
                flags |= 1 << i;
            }
        }
        out.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => out.push(input[*position]),
                Token::Match(m) => {
                    // convert the displacement to an absolute ring address
                    let write_at = (PRE_BUFFER + m.position) % WINDOW;
                    let ring_at = (write_at + WINDOW - m.displacement % WINDOW) % WINDOW;
                    out.push(ring_at as u8);
                    out.push(((ring_at >> 2) & 0xC0) as u8 | (m.length - MIN_LENGTH) as u8);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lz::Match;

    #[test]
    fn zero_page_matches_from_the_first_byte() {
        // an all-zero input starts matching the pre-buffer immediately:
        // no literals at all, every reference at most 0x42 long
        let input = vec![0u8; 0x500];
        let limits = [FindLimitations::new(MIN_LENGTH, MAX_LENGTH, 1, MAX_DISPLACEMENT)];
        let options = FindOptions {
            pre_buffer_size: PRE_BUFFER,
            pre_buffer_fill: 0,
            ..FindOptions::default()
        };
        let tokens = lz::parse(&input, &limits, &options, &Price).unwrap();
        assert!(tokens.iter().all(|t| matches!(t, Token::Match(_))));
        assert!(tokens.iter().all(|t| t.covered() <= MAX_LENGTH));
        assert!(matches!(
            tokens[0],
            Token::Match(Match { position: 0, .. })
        ));

        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn text_roundtrips() {
        let input = b"ring ring ring around the ring buffer ring";
        assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
    }

    #[test]
    fn window_wraparound_roundtrips() {
        // enough data to wrap the 0x400 ring several times
        let input: Vec<u8> = (0..0x1200u32).map(|i| (i % 61) as u8).collect();
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }
}
