//! Nintendo RLE (compression type 0x30).
//!
//! Control bytes with the top bit set introduce a run (`length - 3` in
//! the low seven bits, one value byte follows); with it clear, a raw
//! stretch (`length - 1`, that many bytes follow). Runs are found by the
//! shared parser as displacement-1 matches, so a run token always trails
//! at least one raw occurrence of its value.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{read_type_header, take_u8, write_type_header};

pub(crate) const TYPE_BYTE: u8 = 0x30;

const MIN_RUN: usize = 3;
const MAX_RUN: usize = 0x82;
const MAX_RAW: usize = 0x80;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = read_type_header(&mut cur, TYPE_BYTE)?;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let at = cur.position() as usize;
        let control = take_u8(&mut cur)?;
        if control & 0x80 != 0 {
            let length = (control & 0x7F) as usize + MIN_RUN;
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "run overruns the declared size",
                });
            }
            let value = take_u8(&mut cur)?;
            out.resize(out.len() + length, value);
        } else {
            let length = (control & 0x7F) as usize + 1;
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "raw stretch overruns the declared size",
                });
            }
            let start = out.len();
            out.resize(start + length, 0);
            super::take_bytes(&mut cur, &mut out[start..])?;
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        // one raw byte plus its share of a stretch header
        9
    }
    fn match_price(&self, _length: usize, _displacement: usize) -> u32 {
        16
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(MIN_RUN, MAX_RUN, 1, 1)];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() + 8);
    write_type_header(&mut out, TYPE_BYTE, input.len());

    let mut raw: Vec<u8> = Vec::with_capacity(MAX_RAW);
    for token in &tokens {
        match token {
            Token::Literal { position } => {
                raw.push(input[*position]);
                if raw.len() == MAX_RAW {
                    flush_raw(&mut out, &mut raw);
                }
            }
            Token::Match(m) => {
                flush_raw(&mut out, &mut raw);
                out.push(0x80 | (m.length - MIN_RUN) as u8);
                out.push(input[m.position - 1]);
            }
        }
    }
    flush_raw(&mut out, &mut raw);
    Ok(out)
}

fn flush_raw(out: &mut Vec<u8>, raw: &mut Vec<u8>) {
    if !raw.is_empty() {
        out.push((raw.len() - 1) as u8);
        out.extend_from_slice(raw);
        raw.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_raws_roundtrip() {
        let mut input = Vec::new();
        input.extend_from_slice(b"mixed ");
        input.extend(std::iter::repeat(0x00).take(0x200));
        input.extend_from_slice(b" stretch ");
        input.extend(std::iter::repeat(0xFF).take(5));
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn short_repeat_stays_raw() {
        // a 3-byte repeat cannot form a displacement-1 match of length 3
        let packed = encode(b"aaa").unwrap();
        assert_eq!(decode(&packed).unwrap(), b"aaa");
        assert_eq!(&packed[4..], &[0x02, b'a', b'a', b'a']);
    }

    #[test]
    fn long_raw_stretches_split_at_cap() {
        let input: Vec<u8> = (0..0x180u32).map(|i| (i * 7 + 1) as u8).collect();
        let packed = encode(&input).unwrap();
        assert_eq!(decode(&packed).unwrap(), input);
    }

    #[test]
    fn uniform_input_packs_to_chained_runs() {
        let input = vec![7u8; 0x400];
        let packed = encode(&input).unwrap();
        // one raw byte then ceil(0x3FF / 0x82) two-byte run tokens
        assert!(packed.len() <= 4 + 2 + 2 * (0x3FF / (MAX_RUN - 1) + 2));
        assert_eq!(decode(&packed).unwrap(), input);
    }
}
