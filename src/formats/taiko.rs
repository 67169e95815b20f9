//! The Taiko LZ pair.
//!
//! LZ80 dispatches on the top two bits of a control byte: `0` a literal
//! run, `1` a one-byte tiny reference, `2` a two-byte mid reference, `3`
//! a three-byte long reference. The three reference shapes carry the
//! format's three parallel limitations. LZ81 keeps single-byte literal
//! run controls and grades reference lengths through an extension byte.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_u16_le, take_u8, take_u32_le};

const LZ80_TINY: FindLimitations = FindLimitations::new(2, 5, 1, 0x10);
const LZ80_MID: FindLimitations = FindLimitations::new(3, 0x12, 1, 0x400);
const LZ80_LONG: FindLimitations = FindLimitations::new(4, 0x83, 1, 0x8000);

const LZ81_LIMITS: FindLimitations = FindLimitations::new(1, 0x102, 2, 0x8000);

const RUN_CAP: usize = 0x40;

pub fn decode_lz80(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    if take_u8(&mut cur)? != 0x80 {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "unexpected compression type byte",
        });
    }
    let size = take_u32_le(&mut cur)? as usize;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let at = cur.position() as usize;
        let control = take_u8(&mut cur)? as usize;
        let (length, displacement) = match control >> 6 {
            0 => {
                let count = (control & 0x3F) + 1;
                if out.len() + count > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "literal run overruns the declared size",
                    });
                }
                let start = out.len();
                out.resize(start + count, 0);
                super::take_bytes(&mut cur, &mut out[start..])?;
                continue;
            }
            1 => ((control >> 4 & 0x3) + 2, (control & 0xF) + 1),
            2 => {
                let low = take_u8(&mut cur)? as usize;
                ((control >> 2 & 0xF) + 3, ((control & 0x3) << 8 | low) + 1)
            }
            _ => {
                let b1 = take_u8(&mut cur)? as usize;
                let b2 = take_u8(&mut cur)? as usize;
                (
                    ((control & 0x3F) << 1 | b1 >> 7) + 4,
                    ((b1 & 0x7F) << 8 | b2) + 1,
                )
            }
        };
        if out.len() + length > size {
            return Err(CodecError::MalformedToken {
                offset: at,
                reason: "reference overruns the declared size",
            });
        }
        copy_backref(&mut out, displacement, length, at)?;
    }
    Ok(out)
}

struct Lz80Price;

impl PriceCalculator for Lz80Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
    }
    fn match_price(&self, length: usize, displacement: usize) -> u32 {
        if length <= LZ80_TINY.max_length && displacement <= LZ80_TINY.max_displacement {
            8
        } else if length <= LZ80_MID.max_length && displacement <= LZ80_MID.max_displacement {
            16
        } else {
            24
        }
    }
}

pub fn encode_lz80(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [LZ80_TINY, LZ80_MID, LZ80_LONG];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Lz80Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    out.push(0x80);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    let mut run: Vec<u8> = Vec::with_capacity(RUN_CAP);
    for token in &tokens {
        match token {
            Token::Literal { position } => {
                run.push(input[*position]);
                if run.len() == RUN_CAP {
                    flush_run(&mut out, &mut run);
                }
            }
            Token::Match(m) => {
                flush_run(&mut out, &mut run);
                let (length, disp) = (m.length, m.displacement - 1);
                if length <= LZ80_TINY.max_length
                    && m.displacement <= LZ80_TINY.max_displacement
                {
                    out.push(0x40 | ((length - 2) << 4) as u8 | disp as u8);
                } else if length <= LZ80_MID.max_length
                    && m.displacement <= LZ80_MID.max_displacement
                {
                    out.push(0x80 | ((length - 3) << 2) as u8 | (disp >> 8) as u8);
                    out.push(disp as u8);
                } else {
                    let stored = length - 4;
                    out.push(0xC0 | (stored >> 1) as u8);
                    out.push(((stored & 1) << 7) as u8 | (disp >> 8) as u8);
                    out.push(disp as u8);
                }
            }
        }
    }
    flush_run(&mut out, &mut run);
    Ok(out)
}

fn flush_run(out: &mut Vec<u8>, run: &mut Vec<u8>) {
    if !run.is_empty() {
        out.push((run.len() - 1) as u8);
        out.extend_from_slice(run);
        run.clear();
    }
}

pub fn decode_lz81(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    if take_u8(&mut cur)? != 0x81 {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "unexpected compression type byte",
        });
    }
    let size = take_u32_le(&mut cur)? as usize;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let at = cur.position() as usize;
        let control = take_u8(&mut cur)? as usize;
        if control & 0x80 == 0 {
            let count = control + 1;
            if out.len() + count > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "literal run overruns the declared size",
                });
            }
            let start = out.len();
            out.resize(start + count, 0);
            super::take_bytes(&mut cur, &mut out[start..])?;
        } else {
            let stored = control & 0x7F;
            let length = if stored == 0 {
                take_u8(&mut cur)? as usize + 0x80
            } else {
                stored
            };
            let displacement = take_u16_le(&mut cur)? as usize + 2;
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "reference overruns the declared size",
                });
            }
            copy_backref(&mut out, displacement, length, at)?;
        }
    }
    Ok(out)
}

struct Lz81Price;

impl PriceCalculator for Lz81Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
    }
    fn match_price(&self, length: usize, _displacement: usize) -> u32 {
        if length < 0x80 {
            24
        } else {
            32
        }
    }
}

pub fn encode_lz81(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [LZ81_LIMITS];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Lz81Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    out.push(0x81);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    let mut run: Vec<u8> = Vec::with_capacity(0x80);
    for token in &tokens {
        match token {
            Token::Literal { position } => {
                run.push(input[*position]);
                if run.len() == 0x80 {
                    flush_run(&mut out, &mut run);
                }
            }
            Token::Match(m) => {
                flush_run(&mut out, &mut run);
                if m.length < 0x80 {
                    out.push(0x80 | m.length as u8);
                } else {
                    out.push(0x80);
                    out.push((m.length - 0x80) as u8);
                }
                out.extend_from_slice(&((m.displacement - 2) as u16).to_le_bytes());
            }
        }
    }
    flush_run(&mut out, &mut run);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lz80_all_three_shapes_roundtrip() {
        // near-tiny, mid-window, and far/long repeats in one stream
        let mut input = Vec::new();
        input.extend_from_slice(b"hophop");
        input.extend_from_slice(b"a longer phrase, a longer phrase");
        input.extend(std::iter::repeat(b'#').take(0x100));
        input.extend_from_slice(b"hophop once more");
        assert_eq!(decode_lz80(&encode_lz80(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn lz80_matches_respect_a_limitation_each() {
        let limits = [LZ80_TINY, LZ80_MID, LZ80_LONG];
        let input = b"drumdrumdrumdrum taiko taiko taiko";
        let tokens = lz::parse(input, &limits, &FindOptions::default(), &Lz80Price).unwrap();
        for t in &tokens {
            if let Token::Match(m) = t {
                assert!(limits.iter().any(|lim| m.length >= lim.min_length
                    && m.length <= lim.max_length
                    && m.displacement >= lim.min_displacement
                    && m.displacement <= lim.max_displacement));
            }
        }
    }

    #[test]
    fn lz81_extended_lengths_roundtrip() {
        let mut input = b"seed ".to_vec();
        input.extend(std::iter::repeat(b"ab").take(0x120).flatten());
        assert_eq!(decode_lz81(&encode_lz81(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn lz81_short_match_minimum_displacement() {
        // displacement below 2 never appears
        let input = b"zzzzzzzzzzzz";
        let packed = encode_lz81(input).unwrap();
        assert_eq!(decode_lz81(&packed).unwrap(), input);
        let tokens = lz::parse(input, &[LZ81_LIMITS], &FindOptions::default(), &Lz81Price).unwrap();
        for t in &tokens {
            if let Token::Match(m) = t {
                assert!(m.displacement >= 2);
            }
        }
    }

    #[test]
    fn type_bytes_are_distinct() {
        let packed = encode_lz80(b"mismatch").unwrap();
        assert!(decode_lz81(&packed).is_err());
    }
}
