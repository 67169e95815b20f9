//! Shortest-path parse of an input into literals and back-references.
//!
//! The input induces a DAG over unit positions `0..=N`: a literal edge
//! advances one unit, a match edge advances by its length (plus any forced
//! post-match skip units, which it covers as literals). Every edge is
//! weighed by the format's price calculator, and a single left-to-right
//! relaxation pass finds the cheapest path, since all prices are
//! non-negative. Ties prefer the longer match, then the smaller
//! displacement.

use log::debug;

use crate::errors::CodecError;

use super::finder::{Candidates, MatchFinder};
use super::{Direction, FindLimitations, FindOptions, Match, PriceCalculator, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pred {
    Unreached,
    Literal,
    Match {
        length: usize,
        displacement: usize,
        skip: usize,
    },
}

impl Pred {
    /// (covered units, reversed displacement) ranking for tie-breaks.
    fn rank(&self) -> (usize, usize) {
        match *self {
            Pred::Unreached => (0, usize::MAX),
            Pred::Literal => (1, usize::MAX),
            Pred::Match {
                length,
                displacement,
                skip,
            } => (length + skip, usize::MAX - displacement),
        }
    }
}

/// Parse `input` into a minimum-price token sequence covering it exactly.
///
/// Positions, lengths and displacements in the returned tokens are in
/// units of `options.unit_size`. Forward parses emit tokens left to right;
/// backward parses emit right to left, with positions and displacements
/// already mapped back to original byte order.
pub fn parse(
    input: &[u8],
    limitations: &[FindLimitations],
    options: &FindOptions,
    price: &dyn PriceCalculator,
) -> Result<Vec<Token>, CodecError> {
    let unit = options.unit_size.bytes();
    if input.len() % unit != 0 {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "input length is not a multiple of the unit size",
        });
    }
    debug_assert!(options.pre_buffer_size % unit == 0);
    let n = input.len() / unit;

    // compose the working buffer: pre-buffer fill, then the input in scan
    // order (backward scans run forward over the unit-reversed input)
    let pre = options.pre_buffer_size / unit;
    let mut work = Vec::with_capacity(options.pre_buffer_size + input.len());
    work.resize(options.pre_buffer_size, options.pre_buffer_fill);
    match options.direction {
        Direction::Forward => work.extend_from_slice(input),
        Direction::Backward => {
            for chunk in input.chunks_exact(unit).rev() {
                work.extend_from_slice(chunk);
            }
        }
    }

    let unit_value = |p: usize| -> u16 {
        let at = (pre + p) * unit;
        if unit == 1 {
            work[at] as u16
        } else {
            u16::from_le_bytes([work[at], work[at + 1]])
        }
    };

    let mut finder = MatchFinder::new(&work, unit, pre, limitations);
    let skip = options.skip_units_after_match;

    let mut cost = vec![u64::MAX; n + 1];
    let mut pred = vec![Pred::Unreached; n + 1];
    cost[0] = 0;

    let mut cands = Candidates::new();
    for p in 0..n {
        if cost[p] != u64::MAX {
            let here = cost[p];

            // literal edge
            relax(
                &mut cost,
                &mut pred,
                p + 1,
                here + price.literal_price(unit_value(p)) as u64,
                Pred::Literal,
            );

            // match edges, every usable length of every candidate
            finder.matches_at(p, &mut cands);
            for cand in &cands {
                let lim = &limitations[cand.limitation];
                for length in lim.min_length..=cand.max_length {
                    let tail = skip.min(n - p - length);
                    let mut w = here + price.match_price(length, cand.displacement) as u64;
                    for t in 0..tail {
                        w += price.literal_price(unit_value(p + length + t)) as u64;
                    }
                    relax(
                        &mut cost,
                        &mut pred,
                        p + length + tail,
                        w,
                        Pred::Match {
                            length,
                            displacement: cand.displacement,
                            skip: tail,
                        },
                    );
                }
            }
        }
        finder.insert_next();
    }

    assert!(
        n == 0 || cost[n] != u64::MAX,
        "parse left a coverage gap at the end of the input"
    );

    // walk the predecessors back from N, then flip into scan order
    let mut tokens = Vec::new();
    let mut at = n;
    while at > 0 {
        match pred[at] {
            Pred::Literal => {
                at -= 1;
                tokens.push(Token::Literal { position: at });
            }
            Pred::Match {
                length,
                displacement,
                skip,
            } => {
                for t in (0..skip).rev() {
                    tokens.push(Token::Literal {
                        position: at - skip + t,
                    });
                }
                at -= length + skip;
                tokens.push(Token::Match(Match {
                    position: at,
                    displacement,
                    length,
                }));
            }
            Pred::Unreached => unreachable!("predecessor chain broken"),
        }
    }
    tokens.reverse();

    // map backward-scan coordinates to original byte order; scan order is
    // kept, so emission runs right to left over the original input
    if options.direction == Direction::Backward {
        for token in &mut tokens {
            match token {
                Token::Literal { position } => *position = n - *position - 1,
                Token::Match(m) => m.position = n - m.position - m.length,
            }
        }
    }

    debug!(
        "parsed {} unit(s) into {} token(s), {} bits",
        n,
        tokens.len(),
        if n == 0 { 0 } else { cost[n] }
    );
    Ok(tokens)
}

fn relax(cost: &mut [u64], pred: &mut [Pred], target: usize, w: u64, edge: Pred) {
    if w < cost[target] || (w == cost[target] && edge.rank() > pred[target].rank()) {
        cost[target] = w;
        pred[target] = edge;
    }
}
