//! LZ77 encoder implementation
//!
//! Greedy longest-match search over the live window. The contract is only
//! that the decoder recovers the input exactly - the cabinets accept any
//! valid stream, so no attempt is made at optimal parsing.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::{FRAME_HEADER_SIZE, MAX_MATCH, MIN_MATCH, WINDOW_SIZE};

/// Compress `data` into a stream [`crate::decompress`] recovers exactly.
///
/// The output always ends with the `(offset 0, length 0)` sentinel, padded
/// out with zero flag bits in the final control byte.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 8 + 4);
    let mut matcher = Matcher::default();

    // Current control-byte group: position of the control byte in `out`,
    // and how many of its 8 flag bits have been assigned.
    let mut control_at = out.len();
    out.push(0u8);
    let mut bits_used = 0u8;

    let mut pos = 0usize;
    while pos < data.len() {
        let found = matcher.longest_match(data, pos);
        match found {
            Some((start, len)) => {
                let offset = start % WINDOW_SIZE;
                let b0 = (offset >> 4) as u8;
                let b1 = (((offset & 0x0F) << 4) | (len - MIN_MATCH)) as u8;
                // Flag bit stays clear for a reference
                out.push(b0);
                out.push(b1);
                for i in 0..len {
                    matcher.insert(data, pos + i);
                }
                pos += len;
            }
            None => {
                out[control_at] |= 1 << bits_used;
                out.push(data[pos]);
                matcher.insert(data, pos);
                pos += 1;
            }
        }
        bits_used += 1;
        if bits_used == 8 {
            control_at = out.len();
            out.push(0u8);
            bits_used = 0;
        }
    }

    // Sentinel reference closes the stream; leftover flag bits stay clear.
    out.push(0x00);
    out.push(0x00);
    out
}

/// Compress with the 8-byte `(uncompressed_len, compressed_len)` prefix
/// used for embedded asset payloads.
pub fn compress_framed(data: &[u8]) -> Vec<u8> {
    let body = compress(data);
    let mut out = Vec::with_capacity(body.len() + FRAME_HEADER_SIZE);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// Hash-chain match finder keyed on 3-byte prefixes.
///
/// Positions older than the window are pruned lazily on lookup, so each
/// chain only ever holds live candidates.
#[derive(Default)]
struct Matcher {
    chains: HashMap<[u8; 3], VecDeque<usize>>,
}

impl Matcher {
    fn insert(&mut self, data: &[u8], pos: usize) {
        if pos + MIN_MATCH <= data.len() {
            let key = [data[pos], data[pos + 1], data[pos + 2]];
            self.chains.entry(key).or_default().push_back(pos);
        }
    }

    /// Longest match of `MIN_MATCH..=MAX_MATCH` bytes starting before `pos`.
    ///
    /// Candidates must sit within the last `WINDOW_SIZE - 1` bytes so the
    /// decoder's window still holds them, and a 3-byte match at window
    /// offset 0 is rejected because its wire form collides with the
    /// end-of-stream sentinel.
    fn longest_match(&mut self, data: &[u8], pos: usize) -> Option<(usize, usize)> {
        if pos + MIN_MATCH > data.len() {
            return None;
        }
        let key = [data[pos], data[pos + 1], data[pos + 2]];
        let chain = self.chains.get_mut(&key)?;
        let oldest_live = (pos + 1).saturating_sub(WINDOW_SIZE);
        while let Some(&front) = chain.front() {
            if front < oldest_live {
                chain.pop_front();
            } else {
                break;
            }
        }

        let limit = MAX_MATCH.min(data.len() - pos);
        let mut best: Option<(usize, usize)> = None;
        for &start in chain.iter() {
            if start >= pos {
                break;
            }
            let mut len = 0usize;
            while len < limit && data[start + len] == data[pos + len] {
                len += 1;
            }
            if len < MIN_MATCH {
                continue;
            }
            if len == MIN_MATCH && start % WINDOW_SIZE == 0 {
                continue;
            }
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((start, len));
                if len == limit {
                    break;
                }
            }
        }
        best
    }
}
