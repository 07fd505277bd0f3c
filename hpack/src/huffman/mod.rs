// Copyright (C) 2019, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Huffman coding of string literals (RFC 7541 Appendix B).

use crate::Error;
use crate::Result;

use self::table::ENCODE_TABLE;

const EOS: u16 = 256;

const ROOT: usize = 0;

lazy_static::lazy_static! {
    /// Decoding trie built from the code table.
    static ref DECODE_TRIE: Trie = Trie::build();
}

/// Decodes a Huffman-encoded string, consuming all of `b`.
pub fn decode(b: &mut octets::Octets) -> Result<Vec<u8>> {
    let trie = &*DECODE_TRIE;

    // Max compression ratio is >= 0.5
    let mut out = Vec::with_capacity(b.cap() << 1);

    let mut node = ROOT;
    let mut current: u32 = 0;
    let mut bits = 0;

    while b.cap() > 0 {
        current = (current << 8) | u32::from(b.get_u8()?);
        bits += 8;

        while bits >= 8 {
            let c = (current >> (bits - 8)) & 0xff;

            match trie.child(node, c as u8) {
                Child::Node(next) => {
                    node = next;
                    bits -= 8;
                },

                Child::Leaf { symbol, len } => {
                    if symbol == EOS {
                        return Err(Error::HuffmanEosDecoded);
                    }

                    out.push(symbol as u8);
                    node = ROOT;
                    bits -= len;
                },

                // The code is complete, every slot is populated.
                Child::Empty => return Err(Error::InvalidHuffmanPadding),
            }
        }
    }

    // Drain symbols that end inside the last partial byte.
    while bits > 0 {
        let c = (current << (8 - bits)) & 0xff;

        match trie.child(node, c as u8) {
            Child::Leaf { symbol, len } if len <= bits => {
                if symbol == EOS {
                    return Err(Error::HuffmanEosDecoded);
                }

                out.push(symbol as u8);
                node = ROOT;
                bits -= len;
            },

            _ => break,
        }
    }

    // Whatever is left must be a strict prefix of EOS, at most 7 bits long.
    if node != ROOT {
        return Err(Error::InvalidHuffmanPadding);
    }

    let mask = (1 << bits) - 1;
    if current & mask != mask {
        return Err(Error::InvalidHuffmanPadding);
    }

    Ok(out)
}

/// Huffman-encodes `src`, appending the result to `out`.
pub fn encode(src: &[u8], out: &mut Vec<u8>) {
    let mut bits: u64 = 0;
    let mut pending = 0;

    for &b in src {
        let (nbits, code) = ENCODE_TABLE[b as usize];

        bits = (bits << nbits) | code;
        pending += nbits;

        while pending >= 8 {
            pending -= 8;
            out.push((bits >> pending) as u8);
        }
    }

    if pending > 0 {
        // Pad with the most significant bits of EOS.
        bits = (bits << (8 - pending)) | (0xff >> pending);
        out.push(bits as u8);
    }
}

/// Returns the number of bytes [`encode()`] would produce for `src`.
pub fn encode_output_length(src: &[u8]) -> usize {
    let bits: usize = src.iter().map(|&b| ENCODE_TABLE[b as usize].0).sum();

    (bits + 7) / 8
}

#[derive(Clone, Copy)]
enum Child {
    Empty,

    /// Index of the node consuming the next 8 bits.
    Node(usize),

    /// A decoded symbol and the number of bits of this byte it used.
    Leaf { symbol: u16, len: usize },
}

/// A trie where every node consumes 8 bits of input.
struct Trie {
    nodes: Vec<[Child; 256]>,
}

impl Trie {
    fn build() -> Trie {
        let mut trie = Trie {
            nodes: vec![[Child::Empty; 256]],
        };

        for (symbol, &(len, code)) in ENCODE_TABLE.iter().enumerate() {
            trie.insert(symbol as u16, code, len);
        }

        trie
    }

    fn insert(&mut self, symbol: u16, code: u64, mut len: usize) {
        let mut node = ROOT;

        while len > 8 {
            len -= 8;

            let i = ((code >> len) & 0xff) as usize;

            node = match self.nodes[node][i] {
                Child::Node(next) => next,

                _ => {
                    let next = self.nodes.len();
                    self.nodes.push([Child::Empty; 256]);
                    self.nodes[node][i] = Child::Node(next);
                    next
                },
            };
        }

        // The remaining `len` bits select a range of slots, one for every
        // value of the bits that follow.
        let shift = 8 - len;
        let start = ((code << shift) & 0xff) as usize;

        for slot in &mut self.nodes[node][start..start + (1 << shift)] {
            *slot = Child::Leaf { symbol, len };
        }
    }

    fn child(&self, node: usize, c: u8) -> Child {
        self.nodes[node][c as usize]
    }
}


mod table;
