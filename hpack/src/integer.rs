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

//! Prefixed integer representation (RFC 7541 Section 5.1).

use crate::Error;
use crate::Result;

/// Appends `v` encoded on a `prefix`-bit prefix, OR-ing `first` into the
/// leading byte.
pub fn encode_int(mut v: usize, first: u8, prefix: usize, out: &mut Vec<u8>) {
    let mask = (1 << prefix) - 1;

    // Encode I on N bits.
    if v < mask {
        out.push(first | v as u8);
        return;
    }

    // Encode (2^N - 1) on N bits.
    out.push(first | mask as u8);

    v -= mask;

    while v >= 128 {
        // Encode (I % 128 + 128) on 8 bits.
        out.push((v & 0x7f) as u8 | 0x80);

        v >>= 7;
    }

    // Encode I on 8 bits.
    out.push(v as u8);
}

/// Decodes the continuation bytes that follow a saturated prefix.
///
/// Returns `Ok(None)` when `b` runs out before the terminating byte. In that
/// case nothing is consumed, so the call can be repeated once more input is
/// available. Values that don't fit in 31 bits are an
/// [`Error::IntegerOverflow`].
pub fn decode_ule128(b: &mut octets::Octets) -> Result<Option<u32>> {
    // Decode from a view so that `b` only advances on success.
    let mut probe = b.peek_bytes(b.cap())?;

    let mut result: u32 = 0;
    let mut shift = 0;

    while shift < 32 {
        let byte = match probe.get_u8() {
            Ok(v) => v,

            Err(_) => return Ok(None),
        };

        if shift == 28 && byte & 0xf8 != 0 {
            break;
        }

        result |= u32::from(byte & 0x7f) << shift;

        if byte & 0x80 == 0 {
            b.skip(probe.off())?;
            return Ok(Some(result));
        }

        shift += 7;
    }

    Err(Error::IntegerOverflow)
}

/// Decodes a whole prefixed integer, prefix byte included.
///
/// Like [`decode_ule128()`], returns `Ok(None)` without consuming anything
/// if `b` doesn't hold the complete integer.
pub fn decode_int(b: &mut octets::Octets, prefix: usize) -> Result<Option<u32>> {
    let mut probe = b.peek_bytes(b.cap())?;

    let mask = (1 << prefix) - 1;

    let first = match probe.get_u8() {
        Ok(v) => u32::from(v) & mask,

        Err(_) => return Ok(None),
    };

    if first < mask {
        b.skip(1)?;
        return Ok(Some(first));
    }

    match decode_ule128(&mut probe)? {
        Some(rest) => {
            let v = first.checked_add(rest).ok_or(Error::IntegerOverflow)?;

            b.skip(probe.off())?;
            Ok(Some(v))
        },

        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn encode_int1() {
        let mut encoded = Vec::new();
        encode_int(10, 0, 5, &mut encoded);

        assert_eq!(encoded, [0b01010]);
    }

    #[test]
    fn encode_int2() {
        let mut encoded = Vec::new();
        encode_int(1337, 0, 5, &mut encoded);

        assert_eq!(encoded, [0b11111, 0b10011010, 0b00001010]);
    }

    #[test]
    fn encode_int3() {
        let mut encoded = Vec::new();
        encode_int(42, 0, 8, &mut encoded);

        assert_eq!(encoded, [0b101010]);
    }

    #[test]
    fn encode_int_keeps_flags() {
        let mut encoded = Vec::new();
        encode_int(62, 0x80, 7, &mut encoded);

        assert_eq!(encoded, [0xbe]);
    }

    #[test]
    fn seven_bit_prefix_boundary() {
        let mut encoded = Vec::new();
        encode_int(126, 0x80, 7, &mut encoded);
        assert_eq!(encoded, [0xfe]);

        let mut encoded = Vec::new();
        encode_int(127, 0x80, 7, &mut encoded);
        assert_eq!(encoded, [0xff, 0x00]);

        let mut encoded = Vec::new();
        encode_int(128, 0x80, 7, &mut encoded);
        assert_eq!(encoded, [0xff, 0x01]);
    }

    #[test]
    fn decode_int1() {
        let encoded = [0b01010, 0x02];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_int(&mut b, 5), Ok(Some(10)));
        assert_eq!(b.cap(), 1);
    }

    #[test]
    fn decode_int2() {
        let encoded = [0b11111, 0b10011010, 0b00001010];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_int(&mut b, 5), Ok(Some(1337)));
        assert_eq!(b.cap(), 0);
    }

    #[test]
    fn decode_int3() {
        let encoded = [0b101010];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_int(&mut b, 8), Ok(Some(42)));
    }

    #[rstest]
    fn round_trip(
        #[values(0, 1, 126, 127, 128, 16383, 16384)] v: usize,
        #[values(4, 5, 6, 7, 8)] prefix: usize,
    ) {
        let mut encoded = Vec::new();
        encode_int(v, 0, prefix, &mut encoded);

        let mut b = octets::Octets::with_slice(&encoded);
        assert_eq!(decode_int(&mut b, prefix), Ok(Some(v as u32)));
        assert_eq!(b.cap(), 0);
    }

    #[rstest]
    #[case(126, 1)]
    #[case(127, 2)]
    #[case(254, 2)]
    #[case(16383, 3)]
    #[case(16384, 3)]
    fn seven_bit_encoded_len(#[case] v: usize, #[case] len: usize) {
        let mut encoded = Vec::new();
        encode_int(v, 0x80, 7, &mut encoded);

        assert_eq!(encoded.len(), len);
    }

    #[test]
    fn need_more_input() {
        let encoded = [0b10011010, 0b10001010];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_ule128(&mut b), Ok(None));
        assert_eq!(b.off(), 0);

        let encoded = [0b11111, 0b10011010];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_int(&mut b, 5), Ok(None));
        assert_eq!(b.off(), 0);

        let mut b = octets::Octets::with_slice(&[]);
        assert_eq!(decode_ule128(&mut b), Ok(None));
        assert_eq!(decode_int(&mut b, 5), Ok(None));
    }

    #[test]
    fn resumes_after_starvation() {
        let mut encoded = Vec::new();
        encode_int(1_000_000, 0, 5, &mut encoded);
        assert!(encoded.len() > 2);

        let mut b = octets::Octets::with_slice(&encoded[1..3]);
        assert_eq!(decode_ule128(&mut b), Ok(None));
        assert_eq!(b.off(), 0);

        let mut b = octets::Octets::with_slice(&encoded[1..]);
        assert_eq!(decode_ule128(&mut b), Ok(Some(1_000_000 - 31)));
        assert_eq!(b.cap(), 0);
    }

    #[test]
    fn max_value() {
        // 2^31 - 1 fits in the 32-bit window.
        let encoded = [0xff, 0xff, 0xff, 0xff, 0x07];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_ule128(&mut b), Ok(Some(i32::MAX as u32)));
    }

    #[test]
    fn overflow() {
        let encoded = [0xff, 0xff, 0xff, 0xff, 0x08];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_ule128(&mut b), Err(Error::IntegerOverflow));

        let encoded = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut b = octets::Octets::with_slice(&encoded);

        assert_eq!(decode_ule128(&mut b), Err(Error::IntegerOverflow));
    }
}
