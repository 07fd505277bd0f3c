// Copyright (C) 2018-2019, Cloudflare, Inc.
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
#[macro_use]
extern crate criterion;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;

use rand::Rng;
use rand::SeedableRng;

const REQUEST: [(&[u8], &[u8]); 8] = [
    (b":method", b"GET"),
    (b":scheme", b"https"),
    (b":authority", b"quic.tech"),
    (b":path", b"/test"),
    (b"user-agent", b"hpack-bench"),
    (b"accept", b"text/html,application/xhtml+xml"),
    (b"accept-encoding", b"gzip, deflate, br"),
    (b"cookie", b"session=0123456789abcdef; theme=dark"),
];

fn encode(c: &mut Criterion) {
    let mut out = Vec::with_capacity(4096);

    c.bench_function("encode", |b| {
        let mut encoder = hpack::Encoder::new(4096);

        b.iter(|| {
            out.clear();
            encoder.encode(&mut out, &REQUEST);
        })
    });

    c.bench_function("encode_no_table", |b| {
        let mut encoder = hpack::Encoder::new(0);

        b.iter(|| {
            out.clear();
            encoder.encode(&mut out, &REQUEST);
        })
    });
}

fn decode(c: &mut Criterion) {
    let mut block = Vec::new();
    hpack::Encoder::new(0).encode(&mut block, &REQUEST);

    c.bench_function("decode", |b| {
        let mut decoder = hpack::Decoder::new(65536, 0);
        let mut headers: Vec<(hpack::HeaderField, bool)> =
            Vec::with_capacity(REQUEST.len());

        b.iter(|| {
            headers.clear();

            let mut oct = octets::Octets::with_slice(&block);
            decoder.decode(&mut oct, &mut headers).unwrap();
            decoder.end_header_block();
        })
    });
}

fn huffman(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    let mut group = c.benchmark_group("huffman");

    for size in [16, 256, 4096] {
        let src: Vec<u8> =
            (0..size).map(|_| rng.gen_range(b' '..=b'~')).collect();

        let mut encoded = Vec::new();
        hpack::huffman::encode(&src, &mut encoded);

        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &src, |b, src| {
            let mut out = Vec::with_capacity(src.len());

            b.iter(|| {
                out.clear();
                hpack::huffman::encode(src, &mut out);
            })
        });

        group.bench_with_input(
            BenchmarkId::new("decode", size),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let mut oct = octets::Octets::with_slice(encoded);
                    hpack::huffman::decode(&mut oct).unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, encode, decode, huffman);
criterion_main!(benches);
