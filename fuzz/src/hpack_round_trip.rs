#![no_main]

#[macro_use]
extern crate libfuzzer_sys;

// Every chunk is a header field, the name running up to the first NUL byte.
// The encoded block is fed to the decoder one byte at a time.
fuzz_target!(|data: &[u8]| {
    let mut encoder = hpack::Encoder::new(256);
    let mut decoder = hpack::Decoder::new(usize::MAX, 256);

    let fields: Vec<(&[u8], &[u8])> = hpack_fuzz::Chunks { data }
        .iter()
        .filter_map(|chunk| {
            let pos = chunk.iter().position(|&b| b == 0)?;
            let (name, value) = (&chunk[..pos], &chunk[pos + 1..]);

            (!name.is_empty()).then_some((name, value))
        })
        .collect();

    let mut out = Vec::new();

    for (i, (name, value)) in fields.iter().enumerate() {
        encoder.encode_header(&mut out, name, value, i % 7 == 3, i % 3 != 0);
    }

    let mut collector = hpack_fuzz::Collector {
        headers: Vec::new(),
        max_header_list_size: usize::MAX,
    };

    let mut pending = Vec::new();

    for &byte in &out {
        pending.push(byte);

        let mut b = octets::Octets::with_slice(&pending);
        decoder.decode(&mut b, &mut collector).unwrap();

        let off = b.off();
        pending.drain(..off);
    }

    assert!(pending.is_empty());
    assert!(!decoder.end_header_block());

    assert_eq!(collector.headers.len(), fields.len());

    for (i, ((name, value, sensitive), field)) in
        collector.headers.iter().zip(&fields).enumerate()
    {
        assert_eq!((name.as_slice(), value.as_slice()), *field);
        assert_eq!(*sensitive, i % 7 == 3);
    }

    assert_eq!(decoder.size(), encoder.size());
    assert_eq!(decoder.len(), encoder.len());
});
