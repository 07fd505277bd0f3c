#![no_main]

#[macro_use]
extern crate libfuzzer_sys;

use std::sync::Once;

static LOG_INIT: Once = Once::new();

const MAX_HEADER_LIST_SIZE: usize = 8192;

// Every chunk is a header block, decoded with the same decoder so that the
// dynamic table carries over.
fuzz_target!(|data: &[u8]| {
    LOG_INIT.call_once(|| env_logger::builder().format_timestamp_nanos().init());

    let mut decoder = hpack::Decoder::new(MAX_HEADER_LIST_SIZE, 4096);

    let blocks = hpack_fuzz::Chunks { data };

    for block in blocks.iter() {
        let mut collector = hpack_fuzz::Collector {
            headers: Vec::new(),
            max_header_list_size: MAX_HEADER_LIST_SIZE,
        };

        let mut b = octets::Octets::with_slice(block);

        if decoder.decode(&mut b, &mut collector).is_err() {
            break;
        }

        decoder.end_header_block();

        assert!(decoder.size() <= decoder.max_header_table_size());
    }
});
