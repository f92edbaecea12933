#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use stripeio::{BufferPool, ChunkList, MemorySource, ReadConfig, read_ranges};

const SOURCE_LEN: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (header, body) = data.split_at(3);
    let distance = u64::from(header[0]) * 16;
    let threshold = f64::from(header[1]) / 255.0;
    let reuse = header[2] & 1 == 1;

    // Every 3 bytes: advance (u8) and length (u16, non-zero)
    let mut list = ChunkList::new();
    let mut offset = 0u64;
    for step in body.chunks_exact(3) {
        offset += u64::from(step[0]);
        let length = u32::from(u16::from_le_bytes([step[1], step[2]])).max(1);
        if offset + u64::from(length) > SOURCE_LEN as u64 {
            break;
        }
        list.push(offset, length).unwrap();
    }

    let bytes: Bytes = (0..SOURCE_LEN).map(|i| (i % 251) as u8).collect::<Vec<_>>().into();
    let mut source = MemorySource::new(bytes.clone());
    let config = ReadConfig::new(distance, threshold, reuse).unwrap();
    let stats = read_ranges(&mut list, &mut source, &mut BufferPool::new(), &config).unwrap();

    // Verify: every chunk holds exactly its own bytes
    for (_, chunk) in list.iter() {
        let got = chunk.data().unwrap();
        assert_eq!(got.as_ref(), &bytes[chunk.offset() as usize..chunk.end() as usize]);
    }

    // Verify: never more resident than read
    assert!(stats.resident_bytes <= stats.read_bytes);
    assert_eq!(stats.reads, source.copy_reads());
});
