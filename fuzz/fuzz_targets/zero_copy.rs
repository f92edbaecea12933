#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use stripeio::{BufferPool, ChunkList, MemorySource, ReadConfig, ZeroCopyReader};

const SOURCE_LEN: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (header, body) = data.split_at(4);
    let mapped_from = u64::from(u16::from_le_bytes([header[0], header[1]])) % SOURCE_LEN as u64;
    let block_size = u64::from(header[2]).max(1) * 32;
    let distance = u64::from(header[3]) * 8;

    let mut list = ChunkList::new();
    let mut offset = 0u64;
    for step in body.chunks_exact(3) {
        offset += u64::from(step[0]);
        let length = u32::from(u16::from_le_bytes([step[1], step[2]]) % 4096).max(1);
        if offset + u64::from(length) > SOURCE_LEN as u64 {
            break;
        }
        list.push(offset, length).unwrap();
    }

    let bytes: Bytes = (0..SOURCE_LEN).map(|i| (i % 241) as u8).collect::<Vec<_>>().into();
    let source = MemorySource::new(bytes.clone()).with_zero_copy(mapped_from, block_size);
    let mut reader = ZeroCopyReader::new(source, BufferPool::new());
    reader
        .read_ranges(&mut list, &ReadConfig::default().with_max_merge_distance(distance))
        .unwrap();

    for (_, chunk) in list.iter() {
        let got = chunk.data().unwrap();
        assert_eq!(got.as_ref(), &bytes[chunk.offset() as usize..chunk.end() as usize]);
    }

    // Verify: exactly-once release leaves nothing mapped
    reader.release_all_buffers().unwrap();
    assert!(reader.source().is_all_released());
    assert!(reader.release_all_buffers().is_ok());
});
