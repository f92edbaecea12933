// Property tests for merge planning and population

use bytes::Bytes;
use proptest::prelude::*;
use stripeio::{
    BufferPool, ChunkList, ChunkReader, MemorySource, ReadConfig, ZeroCopyReader, read_ranges,
};

const SOURCE_LEN: u64 = 64 * 1024;

fn source_bytes() -> Bytes {
    (0..SOURCE_LEN)
        .map(|p| (p.wrapping_mul(31) % 251) as u8)
        .collect::<Vec<_>>()
        .into()
}

/// Ascending `(offset, length)` pairs that fit in the source.
fn ranges() -> impl Strategy<Value = Vec<(u64, u32)>> {
    prop::collection::vec((0u64..2048, 1u32..1024), 1..24).prop_map(|steps| {
        let mut offset = 0u64;
        steps
            .into_iter()
            .map(|(advance, length)| {
                offset += advance;
                (offset, length)
            })
            .take_while(|(offset, length)| offset + u64::from(*length) <= SOURCE_LEN)
            .collect()
    })
}

fn assert_populated_correctly(list: &ChunkList, data: &Bytes) {
    for (_, chunk) in list.iter() {
        let got = chunk.data().expect("every chunk populated");
        assert_eq!(got.as_ref(), &data[chunk.offset() as usize..chunk.end() as usize]);
    }
}

proptest! {
    #[test]
    fn windows_partition_the_list(ranges in ranges(), distance in 0u64..4096) {
        prop_assume!(!ranges.is_empty());
        let list = ChunkList::from_ranges(ranges).unwrap();

        let mut next = Some(list.head().unwrap());
        let mut covered = 0;
        while let Some(start) = next {
            let reader = ChunkReader::create(&list, start, distance).unwrap();
            prop_assert_eq!(reader.from(), start);
            prop_assert!(reader.read_bytes() > 0);
            for id in reader.chunk_ids() {
                let chunk = list.chunk(id).unwrap();
                prop_assert!(chunk.offset() >= reader.offset());
                prop_assert!(chunk.end() <= reader.end());
            }
            if let Some(after) = list.next(reader.to()) {
                let gap_start = reader.end();
                let gap = list.chunk(after).unwrap().offset().saturating_sub(gap_start);
                prop_assert!(gap > distance);
            }
            covered += reader.len();
            next = list.next(reader.to());
        }
        prop_assert_eq!(covered, list.len());
    }

    #[test]
    fn plain_reads_round_trip(
        ranges in ranges(),
        distance in 0u64..4096,
        threshold in 0.0f64..=1.0,
        reuse in any::<bool>(),
    ) {
        let data = source_bytes();
        let mut source = MemorySource::new(data.clone());
        let mut list = ChunkList::from_ranges(ranges).unwrap();
        let config = ReadConfig::new(distance, threshold, reuse).unwrap();

        let stats = read_ranges(&mut list, &mut source, &mut BufferPool::new(), &config).unwrap();
        prop_assert_eq!(stats.reads, source.copy_reads());
        prop_assert!(stats.resident_bytes <= stats.read_bytes);
        assert_populated_correctly(&list, &data);
    }

    #[test]
    fn reduce_size_holds_only_requested_bytes(ranges in ranges(), distance in 0u64..4096) {
        prop_assume!(!ranges.is_empty());
        let data = source_bytes();
        let mut list = ChunkList::from_ranges(ranges).unwrap();
        let reader = ChunkReader::create(&list, list.head().unwrap(), distance).unwrap();
        let raw = data.slice(reader.offset() as usize..reader.end() as usize);

        let population = reader.populate_chunks_reduce_size(&mut list, &raw, None).unwrap();
        prop_assert_eq!(population.resident_bytes, reader.req_bytes());
        let populated: u64 = reader
            .chunk_ids()
            .map(|id| list.chunk(id).unwrap().data().unwrap().len() as u64)
            .sum();
        prop_assert_eq!(populated, reader.req_bytes());
    }

    #[test]
    fn zero_copy_reads_round_trip_and_release(
        ranges in ranges(),
        distance in 0u64..4096,
        mapped_from in 0u64..SOURCE_LEN,
        block_size in 64u64..8192,
    ) {
        let data = source_bytes();
        let source = MemorySource::new(data.clone()).with_zero_copy(mapped_from, block_size);
        let mut reader = ZeroCopyReader::new(source, BufferPool::new());
        let mut list = ChunkList::from_ranges(ranges).unwrap();

        reader
            .read_ranges(&mut list, &ReadConfig::default().with_max_merge_distance(distance))
            .unwrap();
        assert_populated_correctly(&list, &data);

        reader.release_all_buffers().unwrap();
        prop_assert_eq!(reader.outstanding(), 0);
        prop_assert!(reader.source().is_all_released());
    }
}
