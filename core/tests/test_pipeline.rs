// Pipeline suite: run partitioning, worker pool lifecycle, round trips
// across backends, modes, levels and thread counts, and the overhead bound.

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use shufflepack_core::{
        chunk::ChunkView,
        compression::Codec,
        config::ContextConfig,
        constants::{HEADER_LEN, MAX_OVERHEAD, MIN_BUFFERSIZE},
        context::Context,
        pipeline::{max_compressed_len, partition_runs, WorkerPool},
        shuffle::ShuffleMode,
        types::ChunkError,
    };

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Slowly varying integers: the kind of data shuffling is meant for.
    fn structured(nbytes: usize, elem_size: usize) -> Vec<u8> {
        (0..nbytes)
            .map(|i| {
                let e = (i / elem_size) as u64;
                let j = i % elem_size;
                ((e / 5 + e % 3) >> (8 * (j % 8))) as u8
            })
            .collect()
    }

    fn random(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut v = vec![0u8; len];
        rng.fill(&mut v[..]);
        v
    }

    fn ctx(threads: usize, codec: Codec, shuffle: ShuffleMode) -> Context {
        Context::new(ContextConfig { threads, codec, shuffle, ..ContextConfig::default() }).unwrap()
    }

    // ## 1️⃣ Run partitioning

    #[test]
    fn partition_runs_examples() {
        assert!(partition_runs(0, 4).is_empty());
        assert_eq!(partition_runs(7, 1), vec![0..7]);
        assert_eq!(partition_runs(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(partition_runs(2, 8), vec![0..1, 1..2]);
    }

    #[test]
    fn partition_runs_cover_evenly() {
        for n in 0..50 {
            for workers in 1..10 {
                let runs = partition_runs(n, workers);
                assert!(runs.len() <= workers);
                let mut next = 0;
                for r in &runs {
                    assert_eq!(r.start, next);
                    assert!(!r.is_empty());
                    next = r.end;
                }
                assert_eq!(next, n);
                if let (Some(min), Some(max)) = (runs.iter().map(|r| r.len()).min(), runs.iter().map(|r| r.len()).max()) {
                    assert!(max - min <= 1);
                }
            }
        }
    }

    // ## 2️⃣ Worker pool lifecycle

    #[test]
    fn single_thread_pool_never_spawns() {
        let mut pool = WorkerPool::new(1);
        assert!(pool.acquire().unwrap().is_none());
        assert!(!pool.is_active());
        assert_eq!(pool.live_workers(), 0);
        assert_eq!(pool.builds(), 0);
    }

    #[test]
    fn pool_is_lazy_resizable_and_releasable() {
        init_logs();
        let mut pool = WorkerPool::new(4);
        assert!(!pool.is_active());
        assert_eq!(pool.live_workers(), 0);

        assert!(pool.acquire().unwrap().is_some());
        assert_eq!(pool.live_workers(), 4);
        assert!(pool.acquire().unwrap().is_some());
        assert_eq!(pool.builds(), 1);

        pool.set_threads(4).unwrap();
        assert_eq!(pool.builds(), 1);

        pool.set_threads(2).unwrap();
        assert_eq!(pool.builds(), 2);
        assert_eq!(pool.live_workers(), 2);

        pool.release();
        assert!(!pool.is_active());
        assert_eq!(pool.live_workers(), 0);

        pool.acquire().unwrap();
        assert_eq!(pool.builds(), 3);
        assert_eq!(pool.live_workers(), 2);

        pool.set_threads(1).unwrap();
        assert!(pool.acquire().unwrap().is_none());
        assert_eq!(pool.live_workers(), 0);

        assert!(matches!(pool.set_threads(0), Err(ChunkError::InvalidArgument(_))));
    }

    #[test]
    fn resize_before_first_use_stays_lazy() {
        let mut pool = WorkerPool::new(2);
        pool.set_threads(6).unwrap();
        assert!(!pool.is_active());
        assert_eq!(pool.builds(), 0);
        pool.acquire().unwrap();
        assert_eq!(pool.live_workers(), 6);
    }

    // ## 3️⃣ Round trips

    #[test]
    fn round_trip_matrix() {
        init_logs();
        let sizes = [0usize, 1, 100, MIN_BUFFERSIZE, 4099, 300_001];
        for codec in Codec::ALL {
            for mode in [ShuffleMode::None, ShuffleMode::Byte, ShuffleMode::Bit] {
                for threads in [1, 4] {
                    let c = ctx(threads, codec, mode);
                    for &elem_size in &[1usize, 2, 3, 4, 8] {
                        for &n in &sizes {
                            let src = structured(n, elem_size);
                            for level in [0u8, 1, 5, 9] {
                                let chunk = c.compress_to_vec(level, elem_size, &src).unwrap();
                                assert!(chunk.len() <= n + MAX_OVERHEAD);
                                let back = c.decompress_to_vec(&chunk).unwrap();
                                assert!(
                                    back == src,
                                    "{} {} threads={} elem={} n={} level={}",
                                    codec, mode, threads, elem_size, n, level
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn output_is_identical_for_every_thread_count() {
        let src = structured(2_000_000, 8);
        for codec in Codec::ALL {
            let reference = ctx(1, codec, ShuffleMode::Byte).compress_to_vec(5, 8, &src).unwrap();
            for threads in [2, 3, 8] {
                let chunk = ctx(threads, codec, ShuffleMode::Byte).compress_to_vec(5, 8, &src).unwrap();
                assert!(chunk == reference, "{} with {} threads differs", codec, threads);
            }
        }
    }

    #[test]
    fn sixteen_megabytes_across_thread_counts() {
        init_logs();
        let src = structured(16 << 20, 4);
        for threads in [1, 2, 4, 8] {
            let c = ctx(threads, Codec::Lz4, ShuffleMode::Byte);
            let chunk = c.compress_to_vec(5, 4, &src).unwrap();
            assert!(chunk.len() < src.len() / 2, "ratio too low: {}", chunk.len());

            let mut out = vec![0u8; src.len()];
            assert_eq!(c.decompress(&chunk, &mut out).unwrap(), src.len());
            assert!(out == src, "threads {}", threads);
        }
    }

    #[test]
    fn random_input_respects_overhead_bound() {
        let src = random(1 << 20, 17);
        for codec in Codec::ALL {
            let c = ctx(4, codec, ShuffleMode::Byte);
            for level in 0..=9u8 {
                let chunk = c.compress_to_vec(level, 4, &src).unwrap();
                assert!(chunk.len() <= src.len() + MAX_OVERHEAD, "{} level {}", codec, level);
                if level == 0 {
                    assert!(ChunkView::parse(&chunk).unwrap().is_memcpyed());
                }
                assert_eq!(c.decompress_to_vec(&chunk).unwrap(), src);
            }
        }
    }

    #[test]
    fn level_zero_and_tiny_inputs_are_memcpyed() {
        let c = ctx(2, Codec::Zstd, ShuffleMode::Bit);

        let src = structured(100_000, 4);
        let chunk = c.compress_to_vec(0, 4, &src).unwrap();
        let view = ChunkView::parse(&chunk).unwrap();
        assert!(view.is_memcpyed());
        assert_eq!(view.literal_payload(), &src[..]);

        let tiny = structured(MIN_BUFFERSIZE - 1, 4);
        let chunk = c.compress_to_vec(9, 4, &tiny).unwrap();
        assert!(ChunkView::parse(&chunk).unwrap().is_memcpyed());
        assert_eq!(chunk.len(), tiny.len() + HEADER_LEN);
    }

    #[test]
    fn empty_input_round_trips() {
        let c = Context::default();
        let chunk = c.compress_to_vec(5, 4, &[]).unwrap();
        assert_eq!(chunk.len(), HEADER_LEN);
        let mut out: [u8; 0] = [];
        assert_eq!(c.decompress(&chunk, &mut out).unwrap(), 0);
    }

    // ## 4️⃣ Capacity and arguments

    #[test]
    fn destination_capacity_rules() {
        let c = Context::default();
        let src = structured(10_000, 4);

        let mut empty: [u8; 0] = [];
        assert!(matches!(c.compress(5, 4, &src, &mut empty), Err(ChunkError::InvalidArgument(_))));

        let mut small = vec![0u8; max_compressed_len(src.len()) - 1];
        assert_eq!(
            c.compress(5, 4, &src, &mut small).unwrap_err(),
            ChunkError::DestinationTooSmall { have: small.len(), need: src.len() + MAX_OVERHEAD }
        );

        let chunk = c.compress_to_vec(5, 4, &src).unwrap();
        let mut short = vec![0u8; src.len() - 1];
        assert_eq!(
            c.decompress(&chunk, &mut short).unwrap_err(),
            ChunkError::DestinationTooSmall { have: src.len() - 1, need: src.len() }
        );

        let mut roomy = vec![0xAAu8; src.len() + 10];
        assert_eq!(c.decompress(&chunk, &mut roomy).unwrap(), src.len());
        assert_eq!(&roomy[..src.len()], &src[..]);
        assert!(roomy[src.len()..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn invalid_arguments() {
        let c = Context::default();
        let src = structured(1000, 4);
        assert!(matches!(c.compress_to_vec(10, 4, &src), Err(ChunkError::InvalidArgument(_))));
        assert!(matches!(c.compress_to_vec(5, 0, &src), Err(ChunkError::InvalidArgument(_))));
        assert!(matches!(c.compress_to_vec(5, 256, &src), Err(ChunkError::InvalidArgument(_))));
        assert!(c.compress_to_vec(5, 255, &src).is_ok());
    }
}
