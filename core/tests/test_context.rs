// Context suite: setters, pool lifecycle through the public surface, typed
// helpers, random access, configuration sources, and shared use.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use shufflepack_core::{
        compression::{resolve, Codec},
        config::ContextConfig,
        constants::env_vars,
        context::Context,
        shuffle::{ShuffleImpl, ShuffleMode},
        types::ChunkError,
    };

    fn floats(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.001).sin() * 1000.0).collect()
    }

    fn words(n: usize) -> Vec<u32> {
        (0..n as u32).map(|i| i.wrapping_mul(7) / 13).collect()
    }

    // ## 1️⃣ Setters and getters

    #[test]
    fn defaults() {
        let c = Context::default();
        assert_eq!(c.thread_count(), 1);
        assert_eq!(c.backend(), Codec::Lz4);
        assert_eq!(c.shuffle_mode(), ShuffleMode::Byte);
        assert_eq!(c.level(), 5);
        assert_eq!(c.block_size(), None);
        assert!(c.shuffle_impl().is_supported());
        assert_eq!(c.live_workers(), 0);
        assert!(c.last_telemetry().is_none());
    }

    #[test]
    fn setters_update_configuration() {
        let mut c = Context::default();
        c.set_backend(Codec::Zstd);
        assert_eq!(c.backend(), Codec::Zstd);
        c.set_backend_by_name("zlib").unwrap();
        assert_eq!(c.backend(), Codec::Zlib);
        assert!(matches!(c.set_backend_by_name("brotli"), Err(ChunkError::InvalidArgument(_))));

        c.set_shuffle_mode(ShuffleMode::Bit);
        assert_eq!(c.shuffle_mode(), ShuffleMode::Bit);

        c.set_level(9).unwrap();
        assert_eq!(c.level(), 9);
        assert!(c.set_level(10).is_err());
        assert_eq!(c.level(), 9);

        c.set_block_size(Some(4096)).unwrap();
        assert_eq!(c.block_size(), Some(4096));
        assert!(c.set_block_size(Some(0)).is_err());

        c.set_shuffle_impl(ShuffleImpl::Generic).unwrap();
        assert_eq!(c.shuffle_impl(), ShuffleImpl::Generic);

        assert!(c.set_thread_count(0).is_err());
        assert_eq!(c.thread_count(), 1);
    }

    #[test]
    fn backend_and_mode_are_recorded_in_chunks() {
        let mut c = Context::default();
        let data = words(50_000);
        for codec in Codec::ALL {
            for mode in [ShuffleMode::None, ShuffleMode::Byte, ShuffleMode::Bit] {
                c.set_backend(codec);
                c.set_shuffle_mode(mode);
                let chunk = c.compress_typed(5, &data).unwrap();
                let info = shufflepack_core::api::chunk_info(&chunk).unwrap();
                assert_eq!(info.codec, codec);
                assert_eq!(info.shuffle, mode);
                assert_eq!(c.decompress_typed::<u32>(&chunk).unwrap(), data);
            }
        }
    }

    #[test]
    fn every_shuffle_impl_produces_the_same_chunk() {
        let data = words(200_000);
        let mut c = Context::default();
        c.set_shuffle_impl(ShuffleImpl::Generic).unwrap();
        let reference = c.compress_typed(5, &data).unwrap();
        for imp in ShuffleImpl::available() {
            c.set_shuffle_impl(imp).unwrap();
            assert_eq!(c.compress_typed(5, &data).unwrap(), reference, "{}", imp);
        }
    }

    // ## 2️⃣ Pool lifecycle

    #[test]
    fn thread_count_changes_resize_without_respawning_per_call() {
        let mut c = Context::new(ContextConfig { threads: 4, ..ContextConfig::default() }).unwrap();
        let data = words(1 << 20);

        assert_eq!(c.live_workers(), 0, "pool must be lazy");
        let chunk = c.compress_typed(5, &data).unwrap();
        assert_eq!(c.live_workers(), 4);
        assert_eq!(c.pool_builds(), 1);

        for _ in 0..5 {
            c.decompress_typed::<u32>(&chunk).unwrap();
        }
        assert_eq!(c.pool_builds(), 1);

        // Same value: no-op.
        c.set_thread_count(4).unwrap();
        assert_eq!(c.pool_builds(), 1);

        for cycle in 0..3 {
            c.set_thread_count(2).unwrap();
            assert_eq!(c.live_workers(), 2, "cycle {}", cycle);
            c.set_thread_count(3).unwrap();
            assert_eq!(c.live_workers(), 3, "cycle {}", cycle);
        }
        assert_eq!(c.thread_count(), 3);
        assert_eq!(c.decompress_typed::<u32>(&chunk).unwrap(), data);

        c.release_resources();
        assert_eq!(c.live_workers(), 0);
        c.release_resources();
        assert_eq!(c.live_workers(), 0);

        // Lazily recreated on the next call.
        assert_eq!(c.decompress_typed::<u32>(&chunk).unwrap(), data);
        assert_eq!(c.live_workers(), 3);

        c.set_thread_count(1).unwrap();
        assert_eq!(c.live_workers(), 0);
        assert_eq!(c.decompress_typed::<u32>(&chunk).unwrap(), data);
        assert_eq!(c.live_workers(), 0);
    }

    #[test]
    fn serial_work_never_builds_the_pool() {
        let c = Context::new(ContextConfig { threads: 4, ..ContextConfig::default() }).unwrap();
        let big = words(1 << 20);

        // Level 0 and tiny inputs are stored literally.
        let stored = c.compress_typed(0, &big).unwrap();
        c.compress_to_vec(5, 4, &[7u8; 64]).unwrap();
        // One block: 40 KB at level 5 fits a single 128 KiB block.
        let single = c.compress_typed(5, &big[..10_000]).unwrap();
        assert_eq!(shufflepack_core::api::chunk_info(&single).unwrap().nblocks, 1);

        assert_eq!(c.decompress_typed::<u32>(&stored).unwrap(), big);
        assert_eq!(c.decompress_typed::<u32>(&single).unwrap(), &big[..10_000]);
        let mut out = vec![0u8; 16];
        c.get_items(&stored, 100, 4, &mut out).unwrap();

        assert_eq!(c.pool_builds(), 0);
        assert_eq!(c.live_workers(), 0);

        c.compress_typed(5, &big).unwrap();
        assert_eq!(c.pool_builds(), 1);
        assert_eq!(c.live_workers(), 4);
    }

    #[test]
    fn shared_context_serializes_concurrent_calls() {
        let c = Arc::new(Context::new(ContextConfig { threads: 3, ..ContextConfig::default() }).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    let data: Vec<u32> = (0..100_000u32).map(|i| i / (t + 1)).collect();
                    for _ in 0..5 {
                        let chunk = c.compress_typed(5, &data).unwrap();
                        assert_eq!(c.decompress_typed::<u32>(&chunk).unwrap(), data);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.pool_builds(), 1);
        c.release_resources();
        assert_eq!(c.live_workers(), 0);
    }

    // ## 3️⃣ Typed helpers and random access

    #[test]
    fn typed_round_trip_and_size_mismatch() {
        let c = Context::default();
        let data = floats(10_000);
        let chunk = c.compress_typed(7, &data).unwrap();
        assert_eq!(c.decompress_typed::<f64>(&chunk).unwrap(), data);
        assert!(matches!(c.decompress_typed::<u32>(&chunk), Err(ChunkError::InvalidArgument(_))));
    }

    #[test]
    fn compress_default_uses_configured_level() {
        let mut c = Context::default();
        c.set_level(0).unwrap();
        let data = words(10_000);
        let chunk = c.compress_default(4, bytemuck::cast_slice(&data)).unwrap();
        assert!(shufflepack_core::api::chunk_info(&chunk).unwrap().memcpyed);
    }

    #[test]
    fn get_items_decodes_only_what_is_asked() {
        let mut c = Context::new(ContextConfig { threads: 2, ..ContextConfig::default() }).unwrap();
        c.set_block_size(Some(4096)).unwrap();
        let data = words(100_000);
        let bytes: &[u8] = bytemuck::cast_slice(&data);

        for level in [0u8, 5] {
            let chunk = c.compress_typed(level, &data).unwrap();
            for &(start, n) in &[(0usize, 1usize), (1023, 2), (1024, 1024), (5000, 30_000), (99_999, 1), (0, 100_000), (70, 0)] {
                let mut out = vec![0u8; n * 4];
                let written = c.get_items(&chunk, start, n, &mut out).unwrap();
                assert_eq!(written, n * 4);
                assert_eq!(&out[..], &bytes[start * 4..(start + n) * 4], "level {} start {} n {}", level, start, n);
            }

            let mut out = vec![0u8; 8];
            assert!(matches!(c.get_items(&chunk, 99_999, 2, &mut out), Err(ChunkError::InvalidArgument(_))));
            let mut tiny = vec![0u8; 3];
            assert!(matches!(c.get_items(&chunk, 0, 1, &mut tiny), Err(ChunkError::DestinationTooSmall { .. })));
        }
    }

    #[test]
    fn get_items_touches_fewer_blocks_than_full_decode() {
        let mut c = Context::default();
        c.set_block_size(Some(4096)).unwrap();
        let data = words(100_000);
        let chunk = c.compress_typed(5, &data).unwrap();

        let mut out = vec![0u8; 40];
        c.get_items(&chunk, 50_000, 10, &mut out).unwrap();
        let partial = c.last_telemetry().unwrap();
        assert_eq!(partial.counters.blocks_total, 1);

        c.decompress_typed::<u32>(&chunk).unwrap();
        let full = c.last_telemetry().unwrap();
        assert_eq!(full.counters.blocks_total, 98);
    }

    // ## 4️⃣ Configuration sources

    #[test]
    fn dynamic_config_has_at_least_one_thread() {
        let cfg = ContextConfig::dynamic();
        assert!(cfg.threads >= 1);
        cfg.validate().unwrap();
    }

    #[test]
    fn env_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            (env_vars::NTHREADS, "3"),
            (env_vars::COMPRESSOR, "zstd"),
            (env_vars::SHUFFLE, "bitshuffle"),
            (env_vars::CLEVEL, "7"),
            (env_vars::BLOCKSIZE, "65536"),
        ]
        .into_iter()
        .collect();
        let cfg = ContextConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(
            cfg,
            ContextConfig {
                threads: 3,
                codec: Codec::Zstd,
                shuffle: ShuffleMode::Bit,
                level: 7,
                block_size: Some(65536),
            }
        );

        let empty = ContextConfig::from_lookup(|_| None).unwrap();
        assert_eq!(empty, ContextConfig::default());
    }

    #[test]
    fn backend_without_level_takes_its_default_level() {
        for codec in Codec::ALL {
            let expected = resolve(codec).default_level;
            assert_eq!(ContextConfig::for_codec(codec).level, expected);

            let cfg = ContextConfig::from_lookup(|k| (k == env_vars::COMPRESSOR).then(|| codec.name().to_string())).unwrap();
            assert_eq!(cfg.codec, codec);
            assert_eq!(cfg.level, expected);
        }
        assert_eq!(ContextConfig::for_codec(Codec::Zlib).level, 6);
        assert_eq!(ContextConfig::for_codec(Codec::Zstd).level, 2);
        assert_eq!(ContextConfig::for_codec(Codec::default()), ContextConfig::default());

        let c = Context::new(ContextConfig::for_codec(Codec::Zstd)).unwrap();
        let chunk = c.compress_default(4, bytemuck::cast_slice(&words(10_000))).unwrap();
        let info = shufflepack_core::api::chunk_info(&chunk).unwrap();
        assert_eq!(info.codec, Codec::Zstd);
        assert_eq!(info.level, 2);
    }

    #[test]
    fn malformed_env_values_are_rejected() {
        for (key, value) in [
            (env_vars::NTHREADS, "many"),
            (env_vars::NTHREADS, "0"),
            (env_vars::COMPRESSOR, "snappy"),
            (env_vars::SHUFFLE, "sideways"),
            (env_vars::CLEVEL, "12"),
            (env_vars::BLOCKSIZE, "-1"),
        ] {
            let result = ContextConfig::from_lookup(|k| (k == key).then(|| value.to_string()));
            assert!(matches!(result, Err(ChunkError::InvalidArgument(_))), "{}={}", key, value);
        }
    }

    #[test]
    fn json_round_trip_and_partial_documents() {
        let cfg = ContextConfig {
            threads: 2,
            codec: Codec::Zlib,
            shuffle: ShuffleMode::None,
            level: 3,
            block_size: None,
        };
        let json = cfg.to_json().unwrap();
        assert!(json.contains("\"zlib\""));
        assert!(json.contains("\"noshuffle\""));
        assert_eq!(ContextConfig::from_json(&json).unwrap(), cfg);

        let partial = ContextConfig::from_json(r#"{ "codec": "zstd" }"#).unwrap();
        assert_eq!(partial, ContextConfig::for_codec(Codec::Zstd));
        let pinned = ContextConfig::from_json(r#"{ "codec": "zstd", "level": 5 }"#).unwrap();
        assert_eq!(pinned, ContextConfig { codec: Codec::Zstd, ..ContextConfig::default() });

        assert!(ContextConfig::from_json(r#"{ "level": 11 }"#).is_err());
        assert!(ContextConfig::from_json("not json").is_err());
    }

    #[test]
    fn context_rejects_invalid_config() {
        assert!(Context::new(ContextConfig { threads: 0, ..ContextConfig::default() }).is_err());
        assert!(Context::new(ContextConfig { level: 10, ..ContextConfig::default() }).is_err());
    }
}
