#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shufflepack_core::{
        constants::{BLOCK_ENTRY_LEN, HEADER_LEN},
        context::Context,
        telemetry::{Operation, Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer},
    };

    fn words(n: usize) -> Vec<u32> {
        (0..n as u32).map(|i| i / 9).collect()
    }

    #[test]
    fn counters_track_blocks_and_literals() {
        let mut c = TelemetryCounters::default();
        c.add_chunk(HEADER_LEN + 2 * BLOCK_ENTRY_LEN);
        c.add_block(1000, 120);
        c.add_block(500, 500);

        assert_eq!(c.chunks, 1);
        assert_eq!(c.blocks_total, 2);
        assert_eq!(c.blocks_literal, 1);
        assert_eq!(c.bytes_uncompressed, 1500);
        assert_eq!(c.bytes_compressed, 620);
        assert_eq!(c.output_bytes(), 620 + 48);

        let mut total = TelemetryCounters::default();
        total.add_literal_chunk(HEADER_LEN, 64);
        total += c;
        assert_eq!(total.chunks, 2);
        assert_eq!(total.chunks_literal, 1);
        assert_eq!(total.bytes_uncompressed, 1564);
    }

    #[test]
    fn stage_times_accumulate_and_merge() {
        let mut a = StageTimes::default();
        a.add(Stage::Shuffle, Duration::from_millis(2));
        a.add(Stage::Shuffle, Duration::from_millis(3));
        let mut b = StageTimes::default();
        b.add(Stage::Compress, Duration::from_millis(10));
        a.merge(&b);

        assert_eq!(a.get(Stage::Shuffle), Duration::from_millis(5));
        assert_eq!(a.get(Stage::Unshuffle), Duration::ZERO);
        assert_eq!(a.total(), Duration::from_millis(15));
        assert!(a.has_all(&[Stage::Shuffle, Stage::Compress]));
        assert!(!a.has_all(&[Stage::Validate]));
        assert_eq!(a.summary(), "compress=10.000ms shuffle=5.000ms");
        assert_eq!(a.iter().count(), 2);
    }

    #[test]
    fn timer_charges_closures_to_stages() {
        let mut t = TelemetryTimer::new();
        let v = t.time(Stage::Split, || 41 + 1);
        assert_eq!(v, 42);
        t.add_stage_time(Stage::Serialize, Duration::from_micros(7));
        t.finish();
        assert!(t.stage_times.has_all(&[Stage::Split, Stage::Serialize]));
        assert!(t.elapsed() >= t.stage_times.get(Stage::Split));
    }

    #[test]
    fn snapshot_ratio_and_json() {
        let mut c = TelemetryCounters::default();
        c.add_chunk(HEADER_LEN + BLOCK_ENTRY_LEN);
        c.add_block(1000, 456);
        let mut t = TelemetryTimer::new();
        t.finish();

        let s = TelemetrySnapshot::from(Operation::Compress, 2, &c, &t);
        assert_eq!(s.output_bytes(), 500);
        assert!((s.compression_ratio - 0.5).abs() < 1e-9);
        let json = s.to_json().unwrap();
        assert!(json.contains("\"compression_ratio\""));
        assert!(json.contains("\"Compress\""));
    }

    #[test]
    fn context_records_compress_and_decompress() {
        let mut ctx = Context::default();
        ctx.set_block_size(Some(16 * 1024)).unwrap();
        let data = words(40_000);

        let chunk = ctx.compress_typed(5, &data).unwrap();
        let s = ctx.last_telemetry().unwrap();
        assert_eq!(s.operation, Operation::Compress);
        assert_eq!(s.threads, 1);
        assert_eq!(s.counters.bytes_uncompressed, 160_000);
        assert_eq!(s.output_bytes(), chunk.len() as u64);
        assert_eq!(s.counters.blocks_total, 10);
        assert!(s.compression_ratio < 1.0);
        assert!(s.stage_times.has_all(&[Stage::Split, Stage::Shuffle, Stage::Compress, Stage::Serialize]));

        ctx.decompress_typed::<u32>(&chunk).unwrap();
        let s = ctx.last_telemetry().unwrap();
        assert_eq!(s.operation, Operation::Decompress);
        assert_eq!(s.output_bytes(), chunk.len() as u64);
        assert!(s.stage_times.has_all(&[Stage::Validate, Stage::Decompress, Stage::Unshuffle]));
    }

    #[test]
    fn literal_chunk_is_counted_as_such() {
        let ctx = Context::default();
        let data = words(1000);
        let chunk = ctx.compress_typed(0, &data).unwrap();
        let s = ctx.last_telemetry().unwrap();
        assert_eq!(s.counters.chunks_literal, 1);
        assert_eq!(s.counters.blocks_total, 0);
        assert_eq!(s.output_bytes(), chunk.len() as u64);
    }
}
