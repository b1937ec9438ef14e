//! pipeline/compress.rs
//!
//! Compress pass: split, shuffle + compress blocks in parallel, assemble.
//!
//! Design notes:
//! - Each worker owns one contiguous run of blocks and one scratch buffer.
//! - Results travel as `(index, outcome)` over a channel and are sorted
//!   before serialization, so the wire order never depends on scheduling.
//! - A block the backend cannot shrink is stored as its filtered bytes.
//! - When the blocked form would not fit `HEADER_LEN + nbytes`, the whole
//!   chunk is stored literally (MEMCPYED) instead.

use std::ops::Range;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Sender};

use crate::chunk::{blocked_len, build_header, write_blocked_chunk, write_memcpyed_chunk, BlockLayout, EncodedBlock};
use crate::compression::{create_codec, BlockCodec, Codec, CompressionError};
use crate::constants::{BLOCK_ENTRY_LEN, HEADER_LEN, MAX_OVERHEAD, MIN_BUFFERSIZE};
use crate::pipeline::pool::{partition_runs, run_tasks, WorkerPool};
use crate::shuffle::{Dispatcher, ShuffleMode};
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetryTimer};
use crate::types::ChunkError;

/// Upper bound on the encoded size of `nbytes` of input.
#[inline]
pub fn max_compressed_len(nbytes: usize) -> usize {
    nbytes.saturating_add(MAX_OVERHEAD)
}

/// Per-call compression settings.
#[derive(Debug, Clone, Copy)]
pub struct CompressParams {
    pub level: u8,
    pub elem_size: usize,
    pub mode: ShuffleMode,
    pub codec: Codec,
    pub block_size: Option<usize>,
}

struct BlockJob<'a> {
    layout: &'a BlockLayout,
    mode: ShuffleMode,
    level: u8,
    codec: &'a dyn BlockCodec,
    dispatcher: &'a Dispatcher,
}

struct BlockOutcome {
    index: usize,
    result: Result<EncodedBlock, CompressionError>,
    shuffle_time: Duration,
    compress_time: Duration,
}

/// Compress `src` into `dst` as one chunk and return the bytes written.
///
/// The pool is only acquired when the layout yields more than one run of blocks.
pub fn compress_chunk(
    pool: &mut WorkerPool,
    dispatcher: &Dispatcher,
    params: &CompressParams,
    src: &[u8],
    dst: &mut [u8],
    timer: &mut TelemetryTimer,
) -> Result<(usize, TelemetryCounters), ChunkError> {
    if dst.is_empty() {
        return Err(ChunkError::invalid("destination buffer has zero capacity"));
    }
    let need = max_compressed_len(src.len());
    if dst.len() < need {
        return Err(ChunkError::DestinationTooSmall { have: dst.len(), need });
    }

    let layout = timer.time(Stage::Split, || {
        BlockLayout::compute(src.len(), params.elem_size, params.level, params.block_size)
    })?;
    let mode = params.mode.effective(params.elem_size);

    if params.level == 0 || src.len() < MIN_BUFFERSIZE {
        log::debug!("storing {} bytes literally (level {})", src.len(), params.level);
        return Ok(write_literal(&layout, params, src, dst, timer));
    }

    let codec = create_codec(params.codec);
    let job = BlockJob {
        layout: &layout,
        mode,
        level: params.level,
        codec: codec.as_ref(),
        dispatcher,
    };

    log::debug!(
        "compress {} bytes: {} blocks of {} with {} ({}, level {}, {} threads)",
        src.len(), layout.nblocks, layout.block_size, params.codec, mode, params.level, pool.threads()
    );

    let (blocks, stage_times) = compress_blocks(pool, &job, src)?;
    timer.stage_times.merge(&stage_times);

    let total = blocked_len(&blocks);
    if total > HEADER_LEN + src.len() {
        log::warn!(
            "blocked form ({} bytes) exceeds literal form ({} bytes); storing chunk literally",
            total, HEADER_LEN + src.len()
        );
        return Ok(write_literal(&layout, params, src, dst, timer));
    }

    let mut counters = TelemetryCounters::default();
    counters.add_chunk(HEADER_LEN + blocks.len() * BLOCK_ENTRY_LEN);
    for block in &blocks {
        counters.add_block(layout.block_len(block.index), block.payload.len());
    }

    let header = build_header(&layout, mode, params.codec, params.level, false, total);
    let written = timer.time(Stage::Serialize, || write_blocked_chunk(&header, &blocks, dst));
    Ok((written, counters))
}

fn write_literal(
    layout: &BlockLayout,
    params: &CompressParams,
    src: &[u8],
    dst: &mut [u8],
    timer: &mut TelemetryTimer,
) -> (usize, TelemetryCounters) {
    let header = build_header(layout, ShuffleMode::None, params.codec, params.level, true, HEADER_LEN + src.len());
    let written = timer.time(Stage::Serialize, || write_memcpyed_chunk(&header, src, dst));

    let mut counters = TelemetryCounters::default();
    counters.add_literal_chunk(HEADER_LEN, src.len());
    (written, counters)
}

/// Run the per-block work and return the blocks in index order.
fn compress_blocks(
    pool: &mut WorkerPool,
    job: &BlockJob<'_>,
    src: &[u8],
) -> Result<(Vec<EncodedBlock>, StageTimes), ChunkError> {
    let nblocks = job.layout.nblocks;
    let (tx, rx) = unbounded::<BlockOutcome>();

    let tasks: Vec<_> = partition_runs(nblocks, pool.threads())
        .into_iter()
        .map(|run| {
            let tx = tx.clone();
            move || compress_run(job, src, run, &tx)
        })
        .collect();
    drop(tx);
    run_tasks(pool, tasks)?;

    let mut blocks = Vec::with_capacity(nblocks);
    let mut failure: Option<(usize, CompressionError)> = None;
    let mut stage_times = StageTimes::default();

    for outcome in rx.iter() {
        stage_times.add(Stage::Shuffle, outcome.shuffle_time);
        stage_times.add(Stage::Compress, outcome.compress_time);
        match outcome.result {
            Ok(block) => blocks.push(block),
            Err(e) => {
                if failure.as_ref().map_or(true, |(index, _)| outcome.index < *index) {
                    failure = Some((outcome.index, e));
                }
            }
        }
    }

    if let Some((index, e)) = failure {
        log::debug!("block {} failed to compress: {}", index, e);
        return Err(ChunkError::Codec(e));
    }
    if blocks.len() != nblocks {
        return Err(ChunkError::ThreadPool(format!(
            "expected {} compressed blocks, collected {}", nblocks, blocks.len()
        )));
    }

    blocks.sort_unstable_by_key(|b| b.index);
    Ok((blocks, stage_times))
}

fn compress_run(job: &BlockJob<'_>, src: &[u8], run: Range<usize>, tx: &Sender<BlockOutcome>) {
    let mut scratch = match job.mode {
        ShuffleMode::None => Vec::new(),
        _ => vec![0u8; job.layout.block_size],
    };

    for index in run {
        let raw = &src[job.layout.block_range(index)];

        let started = Instant::now();
        let filtered: &[u8] = match job.mode {
            ShuffleMode::None => raw,
            mode => {
                let out = &mut scratch[..raw.len()];
                job.dispatcher.apply(mode, job.layout.elem_size, raw, out);
                out
            }
        };
        let shuffle_time = started.elapsed();

        let started = Instant::now();
        let result = job.codec.compress_block(job.level, filtered).map(|packed| match packed {
            Some(payload) => EncodedBlock { index, payload, literal: false },
            None => EncodedBlock { index, payload: filtered.to_vec(), literal: true },
        });
        let compress_time = started.elapsed();

        if let Ok(block) = &result {
            log::trace!(
                "block {}: {} -> {} bytes{}",
                index, raw.len(), block.payload.len(), if block.literal { " (literal)" } else { "" }
            );
        }

        if tx.send(BlockOutcome { index, result, shuffle_time, compress_time }).is_err() {
            return;
        }
    }
}
