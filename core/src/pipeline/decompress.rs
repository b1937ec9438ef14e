//! pipeline/decompress.rs
//!
//! Decompress pass: decode the blocks of an already validated chunk in
//! parallel, straight into disjoint slices of the caller's buffer.
//!
//! Design notes:
//! - Entry points take a parsed `ChunkView`, so the header and block table
//!   are fully validated before any buffer is sized or any worker starts.
//! - The destination is cut with `chunks_mut`, so every task owns its blocks'
//!   output and no synchronization guards writes.
//! - Per-block failures are collected; the lowest failing index is reported.

use std::mem;
use std::ops::Range;
use std::time::Instant;

use crossbeam::channel::{unbounded, Sender};

use crate::chunk::ChunkView;
use crate::compression::{create_codec, BlockCodec, CompressionError};
use crate::constants::{BLOCK_ENTRY_LEN, HEADER_LEN};
use crate::pipeline::pool::{partition_runs, run_tasks, WorkerPool};
use crate::shuffle::{Dispatcher, ShuffleMode};
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetryTimer};
use crate::types::ChunkError;
use crate::utils::try_filled_vec;

struct DecodeJob<'a, 'b> {
    view: &'b ChunkView<'a>,
    mode: ShuffleMode,
    elem_size: usize,
    codec: &'b dyn BlockCodec,
    dispatcher: &'b Dispatcher,
}

enum DecodeOutcome {
    Failed { index: usize, error: CompressionError },
    Done { counters: TelemetryCounters, stage_times: StageTimes },
}

/// Decompress a whole chunk into `dst` and return the bytes written.
pub fn decompress_chunk(
    pool: &mut WorkerPool,
    dispatcher: &Dispatcher,
    view: &ChunkView<'_>,
    dst: &mut [u8],
    timer: &mut TelemetryTimer,
) -> Result<(usize, TelemetryCounters), ChunkError> {
    let need = view.uncompressed_len();
    if dst.len() < need {
        return Err(ChunkError::DestinationTooSmall { have: dst.len(), need });
    }
    let out = &mut dst[..need];

    let mut counters = TelemetryCounters::default();
    if view.is_memcpyed() {
        timer.time(Stage::Decompress, || out.copy_from_slice(view.literal_payload()));
        counters.add_literal_chunk(HEADER_LEN, need);
        return Ok((need, counters));
    }

    log::debug!(
        "decompress {} -> {} bytes: {} blocks, {}",
        view.header().compressed_len, need, view.nblocks(), view.header().summary()
    );

    counters.add_chunk(HEADER_LEN + view.nblocks() * BLOCK_ENTRY_LEN);
    let blocks = decode_blocks(pool, dispatcher, view, 0..view.nblocks(), out, timer)?;
    counters.merge(&blocks);
    Ok((need, counters))
}

/// Copy `nitems` elements starting at element `start` into `dst`, decoding
/// only the blocks that cover them. Returns the bytes written.
pub fn decompress_items(
    pool: &mut WorkerPool,
    dispatcher: &Dispatcher,
    view: &ChunkView<'_>,
    start: usize,
    nitems: usize,
    dst: &mut [u8],
    timer: &mut TelemetryTimer,
) -> Result<(usize, TelemetryCounters), ChunkError> {
    let elem_size = view.header().elem_size as usize;
    let total = view.uncompressed_len();

    let bytes = start.checked_mul(elem_size)
        .zip(start.checked_add(nitems).and_then(|end| end.checked_mul(elem_size)))
        .map(|(begin, end)| begin..end)
        .filter(|range| range.end <= total)
        .ok_or_else(|| ChunkError::invalid(format!(
            "items {}..+{} of size {} outside a {} byte chunk", start, nitems, elem_size, total
        )))?;

    let need = bytes.len();
    if dst.len() < need {
        return Err(ChunkError::DestinationTooSmall { have: dst.len(), need });
    }

    let mut counters = TelemetryCounters::default();
    if need == 0 {
        return Ok((0, counters));
    }
    if view.is_memcpyed() {
        dst[..need].copy_from_slice(&view.literal_payload()[bytes]);
        counters.add_literal_chunk(HEADER_LEN, need);
        return Ok((need, counters));
    }

    let layout = *view.layout();
    let covering = layout.blocks_covering(bytes.clone());
    let span_start = layout.block_range(covering.start).start;
    let span_end = layout.block_range(covering.end - 1).end;
    log::debug!("get_items: bytes {:?} via blocks {:?}", bytes, covering);

    let mut span = try_filled_vec(span_end - span_start, 0u8)?;
    counters = decode_blocks(pool, dispatcher, view, covering, &mut span, timer)?;
    dst[..need].copy_from_slice(&span[bytes.start - span_start..bytes.end - span_start]);
    Ok((need, counters))
}

/// Decode `blocks` into `out`, which starts at the first block's offset and
/// covers exactly those blocks.
fn decode_blocks(
    pool: &mut WorkerPool,
    dispatcher: &Dispatcher,
    view: &ChunkView<'_>,
    blocks: Range<usize>,
    out: &mut [u8],
    timer: &mut TelemetryTimer,
) -> Result<TelemetryCounters, ChunkError> {
    let header = view.header();
    let codec = create_codec(header.codec());
    let job = DecodeJob {
        view,
        mode: header.shuffle_mode(),
        elem_size: header.elem_size as usize,
        codec: codec.as_ref(),
        dispatcher,
    };

    let block_size = view.layout().block_size;
    let mut slots: Vec<(usize, &mut [u8])> = blocks.zip(out.chunks_mut(block_size)).collect();

    let (tx, rx) = unbounded::<DecodeOutcome>();
    let mut rest: &mut [(usize, &mut [u8])] = &mut slots;
    let mut tasks = Vec::new();
    for run in partition_runs(rest.len(), pool.threads()) {
        let (mine, tail) = mem::take(&mut rest).split_at_mut(run.len());
        rest = tail;
        let tx = tx.clone();
        let job = &job;
        tasks.push(move || decode_run(job, mine, &tx));
    }
    drop(tx);
    run_tasks(pool, tasks)?;

    let mut counters = TelemetryCounters::default();
    let mut failure: Option<(usize, CompressionError)> = None;
    for outcome in rx.iter() {
        match outcome {
            DecodeOutcome::Done { counters: c, stage_times } => {
                counters += c;
                timer.stage_times.merge(&stage_times);
            }
            DecodeOutcome::Failed { index, error } => {
                if failure.as_ref().map_or(true, |(first, _)| index < *first) {
                    failure = Some((index, error));
                }
            }
        }
    }

    match failure {
        Some((index, source)) => {
            log::debug!("block {} failed to decode: {}", index, source);
            Err(ChunkError::CorruptBlock { index, source })
        }
        None => Ok(counters),
    }
}

fn decode_run(job: &DecodeJob<'_, '_>, slots: &mut [(usize, &mut [u8])], tx: &Sender<DecodeOutcome>) {
    let mut scratch = match job.mode {
        ShuffleMode::None => Vec::new(),
        _ => vec![0u8; job.view.layout().block_size],
    };
    let mut counters = TelemetryCounters::default();
    let mut stage_times = StageTimes::default();

    for (index, out) in slots.iter_mut() {
        let index = *index;
        let payload = job.view.block_payload(index);

        let result = match job.mode {
            ShuffleMode::None => {
                let started = Instant::now();
                let r = decode_payload(job, index, payload, out);
                stage_times.add(Stage::Decompress, started.elapsed());
                r
            }
            mode => {
                let filtered = &mut scratch[..out.len()];
                let started = Instant::now();
                let r = decode_payload(job, index, payload, filtered);
                stage_times.add(Stage::Decompress, started.elapsed());

                let started = Instant::now();
                if r.is_ok() {
                    job.dispatcher.invert(mode, job.elem_size, filtered, out);
                }
                stage_times.add(Stage::Unshuffle, started.elapsed());
                r
            }
        };

        match result {
            Ok(()) => counters.add_block(out.len(), payload.len()),
            Err(error) => {
                if tx.send(DecodeOutcome::Failed { index, error }).is_err() {
                    return;
                }
            }
        }
    }

    let _ = tx.send(DecodeOutcome::Done { counters, stage_times });
}

/// Literal blocks are copied; everything else goes through the backend.
fn decode_payload(
    job: &DecodeJob<'_, '_>,
    index: usize,
    payload: &[u8],
    out: &mut [u8],
) -> Result<(), CompressionError> {
    if job.view.is_block_literal(index) {
        out.copy_from_slice(payload);
        return Ok(());
    }
    job.codec.decompress_block(payload, out)
}
