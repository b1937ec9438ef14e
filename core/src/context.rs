//! context.rs
//!
//! Caller-owned session: configuration, resolved shuffle kernels and the
//! persistent worker pool.
//!
//! Design notes:
//! - Setters take `&mut self`; operations take `&self` and serialize on the
//!   pool lock, so a shared `Context` never has two calls dispatching into
//!   the same pool at once.
//! - The pool is created on the first call that splits work across more
//!   than one task and lives until `release_resources` or drop.
//! - Decode paths parse the whole chunk before sizing any output buffer.

use std::mem::size_of;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytemuck::Pod;

use crate::compression::Codec;
use crate::config::ContextConfig;
use crate::constants::{MAX_LEVEL, MAX_TYPESIZE};
use crate::chunk::ChunkView;
use crate::pipeline::{
    compress_chunk, decompress_chunk, decompress_items, max_compressed_len, CompressParams, WorkerPool,
};
use crate::shuffle::{Dispatcher, ShuffleImpl, ShuffleMode};
use crate::telemetry::{Operation, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::ChunkError;
use crate::utils::try_filled_vec;

#[derive(Debug)]
pub struct Context {
    config: ContextConfig,
    dispatcher: Dispatcher,
    pool: Mutex<WorkerPool>,
    last: Mutex<Option<TelemetrySnapshot>>,
}

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_level(level: u8) -> Result<(), ChunkError> {
    if level > MAX_LEVEL {
        return Err(ChunkError::invalid(format!("level {} outside 0..={}", level, MAX_LEVEL)));
    }
    Ok(())
}

fn check_elem_size(elem_size: usize) -> Result<(), ChunkError> {
    if elem_size == 0 || elem_size > MAX_TYPESIZE {
        return Err(ChunkError::invalid(format!(
            "elem_size {} outside 1..={}", elem_size, MAX_TYPESIZE
        )));
    }
    Ok(())
}

impl Context {
    pub fn new(config: ContextConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Context configured from the `SHUFFLEPACK_*` environment variables.
    pub fn from_env() -> Result<Self, ChunkError> {
        Self::new(ContextConfig::from_env()?)
    }

    fn with_config(config: ContextConfig) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::detect(),
            pool: Mutex::new(WorkerPool::new(config.threads)),
            last: Mutex::new(None),
        }
    }

    // ---------------------------------------------------------------------
    // Setters
    // ---------------------------------------------------------------------

    /// Resize the worker pool. An unchanged count is a no-op.
    pub fn set_thread_count(&mut self, threads: usize) -> Result<(), ChunkError> {
        self.pool
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .set_threads(threads)?;
        self.config.threads = threads;
        Ok(())
    }

    pub fn set_backend(&mut self, codec: Codec) {
        self.config.codec = codec;
    }

    pub fn set_backend_by_name(&mut self, name: &str) -> Result<(), ChunkError> {
        let codec = Codec::from_name(name).ok_or_else(|| {
            ChunkError::invalid(format!("unknown backend {:?} (available: {})", name, crate::compression::list_codecs()))
        })?;
        self.set_backend(codec);
        Ok(())
    }

    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        self.config.shuffle = mode;
    }

    /// Level used by `compress_default`.
    pub fn set_level(&mut self, level: u8) -> Result<(), ChunkError> {
        check_level(level)?;
        self.config.level = level;
        Ok(())
    }

    pub fn set_block_size(&mut self, block_size: Option<usize>) -> Result<(), ChunkError> {
        if block_size == Some(0) {
            return Err(ChunkError::invalid("forced block size must be non-zero"));
        }
        self.config.block_size = block_size;
        Ok(())
    }

    /// Pin the shuffle kernels to one instruction-set variant.
    pub fn set_shuffle_impl(&mut self, imp: ShuffleImpl) -> Result<(), ChunkError> {
        self.dispatcher = Dispatcher::for_impl(imp)
            .ok_or_else(|| ChunkError::invalid(format!("{} shuffle is not supported on this CPU", imp)))?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Getters
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn thread_count(&self) -> usize {
        self.config.threads
    }

    pub fn backend(&self) -> Codec {
        self.config.codec
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.config.shuffle
    }

    pub fn level(&self) -> u8 {
        self.config.level
    }

    pub fn block_size(&self) -> Option<usize> {
        self.config.block_size
    }

    pub fn shuffle_impl(&self) -> ShuffleImpl {
        self.dispatcher.implementation()
    }

    /// Worker threads currently alive in this context's pool.
    pub fn live_workers(&self) -> usize {
        relock(&self.pool).live_workers()
    }

    /// How many times the pool has been (re)built.
    pub fn pool_builds(&self) -> u64 {
        relock(&self.pool).builds()
    }

    /// Telemetry of the most recent successful call.
    pub fn last_telemetry(&self) -> Option<TelemetrySnapshot> {
        relock(&self.last).clone()
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Compress `src` into `dst`, returning the chunk length.
    ///
    /// `dst` must hold at least `max_compressed_len(src.len())` bytes.
    pub fn compress(&self, level: u8, elem_size: usize, src: &[u8], dst: &mut [u8]) -> Result<usize, ChunkError> {
        check_level(level)?;
        check_elem_size(elem_size)?;

        let params = CompressParams {
            level,
            elem_size,
            mode: self.config.shuffle,
            codec: self.config.codec,
            block_size: self.config.block_size,
        };

        let mut timer = TelemetryTimer::new();
        let (written, counters) = {
            let mut pool = relock(&self.pool);
            compress_chunk(&mut pool, &self.dispatcher, &params, src, dst, &mut timer)?
        };
        self.record(Operation::Compress, &counters, timer);
        Ok(written)
    }

    pub fn compress_to_vec(&self, level: u8, elem_size: usize, src: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut out = vec![0u8; max_compressed_len(src.len())];
        let written = self.compress(level, elem_size, src, &mut out)?;
        out.truncate(written);
        Ok(out)
    }

    /// Compress at the configured level.
    pub fn compress_default(&self, elem_size: usize, src: &[u8]) -> Result<Vec<u8>, ChunkError> {
        self.compress_to_vec(self.config.level, elem_size, src)
    }

    /// Compress a typed slice; the element size is `size_of::<T>()`.
    pub fn compress_typed<T: Pod>(&self, level: u8, data: &[T]) -> Result<Vec<u8>, ChunkError> {
        self.compress_to_vec(level, size_of::<T>(), bytemuck::cast_slice(data))
    }

    /// Decompress `src` into `dst`, returning the number of bytes written.
    pub fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, ChunkError> {
        let mut timer = TelemetryTimer::new();
        let view = timer.time(Stage::Validate, || ChunkView::parse(src))?;
        self.decompress_view(&view, dst, timer)
    }

    pub fn decompress_to_vec(&self, src: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut timer = TelemetryTimer::new();
        let view = timer.time(Stage::Validate, || ChunkView::parse(src))?;
        let mut out = try_filled_vec(view.uncompressed_len(), 0u8)?;
        let written = self.decompress_view(&view, &mut out, timer)?;
        out.truncate(written);
        Ok(out)
    }

    /// Decompress into a typed vector. The chunk's element size must equal `size_of::<T>()`.
    pub fn decompress_typed<T: Pod>(&self, src: &[u8]) -> Result<Vec<T>, ChunkError> {
        let mut timer = TelemetryTimer::new();
        let view = timer.time(Stage::Validate, || ChunkView::parse(src))?;

        let size = size_of::<T>();
        let elem_size = view.header().elem_size as usize;
        if elem_size != size {
            return Err(ChunkError::invalid(format!(
                "chunk element size {} does not match target type size {}", elem_size, size
            )));
        }
        let nbytes = view.uncompressed_len();
        if size == 0 || nbytes % size != 0 {
            return Err(ChunkError::invalid(format!(
                "{} bytes is not a whole number of {}-byte elements", nbytes, size
            )));
        }

        let mut out = try_filled_vec(nbytes / size, T::zeroed())?;
        self.decompress_view(&view, bytemuck::cast_slice_mut(&mut out[..]), timer)?;
        Ok(out)
    }

    /// Copy elements `start..start + nitems` of the chunk into `dst`,
    /// decoding only the blocks that hold them. Returns bytes written.
    pub fn get_items(&self, src: &[u8], start: usize, nitems: usize, dst: &mut [u8]) -> Result<usize, ChunkError> {
        let mut timer = TelemetryTimer::new();
        let view = timer.time(Stage::Validate, || ChunkView::parse(src))?;
        let (written, counters) = {
            let mut pool = relock(&self.pool);
            decompress_items(&mut pool, &self.dispatcher, &view, start, nitems, dst, &mut timer)?
        };
        self.record(Operation::Decompress, &counters, timer);
        Ok(written)
    }

    fn decompress_view(&self, view: &ChunkView<'_>, dst: &mut [u8], mut timer: TelemetryTimer) -> Result<usize, ChunkError> {
        let (written, counters) = {
            let mut pool = relock(&self.pool);
            decompress_chunk(&mut pool, &self.dispatcher, view, dst, &mut timer)?
        };
        self.record(Operation::Decompress, &counters, timer);
        Ok(written)
    }

    /// Join and drop pooled workers. The next multi-threaded call rebuilds the pool.
    pub fn release_resources(&self) {
        relock(&self.pool).release();
    }

    fn record(&self, operation: Operation, counters: &TelemetryCounters, mut timer: TelemetryTimer) {
        timer.finish();
        let snapshot = TelemetrySnapshot::from(operation, self.config.threads, counters, &timer);
        log::debug!(
            "{:?}: {} -> {} bytes in {:?} [{}]",
            operation,
            snapshot.counters.bytes_uncompressed,
            snapshot.output_bytes(),
            snapshot.elapsed,
            snapshot.stage_times.summary()
        );
        *relock(&self.last) = Some(snapshot);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::with_config(ContextConfig::default())
    }
}
