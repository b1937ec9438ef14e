//! chunk/mod.rs
//! Chunk format: block layout policy, assembly and validated parsing.

pub mod layout;
pub mod encode;
pub mod view;

pub use layout::{target_block_size, BlockLayout};
pub use encode::{blocked_len, build_header, write_blocked_chunk, write_memcpyed_chunk, EncodedBlock};
pub use view::{ChunkInfo, ChunkView};
