// One-shot free functions and header-only inspection.

#[cfg(test)]
mod tests {
    use shufflepack_core::{
        api::{chunk_info, chunk_sizes, compress, decompress, list_codecs, max_compressed_len},
        compression::Codec,
        constants::{FORMAT_VERSION, HEADER_LEN, MAX_OVERHEAD},
        shuffle::ShuffleMode,
        types::ChunkError,
    };

    fn series(n: usize) -> Vec<u8> {
        (0..n as u64).flat_map(|i| (1_000_000 + i * 3).to_le_bytes()).collect()
    }

    #[test]
    fn compress_decompress_round_trip() {
        let src = series(100_000);
        for threads in [1, 4] {
            for mode in [ShuffleMode::None, ShuffleMode::Byte, ShuffleMode::Bit] {
                let mut chunk = vec![0u8; max_compressed_len(src.len())];
                let n = compress(5, mode, 8, threads, &src, &mut chunk).unwrap();
                assert!(n < src.len());

                let mut out = vec![0u8; src.len()];
                assert_eq!(decompress(&chunk[..n], &mut out).unwrap(), src.len());
                assert_eq!(out, src);
            }
        }
    }

    #[test]
    fn sizes_and_info_from_header() {
        let src = series(50_000);
        let mut chunk = vec![0u8; max_compressed_len(src.len())];
        let n = compress(9, ShuffleMode::Byte, 8, 2, &src, &mut chunk).unwrap();
        let chunk = &chunk[..n];

        let (unc, comp, block) = chunk_sizes(chunk).unwrap();
        assert_eq!(unc, src.len());
        assert_eq!(comp, n);
        assert_eq!(block, 32 * 1024);

        let info = chunk_info(chunk).unwrap();
        assert_eq!(info.version, FORMAT_VERSION);
        assert!(!info.memcpyed);
        assert_eq!(info.shuffle, ShuffleMode::Byte);
        assert_eq!(info.codec, Codec::Lz4);
        assert_eq!(info.level, 9);
        assert_eq!(info.elem_size, 8);
        assert_eq!(info.nblocks, (src.len() + block - 1) / block);
    }

    #[test]
    fn header_inspection_of_garbage_fails() {
        assert!(matches!(chunk_sizes(&[0u8; 10]), Err(ChunkError::CorruptHeader(_))));
        assert!(matches!(chunk_info(&[0u8; 64]), Err(ChunkError::CorruptHeader(_))));
        let mut out = [0u8; 16];
        assert!(decompress(&[0u8; 64], &mut out).unwrap_err().is_corrupt());
    }

    #[test]
    fn free_compress_validates_arguments() {
        let src = series(100);
        let mut chunk = vec![0u8; max_compressed_len(src.len())];
        assert!(matches!(compress(5, ShuffleMode::Byte, 8, 0, &src, &mut chunk), Err(ChunkError::InvalidArgument(_))));
        assert!(matches!(compress(10, ShuffleMode::Byte, 8, 1, &src, &mut chunk), Err(ChunkError::InvalidArgument(_))));
        assert!(matches!(compress(5, ShuffleMode::Byte, 0, 1, &src, &mut chunk), Err(ChunkError::InvalidArgument(_))));
    }

    #[test]
    fn bound_and_codec_list() {
        assert_eq!(max_compressed_len(0), MAX_OVERHEAD);
        assert_eq!(max_compressed_len(1000), 1000 + HEADER_LEN);
        assert_eq!(list_codecs(), "lz4,zlib,zstd");
    }
}
