//! Chunked zlib container used for on-disk saves.
//!
//! ```text
//! u32 crc | i32 size | u32 version
//! chunk*: u64 magic | u64 chunk_size | u8 compressor
//!         (u64 compressed, u64 decompressed) x2 | zlib data
//! ```
//!
//! The decompressed stream is 8 reserved bytes followed by the chunk data,
//! with the three header words written over offsets 0, 4 and 8.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::Crc;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::{debug, warn};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{FormatError, FormatResult};

pub const CHUNK_MAGIC: u64 = 0x2222_2222_9E2A_83C1;
pub const CHUNK_SIZE: usize = 0x20000;
pub const EXPECTED_VERSION: u32 = 9;
const COMPRESSOR_ZLIB: u8 = 3;
const HEADER_LEN: usize = 12;
const RESERVED_LEN: usize = 8;

/// CRC32 over everything after the stored checksum.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data.get(4..).unwrap_or_default());
    crc.sum()
}

pub fn is_compressed(data: &[u8]) -> bool {
    data.get(HEADER_LEN..HEADER_LEN + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        == Some(CHUNK_MAGIC)
}

pub fn decompress(data: &[u8]) -> FormatResult<Vec<u8>> {
    let mut r = ByteReader::new(data);
    let crc = r.read_u32()?;
    let size = r.read_i32()?;
    let version = r.read_u32()?;
    if version != EXPECTED_VERSION {
        warn!(version, expected = EXPECTED_VERSION, "unexpected container version");
    }

    let mut out = vec![0u8; RESERVED_LEN];
    let mut chunks = 0usize;
    while !r.at_end() {
        let offset = r.offset();
        let magic = r.read_u64()?;
        if magic != CHUNK_MAGIC {
            return Err(FormatError::Compression(format!(
                "bad chunk magic {magic:#018x} at offset {offset:#x}"
            )));
        }
        let _chunk_size = r.read_u64()?;
        let compressor = r.read_u8()?;
        if compressor != COMPRESSOR_ZLIB {
            return Err(FormatError::Compression(format!(
                "unknown compressor {compressor} at offset {offset:#x}"
            )));
        }
        let compressed = r.read_u64()?;
        let decompressed = r.read_u64()?;
        let _ = (r.read_u64()?, r.read_u64()?);

        let compressed = usize::try_from(compressed)
            .map_err(|_| FormatError::Compression(format!("chunk size {compressed} too large")))?;
        let payload = r.read_bytes(compressed)?;
        let before = out.len();
        ZlibDecoder::new(payload)
            .read_to_end(&mut out)
            .map_err(|e| FormatError::Compression(format!("chunk at offset {offset:#x}: {e}")))?;
        let produced = (out.len() - before) as u64;
        if produced != decompressed {
            return Err(FormatError::Compression(format!(
                "chunk at offset {offset:#x} inflated to {produced} bytes, header says {decompressed}"
            )));
        }
        chunks += 1;
    }

    if out.len() < HEADER_LEN {
        return Err(FormatError::Compression("decompressed stream shorter than its header".into()));
    }
    out[0..4].copy_from_slice(&crc.to_le_bytes());
    out[4..8].copy_from_slice(&size.to_le_bytes());
    out[8..12].copy_from_slice(&version.to_le_bytes());
    debug!(chunks, bytes = out.len(), "decompressed save");
    Ok(out)
}

pub fn compress(data: &[u8]) -> FormatResult<Vec<u8>> {
    if data.len() < HEADER_LEN {
        return Err(FormatError::Compression("stream shorter than its header".into()));
    }
    let mut w = ByteWriter::new();
    w.write_bytes(&data[..HEADER_LEN]);

    let mut chunks = 0usize;
    for chunk in data[RESERVED_LEN..].chunks(CHUNK_SIZE) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(chunk)?;
        let compressed = encoder.finish()?;

        w.write_u64(CHUNK_MAGIC);
        w.write_u64(CHUNK_SIZE as u64);
        w.write_u8(COMPRESSOR_ZLIB);
        for _ in 0..2 {
            w.write_u64(compressed.len() as u64);
            w.write_u64(chunk.len() as u64);
        }
        w.write_bytes(&compressed);
        chunks += 1;
    }
    debug!(chunks, bytes = data.len(), "compressed save");
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(len: usize) -> Vec<u8> {
        let mut data: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        data[8..12].copy_from_slice(&EXPECTED_VERSION.to_le_bytes());
        data
    }

    #[test]
    fn compress_then_decompress_restores_stream() {
        let data = stream(CHUNK_SIZE * 2 + 100);
        let packed = compress(&data).unwrap();
        assert!(is_compressed(&packed));
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn raw_stream_is_not_detected_as_compressed() {
        assert!(!is_compressed(&stream(64)));
        assert!(!is_compressed(&[0u8; 4]));
    }

    #[test]
    fn bad_magic_is_a_compression_error() {
        let mut packed = compress(&stream(64)).unwrap();
        packed[12] ^= 0xFF;
        assert!(matches!(decompress(&packed), Err(FormatError::Compression(_))));
    }

    #[test]
    fn crc_skips_its_own_field() {
        let mut data = stream(32);
        let before = crc32(&data);
        data[0] ^= 0xFF;
        assert_eq!(crc32(&data), before);
        data[4] ^= 0xFF;
        assert_ne!(crc32(&data), before);
    }
}
