//! Compressed RTF support.
//!
//! Mail stores keep RTF bodies in the compressed container defined by
//! [MS-OXRTFCP]: a 16-byte header followed either by `LZFu` data (LZ77 over a
//! 4096-byte ring dictionary pre-seeded with common RTF text) or by the raw
//! RTF (`MELA`).
//!
//! [MS-OXRTFCP]: https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfcp

use super::error::{RtfError, RtfResult};
use zerocopy::FromBytes;
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout};

/// Magic signature for compressed RTF
const COMPRESSED_SIGNATURE: &[u8; 4] = b"LZFu";

/// Magic signature for uncompressed RTF (stored with compression header)
const UNCOMPRESSED_SIGNATURE: &[u8; 4] = b"MELA";

const HEADER_SIZE: usize = 16;

/// Initial dictionary for decompression
const INIT_DICT: &[u8] = b"{\\rtf1\\ansi\\mac\\deff0\\deftab720{\\fonttbl;}\
{\\f0\\fnil \\froman \\fswiss \\fmodern \\fscript \\fdecor MS Sans SerifSymbolArial\
Times New RomanCourier{\\colortbl\\red0\\green0\\blue0\r\n\\par \\pard\\plain\\f0\\fs20\
\\b\\i\\u\\tab\\tx";

/// Size of initial dictionary
const INIT_DICT_SIZE: usize = 207;

/// Maximum dictionary size
const MAX_DICT_SIZE: usize = 4096;

/// Compressed RTF header (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout)]
struct CompressedRtfHeader {
    /// Size of the container after this field (little-endian)
    compressed_size: [u8; 4],
    /// Size of uncompressed data (little-endian)
    raw_size: [u8; 4],
    /// Compression type signature
    compression_type: [u8; 4],
    /// CRC32 checksum (little-endian)
    crc32: [u8; 4],
}

impl CompressedRtfHeader {
    #[inline]
    fn compressed_size(&self) -> u32 {
        u32::from_le_bytes(self.compressed_size)
    }

    #[inline]
    fn raw_size(&self) -> u32 {
        u32::from_le_bytes(self.raw_size)
    }

    #[inline]
    fn crc32(&self) -> u32 {
        u32::from_le_bytes(self.crc32)
    }

    fn is_compressed(&self) -> bool {
        &self.compression_type == COMPRESSED_SIGNATURE
    }

    fn is_uncompressed(&self) -> bool {
        &self.compression_type == UNCOMPRESSED_SIGNATURE
    }
}

/// Detect if data is a compressed RTF container
pub fn is_compressed_rtf(data: &[u8]) -> bool {
    if data.len() < HEADER_SIZE {
        return false;
    }

    let signature = &data[8..12];
    signature == COMPRESSED_SIGNATURE || signature == UNCOMPRESSED_SIGNATURE
}

/// Decompress RTF data
///
/// # Errors
///
/// Returns error if:
/// - Data is too small
/// - CRC check fails
/// - Unknown compression type
///
/// # Examples
///
/// ```rust
/// use rtfex::rtf::decompress;
///
/// let mut data = Vec::new();
/// data.extend_from_slice(&(12u32 + 6).to_le_bytes());
/// data.extend_from_slice(&6u32.to_le_bytes());
/// data.extend_from_slice(b"MELA");
/// data.extend_from_slice(&0u32.to_le_bytes());
/// data.extend_from_slice(b"{\\rtf}");
///
/// assert_eq!(decompress(&data)?, b"{\\rtf}");
/// # Ok::<(), rtfex::rtf::RtfError>(())
/// ```
pub fn decompress(data: &[u8]) -> RtfResult<Vec<u8>> {
    if data.len() < HEADER_SIZE {
        return Err(RtfError::InvalidCompressed(
            "Compressed RTF header must be at least 16 bytes".to_string(),
        ));
    }

    let header = CompressedRtfHeader::read_from_bytes(&data[..HEADER_SIZE]).map_err(|_| {
        RtfError::InvalidCompressed("Failed to parse compressed RTF header".to_string())
    })?;

    // compressed_size counts everything after its own field
    let declared_end = (header.compressed_size() as usize).saturating_add(4);
    let body = &data[HEADER_SIZE..declared_end.clamp(HEADER_SIZE, data.len())];

    if header.is_compressed() {
        tracing::debug!(raw_size = header.raw_size(), "decompressing LZFu RTF");
        decompress_lzfu(body, &header)
    } else if header.is_uncompressed() {
        tracing::debug!(raw_size = header.raw_size(), "unwrapping MELA RTF");
        decompress_uncompressed(body, &header)
    } else {
        Err(RtfError::InvalidCompressed(format!(
            "Unknown compression type: {:?}",
            header.compression_type
        )))
    }
}

/// CRC of MS-OXRTFCP: the reflected CRC-32 polynomial run from a zero
/// register with no final xor.
///
/// Standard CRC-32 starts from `!0` and inverts the result. The register is
/// linear in (initial value, data), so xoring with the CRC-32 of an all-zero
/// buffer of the same length cancels both terms.
fn container_crc(data: &[u8]) -> u32 {
    let zeros = vec![0u8; data.len()];
    let standard = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, data) as u32;
    let bias = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, &zeros) as u32;
    standard ^ bias
}

/// Decompress LZFu compressed data
fn decompress_lzfu(data: &[u8], header: &CompressedRtfHeader) -> RtfResult<Vec<u8>> {
    let calculated_crc = container_crc(data);
    if calculated_crc != header.crc32() {
        return Err(RtfError::InvalidCompressed(format!(
            "CRC32 mismatch: expected {:#x}, got {:#x}",
            header.crc32(),
            calculated_crc
        )));
    }

    let mut dict = vec![b' '; MAX_DICT_SIZE];
    dict[..INIT_DICT_SIZE].copy_from_slice(INIT_DICT);

    let mut write_offset = INIT_DICT_SIZE;
    let mut output = Vec::with_capacity(header.raw_size() as usize);
    let mut input = data.iter().copied();

    while let Some(control) = input.next() {
        // Process each bit in control byte (LSB to MSB)
        for bit in 0..8 {
            if (control & (1 << bit)) != 0 {
                // Dictionary reference: 12-bit offset, 4-bit length
                let (Some(high), Some(low)) = (input.next(), input.next()) else {
                    return Ok(output);
                };
                let token = u16::from_be_bytes([high, low]);
                let offset = usize::from(token >> 4);
                let length = usize::from(token & 0x0F) + 2;

                if offset == write_offset {
                    return Ok(output);
                }

                for step in 0..length {
                    let byte = dict[(offset + step) % MAX_DICT_SIZE];
                    output.push(byte);
                    dict[write_offset] = byte;
                    write_offset = (write_offset + 1) % MAX_DICT_SIZE;
                }
            } else {
                let Some(literal) = input.next() else {
                    return Ok(output);
                };
                output.push(literal);
                dict[write_offset] = literal;
                write_offset = (write_offset + 1) % MAX_DICT_SIZE;
            }
        }
    }

    Ok(output)
}

/// Unwrap stored (MELA) data
fn decompress_uncompressed(data: &[u8], header: &CompressedRtfHeader) -> RtfResult<Vec<u8>> {
    if header.crc32() != 0x00000000 {
        return Err(RtfError::InvalidCompressed(
            "CRC32 must be 0x00000000 for uncompressed RTF".to_string(),
        ));
    }

    let size = (header.raw_size() as usize).min(data.len());
    Ok(data[..size].to_vec())
}
