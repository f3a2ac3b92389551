//! Integer and block compression used to encode posting lists and segment
//! bodies. Ported from the teacher's `compression::vbyte`/`compression::delta`/
//! `compression::compress` trio: delta-encode sorted doc-id runs, vbyte-encode
//! small integers (term frequencies, positions), and optionally block-compress
//! whole segment bodies with one of a small set of general-purpose codecs.

use crate::core::error::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

pub struct VByteEncoder;

impl VByteEncoder {
    pub fn encode_u32(output: &mut Vec<u8>, mut value: u32) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);
            value >>= 7;
        }
        output.push(value as u8);
    }

    pub fn encode_u32_list(nums: &[u32]) -> Vec<u8> {
        let mut output = Vec::new();
        for &num in nums {
            Self::encode_u32(&mut output, num);
        }
        output
    }

    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let mut value = 0u32;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            value |= ((byte & 127) as u32) << shift;
            if byte & 128 == 0 {
                return Ok((value, consumed));
            }
            shift += 7;
            if shift > 28 {
                return Err(Error::new(ErrorKind::Parse, "vbyte overflow"));
            }
        }
        Err(Error::new(ErrorKind::Parse, "incomplete vbyte sequence"))
    }

    pub fn decode_u32_list(data: &[u8]) -> Result<Vec<u32>> {
        let mut nums = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let (value, consumed) = Self::decode_u32(&data[pos..])?;
            nums.push(value);
            pos += consumed;
        }
        Ok(nums)
    }
}

/// Delta encoding for sorted integers (doc-id runs within a posting list).
pub struct DeltaEncoder;

impl DeltaEncoder {
    pub fn encode_u32_list(nums: &[u32]) -> Vec<u8> {
        if nums.is_empty() {
            return Vec::new();
        }
        let mut output = Vec::new();
        output.extend_from_slice(&nums[0].to_le_bytes());
        for i in 1..nums.len() {
            let delta = nums[i].wrapping_sub(nums[i - 1]);
            VByteEncoder::encode_u32(&mut output, delta);
        }
        output
    }

    pub fn decode_u32_list(data: &[u8]) -> Result<Vec<u32>> {
        let (nums, _) = Self::decode_u32_list_n(data, usize::MAX)?;
        Ok(nums)
    }

    /// Decodes at most `count` values (or until `data` is exhausted,
    /// whichever comes first) and returns the number of bytes consumed.
    /// Callers that pack more than one encoded list back to back need the
    /// exact element count to avoid reading into the next list's bytes.
    pub fn decode_u32_list_n(data: &[u8], count: usize) -> Result<(Vec<u32>, usize)> {
        if count == 0 || data.len() < 4 {
            return Ok((Vec::new(), 0));
        }
        let first = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let mut nums = vec![first];
        let mut pos = 4;
        let mut prev = first;
        while nums.len() < count && pos < data.len() {
            let (delta, consumed) = VByteEncoder::decode_u32(&data[pos..])?;
            let val = prev.wrapping_add(delta);
            nums.push(val);
            prev = val;
            pos += consumed;
        }
        Ok((nums, pos))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    Lz4,
    Zstd,
    Snappy,
}

/// A compressed byte block with enough metadata to decompress on its own.
/// Used for segment document-store bodies (§3's "segment bodies are framed
/// with an optional block compressor").
#[derive(Serialize, Deserialize)]
pub struct CompressedBlock {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub compression: CompressionType,
}

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Self> {
        let compressed = match compression {
            CompressionType::None => data.to_vec(),
            CompressionType::Lz4 => lz4::block::compress(data, None, false)
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?,
            CompressionType::Zstd => {
                zstd::encode_all(data, 3).map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?
            }
            CompressionType::Snappy => {
                use snap::raw::Encoder;
                Encoder::new()
                    .compress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?
            }
        };
        Ok(CompressedBlock {
            data: compressed,
            original_size: data.len(),
            compression,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        match self.compression {
            CompressionType::None => Ok(self.data.clone()),
            CompressionType::Lz4 => {
                lz4::block::decompress(&self.data, Some(self.original_size as i32))
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
            }
            CompressionType::Zstd => zstd::decode_all(&self.data[..])
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string())),
            CompressionType::Snappy => {
                use snap::raw::Decoder;
                Decoder::new()
                    .decompress_vec(&self.data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
            }
        }
    }
}
