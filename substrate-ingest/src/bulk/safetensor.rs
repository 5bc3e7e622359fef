//! SafeTensor-like bulk ingestion (spec §4.7/§6): `uint64_LE
//! header_length`, then a JSON dict describing each tensor's dtype,
//! shape, and byte-range into the data region, then the raw tensor
//! bytes themselves. Only `F16` and `F32` are required to be
//! ingestible; other dtypes are skipped with a warning.

use std::collections::BTreeMap;

use byteorder::{LittleEndian, ReadBytesExt};
use rayon::prelude::*;
use serde::Deserialize;
use substrate_core::seed::Seed;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};
use substrate_store::PostgresStore;

use super::progress::{Phase, ProgressCallback, ProgressUpdate};
use super::{row_for_seed, BulkSummary};

#[derive(Debug, Deserialize)]
struct TensorInfo {
    dtype: String,
    #[allow(dead_code)]
    shape: Vec<i64>,
    data_offsets: [u64; 2],
}

/// A parsed SafeTensor header plus the offset of the data region in
/// the source file (`8 + header_length`).
pub struct SafeTensorHeader {
    tensors: BTreeMap<String, TensorInfo>,
    data_region_start: u64,
}

/// Sparsity configuration: either an explicit threshold or a target
/// percentile the ingestor estimates one from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparsityConfig {
    pub threshold: Option<f32>,
    pub target_percentile: Option<f64>,
}

/// Parses the leading `uint64_LE header_length` plus the JSON header
/// from `data`. Does not read the tensor bytes themselves.
pub fn parse_header(data: &[u8]) -> Result<SafeTensorHeader> {
    if data.len() < 8 {
        return Err(SubstrateError::InvalidInput(
            "file is shorter than the 8-byte SafeTensor header length field".to_string(),
        ));
    }
    let header_len = (&data[0..8])
        .read_u64::<LittleEndian>()
        .map_err(|e| SubstrateError::InvalidInput(e.to_string()))?;
    let header_len = usize::try_from(header_len)
        .map_err(|_| SubstrateError::InvalidInput("header length overflows usize".to_string()))?;

    let header_end = 8usize
        .checked_add(header_len)
        .ok_or_else(|| SubstrateError::InvalidInput("header length overflows file bounds".to_string()))?;
    if header_end > data.len() {
        return Err(SubstrateError::InvalidInput(
            "declared header length exceeds file size".to_string(),
        ));
    }

    let json_bytes = &data[8..header_end];
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(json_bytes)
        .map_err(|e| SubstrateError::InvalidInput(format!("malformed SafeTensor header JSON: {e}")))?;

    let mut tensors = BTreeMap::new();
    for (name, value) in raw {
        if name == "__metadata__" {
            continue;
        }
        let info: TensorInfo = serde_json::from_value(value)
            .map_err(|e| SubstrateError::InvalidInput(format!("malformed tensor entry {name:?}: {e}")))?;
        tensors.insert(name, info);
    }

    Ok(SafeTensorHeader {
        tensors,
        data_region_start: header_end as u64,
    })
}

fn f16_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits >> 15) << 31;
    let exponent = u32::from((bits >> 10) & 0x1F);
    let mantissa = u32::from(bits & 0x3FF);

    let bits32 = if exponent == 0 {
        if mantissa == 0 {
            sign
        } else {
            // Subnormal f16: normalize into f32's wider exponent range.
            let mut exp = -1i32;
            let mut mant = mantissa;
            while mant & 0x400 == 0 {
                mant <<= 1;
                exp -= 1;
            }
            mant &= 0x3FF;
            let unbiased = exp + 1 - 15 + 127;
            sign | ((unbiased as u32) << 23) | (mant << 13)
        }
    } else if exponent == 0x1F {
        sign | 0xFF << 23 | (mantissa << 13)
    } else {
        let unbiased = exponent as i32 - 15 + 127;
        sign | ((unbiased as u32) << 23) | (mantissa << 13)
    };

    f32::from_bits(bits32)
}

fn decode_values(dtype: &str, bytes: &[u8]) -> Option<Vec<f32>> {
    match dtype {
        "F32" => Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                .collect(),
        ),
        "F16" => Some(
            bytes
                .chunks_exact(2)
                .map(|c| f16_to_f32(u16::from_le_bytes(c.try_into().unwrap())))
                .collect(),
        ),
        _ => None,
    }
}

fn estimate_threshold(values: &[f32], target_percentile: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut magnitudes: Vec<f32> = values.iter().map(|v| v.abs()).collect();
    magnitudes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = ((target_percentile / 100.0) * (magnitudes.len() - 1) as f64).round() as usize;
    magnitudes[rank.min(magnitudes.len() - 1)]
}

/// Streams every `F16`/`F32` tensor's values into `store`, skipping
/// unsupported dtypes, generic over any [`NodeStore`] (one
/// `get_or_insert_constant` per surviving value — suitable for tests
/// and small files).
pub fn ingest_safetensor<S: NodeStore + Sync>(
    store: &S,
    file_bytes: &[u8],
    sparsity: SparsityConfig,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<BulkSummary> {
    let header = parse_header(file_bytes)?;
    let mut total = 0u64;
    let mut stored = 0u64;
    let mut skipped = 0u64;

    for (name, info) in &header.tensors {
        let start = (header.data_region_start + info.data_offsets[0]) as usize;
        let end = (header.data_region_start + info.data_offsets[1]) as usize;
        if end > file_bytes.len() || start > end {
            return Err(SubstrateError::InvalidInput(format!(
                "tensor {name:?} declares an out-of-bounds byte range"
            )));
        }
        let Some(values) = decode_values(&info.dtype, &file_bytes[start..end]) else {
            tracing::warn!(tensor = %name, dtype = %info.dtype, "skipping unsupported SafeTensor dtype");
            continue;
        };

        let threshold = match (sparsity.threshold, sparsity.target_percentile) {
            (Some(t), _) => t,
            (None, Some(p)) => estimate_threshold(&values, p),
            (None, None) => 0.0,
        };

        total += values.len() as u64;
        let seeds: Vec<Seed> = values
            .par_iter()
            .filter(|v| v.abs() >= threshold)
            .map(|v| Seed::Float32Bits(v.to_bits()))
            .collect();
        skipped += values.len() as u64 - seeds.len() as u64;

        for seed in seeds {
            store.get_or_insert_constant(seed)?;
            stored += 1;
        }

        if let Some(cb) = progress.as_mut() {
            let sparsity_pct = if total > 0 { (skipped as f64 / total as f64) * 100.0 } else { 0.0 };
            cb(ProgressUpdate {
                phase: Phase::Storing,
                processed: total,
                total,
                stored,
                sparsity_pct,
            });
        }
    }

    let sparsity_pct = if total > 0 { (skipped as f64 / total as f64) * 100.0 } else { 0.0 };
    Ok(BulkSummary {
        total,
        stored,
        sparsity_pct,
    })
}

/// Streams every `F16`/`F32` tensor's surviving values directly into a
/// Postgres-backed store via the binary `COPY` channel.
pub fn ingest_safetensor_bulk_copy(
    store: &PostgresStore,
    file_bytes: &[u8],
    sparsity: SparsityConfig,
    batch_size: usize,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<BulkSummary> {
    let header = parse_header(file_bytes)?;
    let mut total = 0u64;
    let mut stored = 0u64;

    for (name, info) in &header.tensors {
        let start = (header.data_region_start + info.data_offsets[0]) as usize;
        let end = (header.data_region_start + info.data_offsets[1]) as usize;
        if end > file_bytes.len() || start > end {
            return Err(SubstrateError::InvalidInput(format!(
                "tensor {name:?} declares an out-of-bounds byte range"
            )));
        }
        let Some(values) = decode_values(&info.dtype, &file_bytes[start..end]) else {
            tracing::warn!(tensor = %name, dtype = %info.dtype, "skipping unsupported SafeTensor dtype");
            continue;
        };

        let threshold = match (sparsity.threshold, sparsity.target_percentile) {
            (Some(t), _) => t,
            (None, Some(p)) => estimate_threshold(&values, p),
            (None, None) => 0.0,
        };

        total += values.len() as u64;
        let surviving: Vec<f32> = values.into_iter().filter(|v| v.abs() >= threshold).collect();

        for chunk in surviving.chunks(batch_size.max(1)) {
            let rows: Vec<_> = chunk
                .par_iter()
                .map(|v| row_for_seed(Seed::Float32Bits(v.to_bits())))
                .collect();
            stored += store.copy_in_constants(&rows)?;

            if let Some(cb) = progress.as_mut() {
                cb(ProgressUpdate {
                    phase: Phase::Storing,
                    processed: stored,
                    total,
                    stored,
                    sparsity_pct: 0.0,
                });
            }
        }
    }

    let sparsity_pct = if total > 0 {
        ((total - stored) as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    Ok(BulkSummary {
        total,
        stored,
        sparsity_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_test_support::InMemoryStore;

    fn build_test_file(values: &[f32]) -> Vec<u8> {
        let mut data = Vec::new();
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let header = serde_json::json!({
            "weights": {
                "dtype": "F32",
                "shape": [values.len()],
                "data_offsets": [0, data.len()],
            }
        });
        let header_bytes = serde_json::to_vec(&header).unwrap();
        let mut file = Vec::new();
        file.extend_from_slice(&(header_bytes.len() as u64).to_le_bytes());
        file.extend_from_slice(&header_bytes);
        file.extend_from_slice(&data);
        file
    }

    #[test]
    fn ingests_f32_tensor_without_sparsity() {
        let store = InMemoryStore::new();
        let file = build_test_file(&[1.0, 2.0, 3.0]);
        let summary = ingest_safetensor(&store, &file, SparsityConfig::default(), None).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.stored, 3);
    }

    #[test]
    fn explicit_threshold_skips_small_magnitudes() {
        let store = InMemoryStore::new();
        let file = build_test_file(&[0.001, 5.0, -0.002, 10.0]);
        let sparsity = SparsityConfig {
            threshold: Some(1.0),
            target_percentile: None,
        };
        let summary = ingest_safetensor(&store, &file, sparsity, None).unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.stored, 2);
    }

    #[test]
    fn f16_round_trips_common_values() {
        assert_eq!(f16_to_f32(0x3C00), 1.0);
        assert_eq!(f16_to_f32(0xBC00), -1.0);
        assert_eq!(f16_to_f32(0x0000), 0.0);
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(parse_header(&[0u8; 4]).is_err());
    }
}
