use crate::errors::IntegrationError;
use serde::{de::DeserializeOwned, Serialize};

/// Serialization format options for function map snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat {
    /// bincode, uncompressed
    Bincode,
    /// bincode with LZ4 compression (default)
    #[default]
    BincodeLz4,
}

impl SerializationFormat {
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool {
        matches!(self, SerializationFormat::BincodeLz4)
    }
}

/// Serialize data to bytes using the specified format.
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, IntegrationError> {
    let bytes = bincode::serde::encode_to_vec(data, bincode::config::standard())
        .map_err(|_| IntegrationError::SerializationFailed)?;
    if format.is_compressed() {
        Ok(lz4_flex::compress_prepend_size(&bytes))
    } else {
        Ok(bytes)
    }
}

/// Deserialize data from bytes using the specified format.
pub fn deserialize<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, IntegrationError> {
    let decode = |bytes: &[u8]| {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(value, _)| value)
            .map_err(|_| IntegrationError::DeserializationFailed)
    };
    if format.is_compressed() {
        let decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|_| IntegrationError::LZ4DecompressionFailed)?;
        decode(&decompressed)
    } else {
        decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct TestData {
        values: Vec<f64>,
        name: String,
    }

    #[test]
    fn test_bincode_lz4_roundtrip() {
        let data = TestData {
            values: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            name: "compressed_test".to_string(),
        };

        let bytes = serialize(&data, SerializationFormat::BincodeLz4).unwrap();
        let result: TestData = deserialize(&bytes, SerializationFormat::BincodeLz4).unwrap();
        assert_eq!(data, result);
    }

    #[test]
    fn test_corrupt_buffer() {
        let result: Result<TestData, _> = deserialize(&[1, 2, 3], SerializationFormat::BincodeLz4);
        assert_eq!(result, Err(IntegrationError::LZ4DecompressionFailed));
    }
}
