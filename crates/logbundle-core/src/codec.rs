use std::io;

/// General-purpose codec applied to serialized task payloads before storage.
pub trait PayloadCompressor {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(zstd::DEFAULT_COMPRESSION_LEVEL)
    }
}

impl PayloadCompressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        zstd::bulk::compress(data, self.level)
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        zstd::stream::decode_all(data)
    }
}
