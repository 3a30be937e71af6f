use crc32fast::Hasher;

/// Generate document ID from file path using CRC32
pub fn get_document_id(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Seed for a fresh parse: the document id folded with the source text, so
/// ids from a parse of different text never resolve in this one
pub fn get_snapshot_id(path: &str, source: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(get_document_id(path).as_bytes());
    hasher.update(&[0]);
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for tree nodes within a document.
///
/// A generator resumed from an earlier tree keeps counting past that tree's
/// last id, so fresh ids never collide with carried-over ones.
#[derive(Debug, Clone)]
pub struct IDGenerator {
    seed: String, // Document ID (CRC32)
    count: u32,   // Sequential counter
}

impl IDGenerator {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_id(path),
            count: 0,
        }
    }

    /// Generator for a fresh parse of `source`
    pub fn for_source(path: &str, source: &str) -> Self {
        Self {
            seed: get_snapshot_id(path, source),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    pub fn resume(seed: impl Into<String>, count: u32) -> Self {
        Self {
            seed: seed.into(),
            count,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
