use crate::{error::Result, storage::engine::Engine};

/// In-memory storage engine, used when no data directory is configured
#[derive(Debug, Default)]
pub struct MemoryEngine {
    data: Vec<u8>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }
}

impl Engine for MemoryEngine {
    fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.data = data.to_vec();
        Ok(())
    }

    fn read_blob(&self) -> Option<Vec<u8>> {
        Some(self.data.clone()).filter(|d| !d.is_empty())
    }
}
