use crate::error::Result;

/// Abstract storage engine interface (whole-blob byte operations)
///
/// Different from `sql::engine::TableStore`, which operates on tables.
/// A table store serializes its entire catalog image and hands it to
/// `write_blob` after every mutation; there are no partial writes.
pub trait Engine: Send {
    /// Replaces the stored blob with `data`.
    fn write_blob(&mut self, data: &[u8]) -> Result<()>;

    /// Returns the stored blob, or None if nothing (or an empty blob) was written.
    fn read_blob(&self) -> Option<Vec<u8>>;
}
