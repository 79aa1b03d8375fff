use crate::common::Result;

/// Pluggable byte-transform applied to non-reserved pages before they are
/// appended to the backing store. Reserved pages bypass the codec so that
/// bootstrap never depends on it.
pub trait PageCodec: Send + Sync {
    /// Transforms a full page buffer into its stored representation.
    fn compress(&self, data: &[u8]) -> Vec<u8>;

    /// Inverts the transform. The result must be exactly one page.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// The identity transform - pages are stored verbatim.
pub struct IdentityCodec;

impl PageCodec for IdentityCodec {
    fn compress(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}
