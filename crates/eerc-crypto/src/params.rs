//! system parameters every reader of an encrypted balance must agree on

/// decimals of the encrypted token unit (1 unit = 0.01 token)
pub const ENCRYPTED_DECIMALS: u8 = 2;

/// versioned decoding parameters
///
/// exponential elgamal only recovers `amount·G`; the discrete log is found
/// by walking `0·G, 1·G, ..` up to `dlog_ceiling`. balances above the
/// ceiling are reported as [`crate::Error::DiscreteLogNotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeParams {
    pub version: u16,
    pub dlog_ceiling: u64,
}

impl DecodeParams {
    pub const V1: DecodeParams = DecodeParams {
        version: 1,
        dlog_ceiling: 10_000,
    };

    /// same version with a caller-chosen ceiling (e.g. from config)
    pub fn with_ceiling(self, dlog_ceiling: u64) -> Self {
        Self {
            dlog_ceiling,
            ..self
        }
    }
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self::V1
    }
}
