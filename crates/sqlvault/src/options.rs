//! Initialization options

use bitflags::bitflags;

bitflags! {
    /// What [`SqlVault::initialize`](crate::SqlVault::initialize) should do,
    /// combinable with `|`. Processing order is fixed regardless of how the
    /// set was built: drop, then create, then load.
    ///
    /// Unknown bits are truncated when constructed from raw bits, not
    /// rejected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InitOptions: u32 {
        const CREATE_TABLE_IF_NOT_EXISTS = 1 << 1;
        const DROP_TABLE_IF_EXISTS = 1 << 2;
        const LOAD_DATA = 1 << 3;
    }
}

impl Default for InitOptions {
    /// Create the table if missing, then load it.
    fn default() -> Self {
        Self::CREATE_TABLE_IF_NOT_EXISTS | Self::LOAD_DATA
    }
}
