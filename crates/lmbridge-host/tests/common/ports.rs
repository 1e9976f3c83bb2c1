//! Test port constants for lmbridge-host tests.
//!
//! Centralized so the occupied-port scenario doesn't collide with other
//! test binaries.

/// Base port for the occupied-port retry scenario.
pub const TEST_BASE_PORT: u16 = 19750;
