//! Building blocks of the `vigil` binary
//!
//! Split out as a library so the integration tests can exercise the
//! configuration, record-keeping, and locking pieces directly.

pub mod cmd;
pub mod locks;
pub mod recorder;
pub mod system_config;
pub mod util;
