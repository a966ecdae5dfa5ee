//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Settings could not be resolved, or a command failed
pub const FAILURE: i32 = 1;

/// Command line usage error (same code clap uses)
pub const USAGE: i32 = 2;

/// Configuration error: unknown app or malformed command declarations
pub const CONFIG: i32 = 78;
