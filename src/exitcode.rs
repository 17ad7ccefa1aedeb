//! Standard exit codes (BSD sysexits.h compatible)

/// At least one mutation was rejected
pub const REJECTED: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed script)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
