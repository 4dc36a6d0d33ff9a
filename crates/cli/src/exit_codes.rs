//! CLI Exit Code Registry
//!
//! Single source of truth for `gradecheck` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Mismatches found (`compare --strict` only)           |
//! | 2    | Usage error (bad arguments, no input files)          |
//! | 3    | I/O error (unreadable input, unwritable output)      |
//! | 4-5  | Reserved                                             |
//! | 6    | Invalid configuration file                           |
//! | 7    | Every course in the batch failed                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed, whatever the comparison found.
pub const EXIT_SUCCESS: u8 = 0;

/// Mismatches found. Like `diff(1)`, exit 1 means "grades differ".
/// Only returned when `--strict` is given.
pub const EXIT_MISMATCH: u8 = 1;

/// Usage error - bad arguments, nothing to compare.
/// Also what clap itself exits with on a parse failure.
pub const EXIT_USAGE: u8 = 2;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 3;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Every roster ended in an error outcome.
pub const EXIT_ALL_FAILED: u8 = 7;
