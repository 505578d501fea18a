//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract - scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                |
//! |---------|------------|--------------------------------------------|
//! | 0       | Universal  | Success                                    |
//! | 1       | Universal  | General error (unspecified)                |
//! | 2       | Universal  | CLI usage error (bad args)                 |
//! | 3-9     | analysis   | Upload and derivation failures             |
//! | 10-19   | ai         | AI provider, keychain and service failures |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Analysis (3-9)
// =============================================================================

/// Input file could not be loaded: unreadable, unsupported type, wrong
/// column count, missing sheet, no data rows.
pub const EXIT_LOAD: u8 = 3;

/// No row matches any total-assets alias; weights cannot be computed.
pub const EXIT_MISSING_TOTALS: u8 = 4;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none).
pub const EXIT_AI_DISABLED: u8 = 10;

/// AI provider configured but API key missing.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// Keychain error (cannot read/write credentials).
pub const EXIT_AI_KEYCHAIN_ERR: u8 = 12;

/// Provider rejected the credentials.
pub const EXIT_AI_AUTH: u8 = 13;

/// Provider request failed (network, quota, server error, empty reply).
pub const EXIT_AI_SERVICE: u8 = 14;
