//! Input cursor and single-byte transfer contracts.
