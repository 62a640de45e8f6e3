//! Frozen wire shapes of the bridge protocol.
//!
//! A context built from an older tree must keep talking to a newer
//! controller, so the exact JSON spellings below are contracts.
