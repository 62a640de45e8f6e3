//! Ordering and terminal-event contracts of the event stream.
