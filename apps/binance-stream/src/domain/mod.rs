//! Domain Layer - Subscription naming with no I/O.
//!
//! Types here know the venue's naming rules but nothing about sockets
//! or wire encodings.

/// Subscription names, payload kinds and stream paths.
pub mod subscription;
