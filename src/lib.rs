//! securefile - Passphrase-based file encryption into AES-128-CBC secured
//! containers
//!
//! The passphrase is turned into a key by repetition/truncation only (see
//! [`keys`]). That derivation has no cryptographic strength and the
//! container carries no integrity tag; the format exists for compatibility
//! with existing `.ssf` files, not as a recommendation.

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod file_ops;
pub mod interactive;
pub mod keys;
pub mod naming;
pub mod observer;
pub mod passphrase;
