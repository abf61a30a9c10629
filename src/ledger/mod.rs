//! The general ledger engine: transfer of recorded entries from the
//! subsidiary books into aggregate parent postings, and the read models
//! built on top of them.

pub mod commands;
pub mod domain;
pub mod http;
pub mod queries;
pub mod services;
