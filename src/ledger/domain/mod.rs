//! Domain types and pure logic for the general ledger engine.

pub mod entries;
pub mod posting_month;
pub mod statement;
pub mod transfer;
