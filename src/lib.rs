//! A double-entry bookkeeping API centered on the general ledger: leaf
//! entries recorded in the subsidiary books are transferred into aggregate
//! parent postings, which back the month-bucketed ledger statement.

pub mod cli;
mod database;
mod http_err;
pub mod ledger;
mod models;
mod server;
