//! Paperbroker Trade Execution & Ledger Engine
//!
//! Core components of a crypto paper-trading platform: pricing simulated
//! fills against an oracle-supplied reference price, atomically mutating
//! virtual account balances and positions, and stamping every execution
//! with a tamper-evident audit record.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
