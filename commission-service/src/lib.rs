//! Commission Service - engineer commission ledger and period reporting.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod startup;
