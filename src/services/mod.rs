pub mod aggregator;
pub mod cadence;
pub mod chain;
pub mod monitor;
pub mod oracle;
