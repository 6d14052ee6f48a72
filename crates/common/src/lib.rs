pub mod client;
pub mod config;
pub mod normalizer;
pub mod numeric;
pub mod observability;
pub mod opportunity;
pub mod ranker;
pub mod types;
