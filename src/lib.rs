pub mod assoc;
pub mod cache;
pub mod config;
pub mod direct;
pub mod generator;
pub mod replace;
pub mod report;
pub mod trace;
