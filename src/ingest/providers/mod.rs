// src/ingest/providers/mod.rs
pub mod bizinfo;

pub use bizinfo::BizinfoClient;
