//! Embedded services.

pub mod kv;
