//! Talana Gateway Library
//!
//! This library fronts the Talana HR/payroll API with a rate-limited, retrying
//! client, per-resource TTL caches that serve stale data on upstream failure, a
//! mapper tolerant of Talana's varying JSON shapes, and the aggregation that
//! builds employee, contract and absence records for the HTTP handlers.
//!
//! # Modules
//!
//! - `api`: Route table.
//! - `cache`: TTL caches with stale-serve.
//! - `config`: Configuration management.
//! - `date_window`: `desde`/`hasta` overlap filtering.
//! - `enrichment`: Aggregation and enrichment over Talana.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `json_walk`: Shape-tolerant JSON readers and bounded-depth search.
//! - `mapper`: Talana JSON to typed records.
//! - `models`: Records, query and response models.
//! - `rate_limiter`: Global minimum-interval limiter for upstream calls.
//! - `talana_client`: Talana HTTP client.
//! - `warmup`: Daily active-contracts warmup.

pub mod api;
pub mod cache;
pub mod config;
pub mod date_window;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod json_walk;
pub mod mapper;
pub mod models;
pub mod rate_limiter;
pub mod talana_client;
pub mod warmup;
