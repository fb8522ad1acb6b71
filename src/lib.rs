//! # sistemav
//!
//! Commission engine, response cache and pagination layer for the SistemaV
//! sales tracker.
//!
//! ## Features
//!
//! - **Commission engine:** percentage, fixed and tiered rules, performance
//!   bonus, per-period totals and attendant ranking, all in exact decimals
//! - **Response cache:** bounded in-process TTL cache with oldest-first
//!   eviction and deterministic keys
//! - **Pagination:** clamped `page`/`limit` parsing and `{ data, pagination }`
//!   envelopes
//! - **HTTP middleware** (feature `http`, on by default): axum layers for
//!   cache-or-compute, rate limiting, JSON validation and sanitization
//!
//! ## Quick Start
//!
//! ```ignore
//! use sistemav::{CommissionService, repository::InMemorySource};
//!
//! let service = CommissionService::new(
//!     InMemorySource::new()
//!         .with_sales(sales)
//!         .with_attendants(attendants)
//!         .with_rules(rules),
//! );
//!
//! let calc = service.commission_for_sale("sale-1").await?;
//! let board = service.ranking(start, end).await?;
//! ```
//!
//! ### Wiring the middleware
//!
//! ```ignore
//! use sistemav::{middleware, cache::MemoryCache, config::SistemaConfig};
//!
//! let config = SistemaConfig::from_env()?;
//! let app = middleware::apply(
//!     router,
//!     middleware::ResponseCache::new(MemoryCache::new(config.cache)),
//!     middleware::RateLimiter::new(config.rate_limit),
//! );
//! ```

#[macro_use]
extern crate log;

pub mod cache;
pub mod commission;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod middleware;
pub mod model;
pub mod money;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod service;
pub mod strategy;

// Re-exports for convenience
pub use cache::MemoryCache;
pub use commission::{calculate_commission, calculate_period_commissions, CommissionCalculation};
pub use error::{Error, Result};
pub use model::{Attendant, CommissionRule, RuleType, Sale, Validate};
pub use money::Money;
pub use pagination::{create_paginated_response, PageParams, PaginatedResponse, Pagination};
pub use repository::CommissionSource;
pub use service::CommissionService;
pub use strategy::CacheStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
