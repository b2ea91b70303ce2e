//! Domain model for managed posts and paged listings.
//!
//! # Responsibility
//! - Define the record shape every backend adapter reads and writes.
//! - Define the request/response envelopes used by paged listing.
//!
//! # Invariants
//! - Every post is identified by a store-assigned `PostId`.
//! - Deletion is represented by the `is_deleted` tombstone, not row removal.

pub mod page;
pub mod post;
