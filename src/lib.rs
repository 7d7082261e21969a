//! RedTrack - red team engagement tracking
//!
//! RedTrack is the data core behind an engagement dashboard: it tracks
//! projects, the people and assets discovered during reconnaissance, and
//! vulnerability findings as they move through triage. Every mutation is
//! audited to an append-only activity feed, and all dashboard numbers
//! (per-project counts, severity breakdowns, timelines) are computed live
//! from the store rather than cached.
//!
//! ## Components
//!
//! 1. **Engagement store** ([`engagement`]): SQLite-backed collections of
//!    projects, people, assets, findings, and activity events, with a
//!    [`EngagementManager`] facade exposing the ingestion/query/mutation API.
//!
//! 2. **Triage** ([`engagement::TriageStateMachine`]): enforces the legal
//!    finding status transitions and writes the audit trail atomically.
//!
//! 3. **Recon** ([`recon`]): deterministic confidence classification for
//!    discovered people.
//!
//! 4. **Stats** ([`stats`]): on-demand aggregation - project/global counts,
//!    severity breakdown, triage board partition, activity timeline buckets.

pub mod engagement;
pub mod recon;
pub mod stats;

pub use engagement::*;
