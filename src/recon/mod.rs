//! Reconnaissance intelligence helpers
//!
//! Confidence classification for discovered people: how much an intelligence
//! record can be trusted, derived deterministically from its evidence.

mod classifier;

pub use classifier::{OVERRIDE_TAG_PREFIX, classify, org_domain, override_tier};
