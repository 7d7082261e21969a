//! Confidence classification for discovered people
//!
//! Pure and deterministic: the same evidence always yields the same tier.
//! The computed tier is advisory - a `confidence-override:<tier>` tag set by
//! an operator always wins.
//!
//! Tiers:
//! - **high**: at least one corroborating social profile (real handle with a
//!   visible audience) AND a professional email on the org domain
//! - **medium**: exactly one evidence signal, short of the high bar
//!   (a profile without verification, or a generic email)
//! - **low**: otherwise

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engagement::models::{ConfidenceTier, Person, SocialProfile};

/// Tag prefix that pins a person's tier regardless of evidence
pub const OVERRIDE_TAG_PREFIX: &str = "confidence-override:";

/// `first.last@domain` shape: letters with dot/underscore/dash separators
static PRO_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]+(?:[._-][a-z]+)*@([a-z0-9][a-z0-9.-]*\.[a-z]{2,})$")
        .expect("email pattern must compile")
});

/// First domain-looking token inside a target descriptor
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)+").expect("domain pattern must compile")
});

/// Classify a person against the engagement's org domain.
///
/// Checks for an operator override tag first, then falls back to the
/// computed tier.
pub fn classify(person: &Person, org_domain: &str) -> ConfidenceTier {
    if let Some(tier) = override_tier(person) {
        return tier;
    }
    computed_tier(person, org_domain)
}

/// The tier pinned by an override tag, if any. The last override wins.
pub fn override_tier(person: &Person) -> Option<ConfidenceTier> {
    person.tags.iter().rev().find_map(|tag| {
        tag.strip_prefix(OVERRIDE_TAG_PREFIX)
            .and_then(ConfidenceTier::from_str)
    })
}

/// Extract the organization domain from a project target descriptor.
///
/// Handles bare domains ("megacorp.io"), wildcards ("*.megacorp.io"), and
/// prose descriptors ("MegaCorp Inc (megacorp.io)"). Empty when no domain
/// is present.
pub fn org_domain(target: &str) -> String {
    let target = target.trim().to_lowercase();
    DOMAIN_RE
        .find(&target)
        .map(|m| m.as_str().trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

fn computed_tier(person: &Person, org_domain: &str) -> ConfidenceTier {
    let verified_profile = person.social_profiles.iter().any(SocialProfile::is_verifiable);
    let org_email = person
        .email
        .as_deref()
        .is_some_and(|e| is_professional_org_email(e, org_domain));

    if verified_profile && org_email {
        return ConfidenceTier::High;
    }

    // One lone signal reads as medium; anything more that still misses the
    // high bar means the evidence disagrees with itself.
    let signals =
        usize::from(!person.social_profiles.is_empty()) + usize::from(person.email.is_some());
    if signals == 1 {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

fn is_professional_org_email(email: &str, org_domain: &str) -> bool {
    if org_domain.is_empty() {
        return false;
    }
    let email = email.trim().to_lowercase();
    PRO_EMAIL_RE
        .captures(&email)
        .is_some_and(|caps| &caps[1] == org_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::models::SocialPlatform;

    fn base_person() -> Person {
        Person::new("per-1", "p1", "Sarah Chen")
    }

    fn linkedin(audience: u32) -> SocialProfile {
        SocialProfile::new(SocialPlatform::LinkedIn, "sarahchen", audience)
    }

    #[test]
    fn test_high_needs_profile_and_org_email() {
        let person = base_person()
            .with_email("sarah.chen@megacorp.io")
            .with_profile(linkedin(1200));
        assert_eq!(classify(&person, "megacorp.io"), ConfidenceTier::High);
    }

    #[test]
    fn test_single_weak_signal_is_medium() {
        // Profile without verification, nothing else
        let person = base_person().with_profile(SocialProfile::new(
            SocialPlatform::Twitter,
            "schen",
            0,
        ));
        assert_eq!(classify(&person, "megacorp.io"), ConfidenceTier::Medium);

        // Generic email, nothing else
        let person = base_person().with_email("schen1988@gmail.com");
        assert_eq!(classify(&person, "megacorp.io"), ConfidenceTier::Medium);
    }

    #[test]
    fn test_conflicting_evidence_is_low() {
        // Two signals that still miss the high bar
        let person = base_person()
            .with_email("schen1988@gmail.com")
            .with_profile(linkedin(0));
        assert_eq!(classify(&person, "megacorp.io"), ConfidenceTier::Low);
    }

    #[test]
    fn test_no_evidence_is_low() {
        assert_eq!(classify(&base_person(), "megacorp.io"), ConfidenceTier::Low);
    }

    #[test]
    fn test_override_tag_wins() {
        let person = base_person()
            .with_email("sarah.chen@megacorp.io")
            .with_profile(linkedin(1200))
            .with_tag("confidence-override:low");
        assert_eq!(classify(&person, "megacorp.io"), ConfidenceTier::Low);
        assert_eq!(override_tier(&person), Some(ConfidenceTier::Low));
    }

    #[test]
    fn test_last_override_wins() {
        let person = base_person()
            .with_tag("confidence-override:high")
            .with_tag("confidence-override:medium");
        assert_eq!(classify(&person, ""), ConfidenceTier::Medium);
    }

    #[test]
    fn test_idempotent() {
        let person = base_person()
            .with_email("sarah.chen@megacorp.io")
            .with_profile(linkedin(1200));
        let first = classify(&person, "megacorp.io");
        for _ in 0..5 {
            assert_eq!(classify(&person, "megacorp.io"), first);
        }
    }

    #[test]
    fn test_org_email_shape() {
        assert!(is_professional_org_email("sarah.chen@megacorp.io", "megacorp.io"));
        assert!(is_professional_org_email("SCHEN@MEGACORP.IO", "megacorp.io"));
        // Wrong domain
        assert!(!is_professional_org_email("sarah.chen@gmail.com", "megacorp.io"));
        // Digits make it a handle, not a professional pattern
        assert!(!is_professional_org_email("schen1988@megacorp.io", "megacorp.io"));
        assert!(!is_professional_org_email("sarah.chen@megacorp.io", ""));
    }

    #[test]
    fn test_org_domain_extraction() {
        assert_eq!(org_domain("megacorp.io"), "megacorp.io");
        assert_eq!(org_domain("*.megacorp.io"), "megacorp.io");
        assert_eq!(org_domain("MegaCorp Inc (megacorp.io)"), "megacorp.io");
        assert_eq!(org_domain("www.megacorp.io"), "megacorp.io");
        assert_eq!(org_domain("internal network"), "");
    }
}
