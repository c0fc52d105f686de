//! Version conflict resolution: one winner per identity.
//!
//! Policy: an explicit pin outranks every transitively discovered version,
//! regardless of numeric comparison. Two disagreeing pins are an error.
//! Without a pin, the highest requested version wins, constrained by any
//! requested ranges; a range with no requested exact inside it is pinned
//! from the repository's available-version listing.

use gavel_core::version::{Version, VersionSpec};
use gavel_maven::metadata::VersionListing;
use gavel_util::errors::GavelError;

/// One requested version for an identity, with its precedence and origin.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub spec: VersionSpec,
    /// Explicitly pinned at the classpath level.
    pub pinned: bool,
    /// Who asked for this version, for diagnostics.
    pub requested_by: String,
}

/// Pick the winning version for an identity from all requested candidates.
///
/// `available` is the repository version listing, consulted only when range
/// constraints cannot be satisfied by a requested exact version. The result
/// is deterministic for identical candidate sets.
pub fn select_version(
    identity: &str,
    candidates: &[Candidate],
    available: Option<&VersionListing>,
) -> Result<String, GavelError> {
    debug_assert!(!candidates.is_empty());

    // Pins first: they win outright, and they must agree.
    let mut pinned: Vec<(&Version, &Candidate)> = candidates
        .iter()
        .filter(|c| c.pinned)
        .filter_map(|c| c.spec.exact().map(|v| (v, c)))
        .collect();
    pinned.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.0.original.cmp(&b.0.original)));
    pinned.dedup_by(|a, b| a.0 == b.0);

    match pinned.len() {
        0 => {}
        1 => return Ok(pinned[0].0.original.clone()),
        _ => {
            let versions: Vec<String> = pinned
                .iter()
                .map(|(v, c)| format!("{} (from {})", v, c.requested_by))
                .collect();
            return Err(GavelError::UnresolvableConflict {
                identity: identity.to_string(),
                detail: format!("explicit pins disagree: {}", versions.join(" vs ")),
            });
        }
    }

    let ranges: Vec<&VersionSpec> = candidates
        .iter()
        .map(|c| &c.spec)
        .filter(|s| s.is_range())
        .collect();
    let satisfies_all = |v: &Version| ranges.iter().all(|r| r.matches(v));

    // Highest requested exact version that fits every range constraint.
    let winner = candidates
        .iter()
        .filter_map(|c| c.spec.exact())
        .filter(|v| satisfies_all(v))
        .max_by(|a, b| a.cmp(b).then_with(|| a.original.cmp(&b.original)));
    if let Some(v) = winner {
        return Ok(v.original.clone());
    }

    // No requested exact fits; pin the ranges from the available listing.
    if !ranges.is_empty() {
        if let Some(listing) = available {
            let best = listing
                .versions
                .iter()
                .map(|s| Version::parse(s))
                .filter(|v| satisfies_all(v))
                .max_by(|a, b| a.cmp(b).then_with(|| a.original.cmp(&b.original)));
            if let Some(v) = best {
                return Ok(v.original.clone());
            }
        }
    }

    let requested: Vec<String> = candidates
        .iter()
        .map(|c| format!("{} (from {})", c.spec, c.requested_by))
        .collect();
    Err(GavelError::UnresolvableConflict {
        identity: identity.to_string(),
        detail: format!(
            "no version satisfies every constraint: {}",
            requested.join(", ")
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(version: &str, pinned: bool) -> Candidate {
        Candidate {
            spec: VersionSpec::parse(version).unwrap(),
            pinned,
            requested_by: "test".to_string(),
        }
    }

    #[test]
    fn highest_version_wins() {
        let winner = select_version(
            "org.x:y",
            &[exact("1.7.0", false), exact("1.8.10", false)],
            None,
        )
        .unwrap();
        assert_eq!(winner, "1.8.10");
    }

    #[test]
    fn pin_beats_higher_transitive() {
        let winner = select_version(
            "org.x:y",
            &[exact("1.0", true), exact("2.0", false)],
            None,
        )
        .unwrap();
        assert_eq!(winner, "1.0");
    }

    #[test]
    fn agreeing_pins_are_fine() {
        let winner = select_version(
            "org.x:y",
            &[exact("1.8.10", true), exact("1.8.10", true), exact("1.7.0", false)],
            None,
        )
        .unwrap();
        assert_eq!(winner, "1.8.10");
    }

    #[test]
    fn disagreeing_pins_conflict() {
        let err = select_version("org.x:y", &[exact("1.0", true), exact("2.0", true)], None)
            .unwrap_err();
        assert!(err.to_string().contains("pins disagree"));
    }

    #[test]
    fn range_constrains_exact_candidates() {
        let winner = select_version(
            "org.x:y",
            &[
                exact("1.8.10", false),
                exact("2.0.0", false),
                exact("[1.8,1.9)", false),
            ],
            None,
        )
        .unwrap();
        // 2.0.0 is higher but violates the range
        assert_eq!(winner, "1.8.10");
    }

    #[test]
    fn range_alone_pins_from_listing() {
        let listing = VersionListing {
            versions: vec!["1.7.0".into(), "1.8.0".into(), "1.8.10".into(), "1.9.0".into()],
            ..Default::default()
        };
        let winner = select_version("org.x:y", &[exact("[1.8,1.9)", false)], Some(&listing))
            .unwrap();
        assert_eq!(winner, "1.8.10");
    }

    #[test]
    fn unsatisfiable_range_conflicts() {
        let err = select_version("org.x:y", &[exact("[3.0,4.0)", false)], None).unwrap_err();
        assert!(err.to_string().contains("org.x:y"));
    }

    #[test]
    fn selection_is_deterministic() {
        let candidates = [exact("1.1", false), exact("1.2", false), exact("1.0", false)];
        let a = select_version("org.x:y", &candidates, None).unwrap();
        let b = select_version("org.x:y", &candidates, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "1.2");
    }
}
