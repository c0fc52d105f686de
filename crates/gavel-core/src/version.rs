//! Maven version ordering, range expressions, and version specs.
//!
//! Maven ordering differs from semver: versions split on `.` and `-`,
//! numeric segments compare as numbers, and known string qualifiers have
//! their own ordering (`alpha` < `beta` < `milestone` < `rc` < `snapshot`
//! < release < `sp`). A `-SNAPSHOT` sorts before its release equivalent.

use std::cmp::Ordering;
use std::fmt;

use gavel_util::errors::GavelError;

/// A parsed version with Maven-comparable segments.
#[derive(Debug, Clone)]
pub struct Version {
    pub original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

// Trailing segments compare against "empty", so 1.0 == 1.0.0 and
// 1.0-alpha < 1.0.
fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(s) if s.is_empty() => Ordering::Equal,
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), Segment::Qualifier(_)) => Ordering::Greater,
        (Segment::Qualifier(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= QualifierKind::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= QualifierKind::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if ch == '.' || ch == '-' {
            if !current.is_empty() {
                segments.push(classify(&current));
                current.clear();
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        segments.push(classify(&current));
    }

    segments
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "" | "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

/// A Maven version range expression.
///
/// Supports `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, and `[1.0]` (exact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub original: String,
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a range string. Returns `Ok(None)` for bare versions; a string
    /// that opens a bracket but is not a well-formed range is an error, never
    /// a silent reinterpretation.
    pub fn parse(spec: &str) -> Result<Option<Self>, GavelError> {
        let s = spec.trim();
        if !s.starts_with('[') && !s.starts_with('(') {
            return Ok(None);
        }

        let malformed = |reason: &str| GavelError::MalformedCoordinate {
            input: spec.to_string(),
            reason: reason.to_string(),
        };
        if s.len() < 3 || !(s.ends_with(']') || s.ends_with(')')) {
            return Err(malformed("unterminated version range"));
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        let (lower, upper) = match inner.split_once(',') {
            Some((lo, hi)) => {
                let lo = lo.trim();
                let hi = hi.trim();
                if lo.is_empty() && hi.is_empty() {
                    return Err(malformed("version range has no bounds"));
                }
                (
                    (!lo.is_empty()).then(|| Bound {
                        version: Version::parse(lo),
                        inclusive: open_inclusive,
                    }),
                    (!hi.is_empty()).then(|| Bound {
                        version: Version::parse(hi),
                        inclusive: close_inclusive,
                    }),
                )
            }
            None => {
                // [1.0] pins exactly 1.0
                if !open_inclusive || !close_inclusive {
                    return Err(malformed(
                        "single-version range must use inclusive brackets",
                    ));
                }
                let v = Version::parse(inner.trim());
                (
                    Some(Bound {
                        version: v.clone(),
                        inclusive: true,
                    }),
                    Some(Bound {
                        version: v,
                        inclusive: true,
                    }),
                )
            }
        };

        Ok(Some(Self {
            original: s.to_string(),
            lower,
            upper,
        }))
    }

    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// A declared version requirement: either an exact version or a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Exact(Version),
    Range(VersionRange),
}

impl VersionSpec {
    /// Classify a raw version string as a range or an exact version.
    pub fn parse(spec: &str) -> Result<Self, GavelError> {
        match VersionRange::parse(spec)? {
            Some(range) => Ok(Self::Range(range)),
            None => Ok(Self::Exact(Version::parse(spec))),
        }
    }

    /// The exact version, when this spec is not a range.
    pub fn exact(&self) -> Option<&Version> {
        match self {
            Self::Exact(v) => Some(v),
            Self::Range(_) => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(_))
    }

    /// Whether a concrete version satisfies this spec.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(v) => v == version,
            Self::Range(r) => r.contains(version),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => v.fmt(f),
            Self::Range(r) => r.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ordering() {
        assert!(Version::parse("1.7.0") < Version::parse("1.8.10"));
        assert!(Version::parse("8.1.0") > Version::parse("8.0.2"));
        assert!(Version::parse("10.0") > Version::parse("9.0"));
    }

    #[test]
    fn qualifier_ordering() {
        let alpha = Version::parse("1.0-alpha");
        let beta = Version::parse("1.0-beta");
        let milestone = Version::parse("1.0-milestone");
        let rc = Version::parse("1.0-rc");
        let release = Version::parse("1.0");
        let sp = Version::parse("1.0-sp");

        assert!(alpha < beta);
        assert!(beta < milestone);
        assert!(milestone < rc);
        assert!(rc < release);
        assert!(release < sp);
    }

    #[test]
    fn snapshot_sorts_before_release() {
        assert!(Version::parse("1.0-SNAPSHOT") < Version::parse("1.0"));
        assert!(Version::parse("1.0-SNAPSHOT").is_snapshot());
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(Version::parse("1.0"), Version::parse("1.0.0"));
    }

    #[test]
    fn text_qualifier_below_release() {
        // 1.0.0-jre < 1.0.0 (unknown text qualifiers sort below release)
        assert!(Version::parse("1.0.0-jre") < Version::parse("1.0.0"));
        assert!(Version::parse("31.0-jre") < Version::parse("32.0-jre"));
    }

    #[test]
    fn range_inclusive_bounds() {
        let r = VersionRange::parse("[1.0,2.0]").unwrap().unwrap();
        assert!(r.contains(&Version::parse("1.0")));
        assert!(r.contains(&Version::parse("2.0")));
        assert!(!r.contains(&Version::parse("2.0.1")));
    }

    #[test]
    fn range_exclusive_upper() {
        let r = VersionRange::parse("[1.0,2.0)").unwrap().unwrap();
        assert!(r.contains(&Version::parse("1.9.9")));
        assert!(!r.contains(&Version::parse("2.0")));
    }

    #[test]
    fn range_open_lower() {
        let r = VersionRange::parse("(,2.0)").unwrap().unwrap();
        assert!(r.contains(&Version::parse("0.1")));
        assert!(!r.contains(&Version::parse("2.0")));
    }

    #[test]
    fn range_exact_pin() {
        let r = VersionRange::parse("[1.5]").unwrap().unwrap();
        assert!(r.contains(&Version::parse("1.5")));
        assert!(!r.contains(&Version::parse("1.6")));
    }

    #[test]
    fn spec_classification() {
        assert!(!VersionSpec::parse("8.1.0").unwrap().is_range());
        assert!(VersionSpec::parse("[8.0,9.0)").unwrap().is_range());
        assert_eq!(
            VersionSpec::parse("8.1.0").unwrap().exact().unwrap(),
            &Version::parse("8.1.0")
        );
    }

    #[test]
    fn spec_matching() {
        let spec = VersionSpec::parse("[1.8,1.9)").unwrap();
        assert!(spec.matches(&Version::parse("1.8.10")));
        assert!(!spec.matches(&Version::parse("1.9.0")));
    }

    #[test]
    fn malformed_ranges_are_errors_not_panics() {
        for garbage in ["[", "(", "[]", "[1.0", "(1.0", "(,)", "[ , ]", "(1.0)"] {
            assert!(
                VersionRange::parse(garbage).is_err(),
                "{garbage:?} should be rejected"
            );
            assert!(VersionSpec::parse(garbage).is_err());
        }
    }

    #[test]
    fn bracket_start_never_reparses_as_exact() {
        // An opening bracket commits the string to range syntax.
        let err = VersionSpec::parse("[1.0").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }
}
