//! Server version ordering and the version gate
//!
//! The server advertises a dotted, date-coded version string such as
//! `2020.09.25.13`. Comparison is segment-wise and numeric, never
//! lexicographic: `2020.9.1` sorts before `2020.10.1`. Several
//! operations changed request shape at known versions; [`select`] picks
//! one of two behaviors per call against that order.

use std::cmp::Ordering;
use std::fmt;

/// Oldest server this client supports.
pub const MIN_SERVER_VERSION: &str = "2019.02.20.00";

/// Services became a top-level filterable collection.
pub(crate) const SERVICE_ROOT_SINCE: &str = "2020.09.25.13";
/// Components became a top-level collection.
pub(crate) const COMPONENT_ROOT_SINCE: &str = "2021.03.12.16";
/// Tasks started reporting the owning object type and id.
pub(crate) const TASK_ACTION_SINCE: &str = "2020.08.27.00";
/// Actions accept the `verbose` run argument.
pub(crate) const ACTION_VERBOSE_SINCE: &str = "2021.02.04.13";
/// Services can be removed from a cluster.
pub(crate) const SERVICE_DELETE_SINCE: &str = "2020.05.13.00";

/// A server version string with the service's total order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(v: impl Into<String>) -> Self {
        Version(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(v: &str) -> Self {
        Version(v.to_string())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.0, &other.0)
    }
}

/// One alphanumeric run of a version string. Numeric runs keep their
/// zero-stripped digits as text so no length limit applies.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Number(&'a str),
    Alpha(&'a str),
}

/// Split a version string into alternating numeric and alphabetic runs,
/// skipping separators.
fn segments(v: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let bytes = v.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            // Leading zeros are insignificant: "09" == "9".
            out.push(Segment::Number(v[start..i].trim_start_matches('0')));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            out.push(Segment::Alpha(&v[start..i]));
        } else {
            i += 1;
        }
    }
    out
}

/// Compare two version strings under the service's total order.
///
/// Numeric runs compare numerically, alphabetic runs lexically, and a
/// numeric run outranks an alphabetic one in the same position. When one
/// string is a prefix of the other, the longer one is newer.
pub fn compare(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);
    for pair in sa.iter().zip(sb.iter()) {
        let ord = match pair {
            // Stripped digit runs: a longer run is a larger number,
            // equal lengths compare digit by digit.
            (Segment::Number(x), Segment::Number(y)) => {
                x.len().cmp(&y.len()).then_with(|| x.cmp(y))
            }
            (Segment::Alpha(x), Segment::Alpha(y)) => x.cmp(y),
            (Segment::Number(_), Segment::Alpha(_)) => Ordering::Greater,
            (Segment::Alpha(_), Segment::Number(_)) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    sa.len().cmp(&sb.len())
}

/// The version gate: pick `modern` unless the server predates
/// `threshold`. Evaluated once per operation call; the choice is a pure
/// function of the compared pair.
pub fn select<T>(server: &Version, threshold: &str, modern: T, legacy: T) -> T {
    if compare(server.as_str(), threshold) == Ordering::Less {
        legacy
    } else {
        modern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(compare("2020.9.1", "2020.10.1"), Ordering::Less);
        assert_eq!(compare("2020.09.25.13", "2020.9.25.13"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_runs_beyond_u64() {
        // 2^64 and its neighbors order correctly.
        assert_eq!(
            compare("1.18446744073709551615", "1.18446744073709551616"),
            Ordering::Less
        );
        assert_eq!(
            compare("1.100000000000000000000", "1.99999999999999999999"),
            Ordering::Greater
        );
        assert_eq!(compare("1.000", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_prefix_is_older() {
        assert_eq!(compare("2020.09.25", "2020.09.25.13"), Ordering::Less);
        assert_eq!(compare("2020.09.25.13", "2020.09.25"), Ordering::Greater);
    }

    #[test]
    fn test_alpha_segments() {
        assert_eq!(compare("1.0a", "1.0b"), Ordering::Less);
        // Digits outrank letters in the same position.
        assert_eq!(compare("1.1", "1.a"), Ordering::Greater);
    }

    #[test]
    fn test_select_is_pure() {
        let server = Version::new("2020.09.25.12");
        assert_eq!(select(&server, SERVICE_ROOT_SINCE, "new", "old"), "old");
        assert_eq!(select(&server, SERVICE_ROOT_SINCE, "new", "old"), "old");
        let server = Version::new("2020.09.25.13");
        assert_eq!(select(&server, SERVICE_ROOT_SINCE, "new", "old"), "new");
    }

    #[test]
    fn test_version_ord() {
        let mut versions = vec![
            Version::new("2021.03.12.16"),
            Version::new("2019.02.20.00"),
            Version::new("2020.09.25.13"),
        ];
        versions.sort();
        assert_eq!(versions[0].as_str(), "2019.02.20.00");
        assert_eq!(versions[2].as_str(), "2021.03.12.16");
    }
}
