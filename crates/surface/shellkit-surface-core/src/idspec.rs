//! Surface id specifications: `0,2-4,!3`.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::model::SurfaceId;

/// Widest inclusive range expanded from one token. Wider ranges are cut
/// down to their first `MAX_RANGE_SPAN` ids.
const MAX_RANGE_SPAN: i64 = 1 << 16;

/// Parsed id specification: inclusive ranges minus exclusive ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdSpec {
    inclusive: Vec<RangeInclusive<SurfaceId>>,
    exclusive: Vec<RangeInclusive<SurfaceId>>,
}

impl IdSpec {
    /// Parse a comma-separated list of ids and `lo-hi` ranges, each optionally
    /// prefixed with `!`. A range with `lo > hi` contributes nothing.
    ///
    /// Returns the offending token on failure.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut spec = IdSpec::default();
        for raw in s.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (include, body) = match token.strip_prefix('!') {
                Some(rest) => (false, rest.trim()),
                None => (true, token),
            };
            let range = match body.split_once('-') {
                Some((lo, hi)) if !lo.trim().is_empty() => {
                    let lo: SurfaceId = lo.trim().parse().map_err(|_| token.to_string())?;
                    let hi: SurfaceId = hi.trim().parse().map_err(|_| token.to_string())?;
                    if lo > hi {
                        continue;
                    }
                    lo..=hi
                }
                _ => {
                    let id: SurfaceId = body.parse().map_err(|_| token.to_string())?;
                    id..=id
                }
            };
            if include {
                spec.inclusive.push(clamp_span(range));
            } else {
                spec.exclusive.push(range);
            }
        }
        Ok(spec)
    }

    /// Effective ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        let ids: BTreeSet<SurfaceId> = self.inclusive.iter().cloned().flatten().collect();
        ids.into_iter().filter(move |id| !self.excludes(*id))
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.inclusive.iter().any(|r| r.contains(&id)) && !self.excludes(id)
    }

    fn excludes(&self, id: SurfaceId) -> bool {
        self.exclusive.iter().any(|r| r.contains(&id))
    }
}

fn clamp_span(range: RangeInclusive<SurfaceId>) -> RangeInclusive<SurfaceId> {
    let (lo, hi) = range.into_inner();
    if i64::from(hi) - i64::from(lo) < MAX_RANGE_SPAN {
        return lo..=hi;
    }
    let cut = i64::from(lo) + MAX_RANGE_SPAN - 1;
    let cut = SurfaceId::try_from(cut).unwrap_or(hi);
    log::warn!("surface range {lo}-{hi} is wider than {MAX_RANGE_SPAN} ids; using {lo}-{cut}");
    lo..=cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(s: &str) -> Vec<SurfaceId> {
        IdSpec::parse(s).expect("valid spec").ids().collect()
    }

    #[test]
    fn ranges_and_exclusions() {
        assert_eq!(ids("0,2-4,!3"), vec![0, 2, 4]);
    }

    #[test]
    fn exclusion_order_does_not_matter() {
        assert_eq!(ids("!3,0,2-4"), vec![0, 2, 4]);
        assert_eq!(ids("!1-2,0-3"), vec![0, 3]);
    }

    #[test]
    fn reversed_range_is_skipped() {
        assert_eq!(ids("5-3,7"), vec![7]);
    }

    #[test]
    fn whitespace_and_empty_tokens() {
        assert_eq!(ids(" 10 , 11-12 ,, "), vec![10, 11, 12]);
    }

    #[test]
    fn wide_ranges_are_cut_down() {
        let spec = IdSpec::parse("0-2000000000,!5-2000000000").expect("valid spec");
        assert_eq!(spec.ids().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        let spec = IdSpec::parse("0-2147483647").expect("valid spec");
        assert_eq!(spec.ids().count() as i64, MAX_RANGE_SPAN);
        assert!(spec.contains(65_535));
        assert!(!spec.contains(65_536));
    }

    #[test]
    fn membership_matches_expansion() {
        let spec = IdSpec::parse("0,2-4,!3").expect("valid spec");
        assert!(spec.contains(2));
        assert!(!spec.contains(3));
        assert!(!spec.contains(5));
    }

    #[test]
    fn garbage_is_reported() {
        assert_eq!(IdSpec::parse("1,x"), Err("x".to_string()));
        assert_eq!(IdSpec::parse("1-y"), Err("1-y".to_string()));
    }
}
