//! Zone rules derived from a parsed TZif file: offset queries by instant or
//! local time, and ambiguity/skip resolution policies for local-time
//! lookups near a transition.

use crate::calendar::{
    days_in_month, days_since_epoch, is_leap_year, Instant, LocalDateTime, OffsetDateTime, ZoneOffset,
};
use crate::tzif::{DayRule, ParsedTzif, TransitionRule};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("'{0}' is not a recognised regional time zone identifier")]
    InvalidRegionalTimeZone(String),
    #[error("ambiguous local time resolution failed: {0}")]
    AmbiguousTimeResolutionFailed(String),
    #[error("skipped local time resolution failed: {0}")]
    SkippedTimeResolutionFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguousLocalTime {
    Earliest,
    Latest,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippedBoundary {
    Start,
    End,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippedLocalTime {
    NextValid,
    PreviousValid,
    Boundary(SkippedBoundary),
    Reject,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolutionStrategy {
    pub ambiguous: AmbiguousLocalTime,
    pub skipped: SkippedLocalTime,
}

impl Default for ResolutionStrategy {
    fn default() -> Self {
        ResolutionStrategy {
            ambiguous: AmbiguousLocalTime::Earliest,
            skipped: SkippedLocalTime::NextValid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Gap,
    Overlap,
}

#[derive(Debug, Clone)]
pub struct ZoneTransition {
    pub instant: Instant,
    pub before: ZoneOffset,
    pub after: ZoneOffset,
    pub kind: TransitionKind,
    pub designation: String,
    pub is_dst: bool,
}

/// Local-time lookup result, mirroring the kernel's three-way resolution
/// outcome (§4.7).
#[derive(Debug, Clone)]
pub enum ValidOffsets {
    Normal(ZoneOffset),
    Ambiguous(ZoneOffset, ZoneOffset),
    Skipped {
        before: ZoneOffset,
        after: ZoneOffset,
        transition_instant_before: Instant,
        transition_instant_after: Instant,
    },
}

#[derive(Debug, Clone)]
pub enum ZoneRules {
    Fixed(ZoneOffset),
    Region(RegionZoneRules),
}

#[derive(Debug, Clone)]
pub struct RegionZoneRules {
    pub initial_offset: ZoneOffset,
    pub transitions: Vec<ZoneTransition>,
    pub tail_rule: Option<(crate::tzif::PosixTzRule)>,
}

impl ZoneRules {
    pub fn from_parsed(parsed: &ParsedTzif) -> Result<Self, Error> {
        if parsed.transitions.is_empty() {
            let offset = parsed
                .types
                .first()
                .map(|t| ZoneOffset::from_total_seconds(t.utoff).unwrap_or(ZoneOffset::UTC))
                .unwrap_or(ZoneOffset::UTC);
            return Ok(ZoneRules::Fixed(offset));
        }

        let mut transitions = Vec::with_capacity(parsed.transitions.len());
        let mut prev_offset = parsed
            .types
            .first()
            .map(|t| t.utoff)
            .unwrap_or(0);

        for (i, t) in parsed.transitions.iter().enumerate() {
            let ty = &parsed.types[t.type_index];
            let before = ZoneOffset::from_total_seconds(prev_offset).unwrap_or(ZoneOffset::UTC);
            let after = ZoneOffset::from_total_seconds(ty.utoff).unwrap_or(ZoneOffset::UTC);
            let kind = if ty.utoff > prev_offset {
                TransitionKind::Gap
            } else {
                TransitionKind::Overlap
            };
            let designation = parsed.designation(t.type_index).unwrap_or("").to_string();
            transitions.push(ZoneTransition {
                instant: Instant {
                    nanos_since_epoch: t.at as i128 * 1_000_000_000,
                },
                before,
                after,
                kind,
                designation,
                is_dst: ty.is_dst,
            });
            let _ = i;
            prev_offset = ty.utoff;
        }

        let initial_offset = transitions[0].before;

        Ok(ZoneRules::Region(RegionZoneRules {
            initial_offset,
            transitions,
            tail_rule: parsed.posix_rule.clone(),
        }))
    }

    pub fn offset_at(&self, instant: Instant) -> ZoneOffset {
        match self {
            ZoneRules::Fixed(o) => *o,
            ZoneRules::Region(r) => r.offset_at(instant),
        }
    }

    pub fn valid_offsets_for_local(&self, local: LocalDateTime) -> ValidOffsets {
        match self {
            ZoneRules::Fixed(o) => ValidOffsets::Normal(*o),
            ZoneRules::Region(r) => r.valid_offsets_for_local(local),
        }
    }

    /// The transition governing `local`, or `None` if no transition has
    /// happened yet (or the zone is fixed and has none at all).
    pub fn applicable_transition(&self, local: LocalDateTime) -> Option<&ZoneTransition> {
        match self {
            ZoneRules::Fixed(_) => None,
            ZoneRules::Region(r) => r.applicable_transition(local),
        }
    }

    /// The first transition strictly after `after`.
    pub fn next_transition(&self, after: Instant) -> Option<&ZoneTransition> {
        match self {
            ZoneRules::Fixed(_) => None,
            ZoneRules::Region(r) => r.next_transition(after),
        }
    }

    /// The last transition strictly before `before`.
    pub fn prior_transition(&self, before: Instant) -> Option<&ZoneTransition> {
        match self {
            ZoneRules::Fixed(_) => None,
            ZoneRules::Region(r) => r.prior_transition(before),
        }
    }

    /// The non-daylight-savings offset in effect at `at`. Equal to
    /// `offset_at` whenever the active transition isn't itself a daylight
    /// savings transition; zones never alternate between two daylight
    /// savings offsets back to back, so the offset recorded on the active
    /// transition's `before` side is standard whenever `after` is DST.
    pub fn standard_offset(&self, at: Instant) -> ZoneOffset {
        match self {
            ZoneRules::Fixed(o) => *o,
            ZoneRules::Region(r) => r.standard_offset(at),
        }
    }

    /// Whether `at` falls within a daylight savings transition's interval.
    pub fn is_daylight_savings_time(&self, at: Instant) -> bool {
        match self {
            ZoneRules::Fixed(_) => false,
            ZoneRules::Region(r) => r.is_daylight_savings_time(at),
        }
    }

    /// The abbreviation (e.g. `"PST"`, `"PDT"`) in effect at `at`.
    pub fn designation(&self, at: Instant) -> &str {
        match self {
            ZoneRules::Fixed(_) => "UTC",
            ZoneRules::Region(r) => r.designation(at),
        }
    }

    pub fn resolve(
        &self,
        local: LocalDateTime,
        strategy: ResolutionStrategy,
    ) -> Result<OffsetDateTime, Error> {
        match self.valid_offsets_for_local(local) {
            ValidOffsets::Normal(o) => Ok(OffsetDateTime { local, offset: o }),
            ValidOffsets::Ambiguous(earliest, latest) => match strategy.ambiguous {
                AmbiguousLocalTime::Earliest => Ok(OffsetDateTime { local, offset: earliest }),
                AmbiguousLocalTime::Latest => Ok(OffsetDateTime { local, offset: latest }),
                AmbiguousLocalTime::Reject => Err(Error::AmbiguousTimeResolutionFailed(format!(
                    "{local} is ambiguous between {earliest} and {latest}"
                ))),
            },
            ValidOffsets::Skipped {
                before,
                after,
                transition_instant_before,
                transition_instant_after,
            } => match strategy.skipped {
                SkippedLocalTime::NextValid => {
                    Ok(transition_instant_after.to_offset_date_time(after))
                }
                SkippedLocalTime::PreviousValid => {
                    Ok(transition_instant_before.to_offset_date_time(before))
                }
                SkippedLocalTime::Boundary(SkippedBoundary::Start) => {
                    Ok(transition_instant_before.to_offset_date_time(before))
                }
                SkippedLocalTime::Boundary(SkippedBoundary::End) => {
                    Ok(transition_instant_after.to_offset_date_time(after))
                }
                SkippedLocalTime::Boundary(SkippedBoundary::Nearest) => {
                    let wall = local.seconds_since_epoch();
                    let before_wall =
                        transition_instant_before.to_offset_date_time(before).local.seconds_since_epoch();
                    let after_wall =
                        transition_instant_after.to_offset_date_time(after).local.seconds_since_epoch();
                    if (wall - before_wall).abs() <= (after_wall - wall).abs() {
                        Ok(transition_instant_before.to_offset_date_time(before))
                    } else {
                        Ok(transition_instant_after.to_offset_date_time(after))
                    }
                }
                SkippedLocalTime::Reject => Err(Error::SkippedTimeResolutionFailed(format!(
                    "{local} falls in a skipped (spring-forward) interval"
                ))),
            },
        }
    }
}

impl RegionZoneRules {
    /// The transition most recently in effect at or before `instant`, or
    /// `None` if `instant` precedes the zone's first recorded transition
    /// (the caller falls back to `initial_offset`).
    fn transition_at_or_before(&self, instant: Instant) -> Option<&ZoneTransition> {
        match self.transitions.binary_search_by_key(&instant.nanos_since_epoch, |t| t.instant.nanos_since_epoch) {
            Ok(idx) => Some(&self.transitions[idx]),
            Err(0) => None,
            Err(idx) => Some(&self.transitions[idx - 1]),
        }
    }

    fn offset_at(&self, instant: Instant) -> ZoneOffset {
        self.transition_at_or_before(instant).map(|t| t.after).unwrap_or(self.initial_offset)
    }

    fn applicable_transition(&self, local: LocalDateTime) -> Option<&ZoneTransition> {
        let wall = local.seconds_since_epoch();
        let instant = Instant { nanos_since_epoch: (wall - self.offset_guess(wall)) as i128 * 1_000_000_000 };
        self.transition_at_or_before(instant)
    }

    fn next_transition(&self, after: Instant) -> Option<&ZoneTransition> {
        let idx = match self.transitions.binary_search_by_key(&after.nanos_since_epoch, |t| t.instant.nanos_since_epoch) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.transitions.get(idx)
    }

    fn prior_transition(&self, before: Instant) -> Option<&ZoneTransition> {
        let idx = match self.transitions.binary_search_by_key(&before.nanos_since_epoch, |t| t.instant.nanos_since_epoch) {
            Ok(idx) => idx,
            Err(idx) => idx,
        };
        idx.checked_sub(1).and_then(|i| self.transitions.get(i))
    }

    fn standard_offset(&self, at: Instant) -> ZoneOffset {
        match self.transition_at_or_before(at) {
            Some(t) if t.is_dst => t.before,
            Some(t) => t.after,
            None => self.initial_offset,
        }
    }

    fn is_daylight_savings_time(&self, at: Instant) -> bool {
        self.transition_at_or_before(at).map(|t| t.is_dst).unwrap_or(false)
    }

    fn designation(&self, at: Instant) -> &str {
        self.transition_at_or_before(at).map(|t| t.designation.as_str()).unwrap_or("")
    }

    fn valid_offsets_for_local(&self, local: LocalDateTime) -> ValidOffsets {
        let wall = local.seconds_since_epoch();

        for (i, t) in self.transitions.iter().enumerate() {
            let before_wall = (t.instant.nanos_since_epoch / 1_000_000_000) as i64 + t.before.total_seconds as i64;
            let after_wall = (t.instant.nanos_since_epoch / 1_000_000_000) as i64 + t.after.total_seconds as i64;

            match t.kind {
                TransitionKind::Gap => {
                    let (lo, hi) = (before_wall.min(after_wall), before_wall.max(after_wall));
                    if wall >= lo && wall < hi {
                        let prev_offset = if i == 0 { self.initial_offset } else { self.transitions[i - 1].after };
                        return ValidOffsets::Skipped {
                            before: prev_offset,
                            after: t.after,
                            transition_instant_before: Instant {
                                nanos_since_epoch: (t.instant.nanos_since_epoch / 1_000_000_000 - 1)
                                    * 1_000_000_000,
                            },
                            transition_instant_after: t.instant,
                        };
                    }
                }
                TransitionKind::Overlap => {
                    let (lo, hi) = (before_wall.min(after_wall), before_wall.max(after_wall));
                    if wall >= lo && wall < hi {
                        return ValidOffsets::Ambiguous(t.before, t.after);
                    }
                }
            }
        }

        let instant = Instant {
            nanos_since_epoch: (wall - self.offset_guess(wall)) as i128 * 1_000_000_000,
        };
        ValidOffsets::Normal(self.offset_at(instant))
    }

    fn offset_guess(&self, wall: i64) -> i64 {
        self.transitions
            .iter()
            .rev()
            .find(|t| (t.instant.nanos_since_epoch / 1_000_000_000) as i64 + t.after.total_seconds as i64 <= wall)
            .map(|t| t.after.total_seconds as i64)
            .unwrap_or(self.initial_offset.total_seconds as i64)
    }
}

/// Resolves a POSIX-TZ transition rule to the local-time instant (in
/// seconds since the Unix epoch, ignoring offset) it falls on in `year`.
pub fn resolve_transition_rule_to_days(rule: &TransitionRule, year: i64) -> i64 {
    match rule.day {
        DayRule::JulianNoLeap(n) => {
            let mut day = n as i64;
            if is_leap_year(year) && n >= 60 {
                day += 1;
            }
            days_since_epoch(year, 1, 1) + day - 1
        }
        DayRule::Julian(n) => days_since_epoch(year, 1, 1) + n as i64,
        DayRule::MonthWeekWeekday { month, week, weekday } => {
            let first_of_month = days_since_epoch(year, month as u32, 1);
            let first_weekday = (first_of_month.rem_euclid(7) + 4) % 7; // 1970-01-01 was Thursday (=4)
            let mut day = 1 + (weekday as i64 - first_weekday).rem_euclid(7);
            if week == 5 {
                let dim = days_in_month(year, month as u32) as i64;
                while day + 7 <= dim {
                    day += 7;
                }
            } else {
                day += (week as i64 - 1) * 7;
            }
            first_of_month + (day - 1)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::calendar::{LocalDate, LocalTime};

    #[test]
    fn test_fixed_zone_offset() {
        let rules = ZoneRules::Fixed(ZoneOffset::from_hms(-8, 0, 0).unwrap());
        let instant = Instant::EPOCH;
        assert_eq!(rules.offset_at(instant).total_seconds, -8 * 3600);
    }

    #[test]
    fn test_posix_rule_mwd_day_of_year() {
        // second Sunday of March 2024 is March 10.
        let rule = TransitionRule {
            day: DayRule::MonthWeekWeekday { month: 3, week: 2, weekday: 0 },
            time_seconds: 2 * 3600,
        };
        let days = resolve_transition_rule_to_days(&rule, 2024);
        let (y, m, d) = crate::calendar::local_date_from_days(days);
        assert_eq!((y, m, d), (2024, 3, 10));
    }

    #[test]
    fn test_region_transition_queries() {
        let pst = ZoneOffset::from_hms(-8, 0, 0).unwrap();
        let pdt = ZoneOffset::from_hms(-7, 0, 0).unwrap();
        let t1 = Instant { nanos_since_epoch: 1_000 * 1_000_000_000 };
        let t2 = Instant { nanos_since_epoch: 2_000 * 1_000_000_000 };
        let rules = ZoneRules::Region(RegionZoneRules {
            initial_offset: pst,
            transitions: vec![
                ZoneTransition { instant: t1, before: pst, after: pdt, kind: TransitionKind::Gap, designation: "PDT".to_string(), is_dst: true },
                ZoneTransition { instant: t2, before: pdt, after: pst, kind: TransitionKind::Overlap, designation: "PST".to_string(), is_dst: false },
            ],
            tail_rule: None,
        });

        let during_dst = Instant { nanos_since_epoch: 1_500 * 1_000_000_000 };
        assert_eq!(rules.offset_at(during_dst), pdt);
        assert!(rules.is_daylight_savings_time(during_dst));
        assert_eq!(rules.designation(during_dst), "PDT");
        assert_eq!(rules.standard_offset(during_dst), pst);

        assert_eq!(rules.next_transition(t1).unwrap().instant, t2);
        assert_eq!(rules.prior_transition(t2).unwrap().instant, t1);
        assert!(rules.next_transition(t2).is_none());
        assert!(rules.prior_transition(t1).is_none());

        let before_any = Instant { nanos_since_epoch: 0 };
        assert_eq!(rules.offset_at(before_any), pst);
        assert!(!rules.is_daylight_savings_time(before_any));
        assert_eq!(rules.standard_offset(before_any), pst);
    }

    #[test]
    fn test_region_rules_overlap_is_ambiguous() {
        let before = ZoneOffset::from_hms(-7, 0, 0).unwrap();
        let after = ZoneOffset::from_hms(-8, 0, 0).unwrap();
        // Fall-back transition at an arbitrary instant; before offset -7, after -8.
        let transition_instant = Instant { nanos_since_epoch: 1_730_617_200 * 1_000_000_000 };
        let rules = RegionZoneRules {
            initial_offset: before,
            transitions: vec![ZoneTransition {
                instant: transition_instant,
                before,
                after,
                kind: TransitionKind::Overlap,
                designation: "PST".to_string(),
                is_dst: false,
            }],
            tail_rule: None,
        };
        let local = LocalDateTime::new(
            LocalDate::new(2024, 11, 3).unwrap(),
            LocalTime::new(1, 30, 0, 0).unwrap(),
        );
        match rules.valid_offsets_for_local(local) {
            ValidOffsets::Ambiguous(a, b) => {
                assert_eq!(a, before);
                assert_eq!(b, after);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }
}
