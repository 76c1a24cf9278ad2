//! `ResolutionStrategy` decides what `ZoneRules::resolve` returns for a local
//! time that a DST transition makes ambiguous (fall-back, ocurring twice) or
//! skipped (spring-forward, never occurring at all). This demo builds a
//! two-transition `RegionZoneRules` by hand instead of loading a zone file,
//! modelled on the America/Los_Angeles 2024 transitions.

use solid_temporal::calendar::{Instant, LocalDate, LocalDateTime, LocalTime, ZoneOffset};
use solid_temporal::zone::{
    AmbiguousLocalTime, RegionZoneRules, ResolutionStrategy, SkippedLocalTime, TransitionKind, ZoneRules,
    ZoneTransition,
};

fn main() {
    let pst = ZoneOffset::from_hms(-8, 0, 0).unwrap();
    let pdt = ZoneOffset::from_hms(-7, 0, 0).unwrap();
    let rules = ZoneRules::Region(RegionZoneRules {
        initial_offset: pst,
        transitions: vec![
            ZoneTransition {
                instant: Instant { nanos_since_epoch: 1_710_064_800 * 1_000_000_000 },
                before: pst,
                after: pdt,
                kind: TransitionKind::Gap,
                designation: "PDT".into(),
                is_dst: true,
            },
            ZoneTransition {
                instant: Instant { nanos_since_epoch: 1_730_620_800 * 1_000_000_000 },
                before: pdt,
                after: pst,
                kind: TransitionKind::Overlap,
                designation: "PST".into(),
                is_dst: false,
            },
        ],
        tail_rule: None,
    });

    let skipped_local = LocalDateTime::new(LocalDate::new(2024, 3, 10).unwrap(), LocalTime::new(2, 30, 0, 0).unwrap());
    for skipped in [SkippedLocalTime::NextValid, SkippedLocalTime::PreviousValid, SkippedLocalTime::Reject] {
        let strategy = ResolutionStrategy { skipped, ..ResolutionStrategy::default() };
        println!("skipped={skipped:?}: {:?}", rules.resolve(skipped_local, strategy).map(|odt| odt.to_string()));
    }

    let ambiguous_local =
        LocalDateTime::new(LocalDate::new(2024, 11, 3).unwrap(), LocalTime::new(1, 30, 0, 0).unwrap());
    for ambiguous in [AmbiguousLocalTime::Earliest, AmbiguousLocalTime::Latest, AmbiguousLocalTime::Reject] {
        let strategy = ResolutionStrategy { ambiguous, ..ResolutionStrategy::default() };
        println!("ambiguous={ambiguous:?}: {:?}", rules.resolve(ambiguous_local, strategy).map(|odt| odt.to_string()));
    }
}
