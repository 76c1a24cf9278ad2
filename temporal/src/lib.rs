//! Arbitrary-precision decimals, a proleptic Gregorian calendar kernel, and a
//! TZif v1-v4 parser with zone-rule resolution for ambiguous and skipped
//! local times.

pub mod bigint;
pub mod calendar;
pub mod decimal;
pub mod tzdb;
pub mod tzif;
pub mod zone;

pub use bigint::BigInt;
pub use calendar::{
    CalendarError, Duration, Instant, LocalDate, LocalDateTime, LocalTime, OffsetDateTime,
    Period, ZoneOffset, ZonedDateTime,
};
pub use decimal::{BigDecimal, RoundingContext, RoundingDirection};
pub use tzdb::TzDb;
pub use zone::{AmbiguousLocalTime, ResolutionStrategy, SkippedLocalTime, ZoneRules};
