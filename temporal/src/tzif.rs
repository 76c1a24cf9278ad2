//! TZif v1-v4 parser, per RFC 9636.

use thiserror::Error;

pub const MAX_TRANSITIONS: usize = 200_000;
pub const MAX_TYPES: usize = 255;
pub const MAX_DESIGNATION_BYTES: usize = 16_384;
pub const MAX_LEAP_SECONDS: usize = 2_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("bad magic bytes, expected 'TZif'")]
    MagicMismatch,
    #[error("unsupported file version byte: {0:?}")]
    UnsupportedFileVersion(u8),
    #[error("truncated or malformed TZif body")]
    InvalidLength,
    #[error("malformed POSIX-TZ footer")]
    InvalidFooter,
    #[error("malformed POSIX-TZ rule string: {0}")]
    InvalidPosixTz(String),
    #[error("invalid designation string")]
    InvalidDesignation,
    #[error("leap second does not fall on the last second of a UTC month")]
    InvalidLeapSecond,
    #[error("zone file declares no transitions")]
    NoTransitions,
    #[error("time type index {0} is out of bounds")]
    TypeIndexOutOfBounds(u8),
    #[error("a record marked UT must also be marked standard")]
    WallStdUniversalDisagreement,
    #[error("transitions are not strictly ordered")]
    TransitionsNotOrdered,
    #[error("missing standard time information")]
    MissingStandardTime,
    #[error("missing version 2+ header/data block")]
    MissingVersionData,
    #[error("header count exceeds implementation limits: {0}")]
    FieldLimitExceeded(&'static str),
    #[error("std/wall or UT/local indicator count disagrees with type count")]
    StdOrUniversalCountMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeType {
    pub utoff: i32,
    pub is_dst: bool,
    pub designation_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub at: i64,
    pub type_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeapSecond {
    pub occurs_at: i64,
    pub correction: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRule {
    /// `Jn`: Julian day 1-365, never counting Feb 29.
    JulianNoLeap(u16),
    /// `n`: zero-based day of year, 0-365, counting Feb 29.
    Julian(u16),
    /// `Mm.w.d`: week `w` (1-5, 5 = last), weekday `d` (0=Sunday) of month `m`.
    MonthWeekWeekday { month: u8, week: u8, weekday: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRule {
    pub day: DayRule,
    /// Local wall-clock seconds at which the transition occurs. Default 02:00:00.
    pub time_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstRule {
    pub designation: String,
    pub offset_seconds: i32,
    pub start: TransitionRule,
    pub end: TransitionRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixTzRule {
    pub std_designation: String,
    pub std_offset_seconds: i32,
    pub dst: Option<DstRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTzif {
    pub version: u8,
    pub types: Vec<TimeType>,
    pub transitions: Vec<Transition>,
    pub designations: Vec<String>,
    pub leap_seconds: Vec<LeapSecond>,
    pub posix_rule: Option<PosixTzRule>,
}

impl ParsedTzif {
    pub fn designation(&self, type_index: usize) -> Result<&str, Error> {
        self.types
            .get(type_index)
            .and_then(|t| self.designations.get(t.designation_index as usize))
            .map(|s| s.as_str())
            .ok_or(Error::TypeIndexOutOfBounds(type_index as u8))
    }
}

struct Header {
    version: u8,
    isutcnt: usize,
    isstdcnt: usize,
    leapcnt: usize,
    timecnt: usize,
    typecnt: usize,
    charcnt: usize,
}

fn read_be_u32(buf: &[u8], at: usize) -> Result<u32, Error> {
    let bytes: [u8; 4] = buf.get(at..at + 4).ok_or(Error::InvalidLength)?.try_into().unwrap();
    Ok(u32::from_be_bytes(bytes))
}

fn read_be_i32(buf: &[u8], at: usize) -> Result<i32, Error> {
    read_be_u32(buf, at).map(|v| v as i32)
}

fn read_be_i64(buf: &[u8], at: usize) -> Result<i64, Error> {
    let bytes: [u8; 8] = buf.get(at..at + 8).ok_or(Error::InvalidLength)?.try_into().unwrap();
    Ok(i64::from_be_bytes(bytes))
}

fn parse_header(buf: &[u8], at: usize) -> Result<Header, Error> {
    if buf.len() < at + 44 {
        return Err(Error::InvalidLength);
    }
    if &buf[at..at + 4] != b"TZif" {
        return Err(Error::MagicMismatch);
    }
    let version_byte = buf[at + 4];
    let version = match version_byte {
        0 => 1,
        b'2' => 2,
        b'3' => 3,
        b'4' => 4,
        other => return Err(Error::UnsupportedFileVersion(other)),
    };
    // 15 reserved bytes at at+5..at+20.
    let isutcnt = read_be_u32(buf, at + 20)? as usize;
    let isstdcnt = read_be_u32(buf, at + 24)? as usize;
    let leapcnt = read_be_u32(buf, at + 28)? as usize;
    let timecnt = read_be_u32(buf, at + 32)? as usize;
    let typecnt = read_be_u32(buf, at + 36)? as usize;
    let charcnt = read_be_u32(buf, at + 40)? as usize;

    if timecnt > MAX_TRANSITIONS {
        return Err(Error::FieldLimitExceeded("timecnt"));
    }
    if typecnt > MAX_TYPES || typecnt == 0 {
        return Err(Error::FieldLimitExceeded("typecnt"));
    }
    if charcnt > MAX_DESIGNATION_BYTES {
        return Err(Error::FieldLimitExceeded("charcnt"));
    }
    if leapcnt > MAX_LEAP_SECONDS {
        return Err(Error::FieldLimitExceeded("leapcnt"));
    }
    if isstdcnt != 0 && isstdcnt != typecnt {
        return Err(Error::StdOrUniversalCountMismatch);
    }
    if isutcnt != 0 && isutcnt != typecnt {
        return Err(Error::StdOrUniversalCountMismatch);
    }

    Ok(Header {
        version,
        isutcnt,
        isstdcnt,
        leapcnt,
        timecnt,
        typecnt,
        charcnt,
    })
}

/// Parses one data block (the body following a header), using 4-byte
/// transition timestamps for v1 and 8-byte timestamps for v2+.
fn parse_block(buf: &[u8], start: usize, header: &Header, wide_time: bool) -> Result<(ParsedTzif, usize), Error> {
    let mut at = start;
    let time_width = if wide_time { 8 } else { 4 };

    let mut raw_transition_times = Vec::with_capacity(header.timecnt);
    for i in 0..header.timecnt {
        let t = if wide_time {
            read_be_i64(buf, at + i * 8)?
        } else {
            read_be_i32(buf, at + i * 4)? as i64
        };
        raw_transition_times.push(t);
    }
    at += header.timecnt * time_width;

    if raw_transition_times.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::TransitionsNotOrdered);
    }

    let mut transition_types = Vec::with_capacity(header.timecnt);
    for i in 0..header.timecnt {
        let idx = *buf.get(at + i).ok_or(Error::InvalidLength)?;
        if idx as usize >= header.typecnt {
            return Err(Error::TypeIndexOutOfBounds(idx));
        }
        transition_types.push(idx as usize);
    }
    at += header.timecnt;

    let mut raw_types = Vec::with_capacity(header.typecnt);
    for _ in 0..header.typecnt {
        let utoff = read_be_i32(buf, at)?;
        if utoff.unsigned_abs() > 26 * 3600 {
            return Err(Error::InvalidLength);
        }
        let is_dst = match buf.get(at + 4) {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(Error::InvalidLength),
        };
        let designation_index = *buf.get(at + 5).ok_or(Error::InvalidLength)?;
        raw_types.push(TimeType {
            utoff,
            is_dst,
            designation_index,
        });
        at += 6;
    }

    let charbuf = buf.get(at..at + header.charcnt).ok_or(Error::InvalidLength)?;
    at += header.charcnt;
    let designations = extract_designations(charbuf, &raw_types)?;
    // Remap designation_index from a byte offset into charbuf to an index
    // into `designations` (index-addressed, not sequentially scanned).
    let types: Vec<TimeType> = raw_types
        .iter()
        .enumerate()
        .map(|(i, t)| TimeType {
            utoff: t.utoff,
            is_dst: t.is_dst,
            designation_index: i as u8,
        })
        .collect();

    let leap_width = if wide_time { 12 } else { 8 };
    let mut leap_seconds = Vec::with_capacity(header.leapcnt);
    for i in 0..header.leapcnt {
        let base = at + i * leap_width;
        let occurs_at = if wide_time {
            read_be_i64(buf, base)?
        } else {
            read_be_i32(buf, base)? as i64
        };
        let correction = read_be_i32(buf, base + if wide_time { 8 } else { 4 })?;
        leap_seconds.push(LeapSecond { occurs_at, correction });
    }
    at += header.leapcnt * leap_width;

    let std_wall = read_bool_array(buf, at, header.isstdcnt)?;
    at += header.isstdcnt;
    let ut_local = read_bool_array(buf, at, header.isutcnt)?;
    at += header.isutcnt;

    for (i, is_ut) in ut_local.iter().enumerate() {
        if *is_ut && !std_wall.get(i).copied().unwrap_or(false) {
            return Err(Error::WallStdUniversalDisagreement);
        }
    }

    for leap in &leap_seconds {
        let days = leap.occurs_at.div_euclid(86_400);
        let secs_of_day = leap.occurs_at.rem_euclid(86_400);
        let (year, month, _) = crate::calendar::local_date_from_days(days);
        let last_day = crate::calendar::days_in_month(year, month);
        let (_, _, day) = crate::calendar::local_date_from_days(days);
        if secs_of_day != 86_399 || day != last_day {
            return Err(Error::InvalidLeapSecond);
        }
    }

    let transitions = raw_transition_times
        .into_iter()
        .zip(transition_types)
        .map(|(at, type_index)| Transition { at, type_index })
        .collect();

    Ok((
        ParsedTzif {
            version: header.version,
            types,
            transitions,
            designations,
            leap_seconds,
            posix_rule: None,
        },
        at,
    ))
}

fn read_bool_array(buf: &[u8], at: usize, n: usize) -> Result<Vec<bool>, Error> {
    let slice = buf.get(at..at + n).ok_or(Error::InvalidLength)?;
    Ok(slice.iter().map(|b| *b != 0).collect())
}

fn extract_designations(charbuf: &[u8], types: &[TimeType]) -> Result<Vec<String>, Error> {
    let mut out = Vec::with_capacity(types.len());
    for t in types {
        let start = t.designation_index as usize;
        let end = charbuf[start..]
            .iter()
            .position(|b| *b == 0)
            .map(|p| start + p)
            .ok_or(Error::InvalidDesignation)?;
        let name = std::str::from_utf8(&charbuf[start..end]).map_err(|_| Error::InvalidDesignation)?;
        if name.is_empty() {
            return Err(Error::InvalidDesignation);
        }
        out.push(name.to_string());
    }
    Ok(out)
}

/// Parses a complete TZif file, selecting the widest available data block
/// (v2+'s 64-bit block over v1's 32-bit block) and its POSIX-TZ footer.
pub fn parse(buf: &[u8]) -> Result<ParsedTzif, Error> {
    let v1_header = parse_header(buf, 0)?;
    let (v1_parsed, after_v1) = parse_block(buf, 44, &v1_header, false)?;

    if v1_header.version == 1 {
        if v1_parsed.transitions.is_empty() && v1_parsed.types.len() > 1 {
            // A single fixed-offset zone with no history is legal; zero
            // transitions but more than one type is not.
            return Err(Error::NoTransitions);
        }
        return Ok(v1_parsed);
    }

    let v2_header = parse_header(buf, after_v1)?;
    let (mut v2_parsed, after_v2) = parse_block(buf, after_v1 + 44, &v2_header, true)?;

    let footer_bytes = buf.get(after_v2..).ok_or(Error::MissingVersionData)?;
    let footer = std::str::from_utf8(footer_bytes).map_err(|_| Error::InvalidFooter)?;
    let footer = footer.trim_end_matches('\0');
    let rule_str = footer
        .strip_prefix('\n')
        .and_then(|s| s.strip_suffix('\n'))
        .ok_or(Error::InvalidFooter)?;

    v2_parsed.posix_rule = if rule_str.is_empty() {
        None
    } else {
        Some(parse_posix_tz(rule_str)?)
    };

    Ok(v2_parsed)
}

fn parse_posix_tz(s: &str) -> Result<PosixTzRule, Error> {
    let (std_designation, rest_after_std) = take_designation(s)?;

    let (std_offset_str, rest) = take_offset(rest_after_std);
    let std_offset_seconds = parse_posix_offset(std_offset_str)?;

    if rest.is_empty() {
        return Ok(PosixTzRule {
            std_designation,
            std_offset_seconds,
            dst: None,
        });
    }

    let (dst_designation, rest) = take_designation(rest)?;
    let (dst_offset_str, rest) = take_offset(rest);
    let dst_offset_seconds = if dst_offset_str.is_empty() {
        std_offset_seconds + 3600
    } else {
        parse_posix_offset(dst_offset_str)?
    };

    let rest = rest.strip_prefix(',').ok_or_else(|| Error::InvalidPosixTz(s.to_string()))?;
    let (start_str, end_str) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidPosixTz(s.to_string()))?;
    let start = parse_transition_rule(start_str)?;
    let end = parse_transition_rule(end_str)?;

    Ok(PosixTzRule {
        std_designation,
        std_offset_seconds,
        dst: Some(DstRule {
            designation: dst_designation,
            offset_seconds: dst_offset_seconds,
            start,
            end,
        }),
    })
}

fn std_designation_len(s: &str) -> usize {
    if let Some(rest) = s.strip_prefix('<') {
        return rest.find('>').map(|p| p + 2).unwrap_or(s.len());
    }
    s.chars()
        .take_while(|c| c.is_alphabetic())
        .map(|c| c.len_utf8())
        .sum()
}

fn take_designation(s: &str) -> Result<(String, &str), Error> {
    let len = std_designation_len(s);
    if len == 0 {
        return Err(Error::InvalidPosixTz(s.to_string()));
    }
    let raw = &s[..len];
    let name = raw.trim_start_matches('<').trim_end_matches('>');
    Ok((name.to_string(), &s[len..]))
}

fn take_offset(s: &str) -> (&str, &str) {
    let len = s
        .char_indices()
        .take_while(|(i, c)| {
            *i == 0 && matches!(c, '+' | '-') || c.is_ascii_digit() || *c == ':'
        })
        .count();
    (&s[..len], &s[len..])
}

fn parse_posix_offset(s: &str) -> Result<i32, Error> {
    if s.is_empty() {
        return Err(Error::InvalidPosixTz(s.to_string()));
    }
    let (sign, rest) = match s.as_bytes()[0] {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let parts: Vec<&str> = rest.split(':').collect();
    let bad = || Error::InvalidPosixTz(s.to_string());
    let hours: i64 = parts.first().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let minutes: i64 = match parts.get(1) {
        Some(m) => m.parse().map_err(|_| bad())?,
        None => 0,
    };
    let seconds: i64 = match parts.get(2) {
        Some(sec) => sec.parse().map_err(|_| bad())?,
        None => 0,
    };
    // POSIX rule offsets are the negation of the ISO sign convention: a
    // positive POSIX offset is *west* of UTC.
    Ok((-sign * (hours * 3600 + minutes * 60 + seconds)) as i32)
}

fn parse_transition_rule(s: &str) -> Result<TransitionRule, Error> {
    let bad = || Error::InvalidPosixTz(s.to_string());
    let (rule_str, time_str) = match s.split_once('/') {
        Some((r, t)) => (r, Some(t)),
        None => (s, None),
    };
    let day = if let Some(rest) = rule_str.strip_prefix('J') {
        DayRule::JulianNoLeap(rest.parse().map_err(|_| bad())?)
    } else if let Some(rest) = rule_str.strip_prefix('M') {
        let parts: Vec<&str> = rest.split('.').collect();
        let [m, w, d] = parts.as_slice() else { return Err(bad()) };
        DayRule::MonthWeekWeekday {
            month: m.parse().map_err(|_| bad())?,
            week: w.parse().map_err(|_| bad())?,
            weekday: d.parse().map_err(|_| bad())?,
        }
    } else {
        DayRule::Julian(rule_str.parse().map_err(|_| bad())?)
    };

    let time_seconds = match time_str {
        Some(t) => parse_posix_rule_time(t)?,
        None => 2 * 3600,
    };

    Ok(TransitionRule { day, time_seconds })
}

fn parse_posix_rule_time(s: &str) -> Result<i64, Error> {
    let bad = || Error::InvalidPosixTz(s.to_string());
    let (sign, s) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1i64, &s[1..]),
        _ => (1i64, s),
    };
    let parts: Vec<&str> = s.split(':').collect();
    let hours: i64 = parts.first().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let minutes: i64 = match parts.get(1) {
        Some(m) => m.parse().map_err(|_| bad())?,
        None => 0,
    };
    let seconds: i64 = match parts.get(2) {
        Some(sec) => sec.parse().map_err(|_| bad())?,
        None => 0,
    };
    Ok(sign * (hours * 3600 + minutes * 60 + seconds))
}

#[cfg(test)]
mod test {
    use super::*;

    fn build_v1_fixed_offset(offset: i32, desig: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"TZif");
        buf.push(0);
        buf.extend_from_slice(&[0u8; 15]);
        buf.extend_from_slice(&0u32.to_be_bytes()); // isutcnt
        buf.extend_from_slice(&0u32.to_be_bytes()); // isstdcnt
        buf.extend_from_slice(&0u32.to_be_bytes()); // leapcnt
        buf.extend_from_slice(&0u32.to_be_bytes()); // timecnt
        buf.extend_from_slice(&1u32.to_be_bytes()); // typecnt
        buf.extend_from_slice(&((desig.len() + 1) as u32).to_be_bytes()); // charcnt
        buf.extend_from_slice(&offset.to_be_bytes());
        buf.push(0); // is_dst
        buf.push(0); // designation index
        buf.extend_from_slice(desig.as_bytes());
        buf.push(0);
        buf
    }

    #[test]
    fn test_parse_v1_fixed_offset() {
        let buf = build_v1_fixed_offset(-28_800, "PST");
        let parsed = parse(&buf).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.types.len(), 1);
        assert_eq!(parsed.types[0].utoff, -28_800);
        assert_eq!(parsed.designation(0).unwrap(), "PST");
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = build_v1_fixed_offset(0, "UTC");
        buf[0] = b'X';
        assert_eq!(parse(&buf).unwrap_err(), Error::MagicMismatch);
    }

    #[test]
    fn test_posix_tz_footer_s7() {
        let rule = parse_posix_tz("PST8PDT,M3.2.0,M11.1.0").unwrap();
        assert_eq!(rule.std_offset_seconds, -8 * 3600);
        let dst = rule.dst.unwrap();
        assert_eq!(dst.offset_seconds, -7 * 3600);
        assert_eq!(
            dst.start.day,
            DayRule::MonthWeekWeekday { month: 3, week: 2, weekday: 0 }
        );
        assert_eq!(
            dst.end.day,
            DayRule::MonthWeekWeekday { month: 11, week: 1, weekday: 0 }
        );
        assert_eq!(dst.start.time_seconds, 2 * 3600);
    }

    #[test]
    fn test_posix_tz_no_dst() {
        let rule = parse_posix_tz("UTC0").unwrap();
        assert_eq!(rule.std_offset_seconds, 0);
        assert!(rule.dst.is_none());
    }

    #[test]
    fn test_posix_tz_bracketed_designation() {
        let rule = parse_posix_tz("<+08>-8").unwrap();
        assert_eq!(rule.std_designation, "+08");
        assert_eq!(rule.std_offset_seconds, 8 * 3600);
    }
}
