//! Period calendar: the fixed partition of each school day into numbered
//! teaching periods, plus the informational recess windows between them.
//!
//! The calendar is configuration. It is built once (either from the built-in
//! school table or from a JSON document), validated, and then only read.
//! Every weekday carries its own table; nothing is derived by formula, so
//! Monday's long first period and Friday's short day are plain data.

use super::clock::{hhmm, parse_clock};
use super::error::{Result, TimetableError};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Monday,
        SchoolDay::Tuesday,
        SchoolDay::Wednesday,
        SchoolDay::Thursday,
        SchoolDay::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolDay::Monday => "monday",
            SchoolDay::Tuesday => "tuesday",
            SchoolDay::Wednesday => "wednesday",
            SchoolDay::Thursday => "thursday",
            SchoolDay::Friday => "friday",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<Weekday> for SchoolDay {
    type Error = TimetableError;

    fn try_from(w: Weekday) -> Result<Self> {
        match w {
            Weekday::Mon => Ok(SchoolDay::Monday),
            Weekday::Tue => Ok(SchoolDay::Tuesday),
            Weekday::Wed => Ok(SchoolDay::Wednesday),
            Weekday::Thu => Ok(SchoolDay::Thursday),
            Weekday::Fri => Ok(SchoolDay::Friday),
            Weekday::Sat => Err(TimetableError::UnknownWeekday("saturday".into())),
            Weekday::Sun => Err(TimetableError::UnknownWeekday("sunday".into())),
        }
    }
}

impl From<SchoolDay> for Weekday {
    fn from(d: SchoolDay) -> Self {
        match d {
            SchoolDay::Monday => Weekday::Mon,
            SchoolDay::Tuesday => Weekday::Tue,
            SchoolDay::Wednesday => Weekday::Wed,
            SchoolDay::Thursday => Weekday::Thu,
            SchoolDay::Friday => Weekday::Fri,
        }
    }
}

impl FromStr for SchoolDay {
    type Err = TimetableError;

    /// English names and three-letter abbreviations, and the Indonesian day
    /// names used on the school's own timetables.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" | "senin" => Ok(SchoolDay::Monday),
            "tuesday" | "tue" | "selasa" => Ok(SchoolDay::Tuesday),
            "wednesday" | "wed" | "rabu" => Ok(SchoolDay::Wednesday),
            "thursday" | "thu" | "kamis" => Ok(SchoolDay::Thursday),
            "friday" | "fri" | "jumat" | "jum'at" => Ok(SchoolDay::Friday),
            _ => Err(TimetableError::UnknownWeekday(s.trim().to_string())),
        }
    }
}

/// Anything a caller may name a day with. Saturday, Sunday and unknown text
/// fail with `UnknownWeekday`.
pub trait ToSchoolDay {
    fn to_school_day(&self) -> Result<SchoolDay>;
}

impl ToSchoolDay for SchoolDay {
    fn to_school_day(&self) -> Result<SchoolDay> {
        Ok(*self)
    }
}

impl ToSchoolDay for Weekday {
    fn to_school_day(&self) -> Result<SchoolDay> {
        SchoolDay::try_from(*self)
    }
}

impl ToSchoolDay for &str {
    fn to_school_day(&self) -> Result<SchoolDay> {
        self.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDefinition {
    pub weekday: SchoolDay,
    pub index: u32,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

/// A recess. Never numbered, never assignable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakWindow {
    pub weekday: SchoolDay,
    pub after_period: u32,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct DayTable {
    day: SchoolDay,
    periods: Vec<PeriodDefinition>,
    breaks: Vec<BreakWindow>,
}

impl DayTable {
    pub fn day(&self) -> SchoolDay {
        self.day
    }

    pub fn periods(&self) -> &[PeriodDefinition] {
        &self.periods
    }

    pub fn breaks(&self) -> &[BreakWindow] {
        &self.breaks
    }

    pub fn period_count(&self) -> u32 {
        self.periods.len() as u32
    }

    pub fn period(&self, index: u32) -> Option<&PeriodDefinition> {
        if index == 0 {
            return None;
        }
        self.periods.get(index as usize - 1)
    }

    pub fn break_after(&self, index: u32) -> Option<&BreakWindow> {
        self.breaks.iter().find(|b| b.after_period == index)
    }

    /// Index of the period starting exactly at `t`.
    pub fn period_starting_at(&self, t: NaiveTime) -> Option<u32> {
        self.periods.iter().find(|p| p.start == t).map(|p| p.index)
    }

    /// Index of the period ending exactly at `t`.
    pub fn period_ending_at(&self, t: NaiveTime) -> Option<u32> {
        self.periods.iter().find(|p| p.end == t).map(|p| p.index)
    }
}

#[derive(Debug, Clone)]
pub struct PeriodCalendar {
    days: [DayTable; 5],
}

impl PeriodCalendar {
    /// The built-in school table.
    pub fn school_default() -> Result<Self> {
        Self::from_config(CalendarConfig::school_default())
    }

    pub fn from_config(mut config: CalendarConfig) -> Result<Self> {
        let mut tables = Vec::with_capacity(SchoolDay::ALL.len());
        for day in SchoolDay::ALL {
            let Some(day_config) = config.days.remove(&day) else {
                return Err(TimetableError::InvalidCalendar(format!(
                    "no periods configured for {}",
                    day
                )));
            };
            tables.push(build_day(day, day_config)?);
        }
        let days: [DayTable; 5] = tables
            .try_into()
            .map_err(|_| TimetableError::InvalidCalendar("expected five school days".into()))?;
        Ok(Self { days })
    }

    pub fn day(&self, day: SchoolDay) -> &DayTable {
        &self.days[day.slot()]
    }

    pub fn days(&self) -> impl Iterator<Item = &DayTable> {
        self.days.iter()
    }

    /// Periods of `weekday`, ascending by index.
    pub fn periods_of(&self, weekday: impl ToSchoolDay) -> Result<&[PeriodDefinition]> {
        let day = weekday.to_school_day()?;
        Ok(self.day(day).periods())
    }

    pub fn breaks_of(&self, weekday: impl ToSchoolDay) -> Result<&[BreakWindow]> {
        let day = weekday.to_school_day()?;
        Ok(self.day(day).breaks())
    }

    pub fn time_range_of(
        &self,
        weekday: impl ToSchoolDay,
        index: u32,
    ) -> Result<(NaiveTime, NaiveTime)> {
        let day = weekday.to_school_day()?;
        self.day(day)
            .period(index)
            .map(|p| (p.start, p.end))
            .ok_or_else(|| TimetableError::PeriodNotFound {
                weekday: day.to_string(),
                index,
            })
    }

    pub fn max_period_count(&self) -> u32 {
        self.days.iter().map(|d| d.period_count()).max().unwrap_or(0)
    }
}

fn build_day(day: SchoolDay, config: DayConfig) -> Result<DayTable> {
    let bad = |msg: String| TimetableError::InvalidCalendar(format!("{}: {}", day, msg));

    if config.periods.is_empty() {
        return Err(bad("at least one period is required".into()));
    }

    let mut periods: Vec<PeriodDefinition> = Vec::with_capacity(config.periods.len());
    for (i, span) in config.periods.iter().enumerate() {
        let index = i as u32 + 1;
        if span.start >= span.end {
            return Err(bad(format!("period {} must start before it ends", index)));
        }
        if let Some(prev) = periods.last() {
            if prev.end > span.start {
                return Err(bad(format!(
                    "period {} overlaps period {}",
                    index, prev.index
                )));
            }
        }
        periods.push(PeriodDefinition {
            weekday: day,
            index,
            start: span.start,
            end: span.end,
        });
    }

    let mut breaks: Vec<BreakWindow> = Vec::with_capacity(config.breaks.len());
    let mut seen_after: Vec<u32> = Vec::new();
    for b in config.breaks {
        let after = b.after_period;
        if after == 0 || after as usize >= periods.len() {
            return Err(bad(format!(
                "a break must sit between two periods (after period {})",
                after
            )));
        }
        if seen_after.contains(&after) {
            return Err(bad(format!("two breaks after period {}", after)));
        }
        let before = &periods[after as usize - 1];
        let next = &periods[after as usize];
        if b.start >= b.end || b.start < before.end || b.end > next.start {
            return Err(bad(format!(
                "break after period {} must lie between {} and {}",
                after,
                super::clock::format_clock(before.end),
                super::clock::format_clock(next.start)
            )));
        }
        seen_after.push(after);
        breaks.push(BreakWindow {
            weekday: day,
            after_period: after,
            start: b.start,
            end: b.end,
            label: b.label,
        });
    }
    breaks.sort_by_key(|b| b.after_period);

    Ok(DayTable {
        day,
        periods,
        breaks,
    })
}

/// JSON shape of a calendar document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub days: BTreeMap<SchoolDay, DayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayConfig {
    pub periods: Vec<PeriodSpan>,
    #[serde(default)]
    pub breaks: Vec<BreakConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSpan {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakConfig {
    pub after_period: u32,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default = "default_break_label")]
    pub label: String,
}

fn default_break_label() -> String {
    "Istirahat".to_string()
}

const MONDAY_PERIODS: &[(&str, &str)] = &[
    ("07:00", "08:00"),
    ("08:00", "08:40"),
    ("08:40", "09:20"),
    ("09:20", "10:00"),
    ("10:15", "10:55"),
    ("10:55", "11:35"),
    ("11:35", "12:15"),
    ("12:45", "13:25"),
    ("13:25", "14:05"),
];
const MONDAY_BREAKS: &[(u32, &str, &str)] = &[(4, "10:00", "10:15"), (7, "12:15", "12:45")];

const MIDWEEK_PERIODS: &[(&str, &str)] = &[
    ("07:00", "07:40"),
    ("07:40", "08:20"),
    ("08:20", "09:00"),
    ("09:00", "09:40"),
    ("09:55", "10:35"),
    ("10:35", "11:15"),
    ("11:15", "11:55"),
    ("12:25", "13:05"),
    ("13:05", "13:45"),
];
const MIDWEEK_BREAKS: &[(u32, &str, &str)] = &[(4, "09:40", "09:55"), (7, "11:55", "12:25")];

const FRIDAY_PERIODS: &[(&str, &str)] = &[
    ("07:00", "07:35"),
    ("07:35", "08:10"),
    ("08:10", "08:45"),
    ("08:45", "09:20"),
    ("09:35", "10:10"),
    ("10:10", "10:45"),
];
const FRIDAY_BREAKS: &[(u32, &str, &str)] = &[(4, "09:20", "09:35")];

impl CalendarConfig {
    pub fn school_default() -> Self {
        let mut days = BTreeMap::new();
        for day in SchoolDay::ALL {
            let (periods, breaks) = match day {
                SchoolDay::Monday => (MONDAY_PERIODS, MONDAY_BREAKS),
                SchoolDay::Friday => (FRIDAY_PERIODS, FRIDAY_BREAKS),
                _ => (MIDWEEK_PERIODS, MIDWEEK_BREAKS),
            };
            days.insert(day, static_day(periods, breaks));
        }
        Self { days }
    }
}

fn static_day(periods: &[(&str, &str)], breaks: &[(u32, &str, &str)]) -> DayConfig {
    // Literals are well-formed; from_config still validates the result.
    let clock = |s: &str| parse_clock(s).unwrap_or_default();
    DayConfig {
        periods: periods
            .iter()
            .map(|(s, e)| PeriodSpan {
                start: clock(s),
                end: clock(e),
            })
            .collect(),
        breaks: breaks
            .iter()
            .map(|(after, s, e)| BreakConfig {
                after_period: *after,
                start: clock(s),
                end: clock(e),
                label: default_break_label(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn cal() -> PeriodCalendar {
        PeriodCalendar::school_default().expect("default calendar")
    }

    #[test]
    fn periods_are_sorted_and_disjoint_on_every_day() {
        let cal = cal();
        for day in SchoolDay::ALL {
            let periods = cal.periods_of(day).unwrap();
            for (i, p) in periods.iter().enumerate() {
                assert_eq!(p.index, i as u32 + 1);
                assert_eq!(p.weekday, day);
                assert!(p.start < p.end);
            }
            for w in periods.windows(2) {
                assert!(w[0].end <= w[1].start, "{} {:?}", day, w);
            }
        }
    }

    #[test]
    fn per_day_shapes_are_preserved() {
        let cal = cal();
        assert_eq!(cal.periods_of(Weekday::Mon).unwrap().len(), 9);
        assert_eq!(cal.periods_of(Weekday::Thu).unwrap().len(), 9);
        assert_eq!(cal.periods_of(Weekday::Fri).unwrap().len(), 6);
        assert_eq!(cal.max_period_count(), 9);

        let (ms, me) = cal.time_range_of("monday", 1).unwrap();
        let (ts, te) = cal.time_range_of("tuesday", 1).unwrap();
        assert!(me - ms > te - ts);

        let (fs, fe) = cal.time_range_of(SchoolDay::Friday, 2).unwrap();
        assert!(fe - fs < te - ts);
    }

    #[test]
    fn breaks_follow_period_four_and_seven_except_friday() {
        let cal = cal();
        for day in SchoolDay::ALL.into_iter().filter(|d| *d != SchoolDay::Friday) {
            let after: Vec<u32> = cal
                .breaks_of(day)
                .unwrap()
                .iter()
                .map(|b| b.after_period)
                .collect();
            assert_eq!(after, vec![4, 7], "{}", day);
        }
        assert_eq!(
            cal.breaks_of(SchoolDay::Tuesday).unwrap(),
            cal.breaks_of(SchoolDay::Thursday).unwrap()
        );
        let friday = cal.breaks_of(SchoolDay::Friday).unwrap();
        assert_eq!(friday.len(), 1);
        assert_eq!(friday[0].after_period, 4);
        assert_eq!(friday[0].start, t(9, 20));
        assert!(cal.day(SchoolDay::Friday).break_after(7).is_none());
    }

    #[test]
    fn weekend_and_unknown_days_are_rejected() {
        let cal = cal();
        assert_eq!(
            cal.periods_of(Weekday::Sat).unwrap_err(),
            TimetableError::UnknownWeekday("saturday".into())
        );
        assert!(matches!(
            cal.periods_of("minggu"),
            Err(TimetableError::UnknownWeekday(_))
        ));
        assert!(cal.periods_of("Senin").is_ok());
        assert!(cal.periods_of("FRI").is_ok());
    }

    #[test]
    fn missing_period_is_reported() {
        let cal = cal();
        assert_eq!(
            cal.time_range_of("friday", 7).unwrap_err(),
            TimetableError::PeriodNotFound {
                weekday: "friday".into(),
                index: 7
            }
        );
        assert!(cal.time_range_of("monday", 0).is_err());
        assert_eq!(cal.time_range_of("monday", 4).unwrap(), (t(9, 20), t(10, 0)));
    }

    #[test]
    fn boundary_lookups() {
        let cal = cal();
        let monday = cal.day(SchoolDay::Monday);
        assert_eq!(monday.period_starting_at(t(8, 0)), Some(2));
        assert_eq!(monday.period_ending_at(t(8, 0)), Some(1));
        assert_eq!(monday.period_starting_at(t(10, 0)), None);
    }

    #[test]
    fn overlapping_config_is_invalid() {
        let mut config = CalendarConfig::school_default();
        if let Some(day) = config.days.get_mut(&SchoolDay::Tuesday) {
            day.periods[1].start = t(7, 30);
        }
        let err = PeriodCalendar::from_config(config).unwrap_err();
        assert_eq!(err.code(), "invalid_calendar");
        assert!(err.to_string().contains("tuesday"));
    }

    #[test]
    fn break_outside_its_gap_is_invalid() {
        let mut config = CalendarConfig::school_default();
        if let Some(day) = config.days.get_mut(&SchoolDay::Friday) {
            day.breaks[0].end = t(9, 50);
        }
        assert!(PeriodCalendar::from_config(config).is_err());

        let mut config = CalendarConfig::school_default();
        if let Some(day) = config.days.get_mut(&SchoolDay::Friday) {
            day.breaks[0].after_period = 6;
        }
        assert!(PeriodCalendar::from_config(config).is_err());
    }

    #[test]
    fn missing_day_is_invalid() {
        let mut config = CalendarConfig::school_default();
        config.days.remove(&SchoolDay::Wednesday);
        let err = PeriodCalendar::from_config(config).unwrap_err();
        assert!(err.to_string().contains("wednesday"));
    }

    #[test]
    fn config_reads_from_json() {
        let raw = serde_json::json!({
            "days": {
                "monday": { "periods": [{ "start": "07:00", "end": "07:45" }] },
                "tuesday": { "periods": [{ "start": "07:00", "end": "07:45" }] },
                "wednesday": { "periods": [{ "start": "07:00", "end": "07:45" }] },
                "thursday": { "periods": [{ "start": "07:00", "end": "07:45" }] },
                "friday": {
                    "periods": [
                        { "start": "07:00", "end": "07:45" },
                        { "start": "08:00", "end": "08:45" }
                    ],
                    "breaks": [{ "afterPeriod": 1, "start": "07:45", "end": "08:00" }]
                }
            }
        });
        let config: CalendarConfig = serde_json::from_value(raw).expect("parse config");
        let cal = PeriodCalendar::from_config(config).expect("valid calendar");
        assert_eq!(cal.periods_of("friday").unwrap().len(), 2);
        assert_eq!(cal.breaks_of("friday").unwrap()[0].label, "Istirahat");
    }
}
