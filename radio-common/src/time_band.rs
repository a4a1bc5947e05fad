//! Time-of-day bands — four disjoint partitions of the day used by the
//! Advisor to pick a per-(day, band) playlist file. The boundaries
//! themselves are configurable; only the four-band shape is fixed.

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

/// One of the four disjoint 24-hour partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    LateNight,
    Morning,
    Day,
    Night,
}

impl Band {
    /// Directory name under `<root>/<day-of-week>/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Band::LateNight => "late_night",
            Band::Morning => "morning",
            Band::Day => "day",
            Band::Night => "night",
        }
    }

    /// All four bands, in a stable order (used to pre-create directories).
    pub fn all() -> [Band; 4] {
        [Band::LateNight, Band::Morning, Band::Day, Band::Night]
    }
}

/// Hour boundaries for the four bands. Defaults: `late_night: [0, 5)`,
/// `morning: [5, 10)`, `day: [10, 18)`, `night: otherwise`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSchedule {
    pub late_night_start: u32,
    pub morning_start: u32,
    pub day_start: u32,
    pub day_end: u32,
}

impl Default for BandSchedule {
    fn default() -> Self {
        Self {
            late_night_start: 0,
            morning_start: 5,
            day_start: 10,
            day_end: 18,
        }
    }
}

impl BandSchedule {
    /// Which band a given local hour (0-23) falls into.
    pub fn band_for_hour(&self, hour: u32) -> Band {
        if hour >= self.day_start && hour < self.day_end {
            Band::Day
        } else if hour >= self.morning_start && hour < self.day_start {
            Band::Morning
        } else if hour >= self.late_night_start && hour < self.morning_start {
            Band::LateNight
        } else {
            Band::Night
        }
    }

    /// Which band a timestamp's local hour falls into.
    pub fn band_for<Tz: TimeZone>(&self, at: DateTime<Tz>) -> Band {
        use chrono::Timelike;
        self.band_for_hour(at.hour())
    }
}

/// Lowercase English weekday name.
pub fn weekday_dir_name<Tz: TimeZone>(at: DateTime<Tz>) -> &'static str {
    match at.weekday() {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn default_bands_have_expected_boundaries() {
        let s = BandSchedule::default();
        assert_eq!(s.band_for_hour(0), Band::LateNight);
        assert_eq!(s.band_for_hour(4), Band::LateNight);
        assert_eq!(s.band_for_hour(5), Band::Morning);
        assert_eq!(s.band_for_hour(9), Band::Morning);
        assert_eq!(s.band_for_hour(10), Band::Day);
        assert_eq!(s.band_for_hour(17), Band::Day);
        assert_eq!(s.band_for_hour(18), Band::Night);
        assert_eq!(s.band_for_hour(23), Band::Night);
    }

    #[test]
    fn weekday_name_is_lowercase() {
        let now = Local::now();
        let name = weekday_dir_name(now);
        assert_eq!(name, name.to_lowercase());
    }
}
