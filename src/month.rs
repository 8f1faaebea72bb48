//! Calendar month keys used to bucket transactions by year and month.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Duration, Month};

use crate::Error;

/// The earliest year a month key or stored date may have.
pub const MIN_YEAR: i32 = 0;

/// The latest year a month key or stored date may have.
pub const MAX_YEAR: i32 = 9999;

/// Check that `year` can be written as a four digit `YYYY` key.
///
/// # Errors
///
/// Returns [Error::YearOutOfRange] if `year` is outside [MIN_YEAR] to [MAX_YEAR].
pub fn check_year(year: i32) -> Result<i32, Error> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(Error::YearOutOfRange(year))
    }
}

/// A year and month, e.g. `2024-01`.
///
/// Keys order chronologically and are written as `YYYY-MM`, both by
/// [Display] and when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// Create a month key.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// Create a month key from a month number between 1 and 12.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month` is outside 1 to 12, or
    /// [Error::YearOutOfRange] if `year` is outside [MIN_YEAR] to [MAX_YEAR].
    pub fn from_numbers(year: i32, month: u8) -> Result<Self, Error> {
        let year = check_year(year)?;
        let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;

        Ok(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year of the key.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the key.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// The month after this one.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    /// The first day of the month.
    ///
    /// # Errors
    ///
    /// Returns [Error::YearOutOfRange] if the year is outside [MIN_YEAR] to [MAX_YEAR].
    pub fn first_day(&self) -> Result<Date, Error> {
        let year = check_year(self.year)?;

        Date::from_calendar_date(year, self.month, 1).map_err(|_| Error::YearOutOfRange(year))
    }

    /// The last day of the month.
    ///
    /// # Errors
    ///
    /// Returns [Error::YearOutOfRange] if the year is outside [MIN_YEAR] to [MAX_YEAR].
    pub fn last_day(&self) -> Result<Date, Error> {
        match self.month {
            // Stepping to January would leave the supported range in the last year.
            Month::December => {
                let year = check_year(self.year)?;

                Date::from_calendar_date(year, Month::December, 31)
                    .map_err(|_| Error::YearOutOfRange(year))
            }
            _ => Ok(self.next().first_day()? - Duration::days(1)),
        }
    }

    /// The `count` months that end with (and include) this month, oldest first.
    ///
    /// The window stops early at January of [MIN_YEAR].
    pub fn window_ending_here(&self, count: u32) -> Vec<MonthKey> {
        let earliest = Self::new(MIN_YEAR, Month::January);
        let mut months = Vec::new();
        let mut month = *self;

        for _ in 0..count {
            months.push(month);

            if month <= earliest {
                break;
            }

            month = month.previous();
        }

        months.reverse();
        months
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonthKey(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        MonthKey::from_numbers(year, month).map_err(|_| invalid())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        text.parse().map_err(serde::de::Error::custom)
    }
}
