//! Named lookback windows for range-restricted views of the load series

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest custom window accepted from text, about a century
pub const MAX_WINDOW_DAYS: u32 = 36_600;

/// Lookback window ending on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookbackWindow {
    OneYear,
    YearToDate,
    SixMonths,
    ThreeMonths,
    ThirtyDays,
    SevenDays,
    Days(u32),
}

impl LookbackWindow {
    /// All named windows in display order
    pub const PRESETS: [LookbackWindow; 6] = [
        LookbackWindow::OneYear,
        LookbackWindow::YearToDate,
        LookbackWindow::SixMonths,
        LookbackWindow::ThreeMonths,
        LookbackWindow::ThirtyDays,
        LookbackWindow::SevenDays,
    ];

    fn days(&self) -> Option<u32> {
        match self {
            LookbackWindow::OneYear => Some(365),
            LookbackWindow::YearToDate => None,
            LookbackWindow::SixMonths => Some(180),
            LookbackWindow::ThreeMonths => Some(90),
            LookbackWindow::ThirtyDays => Some(30),
            LookbackWindow::SevenDays => Some(7),
            LookbackWindow::Days(days) => Some(*days),
        }
    }

    /// Inclusive `(start, end)` range ending on `today`; saturates at the earliest representable date
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self.days() {
            Some(days) => today
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            None => today.with_ordinal(1).unwrap_or(today),
        };
        (start, today)
    }

    /// Whether volume trends for this window are bucketed per day rather than per week
    pub fn is_short(&self) -> bool {
        matches!(self.days(), Some(days) if days <= 31)
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookbackWindow::OneYear => write!(f, "1Y"),
            LookbackWindow::YearToDate => write!(f, "YTD"),
            LookbackWindow::SixMonths => write!(f, "6M"),
            LookbackWindow::ThreeMonths => write!(f, "3M"),
            LookbackWindow::ThirtyDays => write!(f, "30D"),
            LookbackWindow::SevenDays => write!(f, "7D"),
            LookbackWindow::Days(days) => write!(f, "{}D", days),
        }
    }
}

impl FromStr for LookbackWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1y" => Ok(LookbackWindow::OneYear),
            "ytd" => Ok(LookbackWindow::YearToDate),
            "6m" => Ok(LookbackWindow::SixMonths),
            "3m" => Ok(LookbackWindow::ThreeMonths),
            "30d" => Ok(LookbackWindow::ThirtyDays),
            "7d" => Ok(LookbackWindow::SevenDays),
            other => match other.strip_suffix('d').and_then(|n| n.parse::<u32>().ok()) {
                Some(days) if days <= MAX_WINDOW_DAYS => Ok(LookbackWindow::Days(days)),
                Some(days) => Err(format!(
                    "Lookback window of {} days exceeds the {} day limit",
                    days, MAX_WINDOW_DAYS
                )),
                None => Err(format!("Invalid lookback window: {}", s)),
            },
        }
    }
}
