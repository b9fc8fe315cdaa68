use chrono::NaiveDate;

use crate::json_walk::parse_date;
use crate::models::{LeaveRecord, VacationSummary};

/// Records carrying an inclusive `[from, to]` date range.
pub trait DateRanged {
    fn range(&self) -> (Option<NaiveDate>, Option<NaiveDate>);
}

impl DateRanged for LeaveRecord {
    fn range(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.from, self.to)
    }
}

impl DateRanged for VacationSummary {
    fn range(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.from, self.to)
    }
}

/// Query window built from the `desde`/`hasta` parameters. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    /// Parses both bounds; a blank or unparseable bound counts as absent.
    pub fn parse(desde: Option<&str>, hasta: Option<&str>) -> Self {
        Self {
            from: desde.and_then(parse_date),
            to: hasta.and_then(parse_date),
        }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            from: Some(day),
            to: Some(day),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Inclusive overlap: `to >= from_q AND from <= to_q`.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.from.map_or(true, |q_from| to >= q_from) && self.to.map_or(true, |q_to| from <= q_to)
    }

    /// Keeps the records overlapping the window.
    ///
    /// An unbounded window returns the list unchanged; otherwise records without both
    /// dates are dropped.
    pub fn filter<T: DateRanged>(&self, items: Vec<T>) -> Vec<T> {
        if self.is_unbounded() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| match item.range() {
                (Some(from), Some(to)) => self.overlaps(from, to),
                _ => false,
            })
            .collect()
    }
}
