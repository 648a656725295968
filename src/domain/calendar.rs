use chrono::{Datelike, Months, NaiveDate};

/// A validated (year, month) pair, the partition key for attendance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRef(NaiveDate);

impl MonthRef {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn prev(self) -> Self {
        Self(self.0 - Months::new(1))
    }

    pub fn next(self) -> Self {
        Self(self.0 + Months::new(1))
    }

    pub fn days(self) -> u32 {
        (self.next().0 - self.0).num_days() as u32
    }

    /// Calendar date of `day` within this month, if the day exists.
    pub fn date_of(self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days() {
            return None;
        }
        self.0.with_day(day)
    }
}

/// An employee's service window. `exit_date` of `None` means still employed.
#[derive(Debug, Clone, Copy)]
pub struct Tenure {
    pub join_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
}

impl Tenure {
    /// A grid cell is structurally editable only for days inside the tenure.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.join_date <= date && self.exit_date.map_or(true, |exit| date <= exit)
    }

    /// Payroll-cutoff visibility: the employee appears on the grid for
    /// `selected` only if they joined before the previous month began and
    /// did not exit before the selected month began.
    ///
    /// joinDate < firstDayOfPreviousMonth AND
    /// (no exitDate OR exitDate > firstDayOfSelectedMonth)
    pub fn visible_for(&self, selected: MonthRef) -> bool {
        self.join_date < selected.prev().first_day()
            && self
                .exit_date
                .map_or(true, |exit| exit > selected.first_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_ref_rejects_invalid_months() {
        assert!(MonthRef::new(2024, 0).is_none());
        assert!(MonthRef::new(2024, 13).is_none());
        assert!(MonthRef::new(2024, 12).is_some());
    }

    #[test]
    fn days_handles_leap_years() {
        assert_eq!(MonthRef::new(2024, 2).unwrap().days(), 29);
        assert_eq!(MonthRef::new(2023, 2).unwrap().days(), 28);
        assert_eq!(MonthRef::new(2024, 4).unwrap().days(), 30);
    }

    #[test]
    fn prev_rolls_over_year_boundary() {
        let jan = MonthRef::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), MonthRef::new(2023, 12).unwrap());
    }

    #[test]
    fn date_of_bounds() {
        let feb = MonthRef::new(2023, 2).unwrap();
        assert_eq!(feb.date_of(28), Some(d(2023, 2, 28)));
        assert_eq!(feb.date_of(29), None);
        assert_eq!(feb.date_of(0), None);
    }

    #[test]
    fn tenure_covers_join_and_exit_days_inclusive() {
        let t = Tenure {
            join_date: d(2024, 3, 10),
            exit_date: Some(d(2024, 6, 20)),
        };
        assert!(!t.covers(d(2024, 3, 9)));
        assert!(t.covers(d(2024, 3, 10)));
        assert!(t.covers(d(2024, 6, 20)));
        assert!(!t.covers(d(2024, 6, 21)));
    }

    #[test]
    fn open_ended_tenure_covers_far_future() {
        let t = Tenure {
            join_date: d(2020, 1, 1),
            exit_date: None,
        };
        assert!(t.covers(d(2099, 12, 31)));
    }

    #[test]
    fn visibility_example_from_payroll_cutoff() {
        // Selected month: March 2024.
        let march = MonthRef::new(2024, 3).unwrap();

        // Joined 2023-08-23, exited 2024-11-18 -> visible.
        let long_tenured = Tenure {
            join_date: d(2023, 8, 23),
            exit_date: Some(d(2024, 11, 18)),
        };
        assert!(long_tenured.visible_for(march));

        // Joined during the selected month -> hidden.
        let march_joiner = Tenure {
            join_date: d(2024, 3, 15),
            exit_date: None,
        };
        assert!(!march_joiner.visible_for(march));

        // Joined during the previous month -> still hidden (cutoff rule).
        let feb_joiner = Tenure {
            join_date: d(2024, 2, 10),
            exit_date: None,
        };
        assert!(!feb_joiner.visible_for(march));

        // Exited before the selected month began -> hidden.
        let early_leaver = Tenure {
            join_date: d(2022, 1, 1),
            exit_date: Some(d(2024, 2, 15)),
        };
        assert!(!early_leaver.visible_for(march));

        // Exit exactly on the first day of the selected month -> hidden
        // (rule requires exit strictly after the month begins).
        let boundary_leaver = Tenure {
            join_date: d(2022, 1, 1),
            exit_date: Some(d(2024, 3, 1)),
        };
        assert!(!boundary_leaver.visible_for(march));
    }
}
