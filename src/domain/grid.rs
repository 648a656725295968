use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::calendar::{MonthRef, Tenure};
use super::status::AttendanceStatus;

/// One requested cell write within the selected month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CellEdit {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 5)]
    pub day: u32,
    #[schema(example = "CL")]
    pub status: AttendanceStatus,
}

/// Outcome of screening a batch of cell edits against the tenure rule.
#[derive(Debug)]
pub struct ScreenedEdits {
    pub eligible: Vec<CellEdit>,
    /// Edits dropped because the day is outside the employee's tenure,
    /// the day does not exist in the month, or the employee is unknown.
    pub skipped: Vec<CellEdit>,
}

/// Apply the cell-edit rule to a batch: an edit lands only when the day
/// exists in `month` and falls inside the employee's tenure. Everything
/// else is left untouched and reported back, never failed wholesale.
pub fn screen_edits(
    edits: Vec<CellEdit>,
    tenures: &HashMap<u64, Tenure>,
    month: MonthRef,
) -> ScreenedEdits {
    let mut eligible = Vec::with_capacity(edits.len());
    let mut skipped = Vec::new();

    for edit in edits {
        let in_tenure = month.date_of(edit.day).is_some_and(|date| {
            tenures
                .get(&edit.employee_id)
                .is_some_and(|t| t.covers(date))
        });
        if in_tenure {
            eligible.push(edit);
        } else {
            skipped.push(edit);
        }
    }

    ScreenedEdits { eligible, skipped }
}

/// "Mark All": status `status` on day `day` for every listed employee whose
/// cell is structurally enabled. Disabled cells are skipped, not errored.
pub fn mark_all(
    employee_ids: &[u64],
    day: u32,
    status: AttendanceStatus,
    tenures: &HashMap<u64, Tenure>,
    month: MonthRef,
) -> ScreenedEdits {
    let edits = employee_ids
        .iter()
        .map(|&employee_id| CellEdit {
            employee_id,
            day,
            status,
        })
        .collect();
    screen_edits(edits, tenures, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tenure(join: NaiveDate, exit: Option<NaiveDate>) -> Tenure {
        Tenure {
            join_date: join,
            exit_date: exit,
        }
    }

    #[test]
    fn edits_outside_tenure_are_skipped() {
        let month = MonthRef::new(2024, 3).unwrap();
        let mut tenures = HashMap::new();
        // Joined mid-month: days before the 10th are disabled.
        tenures.insert(7, tenure(d(2024, 3, 10), None));

        let screened = screen_edits(
            vec![
                CellEdit {
                    employee_id: 7,
                    day: 5,
                    status: AttendanceStatus::P,
                },
                CellEdit {
                    employee_id: 7,
                    day: 12,
                    status: AttendanceStatus::P,
                },
            ],
            &tenures,
            month,
        );

        assert_eq!(screened.eligible.len(), 1);
        assert_eq!(screened.eligible[0].day, 12);
        assert_eq!(screened.skipped.len(), 1);
        assert_eq!(screened.skipped[0].day, 5);
    }

    #[test]
    fn unknown_employee_and_bad_day_are_skipped() {
        let month = MonthRef::new(2024, 2).unwrap();
        let mut tenures = HashMap::new();
        tenures.insert(1, tenure(d(2020, 1, 1), None));

        let screened = screen_edits(
            vec![
                CellEdit {
                    employee_id: 99,
                    day: 5,
                    status: AttendanceStatus::P,
                },
                // 2024 is a leap year; day 30 still does not exist in February.
                CellEdit {
                    employee_id: 1,
                    day: 30,
                    status: AttendanceStatus::P,
                },
            ],
            &tenures,
            month,
        );

        assert!(screened.eligible.is_empty());
        assert_eq!(screened.skipped.len(), 2);
    }

    #[test]
    fn mark_all_touches_only_enabled_cells() {
        let month = MonthRef::new(2024, 3).unwrap();
        let mut tenures = HashMap::new();
        tenures.insert(1, tenure(d(2023, 8, 23), Some(d(2024, 11, 18))));
        tenures.insert(2, tenure(d(2024, 3, 15), None)); // joins after day 5
        tenures.insert(3, tenure(d(2022, 1, 1), Some(d(2024, 3, 2)))); // exits before day 5

        let screened = mark_all(&[1, 2, 3], 5, AttendanceStatus::Cl, &tenures, month);

        let eligible_ids: Vec<u64> = screened.eligible.iter().map(|e| e.employee_id).collect();
        assert_eq!(eligible_ids, vec![1]);
        assert!(screened.eligible.iter().all(|e| e.day == 5));
        assert_eq!(screened.skipped.len(), 2);
    }
}
