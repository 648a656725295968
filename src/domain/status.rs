use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Day status codes accepted on the attendance grid. No free text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AttendanceStatus {
    /// Present
    P,
    /// Public holiday
    Ph,
    /// Weekly off
    Wo,
    /// Loss of pay
    Lop,
    /// Comp off
    Co,
    /// Casual leave
    Cl,
    /// Earned leave
    El,
    /// Leave without pay
    Lwp,
}

impl AttendanceStatus {
    /// LOP and LWP are unpaid; every other status counts toward salary.
    pub fn counts_toward_pay(self) -> bool {
        !matches!(self, AttendanceStatus::Lop | AttendanceStatus::Lwp)
    }
}

/// Pay days for one employee-month: cells whose status is paid.
pub fn pay_days<'a, I>(statuses: I) -> u32
where
    I: IntoIterator<Item = &'a AttendanceStatus>,
{
    statuses
        .into_iter()
        .filter(|s| s.counts_toward_pay())
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn unpaid_statuses_are_exactly_lop_and_lwp() {
        let unpaid: Vec<_> = AttendanceStatus::iter()
            .filter(|s| !s.counts_toward_pay())
            .collect();
        assert_eq!(unpaid, vec![AttendanceStatus::Lop, AttendanceStatus::Lwp]);
    }

    #[test]
    fn pay_days_counts_paid_cells_only() {
        use AttendanceStatus::*;
        let month = vec![P, P, Wo, Lop, Cl, Lwp, Ph, El, Co];
        assert_eq!(pay_days(&month), 7);
    }

    #[test]
    fn pay_days_updates_when_a_cell_changes() {
        use AttendanceStatus::*;
        let mut month = vec![P, P, P];
        assert_eq!(pay_days(&month), 3);
        month[1] = Lop;
        assert_eq!(pay_days(&month), 2);
    }

    #[test]
    fn codes_round_trip_as_uppercase() {
        assert_eq!(AttendanceStatus::Lwp.to_string(), "LWP");
        assert_eq!(
            AttendanceStatus::from_str("PH").unwrap(),
            AttendanceStatus::Ph
        );
        assert!(AttendanceStatus::from_str("X").is_err());
    }
}
