use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Income-tax framework selected by the employee. Under `New`, itemized
/// deduction sections do not apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaxRegime {
    Old,
    New,
}

// Statutory ceilings, in rupees.
pub const SECTION_80C_CAP: f64 = 150_000.0;
pub const SELF_MEDICAL_CAP: f64 = 25_000.0;
pub const PARENTS_MEDICAL_CAP: f64 = 50_000.0;
pub const NPS_80CCD1B_CAP: f64 = 50_000.0;
pub const HOME_LOAN_INTEREST_CAP: f64 = 200_000.0;
/// Annual rent above this requires the landlord's PAN.
pub const LANDLORD_PAN_RENT_THRESHOLD: f64 = 100_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HouseRent {
    #[schema(example = 18000.0)]
    pub monthly_rent: f64,
    #[schema(example = "ABCDE1234F")]
    pub landlord_pan: Option<String>,
    pub metro_city: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Section80c {
    #[schema(example = 45000.0)]
    pub life_insurance_premium: f64,
    pub ppf: f64,
    pub elss: f64,
    pub nsc: f64,
    pub home_loan_principal: f64,
    pub tuition_fees: f64,
}

impl Section80c {
    pub fn total(&self) -> f64 {
        self.life_insurance_premium
            + self.ppf
            + self.elss
            + self.nsc
            + self.home_loan_principal
            + self.tuition_fees
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionViA {
    #[schema(example = 22000.0)]
    pub self_medical_insurance: f64,
    pub parents_medical_insurance: f64,
    pub nps_contribution: f64,
    pub education_loan_interest: f64,
    pub donations: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HouseProperty {
    #[schema(example = 180000.0)]
    pub home_loan_interest: f64,
    pub annual_rent_received: f64,
}

/// One section of the declaration, discriminated by the `section` tag so a
/// mistyped section or field fails at deserialization instead of writing a
/// malformed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SectionUpdate {
    HouseRent(HouseRent),
    Section80c(Section80c),
    SectionViA(SectionViA),
    HouseProperty(HouseProperty),
}

/// Field-keyed validation errors, e.g.
/// `"section_80c.life_insurance_premium" -> "exceeds the 150000 ceiling"`.
pub type FieldErrors = BTreeMap<String, String>;

/// Submission body for one (employee, fiscal year).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeclarationSubmission {
    pub regime: TaxRegime,
    /// Required (true) under the new regime in place of the sections.
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub sections: Vec<SectionUpdate>,
}

#[derive(Debug, PartialEq, derive_more::Display)]
pub enum SubmissionRejection {
    #[display(fmt = "Deductions are not applicable under the new regime")]
    NewRegimeSections,
    #[display(fmt = "Confirm the new regime selection before saving")]
    NewRegimeUnconfirmed,
    #[display(fmt = "Declaration has invalid fields")]
    InvalidFields(FieldErrors),
}

/// Validate a full submission. Nothing is partially acceptable: any error
/// rejects the whole document.
pub fn validate_submission(sub: &DeclarationSubmission) -> Result<(), SubmissionRejection> {
    match sub.regime {
        TaxRegime::New => {
            if !sub.sections.is_empty() {
                return Err(SubmissionRejection::NewRegimeSections);
            }
            if sub.confirmed != Some(true) {
                return Err(SubmissionRejection::NewRegimeUnconfirmed);
            }
            Ok(())
        }
        TaxRegime::Old => {
            let errors = validate_sections(&sub.sections);
            if errors.is_empty() {
                Ok(())
            } else {
                Err(SubmissionRejection::InvalidFields(errors))
            }
        }
    }
}

/// Per-field cap and sanity checks for the old-regime sections.
pub fn validate_sections(sections: &[SectionUpdate]) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for section in sections {
        match section {
            SectionUpdate::HouseRent(rent) => {
                require_non_negative(&mut errors, "house_rent.monthly_rent", rent.monthly_rent);
                let annual = rent.monthly_rent * 12.0;
                if annual > LANDLORD_PAN_RENT_THRESHOLD
                    && rent
                        .landlord_pan
                        .as_deref()
                        .map_or(true, |pan| pan.trim().is_empty())
                {
                    errors.insert(
                        "house_rent.landlord_pan".into(),
                        format!(
                            "Landlord PAN is required when annual rent exceeds {}",
                            LANDLORD_PAN_RENT_THRESHOLD
                        ),
                    );
                }
            }
            SectionUpdate::Section80c(s) => {
                require_non_negative(
                    &mut errors,
                    "section_80c.life_insurance_premium",
                    s.life_insurance_premium,
                );
                require_non_negative(&mut errors, "section_80c.ppf", s.ppf);
                require_non_negative(&mut errors, "section_80c.elss", s.elss);
                require_non_negative(&mut errors, "section_80c.nsc", s.nsc);
                require_non_negative(
                    &mut errors,
                    "section_80c.home_loan_principal",
                    s.home_loan_principal,
                );
                require_non_negative(&mut errors, "section_80c.tuition_fees", s.tuition_fees);
                require_cap(
                    &mut errors,
                    "section_80c.life_insurance_premium",
                    s.life_insurance_premium,
                    SECTION_80C_CAP,
                );
                require_cap(&mut errors, "section_80c.total", s.total(), SECTION_80C_CAP);
            }
            SectionUpdate::SectionViA(s) => {
                require_non_negative(
                    &mut errors,
                    "section_vi_a.self_medical_insurance",
                    s.self_medical_insurance,
                );
                require_non_negative(
                    &mut errors,
                    "section_vi_a.parents_medical_insurance",
                    s.parents_medical_insurance,
                );
                require_non_negative(
                    &mut errors,
                    "section_vi_a.nps_contribution",
                    s.nps_contribution,
                );
                require_non_negative(
                    &mut errors,
                    "section_vi_a.education_loan_interest",
                    s.education_loan_interest,
                );
                require_non_negative(&mut errors, "section_vi_a.donations", s.donations);
                require_cap(
                    &mut errors,
                    "section_vi_a.self_medical_insurance",
                    s.self_medical_insurance,
                    SELF_MEDICAL_CAP,
                );
                require_cap(
                    &mut errors,
                    "section_vi_a.parents_medical_insurance",
                    s.parents_medical_insurance,
                    PARENTS_MEDICAL_CAP,
                );
                require_cap(
                    &mut errors,
                    "section_vi_a.nps_contribution",
                    s.nps_contribution,
                    NPS_80CCD1B_CAP,
                );
            }
            SectionUpdate::HouseProperty(s) => {
                require_non_negative(
                    &mut errors,
                    "house_property.home_loan_interest",
                    s.home_loan_interest,
                );
                require_non_negative(
                    &mut errors,
                    "house_property.annual_rent_received",
                    s.annual_rent_received,
                );
                require_cap(
                    &mut errors,
                    "house_property.home_loan_interest",
                    s.home_loan_interest,
                    HOME_LOAN_INTEREST_CAP,
                );
            }
        }
    }

    errors
}

fn require_non_negative(errors: &mut FieldErrors, field: &str, value: f64) {
    if value < 0.0 || !value.is_finite() {
        errors.insert(field.into(), "Amount must be a non-negative number".into());
    }
}

fn require_cap(errors: &mut FieldErrors, field: &str, value: f64, cap: f64) {
    if value > cap {
        errors
            .entry(field.into())
            .or_insert_with(|| format!("Amount exceeds the {} ceiling", cap));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_regime(sections: Vec<SectionUpdate>) -> DeclarationSubmission {
        DeclarationSubmission {
            regime: TaxRegime::Old,
            confirmed: None,
            sections,
        }
    }

    #[test]
    fn life_insurance_over_cap_is_field_keyed() {
        let sub = old_regime(vec![SectionUpdate::Section80c(Section80c {
            life_insurance_premium: 200_000.0,
            ..Default::default()
        })]);

        match validate_submission(&sub) {
            Err(SubmissionRejection::InvalidFields(errors)) => {
                assert!(errors.contains_key("section_80c.life_insurance_premium"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn aggregate_80c_cap_applies_even_when_fields_are_individually_fine() {
        let sub = old_regime(vec![SectionUpdate::Section80c(Section80c {
            life_insurance_premium: 100_000.0,
            ppf: 100_000.0,
            ..Default::default()
        })]);

        match validate_submission(&sub) {
            Err(SubmissionRejection::InvalidFields(errors)) => {
                assert!(errors.contains_key("section_80c.total"));
                assert!(!errors.contains_key("section_80c.life_insurance_premium"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn self_medical_cap() {
        let errors = validate_sections(&[SectionUpdate::SectionViA(SectionViA {
            self_medical_insurance: 30_000.0,
            ..Default::default()
        })]);
        assert!(errors.contains_key("section_vi_a.self_medical_insurance"));

        let ok = validate_sections(&[SectionUpdate::SectionViA(SectionViA {
            self_medical_insurance: 25_000.0,
            ..Default::default()
        })]);
        assert!(ok.is_empty());
    }

    #[test]
    fn high_rent_requires_landlord_pan() {
        let errors = validate_sections(&[SectionUpdate::HouseRent(HouseRent {
            monthly_rent: 10_000.0, // 120k annually
            landlord_pan: None,
            metro_city: true,
        })]);
        assert!(errors.contains_key("house_rent.landlord_pan"));

        let ok = validate_sections(&[SectionUpdate::HouseRent(HouseRent {
            monthly_rent: 10_000.0,
            landlord_pan: Some("ABCDE1234F".into()),
            metro_city: true,
        })]);
        assert!(ok.is_empty());
    }

    #[test]
    fn negative_amounts_rejected() {
        let errors = validate_sections(&[SectionUpdate::HouseProperty(HouseProperty {
            home_loan_interest: -1.0,
            annual_rent_received: 0.0,
        })]);
        assert!(errors.contains_key("house_property.home_loan_interest"));
    }

    #[test]
    fn new_regime_rejects_sections() {
        let sub = DeclarationSubmission {
            regime: TaxRegime::New,
            confirmed: Some(true),
            sections: vec![SectionUpdate::Section80c(Section80c::default())],
        };
        assert_eq!(
            validate_submission(&sub),
            Err(SubmissionRejection::NewRegimeSections)
        );
    }

    #[test]
    fn new_regime_needs_confirmation() {
        let sub = DeclarationSubmission {
            regime: TaxRegime::New,
            confirmed: None,
            sections: vec![],
        };
        assert_eq!(
            validate_submission(&sub),
            Err(SubmissionRejection::NewRegimeUnconfirmed)
        );

        let confirmed = DeclarationSubmission {
            regime: TaxRegime::New,
            confirmed: Some(true),
            sections: vec![],
        };
        assert!(validate_submission(&confirmed).is_ok());
    }

    #[test]
    fn section_tag_is_discriminated_at_deserialization() {
        let good: SectionUpdate = serde_json::from_str(
            r#"{"section":"house_rent","monthly_rent":8000.0,"landlord_pan":null,"metro_city":false}"#,
        )
        .unwrap();
        assert!(matches!(good, SectionUpdate::HouseRent(_)));

        let bad: Result<SectionUpdate, _> =
            serde_json::from_str(r#"{"section":"no_such_section","amount":1.0}"#);
        assert!(bad.is_err());
    }
}
