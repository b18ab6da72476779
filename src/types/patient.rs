//! Patient data structures collected by the intake form

use crate::error::ValidationError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Biological sex as recorded by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "male", alias = "MALE")]
    Male,
    #[serde(alias = "female", alias = "FEMALE")]
    Female,
}

/// Three-step lab level used for both cholesterol and glucose.
///
/// Accepts the form labels shown to the user, e.g. `"Above Normal (200-239 mg/dL)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabLevel {
    #[serde(
        alias = "normal",
        alias = "Normal (Below 200 mg/dL)",
        alias = "Normal (80-160 mg/dL)"
    )]
    Normal,
    #[serde(
        alias = "above_normal",
        alias = "Above Normal",
        alias = "Above Normal (200-239 mg/dL)",
        alias = "Above Normal (160-199 mg/dL)"
    )]
    AboveNormal,
    #[serde(
        alias = "high",
        alias = "High (240 mg/dL and above)",
        alias = "High (200 mg/dL and above)"
    )]
    High,
}

impl LabLevel {
    pub const ALL: [LabLevel; 3] = [LabLevel::Normal, LabLevel::AboveNormal, LabLevel::High];
}

/// Raw health metrics as entered by the patient.
///
/// Numeric fields default to zero when absent; zero means "unset" and is
/// rejected by [`RawInput::validate`] before any encoding happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Age in years (0-120)
    #[serde(default)]
    pub age: u32,

    pub gender: Gender,

    /// Height in centimetres (0-250)
    #[serde(default, alias = "height")]
    pub height_cm: u32,

    /// Weight in kilograms (0-250)
    #[serde(default, alias = "weight")]
    pub weight_kg: u32,

    /// Systolic blood pressure in mmHg (0-250)
    #[serde(default, alias = "ap_hi")]
    pub systolic_bp: u32,

    /// Diastolic blood pressure in mmHg (0-150)
    #[serde(default, alias = "ap_lo")]
    pub diastolic_bp: u32,

    pub cholesterol: LabLevel,

    #[serde(alias = "gluc")]
    pub glucose: LabLevel,

    #[serde(alias = "smoke", deserialize_with = "yes_no")]
    pub smoker: bool,

    #[serde(alias = "alco", deserialize_with = "yes_no")]
    pub drinks_alcohol: bool,

    #[serde(alias = "active", deserialize_with = "yes_no")]
    pub physically_active: bool,
}

impl RawInput {
    /// Check that every required numeric field is set.
    ///
    /// Ranges are not re-checked here; the collector enforces them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("age", self.age),
            ("height_cm", self.height_cm),
            ("weight_kg", self.weight_kg),
            ("systolic_bp", self.systolic_bp),
            ("diastolic_bp", self.diastolic_bp),
        ];

        match required.iter().find(|(_, value)| *value == 0) {
            Some(&(field, _)) => Err(ValidationError::ZeroOrMissingField { field }),
            None => Ok(()),
        }
    }
}

/// A single prediction request as received from the intake side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Caller-supplied identifier, echoed back in the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub input: RawInput,
}

/// Accept `true`/`false`, `1`/`0` or the form's `"Yes"`/`"No"`.
fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct YesNoVisitor;

    impl Visitor<'_> for YesNoVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean, 0/1, or \"Yes\"/\"No\"")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.to_ascii_lowercase().as_str() {
                "yes" | "true" => Ok(true),
                "no" | "false" => Ok(false),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(YesNoVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawInput {
        RawInput {
            age: 45,
            gender: Gender::Male,
            height_cm: 170,
            weight_kg: 80,
            systolic_bp: 130,
            diastolic_bp: 85,
            cholesterol: LabLevel::Normal,
            glucose: LabLevel::Normal,
            smoker: false,
            drinks_alcohol: false,
            physically_active: true,
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_each_zero_field() {
        let cases: [(&'static str, fn(&mut RawInput)); 5] = [
            ("age", |i| i.age = 0),
            ("height_cm", |i| i.height_cm = 0),
            ("weight_kg", |i| i.weight_kg = 0),
            ("systolic_bp", |i| i.systolic_bp = 0),
            ("diastolic_bp", |i| i.diastolic_bp = 0),
        ];

        for (field, zero_out) in cases {
            let mut input = sample();
            zero_out(&mut input);
            assert_eq!(
                input.validate(),
                Err(ValidationError::ZeroOrMissingField { field })
            );
        }
    }

    #[test]
    fn test_deserialize_form_labels() {
        let json = r#"{
            "id": "p-1",
            "age": 52,
            "gender": "Female",
            "height": 160,
            "weight": 70,
            "ap_hi": 140,
            "ap_lo": 90,
            "cholesterol": "Above Normal (200-239 mg/dL)",
            "glucose": "High (200 mg/dL and above)",
            "smoker": "No",
            "drinks_alcohol": "Yes",
            "physically_active": true
        }"#;

        let record: PatientRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id.as_deref(), Some("p-1"));
        assert_eq!(record.input.gender, Gender::Female);
        assert_eq!(record.input.height_cm, 160);
        assert_eq!(record.input.systolic_bp, 140);
        assert_eq!(record.input.cholesterol, LabLevel::AboveNormal);
        assert_eq!(record.input.glucose, LabLevel::High);
        assert!(!record.input.smoker);
        assert!(record.input.drinks_alcohol);
        assert!(record.input.physically_active);
    }

    #[test]
    fn test_missing_numeric_field_is_unset() {
        let json = r#"{
            "age": 30, "gender": "Male", "height_cm": 180, "weight_kg": 75,
            "diastolic_bp": 80, "cholesterol": "Normal", "glucose": "Normal",
            "smoker": 0, "drinks_alcohol": 0, "physically_active": 1
        }"#;

        let record: PatientRecord = serde_json::from_str(json).unwrap();

        assert!(record.id.is_none());
        assert_eq!(record.input.systolic_bp, 0);
        assert_eq!(
            record.input.validate(),
            Err(ValidationError::ZeroOrMissingField {
                field: "systolic_bp"
            })
        );
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let json = r#"{
            "age": 30, "gender": "Male", "height_cm": 180, "weight_kg": 75,
            "systolic_bp": 120, "diastolic_bp": 80, "cholesterol": "Very High",
            "glucose": "Normal", "smoker": "No", "drinks_alcohol": "No",
            "physically_active": "Maybe"
        }"#;

        assert!(serde_json::from_str::<PatientRecord>(json).is_err());
    }
}
