//! Feature encoding for cardiovascular risk model inference.
//!
//! Turns a validated [`RawInput`] into the exact numeric vector the trained
//! classifier expects. Column order and age unit are properties of the
//! trained artifact, not of the request.

use crate::types::patient::{Gender, LabLevel, RawInput};
use serde::Deserialize;

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 11;

/// Column names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "height",
    "weight",
    "gender",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
];

const DAYS_PER_YEAR: f32 = 365.0;

/// Unit the age column was expressed in when the model was trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    /// Years multiplied by 365, as the training job stores it
    #[default]
    Days,
    Years,
}

impl AgeUnit {
    fn convert(self, years: u32) -> f32 {
        match self {
            AgeUnit::Days => years as f32 * DAYS_PER_YEAR,
            AgeUnit::Years => years as f32,
        }
    }
}

/// Encoded model input, always exactly [`FEATURE_COUNT`] values long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// Encoder from raw form values to the classifier's feature schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    age_unit: AgeUnit,
}

impl FeatureEncoder {
    pub fn new(age_unit: AgeUnit) -> Self {
        Self { age_unit }
    }

    pub fn age_unit(&self) -> AgeUnit {
        self.age_unit
    }

    /// Encode raw input into a feature vector.
    ///
    /// Pure and total: ranges are assumed to be enforced upstream and zero
    /// fields are rejected before this is called.
    pub fn encode(&self, input: &RawInput) -> FeatureVector {
        FeatureVector([
            self.age_unit.convert(input.age),
            input.height_cm as f32,
            input.weight_kg as f32,
            gender_code(input.gender),
            input.systolic_bp as f32,
            input.diastolic_bp as f32,
            lab_level_code(input.cholesterol),
            lab_level_code(input.glucose),
            flag_code(input.smoker),
            flag_code(input.drinks_alcohol),
            flag_code(input.physically_active),
        ])
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

fn gender_code(gender: Gender) -> f32 {
    match gender {
        Gender::Male => 1.0,
        Gender::Female => 0.0,
    }
}

fn lab_level_code(level: LabLevel) -> f32 {
    match level {
        LabLevel::Normal => 1.0,
        LabLevel::AboveNormal => 2.0,
        LabLevel::High => 3.0,
    }
}

fn flag_code(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        0.0
    }
}
