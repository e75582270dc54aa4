//! Periodic clinical assessments recorded against an onboarding.

use serde::{Deserialize, Serialize};

use crate::onboarding::Diagnosis;

pub const FIELD_BLOOD_GLUCOSE: &str = "blood_glucose";
pub const FIELD_SYSTOLIC_BP: &str = "systolic_bp";
pub const FIELD_DIASTOLIC_BP: &str = "diastolic_bp";
pub const FIELD_WEIGHT_KG: &str = "weight_kg";
pub const FIELD_HEIGHT_CM: &str = "height_cm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Weekly,
    ThreeMonthly,
    SixMonthly,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::ThreeMonthly => "three_monthly",
            Self::SixMonthly => "six_monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Self::Weekly),
            "three_monthly" => Some(Self::ThreeMonthly),
            "six_monthly" => Some(Self::SixMonthly),
            _ => None,
        }
    }
}

/// Clinical measurements captured by an assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub blood_glucose: Option<f64>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

impl Measurements {
    fn has(&self, field: &str) -> bool {
        match field {
            FIELD_BLOOD_GLUCOSE => self.blood_glucose.is_some(),
            FIELD_SYSTOLIC_BP => self.systolic_bp.is_some(),
            FIELD_DIASTOLIC_BP => self.diastolic_bp.is_some(),
            FIELD_WEIGHT_KG => self.weight_kg.is_some(),
            FIELD_HEIGHT_CM => self.height_cm.is_some(),
            _ => false,
        }
    }

    /// Body-mass index, when both weight and height are present.
    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let m = h / 100.0;
                Some((w / (m * m) * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }
}

/// Measurements a diagnosis makes mandatory.
pub fn required_for(diagnosis: Diagnosis) -> &'static [&'static str] {
    match diagnosis {
        Diagnosis::Diabetes => &[FIELD_BLOOD_GLUCOSE],
        Diagnosis::Cardiovascular => &[FIELD_SYSTOLIC_BP, FIELD_DIASTOLIC_BP],
        Diagnosis::Obesity => &[FIELD_WEIGHT_KG, FIELD_HEIGHT_CM],
    }
}

/// Mandatory measurements absent from `m`, in a stable order without duplicates.
pub fn missing_fields(diagnoses: &[Diagnosis], m: &Measurements) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for field in diagnoses.iter().flat_map(|d| required_for(*d)) {
        if !m.has(field) && !missing.contains(field) {
            missing.push(*field);
        }
    }
    missing
}
