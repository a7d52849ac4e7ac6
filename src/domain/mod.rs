//! Pure nutrition-domain calculators.
//!
//! Unit conversion, target-calorie computation, the health-score formula and
//! the unrealistic-profile guard. Everything here is deterministic: the same
//! inputs always produce the same outputs, and nothing touches the database.

use thiserror::Error;

pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_POUND: f64 = 0.45359237;

/// Hard bounds applied to every computed calorie target.
pub const MIN_TARGET_CALORIES: i32 = 1200;
pub const MAX_TARGET_CALORIES: i32 = 4000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("height_unit must be 'cm' or 'in'")]
    InvalidHeightUnit,

    #[error("weight_unit must be 'kg' or 'lb'")]
    InvalidWeightUnit,

    #[error("Invalid dietary_goal")]
    InvalidDietaryGoal,
}

/// Dietary goal driving the calorie-target multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietaryGoal {
    WeightLoss,
    Maintain,
    EatHealthy,
    WeightGain,
}

impl DietaryGoal {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "weight_loss" => Ok(Self::WeightLoss),
            "maintain" => Ok(Self::Maintain),
            "eat_healthy" => Ok(Self::EatHealthy),
            "weight_gain" => Ok(Self::WeightGain),
            _ => Err(DomainError::InvalidDietaryGoal),
        }
    }

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::WeightLoss => 0.80,
            Self::Maintain | Self::EatHealthy => 1.00,
            Self::WeightGain => 1.15,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::Maintain => "maintain",
            Self::EatHealthy => "eat_healthy",
            Self::WeightGain => "weight_gain",
        }
    }
}

pub fn validate_height_unit(unit: &str) -> Result<(), DomainError> {
    match unit {
        "cm" | "in" => Ok(()),
        _ => Err(DomainError::InvalidHeightUnit),
    }
}

pub fn validate_weight_unit(unit: &str) -> Result<(), DomainError> {
    match unit {
        "kg" | "lb" => Ok(()),
        _ => Err(DomainError::InvalidWeightUnit),
    }
}

/// Unknown units fall back to centimeters (profile rows written before unit
/// validation existed carry free-text units).
#[must_use]
pub fn to_cm(value: f64, unit: &str) -> f64 {
    if unit == "in" { value * CM_PER_INCH } else { value }
}

/// Unknown units fall back to kilograms.
#[must_use]
pub fn to_kg(value: f64, unit: &str) -> f64 {
    if unit == "lb" { value * KG_PER_POUND } else { value }
}

/// Daily calorie target from body profile and goal.
///
/// baseline = 22.0 x weight_kg + 6.0 x height_cm, scaled by the goal
/// multiplier (unknown goals count as maintain), rounded to the nearest
/// multiple of 10 and clamped to [1200, 4000].
#[must_use]
pub fn target_calories(
    height_value: f64,
    height_unit: &str,
    weight_value: f64,
    weight_unit: &str,
    dietary_goal: &str,
) -> i32 {
    let h_cm = to_cm(height_value, height_unit);
    let w_kg = to_kg(weight_value, weight_unit);

    let baseline = 22.0 * w_kg + 6.0 * h_cm;
    let mult = DietaryGoal::parse(dietary_goal).map_or(1.00, DietaryGoal::multiplier);
    let raw = baseline * mult;

    let rounded = ((raw / 10.0).round() * 10.0) as i32;
    rounded.clamp(MIN_TARGET_CALORIES, MAX_TARGET_CALORIES)
}

/// Profiles outside these bands need an explicit confirmation flag before
/// any profile-affecting write goes through.
#[must_use]
pub fn unrealistic(height_cm: f64, weight_kg: f64) -> bool {
    height_cm < 100.0 || height_cm > 250.0 || weight_kg < 30.0 || weight_kg > 300.0
}

/// Health score for one consumption entry:
/// 70 + 50 x (protein/calories) + 5 x fiber - 2.5 x sugars,
/// rounded to 2 decimals and clamped to [0, 100]. Zero-calorie entries
/// score 0 rather than dividing by zero.
#[must_use]
pub fn health_score(calories: f64, protein: f64, fiber: f64, sugars: f64) -> f64 {
    if calories <= 0.0 {
        return 0.0;
    }
    let protein_score = (protein / calories) * 50.0;
    let fiber_score = fiber * 5.0;
    let sugar_penalty = sugars * 2.5;
    let score = 70.0 + protein_score + fiber_score - sugar_penalty;
    ((score * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
