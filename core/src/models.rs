use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::nutrients::{Nutrients, lenient_f64};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub food_id: String,
    pub food_name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: f64,
    pub serving_unit: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub water_g: f64,
    pub is_verified: bool,
    pub source: String,
    pub date_added: String,
    pub last_updated: String,
}

fn default_serving_size() -> f64 {
    100.0
}

fn default_serving_unit() -> String {
    "g".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFood {
    pub food_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default = "default_serving_size", deserialize_with = "lenient_f64")]
    pub serving_size: f64,
    #[serde(default = "default_serving_unit")]
    pub serving_unit: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub water_g: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Partial food update. Only supplied columns change.
///
/// Nutrient columns arrive as top-level keys alongside the descriptive
/// fields; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodPatch {
    pub food_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub columns: serde_json::Map<String, serde_json::Value>,
}

impl FoodPatch {
    /// Reject non-numeric or negative nutrient values and a non-positive serving size.
    pub fn validate(&self) -> Result<()> {
        if self.food_id.trim().is_empty() {
            bail!("food_id must not be empty");
        }
        if self.food_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            bail!("food_name must not be empty");
        }
        if self.serving_size.is_some_and(|s| s <= 0.0) {
            bail!("serving_size must be greater than 0");
        }
        if self.water_g.is_some_and(|w| w < 0.0) {
            bail!("water_g must not be negative");
        }
        let defaults = Nutrients::default();
        for (column, value) in &self.columns {
            if defaults.get(column).is_none() {
                continue;
            }
            match crate::nutrients::value_to_f64(value) {
                Some(number) if number >= 0.0 && number.is_finite() => {}
                Some(_) => bail!("{column} must not be negative"),
                None => bail!("{column} must be a number"),
            }
        }
        Ok(())
    }

    /// Apply this patch onto `food`. Unknown and non-numeric columns are skipped;
    /// call [`FoodPatch::validate`] first to reject them instead.
    pub fn apply(&self, food: &mut Food) {
        if let Some(name) = &self.food_name {
            food.food_name = name.trim().to_string();
        }
        if let Some(brand) = &self.brand {
            food.brand = non_empty(brand);
        }
        if let Some(category) = &self.category {
            food.category = non_empty(category);
        }
        if let Some(barcode) = &self.barcode {
            food.barcode = non_empty(barcode);
        }
        if let Some(size) = self.serving_size {
            food.serving_size = size;
        }
        if let Some(unit) = &self.serving_unit {
            food.serving_unit.clone_from(unit);
        }
        if let Some(water) = self.water_g {
            food.water_g = water;
        }
        if let Some(verified) = self.is_verified {
            food.is_verified = verified;
        }
        if let Some(source) = &self.source {
            food.source.clone_from(source);
        }
        for (column, value) in &self.columns {
            if let Some(number) = crate::nutrients::value_to_f64(value) {
                food.nutrients.set(column, number);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_id: String,
    pub date: String,
    pub timestamp: String,
    pub meal_type: String,
    pub food_id: Option<String>,
    pub food_name: Option<String>,
    pub amount: f64,
    pub unit: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    pub notes: Option<String>,
}

/// A meal as submitted by a client.
///
/// When `food_id` names a stored food and no nutrient values are given,
/// the store fills them in from the food scaled to `amount`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMeal {
    #[serde(default)]
    pub date: Option<String>,
    pub meal_type: String,
    #[serde(default)]
    pub food_id: Option<String>,
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Wellness columns carried on a daily log row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyWellness {
    pub water_l: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<f64>,
    pub steps: Option<f64>,
    pub workout_minutes: Option<f64>,
    pub mood: Option<f64>,
    pub energy: Option<f64>,
    pub stress: Option<f64>,
}

/// One `Daily_Logs` row: the day's nutrient totals plus wellness columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub day_of_week: String,
    pub week_number: u32,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(flatten)]
    pub wellness: DailyWellness,
    pub notes: Option<String>,
}

impl DailyStats {
    /// Stats for a day with nothing logged.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            day_of_week: crate::nutrition::short_weekday(date),
            week_number: crate::nutrition::iso_week_number(date),
            nutrients: Nutrients::default(),
            wellness: DailyWellness::default(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellnessEntry {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub sleep_start: Option<String>,
    #[serde(default)]
    pub sleep_end: Option<String>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub sleep_quality: Option<f64>,
    #[serde(default)]
    pub sleep_notes: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub body_fat_percent: Option<f64>,
    #[serde(default)]
    pub muscle_mass_kg: Option<f64>,
    #[serde(default)]
    pub mood: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub stress: Option<f64>,
    #[serde(default)]
    pub focus: Option<f64>,
    #[serde(default)]
    pub motivation: Option<f64>,
    #[serde(default)]
    pub steps: Option<f64>,
    #[serde(default)]
    pub active_minutes: Option<f64>,
    #[serde(default)]
    pub workout_type: Option<String>,
    #[serde(default)]
    pub workout_duration: Option<f64>,
    #[serde(default)]
    pub workout_intensity: Option<String>,
    #[serde(default)]
    pub hydration_l: Option<f64>,
    #[serde(default)]
    pub caffeine_mg: Option<f64>,
    #[serde(default)]
    pub alcohol_units: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl WellnessEntry {
    /// The subset of this entry that lands on the day's `Daily_Logs` row.
    #[must_use]
    pub fn daily_columns(&self) -> DailyWellness {
        DailyWellness {
            water_l: self.hydration_l,
            weight_kg: self.weight_kg,
            sleep_hours: self.sleep_hours,
            sleep_quality: self.sleep_quality,
            steps: self.steps,
            workout_minutes: self.workout_duration,
            mood: self.mood,
            energy: self.energy,
            stress: self.stress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub insight_id: String,
    pub date_generated: String,
    pub period_start: String,
    pub period_end: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub category: String,
    pub title: String,
    pub summary: String,
    pub detailed_analysis: String,
    pub recommendations: String,
    pub research_references: String,
    pub data_sources: String,
    pub confidence_score: f64,
    pub is_read: bool,
    pub is_applied: bool,
    pub user_rating: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInsightRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub correlation_id: String,
    pub date_calculated: String,
    pub variable_1: String,
    pub variable_2: String,
    pub correlation_coefficient: f64,
    pub p_value: Option<f64>,
    pub sample_size: i64,
    pub period_days: i64,
    pub interpretation: String,
    pub is_significant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodFilter {
    pub category: Option<String>,
    pub verified_only: bool,
    pub limit: usize,
}

pub const DEFAULT_FOOD_LIMIT: usize = 100;
pub const SEARCH_LIMIT: usize = 20;

impl Default for FoodFilter {
    fn default() -> Self {
        Self {
            category: None,
            verified_only: false,
            limit: DEFAULT_FOOD_LIMIT,
        }
    }
}

/// Body of every successful write action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_id: Option<String>,
}

impl ActionResponse {
    #[must_use]
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            ..Self::default()
        }
    }
}

/// Authenticated caller. The workbook is keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Development auth: any token that looks like an email names its user.
#[must_use]
pub fn validate_user_token(token: &str) -> Option<User> {
    let token = token.trim();
    let (local, domain) = token.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(User {
        id: token.to_string(),
        email: token.to_string(),
        name: local.to_string(),
    })
}

pub const MEAL_TYPES: &[&str] = &["Breakfast", "Lunch", "Dinner", "Snack"];

pub fn validate_meal_type(meal: &str) -> Result<String> {
    MEAL_TYPES
        .iter()
        .find(|m| m.eq_ignore_ascii_case(meal.trim()))
        .map(|m| (*m).to_string())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid meal type '{meal}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            )
        })
}

pub fn validate_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| anyhow::anyhow!("Invalid date '{date}'. Use YYYY-MM-DD"))
}

/// Validate a submitted food: name present, serving size positive, no negative nutrients.
pub fn validate_food(food: &NewFood) -> Result<()> {
    if food.food_name.trim().is_empty() {
        bail!("food_name must not be empty");
    }
    if food.serving_size <= 0.0 {
        bail!("serving_size must be greater than 0");
    }
    validate_nutrients(&food.nutrients)?;
    if food.water_g < 0.0 {
        bail!("water_g must not be negative");
    }
    Ok(())
}

pub fn validate_nutrients(nutrients: &Nutrients) -> Result<()> {
    for (column, value) in crate::nutrients::NUTRIENT_COLUMNS
        .iter()
        .zip(nutrients.values())
    {
        if value < 0.0 || !value.is_finite() {
            bail!("{column} must not be negative");
        }
    }
    Ok(())
}

/// Scores must lie in 1-10 and amounts must not be negative.
pub fn validate_wellness(entry: &WellnessEntry) -> Result<()> {
    let scores = [
        ("sleep_quality", entry.sleep_quality),
        ("mood", entry.mood),
        ("energy", entry.energy),
        ("stress", entry.stress),
        ("focus", entry.focus),
        ("motivation", entry.motivation),
    ];
    for (name, score) in scores {
        if let Some(v) = score.filter(|v| !(1.0..=10.0).contains(v)) {
            bail!("{name} must be between 1 and 10 (got {v})");
        }
    }
    let amounts = [
        ("sleep_hours", entry.sleep_hours),
        ("weight_kg", entry.weight_kg),
        ("body_fat_percent", entry.body_fat_percent),
        ("muscle_mass_kg", entry.muscle_mass_kg),
        ("steps", entry.steps),
        ("active_minutes", entry.active_minutes),
        ("workout_duration", entry.workout_duration),
        ("hydration_l", entry.hydration_l),
        ("caffeine_mg", entry.caffeine_mg),
        ("alcohol_units", entry.alcohol_units),
    ];
    for (name, amount) in amounts {
        if amount.is_some_and(|v| v < 0.0 || !v.is_finite()) {
            bail!("{name} must not be negative");
        }
    }
    Ok(())
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Generate a row ID of the form `<prefix><unix millis>`.
///
/// IDs are strictly increasing within the process: two calls in the same
/// millisecond get consecutive values.
#[must_use]
pub fn next_id(prefix: char) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID_MILLIS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID_MILLIS.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return format!("{prefix}{candidate}"),
            Err(actual) => last = actual,
        }
    }
}
