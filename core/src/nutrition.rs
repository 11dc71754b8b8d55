use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::nutrients::Nutrients;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

pub const DEFAULT_CALORIE_GOAL: f64 = 2500.0;
pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
pub const DEFAULT_CARBS_GOAL: f64 = 300.0;
pub const DEFAULT_FAT_GOAL: f64 = 80.0;
pub const DEFAULT_FIBER_GOAL: f64 = 35.0;

/// Convert a quantity with a unit to grams.
/// Volume-based conversions assume water density (1 ml = 1 g).
/// Returns `(grams, is_approximate)` where `is_approximate` is true for volume conversions.
#[must_use]
pub fn convert_to_grams(quantity: f64, unit: &str) -> Option<(f64, bool)> {
    let lower = unit.trim().to_lowercase();
    match lower.as_str() {
        "g" | "gram" | "grams" => Some((quantity, false)),
        "kg" | "kilogram" | "kilograms" => Some((quantity * 1000.0, false)),
        "lb" | "lbs" | "pound" | "pounds" => Some((quantity * 454.0, false)),
        "oz" | "ounce" | "ounces" => Some((quantity * 28.35, false)),
        "cup" | "cups" => Some((quantity * 240.0, true)),
        "tbsp" | "tablespoon" | "tablespoons" => Some((quantity * 15.0, true)),
        "tsp" | "teaspoon" | "teaspoons" => Some((quantity * 5.0, true)),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
            Some((quantity, true))
        }
        "l" | "liter" | "liters" | "litre" | "litres" => Some((quantity * 1000.0, true)),
        _ => None,
    }
}

/// Multiplier applied to a food's per-serving nutrients for a logged amount.
#[must_use]
pub fn scale_factor(amount: f64, serving_size: f64) -> f64 {
    if serving_size > 0.0 && amount.is_finite() {
        amount / serving_size
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MacroProgress {
    pub name: &'static str,
    pub current: f64,
    pub goal: f64,
    pub unit: &'static str,
    pub percentage: f64,
    pub remaining: f64,
    pub reached: bool,
}

impl MacroProgress {
    #[must_use]
    pub fn new(name: &'static str, current: f64, goal: f64, unit: &'static str) -> Self {
        let percentage = if goal > 0.0 {
            (current / goal * 100.0).min(100.0)
        } else {
            100.0
        };
        let remaining = (goal - current).max(0.0);
        Self {
            name,
            current,
            goal,
            unit,
            percentage,
            remaining,
            reached: remaining <= 0.0,
        }
    }
}

/// Daily goals, read from user settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            calories: DEFAULT_CALORIE_GOAL,
            protein_g: DEFAULT_PROTEIN_GOAL,
            carbs_g: DEFAULT_CARBS_GOAL,
            fat_g: DEFAULT_FAT_GOAL,
            fiber_g: DEFAULT_FIBER_GOAL,
        }
    }
}

impl Goals {
    /// Goals from a settings map; missing, blank, or non-positive values fall back to defaults.
    #[must_use]
    pub fn from_settings(settings: &serde_json::Map<String, serde_json::Value>) -> Self {
        let pick = |key: &str, default: f64| {
            setting_f64(settings, key)
                .filter(|v| *v > 0.0)
                .unwrap_or(default)
        };
        Self {
            calories: pick("calorie_goal", DEFAULT_CALORIE_GOAL),
            protein_g: pick("protein_goal", DEFAULT_PROTEIN_GOAL),
            carbs_g: pick("carbs_goal", DEFAULT_CARBS_GOAL),
            fat_g: pick("fat_goal", DEFAULT_FAT_GOAL),
            fiber_g: pick("fiber_goal", DEFAULT_FIBER_GOAL),
        }
    }

    /// Progress bars for calories, protein, carbs, and fat, in that order.
    #[must_use]
    pub fn progress(&self, totals: &Nutrients) -> [MacroProgress; 4] {
        [
            MacroProgress::new("Calories", totals.calories, self.calories, "kcal"),
            MacroProgress::new("Protein", totals.protein_g, self.protein_g, "g"),
            MacroProgress::new("Carbs", totals.carbs_g, self.carbs_g, "g"),
            MacroProgress::new("Fat", totals.fat_g, self.fat_g, "g"),
        ]
    }
}

/// Read a setting as a number. Settings may hold numbers or numeric text.
#[must_use]
pub fn setting_f64(settings: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<f64> {
    match settings.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieDistribution {
    pub protein_kcal: f64,
    pub carbs_kcal: f64,
    pub fat_kcal: f64,
    pub fiber_g: f64,
}

impl CalorieDistribution {
    #[must_use]
    pub fn of(totals: &Nutrients) -> Self {
        Self {
            protein_kcal: totals.protein_g * KCAL_PER_G_PROTEIN,
            carbs_kcal: totals.carbs_g * KCAL_PER_G_CARBS,
            fat_kcal: totals.fat_g * KCAL_PER_G_FAT,
            fiber_g: totals.fiber_g,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        Self::Sedentary,
        Self::Light,
        Self::Moderate,
        Self::Active,
        Self::VeryActive,
    ];

    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::VeryActive => "very_active",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let lower = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid activity level '{s}'. Must be one of: sedentary, light, moderate, active, very_active"
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    fn offset(self) -> f64 {
        match self {
            Self::Male => 5.0,
            Self::Female => -161.0,
        }
    }
}

/// Body profile used for energy estimates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<f64>,
    pub activity_level: ActivityLevel,
    pub sex: Sex,
}

impl Profile {
    /// Profile from a settings map. Unknown activity levels fall back to moderate.
    #[must_use]
    pub fn from_settings(settings: &serde_json::Map<String, serde_json::Value>) -> Self {
        let text = |key: &str| settings.get(key).and_then(serde_json::Value::as_str);
        Self {
            weight_kg: setting_f64(settings, "weight_kg"),
            height_cm: setting_f64(settings, "height_cm"),
            age: setting_f64(settings, "age"),
            activity_level: text("activity_level")
                .and_then(|s| ActivityLevel::parse(s).ok())
                .unwrap_or_default(),
            sex: match text("sex").map(str::to_lowercase).as_deref() {
                Some("female" | "f") => Sex::Female,
                _ => Sex::Male,
            },
        }
    }
}

/// Basal metabolic rate (Mifflin-St Jeor), rounded to whole kcal.
/// Returns 0 when weight, height, or age is missing or not positive.
#[must_use]
pub fn bmr(profile: &Profile) -> f64 {
    let (Some(weight), Some(height), Some(age)) =
        (profile.weight_kg, profile.height_cm, profile.age)
    else {
        return 0.0;
    };
    if weight <= 0.0 || height <= 0.0 || age <= 0.0 {
        return 0.0;
    }
    (10.0 * weight + 6.25 * height - 5.0 * age + profile.sex.offset()).round()
}

/// Total daily energy expenditure, rounded to whole kcal.
#[must_use]
pub fn tdee(profile: &Profile) -> f64 {
    (bmr(profile) * profile.activity_level.multiplier()).round()
}

/// Goals derived from the profile: calories at TDEE, 2 g protein per kg,
/// 45% of calories from carbs, 25% from fat, 35 g fiber.
#[must_use]
pub fn auto_goals(profile: &Profile) -> Option<Goals> {
    let calories = tdee(profile);
    if calories <= 0.0 {
        return None;
    }
    let weight = profile.weight_kg.unwrap_or(0.0);
    Some(Goals {
        calories,
        protein_g: (weight * 2.0).round(),
        carbs_g: (calories * 0.45 / KCAL_PER_G_CARBS).round(),
        fat_g: (calories * 0.25 / KCAL_PER_G_FAT).round(),
        fiber_g: DEFAULT_FIBER_GOAL,
    })
}

#[must_use]
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// `"Mon"` through `"Sun"`.
#[must_use]
pub fn short_weekday(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Pearson correlation of paired samples. `None` with fewer than 3 pairs
/// or when either series is constant.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 3 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
