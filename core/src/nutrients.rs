use std::ops::AddAssign;

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts a JSON number, a numeric string, an empty string, or null.
///
/// Form submissions send numbers as text and leave blank inputs as `""`;
/// both decode the way a spreadsheet cell would (blank reads as zero).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_f64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {value}")))
}

/// Numeric reading of a loosely-typed JSON value. Blank and null read as 0.
#[must_use]
pub fn value_to_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Null => Some(0.0),
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) if s.trim().is_empty() => Some(0.0),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Bool(_) | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

macro_rules! nutrient_row {
    ($($field:ident),+ $(,)?) => {
        /// Per-row nutrient values, shared by foods, meals and daily totals.
        ///
        /// Serialized flattened into the parent row: each nutrient is a
        /// top-level column keyed by its name.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Nutrients {
            $(
                #[serde(deserialize_with = "lenient_f64")]
                pub $field: f64,
            )+
        }

        /// Column names in sheet order.
        pub const NUTRIENT_COLUMNS: &[&str] = &[$(stringify!($field)),+];

        impl Nutrients {
            #[must_use]
            pub fn get(&self, column: &str) -> Option<f64> {
                $(
                    if column == stringify!($field) {
                        return Some(self.$field);
                    }
                )+
                None
            }

            /// Returns false when `column` is not a nutrient column.
            pub fn set(&mut self, column: &str, value: f64) -> bool {
                $(
                    if column == stringify!($field) {
                        self.$field = value;
                        return true;
                    }
                )+
                false
            }

            #[must_use]
            pub fn values(&self) -> Vec<f64> {
                vec![$(self.$field),+]
            }

            #[must_use]
            pub fn scaled(&self, factor: f64) -> Self {
                Self {
                    $($field: self.$field * factor,)+
                }
            }
        }

        impl AddAssign for Nutrients {
            fn add_assign(&mut self, rhs: Self) {
                $(self.$field += rhs.$field;)+
            }
        }
    };
}

nutrient_row! {
    calories,
    protein_g,
    carbs_g,
    fat_g,
    fiber_g,
    vitamin_a_mcg,
    vitamin_c_mg,
    vitamin_d_mcg,
    vitamin_e_mg,
    vitamin_k_mcg,
    thiamin_mg,
    riboflavin_mg,
    niacin_mg,
    b5_mg,
    b6_mg,
    biotin_mcg,
    folate_mcg,
    b12_mcg,
    calcium_mg,
    phosphorus_mg,
    magnesium_mg,
    sodium_mg,
    potassium_mg,
    iron_mg,
    zinc_mg,
    copper_mg,
    manganese_mg,
    iodine_mcg,
    selenium_mcg,
    chromium_mcg,
    omega3_g,
    omega6_g,
}

impl Nutrients {
    /// Build a row from values given in [`NUTRIENT_COLUMNS`] order.
    /// Missing trailing values stay 0; extra values are ignored.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        let mut row = Self::default();
        for (column, value) in NUTRIENT_COLUMNS.iter().zip(values) {
            row.set(column, *value);
        }
        row
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values().iter().all(|v| *v == 0.0)
    }
}

impl std::iter::Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut total = Self::default();
        for row in iter {
            total += row;
        }
        total
    }
}
