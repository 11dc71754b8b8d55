use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Map;

use crate::insights;
use crate::models::{
    Correlation, DATE_FORMAT, DailyStats, DailyWellness, Food, FoodFilter, FoodPatch, Insight,
    Meal, NewFood, NewInsightRequest, NewMeal, SEARCH_LIMIT, WellnessEntry, next_id, non_empty,
    validate_date,
};
use crate::nutrients::{NUTRIENT_COLUMNS, Nutrients};
use crate::nutrition::{Goals, iso_week_number, scale_factor, short_weekday};

type Columns = Vec<(&'static str, Value)>;

const WELLNESS_COLUMNS: &[&str] = &[
    "water_l",
    "weight_kg",
    "sleep_hours",
    "sleep_quality",
    "steps",
    "workout_minutes",
    "mood",
    "energy",
    "stress",
];

/// One user's workbook.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the workbook at `path`, creating and seeding it for `user_id` on first use.
    pub fn open(path: &Path, user_id: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
        Self::init(conn, user_id)
    }

    pub fn open_in_memory(user_id: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, user_id)
    }

    fn init(conn: Connection, user_id: &str) -> Result<Self> {
        let db = Database { conn };
        if db.migrate()? {
            db.seed(user_id)?;
        }
        Ok(db)
    }

    /// Returns true when the sheets were created by this call.
    fn migrate(&self) -> Result<bool> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version >= 1 {
            return Ok(false);
        }

        let nutrients = NUTRIENT_COLUMNS
            .iter()
            .map(|c| format!("{c} REAL NOT NULL DEFAULT 0"))
            .collect::<Vec<_>>()
            .join(",\n");
        let wellness = WELLNESS_COLUMNS
            .iter()
            .map(|c| format!("{c} REAL"))
            .collect::<Vec<_>>()
            .join(",\n");

        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS Daily_Logs (
                date TEXT NOT NULL,
                day_of_week TEXT NOT NULL,
                week_number INTEGER NOT NULL,
                {nutrients},
                {wellness},
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS Food_Database (
                food_id TEXT NOT NULL,
                food_name TEXT NOT NULL,
                brand TEXT,
                category TEXT,
                barcode TEXT,
                serving_size REAL NOT NULL,
                serving_unit TEXT NOT NULL,
                {nutrients},
                water_g REAL NOT NULL DEFAULT 0,
                is_verified INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL,
                date_added TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS Meals_Log (
                meal_id TEXT NOT NULL,
                date TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                meal_type TEXT NOT NULL,
                food_id TEXT,
                food_name TEXT,
                amount REAL NOT NULL,
                unit TEXT NOT NULL,
                {nutrients},
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS AI_Insights (
                insight_id TEXT NOT NULL,
                date_generated TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                type TEXT NOT NULL,
                priority TEXT NOT NULL,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                detailed_analysis TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                research_references TEXT NOT NULL,
                data_sources TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                is_applied INTEGER NOT NULL DEFAULT 0,
                user_rating INTEGER
            );

            CREATE TABLE IF NOT EXISTS User_Settings (
                setting_key TEXT NOT NULL,
                setting_value TEXT NOT NULL,
                category TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS Wellness_Log (
                date TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                sleep_start TEXT,
                sleep_end TEXT,
                sleep_hours REAL,
                sleep_quality REAL,
                sleep_notes TEXT,
                weight_kg REAL,
                body_fat_percent REAL,
                muscle_mass_kg REAL,
                mood REAL,
                energy REAL,
                stress REAL,
                focus REAL,
                motivation REAL,
                steps REAL,
                active_minutes REAL,
                workout_type TEXT,
                workout_duration REAL,
                workout_intensity TEXT,
                hydration_l REAL,
                caffeine_mg REAL,
                alcohol_units REAL,
                notes TEXT,
                tags TEXT
            );

            CREATE TABLE IF NOT EXISTS Correlations (
                correlation_id TEXT NOT NULL,
                date_calculated TEXT NOT NULL,
                variable_1 TEXT NOT NULL,
                variable_2 TEXT NOT NULL,
                correlation_coefficient REAL NOT NULL,
                p_value REAL,
                sample_size INTEGER NOT NULL,
                period_days INTEGER NOT NULL,
                interpretation TEXT NOT NULL,
                is_significant INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_daily_logs_date ON Daily_Logs(date);
            CREATE INDEX IF NOT EXISTS idx_meals_log_date ON Meals_Log(date);
            CREATE INDEX IF NOT EXISTS idx_food_database_id ON Food_Database(food_id);
            CREATE INDEX IF NOT EXISTS idx_user_settings_key ON User_Settings(setting_key);

            PRAGMA user_version = 1;"
        ))?;
        Ok(true)
    }

    fn seed(&self, user_id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for food in sample_foods() {
            self.insert_row("Food_Database", &food_columns(&food))?;
        }
        let now = Local::now().to_rfc3339();
        for (key, value, category) in default_settings(user_id) {
            self.conn.execute(
                "INSERT INTO User_Settings (setting_key, setting_value, category, last_updated)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, serde_json::to_string(&value)?, category, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- Row helpers ---

    fn insert_row(&self, table: &str, columns: &[(&'static str, Value)]) -> Result<()> {
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(columns.iter().map(|(_, v)| v)))?;
        Ok(())
    }

    fn update_row(&self, table: &str, rowid: i64, columns: &[(&'static str, Value)]) -> Result<()> {
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE rowid = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );
        let values = columns
            .iter()
            .map(|(_, v)| v.clone())
            .chain(std::iter::once(Value::Integer(rowid)));
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn nutrients_from_row(row: &rusqlite::Row) -> rusqlite::Result<Nutrients> {
        let mut nutrients = Nutrients::default();
        for column in NUTRIENT_COLUMNS {
            nutrients.set(column, row.get::<_, f64>(*column)?);
        }
        Ok(nutrients)
    }

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            food_id: row.get("food_id")?,
            food_name: row.get("food_name")?,
            brand: row.get("brand")?,
            category: row.get("category")?,
            barcode: row.get("barcode")?,
            serving_size: row.get("serving_size")?,
            serving_unit: row.get("serving_unit")?,
            nutrients: Self::nutrients_from_row(row)?,
            water_g: row.get("water_g")?,
            is_verified: row.get("is_verified")?,
            source: row.get("source")?,
            date_added: row.get("date_added")?,
            last_updated: row.get("last_updated")?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        Ok(Meal {
            meal_id: row.get("meal_id")?,
            date: row.get("date")?,
            timestamp: row.get("timestamp")?,
            meal_type: row.get("meal_type")?,
            food_id: row.get("food_id")?,
            food_name: row.get("food_name")?,
            amount: row.get("amount")?,
            unit: row.get("unit")?,
            nutrients: Self::nutrients_from_row(row)?,
            notes: row.get("notes")?,
        })
    }

    fn daily_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyStats> {
        Ok(DailyStats {
            date: row.get("date")?,
            day_of_week: row.get("day_of_week")?,
            week_number: row.get("week_number")?,
            nutrients: Self::nutrients_from_row(row)?,
            wellness: DailyWellness {
                water_l: row.get("water_l")?,
                weight_kg: row.get("weight_kg")?,
                sleep_hours: row.get("sleep_hours")?,
                sleep_quality: row.get("sleep_quality")?,
                steps: row.get("steps")?,
                workout_minutes: row.get("workout_minutes")?,
                mood: row.get("mood")?,
                energy: row.get("energy")?,
                stress: row.get("stress")?,
            },
            notes: row.get("notes")?,
        })
    }

    fn insight_from_row(row: &rusqlite::Row) -> rusqlite::Result<Insight> {
        Ok(Insight {
            insight_id: row.get("insight_id")?,
            date_generated: row.get("date_generated")?,
            period_start: row.get("period_start")?,
            period_end: row.get("period_end")?,
            kind: row.get("type")?,
            priority: row.get("priority")?,
            category: row.get("category")?,
            title: row.get("title")?,
            summary: row.get("summary")?,
            detailed_analysis: row.get("detailed_analysis")?,
            recommendations: row.get("recommendations")?,
            research_references: row.get("research_references")?,
            data_sources: row.get("data_sources")?,
            confidence_score: row.get("confidence_score")?,
            is_read: row.get("is_read")?,
            is_applied: row.get("is_applied")?,
            user_rating: row.get("user_rating")?,
        })
    }

    fn correlation_from_row(row: &rusqlite::Row) -> rusqlite::Result<Correlation> {
        Ok(Correlation {
            correlation_id: row.get("correlation_id")?,
            date_calculated: row.get("date_calculated")?,
            variable_1: row.get("variable_1")?,
            variable_2: row.get("variable_2")?,
            correlation_coefficient: row.get("correlation_coefficient")?,
            p_value: row.get("p_value")?,
            sample_size: row.get("sample_size")?,
            period_days: row.get("period_days")?,
            interpretation: row.get("interpretation")?,
            is_significant: row.get("is_significant")?,
        })
    }

    // --- Daily logs ---

    /// The day's totals row, or an all-zero record when nothing is logged.
    pub fn get_daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let stats = self
            .conn
            .query_row(
                "SELECT * FROM Daily_Logs WHERE date = ?1 ORDER BY rowid LIMIT 1",
                params![date_str],
                Self::daily_from_row,
            )
            .optional()?;
        Ok(stats.unwrap_or_else(|| DailyStats::empty(date)))
    }

    /// Daily rows with `start <= date <= end`, oldest first.
    pub fn get_daily_logs(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM Daily_Logs WHERE date >= ?1 AND date <= ?2 ORDER BY date, rowid",
        )?;
        let logs = stmt
            .query_map(
                params![
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                Self::daily_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn daily_rowid(&self, date: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT rowid FROM Daily_Logs WHERE date = ?1 ORDER BY rowid LIMIT 1",
                params![date],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Recompute the day's nutrient totals from its meals.
    ///
    /// The existing row keeps its wellness columns; a missing row is appended.
    pub fn update_daily_totals(&self, date: NaiveDate) -> Result<DailyStats> {
        let tx = self.conn.unchecked_transaction()?;
        self.write_daily_totals(date)?;
        tx.commit()?;
        self.get_daily_stats(date)
    }

    fn write_daily_totals(&self, date: NaiveDate) -> Result<()> {
        let totals: Nutrients = self.get_meals(date)?.iter().map(|m| m.nutrients).sum();
        let date_str = date.format(DATE_FORMAT).to_string();

        let mut columns: Columns = vec![
            ("date", Value::from(date_str.clone())),
            ("day_of_week", Value::from(short_weekday(date))),
            ("week_number", Value::from(iso_week_number(date))),
        ];
        columns.extend(nutrient_columns(&totals));

        match self.daily_rowid(&date_str)? {
            Some(rowid) => self.update_row("Daily_Logs", rowid, &columns),
            None => self.insert_row("Daily_Logs", &columns),
        }
    }

    // --- Foods ---

    /// Foods in insertion order, filtered by category and verification, truncated to `limit`.
    pub fn get_food_database(&self, filter: &FoodFilter) -> Result<Vec<Food>> {
        let foods = self
            .all_foods()?
            .into_iter()
            .filter(|f| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| f.category.as_deref() == Some(c))
            })
            .filter(|f| !filter.verified_only || f.is_verified)
            .take(filter.limit)
            .collect();
        Ok(foods)
    }

    /// Case-insensitive substring match on the food name, first 20 hits.
    pub fn search_foods(&self, query: &str) -> Result<Vec<Food>> {
        let needle = query.trim().to_lowercase();
        let foods = self
            .all_foods()?
            .into_iter()
            .filter(|f| f.food_name.to_lowercase().contains(&needle))
            .take(SEARCH_LIMIT)
            .collect();
        Ok(foods)
    }

    fn all_foods(&self) -> Result<Vec<Food>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM Food_Database ORDER BY rowid")?;
        let foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    fn find_food(&self, food_id: &str) -> Result<Option<(i64, Food)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT rowid, * FROM Food_Database WHERE food_id = ?1 ORDER BY rowid LIMIT 1",
                params![food_id],
                |row| Ok((row.get(0)?, Self::food_from_row(row)?)),
            )
            .optional()?)
    }

    pub fn get_food(&self, food_id: &str) -> Result<Option<Food>> {
        Ok(self.find_food(food_id)?.map(|(_, food)| food))
    }

    pub fn add_food(&self, new: &NewFood) -> Result<Food> {
        let today = today_string();
        let food = Food {
            food_id: next_id('F'),
            food_name: new.food_name.trim().to_string(),
            brand: new.brand.as_deref().and_then(non_empty),
            category: new.category.as_deref().and_then(non_empty),
            barcode: new.barcode.as_deref().and_then(non_empty),
            serving_size: new.serving_size,
            serving_unit: new.serving_unit.clone(),
            nutrients: new.nutrients,
            water_g: new.water_g,
            is_verified: false,
            source: new
                .source
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| "user".to_string()),
            date_added: today.clone(),
            last_updated: today,
        };
        self.insert_row("Food_Database", &food_columns(&food))?;
        Ok(food)
    }

    /// Apply `patch` to the first food with `food_id`. Returns `None` if there is no such food.
    pub fn update_food(&self, food_id: &str, patch: &FoodPatch) -> Result<Option<Food>> {
        let Some((rowid, mut food)) = self.find_food(food_id)? else {
            return Ok(None);
        };
        patch.apply(&mut food);
        food.last_updated = today_string();
        self.update_row("Food_Database", rowid, &food_columns(&food))?;
        Ok(Some(food))
    }

    /// Remove the first food with `food_id`. Returns false if there is no such food.
    pub fn delete_food(&self, food_id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM Food_Database WHERE rowid =
                (SELECT rowid FROM Food_Database WHERE food_id = ?1 ORDER BY rowid LIMIT 1)",
            params![food_id],
        )?;
        Ok(rows > 0)
    }

    // --- Meals ---

    pub fn get_meals(&self, date: NaiveDate) -> Result<Vec<Meal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM Meals_Log WHERE date = ?1 ORDER BY rowid")?;
        let meals = stmt
            .query_map(
                params![date.format(DATE_FORMAT).to_string()],
                Self::meal_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Append a meal and refresh that day's totals in one transaction.
    ///
    /// A meal that names a stored food but carries no nutrient values gets
    /// the food's nutrients scaled by `amount / serving_size`.
    pub fn log_meal(&self, new: &NewMeal) -> Result<Meal> {
        let date = match new.date.as_deref().and_then(non_empty) {
            Some(d) => validate_date(&d)?,
            None => Local::now().date_naive(),
        };
        let food = match new.food_id.as_deref().and_then(non_empty) {
            Some(id) => self.get_food(&id)?,
            None => None,
        };

        let amount = new
            .amount
            .or(food.as_ref().map(|f| f.serving_size))
            .unwrap_or(0.0);
        let mut nutrients = new.nutrients;
        if nutrients.is_zero() {
            if let Some(food) = &food {
                nutrients = food
                    .nutrients
                    .scaled(scale_factor(amount, food.serving_size));
            }
        }

        let meal = Meal {
            meal_id: next_id('M'),
            date: date.format(DATE_FORMAT).to_string(),
            timestamp: Local::now().to_rfc3339(),
            meal_type: new.meal_type.clone(),
            food_id: new.food_id.as_deref().and_then(non_empty),
            food_name: new
                .food_name
                .as_deref()
                .and_then(non_empty)
                .or_else(|| food.as_ref().map(|f| f.food_name.clone())),
            amount,
            unit: new
                .unit
                .as_deref()
                .and_then(non_empty)
                .or_else(|| food.as_ref().map(|f| f.serving_unit.clone()))
                .unwrap_or_else(|| "g".to_string()),
            nutrients,
            notes: new.notes.as_deref().and_then(non_empty),
        };

        let tx = self.conn.unchecked_transaction()?;
        self.insert_row("Meals_Log", &meal_columns(&meal))?;
        self.write_daily_totals(date)?;
        tx.commit()?;
        Ok(meal)
    }

    // --- Settings ---

    /// Every setting, decoded. Values that are not valid JSON come back as strings.
    pub fn get_user_settings(&self) -> Result<Map<String, serde_json::Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT setting_key, setting_value FROM User_Settings ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut settings = Map::new();
        for row in rows {
            let (key, raw) = row?;
            let value =
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            settings.insert(key, value);
        }
        Ok(settings)
    }

    /// Update each key in place, appending keys that do not exist yet.
    pub fn update_user_settings(&self, settings: &Map<String, serde_json::Value>) -> Result<usize> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in settings {
            let encoded = serde_json::to_string(value)?;
            let updated = self.conn.execute(
                "UPDATE User_Settings SET setting_value = ?1, last_updated = ?2 WHERE setting_key = ?3",
                params![encoded, now, key],
            )?;
            if updated == 0 {
                self.conn.execute(
                    "INSERT INTO User_Settings (setting_key, setting_value, category, last_updated)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![key, encoded, setting_category(key), now],
                )?;
            }
        }
        tx.commit()?;
        Ok(settings.len())
    }

    // --- Wellness ---

    /// Append a wellness entry and copy its daily fields onto the day's log row.
    pub fn log_wellness(&self, entry: &WellnessEntry) -> Result<DailyStats> {
        let date = match entry.date.as_deref().and_then(non_empty) {
            Some(d) => validate_date(&d)?,
            None => Local::now().date_naive(),
        };
        let date_str = date.format(DATE_FORMAT).to_string();
        let timestamp = entry
            .timestamp
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| Local::now().to_rfc3339());

        let columns: Columns = vec![
            ("date", Value::from(date_str.clone())),
            ("timestamp", Value::from(timestamp)),
            ("sleep_start", Value::from(entry.sleep_start.clone())),
            ("sleep_end", Value::from(entry.sleep_end.clone())),
            ("sleep_hours", Value::from(entry.sleep_hours)),
            ("sleep_quality", Value::from(entry.sleep_quality)),
            ("sleep_notes", Value::from(entry.sleep_notes.clone())),
            ("weight_kg", Value::from(entry.weight_kg)),
            ("body_fat_percent", Value::from(entry.body_fat_percent)),
            ("muscle_mass_kg", Value::from(entry.muscle_mass_kg)),
            ("mood", Value::from(entry.mood)),
            ("energy", Value::from(entry.energy)),
            ("stress", Value::from(entry.stress)),
            ("focus", Value::from(entry.focus)),
            ("motivation", Value::from(entry.motivation)),
            ("steps", Value::from(entry.steps)),
            ("active_minutes", Value::from(entry.active_minutes)),
            ("workout_type", Value::from(entry.workout_type.clone())),
            ("workout_duration", Value::from(entry.workout_duration)),
            ("workout_intensity", Value::from(entry.workout_intensity.clone())),
            ("hydration_l", Value::from(entry.hydration_l)),
            ("caffeine_mg", Value::from(entry.caffeine_mg)),
            ("alcohol_units", Value::from(entry.alcohol_units)),
            ("notes", Value::from(entry.notes.clone())),
            ("tags", Value::from(entry.tags.clone())),
        ];

        let daily = entry.daily_columns();
        let tx = self.conn.unchecked_transaction()?;
        self.insert_row("Wellness_Log", &columns)?;
        if self.daily_rowid(&date_str)?.is_none() {
            self.write_daily_totals(date)?;
        }
        self.conn.execute(
            "UPDATE Daily_Logs SET
                water_l = COALESCE(?1, water_l),
                weight_kg = COALESCE(?2, weight_kg),
                sleep_hours = COALESCE(?3, sleep_hours),
                sleep_quality = COALESCE(?4, sleep_quality),
                steps = COALESCE(?5, steps),
                workout_minutes = COALESCE(?6, workout_minutes),
                mood = COALESCE(?7, mood),
                energy = COALESCE(?8, energy),
                stress = COALESCE(?9, stress)
             WHERE date = ?10",
            params![
                daily.water_l,
                daily.weight_kg,
                daily.sleep_hours,
                daily.sleep_quality,
                daily.steps,
                daily.workout_minutes,
                daily.mood,
                daily.energy,
                daily.stress,
                date_str,
            ],
        )?;
        tx.commit()?;
        self.get_daily_stats(date)
    }

    // --- Insights ---

    pub fn get_ai_insights(&self, date: NaiveDate) -> Result<Vec<Insight>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM AI_Insights WHERE date_generated = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(
                params![date.format(DATE_FORMAT).to_string()],
                Self::insight_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_insight(&self, insight: &Insight) -> Result<()> {
        let columns: Columns = vec![
            ("insight_id", Value::from(insight.insight_id.clone())),
            ("date_generated", Value::from(insight.date_generated.clone())),
            ("period_start", Value::from(insight.period_start.clone())),
            ("period_end", Value::from(insight.period_end.clone())),
            ("type", Value::from(insight.kind.clone())),
            ("priority", Value::from(insight.priority.clone())),
            ("category", Value::from(insight.category.clone())),
            ("title", Value::from(insight.title.clone())),
            ("summary", Value::from(insight.summary.clone())),
            ("detailed_analysis", Value::from(insight.detailed_analysis.clone())),
            ("recommendations", Value::from(insight.recommendations.clone())),
            ("research_references", Value::from(insight.research_references.clone())),
            ("data_sources", Value::from(insight.data_sources.clone())),
            ("confidence_score", Value::from(insight.confidence_score)),
            ("is_read", Value::from(insight.is_read)),
            ("is_applied", Value::from(insight.is_applied)),
            ("user_rating", Value::from(insight.user_rating)),
        ];
        self.insert_row("AI_Insights", &columns)
    }

    /// Review the requested day against the user's goals and store the result.
    ///
    /// Also records a calories/weight correlation over the period when
    /// enough days carry both values.
    pub fn generate_ai_insight(&self, request: &NewInsightRequest) -> Result<Insight> {
        let date = match request.date.as_deref().and_then(non_empty) {
            Some(d) => validate_date(&d)?,
            None => Local::now().date_naive(),
        };
        let period_days = request
            .period_days
            .unwrap_or(insights::DEFAULT_PERIOD_DAYS)
            .clamp(1, insights::MAX_PERIOD_DAYS);
        let period_start = date - Duration::days(i64::from(period_days) - 1);

        let logs = self.get_daily_logs(period_start, date)?;
        let logged_days = logs.iter().filter(|l| l.nutrients.calories > 0.0).count();
        let stats = self.get_daily_stats(date)?;
        let goals = Goals::from_settings(&self.get_user_settings()?);

        let insight = insights::daily_review(&stats, &goals, period_start, period_days, logged_days);
        let tx = self.conn.unchecked_transaction()?;
        self.insert_insight(&insight)?;
        if let Some(correlation) =
            insights::calorie_weight_correlation(&logs, &stats.date, period_days)
        {
            self.record_correlation(&correlation)?;
        }
        tx.commit()?;
        Ok(insight)
    }

    // --- Correlations ---

    pub fn record_correlation(&self, correlation: &Correlation) -> Result<()> {
        let columns: Columns = vec![
            ("correlation_id", Value::from(correlation.correlation_id.clone())),
            ("date_calculated", Value::from(correlation.date_calculated.clone())),
            ("variable_1", Value::from(correlation.variable_1.clone())),
            ("variable_2", Value::from(correlation.variable_2.clone())),
            ("correlation_coefficient", Value::from(correlation.correlation_coefficient)),
            ("p_value", Value::from(correlation.p_value)),
            ("sample_size", Value::from(correlation.sample_size)),
            ("period_days", Value::from(correlation.period_days)),
            ("interpretation", Value::from(correlation.interpretation.clone())),
            ("is_significant", Value::from(correlation.is_significant)),
        ];
        self.insert_row("Correlations", &columns)
    }

    pub fn list_correlations(&self) -> Result<Vec<Correlation>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM Correlations ORDER BY rowid")?;
        let correlations = stmt
            .query_map([], Self::correlation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(correlations)
    }
}

fn today_string() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

fn nutrient_columns(nutrients: &Nutrients) -> Columns {
    NUTRIENT_COLUMNS
        .iter()
        .copied()
        .zip(nutrients.values())
        .map(|(name, value)| (name, Value::from(value)))
        .collect()
}

fn food_columns(food: &Food) -> Columns {
    let mut columns: Columns = vec![
        ("food_id", Value::from(food.food_id.clone())),
        ("food_name", Value::from(food.food_name.clone())),
        ("brand", Value::from(food.brand.clone())),
        ("category", Value::from(food.category.clone())),
        ("barcode", Value::from(food.barcode.clone())),
        ("serving_size", Value::from(food.serving_size)),
        ("serving_unit", Value::from(food.serving_unit.clone())),
    ];
    columns.extend(nutrient_columns(&food.nutrients));
    columns.extend([
        ("water_g", Value::from(food.water_g)),
        ("is_verified", Value::from(food.is_verified)),
        ("source", Value::from(food.source.clone())),
        ("date_added", Value::from(food.date_added.clone())),
        ("last_updated", Value::from(food.last_updated.clone())),
    ]);
    columns
}

fn meal_columns(meal: &Meal) -> Columns {
    let mut columns: Columns = vec![
        ("meal_id", Value::from(meal.meal_id.clone())),
        ("date", Value::from(meal.date.clone())),
        ("timestamp", Value::from(meal.timestamp.clone())),
        ("meal_type", Value::from(meal.meal_type.clone())),
        ("food_id", Value::from(meal.food_id.clone())),
        ("food_name", Value::from(meal.food_name.clone())),
        ("amount", Value::from(meal.amount)),
        ("unit", Value::from(meal.unit.clone())),
    ];
    columns.extend(nutrient_columns(&meal.nutrients));
    columns.push(("notes", Value::from(meal.notes.clone())));
    columns
}

/// Category recorded for a setting key the first time it is written.
#[must_use]
pub fn setting_category(key: &str) -> &'static str {
    match key {
        "calorie_goal" | "protein_goal" | "carbs_goal" | "fat_goal" | "fiber_goal" => "goals",
        "weight_kg" | "height_cm" | "age" | "activity_level" | "sex" => "profile",
        "user_id" | "email" | "name" => "account",
        _ => "preferences",
    }
}

fn default_settings(user_id: &str) -> Vec<(&'static str, serde_json::Value, &'static str)> {
    use serde_json::json;
    vec![
        ("user_id", json!(user_id), "account"),
        ("calorie_goal", json!(2500), "goals"),
        ("protein_goal", json!(150), "goals"),
        ("carbs_goal", json!(300), "goals"),
        ("fat_goal", json!(80), "goals"),
        ("weight_kg", json!(75), "profile"),
        ("height_cm", json!(180), "profile"),
        ("age", json!(22), "profile"),
        ("activity_level", json!("moderate"), "profile"),
        ("theme", json!("light"), "preferences"),
        ("notifications", json!(true), "preferences"),
    ]
}

fn sample_foods() -> Vec<Food> {
    let sample = |id: &str, name: &str, category: &str, values: &[f64], water_g: f64| Food {
        food_id: id.to_string(),
        food_name: name.to_string(),
        brand: None,
        category: Some(category.to_string()),
        barcode: None,
        serving_size: 100.0,
        serving_unit: "g".to_string(),
        nutrients: Nutrients::from_values(values),
        water_g,
        is_verified: true,
        source: "USDA".to_string(),
        date_added: "2024-01-01".to_string(),
        last_updated: "2024-01-01".to_string(),
    };
    vec![
        sample(
            "F001",
            "Chicken Breast (cooked)",
            "Protein",
            &[
                165.0, 31.0, 0.0, 3.6, 0.0, 9.0, 0.0, 0.3, 0.4, 6.0, 0.07, 0.11, 11.5, 0.86, 0.56,
                0.0, 7.0, 0.31, 11.0, 220.0, 27.0, 85.0, 370.0, 0.9, 1.0, 0.04, 0.017, 0.0, 27.8,
                0.0, 0.03, 0.8,
            ],
            65.3,
        ),
        sample(
            "F002",
            "White Rice (cooked)",
            "Grains",
            &[
                130.0, 2.7, 28.2, 0.3, 0.4, 0.0, 0.0, 0.0, 0.02, 0.0, 0.16, 0.013, 1.6, 0.38,
                0.093, 0.0, 58.0, 0.0, 10.0, 43.0, 12.0, 1.0, 35.0, 0.2, 0.4, 0.049, 0.472, 0.0,
                7.1, 0.0, 0.0, 0.02,
            ],
            68.4,
        ),
        sample(
            "F003",
            "Banana",
            "Fruit",
            &[
                89.0, 1.1, 22.8, 0.3, 2.6, 3.0, 8.7, 0.0, 0.1, 0.5, 0.031, 0.073, 0.665, 0.334,
                0.367, 0.0, 20.0, 0.0, 5.0, 22.0, 27.0, 1.0, 358.0, 0.26, 0.15, 0.078, 0.27, 0.0,
                1.0, 0.0, 0.0, 0.05,
            ],
            74.9,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &str = "ana@example.com";

    fn db() -> Database {
        Database::open_in_memory(USER).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn meal(date: &str, meal_type: &str, calories: f64, protein_g: f64) -> NewMeal {
        NewMeal {
            date: Some(date.to_string()),
            meal_type: meal_type.to_string(),
            food_name: Some("Custom".to_string()),
            amount: Some(1.0),
            unit: Some("serving".to_string()),
            nutrients: Nutrients {
                calories,
                protein_g,
                ..Nutrients::default()
            },
            ..NewMeal::default()
        }
    }

    fn oats() -> NewFood {
        serde_json::from_value(json!({
            "food_name": "Rolled Oats",
            "brand": "Acme",
            "category": "Grains",
            "serving_size": 40,
            "calories": 150,
            "protein_g": 5,
            "fiber_g": 4,
        }))
        .unwrap()
    }

    #[test]
    fn test_new_workbook_is_seeded() {
        let db = db();
        let foods = db.get_food_database(&FoodFilter::default()).unwrap();
        let ids: Vec<&str> = foods.iter().map(|f| f.food_id.as_str()).collect();
        assert_eq!(ids, ["F001", "F002", "F003"]);
        assert_eq!(foods[0].nutrients.calories, 165.0);
        assert_eq!(foods[0].nutrients.omega6_g, 0.8);
        assert_eq!(foods[2].water_g, 74.9);
        assert!(foods.iter().all(|f| f.is_verified));

        let settings = db.get_user_settings().unwrap();
        assert_eq!(settings.len(), 11);
        assert_eq!(settings["user_id"], json!(USER));
        assert_eq!(settings["calorie_goal"], json!(2500));
        assert_eq!(settings["activity_level"], json!("moderate"));
        assert_eq!(settings["notifications"], json!(true));
    }

    #[test]
    fn test_reopen_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.db");
        {
            let db = Database::open(&path, USER).unwrap();
            db.delete_food("F001").unwrap();
        }
        let db = Database::open(&path, USER).unwrap();
        let foods = db.get_food_database(&FoodFilter::default()).unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(db.get_user_settings().unwrap().len(), 11);
    }

    #[test]
    fn test_food_database_filters() {
        let db = db();
        db.add_food(&oats()).unwrap();

        let grains = db
            .get_food_database(&FoodFilter {
                category: Some("Grains".to_string()),
                ..FoodFilter::default()
            })
            .unwrap();
        assert_eq!(grains.len(), 2);
        assert_eq!(grains[0].food_id, "F002");
        assert_eq!(grains[1].food_name, "Rolled Oats");

        let verified = db
            .get_food_database(&FoodFilter {
                verified_only: true,
                ..FoodFilter::default()
            })
            .unwrap();
        assert_eq!(verified.len(), 3);

        let limited = db
            .get_food_database(&FoodFilter {
                limit: 2,
                ..FoodFilter::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_search_foods() {
        let db = db();
        let hits = db.search_foods("RICE").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].food_id, "F002");
        assert!(db.search_foods("pizza").unwrap().is_empty());

        for i in 0..25 {
            let mut food = oats();
            food.food_name = format!("Rice cake {i}");
            db.add_food(&food).unwrap();
        }
        assert_eq!(db.search_foods("rice").unwrap().len(), 20);
    }

    #[test]
    fn test_add_food_defaults() {
        let db = db();
        let food = db.add_food(&oats()).unwrap();
        assert!(food.food_id.starts_with('F'));
        assert!(!food.is_verified);
        assert_eq!(food.source, "user");
        assert_eq!(food.serving_unit, "g");
        assert_eq!(food.date_added, food.last_updated);

        let stored = db.get_food(&food.food_id).unwrap().unwrap();
        assert_eq!(stored, food);
    }

    #[test]
    fn test_update_food() {
        let db = db();
        let patch: FoodPatch = serde_json::from_value(json!({
            "food_id": "F003",
            "food_name": "Banana (ripe)",
            "calories": 95,
        }))
        .unwrap();
        let updated = db.update_food("F003", &patch).unwrap().unwrap();
        assert_eq!(updated.food_name, "Banana (ripe)");
        assert_eq!(updated.nutrients.calories, 95.0);
        assert_eq!(updated.nutrients.potassium_mg, 358.0);
        assert_eq!(updated.last_updated, today_string());

        let stored = db.get_food("F003").unwrap().unwrap();
        assert_eq!(stored.food_name, "Banana (ripe)");

        assert!(db.update_food("F999", &patch).unwrap().is_none());
    }

    #[test]
    fn test_delete_food() {
        let db = db();
        assert!(db.delete_food("F002").unwrap());
        assert!(db.get_food("F002").unwrap().is_none());
        assert!(!db.delete_food("F002").unwrap());
        assert_eq!(db.get_food_database(&FoodFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_log_meal_updates_daily_totals() {
        let db = db();
        db.log_meal(&meal("2024-06-15", "Breakfast", 400.0, 20.0))
            .unwrap();
        db.log_meal(&meal("2024-06-15", "Lunch", 650.0, 45.5))
            .unwrap();
        db.log_meal(&meal("2024-06-16", "Dinner", 900.0, 60.0))
            .unwrap();

        let stats = db.get_daily_stats(date("2024-06-15")).unwrap();
        assert_eq!(stats.nutrients.calories, 1050.0);
        assert_eq!(stats.nutrients.protein_g, 65.5);
        assert_eq!(stats.day_of_week, "Sat");
        assert_eq!(stats.week_number, 24);

        let meals = db.get_meals(date("2024-06-15")).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].meal_type, "Breakfast");
        assert_eq!(meals[1].meal_type, "Lunch");
        assert!(meals[0].meal_id < meals[1].meal_id);

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM Daily_Logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_daily_totals_sum_micronutrients() {
        let db = db();
        let mut salmon = meal("2024-06-15", "Lunch", 350.0, 30.0);
        salmon.nutrients.iron_mg = 1.25;
        salmon.nutrients.omega3_g = 2.5;
        let mut spinach = meal("2024-06-15", "Dinner", 40.0, 3.0);
        spinach.nutrients.iron_mg = 2.5;
        spinach.nutrients.vitamin_k_mcg = 480.0;
        db.log_meal(&salmon).unwrap();
        db.log_meal(&spinach).unwrap();

        let stats = db.get_daily_stats(date("2024-06-15")).unwrap();
        assert_eq!(stats.nutrients.iron_mg, 3.75);
        assert_eq!(stats.nutrients.omega3_g, 2.5);
        assert_eq!(stats.nutrients.vitamin_k_mcg, 480.0);
        assert_eq!(stats.nutrients.zinc_mg, 0.0);
    }

    #[test]
    fn test_update_daily_totals_recomputes_from_meals() {
        let db = db();
        let mut lunch = meal("2024-06-15", "Lunch", 600.0, 40.0);
        lunch.nutrients.iron_mg = 2.0;
        let lunch = db.log_meal(&lunch).unwrap();
        db.log_meal(&meal("2024-06-15", "Dinner", 500.0, 25.0))
            .unwrap();
        db.log_wellness(&WellnessEntry {
            date: Some("2024-06-15".to_string()),
            weight_kg: Some(74.5),
            ..WellnessEntry::default()
        })
        .unwrap();

        db.conn
            .execute(
                "DELETE FROM Meals_Log WHERE meal_id = ?1",
                params![lunch.meal_id],
            )
            .unwrap();
        let stats = db.update_daily_totals(date("2024-06-15")).unwrap();
        assert_eq!(stats.nutrients.calories, 500.0);
        assert_eq!(stats.nutrients.protein_g, 25.0);
        assert_eq!(stats.nutrients.iron_mg, 0.0);
        assert_eq!(stats.wellness.weight_kg, Some(74.5));

        // A day with no row yet gets one.
        let empty = db.update_daily_totals(date("2024-06-16")).unwrap();
        assert!(empty.nutrients.is_zero());
        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM Daily_Logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_log_meal_scales_food_nutrients() {
        let db = db();
        let logged = db
            .log_meal(&NewMeal {
                date: Some("2024-06-15".to_string()),
                meal_type: "Lunch".to_string(),
                food_id: Some("F001".to_string()),
                amount: Some(150.0),
                ..NewMeal::default()
            })
            .unwrap();
        assert_eq!(logged.food_name.as_deref(), Some("Chicken Breast (cooked)"));
        assert_eq!(logged.unit, "g");
        assert!((logged.nutrients.calories - 247.5).abs() < 1e-9);
        assert!((logged.nutrients.protein_g - 46.5).abs() < 1e-9);

        let stats = db.get_daily_stats(date("2024-06-15")).unwrap();
        assert!((stats.nutrients.calories - 247.5).abs() < 1e-9);
    }

    #[test]
    fn test_log_meal_keeps_submitted_nutrients() {
        let db = db();
        let logged = db
            .log_meal(&NewMeal {
                date: Some("2024-06-15".to_string()),
                meal_type: "Snack".to_string(),
                food_id: Some("F003".to_string()),
                amount: Some(120.0),
                nutrients: Nutrients {
                    calories: 100.0,
                    ..Nutrients::default()
                },
                ..NewMeal::default()
            })
            .unwrap();
        assert_eq!(logged.nutrients.calories, 100.0);
        assert_eq!(logged.nutrients.carbs_g, 0.0);
    }

    #[test]
    fn test_daily_stats_for_empty_day() {
        let db = db();
        let stats = db.get_daily_stats(date("2024-01-03")).unwrap();
        assert_eq!(stats.date, "2024-01-03");
        assert_eq!(stats.day_of_week, "Wed");
        assert_eq!(stats.week_number, 1);
        assert!(stats.nutrients.is_zero());
        assert!(stats.wellness.weight_kg.is_none());
    }

    #[test]
    fn test_update_user_settings() {
        let db = db();
        let mut changes = Map::new();
        changes.insert("calorie_goal".to_string(), json!(2200));
        changes.insert("fiber_goal".to_string(), json!(30));
        changes.insert("theme".to_string(), json!("dark"));
        assert_eq!(db.update_user_settings(&changes).unwrap(), 3);

        let settings = db.get_user_settings().unwrap();
        assert_eq!(settings.len(), 12);
        assert_eq!(settings["calorie_goal"], json!(2200));
        assert_eq!(settings["fiber_goal"], json!(30));
        assert_eq!(settings["theme"], json!("dark"));

        let category: String = db
            .conn
            .query_row(
                "SELECT category FROM User_Settings WHERE setting_key = 'fiber_goal'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category, "goals");
    }

    #[test]
    fn test_log_wellness_preserved_by_meal_totals() {
        let db = db();
        db.log_meal(&meal("2024-06-15", "Breakfast", 300.0, 10.0))
            .unwrap();
        let stats = db
            .log_wellness(&WellnessEntry {
                date: Some("2024-06-15".to_string()),
                weight_kg: Some(74.5),
                hydration_l: Some(2.0),
                workout_duration: Some(30.0),
                ..WellnessEntry::default()
            })
            .unwrap();
        assert_eq!(stats.wellness.weight_kg, Some(74.5));
        assert_eq!(stats.wellness.water_l, Some(2.0));
        assert_eq!(stats.wellness.workout_minutes, Some(30.0));

        // A later partial entry leaves earlier values alone.
        db.log_wellness(&WellnessEntry {
            date: Some("2024-06-15".to_string()),
            mood: Some(4.0),
            ..WellnessEntry::default()
        })
        .unwrap();

        db.log_meal(&meal("2024-06-15", "Dinner", 500.0, 30.0))
            .unwrap();
        let stats = db.get_daily_stats(date("2024-06-15")).unwrap();
        assert_eq!(stats.nutrients.calories, 800.0);
        assert_eq!(stats.wellness.weight_kg, Some(74.5));
        assert_eq!(stats.wellness.mood, Some(4.0));

        let entries: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM Wellness_Log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_log_wellness_creates_daily_row() {
        let db = db();
        let stats = db
            .log_wellness(&WellnessEntry {
                date: Some("2024-06-20".to_string()),
                sleep_hours: Some(7.5),
                ..WellnessEntry::default()
            })
            .unwrap();
        assert_eq!(stats.day_of_week, "Thu");
        assert_eq!(stats.wellness.sleep_hours, Some(7.5));
        assert!(stats.nutrients.is_zero());
    }

    #[test]
    fn test_generate_ai_insight_stores_review() {
        let db = db();
        db.log_meal(&meal("2024-06-15", "Lunch", 2500.0, 150.0))
            .unwrap();
        let insight = db
            .generate_ai_insight(&NewInsightRequest {
                date: Some("2024-06-15".to_string()),
                period_days: Some(7),
            })
            .unwrap();
        assert_eq!(insight.period_start, "2024-06-09");
        assert_eq!(insight.period_end, "2024-06-15");
        assert_eq!(insight.kind, "daily_review");

        let stored = db.get_ai_insights(date("2024-06-15")).unwrap();
        assert_eq!(stored, vec![insight]);
        assert!(db.get_ai_insights(date("2024-06-14")).unwrap().is_empty());
        assert!(db.list_correlations().unwrap().is_empty());
    }

    #[test]
    fn test_generate_ai_insight_records_correlation() {
        let db = db();
        for (day, calories, weight) in [
            ("2024-06-10", 2000.0, 75.0),
            ("2024-06-11", 2300.0, 75.3),
            ("2024-06-12", 2600.0, 75.5),
            ("2024-06-13", 2100.0, 75.1),
        ] {
            db.log_meal(&meal(day, "Dinner", calories, 100.0)).unwrap();
            db.log_wellness(&WellnessEntry {
                date: Some(day.to_string()),
                weight_kg: Some(weight),
                ..WellnessEntry::default()
            })
            .unwrap();
        }
        db.generate_ai_insight(&NewInsightRequest {
            date: Some("2024-06-13".to_string()),
            period_days: None,
        })
        .unwrap();

        let correlations = db.list_correlations().unwrap();
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].sample_size, 4);
        assert_eq!(correlations[0].period_days, 7);
        assert!(correlations[0].correlation_coefficient > 0.9);
        assert!(!correlations[0].is_significant);
    }

    #[test]
    fn test_setting_category() {
        assert_eq!(setting_category("protein_goal"), "goals");
        assert_eq!(setting_category("sex"), "profile");
        assert_eq!(setting_category("user_id"), "account");
        assert_eq!(setting_category("units"), "preferences");
    }
}
