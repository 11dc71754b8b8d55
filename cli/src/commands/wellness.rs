use anyhow::{Result, bail};
use clap::Args;

use crate::config::Config;
use fourm_core::models::{WellnessEntry, validate_wellness};

use super::api;
use super::helpers::{date_arg, print_json};

#[derive(Args, Debug, Default)]
pub(crate) struct WellnessFields {
    /// Hours slept
    #[arg(long)]
    pub sleep: Option<f64>,
    /// Sleep quality (1-10)
    #[arg(long)]
    pub sleep_quality: Option<f64>,
    /// Bedtime (HH:MM)
    #[arg(long)]
    pub sleep_start: Option<String>,
    /// Wake time (HH:MM)
    #[arg(long)]
    pub sleep_end: Option<String>,
    #[arg(long)]
    pub sleep_notes: Option<String>,
    /// Body weight in kg
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub body_fat: Option<f64>,
    /// Muscle mass in kg
    #[arg(long)]
    pub muscle_mass: Option<f64>,
    /// Mood (1-10)
    #[arg(long)]
    pub mood: Option<f64>,
    /// Energy (1-10)
    #[arg(long)]
    pub energy: Option<f64>,
    /// Stress (1-10)
    #[arg(long)]
    pub stress: Option<f64>,
    /// Focus (1-10)
    #[arg(long)]
    pub focus: Option<f64>,
    /// Motivation (1-10)
    #[arg(long)]
    pub motivation: Option<f64>,
    #[arg(long)]
    pub steps: Option<f64>,
    #[arg(long)]
    pub active_minutes: Option<f64>,
    /// Workout type (e.g. strength, running)
    #[arg(long)]
    pub workout: Option<String>,
    /// Workout duration in minutes
    #[arg(long)]
    pub workout_minutes: Option<f64>,
    /// Workout intensity (low, moderate, high)
    #[arg(long)]
    pub intensity: Option<String>,
    /// Water drunk in litres
    #[arg(long)]
    pub water: Option<f64>,
    #[arg(long)]
    pub caffeine: Option<f64>,
    #[arg(long)]
    pub alcohol: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
}

impl WellnessFields {
    fn into_entry(self, date: String) -> WellnessEntry {
        WellnessEntry {
            date: Some(date),
            timestamp: None,
            sleep_start: self.sleep_start,
            sleep_end: self.sleep_end,
            sleep_hours: self.sleep,
            sleep_quality: self.sleep_quality,
            sleep_notes: self.sleep_notes,
            weight_kg: self.weight,
            body_fat_percent: self.body_fat,
            muscle_mass_kg: self.muscle_mass,
            mood: self.mood,
            energy: self.energy,
            stress: self.stress,
            focus: self.focus,
            motivation: self.motivation,
            steps: self.steps,
            active_minutes: self.active_minutes,
            workout_type: self.workout,
            workout_duration: self.workout_minutes,
            workout_intensity: self.intensity,
            hydration_l: self.water,
            caffeine_mg: self.caffeine,
            alcohol_units: self.alcohol,
            notes: self.notes,
            tags: self.tags,
        }
    }
}

pub(crate) async fn cmd_wellness_log(
    config: &Config,
    fields: WellnessFields,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let entry = fields.into_entry(date_arg(date)?);
    let blank = WellnessEntry {
        date: entry.date.clone(),
        ..WellnessEntry::default()
    };
    if entry == blank {
        bail!("Nothing to log. Pass at least one of --sleep, --weight, --mood, --steps, --water, ...");
    }
    validate_wellness(&entry)?;

    let client = api(config)?;
    let resp = client.log_wellness(&entry).await?;

    if json {
        return print_json(&resp);
    }
    let date = entry.date.as_deref().unwrap_or_default();
    let message = &resp.message;
    println!("{message} for {date}");
    Ok(())
}
