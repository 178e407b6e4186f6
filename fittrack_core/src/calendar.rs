//! Month calendar aggregation and CSV export.
//!
//! Summaries are built from the `load_all_*` maps of the sync cache, so a
//! day only shows workout progress once something was recorded for it.

use crate::config::NutritionConfig;
use crate::types::{DailyProgress, FoodLog};
use crate::{DateKey, Error, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

/// One calendar cell
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DaySummary {
    pub date_key: DateKey,
    /// Workout of the saved progress snapshot, if any
    pub workout: Option<String>,
    pub workout_percent: u8,
    pub food_percent: u8,
    pub calories: f64,
    pub protein: f64,
}

impl DaySummary {
    pub fn has_activity(&self) -> bool {
        self.workout_percent > 0 || self.calories > 0.0
    }
}

/// Summaries for every day of `year`-`month`, in date order
pub fn summarize_month(
    year: i32,
    month: u32,
    progress: &BTreeMap<DateKey, DailyProgress>,
    food: &BTreeMap<DateKey, FoodLog>,
    nutrition: &NutritionConfig,
) -> Result<Vec<DaySummary>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Config(format!("Invalid month: {}-{:02}", year, month)))?;

    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| {
            let key = DateKey::from_date(date);
            let snapshot = progress.get(&key);
            let log = food.get(&key);
            let totals = log.map(FoodLog::totals).unwrap_or_default();
            DaySummary {
                date_key: key,
                workout: snapshot.map(|p| p.workout.clone()),
                workout_percent: snapshot.map(DailyProgress::completion_percent).unwrap_or(0),
                food_percent: log.map(|l| l.calorie_percent(nutrition)).unwrap_or(0),
                calories: totals.calories,
                protein: totals.protein,
            }
        })
        .collect();
    Ok(days)
}

/// Append summaries to a CSV file, writing headers only when the file is new.
///
/// Returns the number of rows written.
pub fn export_csv(path: &Path, summaries: &[DaySummary]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for summary in summaries {
        writer.serialize(summary)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} calendar rows to {:?}", summaries.len(), path);
    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    fn sample_maps() -> (BTreeMap<DateKey, DailyProgress>, BTreeMap<DateKey, FoodLog>) {
        let catalog = build_default_catalog();
        let mut legs = DailyProgress::materialize(&catalog, "Legs", key("2025-02-10"));
        for set in legs.exercises.iter_mut().flat_map(|e| e.sets.iter_mut()) {
            set.completed = true;
        }
        let progress = BTreeMap::from([(key("2025-02-10"), legs)]);

        let mut log = FoodLog::empty(&NutritionConfig::default());
        log.add_item("Chicken", 500.0, 60.0).unwrap();
        log.toggle_eaten(0).unwrap();
        let food = BTreeMap::from([(key("2025-02-11"), log)]);

        (progress, food)
    }

    #[test]
    fn test_summarize_month_covers_every_day() {
        let (progress, food) = sample_maps();
        let days = summarize_month(2025, 2, &progress, &food, &NutritionConfig::default()).unwrap();

        assert_eq!(days.len(), 28);
        assert_eq!(days[0].date_key, key("2025-02-01"));

        let tenth = &days[9];
        assert_eq!(tenth.workout.as_deref(), Some("Legs"));
        assert_eq!(tenth.workout_percent, 100);
        assert_eq!(tenth.food_percent, 0);

        let eleventh = &days[10];
        assert_eq!(eleventh.workout, None);
        assert_eq!(eleventh.food_percent, 25);
        assert_eq!(eleventh.protein, 60.0);

        assert_eq!(days.iter().filter(|d| d.has_activity()).count(), 2);
    }

    #[test]
    fn test_summarize_invalid_month() {
        let result = summarize_month(2025, 13, &BTreeMap::new(), &BTreeMap::new(), &NutritionConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_export_csv_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exports/calendar.csv");
        let (progress, food) = sample_maps();
        let days = summarize_month(2025, 2, &progress, &food, &NutritionConfig::default()).unwrap();

        assert_eq!(export_csv(&path, &days[9..11]).unwrap(), 2);
        assert_eq!(export_csv(&path, &days[11..12]).unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("date_key,workout,workout_percent"));
        assert!(lines[1].starts_with("2025-02-10,Legs,100"));
        assert_eq!(contents.matches("date_key").count(), 1);
    }
}
