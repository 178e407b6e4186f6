//! Schedule resolution: which workout (or rest) applies to a given day.
//!
//! Resolution rules, in order:
//!
//! 1. **Manual override**: a pinned label always wins, including `"Rest"`.
//! 2. **Fixed rest weekday**: configured weekdays resolve to `"Rest"`.
//! 3. **Rotation**: the label at `position mod len(rotation)`, where position
//!    counts the rotation-advancing days between the epoch and the date.
//!
//! A day advances the rotation unless it is a fixed rest weekday or is
//! pinned to `"Rest"`. A `"Rest"` pin therefore shifts every later day by one
//! slot; a pin to any other label only replaces that day's label.
//!
//! Resolution walks every day from the epoch, so the result depends only on
//! the date and the override map. Ranges use [`ScheduleSweep`], which walks
//! once and carries the running position forward.

use crate::config::ScheduleConfig;
use crate::types::{WorkoutOverrides, REST_LABEL};
use crate::{DateKey, Error, Result};
use chrono::{Datelike, NaiveDate, Weekday};

/// The rotation constants: epoch, ordered slots and fixed rest weekdays
#[derive(Clone, Debug)]
pub struct Rotation {
    epoch: NaiveDate,
    slots: Vec<String>,
    fixed_rest_days: Vec<Weekday>,
}

/// One resolved day of a generated schedule
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub date_key: DateKey,
    pub workout: String,
    pub is_today: bool,
    pub is_past: bool,
    pub is_fixed_rest: bool,
    pub is_manual_override: bool,
}

impl Rotation {
    pub fn new(epoch: NaiveDate, slots: Vec<String>, fixed_rest_days: Vec<Weekday>) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::Config("rotation must contain at least one label".into()));
        }
        Ok(Self {
            epoch,
            slots,
            fixed_rest_days,
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::new(
            config.epoch,
            config.rotation.clone(),
            config.fixed_rest_days.clone(),
        )
    }

    pub fn is_fixed_rest_day(&self, date: NaiveDate) -> bool {
        self.fixed_rest_days.contains(&date.weekday())
    }

    /// Resolve the workout label for `date`
    pub fn resolve(&self, date: NaiveDate, overrides: &WorkoutOverrides) -> String {
        let position = self.position(date, overrides);
        self.label_for(date, position, overrides)
    }

    /// Labels a user may pin: `"Rest"` followed by the distinct rotation workouts
    pub fn workout_options(&self) -> Vec<String> {
        let mut options = vec![REST_LABEL.to_string()];
        for slot in &self.slots {
            if !options.contains(slot) {
                options.push(slot.clone());
            }
        }
        options
    }

    /// Walk forward from `start`, resolving one day per step
    pub fn sweep<'a>(&'a self, start: NaiveDate, overrides: &'a WorkoutOverrides) -> ScheduleSweep<'a> {
        ScheduleSweep {
            rotation: self,
            overrides,
            current: Some(start),
            position: self.position(start, overrides),
        }
    }

    /// Resolve every day in `start..=end` in one pass
    pub fn generate_schedule(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        overrides: &WorkoutOverrides,
        today: NaiveDate,
    ) -> Vec<ScheduleDay> {
        if end < start {
            return Vec::new();
        }
        self.sweep(start, overrides)
            .take_while(|(date, _)| *date <= end)
            .map(|(date, workout)| {
                let date_key = DateKey::from_date(date);
                ScheduleDay {
                    date,
                    date_key,
                    workout,
                    is_today: date == today,
                    is_past: date < today,
                    is_fixed_rest: self.is_fixed_rest_day(date),
                    is_manual_override: overrides.get(&date_key).is_some(),
                }
            })
            .collect()
    }

    /// Whether `date` consumes a rotation slot
    fn advances(&self, date: NaiveDate, overrides: &WorkoutOverrides) -> bool {
        !self.is_fixed_rest_day(date) && !overrides.is_rest(&DateKey::from_date(date))
    }

    /// Signed count of advancing days from the epoch to `date` (exclusive).
    /// Dates before the epoch count backwards and come out negative.
    fn position(&self, date: NaiveDate, overrides: &WorkoutOverrides) -> i64 {
        if date >= self.epoch {
            self.count_advancing(self.epoch, date, overrides)
        } else {
            -self.count_advancing(date, self.epoch, overrides)
        }
    }

    /// Advancing days in `from..until`
    fn count_advancing(&self, from: NaiveDate, until: NaiveDate, overrides: &WorkoutOverrides) -> i64 {
        from.iter_days()
            .take_while(|d| *d < until)
            .filter(|d| self.advances(*d, overrides))
            .count() as i64
    }

    fn label_for(&self, date: NaiveDate, position: i64, overrides: &WorkoutOverrides) -> String {
        if let Some(label) = overrides.get(&DateKey::from_date(date)) {
            return label.to_string();
        }
        if self.is_fixed_rest_day(date) {
            return REST_LABEL.to_string();
        }
        let len = self.slots.len() as i64;
        self.slots[position.rem_euclid(len) as usize].clone()
    }
}

/// Forward iterator over `(date, label)` pairs reusing the running position
pub struct ScheduleSweep<'a> {
    rotation: &'a Rotation,
    overrides: &'a WorkoutOverrides,
    current: Option<NaiveDate>,
    position: i64,
}

impl Iterator for ScheduleSweep<'_> {
    type Item = (NaiveDate, String);

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.current?;
        let label = self.rotation.label_for(date, self.position, self.overrides);
        if self.rotation.advances(date, self.overrides) {
            self.position += 1;
        }
        self.current = date.succ_opt();
        Some((date, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    /// Four-slot rotation with an interleaved rest slot and no fixed weekdays
    fn slotted_rest_rotation() -> Rotation {
        Rotation::new(
            ymd(2025, 1, 1),
            vec![
                "Chest & Triceps".into(),
                "Back & Biceps".into(),
                "Legs".into(),
                "Rest".into(),
            ],
            vec![],
        )
        .unwrap()
    }

    fn weekday_rest_rotation() -> Rotation {
        Rotation::from_config(&ScheduleConfig::default()).unwrap()
    }

    #[test]
    fn test_rotation_from_epoch() {
        let rotation = slotted_rest_rotation();
        let none = WorkoutOverrides::new();

        assert_eq!(rotation.resolve(ymd(2025, 1, 1), &none), "Chest & Triceps");
        assert_eq!(rotation.resolve(ymd(2025, 1, 2), &none), "Back & Biceps");
        assert_eq!(rotation.resolve(ymd(2025, 1, 3), &none), "Legs");
        assert_eq!(rotation.resolve(ymd(2025, 1, 4), &none), "Rest");
        assert_eq!(rotation.resolve(ymd(2025, 1, 5), &none), "Chest & Triceps");
    }

    #[test]
    fn test_override_wins_including_rest() {
        let rotation = slotted_rest_rotation();
        for offset in 0..8 {
            let date = ymd(2025, 1, 1) + Duration::days(offset);
            let overrides: WorkoutOverrides =
                [(DateKey::from_date(date), REST_LABEL)].into_iter().collect();
            assert_eq!(rotation.resolve(date, &overrides), REST_LABEL);
        }
    }

    #[test]
    fn test_workout_override_does_not_shift_later_days() {
        let rotation = slotted_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2025-01-02"), "Legs")].into_iter().collect();

        assert_eq!(rotation.resolve(ymd(2025, 1, 2), &overrides), "Legs");
        assert_eq!(rotation.resolve(ymd(2025, 1, 3), &overrides), "Legs");
        assert_eq!(rotation.resolve(ymd(2025, 1, 4), &overrides), "Rest");
    }

    #[test]
    fn test_rest_override_shifts_later_days() {
        let rotation = slotted_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2025-01-02"), REST_LABEL)].into_iter().collect();

        assert_eq!(rotation.resolve(ymd(2025, 1, 1), &overrides), "Chest & Triceps");
        assert_eq!(rotation.resolve(ymd(2025, 1, 2), &overrides), "Rest");
        // Back & Biceps slides to the next day
        assert_eq!(rotation.resolve(ymd(2025, 1, 3), &overrides), "Back & Biceps");
        assert_eq!(rotation.resolve(ymd(2025, 1, 4), &overrides), "Legs");
    }

    #[test]
    fn test_removing_override_restores_schedule() {
        let rotation = slotted_rest_rotation();
        let mut overrides = WorkoutOverrides::new();
        let before = rotation.resolve(ymd(2025, 3, 1), &overrides);

        overrides.pin(key("2025-02-01"), REST_LABEL);
        assert_ne!(rotation.resolve(ymd(2025, 3, 1), &overrides), before);

        overrides.unpin(&key("2025-02-01"));
        assert_eq!(rotation.resolve(ymd(2025, 3, 1), &overrides), before);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let rotation = weekday_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2025-05-05"), REST_LABEL)].into_iter().collect();
        let date = ymd(2025, 6, 17);
        assert_eq!(
            rotation.resolve(date, &overrides),
            rotation.resolve(date, &overrides)
        );
    }

    #[test]
    fn test_fixed_rest_weekdays() {
        let rotation = weekday_rest_rotation();
        let none = WorkoutOverrides::new();

        // 2024-12-16 is a Monday
        assert_eq!(rotation.resolve(ymd(2024, 12, 16), &none), "Chest & Triceps");
        assert_eq!(rotation.resolve(ymd(2024, 12, 17), &none), "Back & Biceps");
        assert_eq!(rotation.resolve(ymd(2024, 12, 18), &none), "Rest"); // Wednesday
        assert_eq!(rotation.resolve(ymd(2024, 12, 19), &none), "Legs");
        assert_eq!(rotation.resolve(ymd(2024, 12, 20), &none), "Chest & Triceps");
        assert_eq!(rotation.resolve(ymd(2024, 12, 21), &none), "Back & Biceps");
        assert_eq!(rotation.resolve(ymd(2024, 12, 22), &none), "Rest"); // Sunday
        assert_eq!(rotation.resolve(ymd(2024, 12, 23), &none), "Legs");
    }

    #[test]
    fn test_override_on_fixed_rest_day_does_not_advance() {
        let rotation = weekday_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2024-12-18"), "Legs")].into_iter().collect();

        assert_eq!(rotation.resolve(ymd(2024, 12, 18), &overrides), "Legs");
        assert_eq!(rotation.resolve(ymd(2024, 12, 19), &overrides), "Legs");
    }

    #[test]
    fn test_periodic_without_overrides() {
        let none = WorkoutOverrides::new();

        let slotted = slotted_rest_rotation();
        for offset in -30..60 {
            let date = ymd(2025, 1, 1) + Duration::days(offset);
            assert_eq!(
                slotted.resolve(date, &none),
                slotted.resolve(date + Duration::days(4), &none)
            );
        }

        // Five training days a week over three slots repeats every 21 days
        let weekly = weekday_rest_rotation();
        for offset in -30..60 {
            let date = ymd(2024, 12, 16) + Duration::days(offset);
            assert_eq!(
                weekly.resolve(date, &none),
                weekly.resolve(date + Duration::days(21), &none)
            );
        }
    }

    #[test]
    fn test_dates_before_epoch_use_floor_modulo() {
        let rotation = slotted_rest_rotation();
        let none = WorkoutOverrides::new();

        assert_eq!(rotation.resolve(ymd(2024, 12, 31), &none), "Rest");
        assert_eq!(rotation.resolve(ymd(2024, 12, 30), &none), "Legs");
        assert_eq!(rotation.resolve(ymd(2024, 12, 28), &none), "Chest & Triceps");
        // 580 days before epoch
        assert_eq!(rotation.resolve(ymd(2023, 6, 1), &none), "Chest & Triceps");
    }

    #[test]
    fn test_before_epoch_rest_override_is_consistent() {
        let rotation = slotted_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2024-12-29"), REST_LABEL)].into_iter().collect();

        // The day after a rest pin continues where the day before left off
        let start = ymd(2024, 12, 20);
        let swept: Vec<_> = rotation.sweep(start, &overrides).take(20).collect();
        for (date, label) in swept {
            assert_eq!(rotation.resolve(date, &overrides), label, "mismatch on {}", date);
        }
    }

    #[test]
    fn test_sweep_matches_pointwise_resolution() {
        let rotation = weekday_rest_rotation();
        let overrides: WorkoutOverrides = [
            (key("2024-12-10"), REST_LABEL),
            (key("2025-01-07"), REST_LABEL),
            (key("2025-01-09"), "Back & Biceps"),
            (key("2025-01-15"), "Legs"),
        ]
        .into_iter()
        .collect();

        let start = ymd(2024, 12, 1);
        for (date, label) in rotation.sweep(start, &overrides).take(90) {
            assert_eq!(rotation.resolve(date, &overrides), label, "mismatch on {}", date);
        }
    }

    #[test]
    fn test_generate_schedule_flags() {
        let rotation = weekday_rest_rotation();
        let overrides: WorkoutOverrides = [(key("2024-12-17"), "Legs")].into_iter().collect();
        let days = rotation.generate_schedule(
            ymd(2024, 12, 16),
            ymd(2024, 12, 22),
            &overrides,
            ymd(2024, 12, 18),
        );

        assert_eq!(days.len(), 7);
        assert!(days[0].is_past);
        assert!(days[1].is_manual_override);
        assert_eq!(days[1].workout, "Legs");
        assert!(days[2].is_today);
        assert!(days[2].is_fixed_rest);
        assert_eq!(days[2].date_key.to_string(), "2024-12-18");
        assert!(!days[3].is_past && !days[3].is_today);
        assert!(days[6].is_fixed_rest);
    }

    #[test]
    fn test_generate_schedule_empty_range() {
        let rotation = weekday_rest_rotation();
        let days = rotation.generate_schedule(
            ymd(2025, 1, 10),
            ymd(2025, 1, 1),
            &WorkoutOverrides::new(),
            ymd(2025, 1, 1),
        );
        assert!(days.is_empty());
    }

    #[test]
    fn test_workout_options() {
        assert_eq!(
            slotted_rest_rotation().workout_options(),
            vec!["Rest", "Chest & Triceps", "Back & Biceps", "Legs"]
        );
    }

    #[test]
    fn test_empty_rotation_rejected() {
        assert!(Rotation::new(ymd(2025, 1, 1), vec![], vec![]).is_err());
    }
}
