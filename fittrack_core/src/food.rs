//! Daily food log and food library operations.

use crate::config::NutritionConfig;
use crate::types::{FoodItem, FoodLibrary, FoodLog, FoodTemplate, NutritionTotals};
use crate::{Error, Result};

impl FoodLog {
    /// An empty log using the configured goals
    pub fn empty(goals: &NutritionConfig) -> Self {
        Self {
            items: Vec::new(),
            calorie_goal: goals.calorie_goal,
            protein_goal: goals.protein_goal,
        }
    }

    pub fn add_item(&mut self, name: &str, calories: f64, protein: f64) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Food("Food name must not be empty".into()));
        }
        check_amounts(calories, protein)?;
        self.items.push(FoodItem {
            name: name.to_string(),
            calories,
            protein,
            eaten: false,
        });
        Ok(self.items.len() - 1)
    }

    pub fn add_from_template(&mut self, template: &FoodTemplate) -> Result<usize> {
        self.add_item(&template.name, template.calories, template.protein)
    }

    /// Flip an item's eaten flag; returns the new state
    pub fn toggle_eaten(&mut self, index: usize) -> Result<bool> {
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::Food(format!("No food item at position {}", index + 1)))?;
        item.eaten = !item.eaten;
        Ok(item.eaten)
    }

    pub fn remove_item(&mut self, index: usize) -> Result<FoodItem> {
        if index >= self.items.len() {
            return Err(Error::Food(format!("No food item at position {}", index + 1)));
        }
        Ok(self.items.remove(index))
    }

    pub fn set_goals(&mut self, calorie_goal: Option<f64>, protein_goal: Option<f64>) -> Result<()> {
        let valid = |goal: Option<f64>| goal.map_or(true, |g| g.is_finite() && g > 0.0);
        if !valid(calorie_goal) || !valid(protein_goal) {
            return Err(Error::Food("Goals must be positive finite numbers".into()));
        }
        if let Some(goal) = calorie_goal {
            self.calorie_goal = goal;
        }
        if let Some(goal) = protein_goal {
            self.protein_goal = goal;
        }
        Ok(())
    }

    /// Totals over eaten items only
    pub fn totals(&self) -> NutritionTotals {
        self.items
            .iter()
            .filter(|item| item.eaten)
            .fold(NutritionTotals::default(), |acc, item| NutritionTotals {
                calories: acc.calories + item.calories,
                protein: acc.protein + item.protein,
            })
    }

    /// Eaten calories as a percent of the goal, capped at 100.
    /// A non-positive stored goal falls back to the configured one.
    pub fn calorie_percent(&self, fallback: &NutritionConfig) -> u8 {
        let goal = if self.calorie_goal > 0.0 {
            self.calorie_goal
        } else {
            fallback.calorie_goal
        };
        if goal <= 0.0 {
            return 0;
        }
        let percent = (self.totals().calories / goal * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

impl FoodLibrary {
    /// Add a template; names are unique ignoring case
    pub fn add(&mut self, template: FoodTemplate) -> Result<()> {
        let name = template.name.trim();
        if name.is_empty() {
            return Err(Error::Food("Food name must not be empty".into()));
        }
        check_amounts(template.calories, template.protein)?;
        if self.find(name).is_some() {
            return Err(Error::Food(format!("{:?} is already in the library", name)));
        }
        self.items.push(FoodTemplate {
            name: name.to_string(),
            ..template
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<FoodTemplate> {
        let idx = self
            .items
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::Food(format!("{:?} is not in the library", name)))?;
        Ok(self.items.remove(idx))
    }

    pub fn find(&self, name: &str) -> Option<&FoodTemplate> {
        self.items
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Amounts must survive a JSON round trip, which has no infinity or NaN
fn check_amounts(calories: f64, protein: f64) -> Result<()> {
    if !calories.is_finite() || !protein.is_finite() {
        return Err(Error::Food("Calories and protein must be finite numbers".into()));
    }
    if calories < 0.0 || protein < 0.0 {
        return Err(Error::Food("Calories and protein must not be negative".into()));
    }
    Ok(())
}
