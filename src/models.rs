use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fmt::Display;

/// One logged entry: generated identity plus the domain fields of `T`,
/// flattened into a single JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: T,
}

/// Schema descriptor for a collection of records.
pub trait Entry: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Storage key and URL segment of the collection.
    const COLLECTION: &'static str;

    /// Form-level constraints: required text present, numbers in range.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Entries carrying a boolean completion flag.
pub trait Completable {
    fn is_completed(&self) -> bool;
    fn set_completed(&mut self, completed: bool);
}

macro_rules! completable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Completable for $ty {
                fn is_completed(&self) -> bool {
                    self.completed
                }

                fn set_completed(&mut self, completed: bool) {
                    self.completed = completed;
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TodoStatus {
    #[default]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub task: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
}

impl Entry for Todo {
    const COLLECTION: &'static str = "todos";

    fn validate(&self) -> Result<(), String> {
        required("task", &self.task)?;
        required("category", &self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub completed: bool,
}

impl Entry for Plan {
    const COLLECTION: &'static str = "plans";

    fn validate(&self) -> Result<(), String> {
        required("title", &self.title)?;
        required("description", &self.description)?;
        required("category", &self.category)?;
        required("startTime", &self.start_time)?;
        required("endTime", &self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: u32,
    pub calories: u32,
    #[serde(default)]
    pub notes: String,
}

impl Entry for Exercise {
    const COLLECTION: &'static str = "exercises";

    fn validate(&self) -> Result<(), String> {
        required("type", &self.kind)?;
        at_least("duration", self.duration, 1)?;
        at_least("calories", self.calories, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Development {
    pub date: NaiveDate,
    pub category: String,
    pub activity: String,
    pub duration: u32,
    pub progress: u32,
    #[serde(default)]
    pub notes: String,
}

impl Entry for Development {
    const COLLECTION: &'static str = "developments";

    fn validate(&self) -> Result<(), String> {
        required("category", &self.category)?;
        required("activity", &self.activity)?;
        at_least("duration", self.duration, 1)?;
        within("progress", self.progress, 0, 100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worship {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
}

impl Entry for Worship {
    const COLLECTION: &'static str = "worships";

    fn validate(&self) -> Result<(), String> {
        required("type", &self.kind)?;
        at_least("duration", self.duration, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseWork {
    pub date: NaiveDate,
    pub task: String,
    pub room: String,
    pub duration: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl Entry for HouseWork {
    const COLLECTION: &'static str = "houseworks";

    fn validate(&self) -> Result<(), String> {
        required("task", &self.task)?;
        required("room", &self.room)?;
        at_least("duration", self.duration, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMood {
    pub date: NaiveDate,
    pub mood: u8,
    pub energy: u8,
    pub sleep: f64,
    pub water: u32,
    #[serde(default)]
    pub notes: String,
}

impl Entry for HealthMood {
    const COLLECTION: &'static str = "health-mood";

    fn validate(&self) -> Result<(), String> {
        within("mood", self.mood, 1, 10)?;
        within("energy", self.energy, 1, 10)?;
        within("sleep", self.sleep, 1.0, 24.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub date: NaiveDate,
    pub gratitude: String,
    pub achievement: String,
    pub challenge: String,
    pub improvement: String,
    pub mood: u8,
    pub rating: u8,
}

impl Entry for Reflection {
    const COLLECTION: &'static str = "reflections";

    fn validate(&self) -> Result<(), String> {
        required("gratitude", &self.gratitude)?;
        required("achievement", &self.achievement)?;
        required("challenge", &self.challenge)?;
        required("improvement", &self.improvement)?;
        within("mood", self.mood, 1, 10)?;
        within("rating", self.rating, 1, 5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinanceKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finance {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: FinanceKind,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

impl Entry for Finance {
    const COLLECTION: &'static str = "finances";

    fn validate(&self) -> Result<(), String> {
        required("category", &self.category)?;
        at_least("amount", self.amount, 0.0)?;
        required("description", &self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub date: NaiveDate,
    pub meal: Meal,
    pub food: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub notes: String,
}

impl Entry for Food {
    const COLLECTION: &'static str = "foods";

    fn validate(&self) -> Result<(), String> {
        required("food", &self.food)?;
        at_least("protein", self.protein, 0.0)?;
        at_least("carbs", self.carbs, 0.0)?;
        at_least("fat", self.fat, 0.0)
    }
}

completable!(Todo, Plan, Worship, HouseWork);

fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

fn at_least<N: PartialOrd + Display>(field: &str, value: N, min: N) -> Result<(), String> {
    if value < min {
        return Err(format!("{field} must be at least {min}"));
    }
    Ok(())
}

fn within<N: PartialOrd + Display>(field: &str, value: N, min: N, max: N) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{field} must be between {min} and {max}"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub development_entries: usize,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: f64,
    pub total_expenses: f64,
    pub average_mood: f64,
    pub overall_completion: f64,
    pub expense_breakdown: BTreeMap<String, f64>,
    pub mood_last_7_days: Vec<DailyPoint>,
    pub weekly_progress: Vec<WeeklyProgressPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total: usize,
    pub today: usize,
    pub completed_today: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub total_duration: f64,
    pub total_calories: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentSummary {
    pub average_progress: f64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipSummary {
    pub total_duration: f64,
    pub average_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMoodSummary {
    pub average_mood: f64,
    pub average_energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionSummary {
    pub count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}
