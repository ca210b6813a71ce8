use crate::models::{
    CompletionSummary, DailyPoint, DashboardResponse, Development, DevelopmentSummary, Entry,
    Exercise, ExerciseSummary, Finance, FinanceKind, FinanceSummary, Food, FoodSummary, HealthMood,
    HealthMoodSummary, HouseWork, Plan, PlanSummary, Record, Reflection, ReflectionSummary, Todo,
    WeeklyProgressPoint, Worship, WorshipSummary,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mood shown on the dashboard before anything has been logged.
pub const DEFAULT_MOOD: f64 = 7.0;

const WEEKLY_PROGRESS_WEEKS: u32 = 4;
const MOOD_DAYS: u32 = 7;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn total<R>(records: &[R], value: impl Fn(&R) -> f64) -> f64 {
    records.iter().map(value).sum()
}

/// `0` for an empty slice.
pub fn average<R>(records: &[R], value: impl Fn(&R) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    total(records, value) / records.len() as f64
}

/// Percentage of `true` flags, `0` when there are none at all.
pub fn completion_rate(flags: impl IntoIterator<Item = bool>) -> f64 {
    let (completed, count) = flags
        .into_iter()
        .fold((0usize, 0usize), |(done, all), flag| (done + usize::from(flag), all + 1));
    if count == 0 {
        return 0.0;
    }
    completed as f64 / count as f64 * 100.0
}

pub fn category_breakdown<R>(
    records: &[R],
    category: impl Fn(&R) -> &str,
    amount: impl Fn(&R) -> f64,
) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(category(record).to_string()).or_insert(0.0) += amount(record);
    }
    totals
}

/// One point per day for the `n` days ending on `today`, oldest first.
/// Days without a record carry `None`; the first matching record wins.
pub fn last_n_days_at<R>(
    today: NaiveDate,
    n: u32,
    records: &[R],
    date: impl Fn(&R) -> NaiveDate,
    value: impl Fn(&R) -> f64,
) -> Vec<DailyPoint> {
    (0..i64::from(n))
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            DailyPoint {
                date: date_key(day),
                value: records.iter().find(|record| date(*record) == day).map(&value),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSample {
    pub date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub date: NaiveDate,
    pub progress: f64,
}

/// Scores the Monday-start week containing `today - week_offset` weeks.
pub fn weekly_bucket_at(
    today: NaiveDate,
    week_offset: u32,
    tasks: &[TaskSample],
    developments: &[ProgressSample],
) -> WeeklyProgressPoint {
    let start = week_start(today - Duration::weeks(i64::from(week_offset)));
    let end = start + Duration::days(6);
    let in_week = |date: NaiveDate| date >= start && date <= end;

    let week_tasks: Vec<&TaskSample> = tasks.iter().filter(|task| in_week(task.date)).collect();
    let week_devs: Vec<&ProgressSample> =
        developments.iter().filter(|dev| in_week(dev.date)).collect();

    let completed_tasks = week_tasks.iter().filter(|task| task.completed).count();
    let avg_dev = average(&week_devs, |dev| dev.progress);
    let progress = if week_tasks.is_empty() {
        avg_dev
    } else {
        completed_tasks as f64 / week_tasks.len() as f64 * 50.0 + avg_dev * 0.5
    };

    WeeklyProgressPoint {
        week: week_label(start),
        start_date: date_key(start),
        end_date: date_key(end),
        total_tasks: week_tasks.len(),
        completed_tasks,
        development_entries: week_devs.len(),
        progress: progress.min(100.0),
    }
}

/// `weeks` buckets ending with the current week, oldest first.
pub fn weekly_progress_at(
    today: NaiveDate,
    weeks: u32,
    tasks: &[TaskSample],
    developments: &[ProgressSample],
) -> Vec<WeeklyProgressPoint> {
    (0..weeks)
        .rev()
        .map(|offset| weekly_bucket_at(today, offset, tasks, developments))
        .collect()
}

/// Collections the dashboard reads.
#[derive(Debug, Clone, Copy)]
pub struct DashboardSources<'a> {
    pub todos: &'a [Record<Todo>],
    pub plans: &'a [Record<Plan>],
    pub houseworks: &'a [Record<HouseWork>],
    pub finances: &'a [Record<Finance>],
    pub moods: &'a [Record<HealthMood>],
    pub developments: &'a [Record<Development>],
}

pub fn build_dashboard(sources: DashboardSources<'_>) -> DashboardResponse {
    build_dashboard_at(today(), sources)
}

pub fn build_dashboard_at(today: NaiveDate, sources: DashboardSources<'_>) -> DashboardResponse {
    let todo_flags = || sources.todos.iter().map(|r| r.fields.completed);
    let expenses = expense_records(sources.finances);

    let average_mood = if sources.moods.is_empty() {
        DEFAULT_MOOD
    } else {
        average(sources.moods, |r| f64::from(r.fields.mood))
    };

    let tasks: Vec<TaskSample> = sources
        .todos
        .iter()
        .map(|r| TaskSample {
            date: r.created_at.date_naive(),
            completed: r.fields.completed,
        })
        .chain(sources.plans.iter().map(|r| TaskSample {
            date: r.created_at.date_naive(),
            completed: r.fields.completed,
        }))
        .collect();
    let developments: Vec<ProgressSample> = sources
        .developments
        .iter()
        .map(|r| ProgressSample {
            date: r.created_at.date_naive(),
            progress: f64::from(r.fields.progress),
        })
        .collect();

    DashboardResponse {
        total_tasks: sources.todos.len(),
        completed_tasks: todo_flags().filter(|done| *done).count(),
        completion_rate: completion_rate(todo_flags()),
        total_expenses: total(&expenses, |r| r.fields.amount),
        average_mood,
        overall_completion: completion_rate(
            todo_flags()
                .chain(sources.plans.iter().map(|r| r.fields.completed))
                .chain(sources.houseworks.iter().map(|r| r.fields.completed)),
        ),
        expense_breakdown: category_breakdown(
            &expenses,
            |r| r.fields.category.as_str(),
            |r| r.fields.amount,
        ),
        mood_last_7_days: last_n_days_at(
            today,
            MOOD_DAYS,
            sources.moods,
            |r| r.fields.date,
            |r| f64::from(r.fields.mood),
        ),
        weekly_progress: weekly_progress_at(today, WEEKLY_PROGRESS_WEEKS, &tasks, &developments),
    }
}

fn expense_records(finances: &[Record<Finance>]) -> Vec<&Record<Finance>> {
    finances
        .iter()
        .filter(|r| r.fields.kind == FinanceKind::Expense)
        .collect()
}

/// Per-collection figures shown above each list.
pub trait Summarize: Entry {
    type Summary: Serialize + Send + 'static;

    fn summarize_at(records: &[Record<Self>], today: NaiveDate) -> Self::Summary;
}

fn completion_summary<T>(records: &[Record<T>], completed: impl Fn(&T) -> bool) -> CompletionSummary {
    let flags = || records.iter().map(|r| completed(&r.fields));
    CompletionSummary {
        total: records.len(),
        completed: flags().filter(|done| *done).count(),
        completion_rate: completion_rate(flags()),
    }
}

impl Summarize for Todo {
    type Summary = CompletionSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> CompletionSummary {
        completion_summary(records, |todo| todo.completed)
    }
}

impl Summarize for HouseWork {
    type Summary = CompletionSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> CompletionSummary {
        completion_summary(records, |chore| chore.completed)
    }
}

impl Summarize for Plan {
    type Summary = PlanSummary;

    fn summarize_at(records: &[Record<Self>], today: NaiveDate) -> PlanSummary {
        let todays: Vec<&Record<Plan>> = records.iter().filter(|r| r.fields.date == today).collect();
        PlanSummary {
            total: records.len(),
            today: todays.len(),
            completed_today: todays.iter().filter(|r| r.fields.completed).count(),
        }
    }
}

impl Summarize for Exercise {
    type Summary = ExerciseSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> ExerciseSummary {
        ExerciseSummary {
            total_duration: total(records, |r| f64::from(r.fields.duration)),
            total_calories: total(records, |r| f64::from(r.fields.calories)),
        }
    }
}

impl Summarize for Development {
    type Summary = DevelopmentSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> DevelopmentSummary {
        DevelopmentSummary {
            average_progress: average(records, |r| f64::from(r.fields.progress)),
            total_duration: total(records, |r| f64::from(r.fields.duration)),
        }
    }
}

impl Summarize for Worship {
    type Summary = WorshipSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> WorshipSummary {
        WorshipSummary {
            total_duration: total(records, |r| f64::from(r.fields.duration)),
            average_duration: average(records, |r| f64::from(r.fields.duration)),
        }
    }
}

impl Summarize for HealthMood {
    type Summary = HealthMoodSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> HealthMoodSummary {
        HealthMoodSummary {
            average_mood: average(records, |r| f64::from(r.fields.mood)),
            average_energy: average(records, |r| f64::from(r.fields.energy)),
        }
    }
}

impl Summarize for Reflection {
    type Summary = ReflectionSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> ReflectionSummary {
        ReflectionSummary {
            count: records.len(),
            average_rating: average(records, |r| f64::from(r.fields.rating)),
        }
    }
}

impl Summarize for Finance {
    type Summary = FinanceSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> FinanceSummary {
        let sum_of = |kind: FinanceKind| {
            records
                .iter()
                .filter(|r| r.fields.kind == kind)
                .map(|r| r.fields.amount)
                .sum::<f64>()
        };
        let total_income = sum_of(FinanceKind::Income);
        let total_expense = sum_of(FinanceKind::Expense);
        FinanceSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

impl Summarize for Food {
    type Summary = FoodSummary;

    fn summarize_at(records: &[Record<Self>], _today: NaiveDate) -> FoodSummary {
        FoodSummary {
            total_calories: total(records, |r| f64::from(r.fields.calories)),
            total_protein: total(records, |r| r.fields.protein),
            total_carbs: total(records, |r| r.fields.carbs),
            total_fat: total(records, |r| r.fields.fat),
        }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
