//! Date-indexed mirror of a fetched window of tasks.
//!
//! Every loaded task lives in exactly one bucket, the one keyed by its own
//! date. A locator map from task id to day key keeps `upsert` and `remove`
//! from scanning every bucket. Empty buckets are dropped.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task};

/// Per-day state shown on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayIndicator {
    None,
    Low,
    Medium,
    High,
    Completed,
}

impl From<Priority> for DayIndicator {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => DayIndicator::Low,
            Priority::Medium => DayIndicator::Medium,
            Priority::High => DayIndicator::High,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskCache {
    buckets: BTreeMap<NaiveDate, Vec<Task>>,
    locator: HashMap<String, NaiveDate>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut cache = Self::new();
        cache.load(tasks);
        cache
    }

    /// Replaces the whole cache. A repeated id keeps its last occurrence.
    pub fn load(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.clear();
        for task in tasks {
            self.upsert(task);
        }
    }

    /// Inserts `task`, or replaces the cached task with the same id. A
    /// same-day replacement keeps its position; a date change moves the task
    /// to the end of its new bucket.
    pub fn upsert(&mut self, task: Task) {
        if let Some(&old_date) = self.locator.get(&task.id) {
            if old_date == task.date {
                if let Some(bucket) = self.buckets.get_mut(&old_date) {
                    if let Some(index) = bucket.iter().position(|t| t.id == task.id) {
                        bucket[index] = task;
                        return;
                    }
                }
            }
            self.detach(&task.id, old_date);
        }

        self.locator.insert(task.id.clone(), task.date);
        self.buckets.entry(task.date).or_default().push(task);
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let date = self.locator.remove(id)?;
        self.detach(id, date)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.locator.clear();
    }

    /// Snapshot of the bucket for `date`.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        self.buckets.get(&date).cloned().unwrap_or_default()
    }

    pub fn highest_priority_for_date(&self, date: NaiveDate) -> DayIndicator {
        let Some(bucket) = self.buckets.get(&date) else {
            return DayIndicator::None;
        };

        bucket
            .iter()
            .filter(|task| !task.completed)
            .map(|task| task.priority)
            .max()
            .map(DayIndicator::from)
            .unwrap_or(if bucket.is_empty() {
                DayIndicator::None
            } else {
                DayIndicator::Completed
            })
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        let date = self.locator.get(id)?;
        self.buckets.get(date)?.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locator.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.locator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locator.is_empty()
    }

    /// Days with at least one task, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.buckets.keys().copied()
    }

    /// Every cached task, by date and then bucket order.
    pub fn all(&self) -> impl Iterator<Item = &Task> + '_ {
        self.buckets.values().flatten()
    }

    fn detach(&mut self, id: &str, date: NaiveDate) -> Option<Task> {
        let bucket = self.buckets.get_mut(&date)?;
        let index = bucket.iter().position(|task| task.id == id)?;
        let task = bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&date);
        }
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, date: NaiveDate, priority: Priority, completed: bool) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            description: None,
            date,
            priority,
            completed,
            owner_id: "owner".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn assert_index_consistent(cache: &TaskCache) {
        let mut seen = HashSet::new();
        for (date, bucket) in &cache.buckets {
            assert!(!bucket.is_empty(), "empty bucket left for {}", date);
            for task in bucket {
                assert_eq!(task.date, *date);
                assert!(seen.insert(task.id.clone()), "{} bucketed twice", task.id);
                assert_eq!(cache.locator.get(&task.id), Some(date));
            }
        }
        assert_eq!(seen.len(), cache.locator.len());
    }

    #[test]
    fn load_buckets_every_task_under_its_own_date() {
        let input = vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("b", day(2024, 3, 2), Priority::High, false),
            task("c", day(2024, 3, 1), Priority::Medium, true),
            task("d", day(2024, 2, 28), Priority::Medium, false),
        ];
        let cache = TaskCache::from_tasks(input.clone());

        assert_index_consistent(&cache);
        assert_eq!(cache.len(), 4);
        assert_eq!(ids(&cache.tasks_for_date(day(2024, 3, 1))), vec!["a", "c"]);
        assert_eq!(ids(&cache.tasks_for_date(day(2024, 3, 2))), vec!["b"]);

        let union: HashSet<_> = cache.all().map(|t| t.id.clone()).collect();
        let expected: HashSet<_> = input.iter().map(|t| t.id.clone()).collect();
        assert_eq!(union, expected);

        let dates: Vec<_> = cache.dates().collect();
        assert_eq!(dates, vec![day(2024, 2, 28), day(2024, 3, 1), day(2024, 3, 2)]);
    }

    #[test]
    fn load_replaces_previous_contents_and_is_idempotent() {
        let mut cache =
            TaskCache::from_tasks(vec![task("old", day(2024, 1, 1), Priority::Low, false)]);
        let input = vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("b", day(2024, 3, 1), Priority::High, false),
        ];
        cache.load(input.clone());
        let first = cache.tasks_for_date(day(2024, 3, 1));
        cache.load(input);

        assert!(!cache.contains("old"));
        assert!(cache.tasks_for_date(day(2024, 1, 1)).is_empty());
        assert_eq!(cache.tasks_for_date(day(2024, 3, 1)), first);
        assert_index_consistent(&cache);
    }

    #[test]
    fn load_keeps_one_copy_of_duplicate_ids() {
        let cache = TaskCache::from_tasks(vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("a", day(2024, 3, 5), Priority::High, false),
        ]);
        assert_eq!(cache.len(), 1);
        assert!(cache.tasks_for_date(day(2024, 3, 1)).is_empty());
        assert_eq!(cache.get("a").map(|t| t.priority), Some(Priority::High));
        assert_index_consistent(&cache);
    }

    #[test]
    fn upsert_twice_is_the_same_as_once() {
        let mut once = TaskCache::new();
        once.upsert(task("a", day(2024, 3, 1), Priority::Low, false));

        let mut twice = once.clone();
        twice.upsert(task("a", day(2024, 3, 1), Priority::Low, false));

        assert_eq!(
            ids(&once.tasks_for_date(day(2024, 3, 1))),
            ids(&twice.tasks_for_date(day(2024, 3, 1)))
        );
        assert_eq!(twice.len(), 1);
        assert_index_consistent(&twice);
    }

    #[test]
    fn upsert_with_new_date_leaves_no_residue() {
        let mut cache = TaskCache::from_tasks(vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("b", day(2024, 3, 1), Priority::Low, false),
        ]);

        cache.upsert(task("a", day(2024, 3, 9), Priority::Low, false));

        assert_eq!(ids(&cache.tasks_for_date(day(2024, 3, 1))), vec!["b"]);
        assert_eq!(ids(&cache.tasks_for_date(day(2024, 3, 9))), vec!["a"]);
        assert_index_consistent(&cache);

        cache.upsert(task("b", day(2024, 3, 9), Priority::Low, false));
        assert!(cache.tasks_for_date(day(2024, 3, 1)).is_empty());
        assert!(cache.dates().all(|d| d != day(2024, 3, 1)));
        assert_index_consistent(&cache);
    }

    #[test]
    fn same_day_upsert_replaces_in_place() {
        let mut cache = TaskCache::from_tasks(vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("b", day(2024, 3, 1), Priority::Low, false),
        ]);

        cache.upsert(task("a", day(2024, 3, 1), Priority::High, true));

        let bucket = cache.tasks_for_date(day(2024, 3, 1));
        assert_eq!(ids(&bucket), vec!["a", "b"]);
        assert!(bucket[0].completed);
        assert_eq!(bucket[0].priority, Priority::High);
    }

    #[test]
    fn remove_drops_task_from_its_bucket() {
        let mut cache = TaskCache::from_tasks(vec![
            task("a", day(2024, 3, 1), Priority::Low, false),
            task("b", day(2024, 3, 1), Priority::Low, false),
        ]);

        let removed = cache.remove("a");
        assert_eq!(removed.map(|t| t.id), Some("a".to_string()));
        assert!(!ids(&cache.tasks_for_date(day(2024, 3, 1))).contains(&"a"));
        assert!(cache.remove("a").is_none());
        assert!(cache.remove("missing").is_none());
        assert_index_consistent(&cache);
    }

    #[test]
    fn tasks_for_date_is_a_snapshot() {
        let cache = TaskCache::from_tasks(vec![task("a", day(2024, 3, 1), Priority::Low, false)]);

        let mut snapshot = cache.tasks_for_date(day(2024, 3, 1));
        snapshot.clear();
        snapshot.push(task("intruder", day(2024, 3, 1), Priority::High, false));

        assert_eq!(ids(&cache.tasks_for_date(day(2024, 3, 1))), vec!["a"]);
        assert!(cache.tasks_for_date(day(1999, 1, 1)).is_empty());
    }

    #[test]
    fn day_indicator_rules() {
        let d = day(2024, 3, 1);

        assert_eq!(TaskCache::new().highest_priority_for_date(d), DayIndicator::None);

        let cache = TaskCache::from_tasks(vec![task("a", d, Priority::High, true)]);
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::Completed);

        let cache = TaskCache::from_tasks(vec![
            task("a", d, Priority::Low, false),
            task("b", d, Priority::High, true),
        ]);
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::Low);

        let cache = TaskCache::from_tasks(vec![
            task("a", d, Priority::Medium, false),
            task("b", d, Priority::High, false),
        ]);
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::High);

        let cache = TaskCache::from_tasks(vec![
            task("a", d, Priority::Low, false),
            task("b", d, Priority::Medium, false),
            task("c", d, Priority::High, true),
        ]);
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::Medium);
    }

    #[test]
    fn indicator_follows_mutations() {
        let d = day(2024, 3, 1);
        let mut cache = TaskCache::from_tasks(vec![task("a", d, Priority::High, false)]);
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::High);

        cache.upsert(task("a", d, Priority::High, true));
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::Completed);

        cache.remove("a");
        assert_eq!(cache.highest_priority_for_date(d), DayIndicator::None);
    }
}
