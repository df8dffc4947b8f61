//! Month view built from a `TaskCache`.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::cache::{DayIndicator, TaskCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub selected: bool,
    pub today: bool,
    pub indicator: DayIndicator,
}

/// Seven cells, Sunday first.
pub type Week = Vec<CalendarCell>;

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

pub fn next_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

pub fn previous_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first.checked_sub_months(Months::new(1)).unwrap_or(first)
}

/// Weeks covering `month`, from the Sunday on or before the first of the
/// month to the Saturday on or after its last day. Cells outside the month
/// never carry an indicator.
pub fn month_grid(
    month: NaiveDate,
    cache: &TaskCache,
    selected: NaiveDate,
    today: NaiveDate,
) -> Vec<Week> {
    let (first, last) = month_bounds(month);
    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = 6 - u64::from(last.weekday().num_days_from_sunday());

    let start = first.checked_sub_days(Days::new(lead)).unwrap_or(first);
    let end = last.checked_add_days(Days::new(trail)).unwrap_or(last);

    let cells: Vec<CalendarCell> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| {
            let in_month = date.month() == first.month() && date.year() == first.year();
            CalendarCell {
                date,
                in_month,
                selected: date == selected,
                today: date == today,
                indicator: if in_month {
                    cache.highest_priority_for_date(date)
                } else {
                    DayIndicator::None
                },
            }
        })
        .collect();

    cells.chunks(7).map(<[CalendarCell]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Task};
    use chrono::{Utc, Weekday};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, date: NaiveDate, priority: Priority) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            date,
            priority,
            completed: false,
            owner_id: "owner".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn month_bounds_handle_leap_years() {
        assert_eq!(month_bounds(day(2024, 2, 14)), (day(2024, 2, 1), day(2024, 2, 29)));
        assert_eq!(month_bounds(day(2023, 2, 14)), (day(2023, 2, 1), day(2023, 2, 28)));
        assert_eq!(month_bounds(day(2024, 12, 31)), (day(2024, 12, 1), day(2024, 12, 31)));
    }

    #[test]
    fn month_navigation() {
        assert_eq!(next_month(day(2024, 1, 31)), day(2024, 2, 1));
        assert_eq!(previous_month(day(2024, 1, 15)), day(2023, 12, 1));
    }

    #[test]
    fn grid_spans_whole_weeks() {
        // March 2024 starts on a Friday and ends on a Sunday.
        let grid = month_grid(
            day(2024, 3, 10),
            &TaskCache::new(),
            day(2024, 3, 10),
            day(2024, 3, 1),
        );

        assert!(grid.iter().all(|week| week.len() == 7));
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0][0].date, day(2024, 2, 25));
        assert_eq!(grid[0][0].date.weekday(), Weekday::Sun);
        assert_eq!(grid[5][6].date, day(2024, 4, 6));
        assert!(!grid[0][0].in_month);
        assert!(grid[0][5].in_month);
        assert!(grid[0][5].today);
    }

    #[test]
    fn grid_carries_indicators_only_inside_the_month() {
        let cache = TaskCache::from_tasks(vec![
            task("a", day(2024, 3, 4), Priority::High),
            task("b", day(2024, 2, 26), Priority::High),
        ]);
        let grid = month_grid(day(2024, 3, 1), &cache, day(2024, 3, 4), day(2024, 3, 1));
        let cells: Vec<_> = grid.into_iter().flatten().collect();

        let march_4 = cells.iter().find(|c| c.date == day(2024, 3, 4)).unwrap();
        assert_eq!(march_4.indicator, DayIndicator::High);
        assert!(march_4.selected);

        let feb_26 = cells.iter().find(|c| c.date == day(2024, 2, 26)).unwrap();
        assert_eq!(feb_26.indicator, DayIndicator::None);
    }
}
