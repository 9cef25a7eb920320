use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::{DayOfWeek, ScheduleEntry, TimeSlot, timecode};

/// Entries of one day, sorted by start time
pub fn classes_for_day(entries: &[ScheduleEntry], day: DayOfWeek) -> Vec<&ScheduleEntry> {
    let mut classes: Vec<&ScheduleEntry> = entries.iter().filter(|e| e.day == day).collect();
    classes.sort_by_key(|e| e.start_time);
    classes
}

/// Entries falling on a calendar date; Sundays have none
pub fn classes_on(entries: &[ScheduleEntry], date: NaiveDate) -> Vec<&ScheduleEntry> {
    DayOfWeek::from_weekday(date.weekday())
        .map(|day| classes_for_day(entries, day))
        .unwrap_or_default()
}

/// Week view: Monday to Saturday, each day sorted by start time
#[derive(Debug, Clone, Default)]
pub struct WeeklyTimetable {
    days: BTreeMap<DayOfWeek, Vec<ScheduleEntry>>,
}

impl WeeklyTimetable {
    pub fn from_entries(entries: impl IntoIterator<Item = ScheduleEntry>) -> Self {
        let mut days: BTreeMap<DayOfWeek, Vec<ScheduleEntry>> = DayOfWeek::ALL
            .into_iter()
            .map(|day| (day, Vec::new()))
            .collect();

        for entry in entries {
            days.entry(entry.day).or_default().push(entry);
        }
        for classes in days.values_mut() {
            classes.sort_by_key(|e| e.start_time);
        }

        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    pub fn day(&self, day: DayOfWeek) -> &[ScheduleEntry] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    /// Days in weekday order, including empty ones
    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &[ScheduleEntry])> {
        self.days.iter().map(|(day, classes)| (*day, classes.as_slice()))
    }

    /// First class of `day` whose envelope covers the whole slot
    pub fn class_for_slot(&self, day: DayOfWeek, slot: &TimeSlot) -> Option<&ScheduleEntry> {
        self.day(day)
            .iter()
            .find(|e| e.start_time <= slot.start && e.end_time >= slot.end)
    }

    /// Grid view: one row per slot of every shift, one column per day
    pub fn grid(&self) -> Vec<GridRow<'_>> {
        timecode::all_slots()
            .into_iter()
            .map(|slot| GridRow {
                cells: DayOfWeek::ALL.map(|day| self.class_for_slot(day, &slot)),
                slot,
            })
            .collect()
    }
}

/// One slot of the grid view
#[derive(Debug, Clone)]
pub struct GridRow<'a> {
    pub slot: TimeSlot,
    /// Indexed like [`DayOfWeek::ALL`]
    pub cells: [Option<&'a ScheduleEntry>; 6],
}
