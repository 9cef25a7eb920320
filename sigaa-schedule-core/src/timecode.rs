//! Decoder for the compact SIGAA schedule code (`35M12`, `4N1`, `246T34`).
//!
//! A token is `[2-7]+[MTN][0-9]+`: the weekday digits, the shift letter and
//! the slot digits. Only the first and last slot digit are looked up, giving
//! the start of the first slot and the end of the last one.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::{DayOfWeek, Error, Shift, TimeSlot};

const MORNING: [(u32, u32); 6] = [
    (7 * 60, 7 * 60 + 50),        // M1: 07:00-07:50
    (7 * 60 + 50, 8 * 60 + 40),   // M2: 07:50-08:40
    (8 * 60 + 55, 9 * 60 + 45),   // M3: 08:55-09:45
    (9 * 60 + 45, 10 * 60 + 35),  // M4: 09:45-10:35
    (10 * 60 + 50, 11 * 60 + 40), // M5: 10:50-11:40
    (11 * 60 + 40, 12 * 60 + 30), // M6: 11:40-12:30
];

const AFTERNOON: [(u32, u32); 6] = [
    (13 * 60, 13 * 60 + 50),      // T1: 13:00-13:50
    (13 * 60 + 50, 14 * 60 + 40), // T2: 13:50-14:40
    (14 * 60 + 55, 15 * 60 + 45), // T3: 14:55-15:45
    (15 * 60 + 45, 16 * 60 + 35), // T4: 15:45-16:35
    (16 * 60 + 50, 17 * 60 + 40), // T5: 16:50-17:40
    (17 * 60 + 40, 18 * 60 + 30), // T6: 17:40-18:30
];

const NIGHT: [(u32, u32); 4] = [
    (19 * 60, 19 * 60 + 50),      // N1: 19:00-19:50
    (19 * 60 + 50, 20 * 60 + 40), // N2: 19:50-20:40
    (20 * 60 + 55, 21 * 60 + 45), // N3: 20:55-21:45
    (21 * 60 + 45, 22 * 60 + 35), // N4: 21:45-22:35
];

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([2-7]+)([MTN])([0-9]+)").expect("valid token pattern"));

/// A decoded meeting: one day with its envelope times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meeting {
    pub day: DayOfWeek,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

fn shift_table(shift: Shift) -> &'static [(u32, u32)] {
    match shift {
        Shift::Morning => &MORNING,
        Shift::Afternoon => &AFTERNOON,
        Shift::Night => &NIGHT,
    }
}

fn minutes_to_time(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Look up a slot by shift and 1-based number
pub fn slot(shift: Shift, number: u8) -> Option<TimeSlot> {
    let index = usize::from(number).checked_sub(1)?;
    let &(start, end) = shift_table(shift).get(index)?;

    Some(TimeSlot {
        shift,
        number,
        start: minutes_to_time(start)?,
        end: minutes_to_time(end)?,
    })
}

/// Every slot of every shift, morning first
pub fn all_slots() -> Vec<TimeSlot> {
    Shift::ALL
        .into_iter()
        .flat_map(|shift| {
            (1..=shift_table(shift).len())
                .filter_map(move |n| u8::try_from(n).ok().and_then(|n| slot(shift, n)))
        })
        .collect()
}

/// Whether the string holds at least one token-shaped run
pub fn contains_token(code: &str) -> bool {
    TOKEN.is_match(code)
}

/// Decode every token in `code`, skipping the ones that do not resolve.
pub fn decode(code: &str) -> Vec<Meeting> {
    decode_strict(code).0
}

/// Like [`decode`], also reporting each skipped token.
pub fn decode_strict(code: &str) -> (Vec<Meeting>, Vec<Error>) {
    let mut meetings = Vec::new();
    let mut skipped = Vec::new();

    for caps in TOKEN.captures_iter(code) {
        let token = &caps[0];
        match decode_token(&caps[1], &caps[2], &caps[3]) {
            Some(decoded) => meetings.extend(decoded),
            None => {
                tracing::debug!("Skipping unrecognized time token: {}", token);
                skipped.push(Error::UnrecognizedTimeToken(token.to_string()));
            }
        }
    }

    (meetings, skipped)
}

fn decode_token(days: &str, shift: &str, slots: &str) -> Option<Vec<Meeting>> {
    let shift = Shift::from_letter(shift.chars().next()?)?;
    let first = slot_digit(slots.chars().next()?)?;
    let last = slot_digit(slots.chars().last()?)?;

    let start = slot(shift, first)?.start;
    let end = slot(shift, last)?.end;

    Some(
        days.chars()
            .filter_map(DayOfWeek::from_code_digit)
            .map(|day| Meeting { day, start, end })
            .collect(),
    )
}

fn slot_digit(c: char) -> Option<u8> {
    c.to_digit(10).and_then(|d| u8::try_from(d).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_two_days_morning() {
        let meetings = decode("35M12");
        assert_eq!(
            meetings,
            vec![
                Meeting {
                    day: DayOfWeek::Terca,
                    start: t(7, 0),
                    end: t(8, 40)
                },
                Meeting {
                    day: DayOfWeek::Quinta,
                    start: t(7, 0),
                    end: t(8, 40)
                },
            ]
        );
    }

    #[test]
    fn test_single_night_slot() {
        assert_eq!(
            decode("4N1"),
            vec![Meeting {
                day: DayOfWeek::Quarta,
                start: t(19, 0),
                end: t(19, 50)
            }]
        );
    }

    #[test]
    fn test_envelope_ignores_interior_digits() {
        let meetings = decode("6T1236");
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].start, t(13, 0));
        assert_eq!(meetings[0].end, t(18, 30));
    }

    #[test]
    fn test_one_tuple_per_day_digit() {
        for (code, days) in [("2M1", 1), ("246T34", 3), ("234567N34", 6), ("22M1", 2)] {
            let meetings = decode(code);
            assert_eq!(meetings.len(), days, "{code}");
            assert!(meetings.iter().all(|m| m.start == meetings[0].start));
            assert!(meetings.iter().all(|m| m.end == meetings[0].end));
        }
    }

    #[test]
    fn test_invalid_slot_skipped() {
        assert!(decode("2N9").is_empty());
        assert!(decode("2N15").is_empty());
        assert!(decode("3M7").is_empty());
        assert!(decode("3M0").is_empty());

        let (meetings, skipped) = decode_strict("2N9 4N1");
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].day, DayOfWeek::Quarta);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(&skipped[0], Error::UnrecognizedTimeToken(t) if t == "2N9"));
    }

    #[test]
    fn test_multiple_tokens_in_order() {
        let meetings = decode("24M34 6T12");
        let days: Vec<_> = meetings.iter().map(|m| m.day).collect();
        assert_eq!(
            days,
            vec![DayOfWeek::Segunda, DayOfWeek::Quarta, DayOfWeek::Sexta]
        );
        assert_eq!(meetings[0].start, t(8, 55));
        assert_eq!(meetings[0].end, t(10, 35));
        assert_eq!(meetings[2].start, t(13, 0));
        assert_eq!(meetings[2].end, t(14, 40));

        // Slot digits run greedily into the next token's day digits
        assert_eq!(decode("2M124T56").len(), 1);
    }

    #[test]
    fn test_noise_and_empty() {
        assert!(decode("").is_empty());
        assert!(decode("A definir").is_empty());
        assert!(decode("1M12").is_empty());
        assert_eq!(decode("Horário: 5N34").len(), 1);
    }

    #[test]
    fn test_slot_table() {
        let slots = all_slots();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].label(), "M1");
        assert_eq!(slots[15].label(), "N4");
        assert_eq!(slots[15].end, t(22, 35));
        assert!(slot(Shift::Night, 5).is_none());
        assert!(slot(Shift::Morning, 0).is_none());
    }
}
