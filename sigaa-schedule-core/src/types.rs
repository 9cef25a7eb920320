use std::fmt;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// Teaching day, in the portal's local naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 6] = [
        Self::Segunda,
        Self::Terca,
        Self::Quarta,
        Self::Quinta,
        Self::Sexta,
        Self::Sabado,
    ];

    /// Map a time-code day digit (`2` = Monday ... `7` = Saturday)
    pub fn from_code_digit(digit: char) -> Option<Self> {
        Some(match digit {
            '2' => Self::Segunda,
            '3' => Self::Terca,
            '4' => Self::Quarta,
            '5' => Self::Quinta,
            '6' => Self::Sexta,
            '7' => Self::Sabado,
            _ => return None,
        })
    }

    /// Lowercase ASCII key, as stored and accepted on the command line
    pub fn key(self) -> &'static str {
        match self {
            Self::Segunda => "segunda",
            Self::Terca => "terca",
            Self::Quarta => "quarta",
            Self::Quinta => "quinta",
            Self::Sexta => "sexta",
            Self::Sabado => "sabado",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Segunda => "Segunda-feira",
            Self::Terca => "Terça-feira",
            Self::Quarta => "Quarta-feira",
            Self::Quinta => "Quinta-feira",
            Self::Sexta => "Sexta-feira",
            Self::Sabado => "Sábado",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.key() == key || day.label().to_lowercase() == key)
    }

    /// Sunday has no classes and maps to `None`
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        Some(match weekday {
            Weekday::Mon => Self::Segunda,
            Weekday::Tue => Self::Terca,
            Weekday::Wed => Self::Quarta,
            Weekday::Thu => Self::Quinta,
            Weekday::Fri => Self::Sexta,
            Weekday::Sat => Self::Sabado,
            Weekday::Sun => return None,
        })
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily teaching period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

impl Shift {
    pub const ALL: [Shift; 3] = [Self::Morning, Self::Afternoon, Self::Night];

    pub fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'M' => Self::Morning,
            'T' => Self::Afternoon,
            'N' => Self::Night,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        match self {
            Self::Morning => 'M',
            Self::Afternoon => 'T',
            Self::Night => 'N',
        }
    }
}

/// One fixed period of a shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub shift: Shift,
    /// 1-based slot number within the shift
    pub number: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    /// Short label such as `M1` or `N4`
    pub fn label(&self) -> String {
        format!("{}{}", self.shift.letter(), self.number)
    }
}

/// One class meeting on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Course code assigned by the institution, may be empty
    #[serde(rename = "codigo")]
    pub code: String,
    /// Course name, never empty
    pub subject: String,
    pub teacher: String,
    /// Section identifier ("turma")
    #[serde(rename = "turma")]
    pub class_group: String,
    /// Enrollment status, verbatim
    pub status: String,
    pub day: DayOfWeek,
    #[serde(rename = "startTime", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", with = "hhmm")]
    pub end_time: NaiveTime,
    /// Room or building with the "Local:" label stripped
    pub location: String,
    /// Cleaned source time code, e.g. `35M12`
    #[serde(rename = "horarioCompleto")]
    pub raw_time_code: String,
}

/// Student identity read off the identification table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "nome", default)]
    pub full_name: String,
    #[serde(rename = "matricula", default)]
    pub registration_id: String,
    #[serde(rename = "curso", default)]
    pub program: String,
    #[serde(rename = "formacao", default)]
    pub degree_level: String,
    #[serde(rename = "periodoLetivo", default)]
    pub academic_term: String,
}

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// `id` attribute of the identification table
    pub identity_table_id: String,
    /// Rows with fewer cells are not class rows
    pub min_cells: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            identity_table_id: "identificacao".to_string(),
            min_cells: 5,
        }
    }
}

/// Result of parsing one exported page
#[derive(Debug, Default)]
pub struct ParsedDocument {
    /// Entries in document scan order
    pub entries: Vec<ScheduleEntry>,
    pub identity: Option<UserIdentity>,
    /// Number of `table` elements seen
    pub tables_found: usize,
    /// Non-fatal problems met while scanning
    pub issues: Vec<Error>,
}

impl ParsedDocument {
    pub fn has_tables(&self) -> bool {
        self.tables_found > 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `HH:MM` (de)serialization for [`NaiveTime`]
pub(crate) mod hhmm {
    use super::*;

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(de: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(de)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_keys() {
        assert_eq!(DayOfWeek::from_code_digit('2'), Some(DayOfWeek::Segunda));
        assert_eq!(DayOfWeek::from_code_digit('7'), Some(DayOfWeek::Sabado));
        assert_eq!(DayOfWeek::from_code_digit('1'), None);
        assert_eq!(DayOfWeek::from_code_digit('8'), None);

        assert_eq!(DayOfWeek::from_key("Quarta"), Some(DayOfWeek::Quarta));
        assert_eq!(DayOfWeek::from_key("terça-feira"), Some(DayOfWeek::Terca));
        assert_eq!(DayOfWeek::from_key("domingo"), None);
        assert_eq!(DayOfWeek::from_weekday(Weekday::Sun), None);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = ScheduleEntry {
            code: "EC01".to_string(),
            subject: "Cálculo I".to_string(),
            teacher: "Maria".to_string(),
            class_group: "A".to_string(),
            status: "MATRICULADO".to_string(),
            day: DayOfWeek::Terca,
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(8, 40, 0).unwrap(),
            location: "Sala 10".to_string(),
            raw_time_code: "35M12".to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["codigo"], "EC01");
        assert_eq!(json["turma"], "A");
        assert_eq!(json["day"], "terca");
        assert_eq!(json["startTime"], "07:00");
        assert_eq!(json["endTime"], "08:40");
        assert_eq!(json["horarioCompleto"], "35M12");

        let back: ScheduleEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_identity_missing_fields_default() {
        let identity: UserIdentity = serde_json::from_str(r#"{"nome":"Ana"}"#).unwrap();
        assert_eq!(identity.full_name, "Ana");
        assert_eq!(identity.registration_id, "");
    }
}
