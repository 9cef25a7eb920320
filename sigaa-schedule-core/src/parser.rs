//! Extraction of class rows and student identity from an exported SIGAA page.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::{Error, ParsedDocument, ParserOptions, ScheduleEntry, UserIdentity, timecode};

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static SUBJECT_MARKER: LazyLock<Selector> = LazyLock::new(|| selector(".componente"));
static LOCATION_MARKER: LazyLock<Selector> = LazyLock::new(|| selector(".local"));
static TEACHER_MARKER: LazyLock<Selector> = LazyLock::new(|| selector(".docente"));
static EMPHASIS: LazyLock<Selector> = LazyLock::new(|| selector("strong, b"));

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s*\(.*?\)"));
static LOCATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)^\s*local\s*:\s*"));
static TEACHER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)^\s*docentes?\s*(\(s\))?\s*:\s*"));

static LOCATION_LABEL: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)\blocal\s*:"));
static TEACHER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\bdocentes?\s*(\(s\))?\s*:"));

/// Elements that end a line of cell text
const LINE_BREAKS: [&str; 4] = ["br", "div", "p", "li"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid pattern")
}

/// Fields shared by every entry expanded from one table row
#[derive(Debug)]
struct RawRow {
    code: String,
    subject: String,
    teacher: String,
    location: String,
    class_group: String,
    status: String,
    time_code: String,
}

/// Parser for exported SIGAA schedule pages
#[derive(Debug, Clone, Default)]
pub struct ScheduleDocumentParser {
    options: ParserOptions,
}

impl ScheduleDocumentParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse a decoded HTML page into schedule entries and identity.
    ///
    /// Never fails: skipped rows, unresolved time tokens and missing tables
    /// are reported in [`ParsedDocument::issues`].
    pub fn parse(&self, html: &str) -> ParsedDocument {
        let document = Html::parse_document(html);
        let tables: Vec<ElementRef<'_>> = document.select(&TABLE).collect();
        let mut parsed = ParsedDocument {
            tables_found: tables.len(),
            ..ParsedDocument::default()
        };

        if tables.is_empty() {
            tracing::info!("No tables found in the document");
            parsed.issues.push(Error::NoTablesFound);
            return parsed;
        }

        parsed.identity = self.identity_from_tables(&tables);
        if parsed.identity.is_none() {
            tracing::info!(
                "Identity table #{} not found",
                self.options.identity_table_id
            );
            parsed.issues.push(Error::IdentityTableMissing);
        }

        for (table_index, table) in tables.iter().enumerate() {
            if self.is_identity_table(table) {
                continue;
            }

            let rows = body_rows(*table);
            if !self.looks_like_schedule(&rows) {
                tracing::debug!("Table {} does not look like a schedule", table_index);
                continue;
            }

            for (row_index, row) in rows.iter().enumerate() {
                match self.extract_row(*row) {
                    Ok(raw) => expand_row(raw, &mut parsed),
                    Err(message) => {
                        let error = Error::RowExtraction {
                            table: table_index,
                            row: row_index,
                            message,
                        };
                        tracing::debug!("{}", error);
                        parsed.issues.push(error);
                    }
                }
            }
        }

        tracing::info!(
            "Extracted {} schedule entries from {} tables",
            parsed.entries.len(),
            parsed.tables_found
        );

        parsed
    }

    /// Only the identity part of [`parse`](Self::parse)
    pub fn extract_identity(&self, html: &str) -> Option<UserIdentity> {
        let document = Html::parse_document(html);
        let tables: Vec<ElementRef<'_>> = document.select(&TABLE).collect();
        self.identity_from_tables(&tables)
    }

    /// The time column is the fifth cell, so never less than five
    fn min_cells(&self) -> usize {
        self.options.min_cells.max(5)
    }

    fn is_identity_table(&self, table: &ElementRef<'_>) -> bool {
        table.value().id() == Some(self.options.identity_table_id.as_str())
    }

    /// A table is a schedule table when some row is wide enough and carries
    /// a time code in its time column.
    fn looks_like_schedule(&self, rows: &[ElementRef<'_>]) -> bool {
        rows.iter().any(|row| {
            let cells = row_cells(*row);
            cells.len() >= self.min_cells()
                && timecode::contains_token(&clean_time_code(&element_text(cells[4])))
        })
    }

    fn extract_row(&self, row: ElementRef<'_>) -> Result<RawRow, String> {
        let cells = row_cells(row);
        if cells.len() < self.min_cells() {
            return Err(format!(
                "expected at least {} cells, found {}",
                self.min_cells(),
                cells.len()
            ));
        }

        let composite = cells[1];
        let lines = text_lines(composite);

        let subject = marker_text(composite, &SUBJECT_MARKER)
            .filter(|s| !s.is_empty())
            .or_else(|| fallback_subject(&lines))
            .unwrap_or_default();

        let location = match marker_text(composite, &LOCATION_MARKER) {
            Some(text) => LOCATION_PREFIX.replace(&text, "").trim().to_string(),
            None => labelled_value(&lines, &LOCATION_LABEL).unwrap_or_default(),
        };

        let teacher = match marker_text(composite, &TEACHER_MARKER) {
            Some(text) => TEACHER_PREFIX.replace(&text, "").trim().to_string(),
            None => labelled_value(&lines, &TEACHER_LABEL).unwrap_or_default(),
        };

        Ok(RawRow {
            code: element_text(cells[0]),
            subject,
            teacher,
            location,
            class_group: element_text(cells[2]),
            status: element_text(cells[3]),
            time_code: clean_time_code(&element_text(cells[4])),
        })
    }

    fn identity_from_tables(&self, tables: &[ElementRef<'_>]) -> Option<UserIdentity> {
        let table = tables.iter().find(|t| self.is_identity_table(t))?;
        let fields = identity_fields(*table);
        tracing::debug!("Identity table holds {} fields", fields.len());
        Some(identity_from_fields(&fields))
    }
}

/// Parse with default options
pub fn parse_document(html: &str) -> ParsedDocument {
    ScheduleDocumentParser::default().parse(html)
}

fn expand_row(raw: RawRow, parsed: &mut ParsedDocument) {
    let (meetings, skipped) = timecode::decode_strict(&raw.time_code);
    parsed.issues.extend(skipped);

    if raw.subject.is_empty() {
        tracing::debug!("Row with code '{}' has no subject, skipping", raw.code);
        return;
    }

    for meeting in meetings {
        parsed.entries.push(ScheduleEntry {
            code: raw.code.clone(),
            subject: raw.subject.clone(),
            teacher: raw.teacher.clone(),
            class_group: raw.class_group.clone(),
            status: raw.status.clone(),
            day: meeting.day,
            start_time: meeting.start,
            end_time: meeting.end,
            location: raw.location.clone(),
            raw_time_code: raw.time_code.clone(),
        });
    }
}

fn identity_fields(table: ElementRef<'_>) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for row in body_rows(table) {
        let cells = row_cells(row);
        for pair in cells.chunks_exact(2).take(2) {
            let key = element_text(pair[0]).replacen(':', "", 1);
            let key = fold_label(&key);
            if key.is_empty() {
                continue;
            }

            let value = pair[1]
                .select(&EMPHASIS)
                .next()
                .map_or_else(|| element_text(pair[1]), element_text);
            fields.insert(key, value);
        }
    }

    fields
}

fn identity_from_fields(fields: &HashMap<String, String>) -> UserIdentity {
    let field = |label: &str| fields.get(label).cloned().unwrap_or_default();

    UserIdentity {
        full_name: field("nome"),
        registration_id: field("matricula"),
        program: field("curso"),
        degree_level: field("formacao"),
        academic_term: field("periodo letivo"),
    }
}

/// Lowercase, accent-free, single-spaced form of a label
fn fold_label(label: &str) -> String {
    let folded: String = label
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect();
    clean_text(&folded)
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

/// `tr` elements of the table's own bodies, not of nested tables
fn body_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    child_elements(table, "tbody")
        .flat_map(|body| child_elements(body, "tr"))
        .collect()
}

fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    child_elements(row, "td").collect()
}

fn marker_text(cell: ElementRef<'_>, marker: &Selector) -> Option<String> {
    cell.select(marker).next().map(element_text)
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Non-blank lines of an element's text. Text nodes are joined; `<br>` and
/// block elements start a new line.
fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    let mut text = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(element) if LINE_BREAKS.iter().any(|name| *name == element.name()) => {
                text.push('\n');
            }
            _ => {}
        }
    }

    text.lines()
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect()
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove parenthesized date ranges such as `(03/03/2025 - 12/07/2025)`
fn clean_time_code(raw: &str) -> String {
    DATE_RANGE.replace_all(raw, "").trim().to_string()
}

/// Leftmost `Local:` or `Docente:` label of a line
fn first_label(line: &str) -> Option<regex::Match<'_>> {
    [&*LOCATION_LABEL, &*TEACHER_LABEL]
        .into_iter()
        .filter_map(|label| label.find(line))
        .min_by_key(|found| found.start())
}

fn is_label_line(line: &str) -> bool {
    first_label(line).is_some()
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == '–')
}

/// First line with text ahead of any label
fn fallback_subject(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let subject = match first_label(line) {
            Some(label) => trim_separators(&line[..label.start()]),
            None => line.as_str(),
        };
        (!subject.is_empty()).then(|| subject.to_string())
    })
}

/// Text following the first match of `label`, up to the next label. The next
/// line when the label ends its own line.
fn labelled_value(lines: &[String], label: &Regex) -> Option<String> {
    for (index, line) in lines.iter().enumerate() {
        let Some(found) = label.find(line) else {
            continue;
        };

        let rest = &line[found.end()..];
        let rest = match first_label(rest) {
            Some(next) => &rest[..next.start()],
            None => rest,
        };
        let value = trim_separators(rest);
        if !value.is_empty() {
            return Some(value.to_string());
        }
        return lines
            .get(index + 1)
            .filter(|next| !is_label_line(next))
            .cloned();
    }
    None
}
