//! Domain records and their field-by-position decoders
//!
//! Both entity types are parsed from fixed-order delimited lines. Decoding is
//! explicit per field, so a column change in the input format is a
//! compile-time concern here rather than a runtime mapping failure.

use chrono::NaiveDateTime;

/// Input format for the person birth date column.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A person record parsed from one source line.
///
/// Immutable after construction; consumed exactly once by either the
/// database sink or the invalid-people file sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    /// Source-assigned identifier; 0 when the source column is blank.
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Absent when the source column is blank. Absence is a validity
    /// concern, not a parse failure.
    pub birth_date: Option<NaiveDateTime>,
    pub age: i32,
}

impl Person {
    /// A person is valid iff name and email are non-blank and the birth date
    /// is present. Age and identifier play no part.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty() && self.birth_date.is_some()
    }
}

/// A bank-account record parsed from one source line.
///
/// No validity predicate: every parsed record is written to the database.
/// The owning-person identifier is not validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    pub id: i32,
    pub person_id: i32,
    pub branch: i32,
    pub account: i32,
    pub bank: i32,
}

/// Field-by-position decoder for one delimited line.
///
/// Implementations report malformed input as a plain message; the record
/// source attaches file and line context.
pub trait FromFields: Sized {
    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String>;
}

impl FromFields for Person {
    /// Columns: `name, email, birthDate, age, id` (fixed order).
    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String> {
        expect_fields(fields, 5)?;

        Ok(Person {
            name: fields[0].trim().to_string(),
            email: fields[1].trim().to_string(),
            birth_date: parse_birth_date(fields[2])?,
            age: parse_int(fields[3], "age")?,
            id: parse_int_or_zero(fields[4], "id")?,
        })
    }
}

impl FromFields for BankAccount {
    /// Columns: `personId, branch, account, bank, id` (fixed order).
    fn from_fields(fields: &[&str]) -> std::result::Result<Self, String> {
        expect_fields(fields, 5)?;

        Ok(BankAccount {
            person_id: parse_int(fields[0], "personId")?,
            branch: parse_int(fields[1], "branch")?,
            account: parse_int(fields[2], "account")?,
            bank: parse_int(fields[3], "bank")?,
            id: parse_int(fields[4], "id")?,
        })
    }
}

fn expect_fields(fields: &[&str], expected: usize) -> std::result::Result<(), String> {
    if fields.len() != expected {
        return Err(format!(
            "expected {} fields, got {}",
            expected,
            fields.len()
        ));
    }
    Ok(())
}

fn parse_int(raw: &str, field: &str) -> std::result::Result<i32, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid integer in field '{}': {:?}", field, raw))
}

/// Blank means absent; source-assigned ids may be missing for new records.
fn parse_int_or_zero(raw: &str, field: &str) -> std::result::Result<i32, String> {
    if raw.trim().is_empty() {
        return Ok(0);
    }
    parse_int(raw, field)
}

/// Blank means absent. A non-empty value that does not match the format is a
/// parse failure, not an invalid person.
fn parse_birth_date(raw: &str) -> std::result::Result<Option<NaiveDateTime>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, BIRTH_DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("invalid birth date {:?}, expected yyyy-MM-dd HH:mm:ss", raw))
}
