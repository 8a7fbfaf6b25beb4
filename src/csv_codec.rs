// 📄 CSV Row Codecs
//
// Headerless, delimiter-configurable rows (default `;`):
//
//   Animal:  id;name;age;{ownerId,...}
//   Owner:   id;name;username;email;password;age;phone;address;city;state;zip;country;{animalId,...}
//   Vaccine: id;volume;brand;dd/MM/yyyy;animalId
//
// Relationship ids travel as a brace-set: `{id1,id2}`. The inner separator is
// always a comma, whatever the outer delimiter is. When the outer delimiter is
// itself a comma the writer quotes the brace-set field, and the reader
// unquotes it.

use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::entities::vaccine::DATE_FORMAT;
use crate::entities::{Animal, Owner, OwnerDetails, Vaccine};
use crate::error::{ClinicError, Result};

pub const DEFAULT_DELIMITER: u8 = b';';

const BRACE_OPEN: char = '{';
const BRACE_CLOSE: char = '}';
const SET_SEPARATOR: char = ',';

// ============================================================================
// COLUMN LAYOUTS
// ============================================================================

pub mod animal_columns {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const AGE: usize = 2;
    pub const OWNERS: usize = 3;
    pub const COUNT: usize = 4;
}

pub mod owner_columns {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const USERNAME: usize = 2;
    pub const EMAIL: usize = 3;
    pub const PASSWORD: usize = 4;
    pub const AGE: usize = 5;
    pub const PHONE: usize = 6;
    pub const ADDRESS: usize = 7;
    pub const CITY: usize = 8;
    pub const STATE: usize = 9;
    pub const ZIP: usize = 10;
    pub const COUNTRY: usize = 11;
    pub const ANIMAL_IDS: usize = 12;
    pub const COUNT: usize = 13;
}

pub mod vaccine_columns {
    pub const ID: usize = 0;
    pub const VOLUME: usize = 1;
    pub const BRAND: usize = 2;
    pub const DATE_OF_APPLICATION: usize = 3;
    pub const ANIMAL_ID: usize = 4;
    pub const COUNT: usize = 5;
}

// ============================================================================
// BRACE-SET ENCODING
// ============================================================================

/// `{a,b,c}`; an empty collection renders as `{}`
pub fn encode_brace_set<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a Uuid>,
{
    let joined = ids
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}{}{}", BRACE_OPEN, joined, BRACE_CLOSE)
}

/// Inverse of [`encode_brace_set`]. Tokens are trimmed; `{}` (or `{ }`)
/// decodes to no ids at all.
pub fn decode_brace_set(field: &str, line: usize) -> Result<Vec<Uuid>> {
    let trimmed = field.trim();
    let inner = trimmed
        .strip_prefix(BRACE_OPEN)
        .and_then(|rest| rest.strip_suffix(BRACE_CLOSE))
        .ok_or_else(|| {
            ClinicError::format(line, format!("expected an id set like {{id,...}}, got '{}'", field))
        })?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(SET_SEPARATOR)
        .map(|token| parse_id(token.trim(), line))
        .collect()
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn parse_id(value: &str, line: usize) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| ClinicError::format(line, format!("invalid id '{}': {}", value, e)))
}

fn parse_int(value: &str, column: &str, line: usize) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| ClinicError::format(line, format!("{} must be an integer, got '{}'", column, value)))
}

pub fn parse_date(value: &str, line: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ClinicError::format(line, format!("date must be dd/MM/yyyy, got '{}'", value))
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn expect_columns(record: &StringRecord, expected: usize, line: usize) -> Result<()> {
    if record.len() != expected {
        return Err(ClinicError::format(
            line,
            format!("expected {} columns, found {}", expected, record.len()),
        ));
    }
    Ok(())
}

fn record_line(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

fn csv_failure(path: &Path, err: csv::Error) -> ClinicError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ClinicError::io(path, source),
        other => ClinicError::format(line, format!("{:?}", other)),
    }
}

// ============================================================================
// ANIMAL ROWS
// ============================================================================

pub fn animal_record(animal: &Animal) -> Vec<String> {
    vec![
        animal.id().to_string(),
        animal.name().to_string(),
        animal.age().to_string(),
        encode_brace_set(animal.owner_ids()),
    ]
}

pub fn parse_animal_record(record: &StringRecord) -> Result<Animal> {
    use animal_columns::*;

    let line = record_line(record);
    expect_columns(record, COUNT, line)?;

    let id = parse_id(record[ID].trim(), line)?;
    let age = parse_int(&record[AGE], "age", line)?;
    let mut animal = Animal::with_id(id, &record[NAME], age)?;

    for owner_id in decode_brace_set(&record[OWNERS], line)? {
        animal.add_owner_id(owner_id);
    }

    Ok(animal)
}

// ============================================================================
// OWNER ROWS
// ============================================================================

pub fn owner_record(owner: &Owner) -> Vec<String> {
    vec![
        owner.id().to_string(),
        owner.name().to_string(),
        owner.username().to_string(),
        owner.email().to_string(),
        owner.password().to_string(),
        owner.age().to_string(),
        owner.phone().to_string(),
        owner.address().to_string(),
        owner.city().to_string(),
        owner.state().to_string(),
        owner.zip().to_string(),
        owner.country().to_string(),
        encode_brace_set(owner.animal_ids()),
    ]
}

pub fn parse_owner_record(record: &StringRecord) -> Result<Owner> {
    use owner_columns::*;

    let line = record_line(record);
    expect_columns(record, COUNT, line)?;

    let id = parse_id(record[ID].trim(), line)?;
    let details = OwnerDetails {
        name: record[NAME].to_string(),
        username: record[USERNAME].to_string(),
        email: record[EMAIL].to_string(),
        password: record[PASSWORD].to_string(),
        age: parse_int(&record[AGE], "age", line)?,
        phone: record[PHONE].to_string(),
        address: record[ADDRESS].to_string(),
        city: record[CITY].to_string(),
        state: record[STATE].to_string(),
        zip: record[ZIP].to_string(),
        country: record[COUNTRY].to_string(),
    };
    let mut owner = Owner::with_id(id, details)?;

    for animal_id in decode_brace_set(&record[ANIMAL_IDS], line)? {
        owner.add_animal_id(animal_id);
    }

    Ok(owner)
}

// ============================================================================
// VACCINE ROWS
// ============================================================================

pub fn vaccine_record(animal_id: Uuid, vaccine: &Vaccine) -> Vec<String> {
    vec![
        vaccine.id().to_string(),
        vaccine.volume_in_ml().to_string(),
        vaccine.brand().to_string(),
        format_date(vaccine.date_of_application()),
        animal_id.to_string(),
    ]
}

/// Returns the owning animal id alongside the vaccine
pub fn parse_vaccine_record(record: &StringRecord) -> Result<(Uuid, Vaccine)> {
    use vaccine_columns::*;

    let line = record_line(record);
    expect_columns(record, COUNT, line)?;

    let id = parse_id(record[ID].trim(), line)?;
    let volume = parse_int(&record[VOLUME], "volume", line)?;
    let date = parse_date(&record[DATE_OF_APPLICATION], line)?;
    let animal_id = parse_id(record[ANIMAL_ID].trim(), line)?;
    let vaccine = Vaccine::with_id(id, volume, &record[BRAND], date)?;

    Ok((animal_id, vaccine))
}

// ============================================================================
// LINE LEVEL (one row as text)
// ============================================================================

/// Render one row the same way the file writer does, without the terminator
pub fn encode_line(fields: &[String], delimiter: u8) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(|e| ClinicError::format(0, e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ClinicError::format(0, e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| ClinicError::format(0, e.to_string()))?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// Parse one row of text into a record (line number 1)
pub fn decode_line(line: &str, delimiter: u8) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    let found = reader
        .read_record(&mut record)
        .map_err(|e| ClinicError::format(1, e.to_string()))?;
    if !found {
        return Err(ClinicError::format(1, "empty row"));
    }
    Ok(record)
}

// ============================================================================
// FILE LEVEL
// ============================================================================

/// Read every row of a headerless file. The handle is dropped (closed) on
/// every return path.
pub fn read_records(path: &Path, delimiter: u8) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_failure(path, e))?;

    let mut records = Vec::new();
    for result in reader.records() {
        records.push(result.map_err(|e| csv_failure(path, e))?);
    }

    debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_records<I>(path: &Path, delimiter: u8, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| csv_failure(path, e))?;

    let mut written = 0;
    for row in rows {
        writer.write_record(&row).map_err(|e| csv_failure(path, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| ClinicError::io(path, e))?;

    debug!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

pub fn read_animals(path: &Path, delimiter: u8) -> Result<Vec<Animal>> {
    read_records(path, delimiter)?
        .iter()
        .map(parse_animal_record)
        .collect()
}

pub fn read_owners(path: &Path, delimiter: u8) -> Result<Vec<Owner>> {
    read_records(path, delimiter)?
        .iter()
        .map(parse_owner_record)
        .collect()
}

pub fn read_vaccines(path: &Path, delimiter: u8) -> Result<Vec<(Uuid, Vaccine)>> {
    read_records(path, delimiter)?
        .iter()
        .map(parse_vaccine_record)
        .collect()
}

pub fn write_animals<'a, I>(path: &Path, delimiter: u8, animals: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Animal>,
{
    write_records(path, delimiter, animals.into_iter().map(animal_record))
}

pub fn write_owners<'a, I>(path: &Path, delimiter: u8, owners: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Owner>,
{
    write_records(path, delimiter, owners.into_iter().map(owner_record))
}

/// One row per vaccine, each tagged with its animal's id
pub fn write_vaccines<'a, I>(path: &Path, delimiter: u8, animals: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Animal>,
{
    let rows = animals.into_iter().flat_map(|animal| {
        animal
            .vaccines()
            .iter()
            .map(move |vaccine| vaccine_record(animal.id(), vaccine))
    });
    write_records(path, delimiter, rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn sample_details(username: &str) -> OwnerDetails {
        OwnerDetails {
            name: "Ana Perez".to_string(),
            username: username.to_string(),
            email: "ana@clinic.com".to_string(),
            password: "Secret#123".to_string(),
            age: 34,
            phone: "5551234567".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn test_brace_set_empty() {
        assert_eq!(encode_brace_set(&Vec::<Uuid>::new()), "{}");
        assert!(decode_brace_set("{}", 1).unwrap().is_empty());
        assert!(decode_brace_set(" { } ", 1).unwrap().is_empty());
    }

    #[test]
    fn test_brace_set_trims_tokens() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let field = format!("{{ {} , {} }}", a, b);

        assert_eq!(decode_brace_set(&field, 1).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_brace_set_malformed() {
        let a = Uuid::new_v4();

        assert!(matches!(
            decode_brace_set(&a.to_string(), 3),
            Err(ClinicError::Format { line: 3, .. })
        ));
        assert!(decode_brace_set("{not-a-uuid}", 1).is_err());
        assert!(decode_brace_set(&format!("{{{},,{}}}", a, a), 1).is_err());
    }

    #[test]
    fn test_animal_row_round_trip_keeps_owner_set() {
        let mut animal = Animal::new("Firulais", 4).unwrap();
        let owners: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &owners {
            animal.add_owner_id(*id);
        }

        let line = encode_line(&animal_record(&animal), DEFAULT_DELIMITER).unwrap();
        let decoded = parse_animal_record(&decode_line(&line, DEFAULT_DELIMITER).unwrap()).unwrap();

        assert_eq!(decoded.id(), animal.id());
        assert_eq!(decoded.name(), "Firulais");
        assert_eq!(decoded.age(), 4);

        let expected: HashSet<Uuid> = owners.into_iter().collect();
        let actual: HashSet<Uuid> = decoded.owner_ids().copied().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_animal_row_layout() {
        let animal = Animal::new("Michi", 2).unwrap();
        let line = encode_line(&animal_record(&animal), b';').unwrap();

        assert_eq!(line, format!("{};Michi;2;{{}}", animal.id()));
    }

    #[test]
    fn test_comma_delimiter_keeps_brace_set_intact() {
        let mut animal = Animal::new("Michi", 2).unwrap();
        animal.add_owner_id(Uuid::new_v4());
        animal.add_owner_id(Uuid::new_v4());

        let line = encode_line(&animal_record(&animal), b',').unwrap();
        let decoded = parse_animal_record(&decode_line(&line, b',').unwrap()).unwrap();

        assert_eq!(decoded.owner_ids().count(), 2);
    }

    #[test]
    fn test_animal_row_errors() {
        let id = Uuid::new_v4();

        let short = decode_line(&format!("{};Michi;2", id), b';').unwrap();
        assert!(matches!(parse_animal_record(&short), Err(ClinicError::Format { .. })));

        let bad_age = decode_line(&format!("{};Michi;two;{{}}", id), b';').unwrap();
        assert!(matches!(parse_animal_record(&bad_age), Err(ClinicError::Format { .. })));

        let negative = decode_line(&format!("{};Michi;-1;{{}}", id), b';').unwrap();
        assert!(matches!(parse_animal_record(&negative), Err(ClinicError::Validation(_))));
    }

    #[test]
    fn test_owner_row_column_order() {
        let mut owner = Owner::new(sample_details("anaperez1")).unwrap();
        let animal_id = Uuid::new_v4();
        owner.add_animal_id(animal_id);

        let line = encode_line(&owner_record(&owner), b';').unwrap();
        let columns: Vec<&str> = line.split(';').collect();

        assert_eq!(columns.len(), owner_columns::COUNT);
        assert_eq!(columns[owner_columns::USERNAME], "anaperez1");
        assert_eq!(columns[owner_columns::STATE], "IL");
        assert_eq!(columns[owner_columns::ZIP], "62701");
        assert_eq!(columns[owner_columns::COUNTRY], "US");
        assert_eq!(columns[owner_columns::ANIMAL_IDS], format!("{{{}}}", animal_id));

        let decoded = parse_owner_record(&decode_line(&line, b';').unwrap()).unwrap();
        assert_eq!(decoded, owner);
    }

    #[test]
    fn test_owner_row_validation_error() {
        let line = format!(
            "{};Ana;ab;ana@clinic.com;Secret#123;34;5551234567;1 Main St;Springfield;IL;62701;US;{{}}",
            Uuid::new_v4()
        );
        let record = decode_line(&line, b';').unwrap();

        match parse_owner_record(&record) {
            Err(ClinicError::Validation(e)) => assert_eq!(e.field, "username"),
            other => panic!("expected username validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_vaccine_row() {
        let animal_id = Uuid::new_v4();
        let vaccine_id = Uuid::new_v4();
        let line = format!("{};3;Rabisin;15/03/2024;{}", vaccine_id, animal_id);

        let (owner_of, vaccine) = parse_vaccine_record(&decode_line(&line, b';').unwrap()).unwrap();
        assert_eq!(owner_of, animal_id);
        assert_eq!(vaccine.id(), vaccine_id);
        assert_eq!(vaccine.volume_in_ml(), 3);
        assert_eq!(vaccine.brand(), "Rabisin");
        assert_eq!(format_date(vaccine.date_of_application()), "15/03/2024");

        assert_eq!(
            encode_line(&vaccine_record(animal_id, &vaccine), b';').unwrap(),
            line
        );
    }

    #[test]
    fn test_vaccine_row_bad_date() {
        let line = format!("{};3;Rabisin;2024-03-15;{}", Uuid::new_v4(), Uuid::new_v4());
        let record = decode_line(&line, b';').unwrap();

        assert!(matches!(parse_vaccine_record(&record), Err(ClinicError::Format { .. })));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("animals.csv");

        let mut firulais = Animal::new("Firulais", 4).unwrap();
        firulais.add_owner_id(Uuid::new_v4());
        let michi = Animal::new("Michi", 2).unwrap();

        let written = write_animals(&path, b';', [&firulais, &michi]).unwrap();
        assert_eq!(written, 2);

        let loaded = read_animals(&path, b';').unwrap();
        assert_eq!(loaded, vec![firulais, michi]);
    }

    #[test]
    fn test_format_error_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("animals.csv");
        let good = Animal::new("Firulais", 4).unwrap();
        let contents = format!("{};Firulais;4;{{}}\nbroken;row\n", good.id());
        std::fs::write(&path, contents).unwrap();

        match read_animals(&path, b';') {
            Err(ClinicError::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let dir = TempDir::new().unwrap();
        let result = read_animals(&dir.path().join("missing.csv"), b';');

        assert!(matches!(result, Err(ClinicError::Io { .. })));
    }
}
