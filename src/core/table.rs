use crate::{Result, TaxodiffError};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// One row of a delimited taxonomy file: field name -> raw value, in file
/// order. Records are immutable once loaded.
pub type TaxonRecord = IndexMap<String, String>;

/// In-memory store for one delimited taxonomy file, keyed by an identifier
/// column. Later rows with a duplicate identifier replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: IndexMap<String, TaxonRecord>,
    fields: Vec<String>,
}

impl RecordTable {
    pub fn load(path: &Path, id_column: &str) -> Result<Self> {
        let (fields, rows) = read_rows(path)?;
        if !fields.iter().any(|f| f == id_column) {
            return Err(TaxodiffError::MissingColumn {
                column: id_column.to_string(),
                path: path.display().to_string(),
            });
        }

        let mut records = IndexMap::new();
        for row in rows {
            let id = row.get(id_column).cloned().unwrap_or_default();
            records.insert(id, row);
        }
        Ok(Self { records, fields })
    }

    /// Build a table from already-materialized rows (fixtures, downloads).
    pub fn from_rows(id_column: &str, fields: Vec<String>, rows: Vec<TaxonRecord>) -> Self {
        let mut records = IndexMap::new();
        for row in rows {
            let id = row.get(id_column).cloned().unwrap_or_default();
            records.insert(id, row);
        }
        Self { records, fields }
    }

    pub fn get(&self, id: &str) -> Option<&TaxonRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TaxonRecord> {
        self.records.values()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Store keyed by a two-column compound identifier, for the
/// authority-to-repository mapping table.
#[derive(Debug, Clone, Default)]
pub struct CompoundKeyTable {
    records: HashMap<(String, String), TaxonRecord>,
    fields: Vec<String>,
}

impl CompoundKeyTable {
    pub fn load(path: &Path, key_columns: (&str, &str)) -> Result<Self> {
        let (fields, rows) = read_rows(path)?;
        for column in [key_columns.0, key_columns.1] {
            if !fields.iter().any(|f| f == column) {
                return Err(TaxodiffError::MissingColumn {
                    column: column.to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        let mut records = HashMap::new();
        for row in rows {
            let key = (
                row.get(key_columns.0).cloned().unwrap_or_default(),
                row.get(key_columns.1).cloned().unwrap_or_default(),
            );
            records.insert(key, row);
        }
        Ok(Self { records, fields })
    }

    /// Build a table from already-materialized rows (fixtures).
    pub fn from_rows(
        key_columns: (&str, &str),
        fields: Vec<String>,
        rows: Vec<TaxonRecord>,
    ) -> Self {
        let mut records = HashMap::new();
        for row in rows {
            let key = (
                row.get(key_columns.0).cloned().unwrap_or_default(),
                row.get(key_columns.1).cloned().unwrap_or_default(),
            );
            records.insert(key, row);
        }
        Self { records, fields }
    }

    pub fn get(&self, first: &str, second: &str) -> Option<&TaxonRecord> {
        self.records
            .get(&(first.to_string(), second.to_string()))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read a headered CSV file into (field names, rows in file order).
pub fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<TaxonRecord>)> {
    if !path.exists() {
        return Err(TaxodiffError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("taxonomy file not found: {}", path.display()),
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(File::open(path)?);
    let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let raw = result?;
        let row: TaxonRecord = fields
            .iter()
            .cloned()
            .zip(raw.iter().map(str::to_string).chain(std::iter::repeat(String::new())))
            .collect();
        rows.push(row);
    }
    Ok((fields, rows))
}

/// Write rows to a headered CSV file; fields missing from a row serialize as
/// empty cells. Parent directories are created as needed.
pub fn write_rows(path: &Path, fields: &[String], rows: &[TaxonRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(fields)?;
    for row in rows {
        let cells: Vec<&str> = fields
            .iter()
            .map(|f| row.get(f).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}
