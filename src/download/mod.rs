use crate::core::rank::GroupCode;
use crate::{Result, TaxodiffError};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Blocking client for the authority taxonomy API. Pages are fetched
/// sequentially with a fixed timeout; the first unrecoverable error aborts
/// the download.
pub struct AuthorityClient {
    base_url: String,
    page_limit: usize,
    client: reqwest::blocking::Client,
}

impl AuthorityClient {
    pub fn new(base_url: &str, page_limit: usize, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TaxodiffError::Download(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit,
            client,
        })
    }

    /// Fetch every record of one taxon group, following `next` links until
    /// the API reports no further page (absent, null or empty string).
    pub fn fetch_group(&self, group: &GroupCode) -> Result<Vec<Map<String, Value>>> {
        let mut records = Vec::new();
        let mut next_url = Some(format!(
            "{}?taxonTypeCode={}&verbose=true&limit={}",
            self.base_url, group, self.page_limit
        ));

        while let Some(url) = next_url {
            debug!(url = url.as_str(), "fetching taxonomy page");
            let page: Value = self
                .client
                .get(&url)
                .send()
                .and_then(|response| response.error_for_status())
                .map_err(|e| TaxodiffError::Download(e.to_string()))?
                .json()
                .map_err(|e| TaxodiffError::Download(e.to_string()))?;

            match page.get("data").and_then(Value::as_array) {
                Some(data) => {
                    for item in data {
                        if let Value::Object(record) = item {
                            records.push(record.clone());
                        }
                    }
                }
                None => {
                    warn!(
                        group = group.as_str(),
                        url = url.as_str(),
                        "page carries no data array, stopping"
                    );
                    break;
                }
            }

            next_url = page
                .get("next")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        Ok(records)
    }
}

/// Serialize downloaded records to a headered CSV. The header is the sorted
/// union of keys across all records; keys missing from a record serialize as
/// empty cells. An empty record set still creates the (empty) file.
pub fn write_records_csv(records: &[Map<String, Value>], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if records.is_empty() {
        std::fs::write(path, "")?;
        return Ok(());
    }

    let fields: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();
    let fields: Vec<&str> = fields.into_iter().collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&fields)?;
    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|field| cell_value(record.get(*field)))
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
