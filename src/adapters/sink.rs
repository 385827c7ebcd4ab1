//! Dataset directory: `dataset.jsonl` / `dataset.csv` plus `manifest.json`.

use crate::domain::model::{OutputRecord, VenueTag};
use crate::domain::ports::{DatasetSink, Storage};
use crate::utils::error::{HarvestError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const JSONL_FILE: &str = "dataset.jsonl";
pub const CSV_FILE: &str = "dataset.csv";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SUPPORTED_FORMATS: [&str; 2] = ["jsonl", "csv"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub venues: Vec<VenueTag>,
    pub years: Vec<u16>,
    pub requested: usize,
    pub resolved: usize,
    pub with_abstract: usize,
    pub files: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

pub fn encode_jsonl(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buffer, record)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

pub fn decode_jsonl(data: &[u8]) -> Result<Vec<OutputRecord>> {
    let text = std::str::from_utf8(data).map_err(|e| HarvestError::Processing {
        message: format!("dataset is not UTF-8: {}", e),
    })?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(HarvestError::from))
        .collect()
}

pub fn encode_csv(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| HarvestError::Io(e.into_error()))
}

/// Reads the `dataset.jsonl` of one harvest directory.
pub async fn read_dataset<S: Storage>(storage: &S) -> Result<Vec<OutputRecord>> {
    let data = storage.read_file(JSONL_FILE).await?;
    decode_jsonl(&data)
}

/// The `manifest.json` of one harvest directory, if it has one.
pub async fn read_manifest<S: Storage>(storage: &S) -> Option<Manifest> {
    let data = storage.read_file(MANIFEST_FILE).await.ok()?;
    serde_json::from_slice(&data).ok()
}

/// Appends the datasets of `sources` in order and writes the result to `target`.
pub async fn concat_datasets<S: Storage, T: Storage>(
    sources: &[S],
    target: &T,
    formats: &[String],
) -> Result<Manifest> {
    let mut records = Vec::new();
    let mut requested = 0;

    for source in sources {
        let dataset = read_dataset(source).await?;
        requested += match read_manifest(source).await {
            Some(manifest) => manifest.requested,
            None => dataset.len(),
        };
        tracing::debug!("📚 Loaded {} records", dataset.len());
        records.extend(dataset);
    }

    write_dataset(target, &records, formats, requested).await
}

pub async fn write_dataset<S: Storage>(
    storage: &S,
    records: &[OutputRecord],
    formats: &[String],
    requested: usize,
) -> Result<Manifest> {
    let mut files = Vec::new();
    for format in formats {
        match format.as_str() {
            "jsonl" => {
                storage.write_file(JSONL_FILE, &encode_jsonl(records)?).await?;
                files.push(JSONL_FILE.to_string());
            }
            "csv" => {
                storage.write_file(CSV_FILE, &encode_csv(records)?).await?;
                files.push(CSV_FILE.to_string());
            }
            other => {
                return Err(HarvestError::InvalidConfigValue {
                    field: "output.formats".to_string(),
                    value: other.to_string(),
                    reason: format!("Valid formats: {}", SUPPORTED_FORMATS.join(", ")),
                })
            }
        }
    }

    let mut venues: Vec<VenueTag> = Vec::new();
    let mut years: Vec<u16> = Vec::new();
    for record in records {
        if !venues.contains(&record.venue) {
            venues.push(record.venue);
        }
        if !years.contains(&record.year) {
            years.push(record.year);
        }
    }

    let manifest = Manifest {
        venues,
        years,
        requested,
        resolved: records.len(),
        with_abstract: records.iter().filter(|r| r.abstract_text.is_some()).count(),
        files,
        generated_at: Utc::now(),
    };
    storage
        .write_file(MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)
        .await?;

    Ok(manifest)
}

pub struct DirectorySink<S: Storage> {
    storage: S,
    output_path: String,
    formats: Vec<String>,
}

impl<S: Storage> DirectorySink<S> {
    pub fn new(storage: S, output_path: impl Into<String>, formats: Vec<String>) -> Self {
        Self {
            storage,
            output_path: output_path.into(),
            formats,
        }
    }
}

impl<S: Storage> DatasetSink for DirectorySink<S> {
    async fn persist<I>(&self, records: I, requested: usize) -> Result<String>
    where
        I: IntoIterator<Item = OutputRecord> + Send,
        I::IntoIter: Send,
    {
        let records: Vec<OutputRecord> = records.into_iter().collect();
        tracing::debug!("💾 Writing {} records as {:?}", records.len(), self.formats);

        let manifest = write_dataset(&self.storage, &records, &self.formats, requested).await?;
        tracing::debug!("💾 Wrote {:?}", manifest.files);

        Ok(self.output_path.clone())
    }
}
