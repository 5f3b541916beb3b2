//! Files read and written by a run.
//!
//! Layout under the experiment directory:
//! `input/` holds the catalog, question table and instruction texts,
//! `input/images/` the image stimuli, and `data/` receives the output.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::error::{ExperimentError, Result};
use crate::intake::{FieldKind, ParticipantInfo, Question};
use crate::recorder::Summary;
use crate::task::{Row, Task};

#[derive(Debug, Clone)]
pub struct ExperimentFiles {
    root: PathBuf,
}

impl ExperimentFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.input_dir().join("images")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Resolves an input file and fails if it does not exist.
    pub fn input(&self, name: &str) -> Result<PathBuf> {
        let path = self.input_dir().join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ExperimentError::MissingResource { path })
        }
    }

    pub fn ensure_data_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            info!(path = %dir.display(), "created data directory");
        }
        Ok(dir)
    }

    pub fn load_text(&self, name: &str) -> Result<String> {
        let path = self.input(name)?;
        Ok(fs::read_to_string(path)?)
    }

    /// Reads the stimulus catalog. The header row is skipped; the first two
    /// columns are the identifier and the category label.
    pub fn load_catalog<T: Task>(&self, task: &T, name: &str) -> Result<Vec<Row<T>>> {
        let path = self.input(name)?;
        let images = self.images_dir();
        let mut reader = ReaderBuilder::new().flexible(true).from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = line_of(&record);
            let (Some(identifier), Some(label)) = (record.get(0), record.get(1)) else {
                return Err(ExperimentError::Catalog {
                    path: path.clone(),
                    line,
                    message: "expected an identifier and a category".into(),
                });
            };
            let row = task
                .catalog_row(identifier.trim(), label, &images)
                .map_err(|err| ExperimentError::Catalog {
                    path: path.clone(),
                    line,
                    message: err.to_string(),
                })?;
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), "catalog loaded");
        Ok(rows)
    }

    /// Reads the intake question table:
    /// `label, required (True/False), field kind, default or choices`.
    pub fn load_questions(&self, name: &str) -> Result<Vec<Question>> {
        let path = self.input(name)?;
        let mut reader = ReaderBuilder::new().flexible(true).from_path(&path)?;

        let mut questions = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = line_of(&record);
            let invalid = |message: String| ExperimentError::Questions {
                path: path.clone(),
                line,
                message,
            };
            if record.len() < 3 {
                return Err(invalid(format!(
                    "expected at least 3 columns, found {}",
                    record.len()
                )));
            }
            let kind = FieldKind::parse(&record[2], record.get(3).unwrap_or(""))
                .map_err(invalid)?;
            questions.push(Question {
                label: record[0].to_string(),
                required: record[1].trim() == "True",
                kind,
            });
        }
        Ok(questions)
    }
}

/// Header of an existing, non-empty CSV file.
fn existing_header(path: &Path) -> Result<Option<StringRecord>> {
    if fs::metadata(path).map_or(true, |meta| meta.len() == 0) {
        return Ok(None);
    }
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    Ok(Some(reader.headers()?.clone()))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

/// Persistence of a finished run.
pub trait ResponseSink {
    /// Writes the response table and returns where it went.
    fn save_responses(
        &mut self,
        participant: &str,
        date: &str,
        header: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf>;

    fn save_summary(
        &mut self,
        participant: &str,
        date: &str,
        summary: &Summary,
    ) -> Result<PathBuf>;

    /// Appends the participant's info to the summary table.
    fn append_participant(&mut self, info: &ParticipantInfo) -> Result<PathBuf>;
}

/// Writes CSV (and a JSON summary) into the experiment's data directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
    participants_file: String,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>, participants_file: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            participants_file: participants_file.into(),
        }
    }
}

impl ResponseSink for CsvStore {
    fn save_responses(
        &mut self,
        participant: &str,
        date: &str,
        header: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf> {
        let path = self.data_dir.join(format!("{participant}_{date}.csv"));
        let mut writer = WriterBuilder::new().from_path(&path)?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = rows.len(), "responses saved");
        Ok(path)
    }

    fn save_summary(
        &mut self,
        participant: &str,
        date: &str,
        summary: &Summary,
    ) -> Result<PathBuf> {
        let path = self.data_dir.join(format!("{participant}_{date}.json"));
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, summary)?;
        debug!(path = %path.display(), "summary saved");
        Ok(path)
    }

    fn append_participant(&mut self, info: &ParticipantInfo) -> Result<PathBuf> {
        let path = self.data_dir.join(&self.participants_file);
        let header = existing_header(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().flexible(true).from_writer(file);
        match header {
            None => {
                writer.write_record(info.keys())?;
                writer.write_record(info.values())?;
            }
            Some(columns) => {
                let mut row: Vec<&str> = columns
                    .iter()
                    .map(|column| info.get(column).unwrap_or(""))
                    .collect();
                // Keys the header lacks (e.g. `duration`) trail its columns.
                row.extend(
                    info.keys()
                        .zip(info.values())
                        .filter(|(key, _)| !columns.iter().any(|column| column == *key))
                        .map(|(_, value)| value),
                );
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        info!(path = %path.display(), "participant info appended");
        Ok(path)
    }
}
