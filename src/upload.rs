//! Multipart submissions and uploaded files.
//!
//! A [`FormSubmission`] is what a multipart form post decodes into: each key
//! may carry several text values or files. [`prepare_payload`] turns it into
//! the JSON object the validator expects, saving files through a
//! [`FileStore`] on the way.

use crate::config::UploadConfig;
use crate::schema::{FieldKind, FormConfiguration, PgType, ValueShape};
use base64::Engine as _;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Browsers send an empty, nameless part for a file input left blank.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.filename.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedValue {
    Text(String),
    File(UploadedFile),
}

/// Decoded multipart body, in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    entries: Vec<(String, SubmittedValue)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push((name.into(), SubmittedValue::Text(value.into())));
        self
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: UploadedFile) -> &mut Self {
        self.entries.push((name.into(), SubmittedValue::File(file)));
        self
    }

    pub fn get_all<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s SubmittedValue> + 's {
        self.entries
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub enum UploadError {
    Io(std::io::Error),
    /// A file was sent for a field that does not accept files.
    UnexpectedFile(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Io(e) => write!(f, "Failed to store upload: {e}"),
            UploadError::UnexpectedFile(field) => {
                write!(f, "Field '{field}' does not accept file uploads")
            }
        }
    }
}

impl std::error::Error for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err)
    }
}

/// Where uploaded files go. Returns the reference stored in the column.
pub trait FileStore {
    fn save(&self, field: &str, file: &UploadedFile) -> Result<String, UploadError>;
}

/// Content-addressed file store: `<sha256>.<ext>` under one directory.
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    dir: PathBuf,
    public_prefix: String,
}

impl DiskFileStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone(), config.public_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileStore for DiskFileStore {
    fn save(&self, field: &str, file: &UploadedFile) -> Result<String, UploadError> {
        let digest = Sha256::digest(&file.bytes);
        let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        let name = match safe_extension(&file.filename) {
            Some(ext) => format!("{hash}.{ext}"),
            None => hash,
        };

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&name);
        if !path.exists() {
            fs::write(&path, &file.bytes)?;
        }
        log::debug!("Stored upload for '{}' as {}", field, path.display());

        Ok(format!("{}/{}", self.public_prefix.trim_end_matches('/'), name))
    }
}

fn safe_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let valid = !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Build the JSON payload for `config` from a multipart submission.
///
/// - file fields: each file saved via `files`, references joined with `,`;
///   a `BYTEA` column gets the base64 of the first file instead
/// - signature fields: an uploaded image becomes a `data:` URL
/// - checkbox and toggle fields missing from the submission become `false`
/// - everything else: the first text value; blank optional values are left out
///
/// Keys not in the configuration are ignored. Type coercion is left to the
/// validator.
pub fn prepare_payload(
    config: &FormConfiguration,
    submission: &FormSubmission,
    files: &dyn FileStore,
) -> Result<Map<String, Value>, UploadError> {
    let mut payload = Map::new();
    for field in config.fields() {
        let submitted: Vec<&SubmittedValue> = submission.get_all(&field.name).collect();
        let first_text = submitted.iter().find_map(|v| match v {
            SubmittedValue::Text(t) => Some(t.as_str()),
            SubmittedValue::File(_) => None,
        });
        let uploads: Vec<&UploadedFile> = submitted
            .iter()
            .filter_map(|v| match v {
                SubmittedValue::File(f) if !f.is_empty() => Some(f),
                _ => None,
            })
            .collect();

        let value = match field.kind.shape() {
            ValueShape::File => {
                if uploads.is_empty() {
                    first_text.map(|t| Value::String(t.to_string()))
                } else if field.column_type().pg_type == PgType::Bytea {
                    Some(Value::String(
                        base64::engine::general_purpose::STANDARD.encode(&uploads[0].bytes),
                    ))
                } else {
                    let stored = uploads
                        .iter()
                        .map(|f| files.save(&field.name, f))
                        .collect::<Result<Vec<_>, _>>()?;
                    Some(Value::String(stored.join(",")))
                }
            }
            _ if field.kind == FieldKind::Signature && !uploads.is_empty() => {
                let image = uploads[0];
                let content_type = image.content_type.as_deref().unwrap_or("image/png");
                Some(Value::String(format!(
                    "data:{};base64,{}",
                    content_type,
                    base64::engine::general_purpose::STANDARD.encode(&image.bytes)
                )))
            }
            _ if !uploads.is_empty() => return Err(UploadError::UnexpectedFile(field.name.clone())),
            ValueShape::Boolean => Some(Value::String(first_text.unwrap_or("false").to_string())),
            _ => match first_text {
                Some("") if !field.required => None,
                other => other.map(|t| Value::String(t.to_string())),
            },
        };

        if let Some(value) = value {
            payload.insert(field.name.clone(), value);
        }
    }
    Ok(payload)
}
