//! JSON file store adapter implementing StorePort.
//!
//! Durable layout under one data directory:
//!   `signatures.json`      — the full signature collection + updated_at
//!   `runs/YYYYMMDD/<id>.txt` — raw input artifact per signature
//!
//! The fingerprint index is never written; it is derived from the loaded
//! collection. Saves go through a temporary file followed by an atomic
//! rename so a crash mid-save never corrupts the previous ledger.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::error::SigtrackError;
use crate::domain::signature::Signature;
use crate::ports::store_port::StorePort;

const LEDGER_FILE: &str = "signatures.json";
const RUNS_DIR: &str = "runs";

#[derive(Serialize)]
struct LedgerFileOut<'a> {
    signatures: &'a [&'a Signature],
    updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
struct LedgerFileIn {
    #[serde(default)]
    signatures: Vec<Signature>,
}

pub struct JsonStoreAdapter {
    data_dir: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    fn runs_dir(&self) -> PathBuf {
        self.data_dir.join(RUNS_DIR)
    }

    fn store_err(context: &str, err: impl std::fmt::Display) -> SigtrackError {
        SigtrackError::Store {
            reason: format!("{context}: {err}"),
        }
    }
}

impl StorePort for JsonStoreAdapter {
    fn load(&self) -> Result<Vec<Signature>, SigtrackError> {
        let path = self.ledger_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Self::store_err(&format!("failed to read {}", path.display()), e))?;
        let file: LedgerFileIn = serde_json::from_str(&content)
            .map_err(|e| Self::store_err(&format!("failed to parse {}", path.display()), e))?;
        Ok(file.signatures)
    }

    fn save(&self, signatures: &[&Signature]) -> Result<(), SigtrackError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| Self::store_err("failed to create data dir", e))?;

        let out = LedgerFileOut {
            signatures,
            updated_at: Local::now().naive_local(),
        };
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| Self::store_err("failed to serialize ledger", e))?;

        let path = self.ledger_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| Self::store_err(&format!("failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .map_err(|e| Self::store_err(&format!("failed to replace {}", path.display()), e))?;
        Ok(())
    }

    fn write_artifact(
        &self,
        signature_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<String, SigtrackError> {
        let day_dir = self.runs_dir().join(date.format("%Y%m%d").to_string());
        fs::create_dir_all(&day_dir)
            .map_err(|e| Self::store_err("failed to create runs dir", e))?;
        let reference = format!("{}/{signature_id}.txt", date.format("%Y%m%d"));
        let path = self.runs_dir().join(&reference);
        fs::write(&path, content)
            .map_err(|e| Self::store_err(&format!("failed to write {}", path.display()), e))?;
        Ok(reference)
    }

    fn read_artifact(&self, reference: &str) -> Result<String, SigtrackError> {
        let path = self.runs_dir().join(reference);
        fs::read_to_string(&path).map_err(|e| {
            Self::store_err(&format!("failed to read artifact {}", path.display()), e)
        })
    }

    fn remove_artifact(&self, reference: &str) -> Result<(), SigtrackError> {
        let path = self.runs_dir().join(reference);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::store_err(
                &format!("failed to remove artifact {}", path.display()),
                e,
            )),
        }
    }
}
