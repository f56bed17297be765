//! Lead import and deduplication pipeline
//!
//! Accepts a batch of raw lead rows (1 to 2000, parsed client-side from
//! CSV/XLSX), normalizes them, and decides which rows to keep. In
//! `SkipExactDuplicates` mode a row is dropped when its normalized key
//! matches an existing lead or an earlier row in the same batch; in
//! `AlwaysCreate` mode every valid row is kept.
//!
//! The pipeline is pure: callers load the existing keys, run
//! [`plan_import`], and bulk-insert the surviving rows themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum rows accepted in one import call
pub const MAX_BATCH_SIZE: usize = 2000;

/// Separator joining the normalized key parts
const KEY_SEPARATOR: char = '|';

/// How the pipeline treats duplicates
///
/// A request that omits the mode inserts everything; deduplication is
/// opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Insert every row regardless of duplicates
    #[default]
    AlwaysCreate,

    /// Drop rows whose normalized key matches an existing lead or an
    /// earlier row in the batch
    SkipExactDuplicates,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::AlwaysCreate => "always_create",
            ImportMode::SkipExactDuplicates => "skip_exact_duplicates",
        }
    }
}

/// One row as received on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct RawLeadRow {
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A validated, trimmed row ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLead {
    pub name: String,
    pub contact: Option<String>,
    pub source: Option<String>,
}

impl NormalizedLead {
    /// The case-insensitive `name|contact|source` tuple used for
    /// duplicate detection
    pub fn key(&self) -> String {
        normalized_key(
            &self.name,
            self.contact.as_deref(),
            self.source.as_deref(),
        )
    }
}

/// Validation failure for one row of the batch
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ImportError {
    /// The batch is empty or exceeds [`MAX_BATCH_SIZE`]
    #[error("Batch must contain between 1 and {MAX_BATCH_SIZE} leads, got {0}")]
    BatchSize(usize),

    /// A row is missing its required name
    #[error("leads[{0}].name is required")]
    MissingName(usize),
}

/// Counts reported back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub received: usize,
    pub created: usize,
    pub skipped: usize,
}

/// The result of planning a batch
#[derive(Debug, Clone)]
pub struct ImportPlan {
    /// Rows to insert, in batch order
    pub to_create: Vec<NormalizedLead>,
    pub counts: ImportCounts,
}

/// Builds the duplicate-detection key for a lead
///
/// Missing contact/source participate as empty strings, so
/// `("Bob", None, None)` and `("bob", Some(""), Some(""))` collide.
pub fn normalized_key(name: &str, contact: Option<&str>, source: Option<&str>) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        name.trim().to_lowercase(),
        contact.unwrap_or("").trim().to_lowercase(),
        source.unwrap_or("").trim().to_lowercase(),
        sep = KEY_SEPARATOR,
    )
}

/// Trims one field, mapping empty strings to None
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates and trims a whole batch
///
/// The batch is rejected wholesale before any persistence: a single bad
/// row fails the entire call so imports are all-or-nothing.
///
/// # Errors
///
/// Returns every row-level failure at once so the client can report all
/// bad rows in a single round trip.
pub fn normalize_rows(rows: &[RawLeadRow]) -> Result<Vec<NormalizedLead>, Vec<ImportError>> {
    if rows.is_empty() || rows.len() > MAX_BATCH_SIZE {
        return Err(vec![ImportError::BatchSize(rows.len())]);
    }

    let mut normalized = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let name = row
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        match name {
            Some(name) => normalized.push(NormalizedLead {
                name: name.to_string(),
                contact: normalize_optional(row.contact.clone()),
                source: normalize_optional(row.source.clone()),
            }),
            None => errors.push(ImportError::MissingName(i)),
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

/// Decides which rows of a normalized batch survive deduplication
///
/// `existing_keys` holds the normalized keys of the user's persisted
/// leads. Rows are walked in order; in `SkipExactDuplicates` mode each
/// kept row's key joins the set, so within-batch duplicates are caught
/// the same way as persisted ones.
pub fn plan_import(
    rows: Vec<NormalizedLead>,
    existing_keys: HashSet<String>,
    mode: ImportMode,
) -> ImportPlan {
    let received = rows.len();

    let to_create = match mode {
        ImportMode::AlwaysCreate => rows,
        ImportMode::SkipExactDuplicates => {
            let mut seen = existing_keys;
            rows.into_iter()
                .filter(|row| seen.insert(row.key()))
                .collect()
        }
    };

    let created = to_create.len();

    ImportPlan {
        to_create,
        counts: ImportCounts {
            received,
            created,
            skipped: received - created,
        },
    }
}
