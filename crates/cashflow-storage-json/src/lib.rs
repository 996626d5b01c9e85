//! Filesystem JSON persistence: one document per owner holding clients,
//! projects, recurring masters, and transactions.
//!
//! Every write goes to a temporary file that is renamed over the document, so a
//! reader never sees a half-written file and a failed batch leaves it untouched.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use cashflow_core::{CoreError, ReferenceStore, TransactionStore, UpdateBatch};
use cashflow_domain::{Client, Project, RecurringMaster, Transaction, TransactionKind};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const DOCUMENT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const EMPTY_OWNER_STEM: &str = "_";

/// Everything stored for a single owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDocument {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub recurring_masters: Vec<RecurringMaster>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Filesystem-backed JSON persistence for planner documents.
pub struct JsonPlannerStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonPlannerStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, owner_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_name(owner_id), DOCUMENT_EXTENSION))
    }

    /// Loads the owner's document; a missing file is an empty document.
    pub fn load_document(&self, owner_id: &str) -> Result<PlannerDocument, CoreError> {
        let _guard = self.guard()?;
        self.read_document(owner_id)
    }

    pub fn save_document(&self, owner_id: &str, document: &PlannerDocument) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        self.write_document(owner_id, document)
    }

    /// Lists the ids of owners that have a document on disk.
    pub fn list_owners(&self) -> Result<Vec<String>, CoreError> {
        let mut owners = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(owner) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(owner_from_stem)
            {
                owners.push(owner);
            }
        }
        owners.sort();
        Ok(owners)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("document lock poisoned".into()))
    }

    fn read_document(&self, owner_id: &str) -> Result<PlannerDocument, CoreError> {
        let path = self.document_path(owner_id);
        if !path.exists() {
            return Ok(PlannerDocument::default());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
    }

    fn write_document(&self, owner_id: &str, document: &PlannerDocument) -> Result<(), CoreError> {
        let path = self.document_path(owner_id);
        let json = serde_json::to_string_pretty(document)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        debug!(owner = owner_id, path = %path.display(), "planner document saved");
        Ok(())
    }

    /// Read-modify-write under the store lock. Nothing is written when `apply` fails.
    fn update<T>(
        &self,
        owner_id: &str,
        apply: impl FnOnce(&mut PlannerDocument) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read_document(owner_id)?;
        let output = apply(&mut document)?;
        self.write_document(owner_id, &document)?;
        Ok(output)
    }

    fn select<T>(
        &self,
        owner_id: &str,
        pick: impl FnOnce(PlannerDocument) -> T,
    ) -> Result<T, CoreError> {
        Ok(pick(self.load_document(owner_id)?))
    }
}

impl TransactionStore for JsonPlannerStore {
    fn income_by_project(
        &self,
        owner_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<Transaction>, CoreError> {
        self.select(owner_id, |doc| {
            doc.transactions
                .into_iter()
                .filter(|txn| txn.project_id == Some(project_id))
                .filter(|txn| txn.kind == TransactionKind::Income)
                .collect()
        })
    }

    fn instances_of(&self, owner_id: &str, master_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        self.select(owner_id, |doc| {
            doc.transactions
                .into_iter()
                .filter(|txn| txn.is_instance_of(master_id))
                .collect()
        })
    }

    fn transactions(&self, owner_id: &str) -> Result<Vec<Transaction>, CoreError> {
        self.select(owner_id, |doc| doc.transactions)
    }

    fn insert(&self, owner_id: &str, drafts: Vec<Transaction>) -> Result<Vec<Uuid>, CoreError> {
        if drafts.iter().any(|txn| txn.is_estimate) {
            return Err(CoreError::Storage(
                "estimate transactions are projections and cannot be stored".into(),
            ));
        }
        self.update(owner_id, |doc| {
            let mut ids = Vec::with_capacity(drafts.len());
            for mut draft in drafts {
                let id = *draft.id.get_or_insert_with(Uuid::new_v4);
                doc.transactions.push(draft);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    fn commit(&self, owner_id: &str, batch: UpdateBatch) -> Result<(), CoreError> {
        self.update(owner_id, |doc| batch.apply_to(&mut doc.transactions))
    }
}

impl ReferenceStore for JsonPlannerStore {
    fn clients(&self, owner_id: &str) -> Result<Vec<Client>, CoreError> {
        self.select(owner_id, |doc| doc.clients)
    }

    fn projects(&self, owner_id: &str) -> Result<Vec<Project>, CoreError> {
        self.select(owner_id, |doc| doc.projects)
    }

    fn recurring_masters(&self, owner_id: &str) -> Result<Vec<RecurringMaster>, CoreError> {
        self.select(owner_id, |doc| doc.recurring_masters)
    }

    fn save_client(&self, owner_id: &str, client: &Client) -> Result<(), CoreError> {
        self.update(owner_id, |doc| {
            upsert(&mut doc.clients, client.clone(), |c| c.id);
            Ok(())
        })
    }

    fn save_project(&self, owner_id: &str, project: &Project) -> Result<(), CoreError> {
        self.update(owner_id, |doc| {
            upsert(&mut doc.projects, project.clone(), |p| p.id);
            Ok(())
        })
    }

    fn save_recurring_master(
        &self,
        owner_id: &str,
        master: &RecurringMaster,
    ) -> Result<(), CoreError> {
        self.update(owner_id, |doc| {
            upsert(&mut doc.recurring_masters, master.clone(), |m| m.id);
            Ok(())
        })
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> Uuid) {
    let id = key(&item);
    match items.iter_mut().find(|existing| key(existing) == id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// File stem for an owner id. Lowercase ASCII letters, digits and `-` are kept;
/// every other byte becomes `_` plus two hex digits, so distinct ids never
/// share a file.
fn canonical_name(owner_id: &str) -> String {
    if owner_id.is_empty() {
        return EMPTY_OWNER_STEM.into();
    }
    let mut stem = String::with_capacity(owner_id.len());
    for byte in owner_id.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => stem.push(byte as char),
            _ => stem.push_str(&format!("_{byte:02x}")),
        }
    }
    stem
}

fn owner_from_stem(stem: &str) -> Option<String> {
    if stem == EMPTY_OWNER_STEM {
        return Some(String::new());
    }
    let mut bytes = Vec::with_capacity(stem.len());
    let mut chars = stem.bytes();
    while let Some(byte) = chars.next() {
        if byte == b'_' {
            let hex = [chars.next()?, chars.next()?];
            let hex = std::str::from_utf8(&hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
