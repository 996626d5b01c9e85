use std::fs;

use cashflow_core::{CoreError, FieldChange, ReferenceStore, TransactionStore, UpdateBatch};
use cashflow_domain::{
    Client, PaymentTerms, Project, RecurrenceLink, RecurrenceRule, RecurringMaster, Transaction,
    TransactionKind,
};
use cashflow_storage_json::{JsonPlannerStore, PlannerDocument};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::tempdir;
use uuid::Uuid;

const OWNER: &str = "Studio North";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(kind: TransactionKind, project: Option<Uuid>) -> Transaction {
    let mut txn = Transaction::draft(OWNER, kind, Decimal::new(250000, 2), "Invoice", ymd(2024, 1, 15));
    txn.project_id = project;
    txn
}

#[test]
fn json_store_round_trips_reference_data() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().join("data")).expect("create store");

    let client = Client::new(OWNER, "Acme", PaymentTerms::from_raw(99, 1, 99).unwrap());
    let project = Project::new(OWNER, "Website").with_client(client.id);
    let master = RecurringMaster::new(
        OWNER,
        "Retainer",
        TransactionKind::Income,
        Decimal::new(1000, 0),
        RecurrenceRule::monthly(31),
        ymd(2024, 1, 31),
    );

    store.save_client(OWNER, &client).expect("save client");
    store.save_project(OWNER, &project).expect("save project");
    store.save_recurring_master(OWNER, &master).expect("save master");

    assert_eq!(store.clients(OWNER).unwrap(), vec![client]);
    assert_eq!(store.projects(OWNER).unwrap(), vec![project.clone()]);
    assert_eq!(store.recurring_masters(OWNER).unwrap(), vec![master]);

    let mut moved = project.clone();
    moved.end_date = Some(ymd(2024, 6, 30));
    store.save_project(OWNER, &moved).expect("update project");
    assert_eq!(store.projects(OWNER).unwrap(), vec![moved]);

    let path = store.document_path(OWNER);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("_53tudio_20_4eorth.json")
    );
    assert_eq!(store.list_owners().unwrap(), vec![OWNER.to_string()]);
}

#[test]
fn similar_owner_ids_use_separate_documents() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    let secret = Client::new("acme.co", "A-secret", PaymentTerms::default());
    store.save_client("acme.co", &secret).expect("save client");

    assert_ne!(store.document_path("acme.co"), store.document_path("acme_co"));
    assert_ne!(store.document_path("Acme"), store.document_path("acme"));
    assert!(store.clients("acme_co").unwrap().is_empty());
    assert!(store.clients("ACME.CO").unwrap().is_empty());
    assert_eq!(store.clients("acme.co").unwrap(), vec![secret]);

    let other = Client::new("acme_co", "B", PaymentTerms::default());
    store.save_client("acme_co", &other).expect("save client");
    assert_eq!(
        store.list_owners().unwrap(),
        vec!["acme.co".to_string(), "acme_co".to_string()]
    );
}

#[test]
fn insert_assigns_identities_and_queries_filter() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    let project_id = Uuid::new_v4();
    let master_id = Uuid::new_v4();

    let mut instance = draft(TransactionKind::Expense, None);
    instance.recurrence = Some(RecurrenceLink {
        master_id,
        instance_date: instance.transaction_date,
    });
    let ids = store
        .insert(
            OWNER,
            vec![
                draft(TransactionKind::Income, Some(project_id)),
                draft(TransactionKind::Expense, Some(project_id)),
                instance,
            ],
        )
        .expect("insert");
    assert_eq!(ids.len(), 3);

    let income = store.income_by_project(OWNER, project_id).expect("query");
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].id, Some(ids[0]));

    let instances = store.instances_of(OWNER, master_id).expect("instances");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].id, Some(ids[2]));

    assert!(store.transactions("someone else").unwrap().is_empty());
}

#[test]
fn estimates_are_not_persisted() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    let mut estimate = draft(TransactionKind::Income, None);
    estimate.is_estimate = true;

    assert!(matches!(store.insert(OWNER, vec![estimate]), Err(CoreError::Storage(_))));
    assert!(!store.document_path(OWNER).exists());
}

#[test]
fn commit_applies_every_change() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    let ids = store
        .insert(OWNER, vec![draft(TransactionKind::Income, None)])
        .expect("insert");

    let mut batch = UpdateBatch::new();
    batch.stage(
        ids[0],
        vec![
            FieldChange::TransactionDate(ymd(2024, 3, 1)),
            FieldChange::SettlementDate(ymd(2024, 4, 30)),
        ],
    );
    store.commit(OWNER, batch).expect("commit");

    let stored = store.transactions(OWNER).unwrap();
    assert_eq!(stored[0].transaction_date, ymd(2024, 3, 1));
    assert_eq!(stored[0].settlement_date, Some(ymd(2024, 4, 30)));
}

#[test]
fn failed_commit_leaves_document_untouched() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    let ids = store
        .insert(OWNER, vec![draft(TransactionKind::Income, None)])
        .expect("insert");
    let before = fs::read_to_string(store.document_path(OWNER)).expect("read");

    let mut batch = UpdateBatch::new();
    batch.stage(ids[0], vec![FieldChange::TransactionDate(ymd(2024, 3, 1))]);
    batch.stage(Uuid::new_v4(), vec![FieldChange::TransactionDate(ymd(2024, 3, 1))]);

    assert!(matches!(store.commit(OWNER, batch), Err(CoreError::TransactionNotFound(_))));
    let after = fs::read_to_string(store.document_path(OWNER)).expect("read");
    assert_eq!(before, after);
}

#[test]
fn documents_missing_sections_load_as_empty() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    fs::write(store.document_path(OWNER), r#"{"clients": []}"#).expect("write");

    assert_eq!(store.load_document(OWNER).unwrap(), PlannerDocument::default());
}

#[test]
fn corrupt_documents_surface_serde_errors() {
    let dir = tempdir().expect("tempdir");
    let store = JsonPlannerStore::new(dir.path().to_path_buf()).expect("create store");
    fs::write(store.document_path(OWNER), "{not json").expect("write");

    assert!(matches!(store.transactions(OWNER), Err(CoreError::Serde(_))));
}
