use std::sync::Arc;

use api_rest::{router, AppState};
use telemed_client::{ApiClient, ClientError, ExportRequest, Fetched};
use telemed_core::sample::SampleData;
use telemed_core::{
    CoreConfig, Store, DatasetKind, ExportFormat, InsertAppointment, InsertMedicalRecord, InsertReminder,
    Resource, UserRole,
};

/// Serves a freshly seeded API on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    spawn_server_with(Store::with_data(SampleData::new())).await
}

/// Serves `store` on an ephemeral port; the caller keeps a handle to mutate it behind the API.
async fn spawn_server_with(store: Store) -> String {
    let app = router(AppState::with_store(Arc::new(CoreConfig::default()), store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn test_login_keeps_session() {
    let mut client = ApiClient::new(&spawn_server().await).unwrap();
    let session = client.login("jdupont", "changeme").await.unwrap();
    assert_eq!(session.username, "jdupont");
    assert!(session.access.starts_with("mock."));
    assert!(!session.is_expired());
    assert_eq!(client.session(), Some(&session));

    client.logout();
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_login_without_password_reports_detail() {
    let mut client = ApiClient::new(&spawn_server().await).unwrap();
    let err = client.login("jdupont", "").await.unwrap_err();
    assert!(matches!(err, ClientError::Status { .. }));
    assert_eq!(
        err.detail().as_deref(),
        Some("Username and password are required")
    );
}

#[tokio::test]
async fn test_lists_are_cached_and_invalidated() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let appointments = client.list_appointments().await.unwrap().fresh().unwrap();
    assert_eq!(appointments.len(), 3);
    assert!(client.cache().contains("appointments/"));

    let created = client
        .create_appointment(&InsertAppointment {
            patient: Some(4),
            doctor: Some(6),
            datetime: Some("2025-06-01T08:00:00Z".into()),
            mode: Some("video".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.doctor_name.as_deref(), Some("Dr. Thomas Bernard"));
    assert!(!client.cache().contains("appointments/"));

    let appointments = client.list_appointments().await.unwrap().fresh().unwrap();
    assert_eq!(appointments.len(), 4);

    client.delete_appointment(created.id).await.unwrap();
    let err = client.get_appointment(created.id).await.unwrap_err();
    assert_eq!(err.detail().as_deref(), Some("Appointment not found"));
}

#[tokio::test]
async fn test_overtaken_fetch_is_stale() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let early = client.sequencer().issue(Resource::Reminders);
    let fetched = client.list_reminders().await.unwrap();
    assert!(!fetched.is_stale());
    assert_eq!(client.sequencer().settle(early, ()), Fetched::Stale);
}

#[tokio::test]
async fn test_users_by_role() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let patients = client
        .list_users(Some(UserRole::Patient))
        .await
        .unwrap()
        .fresh()
        .unwrap();
    assert_eq!(patients.len(), 3);
    assert!(patients.iter().all(|u| u.is_patient));
    assert_eq!(client.get_user(2).await.unwrap().username, "smartin");
}

#[tokio::test]
async fn test_reminder_update_and_record_upload() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let reminder = client
        .update_reminder(
            1,
            &InsertReminder {
                status: Some("sent".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reminder.status.as_deref(), Some("sent"));

    let record = client
        .upload_record(
            &InsertMedicalRecord {
                patient: Some(3),
                diagnosis: Some("Entorse".into()),
                treatment: Some("Repos".into()),
                file: None,
            },
            "radio.png",
            vec![0x89, 0x50, 0x4e, 0x47],
        )
        .await
        .unwrap();
    assert_eq!(record.file.as_deref(), Some("radio.png"));
    assert_eq!(record.patient_name.as_deref(), Some("Marie Leclerc"));
}

#[tokio::test]
async fn test_dataset_and_export_download() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let dataset = client
        .fetch_dataset(DatasetKind::Feedback)
        .await
        .unwrap()
        .fresh()
        .unwrap();
    assert_eq!(dataset.len(), 3);

    let file = client
        .download_export(
            DatasetKind::Reminders,
            &ExportRequest {
                format: ExportFormat::Json,
                report_type: Some("sent".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(file.file_name.starts_with("telemed_reminders_"));
    assert!(file.file_name.ends_with(".json"));
    let rows: serde_json::Value = serde_json::from_str(&file.content).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let err = client
        .download_export(
            DatasetKind::Records,
            &ExportRequest {
                format: ExportFormat::Pdf,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status, .. } if status.as_u16() == 501));
}

#[tokio::test]
async fn test_second_list_is_answered_from_cache() {
    let store = Store::with_data(SampleData::new());
    let client = ApiClient::new(&spawn_server_with(store.clone()).await).unwrap();

    let first = client.list_reminders().await.unwrap().fresh().unwrap();
    assert_eq!(first.len(), 3);

    store.delete_reminder(1).unwrap();
    let cached = client.list_reminders().await.unwrap().fresh().unwrap();
    assert_eq!(cached, first);

    client.invalidate(Resource::Reminders);
    let reloaded = client.list_reminders().await.unwrap().fresh().unwrap();
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.iter().all(|r| r.id != 1));
}

#[tokio::test]
async fn test_mutation_stales_list_fetch_in_flight() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let in_flight = client.sequencer().issue(Resource::Appointments);

    client
        .create_appointment(&InsertAppointment {
            patient: Some(1),
            doctor: Some(2),
            datetime: Some("2025-07-01T10:00:00Z".into()),
            mode: Some("chat".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let pre_create_rows: Vec<i64> = vec![1, 2, 3];
    assert_eq!(client.sequencer().settle(in_flight, pre_create_rows), Fetched::Stale);
    assert!(!client.cache().contains("appointments/"));

    let rows = client.list_appointments().await.unwrap().fresh().unwrap();
    assert_eq!(rows.len(), 4);
}
