//! HTTP client for the Telemed REST API.

use reqwest::multipart::{Form, Part};
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use api_shared::{TokenReq, TokenRes};
use telemed_core::{
    Appointment, DashboardStats, Dataset, DatasetKind, ExportFormat, Feedback, InsertAppointment,
    InsertFeedback, InsertMedicalRecord, InsertReminder, InsertUser, MedicalRecord, Reminder,
    Resource, User, UserRole,
};

use crate::cache::ResourceCache;
use crate::error::{ClientError, ClientResult};
use crate::sequence::{Fetched, RequestSequencer};
use crate::session::Session;

/// Default API base when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";

/// A file downloaded from the export endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content: String,
}

/// Options for a server-side export download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub report_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub include_headers: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            report_type: None,
            from: None,
            to: None,
            include_headers: true,
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    session: Option<Session>,
    sequencer: RequestSequencer,
    cache: ResourceCache,
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(de).map_err(|e| ClientError::Decode {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}

/// Passes successful responses through; anything else becomes `ClientError::Status`.
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { status, body });
    }
    Ok(response)
}

fn attachment_name(response: &Response) -> Option<String> {
    let value = response
        .headers()
        .get(header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    let (_, rest) = value.split_once("filename=")?;
    Some(rest.trim().trim_matches('"').to_owned())
}

impl ApiClient {
    /// A client for the API rooted at `base_url` (for example `http://127.0.0.1:3000/api`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base: base.to_owned(),
            session: None,
            sequencer: RequestSequencer::new(),
            cache: ResourceCache::new(),
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}/{}", self.base, path));
        match &self.session {
            Some(session) => builder.bearer_auth(&session.access),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = check(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        decode(&bytes)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn send_empty(&self, method: Method, path: &str) -> ClientResult<()> {
        check(self.request(method, path).send().await?).await?;
        Ok(())
    }

    /// Answers from the cache when `path` has a live entry; otherwise fetches under the
    /// resource's sequence and caches a fresh result.
    async fn fetch_list<T>(&self, resource: Resource, path: &str) -> ClientResult<Fetched<Vec<T>>>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(items) = self.cache.get::<Vec<T>>(path) {
            tracing::debug!(path, "list served from cache");
            return Ok(Fetched::Fresh(items));
        }
        let ticket = self.sequencer.issue(resource);
        let items: Vec<T> = self.send(self.request(Method::GET, path)).await?;
        let fetched = self.sequencer.settle(ticket, items);
        if let Fetched::Fresh(items) = &fetched {
            self.cache.put(path, items);
        }
        Ok(fetched)
    }

    /// Drops cached lists for `resource` and stales any fetch of it still in flight, so a
    /// response sent before a mutation can never repopulate the cache.
    pub fn invalidate(&self, resource: Resource) {
        self.sequencer.supersede(resource);
        self.cache.invalidate(resource);
    }

    /// The last fresh list cached under `path`, if any.
    pub fn cached<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.cache.get(path)
    }

    // ─── Auth ────────────────────────────────────────────────────────────────

    /// Obtains a token and keeps the resulting session on this client.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Session> {
        let req = TokenReq {
            username: Some(username.to_owned()),
            password: Some(password.to_owned()),
        };
        let token: TokenRes = self.send_json(Method::POST, "token/", &req).await?;
        let session = Session::from_token(username, token);
        tracing::info!(username, "logged in");
        self.session = Some(session.clone());
        Ok(session)
    }

    pub fn logout(&mut self) {
        self.session = None;
        self.cache.clear();
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    pub async fn list_users(&self, role: Option<UserRole>) -> ClientResult<Fetched<Vec<User>>> {
        let path = match role {
            Some(UserRole::Patient) => "users/?is_patient=true",
            Some(UserRole::Doctor) => "users/?is_doctor=true",
            None => "users/",
        };
        self.fetch_list(Resource::Users, path).await
    }

    pub async fn get_user(&self, id: i64) -> ClientResult<User> {
        self.send(self.request(Method::GET, &format!("users/{id}")))
            .await
    }

    pub async fn create_user(&self, payload: &InsertUser) -> ClientResult<User> {
        let user = self.send_json(Method::POST, "users/", payload).await?;
        self.invalidate(Resource::Users);
        Ok(user)
    }

    // ─── Appointments ────────────────────────────────────────────────────────

    pub async fn list_appointments(&self) -> ClientResult<Fetched<Vec<Appointment>>> {
        self.fetch_list(Resource::Appointments, "appointments/").await
    }

    pub async fn get_appointment(&self, id: i64) -> ClientResult<Appointment> {
        self.send(self.request(Method::GET, &format!("appointments/{id}")))
            .await
    }

    pub async fn create_appointment(&self, payload: &InsertAppointment) -> ClientResult<Appointment> {
        let created = self.send_json(Method::POST, "appointments/", payload).await?;
        self.invalidate(Resource::Appointments);
        Ok(created)
    }

    pub async fn update_appointment(
        &self,
        id: i64,
        patch: &InsertAppointment,
    ) -> ClientResult<Appointment> {
        let updated = self
            .send_json(Method::PATCH, &format!("appointments/{id}"), patch)
            .await?;
        self.invalidate(Resource::Appointments);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: i64) -> ClientResult<()> {
        self.send_empty(Method::DELETE, &format!("appointments/{id}"))
            .await?;
        self.invalidate(Resource::Appointments);
        Ok(())
    }

    // ─── Medical records ─────────────────────────────────────────────────────

    pub async fn list_records(&self) -> ClientResult<Fetched<Vec<MedicalRecord>>> {
        self.fetch_list(Resource::Records, "records/").await
    }

    pub async fn create_record(&self, payload: &InsertMedicalRecord) -> ClientResult<MedicalRecord> {
        let created = self.send_json(Method::POST, "records/", payload).await?;
        self.invalidate(Resource::Records);
        Ok(created)
    }

    /// Creates a record with an attached file sent as multipart form data.
    pub async fn upload_record(
        &self,
        payload: &InsertMedicalRecord,
        file_name: &str,
        content: Vec<u8>,
    ) -> ClientResult<MedicalRecord> {
        let mut form = Form::new();
        if let Some(patient) = payload.patient {
            form = form.text("patient", patient.to_string());
        }
        if let Some(diagnosis) = &payload.diagnosis {
            form = form.text("diagnosis", diagnosis.clone());
        }
        if let Some(treatment) = &payload.treatment {
            form = form.text("treatment", treatment.clone());
        }
        form = form.part("file", Part::bytes(content).file_name(file_name.to_owned()));

        let created = self
            .send(self.request(Method::POST, "records/").multipart(form))
            .await?;
        self.invalidate(Resource::Records);
        Ok(created)
    }

    // ─── Reminders ───────────────────────────────────────────────────────────

    pub async fn list_reminders(&self) -> ClientResult<Fetched<Vec<Reminder>>> {
        self.fetch_list(Resource::Reminders, "reminders/").await
    }

    pub async fn create_reminder(&self, payload: &InsertReminder) -> ClientResult<Reminder> {
        let created = self.send_json(Method::POST, "reminders/", payload).await?;
        self.invalidate(Resource::Reminders);
        Ok(created)
    }

    pub async fn update_reminder(&self, id: i64, patch: &InsertReminder) -> ClientResult<Reminder> {
        let updated = self
            .send_json(Method::PATCH, &format!("reminders/{id}"), patch)
            .await?;
        self.invalidate(Resource::Reminders);
        Ok(updated)
    }

    pub async fn delete_reminder(&self, id: i64) -> ClientResult<()> {
        self.send_empty(Method::DELETE, &format!("reminders/{id}"))
            .await?;
        self.invalidate(Resource::Reminders);
        Ok(())
    }

    // ─── Feedback ────────────────────────────────────────────────────────────

    pub async fn list_feedback(&self) -> ClientResult<Fetched<Vec<Feedback>>> {
        self.fetch_list(Resource::Feedbacks, "feedbacks/").await
    }

    pub async fn create_feedback(&self, payload: &InsertFeedback) -> ClientResult<Feedback> {
        let created = self.send_json(Method::POST, "feedbacks/", payload).await?;
        self.invalidate(Resource::Feedbacks);
        Ok(created)
    }

    // ─── Stats, datasets, exports ────────────────────────────────────────────

    pub async fn stats(&self) -> ClientResult<DashboardStats> {
        self.send(self.request(Method::GET, "stats/")).await
    }

    /// Loads a whole dataset for local reporting. Stale fetches yield `Fetched::Stale`.
    pub async fn fetch_dataset(&self, kind: DatasetKind) -> ClientResult<Fetched<Dataset>> {
        Ok(match kind {
            DatasetKind::Appointments => fetched_map(self.list_appointments().await?, Dataset::Appointments),
            DatasetKind::Records => fetched_map(self.list_records().await?, Dataset::Records),
            DatasetKind::Patients => {
                fetched_map(self.list_users(Some(UserRole::Patient)).await?, Dataset::Patients)
            }
            DatasetKind::Reminders => fetched_map(self.list_reminders().await?, Dataset::Reminders),
            DatasetKind::Feedback => fetched_map(self.list_feedback().await?, Dataset::Feedback),
        })
    }

    /// Downloads an export built by the server.
    pub async fn download_export(
        &self,
        kind: DatasetKind,
        request: &ExportRequest,
    ) -> ClientResult<DownloadedFile> {
        let mut query: Vec<(&str, String)> = vec![
            ("format", request.format.extension().to_owned()),
            ("headers", request.include_headers.to_string()),
        ];
        if let Some(report_type) = &request.report_type {
            query.push(("type", report_type.clone()));
        }
        if let Some(from) = &request.from {
            query.push(("from", from.clone()));
        }
        if let Some(to) = &request.to {
            query.push(("to", to.clone()));
        }

        let response = self
            .request(Method::GET, &format!("exports/{}", kind.as_str()))
            .query(&query)
            .send()
            .await?;
        let response = check(response).await?;
        let file_name = attachment_name(&response).unwrap_or_else(|| {
            format!("{}.{}", kind.as_str(), request.format.extension())
        });
        if response.status() != StatusCode::OK {
            tracing::warn!(status = %response.status(), "unexpected export status");
        }
        let content = response.text().await?;
        Ok(DownloadedFile { file_name, content })
    }
}

fn fetched_map<T, U>(fetched: Fetched<T>, f: impl FnOnce(T) -> U) -> Fetched<U> {
    match fetched {
        Fetched::Fresh(value) => Fetched::Fresh(f(value)),
        Fetched::Stale => Fetched::Stale,
    }
}
