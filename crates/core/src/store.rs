//! In-memory storage behind the mock API.
//!
//! Each resource lives in an ordered map keyed by id, so listings come back in creation
//! order. All tables share one `RwLock`; critical sections are short and never await.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::filter::Selection;
use crate::models::{
    Appointment, AppointmentStatus, DashboardStats, Feedback, InsertAppointment, InsertFeedback,
    InsertMedicalRecord, InsertReminder, InsertUser, MedicalRecord, Reminder, Resource, User,
    UserRole,
};
use crate::reference::{Directory, JoinNames};
use crate::report::{Dataset, DatasetKind};
use crate::sample::SampleData;

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn seeded(rows: Vec<T>, id_of: impl Fn(&T) -> i64) -> Self {
        let rows: BTreeMap<i64, T> = rows.into_iter().map(|row| (id_of(&row), row)).collect();
        let next_id = rows.keys().next_back().map_or(1, |last| last + 1);
        Self { rows, next_id }
    }

    /// Builds a row with the next id and stores it. The id is only consumed on success.
    fn insert_with<E>(&mut self, build: impl FnOnce(i64) -> Result<T, E>) -> Result<T, E> {
        let id = self.next_id;
        let row = build(id)?;
        self.rows.insert(id, row.clone());
        self.next_id += 1;
        Ok(row)
    }

    fn get(&self, resource: Resource, id: i64) -> CoreResult<&T> {
        self.rows.get(&id).ok_or(CoreError::NotFound { resource, id })
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    appointments: Table<Appointment>,
    records: Table<MedicalRecord>,
    reminders: Table<Reminder>,
    feedback: Table<Feedback>,
}

impl Tables {
    fn directory(&self) -> Directory {
        Directory::from_users(self.users.values())
    }
}

/// Shared handle to the in-memory tables. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Tables>>,
}

fn joined<T: Clone + JoinNames>(rows: impl Iterator<Item = T>, directory: &Directory) -> Vec<T> {
    rows.map(|mut row| {
        row.join_names(directory);
        row
    })
    .collect()
}

impl Store {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `data`; id counters continue after the highest seeded id.
    pub fn with_data(data: SampleData) -> Self {
        let tables = Tables {
            users: Table::seeded(data.users, |u| u.id),
            appointments: Table::seeded(data.appointments, |a| a.id),
            records: Table::seeded(data.records, |r| r.id),
            reminders: Table::seeded(data.reminders, |r| r.id),
            feedback: Table::seeded(data.feedback, |f| f.id),
        };
        Self {
            inner: Arc::new(RwLock::new(tables)),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        if cfg.seed_sample_data() {
            Self::with_data(SampleData::new())
        } else {
            Self::new()
        }
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| CoreError::StorePoisoned)
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| CoreError::StorePoisoned)
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    /// Users without passwords. With a role, only that role, plus its listing details.
    pub fn list_users(&self, role: Option<UserRole>) -> CoreResult<Vec<User>> {
        let tables = self.read()?;
        let users: Vec<User> = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.has_role(r)))
            .map(User::redacted)
            .collect();
        drop(tables);

        let Some(role) = role else {
            return Ok(users);
        };
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        Ok(users
            .into_iter()
            .map(|u| u.with_listing_details(role, &mut rng, now))
            .collect())
    }

    pub fn get_user(&self, id: i64) -> CoreResult<User> {
        Ok(self.read()?.users.get(Resource::Users, id)?.redacted())
    }

    pub fn create_user(&self, payload: InsertUser) -> CoreResult<User> {
        let mut tables = self.write()?;
        let user = tables.users.insert_with(|id| payload.validate(id))?;
        tracing::info!(id = user.id, username = %user.username, "user created");
        Ok(user.redacted())
    }

    pub fn directory(&self) -> CoreResult<Directory> {
        Ok(self.read()?.directory())
    }

    // ─── Appointments ────────────────────────────────────────────────────────

    pub fn list_appointments(
        &self,
        status: &Selection<AppointmentStatus>,
    ) -> CoreResult<Vec<Appointment>> {
        let tables = self.read()?;
        let directory = tables.directory();
        let rows = tables
            .appointments
            .values()
            .filter(|a| status.admits(&a.status))
            .cloned();
        Ok(joined(rows, &directory))
    }

    pub fn get_appointment(&self, id: i64) -> CoreResult<Appointment> {
        let tables = self.read()?;
        let mut appointment = tables.appointments.get(Resource::Appointments, id)?.clone();
        appointment.join_names(&tables.directory());
        Ok(appointment)
    }

    pub fn create_appointment(&self, payload: InsertAppointment) -> CoreResult<Appointment> {
        let mut tables = self.write()?;
        let mut appointment = tables.appointments.insert_with(|id| payload.validate(id))?;
        appointment.join_names(&tables.directory());
        tracing::info!(id = appointment.id, "appointment created");
        Ok(appointment)
    }

    /// Merges `patch` into the stored appointment and persists the result.
    pub fn update_appointment(&self, id: i64, patch: InsertAppointment) -> CoreResult<Appointment> {
        let mut tables = self.write()?;
        let current = tables.appointments.get(Resource::Appointments, id)?;
        let next = patch.apply_patch(current)?;
        tables.appointments.rows.insert(id, next.clone());
        let mut appointment = next;
        appointment.join_names(&tables.directory());
        tracing::info!(id, "appointment updated");
        Ok(appointment)
    }

    pub fn delete_appointment(&self, id: i64) -> CoreResult<()> {
        let mut tables = self.write()?;
        tables
            .appointments
            .rows
            .remove(&id)
            .ok_or(CoreError::NotFound {
                resource: Resource::Appointments,
                id,
            })?;
        tracing::info!(id, "appointment deleted");
        Ok(())
    }

    // ─── Medical records ─────────────────────────────────────────────────────

    pub fn list_records(&self, patient: Option<i64>) -> CoreResult<Vec<MedicalRecord>> {
        let tables = self.read()?;
        let directory = tables.directory();
        let rows = tables
            .records
            .values()
            .filter(|r| patient.map_or(true, |p| r.patient == p))
            .cloned();
        Ok(joined(rows, &directory))
    }

    pub fn create_record(&self, payload: InsertMedicalRecord) -> CoreResult<MedicalRecord> {
        let mut tables = self.write()?;
        let now = Utc::now();
        let mut record = tables.records.insert_with(|id| payload.validate(id, now))?;
        record.join_names(&tables.directory());
        tracing::info!(id = record.id, "medical record created");
        Ok(record)
    }

    // ─── Reminders ───────────────────────────────────────────────────────────

    pub fn list_reminders(&self) -> CoreResult<Vec<Reminder>> {
        let tables = self.read()?;
        let directory = tables.directory();
        Ok(joined(tables.reminders.values().cloned(), &directory))
    }

    pub fn create_reminder(&self, payload: InsertReminder) -> CoreResult<Reminder> {
        let mut tables = self.write()?;
        let mut reminder = tables.reminders.insert_with(|id| payload.validate(id))?;
        reminder.join_names(&tables.directory());
        tracing::info!(id = reminder.id, "reminder created");
        Ok(reminder)
    }

    pub fn update_reminder(&self, id: i64, patch: InsertReminder) -> CoreResult<Reminder> {
        let mut tables = self.write()?;
        let current = tables.reminders.get(Resource::Reminders, id)?;
        let next = patch.apply_patch(current)?;
        tables.reminders.rows.insert(id, next.clone());
        let mut reminder = next;
        reminder.join_names(&tables.directory());
        tracing::info!(id, "reminder updated");
        Ok(reminder)
    }

    pub fn delete_reminder(&self, id: i64) -> CoreResult<()> {
        let mut tables = self.write()?;
        tables
            .reminders
            .rows
            .remove(&id)
            .ok_or(CoreError::NotFound {
                resource: Resource::Reminders,
                id,
            })?;
        tracing::info!(id, "reminder deleted");
        Ok(())
    }

    // ─── Feedback ────────────────────────────────────────────────────────────

    pub fn list_feedback(&self) -> CoreResult<Vec<Feedback>> {
        let tables = self.read()?;
        let directory = tables.directory();
        Ok(joined(tables.feedback.values().cloned(), &directory))
    }

    pub fn create_feedback(&self, payload: InsertFeedback) -> CoreResult<Feedback> {
        let mut tables = self.write()?;
        let mut feedback = tables.feedback.insert_with(|id| payload.validate(id))?;
        feedback.join_names(&tables.directory());
        tracing::info!(id = feedback.id, rating = feedback.rating, "feedback created");
        Ok(feedback)
    }

    // ─── Aggregates ──────────────────────────────────────────────────────────

    pub fn stats(&self) -> CoreResult<DashboardStats> {
        let tables = self.read()?;
        let count = |role: UserRole| tables.users.values().filter(|u| u.has_role(role)).count() as u64;
        Ok(DashboardStats {
            total_appointments: tables.appointments.rows.len() as u64,
            active_patients: count(UserRole::Patient),
            active_doctors: count(UserRole::Doctor),
            avg_rating: DashboardStats::average_rating(tables.feedback.values().map(|f| f.rating)),
        })
    }

    /// The full dataset of `kind`, names joined, ready for a report or an export.
    pub fn dataset(&self, kind: DatasetKind) -> CoreResult<Dataset> {
        Ok(match kind {
            DatasetKind::Appointments => Dataset::Appointments(self.list_appointments(&Selection::All)?),
            DatasetKind::Records => Dataset::Records(self.list_records(None)?),
            DatasetKind::Patients => Dataset::Patients(self.list_users(Some(UserRole::Patient))?),
            DatasetKind::Reminders => Dataset::Reminders(self.list_reminders()?),
            DatasetKind::Feedback => Dataset::Feedback(self.list_feedback()?),
        })
    }
}
