//! Sample dataset the mock API starts with.
//!
//! Entities reference users by id only; display names are joined when listed.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    Appointment, AppointmentStatus, ConsultationMode, Feedback, MedicalRecord, Reminder, User,
};

/// Everything a freshly seeded store contains.
#[derive(Debug, Clone, Default)]
pub struct SampleData {
    pub users: Vec<User>,
    pub appointments: Vec<Appointment>,
    pub records: Vec<MedicalRecord>,
    pub reminders: Vec<Reminder>,
    pub feedback: Vec<Feedback>,
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn user(id: i64, username: &str, name: &str, email: &str, doctor: bool) -> User {
    User {
        id,
        username: username.to_owned(),
        password: Some("changeme".to_owned()),
        email: email.to_owned(),
        is_patient: !doctor,
        is_doctor: doctor,
        name: Some(name.to_owned()),
        specialty: None,
        rating: None,
        patient_count: None,
        last_appointment: None,
        record_count: None,
    }
}

fn appointment(
    id: i64,
    patient: i64,
    doctor: i64,
    datetime: DateTime<Utc>,
    mode: ConsultationMode,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id,
        patient,
        patient_name: None,
        doctor,
        doctor_name: None,
        datetime,
        mode,
        status,
    }
}

fn reminder(id: i64, patient: i64, message: &str, date_time: DateTime<Utc>, status: Option<&str>) -> Reminder {
    Reminder {
        id,
        patient,
        patient_name: None,
        message: message.to_owned(),
        date_time,
        status: status.map(str::to_owned),
    }
}

impl SampleData {
    pub fn new() -> Self {
        let users = vec![
            user(1, "jdupont", "Jean Dupont", "jean.dupont@example.fr", false),
            user(2, "smartin", "Dr. Sophie Martin", "sophie.martin@example.fr", true),
            user(3, "mleclerc", "Marie Leclerc", "marie.leclerc@example.fr", false),
            user(4, "tbernard", "Thomas Bernard", "thomas.bernard@example.fr", false),
            user(5, "pdubois", "Dr. Pierre Dubois", "pierre.dubois@example.fr", true),
            user(6, "dr.tbernard", "Dr. Thomas Bernard", "dr.thomas.bernard@example.fr", true),
        ];

        let appointments = vec![
            appointment(1, 1, 2, at(2025, 4, 15, 10, 30), ConsultationMode::Video, AppointmentStatus::Confirmed),
            appointment(2, 3, 5, at(2025, 4, 16, 14, 0), ConsultationMode::Chat, AppointmentStatus::Pending),
            appointment(3, 1, 6, at(2025, 4, 17, 9, 0), ConsultationMode::Video, AppointmentStatus::Pending),
        ];

        let records = vec![
            MedicalRecord {
                id: 1,
                patient: 1,
                patient_name: None,
                created_at: at(2025, 4, 10, 15, 30),
                diagnosis: "Grippe saisonnière".to_owned(),
                treatment: "Repos, paracétamol, hydratation".to_owned(),
                file: Some("prescription_1.pdf".to_owned()),
            },
            MedicalRecord {
                id: 2,
                patient: 3,
                patient_name: None,
                created_at: at(2025, 4, 5, 11, 0),
                diagnosis: "Hypertension artérielle".to_owned(),
                treatment: "Régime pauvre en sel, médicaments antihypertenseurs".to_owned(),
                file: Some("ecg_results.pdf".to_owned()),
            },
        ];

        let reminders = vec![
            reminder(1, 1, "Prendre vos médicaments à 20h", at(2025, 4, 15, 20, 0), None),
            reminder(2, 3, "Rendez-vous de suivi demain à 10h", at(2025, 4, 14, 10, 0), Some("sent")),
            reminder(3, 1, "N'oubliez pas de mesurer votre tension artérielle", at(2025, 4, 16, 9, 0), None),
        ];

        let feedback = vec![
            Feedback {
                id: 1,
                patient: 1,
                patient_name: None,
                doctor: 2,
                doctor_name: None,
                rating: 5,
                comment: "Excellent médecin, très à l'écoute.".to_owned(),
            },
            Feedback {
                id: 2,
                patient: 3,
                patient_name: None,
                doctor: 2,
                doctor_name: None,
                rating: 4,
                comment: "Bon diagnostic, consultation un peu rapide mais efficace.".to_owned(),
            },
            Feedback {
                id: 3,
                patient: 4,
                patient_name: None,
                doctor: 5,
                doctor_name: None,
                rating: 3,
                comment: "Compétent, mais temps d'attente trop long.".to_owned(),
            },
        ];

        Self {
            users,
            appointments,
            records,
            reminders,
            feedback,
        }
    }
}
