//! Table views: search, category filters and paging over fetched lists.

use telemed_core::constants::{
    APPOINTMENTS_PAGE_SIZE, FEEDBACK_PAGE_SIZE, RECORDS_PAGE_SIZE, REMINDERS_PAGE_SIZE,
    USERS_PAGE_SIZE,
};
use telemed_core::filter::{
    filter_appointments, filter_feedback, filter_records, filter_reminders, filter_users,
};
use telemed_core::{
    Appointment, AppointmentStatus, DashboardStats, Feedback, MedicalRecord, NameLookup, Page,
    Reminder, Selection, User,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListKind {
    Appointments,
    Records,
    Patients,
    Doctors,
    Reminders,
    Feedback,
}

impl ListKind {
    pub fn default_page_size(&self) -> usize {
        match self {
            ListKind::Appointments => APPOINTMENTS_PAGE_SIZE,
            ListKind::Records => RECORDS_PAGE_SIZE,
            ListKind::Patients | ListKind::Doctors => USERS_PAGE_SIZE,
            ListKind::Reminders => REMINDERS_PAGE_SIZE,
            ListKind::Feedback => FEEDBACK_PAGE_SIZE,
        }
    }
}

/// What the user typed into a list view.
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub search: String,
    pub status: Selection<AppointmentStatus>,
    pub rating: Selection<i32>,
    pub page: usize,
    pub page_size: usize,
}

/// One rendered table line.
pub trait Row {
    fn row<L: NameLookup + ?Sized>(&self, lookup: &L) -> String;
}

impl Row for Appointment {
    fn row<L: NameLookup + ?Sized>(&self, lookup: &L) -> String {
        format!(
            "#{:<4} {}  {:<20} {:<22} {:<6} {}",
            self.id,
            self.datetime.format(DATE_FORMAT),
            self.patient_ref(lookup).label(),
            self.doctor_ref(lookup).label(),
            self.mode.as_str(),
            self.status
        )
    }
}

impl Row for MedicalRecord {
    fn row<L: NameLookup + ?Sized>(&self, lookup: &L) -> String {
        format!(
            "#{:<4} {}  {:<20} {} / {}{}",
            self.id,
            self.created_at.format(DATE_FORMAT),
            self.patient_ref(lookup).label(),
            self.diagnosis,
            self.treatment,
            self.file
                .as_deref()
                .map(|f| format!("  [{f}]"))
                .unwrap_or_default()
        )
    }
}

impl Row for Reminder {
    fn row<L: NameLookup + ?Sized>(&self, lookup: &L) -> String {
        format!(
            "#{:<4} {}  {:<20} {:<8} {}",
            self.id,
            self.date_time.format(DATE_FORMAT),
            self.patient_ref(lookup).label(),
            self.status.as_deref().unwrap_or("-"),
            self.message
        )
    }
}

impl Row for Feedback {
    fn row<L: NameLookup + ?Sized>(&self, lookup: &L) -> String {
        format!(
            "#{:<4} {:<20} {:<22} {}/5  {}",
            self.id,
            self.patient_ref(lookup).label(),
            self.doctor_ref(lookup).label(),
            self.rating,
            self.comment
        )
    }
}

impl Row for User {
    fn row<L: NameLookup + ?Sized>(&self, _lookup: &L) -> String {
        let mut line = format!(
            "#{:<4} {:<22} {:<14} {}",
            self.id,
            self.display_name(),
            self.username,
            self.email
        );
        if let Some(specialty) = &self.specialty {
            line.push_str(&format!("  {specialty}"));
        }
        if let Some(rating) = self.rating {
            line.push_str(&format!("  {rating:.1}/5"));
        }
        line
    }
}

fn rows<T: Row, L: NameLookup + ?Sized>(
    matched: &[&T],
    query: &ViewQuery,
    lookup: &L,
) -> Page<String> {
    let page = Page::of(matched, query.page, query.page_size);
    Page {
        items: page.items.iter().map(|item| item.row(lookup)).collect(),
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}

pub fn appointments_page<L: NameLookup + ?Sized>(
    items: &[Appointment],
    query: &ViewQuery,
    lookup: &L,
) -> Page<String> {
    let matched = filter_appointments(items, &query.search, &query.status, lookup);
    rows(&matched, query, lookup)
}

pub fn records_page<L: NameLookup + ?Sized>(
    items: &[MedicalRecord],
    query: &ViewQuery,
    lookup: &L,
) -> Page<String> {
    let matched = filter_records(items, &query.search, lookup);
    rows(&matched, query, lookup)
}

pub fn reminders_page<L: NameLookup + ?Sized>(
    items: &[Reminder],
    query: &ViewQuery,
    lookup: &L,
) -> Page<String> {
    let matched = filter_reminders(items, &query.search, lookup);
    rows(&matched, query, lookup)
}

pub fn feedback_page<L: NameLookup + ?Sized>(
    items: &[Feedback],
    query: &ViewQuery,
    lookup: &L,
) -> Page<String> {
    let matched = filter_feedback(items, &query.search, &query.rating, lookup);
    rows(&matched, query, lookup)
}

pub fn users_page(items: &[User], query: &ViewQuery) -> Page<String> {
    let matched = filter_users(items, &query.search);
    rows(&matched, query, &telemed_core::NoLookup)
}

/// Prints a page, or the "no results" line when nothing matched.
pub fn render_page(page: &Page<String>) -> String {
    if page.is_no_results() {
        return "No results found.".to_owned();
    }
    let mut out = page.items.join("\n");
    out.push_str(&format!(
        "\n-- page {} of {} ({} items)",
        page.page, page.total_pages, page.total_items
    ));
    out
}

pub fn render_stats(stats: &DashboardStats) -> String {
    format!(
        "Appointments:     {}\nActive patients:  {}\nActive doctors:   {}\nAverage rating:   {:.1}",
        stats.total_appointments, stats.active_patients, stats.active_doctors, stats.avg_rating
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemed_core::sample::SampleData;
    use telemed_core::{Directory, NoLookup};

    fn query(search: &str, page: usize, page_size: usize) -> ViewQuery {
        ViewQuery {
            search: search.into(),
            page,
            page_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_appointment_search_uses_directory_names() {
        let data = SampleData::new();
        let directory = Directory::from_users(&data.users);
        let page = appointments_page(&data.appointments, &query("martin", 1, 10), &directory);
        assert_eq!(page.total_items, 1);
        assert!(page.items[0].contains("Jean Dupont"));
        assert!(page.items[0].contains("Dr. Sophie Martin"));
    }

    #[test]
    fn test_unresolved_names_fall_back_to_labels() {
        let data = SampleData::new();
        let page = appointments_page(&data.appointments, &query("", 1, 10), &NoLookup);
        assert_eq!(page.total_items, 3);
        assert!(page.items[0].contains("Patient #1"));
        assert!(page.items[0].contains("Doctor #2"));
    }

    #[test]
    fn test_status_filter_and_paging() {
        let data = SampleData::new();
        let q = ViewQuery {
            status: "pending".parse().unwrap(),
            ..query("", 2, 1)
        };
        let page = appointments_page(&data.appointments, &q, &NoLookup);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].starts_with("#3"));
    }

    #[test]
    fn test_feedback_rating_filter() {
        let data = SampleData::new();
        let q = ViewQuery {
            rating: "5".parse().unwrap(),
            ..query("", 1, 8)
        };
        let page = feedback_page(&data.feedback, &q, &NoLookup);
        assert_eq!(page.total_items, 1);
        assert!(page.items[0].contains("5/5"));
    }

    #[test]
    fn test_out_of_range_page_is_empty_but_not_no_results() {
        let data = SampleData::new();
        let page = reminders_page(&data.reminders, &query("", 9, 10), &NoLookup);
        assert!(page.items.is_empty());
        assert!(!page.is_no_results());
        assert!(render_page(&page).contains("page 9 of 1"));
    }

    #[test]
    fn test_no_results_message() {
        let data = SampleData::new();
        let page = users_page(&data.users, &query("nobody-here", 1, 10));
        assert_eq!(render_page(&page), "No results found.");
    }

    #[test]
    fn test_render_stats() {
        let stats = DashboardStats {
            total_appointments: 3,
            active_patients: 3,
            active_doctors: 3,
            avg_rating: 4.0,
        };
        assert!(render_stats(&stats).contains("Average rating:   4.0"));
    }
}
