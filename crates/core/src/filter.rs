//! Search, category filters, date ranges, sorting and pagination over in-memory lists.
//!
//! Everything here is pure: functions borrow the source collection and return the subset
//! (as references) or a page of it. An empty result is a normal outcome.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ALL_SENTINEL;
use crate::error::{CoreError, CoreResult};
use crate::models::{Appointment, AppointmentStatus, Feedback, MedicalRecord, Reminder, User};
use crate::reference::NameLookup;
use crate::validation::{parse_date_bound, DateBound};

// ─── Text search ─────────────────────────────────────────────────────────────

/// Entities that expose display fields to free-text search.
pub trait Searchable {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> Vec<Cow<'a, str>>;
}

impl Searchable for Appointment {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> Vec<Cow<'a, str>> {
        vec![
            self.patient_ref(lookup).label(),
            self.doctor_ref(lookup).label(),
        ]
    }
}

impl Searchable for MedicalRecord {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> Vec<Cow<'a, str>> {
        vec![
            self.patient_ref(lookup).label(),
            Cow::Borrowed(self.diagnosis.as_str()),
            Cow::Borrowed(self.treatment.as_str()),
        ]
    }
}

impl Searchable for Reminder {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> Vec<Cow<'a, str>> {
        vec![
            self.patient_ref(lookup).label(),
            Cow::Borrowed(self.message.as_str()),
        ]
    }
}

impl Searchable for Feedback {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> Vec<Cow<'a, str>> {
        vec![
            self.patient_ref(lookup).label(),
            self.doctor_ref(lookup).label(),
            Cow::Borrowed(self.comment.as_str()),
        ]
    }
}

impl Searchable for User {
    fn search_fields<'a, L: NameLookup + ?Sized>(&'a self, _lookup: &'a L) -> Vec<Cow<'a, str>> {
        let mut fields = vec![
            Cow::Borrowed(self.username.as_str()),
            Cow::Borrowed(self.email.as_str()),
        ];
        if let Some(name) = self.name.as_deref() {
            fields.push(Cow::Borrowed(name));
        }
        fields
    }
}

/// Case-insensitive substring match against any search field. An empty query matches.
pub fn matches_search<T, L>(item: &T, query: &str, lookup: &L) -> bool
where
    T: Searchable,
    L: NameLookup + ?Sized,
{
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    item.search_fields(lookup)
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Items matching `query` and `keep`, in source order.
pub fn filter_items<'a, T, L>(
    items: &'a [T],
    query: &str,
    lookup: &L,
    mut keep: impl FnMut(&T) -> bool,
) -> Vec<&'a T>
where
    T: Searchable,
    L: NameLookup + ?Sized,
{
    items
        .iter()
        .filter(|item| keep(item) && matches_search(*item, query, lookup))
        .collect()
}

// ─── Category filters ────────────────────────────────────────────────────────

/// An exact-match category filter with an "all" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl<T> Selection<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Selection::All => None,
            Selection::Only(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Selection::All, Selection::Only)
    }
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = T::Err;

    /// `""` and `"all"` (any case) select everything; anything else must parse as `T`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_SENTINEL) {
            return Ok(Selection::All);
        }
        trimmed.parse().map(Selection::Only)
    }
}

// ─── Date ranges ─────────────────────────────────────────────────────────────

/// Named date slots, looked up in [`DATE_FIELD_PRIORITY`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Datetime,
    Date,
    CreatedAt,
}

pub const DATE_FIELD_PRIORITY: [DateField; 3] =
    [DateField::Datetime, DateField::Date, DateField::CreatedAt];

/// Entities with (possibly) a date relevant to date-range filtering and sorting.
pub trait Dated {
    fn date_field(&self, field: DateField) -> Option<DateTime<Utc>>;

    /// The first present slot in priority order.
    fn resolved_date(&self) -> Option<DateTime<Utc>> {
        DATE_FIELD_PRIORITY
            .iter()
            .find_map(|field| self.date_field(*field))
    }
}

impl<T: Dated + ?Sized> Dated for &T {
    fn date_field(&self, field: DateField) -> Option<DateTime<Utc>> {
        (**self).date_field(field)
    }
}

impl Dated for Appointment {
    fn date_field(&self, field: DateField) -> Option<DateTime<Utc>> {
        matches!(field, DateField::Datetime).then_some(self.datetime)
    }
}

impl Dated for Reminder {
    fn date_field(&self, field: DateField) -> Option<DateTime<Utc>> {
        matches!(field, DateField::Datetime).then_some(self.date_time)
    }
}

impl Dated for MedicalRecord {
    fn date_field(&self, field: DateField) -> Option<DateTime<Utc>> {
        matches!(field, DateField::CreatedAt).then_some(self.created_at)
    }
}

impl Dated for User {
    fn date_field(&self, _field: DateField) -> Option<DateTime<Utc>> {
        None
    }
}

impl Dated for Feedback {
    fn date_field(&self, _field: DateField) -> Option<DateTime<Utc>> {
        None
    }
}

/// Date bounds, either of which may be open. `start` is inclusive; `end` is inclusive unless
/// `end_exclusive` is set, which is how a bare end date covers its whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_exclusive: bool,
}

impl DateRange {
    /// Inclusive bounds.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            end_exclusive: false,
        }
    }

    /// Parses optional textual bounds (timestamps or `YYYY-MM-DD` dates).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if a bound does not parse, or if `start` is after `end`.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> CoreResult<Self> {
        let bound = |value: Option<&str>, upper: bool| -> CoreResult<Option<DateBound>> {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) => parse_date_bound(v, upper)
                    .map(Some)
                    .ok_or_else(|| CoreError::InvalidDate(v.to_owned())),
            }
        };
        let start = bound(start, false)?;
        let end = bound(end, true)?;
        let range = Self {
            start: start.map(|b| b.at),
            end: end.map(|b| b.at),
            end_exclusive: end.is_some_and(|b| b.exclusive),
        };
        if let (Some(s), Some(e)) = (range.start, range.end) {
            if s > e || (range.end_exclusive && s == e) {
                return Err(CoreError::InvalidDate(format!(
                    "range start {} is after end {}",
                    s.to_rfc3339(),
                    e.to_rfc3339()
                )));
            }
        }
        Ok(range)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        let before_end = |e: DateTime<Utc>| {
            if self.end_exclusive {
                date < e
            } else {
                date <= e
            }
        };
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, before_end)
    }

    /// Items without a resolvable date are kept.
    pub fn admits<T: Dated + ?Sized>(&self, item: &T) -> bool {
        if self.is_unbounded() {
            return true;
        }
        item.resolved_date().map_or(true, |date| self.contains(date))
    }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// Stable ascending sort by resolved date; undated items go last.
pub fn sort_soonest_first<T: Dated>(items: &mut [T]) {
    items.sort_by_key(|item| {
        let date = item.resolved_date();
        (date.is_none(), date)
    });
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// The `page`-th slice (1-based) of `page_size` items. Page 0 and pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// One page of a filtered list plus the figures a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    pub fn of(items: &[T], page: usize, page_size: usize) -> Self {
        Self {
            items: paginate(items, page, page_size).to_vec(),
            page,
            page_size,
            total_items: items.len(),
            total_pages: total_pages(items.len(), page_size),
        }
    }
}

impl<T> Page<T> {
    /// True when the filtered list itself is empty (the "no results" state).
    pub fn is_no_results(&self) -> bool {
        self.total_items == 0
    }
}

// ─── Per-view filters ────────────────────────────────────────────────────────

pub fn filter_appointments<'a, L: NameLookup + ?Sized>(
    items: &'a [Appointment],
    query: &str,
    status: &Selection<AppointmentStatus>,
    lookup: &L,
) -> Vec<&'a Appointment> {
    filter_items(items, query, lookup, |a| status.admits(&a.status))
}

pub fn filter_records<'a, L: NameLookup + ?Sized>(
    items: &'a [MedicalRecord],
    query: &str,
    lookup: &L,
) -> Vec<&'a MedicalRecord> {
    filter_items(items, query, lookup, |_| true)
}

/// Matching reminders, soonest first.
pub fn filter_reminders<'a, L: NameLookup + ?Sized>(
    items: &'a [Reminder],
    query: &str,
    lookup: &L,
) -> Vec<&'a Reminder> {
    let mut matched = filter_items(items, query, lookup, |_| true);
    sort_soonest_first(&mut matched);
    matched
}

pub fn filter_feedback<'a, L: NameLookup + ?Sized>(
    items: &'a [Feedback],
    query: &str,
    rating: &Selection<i32>,
    lookup: &L,
) -> Vec<&'a Feedback> {
    filter_items(items, query, lookup, |f| rating.admits(&f.rating))
}

pub fn filter_users<'a>(items: &'a [User], query: &str) -> Vec<&'a User> {
    filter_items(items, query, &crate::reference::NoLookup, |_| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConsultationMode;
    use crate::reference::{Directory, NoLookup, PartyKind};
    use chrono::{Duration, TimeZone};

    fn appointment(id: i64, patient: i64, name: Option<&str>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            patient,
            patient_name: name.map(str::to_owned),
            doctor: 2,
            doctor_name: Some("Dr. Sophie Martin".into()),
            datetime: Utc.with_ymd_and_hms(2025, 4, 15, 10, 30, 0).unwrap() + Duration::days(id),
            mode: ConsultationMode::Video,
            status,
        }
    }

    fn appointments() -> Vec<Appointment> {
        vec![
            appointment(1, 1, Some("Jean Dupont"), AppointmentStatus::Confirmed),
            appointment(2, 3, Some("Marie Leclerc"), AppointmentStatus::Pending),
            appointment(3, 1, Some("Jean Dupont"), AppointmentStatus::Pending),
        ]
    }

    fn reminder(id: i64, at: DateTime<Utc>, message: &str) -> Reminder {
        Reminder {
            id,
            patient: 1,
            patient_name: None,
            message: message.into(),
            date_time: at,
            status: None,
        }
    }

    #[test]
    fn test_empty_search_is_identity() {
        let items = appointments();
        let matched = filter_appointments(&items, "", &Selection::All, &NoLookup);
        let ids: Vec<i64> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_search_is_case_insensitive_on_patient_name() {
        let items = appointments();
        let matched = filter_appointments(&items, "jean", &Selection::All, &NoLookup);
        let ids: Vec<i64> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(matched.iter().all(|a| a.patient_name.as_deref() == Some("Jean Dupont")));
    }

    #[test]
    fn test_search_matches_placeholder_label() {
        let items = vec![appointment(9, 42, None, AppointmentStatus::Pending)];
        assert_eq!(
            filter_appointments(&items, "patient #42", &Selection::All, &NoLookup).len(),
            1
        );
    }

    #[test]
    fn test_search_uses_caller_lookup() {
        let items = vec![appointment(9, 42, None, AppointmentStatus::Pending)];
        let mut directory = Directory::new();
        directory.insert(PartyKind::Patient, 42, "Lucie Moreau");
        assert_eq!(
            filter_appointments(&items, "moreau", &Selection::All, &directory).len(),
            1
        );
        assert!(filter_appointments(&items, "moreau", &Selection::All, &NoLookup).is_empty());
    }

    #[test]
    fn test_status_selection_filters_exactly() {
        let items = appointments();
        let pending: Selection<AppointmentStatus> = "pending".parse().unwrap();
        let matched = filter_appointments(&items, "", &pending, &NoLookup);
        let ids: Vec<i64> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_selection_sentinel_parses_to_all() {
        let all: Selection<i32> = "all".parse().unwrap();
        assert_eq!(all, Selection::All);
        let all: Selection<i32> = "".parse().unwrap();
        assert_eq!(all, Selection::All);
        let four: Selection<i32> = "4".parse().unwrap();
        assert_eq!(four, Selection::Only(4));
        assert!("four".parse::<Selection<i32>>().is_err());
    }

    #[test]
    fn test_feedback_rating_and_comment_search() {
        let items = vec![
            Feedback {
                id: 1,
                patient: 1,
                patient_name: None,
                doctor: 2,
                doctor_name: None,
                rating: 5,
                comment: "Excellent médecin".into(),
            },
            Feedback {
                id: 2,
                patient: 3,
                patient_name: None,
                doctor: 2,
                doctor_name: None,
                rating: 3,
                comment: "Good, but slow".into(),
            },
        ];
        let matched = filter_feedback(&items, "SLOW", &Selection::All, &NoLookup);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 2);
        assert!(filter_feedback(&items, "slow", &Selection::Only(5), &NoLookup).is_empty());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let items = appointments();
        let range = DateRange::new(Some(items[0].datetime), Some(items[1].datetime));
        let kept: Vec<i64> = items.iter().filter(|a| range.admits(*a)).map(|a| a.id).collect();
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn test_date_range_keeps_undated_items() {
        let range = DateRange::new(Some(Utc::now()), None);
        let feedback = Feedback {
            id: 1,
            patient: 1,
            patient_name: None,
            doctor: 2,
            doctor_name: None,
            rating: 4,
            comment: "ok".into(),
        };
        assert!(range.admits(&feedback));
    }

    #[test]
    fn test_bare_end_date_covers_the_whole_last_day() {
        let range = DateRange::parse(Some("2025-04-15"), Some("2025-04-15")).unwrap();
        let day = Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap();
        assert!(range.contains(day));
        assert!(range.contains(
            Utc.with_ymd_and_hms(2025, 4, 15, 23, 59, 59).unwrap()
                + chrono::Duration::microseconds(999_500)
        ));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 4, 16, 0, 0, 0).unwrap()));

        let exact = DateRange::parse(None, Some("2025-04-15T12:00:00Z")).unwrap();
        assert!(exact.contains(Utc.with_ymd_and_hms(2025, 4, 15, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_date_range_parse_rejects_inverted_and_garbage() {
        assert!(DateRange::parse(Some("2025-04-16"), Some("2025-04-15")).is_err());
        assert!(matches!(
            DateRange::parse(Some("soon"), None),
            Err(CoreError::InvalidDate(v)) if v == "soon"
        ));
        let range = DateRange::parse(Some(""), None).unwrap();
        assert!(range.is_unbounded());
    }

    #[test]
    fn test_record_resolves_created_at_slot() {
        let record = MedicalRecord {
            id: 1,
            patient: 1,
            patient_name: None,
            created_at: Utc.with_ymd_and_hms(2025, 4, 10, 15, 30, 0).unwrap(),
            diagnosis: "Grippe".into(),
            treatment: "Repos".into(),
            file: None,
        };
        assert_eq!(record.date_field(DateField::Datetime), None);
        assert_eq!(record.resolved_date(), Some(record.created_at));
    }

    #[test]
    fn test_reminders_sorted_soonest_first_and_stable() {
        let base = Utc.with_ymd_and_hms(2025, 4, 14, 10, 0, 0).unwrap();
        let items = vec![
            reminder(1, base + Duration::hours(34), "medication"),
            reminder(2, base, "follow-up"),
            reminder(3, base + Duration::hours(47), "blood pressure"),
            reminder(4, base, "second at same time"),
        ];
        let ids: Vec<i64> = filter_reminders(&items, "", &NoLookup)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_paginate_bounds() {
        let items: Vec<u32> = (1..=23).collect();
        assert_eq!(paginate(&items, 1, 10), &items[0..10]);
        assert_eq!(paginate(&items, 3, 10), &[21, 22, 23]);
        assert!(paginate(&items, 0, 10).is_empty());
        assert!(paginate(&items, 4, 10).is_empty());
        assert!(paginate(&items, usize::MAX, 10).is_empty());
    }

    #[test]
    fn test_pages_partition_the_collection() {
        for len in [0usize, 1, 7, 8, 9, 16, 17] {
            let items: Vec<usize> = (0..len).collect();
            let pages = total_pages(len, 8);
            let rebuilt: Vec<usize> = (1..=pages)
                .flat_map(|p| paginate(&items, p, 8).to_vec())
                .collect();
            assert_eq!(rebuilt, items, "len {len}");
            assert!(paginate(&items, pages + 1, 8).is_empty());
        }
    }

    #[test]
    fn test_page_reports_no_results_state() {
        let empty: Vec<u8> = Vec::new();
        let page = Page::of(&empty, 1, 10);
        assert!(page.is_no_results());
        assert_eq!(page.total_pages, 0);

        let items: Vec<u8> = (0..12).collect();
        let page = Page::of(&items, 2, 10);
        assert_eq!(page.items, vec![10, 11]);
        assert_eq!(page.total_pages, 2);
        assert!(!page.is_no_results());
    }

    #[test]
    fn test_user_search_covers_username_and_email() {
        let users = vec![User {
            id: 1,
            username: "jdupont".into(),
            password: None,
            email: "jean.dupont@example.fr".into(),
            is_patient: true,
            is_doctor: false,
            name: None,
            specialty: None,
            rating: None,
            patient_count: None,
            last_appointment: None,
            record_count: None,
        }];
        assert_eq!(filter_users(&users, "EXAMPLE.FR").len(), 1);
        assert_eq!(filter_users(&users, "JDup").len(), 1);
        assert!(filter_users(&users, "martin").is_empty());
    }
}
