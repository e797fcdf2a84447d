//! Foreign-key display resolution.
//!
//! Entities reference patients and doctors by bare integer ids. Anything that shows a
//! reference goes through [`PartyRef::resolve`], which tries, in order:
//! 1. the display name embedded in the record by the API,
//! 2. a caller-supplied [`NameLookup`],
//! 3. the placeholder `Patient #<id>` / `Doctor #<id>`.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::models::{Appointment, Feedback, MedicalRecord, Reminder, User, UserRole};

/// Which side of a consultation an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyKind {
    Patient,
    Doctor,
}

impl PartyKind {
    pub fn label(&self) -> &'static str {
        match self {
            PartyKind::Patient => "Patient",
            PartyKind::Doctor => "Doctor",
        }
    }
}

/// Resolves display names for party ids.
pub trait NameLookup {
    fn name_of(&self, kind: PartyKind, id: i64) -> Option<&str>;
}

/// A lookup that knows nobody.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl NameLookup for NoLookup {
    fn name_of(&self, _kind: PartyKind, _id: i64) -> Option<&str> {
        None
    }
}

/// Names keyed by party kind and id, usually built from user listings.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    names: HashMap<(PartyKind, i64), String>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: PartyKind, id: i64, name: impl Into<String>) {
        self.names.insert((kind, id), name.into());
    }

    /// Registers every patient and doctor in `users` under its display name.
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut directory = Self::new();
        for user in users {
            if user.has_role(UserRole::Patient) {
                directory.insert(PartyKind::Patient, user.id, user.display_name());
            }
            if user.has_role(UserRole::Doctor) {
                directory.insert(PartyKind::Doctor, user.id, user.display_name());
            }
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameLookup for Directory {
    fn name_of(&self, kind: PartyKind, id: i64) -> Option<&str> {
        self.names.get(&(kind, id)).map(String::as_str)
    }
}

/// A reference to a patient or doctor with its display name, if one could be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyRef<'a> {
    pub kind: PartyKind,
    pub id: i64,
    name: Option<&'a str>,
}

impl<'a> PartyRef<'a> {
    pub fn resolve<L: NameLookup + ?Sized>(
        kind: PartyKind,
        id: i64,
        embedded: Option<&'a str>,
        lookup: &'a L,
    ) -> Self {
        let name = embedded
            .filter(|n| !n.trim().is_empty())
            .or_else(|| lookup.name_of(kind, id));
        Self { kind, id, name }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }

    /// The display name, or `"<Kind> #<id>"` when none is known.
    pub fn label(&self) -> Cow<'a, str> {
        match self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("{} #{}", self.kind.label(), self.id)),
        }
    }
}

impl std::fmt::Display for PartyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Fills absent embedded display names from a lookup. Names already present are kept.
pub trait JoinNames {
    fn join_names<L: NameLookup + ?Sized>(&mut self, lookup: &L);
}

fn fill<L: NameLookup + ?Sized>(slot: &mut Option<String>, kind: PartyKind, id: i64, lookup: &L) {
    if slot.is_none() {
        *slot = lookup.name_of(kind, id).map(str::to_owned);
    }
}

impl JoinNames for Appointment {
    fn join_names<L: NameLookup + ?Sized>(&mut self, lookup: &L) {
        fill(&mut self.patient_name, PartyKind::Patient, self.patient, lookup);
        fill(&mut self.doctor_name, PartyKind::Doctor, self.doctor, lookup);
    }
}

impl JoinNames for MedicalRecord {
    fn join_names<L: NameLookup + ?Sized>(&mut self, lookup: &L) {
        fill(&mut self.patient_name, PartyKind::Patient, self.patient, lookup);
    }
}

impl JoinNames for Reminder {
    fn join_names<L: NameLookup + ?Sized>(&mut self, lookup: &L) {
        fill(&mut self.patient_name, PartyKind::Patient, self.patient, lookup);
    }
}

impl JoinNames for Feedback {
    fn join_names<L: NameLookup + ?Sized>(&mut self, lookup: &L) {
        fill(&mut self.patient_name, PartyKind::Patient, self.patient, lookup);
        fill(&mut self.doctor_name, PartyKind::Doctor, self.doctor, lookup);
    }
}
