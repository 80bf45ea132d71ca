use crate::record::VehicleCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Global,
    Organization,
    Department,
    Contragent,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Global,
        FilterField::Organization,
        FilterField::Department,
        FilterField::Contragent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Global => "Search",
            FilterField::Organization => "Organization",
            FilterField::Department => "Department",
            FilterField::Contragent => "Counterparty",
        }
    }
}

/// Snapshot of the four filter inputs. Never patched in place by the view:
/// a change to one field produces a new value that replaces the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub global: String,
    pub organization: String,
    pub department: String,
    pub contragent: String,
}

impl FilterState {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Global => &self.global,
            FilterField::Organization => &self.organization,
            FilterField::Department => &self.department,
            FilterField::Contragent => &self.contragent,
        }
    }

    pub fn with(&self, field: FilterField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            FilterField::Global => next.global = value,
            FilterField::Organization => next.organization = value,
            FilterField::Department => next.department = value,
            FilterField::Contragent => next.contragent = value,
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        FilterField::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

/// An empty criterion matches anything, an absent value matches nothing.
/// Otherwise the trimmed value must contain the criterion, ignoring case.
pub fn text_match(criterion: &str, value: Option<&str>) -> bool {
    if criterion.is_empty() {
        return true;
    }
    match value {
        None | Some("") => false,
        Some(v) => v
            .trim()
            .to_lowercase()
            .contains(&criterion.to_lowercase()),
    }
}

/// Every searchable field of a record glued together, absent parts skipped.
pub fn search_text(record: &VehicleCode) -> String {
    let mut text = String::new();
    for part in [
        record.vehicle_name(),
        record.organization_name(),
        record.department_name(),
        record.contragent_name(),
        record.code(),
        record.aggregate_name(),
    ]
    .into_iter()
    .flatten()
    {
        text.push_str(part);
    }
    if let Some(drivers) = record.drivers_text() {
        text.push_str(&drivers);
    }
    text
}

pub fn matches(record: &VehicleCode, filter: &FilterState) -> bool {
    if !filter.global.is_empty() && !text_match(&filter.global, Some(&search_text(record))) {
        return false;
    }
    text_match(&filter.organization, record.organization_name())
        && text_match(&filter.department, record.department_name())
        && text_match(&filter.contragent, record.contragent_name())
}
