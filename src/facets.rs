use std::collections::HashSet;

use crate::filter::FilterField;
use crate::record::VehicleCode;

/// Distinct names offered as choices for the categorical filters. Derived
/// from the full record set, so the choices stay complete whatever the
/// current filter hides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetLists {
    pub organizations: Vec<String>,
    pub departments: Vec<String>,
    pub contragents: Vec<String>,
}

#[derive(Default)]
struct Distinct {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl Distinct {
    fn push(&mut self, value: Option<&str>) {
        match value {
            Some(v) if !v.is_empty() => {
                if self.seen.insert(v.to_string()) {
                    self.values.push(v.to_string());
                }
            }
            _ => {}
        }
    }
}

impl FacetLists {
    pub fn collect(records: &[VehicleCode]) -> Self {
        let mut organizations = Distinct::default();
        let mut departments = Distinct::default();
        let mut contragents = Distinct::default();

        for record in records {
            organizations.push(record.organization_name());
            departments.push(record.department_name());
            contragents.push(record.contragent_name());
        }

        FacetLists {
            organizations: organizations.values,
            departments: departments.values,
            contragents: contragents.values,
        }
    }

    pub fn for_field(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Global => &[],
            FilterField::Organization => &self.organizations,
            FilterField::Department => &self.departments,
            FilterField::Contragent => &self.contragents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;
    use crate::record::Named;

    #[test]
    fn dedups_in_first_occurrence_order() {
        let records = vec![
            record("1", Some("A")),
            record("2", None),
            record("3", Some("A")),
            record("4", Some("B")),
        ];
        let facets = FacetLists::collect(&records);
        assert_eq!(facets.organizations, vec!["A", "B"]);
        assert!(facets.departments.is_empty());
        assert!(facets.contragents.is_empty());
    }

    #[test]
    fn skips_missing_and_empty_names() {
        let mut empty_name = record("1", Some(""));
        empty_name.vehicle.department = Some(Named { name: None });
        let mut with_dept = record("2", Some("Z"));
        with_dept.vehicle.department = Some(Named::new("Ops"));
        with_dept.vehicle.contragent = Some(Named::new("Globex"));

        let facets = FacetLists::collect(&[empty_name, with_dept]);
        assert_eq!(facets.organizations, vec!["Z"]);
        assert_eq!(facets.departments, vec!["Ops"]);
        assert_eq!(facets.contragents, vec!["Globex"]);
        assert_eq!(facets.for_field(FilterField::Department), ["Ops"]);
        assert!(facets.for_field(FilterField::Global).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_lists() {
        assert_eq!(FacetLists::collect(&[]), FacetLists::default());
    }
}
