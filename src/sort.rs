use std::cmp::Ordering;

use crate::record::VehicleCode;

/// The seven display columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Vehicle,
    Organization,
    Department,
    Contragent,
    Code,
    Aggregate,
    Drivers,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Vehicle,
        Column::Organization,
        Column::Department,
        Column::Contragent,
        Column::Code,
        Column::Aggregate,
        Column::Drivers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::Vehicle => "Vehicle",
            Column::Organization => "Organization",
            Column::Department => "Department",
            Column::Contragent => "Counterparty",
            Column::Code => "Code",
            Column::Aggregate => "Aggregate",
            Column::Drivers => "Drivers",
        }
    }

    pub fn at(idx: usize) -> Option<Column> {
        Column::ALL.get(idx).copied()
    }
}

/// Value a record is ordered by for the given column, `None` if any part of
/// the nested path is missing.
pub fn sort_key(record: &VehicleCode, column: Column) -> Option<String> {
    match column {
        Column::Vehicle => record.vehicle_name().map(str::to_string),
        Column::Organization => record.organization_name().map(str::to_string),
        Column::Department => record.department_name().map(str::to_string),
        Column::Contragent => record.contragent_name().map(str::to_string),
        Column::Aggregate => record.aggregate_name().map(str::to_string),
        Column::Code => record.code().map(str::to_string),
        Column::Drivers => record.drivers_text(),
    }
}

/// Text shown in a table cell, empty for missing values.
pub fn cell_text(record: &VehicleCode, column: Column) -> String {
    sort_key(record, column).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: Direction,
}

impl SortState {
    /// Next state after activating `column`: off -> ascending -> descending -> off.
    /// Activating another column starts over at ascending.
    pub fn cycle(current: Option<SortState>, column: Column) -> Option<SortState> {
        match current {
            Some(s) if s.column == column => match s.direction {
                Direction::Ascending => Some(SortState {
                    column,
                    direction: Direction::Descending,
                }),
                Direction::Descending => None,
            },
            _ => Some(SortState {
                column,
                direction: Direction::Ascending,
            }),
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self.direction {
            Direction::Ascending => "▲",
            Direction::Descending => "▼",
        }
    }
}

/// Missing keys come first, then keys that parse as finite numbers (in
/// numeric order), then everything else as strings.
pub fn compare_keys(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (as_number(a), as_number(b)) {
            (Some(a_float), Some(b_float)) => a_float.total_cmp(&b_float).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
    }
}

fn as_number(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Stable sort of `rows` (indices into `records`).
pub fn sort_rows(records: &[VehicleCode], rows: &mut [usize], sort: SortState) {
    let mut keyed: Vec<(Option<String>, usize)> = rows
        .iter()
        .map(|&idx| (sort_key(&records[idx], sort.column), idx))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = compare_keys(a.as_deref(), b.as_deref());
        match sort.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });

    for (slot, (_, idx)) in rows.iter_mut().zip(keyed) {
        *slot = idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;
    use crate::record::{Driver, Named};

    #[test]
    fn nested_columns_resolve_names() {
        let mut r = record("Truck1", Some("Acme"));
        r.vehicle.department = Some(Named::new("Ops"));
        r.vehicle.contragent = Some(Named::new("Globex"));
        r.aggregate = Some(Named::new("Trailer"));
        assert_eq!(sort_key(&r, Column::Vehicle).as_deref(), Some("Truck1"));
        assert_eq!(sort_key(&r, Column::Organization).as_deref(), Some("Acme"));
        assert_eq!(sort_key(&r, Column::Department).as_deref(), Some("Ops"));
        assert_eq!(sort_key(&r, Column::Contragent).as_deref(), Some("Globex"));
        assert_eq!(sort_key(&r, Column::Aggregate).as_deref(), Some("Trailer"));
    }

    #[test]
    fn flat_columns_resolve_fields() {
        let mut r = record("Truck1", None);
        r.drivers = Some(vec![
            Driver::Text("Ann".to_string()),
            Driver::Entity(Named::new("Bob")),
        ]);
        assert_eq!(sort_key(&r, Column::Code).as_deref(), Some("C-Truck1"));
        assert_eq!(sort_key(&r, Column::Drivers).as_deref(), Some("Ann Bob"));
    }

    #[test]
    fn missing_nesting_is_none() {
        let r = record("Truck1", None);
        assert_eq!(sort_key(&r, Column::Organization), None);
        assert_eq!(sort_key(&r, Column::Department), None);
        assert_eq!(sort_key(&r, Column::Aggregate), None);
        assert_eq!(sort_key(&r, Column::Drivers), None);
    }

    #[test]
    fn cycle_goes_asc_desc_off() {
        let asc = SortState::cycle(None, Column::Code);
        assert_eq!(asc.map(|s| s.direction), Some(Direction::Ascending));
        let desc = SortState::cycle(asc, Column::Code);
        assert_eq!(desc.map(|s| s.direction), Some(Direction::Descending));
        assert_eq!(SortState::cycle(desc, Column::Code), None);

        let other = SortState::cycle(desc, Column::Vehicle);
        assert_eq!(
            other,
            Some(SortState {
                column: Column::Vehicle,
                direction: Direction::Ascending
            })
        );
    }

    #[test]
    fn compare_orders_missing_first_and_numbers_numerically() {
        assert_eq!(compare_keys(None, Some("a")), Ordering::Less);
        assert_eq!(compare_keys(Some("a"), None), Ordering::Greater);
        assert_eq!(compare_keys(Some("9"), Some("10")), Ordering::Less);
        assert_eq!(compare_keys(Some("b"), Some("a")), Ordering::Greater);
    }

    #[test]
    fn numbers_sort_before_text() {
        assert_eq!(compare_keys(Some("10"), Some("1a")), Ordering::Less);
        assert_eq!(compare_keys(Some("1a"), Some("9")), Ordering::Greater);
        assert_eq!(compare_keys(Some("NaN"), Some("7")), Ordering::Greater);
        assert_eq!(compare_keys(Some("inf"), Some("7")), Ordering::Greater);
        assert_eq!(compare_keys(Some("7"), Some(" 7")), Ordering::Greater);
    }

    #[test]
    fn mixed_numeric_and_text_codes_sort_totally() {
        let records: Vec<VehicleCode> = (0..64)
            .map(|i| {
                let mut r = record(&format!("V{i}"), None);
                let n = (i * 37) % 23;
                r.code1c = Some(match i % 4 {
                    0 => format!("{n}x"),
                    1 => "NaN".to_string(),
                    _ => format!("{n}"),
                });
                r
            })
            .collect();
        for direction in [Direction::Ascending, Direction::Descending] {
            let mut rows: Vec<usize> = (0..records.len()).collect();
            sort_rows(
                &records,
                &mut rows,
                SortState {
                    column: Column::Code,
                    direction,
                },
            );
            let keys: Vec<Option<&str>> = rows.iter().map(|&i| records[i].code()).collect();
            for pair in keys.windows(2) {
                let ord = compare_keys(pair[0], pair[1]);
                match direction {
                    Direction::Ascending => assert_ne!(ord, Ordering::Greater),
                    Direction::Descending => assert_ne!(ord, Ordering::Less),
                }
            }
        }

        let mut rows: Vec<usize> = (0..records.len()).collect();
        sort_rows(
            &records,
            &mut rows,
            SortState {
                column: Column::Code,
                direction: Direction::Ascending,
            },
        );
        let is_text = |i: usize| records[i].code().is_some_and(|c| as_number(c).is_none());
        let first_text = rows.iter().position(|&i| is_text(i)).unwrap();
        assert!(first_text > 0);
        assert!(rows[first_text..].iter().all(|&i| is_text(i)));
    }

    #[test]
    fn sort_is_stable_and_reversible() {
        let records = vec![
            record("B", Some("Acme")),
            record("A", None),
            record("C", Some("Acme")),
            record("D", Some("Zenith")),
        ];
        let mut rows: Vec<usize> = (0..records.len()).collect();
        sort_rows(
            &records,
            &mut rows,
            SortState {
                column: Column::Organization,
                direction: Direction::Ascending,
            },
        );
        assert_eq!(rows, vec![1, 0, 2, 3]);

        let mut rows: Vec<usize> = (0..records.len()).collect();
        sort_rows(
            &records,
            &mut rows,
            SortState {
                column: Column::Organization,
                direction: Direction::Descending,
            },
        );
        assert_eq!(rows, vec![3, 0, 2, 1]);
    }

    #[test]
    fn columns_are_in_display_order() {
        assert_eq!(Column::ALL.len(), 7);
        assert_eq!(Column::at(0), Some(Column::Vehicle));
        assert_eq!(Column::at(6), Some(Column::Drivers));
        assert_eq!(Column::at(7), None);
    }
}
