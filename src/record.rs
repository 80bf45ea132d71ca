use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads any JSON value and falls back to the default when it does not fit
/// the target type, so one malformed optional entity never rejects the file.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings are kept, numbers are rendered as text, anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A list keeps every item that reads as a driver and skips the rest. A
/// single string is a comma separated list of driver names.
fn lenient_drivers<'de, D>(deserializer: D) -> Result<Option<Vec<Driver>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        Value::String(s) => Some(vec![Driver::Text(s.replace(',', " "))]),
        _ => None,
    })
}

/// Any related entity that is only ever shown by its name.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Named {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[cfg(test)]
impl Named {
    pub fn new(name: &str) -> Self {
        Named {
            name: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Vehicle {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Organization", default, deserialize_with = "lenient")]
    pub organization: Option<Named>,
    #[serde(rename = "Department", default, deserialize_with = "lenient")]
    pub department: Option<Named>,
    #[serde(rename = "Contragent", default, deserialize_with = "lenient")]
    pub contragent: Option<Named>,
}

// Drivers show up as plain ids, numbers or full driver objects depending on the export.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Driver {
    Text(String),
    Number(serde_json::Number),
    Entity(Named),
}

impl Driver {
    pub fn as_text(&self) -> Option<String> {
        match self {
            Driver::Text(s) => Some(s.clone()),
            Driver::Number(n) => Some(n.to_string()),
            Driver::Entity(e) => e.name.clone(),
        }
    }
}

/// One row of the vehicle table.
///
/// Every accessor is null safe: a missing nested entity or a missing name
/// yields `None` instead of an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VehicleCode {
    #[serde(default, deserialize_with = "lenient_text")]
    pub code1c: Option<String>,
    #[serde(rename = "Vehicle", default, deserialize_with = "lenient")]
    pub vehicle: Vehicle,
    #[serde(rename = "Aggregate", default, deserialize_with = "lenient")]
    pub aggregate: Option<Named>,
    #[serde(rename = "Drivers", default, deserialize_with = "lenient_drivers")]
    pub drivers: Option<Vec<Driver>>,
}

impl VehicleCode {
    pub fn vehicle_name(&self) -> Option<&str> {
        self.vehicle.name.as_deref()
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.vehicle
            .organization
            .as_ref()
            .and_then(|o| o.name.as_deref())
    }

    pub fn department_name(&self) -> Option<&str> {
        self.vehicle
            .department
            .as_ref()
            .and_then(|d| d.name.as_deref())
    }

    pub fn contragent_name(&self) -> Option<&str> {
        self.vehicle
            .contragent
            .as_ref()
            .and_then(|c| c.name.as_deref())
    }

    pub fn code(&self) -> Option<&str> {
        self.code1c.as_deref()
    }

    pub fn aggregate_name(&self) -> Option<&str> {
        self.aggregate.as_ref().and_then(|a| a.name.as_deref())
    }

    /// Drivers rendered as one space separated string, `None` when there are none.
    pub fn drivers_text(&self) -> Option<String> {
        let drivers = self.drivers.as_ref()?;
        let parts: Vec<String> = drivers.iter().filter_map(Driver::as_text).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

pub fn parse_records(raw: &str) -> Result<Vec<VehicleCode>, serde_json::Error> {
    serde_json::from_str(raw)
}
