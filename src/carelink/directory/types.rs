use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Doctors,
    Labs,
    Ambulances,
    Pharmacies,
    Clinics,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Doctors,
        Self::Labs,
        Self::Ambulances,
        Self::Pharmacies,
        Self::Clinics,
    ];

    /// Collection name, used both as the path segment and the response key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Labs => "labs",
            Self::Ambulances => "ambulances",
            Self::Pharmacies => "pharmacies",
            Self::Clinics => "clinics",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "doctor" | "doctors" => Ok(Self::Doctors),
            "lab" | "labs" | "pathology" => Ok(Self::Labs),
            "ambulance" | "ambulances" => Ok(Self::Ambulances),
            "pharmacy" | "pharmacies" => Ok(Self::Pharmacies),
            "clinic" | "clinics" => Ok(Self::Clinics),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub search: Option<String>,
    pub city: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchFilters {
    /// Query pairs with blank values dropped.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        [
            ("search", text(&self.search)),
            ("city", text(&self.city)),
            ("page", self.page.map(|page| page.to_string())),
            ("limit", self.limit.map(|limit| limit.to_string())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }
}

/// One directory entry. The backend schema differs per category, so the raw
/// fields are kept and summarised on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(Map<String, Value>);

impl Listing {
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.first_text(&["_id", "id"])
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.first_text(&["name", "title", "labName", "clinicName", "pharmacyName"])
            .unwrap_or_else(|| "(unnamed)".to_string())
    }

    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.first_text(&["city", "address", "location", "area"])
    }

    #[must_use]
    pub fn phone(&self) -> Option<String> {
        self.first_text(&["phone", "contact", "mobile", "phoneNumber"])
    }

    #[must_use]
    pub fn detail(&self) -> Option<String> {
        self.first_text(&["specialization", "speciality", "specialty", "type", "services"])
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(alias = "title", alias = "label")]
    pub name: String,
    #[serde(default, rename = "type", alias = "category")]
    pub kind: Option<String>,
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parsing_accepts_singular_and_plural() {
        assert_eq!("Doctor".parse::<Category>(), Ok(Category::Doctors));
        assert_eq!("pathology".parse::<Category>(), Ok(Category::Labs));
        assert_eq!(" pharmacies ".parse::<Category>(), Ok(Category::Pharmacies));
        assert!("hospital".parse::<Category>().is_err());
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn filters_drop_blank_values() {
        let filters = SearchFilters {
            search: Some("  ".to_string()),
            city: Some(" Pune ".to_string()),
            page: Some(2),
            limit: None,
        };
        assert_eq!(
            filters.to_query(),
            vec![("city", "Pune".to_string()), ("page", "2".to_string())]
        );
        assert!(SearchFilters::default().to_query().is_empty());
    }

    #[test]
    fn listing_summary_fields() {
        let listing = Listing::from_value(json!({
            "_id": "65f",
            "labName": "City Diagnostics",
            "address": "MG Road",
            "contact": 9876543210u64
        }))
        .unwrap();
        assert_eq!(listing.id().as_deref(), Some("65f"));
        assert_eq!(listing.name(), "City Diagnostics");
        assert_eq!(listing.location().as_deref(), Some("MG Road"));
        assert_eq!(listing.phone().as_deref(), Some("9876543210"));
        assert_eq!(listing.detail(), None);
    }

    #[test]
    fn listing_requires_object() {
        assert!(Listing::from_value(json!("text")).is_none());
        assert_eq!(Listing::from_value(json!({})).unwrap().name(), "(unnamed)");
    }

    #[test]
    fn suggestion_aliases() {
        let suggestion: Suggestion =
            serde_json::from_value(json!({ "title": "Cardiology", "category": "doctors", "_id": "x1" }))
                .unwrap();
        assert_eq!(suggestion.name, "Cardiology");
        assert_eq!(suggestion.kind.as_deref(), Some("doctors"));
        assert_eq!(suggestion.id.as_deref(), Some("x1"));
    }
}
