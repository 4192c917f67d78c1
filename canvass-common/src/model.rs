//! Address record types
//!
//! `AddressRecord` mirrors the upstream JSON payload: every key is optional
//! and numeric-looking keys may arrive as numbers or strings. `Address` is
//! the normalized form the dashboard works with; its typed fields carry the
//! guarantees the normalizer establishes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Raw address record as found in a source payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AddressRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub parcel_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub owner1: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub owner2: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub site_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub site_cityzip: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub property_use: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub str_num: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub str_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub str_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub str_zip: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub hx_yn: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub precinct: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub building_name: Option<String>,
}

/// Collapsed property-use classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyUse {
    Residential,
    Business,
}

impl PropertyUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyUse::Residential => "Residential",
            PropertyUse::Business => "Business",
        }
    }
}

impl fmt::Display for PropertyUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse geographic bucket assigned per precinct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    North,
    South,
    East,
    West,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::North, Section::South, Section::East, Section::West];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::North => "North",
            Section::South => "South",
            Section::East => "East",
            Section::West => "West",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Ok(Section::North),
            "south" => Ok(Section::South),
            "east" => Ok(Section::East),
            "west" => Ok(Section::West),
            other => Err(crate::Error::InvalidInput(format!("Unknown section: {}", other))),
        }
    }
}

/// Volunteer's assessment of a resident's voting intention
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    StrongSupport,
    LeaningSupport,
    #[default]
    Undecided,
    LeaningAgainst,
    StrongAgainst,
    NotHome,
}

impl SupportLevel {
    pub const ALL: [SupportLevel; 6] = [
        SupportLevel::StrongSupport,
        SupportLevel::LeaningSupport,
        SupportLevel::Undecided,
        SupportLevel::LeaningAgainst,
        SupportLevel::StrongAgainst,
        SupportLevel::NotHome,
    ];

    /// Human-readable label shown next to the radio buttons
    pub fn label(&self) -> &'static str {
        match self {
            SupportLevel::StrongSupport => "Strong Support",
            SupportLevel::LeaningSupport => "Leaning Support",
            SupportLevel::Undecided => "Undecided",
            SupportLevel::LeaningAgainst => "Leaning Against",
            SupportLevel::StrongAgainst => "Strong Against",
            SupportLevel::NotHome => "Not Home",
        }
    }
}

/// Normalized address record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub parcel_number: String,
    pub owner1: String,
    pub owner2: Option<String>,
    /// Formatted street line, e.g. `315 TAYLOR AVE N`
    pub site_address: String,
    /// City/state/ZIP line, e.g. `ST PETERSBURG, FL 33705`
    pub site_cityzip: String,
    pub street_number: Option<u32>,
    pub street_name: String,
    pub unit: Option<String>,
    pub zip: String,
    pub homestead: bool,
    pub property_use: PropertyUse,
    pub precinct: String,
    pub section: Section,
    pub lat: f64,
    pub lon: f64,
    pub building_name: Option<String>,
    pub multi_family: bool,
}

impl Address {
    /// Identifier used to key visited flags and interactions
    pub fn id(&self) -> &str {
        &self.parcel_number
    }

    /// Owner names joined for display and search
    pub fn owners(&self) -> String {
        match &self.owner2 {
            Some(second) => format!("{} & {}", self.owner1, second),
            None => self.owner1.clone(),
        }
    }

    /// Case-insensitive substring match against owners, street line and city/ZIP.
    ///
    /// `needle` must already be lower-cased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.owner1.to_lowercase().contains(needle)
            || self
                .owner2
                .as_deref()
                .is_some_and(|o| o.to_lowercase().contains(needle))
            || self.site_address.to_lowercase().contains(needle)
            || self.site_cityzip.to_lowercase().contains(needle)
    }
}

/// Serde helpers accepting the loosely typed values found in address payloads
mod lenient {
    use super::*;

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => leading_number(&s),
            _ => None,
        })
    }

    pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite()))
    }

    pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "Y" | "YES" | "TRUE" | "1" => Some(true),
                "N" | "NO" | "FALSE" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        })
    }

    /// `"315"` → 315, `"1201A"` → 1201, `"A12"` → None
    pub(super) fn leading_number(s: &str) -> Option<u32> {
        let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accepts_numbers_and_strings() {
        let a: AddressRecord = serde_json::from_value(json!({
            "PARCEL_NUMBER": 12345,
            "STR_NUM": "315",
            "STR_ZIP": 33705,
            "PRECINCT": 106,
            "LAT": "27.78",
            "HX_YN": "Y"
        }))
        .unwrap();

        assert_eq!(a.parcel_number.as_deref(), Some("12345"));
        assert_eq!(a.str_num, Some(315));
        assert_eq!(a.str_zip.as_deref(), Some("33705"));
        assert_eq!(a.precinct.as_deref(), Some("106"));
        assert_eq!(a.lat, Some(27.78));
        assert_eq!(a.hx_yn, Some(true));
    }

    #[test]
    fn test_record_blank_and_null_are_absent() {
        let a: AddressRecord = serde_json::from_value(json!({
            "OWNER1": "   ",
            "PRECINCT": null,
            "STR_NUM": "N/A",
            "LAT": "not a number",
            "UNRELATED_KEY": [1, 2, 3]
        }))
        .unwrap();

        assert_eq!(a, AddressRecord::default());
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(lenient::leading_number("1201A"), Some(1201));
        assert_eq!(lenient::leading_number(" 42 "), Some(42));
        assert_eq!(lenient::leading_number("A12"), None);
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("south".parse::<Section>().unwrap(), Section::South);
        assert_eq!(" WEST ".parse::<Section>().unwrap(), Section::West);
        assert!("Central".parse::<Section>().is_err());
    }

    #[test]
    fn test_support_level_serde_names() {
        let json = serde_json::to_string(&SupportLevel::LeaningSupport).unwrap();
        assert_eq!(json, "\"leaning_support\"");
        let parsed: SupportLevel = serde_json::from_str("\"not_home\"").unwrap();
        assert_eq!(parsed, SupportLevel::NotHome);
    }

    #[test]
    fn test_support_level_defaults_to_undecided() {
        assert_eq!(SupportLevel::default(), SupportLevel::Undecided);
    }
}
