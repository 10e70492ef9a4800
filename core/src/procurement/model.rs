use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcurementMethod {
    OpenTender,
    RestrictedTender,
    DirectProcurement,
    SoleSourcing,
    TwoStageTender,
}

impl ProcurementMethod {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "OPEN_TENDER" => Some(Self::OpenTender),
            "RESTRICTED_TENDER" => Some(Self::RestrictedTender),
            "DIRECT_PROCUREMENT" => Some(Self::DirectProcurement),
            "SOLE_SOURCING" => Some(Self::SoleSourcing),
            "TWO_STAGE_TENDER" => Some(Self::TwoStageTender),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenTender => "OPEN_TENDER",
            Self::RestrictedTender => "RESTRICTED_TENDER",
            Self::DirectProcurement => "DIRECT_PROCUREMENT",
            Self::SoleSourcing => "SOLE_SOURCING",
            Self::TwoStageTender => "TWO_STAGE_TENDER",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcurementCategory {
    Goods,
    Works,
    Services,
    Consultancy,
}

impl ProcurementCategory {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "GOODS" => Some(Self::Goods),
            "WORKS" => Some(Self::Works),
            "SERVICES" => Some(Self::Services),
            "CONSULTANCY" => Some(Self::Consultancy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goods => "GOODS",
            Self::Works => "WORKS",
            Self::Services => "SERVICES",
            Self::Consultancy => "CONSULTANCY",
        }
    }
}

/// One awarded procurement as reported by an entity.
///
/// Records are validated once at the parser boundary; the analysis
/// rules assume well-formed fields and valid date ordering
/// (publication <= closing <= award <= start <= end).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementRecord {
    pub record_id: String,
    pub entity_id: String,
    pub entity_name: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub supplier_country: String,
    pub tender_number: String,
    pub contract_number: String,
    pub description: String,
    pub estimated_value: f64,
    pub actual_value: f64,
    pub currency: String,
    pub performance_guarantee: f64,
    pub advance_payment: f64,
    pub method: ProcurementMethod,
    pub category: ProcurementCategory,
    pub bidders_count: u32,
    pub local_bidders_count: u32,
    #[serde(with = "iso_date")]
    pub tender_publication_date: Date,
    #[serde(with = "iso_date")]
    pub tender_closing_date: Date,
    #[serde(with = "iso_date")]
    pub contract_award_date: Date,
    #[serde(with = "iso_date")]
    pub contract_start_date: Date,
    #[serde(with = "iso_date")]
    pub contract_end_date: Date,
    pub compliance_score: f64,
    pub evaluation_score: f64,
    pub local_content_percentage: f64,
    pub sustainability_score: f64,
    pub approved_by: String,
}

/// `YYYY-MM-DD` date fields, matching entity reporting templates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::FormatItem;
    use time::macros::format_description;
    use time::Date;

    pub const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
