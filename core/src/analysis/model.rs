use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Ordered severity scale; derived ordering follows declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    ComplianceViolation,
    ConflictOfInterest,
    DuplicateProcurement,
    BudgetAnomaly,
    TimelineViolation,
    LocalContentShortfall,
}

impl FindingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComplianceViolation => "COMPLIANCE_VIOLATION",
            Self::ConflictOfInterest => "CONFLICT_OF_INTEREST",
            Self::DuplicateProcurement => "DUPLICATE_PROCUREMENT",
            Self::BudgetAnomaly => "BUDGET_ANOMALY",
            Self::TimelineViolation => "TIMELINE_VIOLATION",
            Self::LocalContentShortfall => "LOCAL_CONTENT_SHORTFALL",
        }
    }
}

/// The specific rule family that produced a finding. Several rules
/// share a finding type; the code keeps the sub-triggers apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCode {
    BudgetOverrun,
    LocalContentShortfall,
    InappropriateMethod,
    AwardDelay,
    SupplierConcentration,
    RapidSuccessiveAwards,
    DuplicateProcurement,
    HighValueOversight,
    SingleBidder,
}

impl RuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetOverrun => "BUDGET_OVERRUN",
            Self::LocalContentShortfall => "LOCAL_CONTENT_SHORTFALL",
            Self::InappropriateMethod => "INAPPROPRIATE_METHOD",
            Self::AwardDelay => "AWARD_DELAY",
            Self::SupplierConcentration => "SUPPLIER_CONCENTRATION",
            Self::RapidSuccessiveAwards => "RAPID_SUCCESSIVE_AWARDS",
            Self::DuplicateProcurement => "DUPLICATE_PROCUREMENT",
            Self::HighValueOversight => "HIGH_VALUE_OVERSIGHT",
            Self::SingleBidder => "SINGLE_BIDDER",
        }
    }

    pub fn finding_type(&self) -> FindingType {
        match self {
            Self::BudgetOverrun => FindingType::BudgetAnomaly,
            Self::LocalContentShortfall => FindingType::LocalContentShortfall,
            Self::InappropriateMethod => FindingType::ComplianceViolation,
            Self::AwardDelay => FindingType::TimelineViolation,
            Self::SupplierConcentration => FindingType::ConflictOfInterest,
            Self::RapidSuccessiveAwards => FindingType::ConflictOfInterest,
            Self::DuplicateProcurement => FindingType::DuplicateProcurement,
            Self::HighValueOversight => FindingType::ComplianceViolation,
            Self::SingleBidder => FindingType::ComplianceViolation,
        }
    }
}

/// One detected issue instance produced by a single rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFinding {
    pub finding_id: String,
    pub rule: RuleCode,
    pub finding_type: FindingType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub affected_records: Vec<String>,
    pub affected_entities: Vec<String>,
    pub affected_individuals: Vec<String>,
    /// Monetary impact or exposure; 0.0 for non-monetary findings.
    pub financial_impact: f64,
    pub regulatory_breach: String,
    /// Fixed per rule family, not computed from the data distribution.
    pub confidence: f64,
    /// Time of the analysis run, not of the underlying event.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_date: OffsetDateTime,
}

/// One remediation suggestion per distinct finding type in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecommendation {
    pub recommendation_id: String,
    pub finding_type: FindingType,
    pub priority: Severity,
    pub actions: Vec<String>,
    pub responsible_party: String,
    pub timeline: String,
    /// Ids of the findings this recommendation addresses.
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
    pub findings: Vec<AgentFinding>,
    pub recommendations: Vec<AgentRecommendation>,
    pub risk_level: RiskLevel,
    /// Mean finding confidence; exactly 1.0 when there are no findings.
    /// "No findings" and "perfect confidence" are distinct notions that
    /// happen to share a value here; callers must check
    /// `issues_identified` before reading anything into it.
    pub confidence: f64,
    pub processed_records: usize,
    pub issues_identified: usize,
}
