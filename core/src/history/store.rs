use crate::analysis::model::{AnalysisResult, RiskLevel};
use crate::analysis::risk_profile::SupplierRiskProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Summary of one completed analysis run, as kept in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub analysis_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub processed_records: usize,
    pub issues_identified: usize,
    pub finding_ids: Vec<String>,
}

impl From<&AnalysisResult> for AnalysisRun {
    fn from(result: &AnalysisResult) -> Self {
        AnalysisRun {
            analysis_id: result.analysis_id.clone(),
            executed_at: result.executed_at,
            risk_level: result.risk_level,
            confidence: result.confidence,
            processed_records: result.processed_records,
            issues_identified: result.issues_identified,
            finding_ids: result.findings.iter().map(|f| f.finding_id.clone()).collect(),
        }
    }
}

/// Caller-owned persistence for runs and supplier profiles. The engine
/// never touches a store; whoever drives it decides what to keep and
/// is responsible for serializing concurrent writers.
pub trait AnalysisStore {
    fn append_run(&mut self, run: AnalysisRun);
    /// Replace each supplier's profile wholesale. Profiles are
    /// overwritten per run, never merged across runs.
    fn upsert_profiles(&mut self, profiles: BTreeMap<String, SupplierRiskProfile>);
    fn history(&self) -> &[AnalysisRun];
    fn profile(&self, supplier_name: &str) -> Option<&SupplierRiskProfile>;
    fn profiles(&self) -> &BTreeMap<String, SupplierRiskProfile>;
}

/// Process-lifetime store: history grows without bound and is lost on
/// restart. Pair with `HistoryLog` when runs must survive the process.
#[derive(Default)]
pub struct InMemoryStore {
    runs: Vec<AnalysisRun>,
    profiles: BTreeMap<String, SupplierRiskProfile>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisStore for InMemoryStore {
    fn append_run(&mut self, run: AnalysisRun) {
        self.runs.push(run);
    }

    fn upsert_profiles(&mut self, profiles: BTreeMap<String, SupplierRiskProfile>) {
        for (supplier, profile) in profiles {
            self.profiles.insert(supplier, profile);
        }
    }

    fn history(&self) -> &[AnalysisRun] {
        &self.runs
    }

    fn profile(&self, supplier_name: &str) -> Option<&SupplierRiskProfile> {
        self.profiles.get(supplier_name)
    }

    fn profiles(&self) -> &BTreeMap<String, SupplierRiskProfile> {
        &self.profiles
    }
}
