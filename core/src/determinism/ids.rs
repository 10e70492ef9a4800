use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use ulid::Ulid;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Deterministic finding id: the same rule firing on the same records
/// always produces the same id, so runs over identical input diff clean.
pub fn finding_id(rule_code: &str, affected_record_ids: &[String]) -> String {
    let mut sorted = affected_record_ids.to_vec();
    sorted.sort();
    let combined = format!("{}:{}", rule_code, sorted.join(","));
    let digest = sha256_hex(combined.as_bytes());
    format!("F_{}_{}", rule_code, &digest[..16])
}

/// Deterministic recommendation id, derived from the finding type and
/// the findings it addresses.
pub fn recommendation_id(finding_type: &str, addressed_finding_ids: &[String]) -> String {
    let mut sorted = addressed_finding_ids.to_vec();
    sorted.sort();
    let combined = format!("{}:{}", finding_type, sorted.join(","));
    let digest = sha256_hex(combined.as_bytes());
    format!("REC_{}_{}", finding_type, &digest[..16])
}

/// Analysis id derived from the batch contents and the run instant.
pub fn analysis_id(record_ids: &[String], executed_at: OffsetDateTime) -> String {
    let mut sorted = record_ids.to_vec();
    sorted.sort();
    let combined = format!("{}:{}", executed_at.unix_timestamp(), sorted.join(","));
    let digest = sha256_hex(combined.as_bytes());
    format!("AN_{}", &digest[..32])
}

/// Ad-hoc run label for contexts with no batch to fingerprint.
pub fn run_label_ulid() -> String {
    format!("r_{}", Ulid::new())
}
