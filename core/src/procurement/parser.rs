use super::model::{iso_date, ProcurementCategory, ProcurementMethod, ProcurementRecord};
use crate::determinism::ids::sha256_hex;
use crate::error::{OversightError, OversightResult};
use time::Date;

/// Parse a CSV batch of procurement records.
///
/// This is the validation boundary: anything malformed fails loudly
/// here so the analysis rules never see a half-formed record. Silent
/// exclusion would skew processed counts and the aggregate risk level,
/// so there is no lenient mode.
pub fn parse_records_csv(csv_str: &str) -> OversightResult<Vec<ProcurementRecord>> {
    let mut reader = csv::Reader::from_reader(csv_str.as_bytes());
    let headers = reader.headers()?.clone();

    let col = |name: &str| -> OversightResult<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| OversightError::InvalidInput(format!("missing column {}", name)))
    };

    let idx_record_id = headers.iter().position(|h| h == "record_id");
    let idx_entity_id = col("entity_id")?;
    let idx_entity_name = col("entity_name")?;
    let idx_supplier_id = col("supplier_id")?;
    let idx_supplier_name = col("supplier_name")?;
    let idx_supplier_country = col("supplier_country")?;
    let idx_tender_number = col("tender_number")?;
    let idx_contract_number = col("contract_number")?;
    let idx_description = col("description")?;
    let idx_estimated = col("estimated_value")?;
    let idx_actual = col("actual_value")?;
    let idx_currency = col("currency")?;
    let idx_guarantee = col("performance_guarantee")?;
    let idx_advance = col("advance_payment")?;
    let idx_method = col("procurement_method")?;
    let idx_category = col("category")?;
    let idx_bidders = col("bidders_count")?;
    let idx_local_bidders = col("local_bidders_count")?;
    let idx_publication = col("tender_publication_date")?;
    let idx_closing = col("tender_closing_date")?;
    let idx_award = col("contract_award_date")?;
    let idx_start = col("contract_start_date")?;
    let idx_end = col("contract_end_date")?;
    let idx_compliance = col("compliance_score")?;
    let idx_evaluation = col("evaluation_score")?;
    let idx_local_content = col("local_content_percentage")?;
    let idx_sustainability = col("sustainability_score")?;
    let idx_approved_by = col("approved_by")?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = result?;
        let field = |i: usize| line.get(i).unwrap_or("").trim();

        let number = |i: usize, name: &str| -> OversightResult<f64> {
            field(i).parse::<f64>().map_err(|_| {
                OversightError::InvalidInput(format!("row {}: invalid {}", row, name))
            })
        };
        let count = |i: usize, name: &str| -> OversightResult<u32> {
            field(i).parse::<u32>().map_err(|_| {
                OversightError::InvalidInput(format!("row {}: invalid {}", row, name))
            })
        };
        let parse_date = |i: usize, name: &str| -> OversightResult<Date> {
            Date::parse(field(i), iso_date::FORMAT).map_err(|_| {
                OversightError::Date(format!("row {}: invalid {} '{}'", row, name, field(i)))
            })
        };

        let entity_id = field(idx_entity_id).to_string();
        let tender_number = field(idx_tender_number).to_string();
        if entity_id.is_empty() || tender_number.is_empty() {
            return Err(OversightError::InvalidInput(format!(
                "row {}: entity_id and tender_number are required",
                row
            )));
        }

        let method = ProcurementMethod::parse(field(idx_method)).ok_or_else(|| {
            OversightError::InvalidInput(format!(
                "row {}: unknown procurement_method '{}'",
                row,
                field(idx_method)
            ))
        })?;
        let category = ProcurementCategory::parse(field(idx_category)).ok_or_else(|| {
            OversightError::InvalidInput(format!(
                "row {}: unknown category '{}'",
                row,
                field(idx_category)
            ))
        })?;

        let publication = parse_date(idx_publication, "tender_publication_date")?;
        let closing = parse_date(idx_closing, "tender_closing_date")?;
        let award = parse_date(idx_award, "contract_award_date")?;
        let start = parse_date(idx_start, "contract_start_date")?;
        let end = parse_date(idx_end, "contract_end_date")?;

        let local_content = number(idx_local_content, "local_content_percentage")?;

        let record_id = match idx_record_id.map(|i| field(i).to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => generate_record_id(&entity_id, &tender_number, award),
        };

        let record = ProcurementRecord {
            record_id,
            entity_id,
            entity_name: field(idx_entity_name).to_string(),
            supplier_id: field(idx_supplier_id).to_string(),
            supplier_name: field(idx_supplier_name).to_string(),
            supplier_country: field(idx_supplier_country).to_string(),
            tender_number,
            contract_number: field(idx_contract_number).to_string(),
            description: field(idx_description).to_string(),
            estimated_value: number(idx_estimated, "estimated_value")?,
            actual_value: number(idx_actual, "actual_value")?,
            currency: field(idx_currency).to_string(),
            performance_guarantee: number(idx_guarantee, "performance_guarantee")?,
            advance_payment: number(idx_advance, "advance_payment")?,
            method,
            category,
            bidders_count: count(idx_bidders, "bidders_count")?,
            local_bidders_count: count(idx_local_bidders, "local_bidders_count")?,
            tender_publication_date: publication,
            tender_closing_date: closing,
            contract_award_date: award,
            contract_start_date: start,
            contract_end_date: end,
            compliance_score: number(idx_compliance, "compliance_score")?,
            evaluation_score: number(idx_evaluation, "evaluation_score")?,
            local_content_percentage: local_content,
            sustainability_score: number(idx_sustainability, "sustainability_score")?,
            approved_by: field(idx_approved_by).to_string(),
        };

        validate_record(&record, row)?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(OversightError::InvalidInput(
            "no procurement records found".to_string(),
        ));
    }
    ensure_unique_record_ids(&records)?;

    Ok(records)
}

/// Parse a JSON array of records, applying the same boundary checks.
pub fn parse_records_json(json_str: &str) -> OversightResult<Vec<ProcurementRecord>> {
    let records: Vec<ProcurementRecord> = serde_json::from_str(json_str)?;
    if records.is_empty() {
        return Err(OversightError::InvalidInput(
            "no procurement records found".to_string(),
        ));
    }
    for (row, record) in records.iter().enumerate() {
        validate_record(record, row)?;
    }
    ensure_unique_record_ids(&records)?;
    Ok(records)
}

// Record ids are identity everywhere downstream: supplier attribution
// joins findings to suppliers through them, and finding ids hash over
// them. A duplicated id would silently attribute one supplier's
// finding to another, so a batch with duplicates is rejected whole.
fn ensure_unique_record_ids(records: &[ProcurementRecord]) -> OversightResult<()> {
    let mut seen = std::collections::BTreeSet::new();
    for (row, record) in records.iter().enumerate() {
        if !seen.insert(record.record_id.as_str()) {
            return Err(OversightError::InvalidInput(format!(
                "row {}: duplicate record_id '{}'",
                row, record.record_id
            )));
        }
    }
    Ok(())
}

fn validate_record(record: &ProcurementRecord, row: usize) -> OversightResult<()> {
    // NaN and infinity parse as valid f64 but poison every downstream
    // average and ratio, so they are rejected at the boundary.
    let numeric_fields = [
        ("estimated_value", record.estimated_value),
        ("actual_value", record.actual_value),
        ("performance_guarantee", record.performance_guarantee),
        ("advance_payment", record.advance_payment),
        ("compliance_score", record.compliance_score),
        ("evaluation_score", record.evaluation_score),
        ("local_content_percentage", record.local_content_percentage),
        ("sustainability_score", record.sustainability_score),
    ];
    for (name, value) in numeric_fields {
        if !value.is_finite() {
            return Err(OversightError::InvalidInput(format!(
                "row {}: {} must be a finite number, got {}",
                row, name, value
            )));
        }
    }
    // Overrun ratios divide by the estimate, so zero is as bad as negative.
    if record.estimated_value <= 0.0 {
        return Err(OversightError::InvalidInput(format!(
            "row {}: estimated_value must be positive, got {}",
            row, record.estimated_value
        )));
    }
    if !(0.0..=100.0).contains(&record.local_content_percentage) {
        return Err(OversightError::InvalidInput(format!(
            "row {}: local_content_percentage must be 0-100, got {}",
            row, record.local_content_percentage
        )));
    }
    if record.actual_value < 0.0 {
        return Err(OversightError::InvalidInput(format!(
            "row {}: actual_value must be non-negative",
            row
        )));
    }
    if record.local_bidders_count > record.bidders_count {
        return Err(OversightError::InvalidInput(format!(
            "row {}: local_bidders_count exceeds bidders_count",
            row
        )));
    }

    let ordered = record.tender_publication_date <= record.tender_closing_date
        && record.tender_closing_date <= record.contract_award_date
        && record.contract_award_date <= record.contract_start_date
        && record.contract_start_date <= record.contract_end_date;
    if !ordered {
        return Err(OversightError::Date(format!(
            "row {}: dates out of order (publication <= closing <= award <= start <= end)",
            row
        )));
    }
    Ok(())
}

/// Deterministic fallback id for rows reported without one.
fn generate_record_id(entity_id: &str, tender_number: &str, award: Date) -> String {
    let combined = format!("{}:{}:{}", entity_id, tender_number, award);
    let digest = sha256_hex(combined.as_bytes());
    format!("GH_{}_{}", entity_id.replace(' ', "_"), &digest[..8])
}
