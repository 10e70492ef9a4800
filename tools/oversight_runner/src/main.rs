use oversight_core::analysis::engine::ComplianceAnalysisEngine;
use oversight_core::analysis::model::RiskLevel;
use oversight_core::determinism::ids::run_label_ulid;
use oversight_core::analysis::risk_profile::build_profiles;
use oversight_core::history::log::HistoryLog;
use oversight_core::history::store::AnalysisRun;
use oversight_core::procurement::parser::parse_records_csv;
use oversight_core::report::render::{render_findings_csv, render_oversight_packet};

fn main() {
    // oversight_runner <records.csv> [history.jsonl]
    //
    // Runs the compliance analysis over a reported batch, self-checks
    // that a second run over the same batch yields identical finding
    // ids, optionally appends the run to a hash-chained history log,
    // and exits non-zero on a CRITICAL aggregate.
    let mut args = std::env::args().skip(1);
    let records_path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: oversight_runner <records.csv> [history.jsonl]");
            std::process::exit(2);
        }
    };
    let history_path = args.next();

    let csv = std::fs::read_to_string(&records_path).expect("read records file");
    let records = match parse_records_csv(&csv) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("RECORDS_INVALID {}", e);
            std::process::exit(2);
        }
    };

    println!("RUN {} records={}", run_label_ulid(), records.len());

    let engine = ComplianceAnalysisEngine::new();
    let result = engine.analyze(&records);

    // Identical input must yield identical finding ids on a rerun.
    let recheck = engine.analyze_at(&records, result.executed_at);
    let ids: Vec<&str> = result.findings.iter().map(|f| f.finding_id.as_str()).collect();
    let recheck_ids: Vec<&str> = recheck.findings.iter().map(|f| f.finding_id.as_str()).collect();
    if ids != recheck_ids {
        eprintln!("DETERMINISM_CHECK FAIL finding ids differ between runs");
        std::process::exit(1);
    }

    for finding in &result.findings {
        println!(
            "FINDING {} {} {} {}",
            finding.severity.as_str(),
            finding.finding_type.as_str(),
            finding.finding_id,
            finding.title
        );
    }
    for rec in &result.recommendations {
        println!(
            "RECOMMENDATION {} {} addresses={}",
            rec.priority.as_str(),
            rec.finding_type.as_str(),
            rec.addresses.len()
        );
    }

    let profiles = build_profiles(&records, &result.findings);
    for profile in profiles.values() {
        println!(
            "SUPPLIER {:.0} {} contracts={}",
            profile.risk_score, profile.supplier_name, profile.contract_count
        );
    }

    println!(
        "ANALYSIS {} risk={} records={} issues={} confidence={:.2}",
        result.analysis_id,
        result.risk_level.as_str(),
        result.processed_records,
        result.issues_identified,
        result.confidence
    );

    if let Some(path) = history_path {
        let mut log = HistoryLog::open_or_create(&path).expect("open history log");
        log.append(&AnalysisRun::from(&result)).expect("append history log");
        let entries = HistoryLog::verify(&path).expect("verify history log");
        println!("HISTORY {} entries={}", path, entries);
    }

    // Full artifacts go to stdout only on request via env, so piping
    // the summary lines stays clean.
    if std::env::var_os("OVERSIGHT_EMIT_PACKET").is_some() {
        println!("{}", render_oversight_packet(&result, &profiles));
        println!("{}", render_findings_csv(&result));
        println!(
            "{}",
            serde_json::to_string_pretty(&result).expect("serialize result")
        );
    }

    if result.risk_level == RiskLevel::Critical {
        std::process::exit(1);
    }
}
