//! Console rendering. The summary goes to stderr and is never authoritative;
//! stdout carries only documents, engine output and the decision line.

use routegate_gateway::STDOUT_FILE;
use routegate_observe::MANIFEST_FILE;
use routegate_pipeline::RunReport;
use std::fmt::Write;

const RULE: &str = "================================================================";

pub fn summary(report: &RunReport) -> String {
    let run = &report.run_id;
    let mut out = String::new();

    section(&mut out, "[1/3] PROPOSAL (derived, non-authoritative)");
    let _ = writeln!(out, "  proposal set: proposals/{run}/proposal_set.json");
    let _ = writeln!(out, "  Proposals are suggestions. They decide nothing.");

    section(&mut out, "[2/3] DECISION (authoritative gate decision)");
    let _ = writeln!(out, "  decision:     {}", report.decision);
    let _ = writeln!(out, "  reason:       {}", report.reason_code);
    let _ = writeln!(out, "  artifact:     decisions/{run}/artifact.json");
    let _ = writeln!(out, "  content hash: {}", report.content_hash.to_hex());

    section(
        &mut out,
        &format!("[3/3] EXECUTION (authoritative output: runs/{run}/{STDOUT_FILE})"),
    );
    match &report.output {
        Some(output) => {
            let _ = writeln!(out, "  invoked:      yes");
            let _ = writeln!(out, "  exit code:    {:?}", output.exit_code);
            let _ = writeln!(out, "  output:       {} ({} bytes)", output.relative_path, output.byte_len);
            let _ = writeln!(out, "  sha256:       {}", output.sha256.to_hex());
        }
        None => {
            let _ = writeln!(out, "  invoked:      no (gate closed)");
        }
    }
    let _ = writeln!(out, "  manifest:     observe/{run}/{MANIFEST_FILE}");
    out
}

/// The single machine-readable line `run` prints on stdout.
pub fn decision_line(report: &RunReport) -> String {
    format!(
        "DECISION={} REASON={} RUN_ID={} INVOKED={}",
        report.decision,
        report.reason_code,
        report.run_id,
        report.invoked()
    )
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{RULE}\n{title}\n{RULE}");
}
