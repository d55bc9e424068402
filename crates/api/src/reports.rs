// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator work-day reporting.
//!
//! A work day is a date on which the operator has at least one shift
//! that is not cancelled. The report is available as JSON and as CSV.

use csv::Writer;
use time::Date;
use tracing::debug;
use turnover_domain::parse_date;
use turnover_persistence::SqlitePersistence;

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::{ApiError, translate_persistence_error};
use crate::request_response::{OperatorWorkloadInfo, WorkDaysReportRequest, WorkDaysReportResponse};

fn parse_bound(field: &str, value: &str) -> Result<Date, ApiError> {
    parse_date(value).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// Aggregates work days and shifts per operator over an inclusive range.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the range is invalid.
pub fn operator_work_days(
    persistence: &mut SqlitePersistence,
    request: &WorkDaysReportRequest,
    actor: &AuthenticatedActor,
) -> Result<WorkDaysReportResponse, ApiError> {
    AuthorizationService::authorize_view_reports(actor)?;

    let from: Date = parse_bound("from", &request.from)?;
    let to: Date = parse_bound("to", &request.to)?;
    if to < from {
        return Err(ApiError::InvalidInput {
            field: String::from("to"),
            message: format!("range end {to} is before its start {from}"),
        });
    }

    let operators: Vec<OperatorWorkloadInfo> = persistence
        .operator_workloads(from, to)
        .map_err(translate_persistence_error)?
        .iter()
        .map(OperatorWorkloadInfo::from)
        .collect();

    debug!(%from, %to, operators = operators.len(), "Built work-day report");
    Ok(WorkDaysReportResponse {
        from: from.to_string(),
        to: to.to_string(),
        operators,
    })
}

/// Renders a work-day report as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the CSV cannot be written.
pub fn work_days_csv(report: &WorkDaysReportResponse) -> Result<String, ApiError> {
    let csv_failure = |e: &dyn std::fmt::Display| ApiError::Internal {
        message: format!("Failed to render CSV: {e}"),
    };

    let mut writer: Writer<Vec<u8>> = Writer::from_writer(Vec::new());
    writer
        .write_record(["operator_id", "operator_name", "work_days", "shift_count"])
        .map_err(|e| csv_failure(&e))?;
    for operator in &report.operators {
        writer
            .write_record([
                operator.operator_id.to_string(),
                operator.operator_name.clone(),
                operator.work_days.to_string(),
                operator.shift_count.to_string(),
            ])
            .map_err(|e| csv_failure(&e))?;
    }

    let bytes: Vec<u8> = writer.into_inner().map_err(|e| csv_failure(&e))?;
    String::from_utf8(bytes).map_err(|e| csv_failure(&e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_has_header_and_one_row_per_operator() {
        let report: WorkDaysReportResponse = WorkDaysReportResponse {
            from: String::from("2026-03-01"),
            to: String::from("2026-03-31"),
            operators: vec![
                OperatorWorkloadInfo {
                    operator_id: 3,
                    operator_name: String::from("Otto Operator"),
                    work_days: 2,
                    shift_count: 3,
                },
                OperatorWorkloadInfo {
                    operator_id: 4,
                    operator_name: String::from("Smith, Bea"),
                    work_days: 1,
                    shift_count: 1,
                },
            ],
        };

        let csv: String = work_days_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "operator_id,operator_name,work_days,shift_count",
                "3,Otto Operator,2,3",
                "4,\"Smith, Bea\",1,1",
            ]
        );
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let report: WorkDaysReportResponse = WorkDaysReportResponse {
            from: String::from("2026-03-01"),
            to: String::from("2026-03-01"),
            operators: Vec::new(),
        };
        assert_eq!(
            work_days_csv(&report).unwrap(),
            "operator_id,operator_name,work_days,shift_count\n"
        );
    }
}
