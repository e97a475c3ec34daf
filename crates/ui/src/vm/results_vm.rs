use services::api::{AssessmentReport, AssessmentStatus, ResultRow};

use crate::vm::time_fmt::format_attempted;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRowVm {
    pub assessment_id: u64,
    pub name: String,
    pub status_label: &'static str,
    pub attempted_label: String,
    pub score_label: String,
    pub percentage_label: String,
    /// Report can be opened only once evaluation finished.
    pub has_report: bool,
}

#[must_use]
pub fn map_result_rows(rows: &[ResultRow]) -> Vec<ResultRowVm> {
    rows.iter().map(map_result_row).collect()
}

fn map_result_row(row: &ResultRow) -> ResultRowVm {
    let score_label = match (row.total_obtained, row.grand_total) {
        (Some(obtained), Some(total)) => format!("{} / {}", score(obtained), score(total)),
        _ => "-".to_string(),
    };
    ResultRowVm {
        assessment_id: row.assessment_id.value(),
        name: row.assessment_name.clone(),
        status_label: row.status.label(),
        attempted_label: format_attempted(row.last_attempted),
        score_label,
        percentage_label: row
            .percentage
            .as_deref()
            .map_or_else(|| "-".to_string(), percentage),
        has_report: row.status == AssessmentStatus::Completed,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLineVm {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSectionVm {
    pub name: String,
    pub metrics: Vec<ReportLineVm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportVm {
    Pending { status_label: &'static str },
    Ready {
        title: String,
        score_label: String,
        feedback: Vec<String>,
        categories: Vec<ReportLineVm>,
        sections: Vec<ReportSectionVm>,
    },
}

#[must_use]
pub fn map_report(report: &AssessmentReport) -> ReportVm {
    let Some(body) = report.body.as_ref() else {
        return ReportVm::Pending {
            status_label: report.status.label(),
        };
    };
    ReportVm::Ready {
        title: body.assessment_name.clone(),
        score_label: score(body.score),
        feedback: assess_core::model::split_paragraphs(&body.feedback)
            .into_iter()
            .map(str::to_string)
            .collect(),
        categories: body
            .categories
            .iter()
            .map(|category| ReportLineVm {
                label: category.category.clone(),
                value: score(category.score),
            })
            .collect(),
        sections: body
            .sections
            .iter()
            .map(|section| ReportSectionVm {
                name: section.name.clone(),
                metrics: section
                    .metrics
                    .iter()
                    .map(|metric| ReportLineVm {
                        label: metric.name.clone(),
                        value: format!("{} / {}", metric.obtained_score, score(metric.total_score)),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn percentage(value: &str) -> String {
    let value = value.trim();
    if value.ends_with('%') {
        value.to_string()
    } else {
        format!("{value}%")
    }
}
