mod catalog_vm;
mod results_vm;
mod session_vm;
mod time_fmt;

pub use catalog_vm::{AssessmentCardVm, map_assessment_cards};
pub use results_vm::{
    ReportLineVm, ReportSectionVm, ReportVm, ResultRowVm, map_report, map_result_rows,
};
pub use session_vm::{
    DraftEdit, NavigatorCellVm, OptionVm, QuestionVm, SessionHeaderVm, SessionVm, SubQuestionVm,
};
pub use time_fmt::{format_attempted, format_countdown};
