/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub attempted: usize,
    /// 1-based number of the current question, `0` before the session is ready.
    pub display_index: usize,
    pub is_last: bool,
}

impl SessionProgress {
    /// `"3 / 12"` style label for the header.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.display_index, self.total)
    }
}
