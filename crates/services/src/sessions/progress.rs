/// Aggregated view of session progress, useful for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// Zero-based position of the current question.
    pub index: usize,
}

impl SessionProgress {
    /// Share of answered questions, 0 to 100.
    #[must_use]
    pub fn percent_answered(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        u32::try_from(self.answered.min(self.total) * 100 / self.total).unwrap_or(100)
    }
}
