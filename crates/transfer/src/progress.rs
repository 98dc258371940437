/// Accumulates completed block sizes and forwards the running total.
///
/// The reported byte count is non-decreasing and capped at the total, so
/// the last call after every block has landed reports `(total, total)`.
pub struct ProgressReporter<F> {
    total: u64,
    transferred: u64,
    callback: F,
}

impl<F: FnMut(u64, u64)> ProgressReporter<F> {
    /// Creates a reporter for an upload of `total` bytes.
    pub fn new(total: u64, callback: F) -> Self {
        Self {
            total,
            transferred: 0,
            callback,
        }
    }

    /// Records `bytes` more transferred and notifies the callback.
    pub fn advance(&mut self, bytes: u64) {
        self.transferred = self.transferred.saturating_add(bytes).min(self.total);
        (self.callback)(self.transferred, self.total);
    }

    /// Emits the current count without advancing it.
    pub fn report(&mut self) {
        (self.callback)(self.transferred, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_accumulates_and_caps() {
        let mut seen = Vec::new();
        {
            let mut reporter = ProgressReporter::new(10, |done, total| seen.push((done, total)));
            reporter.advance(4);
            reporter.advance(4);
            reporter.advance(4);
        }
        assert_eq!(seen, vec![(4, 10), (8, 10), (10, 10)]);
    }

    #[test]
    fn report_repeats_current_count() {
        let mut seen = Vec::new();
        {
            let mut reporter = ProgressReporter::new(10, |done, total| seen.push((done, total)));
            reporter.advance(3);
            reporter.report();
        }
        assert_eq!(seen, vec![(3, 10), (3, 10)]);
    }

    #[test]
    fn empty_upload_reports_zero_of_zero() {
        let mut seen = Vec::new();
        {
            let mut reporter = ProgressReporter::new(0, |done, total| seen.push((done, total)));
            reporter.report();
        }
        assert_eq!(seen, vec![(0, 0)]);
    }

    #[test]
    fn oversized_advance_is_capped() {
        let mut seen = Vec::new();
        {
            let mut reporter = ProgressReporter::new(5, |done, total| seen.push((done, total)));
            reporter.advance(u64::MAX);
        }
        assert_eq!(seen, vec![(5, 5)]);
    }
}
