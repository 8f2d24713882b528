/// Outcome of one `submit` call. Constructed exactly once per call and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub success: bool,
    /// Populated exactly when `success` is false.
    pub error: Option<String>,
    /// 1-based count of delivery attempts actually made (waits on the rate
    /// limiter are not attempts). Validation failures report 1.
    pub attempt_number: u32,
}

impl SubmissionResult {
    pub fn succeeded(attempt_number: u32) -> Self {
        Self {
            success: true,
            error: None,
            attempt_number,
        }
    }

    pub fn failed(error: impl Into<String>, attempt_number: u32) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            attempt_number,
        }
    }
}
