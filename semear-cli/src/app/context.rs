//! Per-request session context
//!
//! The acting user and the selected student travel explicitly, by
//! reference, into every operation. There is no global session state.

#[derive(Debug, Clone)]
pub struct SessionContext {
    username: String,
    student: String,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, student: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            student: student.into(),
        }
    }

    /// The authenticated identity (a mentor, or the student themselves).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The student whose rows the operation targets.
    pub fn student(&self) -> &str {
        &self.student
    }
}
