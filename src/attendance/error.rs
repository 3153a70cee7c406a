use actix_web::{HttpResponse, http::StatusCode};
use derive_more::Display;

use crate::attendance::event::TransitionError;
use crate::model::role::Role;

/// Everything the attendance surface can fail with. Transition rejections
/// carry the specific refusal so the presentation layer can render an exact
/// message instead of a generic failure.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "{}", _0)]
    InvalidTransition(TransitionError),
    #[display(fmt = "no employee record is linked to this account, contact HR")]
    EmployeeRecordMissing,
    #[display(fmt = "role {:?} does not track attendance", _0)]
    RoleNotPermitted(Role),
    #[display(fmt = "attendance store is temporarily unavailable, try again")]
    StoreUnavailable,
}

impl AttendanceError {
    /// Stable machine-readable kind for the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition(_) => "invalid_transition",
            Self::EmployeeRecordMissing => "employee_record_missing",
            Self::RoleNotPermitted(_) => "role_not_permitted",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl From<TransitionError> for AttendanceError {
    fn from(e: TransitionError) -> Self {
        Self::InvalidTransition(e)
    }
}

impl actix_web::ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::EmployeeRecordMissing | Self::RoleNotPermitted(_) => StatusCode::FORBIDDEN,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            AttendanceError::InvalidTransition(TransitionError::AlreadyClockedIn).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::EmployeeRecordMissing.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AttendanceError::RoleNotPermitted(Role::Hr).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AttendanceError::StoreUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn missing_employee_record_message_is_actionable() {
        let msg = AttendanceError::EmployeeRecordMissing.to_string();
        assert!(msg.contains("contact HR"));
    }
}
