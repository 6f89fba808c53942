//! Synchronous validation of inbound emergency requests.

use warden_contracts::{
    emergency::{AccessType, EmergencyAccessRequest, EmergencyLevel},
    error::{WardenError, WardenResult},
    identity::{Role, UserId},
};

/// A request whose fields are present and whose enumerations parsed.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub user_id: UserId,
    pub requester_role: Role,
    pub access_type: AccessType,
    pub level: EmergencyLevel,
    pub justification: String,
    pub resource_accessed: String,
    pub requested_by: UserId,
    pub supervisor_id: Option<UserId>,
}

/// Check required fields, justification length, level and access type.
///
/// All problems are reported together in one `Validation` error.
pub fn validate(request: &EmergencyAccessRequest, min_justification: usize) -> WardenResult<ValidatedRequest> {
    let mut problems: Vec<String> = Vec::new();

    let required = [
        ("user_id", &request.user_id),
        ("access_type", &request.access_type),
        ("emergency_level", &request.emergency_level),
        ("justification", &request.justification),
        ("resource_accessed", &request.resource_accessed),
        ("requested_by", &request.requested_by),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            problems.push(format!("missing required field '{field}'"));
        }
    }

    let justification = request.justification.trim();
    if !justification.is_empty() && justification.chars().count() < min_justification {
        problems.push(format!(
            "justification must be at least {min_justification} characters"
        ));
    }

    let level = match request.emergency_level.trim() {
        "" => None,
        raw => raw.parse::<EmergencyLevel>().map_err(|e| problems.push(e)).ok(),
    };
    let access_type = match request.access_type.trim() {
        "" => None,
        raw => raw.parse::<AccessType>().map_err(|e| problems.push(e)).ok(),
    };

    match (level, access_type) {
        (Some(level), Some(access_type)) if problems.is_empty() => Ok(ValidatedRequest {
            user_id: UserId::new(request.user_id.trim()),
            requester_role: request.requester_role,
            access_type,
            level,
            justification: justification.to_string(),
            resource_accessed: request.resource_accessed.trim().to_string(),
            requested_by: UserId::new(request.requested_by.trim()),
            supervisor_id: request
                .supervisor_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(UserId::new),
        }),
        _ => Err(WardenError::Validation { reason: problems.join("; ") }),
    }
}
