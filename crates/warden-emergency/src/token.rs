use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use warden_contracts::{emergency::RequestId, identity::UserId};

/// Opaque bearer token for a grant: hex SHA-256 over the grant identity and
/// a random nonce, so two grants never share a token.
pub fn issue_access_token(request_id: RequestId, user_id: &UserId, granted_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request_id.0.as_bytes());
    hasher.update(user_id.as_str().as_bytes());
    hasher.update(granted_at.to_rfc3339().as_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}
