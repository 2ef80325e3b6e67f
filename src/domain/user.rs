//! Betting eligibility flags from the user directory.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Identity verification state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    /// Stable lowercase name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown kyc status '{other}'")),
        }
    }
}

/// What the bet engine needs to know about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub is_active: bool,
    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,
    pub email_verified: bool,
    #[serde(default)]
    pub kyc_status: KycStatus,
}

impl UserProfile {
    /// An active, verified user without locks.
    pub fn verified(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
            locked_until: None,
            email_verified: true,
            kyc_status: KycStatus::Verified,
        }
    }

    /// Why the user cannot bet at `now`, if anything.
    #[must_use]
    pub fn ineligibility(&self, now: DateTime<Utc>, require_kyc: bool) -> Option<&'static str> {
        if !self.is_active {
            return Some("account is not active");
        }
        if self.locked_until.is_some_and(|until| until > now) {
            return Some("account is temporarily locked");
        }
        if !self.email_verified {
            return Some("email address is not verified");
        }
        if require_kyc && self.kyc_status != KycStatus::Verified {
            return Some("identity verification is required");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn verified_user_is_eligible() {
        let user = UserProfile::verified("alice");
        assert_eq!(user.ineligibility(Utc::now(), true), None);
    }

    #[test]
    fn expired_lock_no_longer_applies() {
        let now = Utc::now();
        let mut user = UserProfile::verified("alice");
        user.locked_until = Some(now + Duration::minutes(5));
        assert!(user.ineligibility(now, false).is_some());

        user.locked_until = Some(now - Duration::minutes(5));
        assert_eq!(user.ineligibility(now, false), None);
    }

    #[test]
    fn kyc_only_checked_when_required() {
        let mut user = UserProfile::verified("alice");
        user.kyc_status = KycStatus::Pending;
        assert_eq!(user.ineligibility(Utc::now(), false), None);
        assert!(user.ineligibility(Utc::now(), true).is_some());
    }

    #[test]
    fn unverified_email_blocks() {
        let mut user = UserProfile::verified("alice");
        user.email_verified = false;
        assert_eq!(
            user.ineligibility(Utc::now(), false),
            Some("email address is not verified")
        );
    }
}
