//! Handlers for the `user` command group.

use chrono::{Duration, Utc};

use crate::adapter::inbound::cli::command::{UserCommand, UserUpsertArgs};
use crate::adapter::inbound::cli::output;
use crate::domain::{KycStatus, UserId, UserProfile};
use crate::error::{Error, Result};
use crate::port::inbound::wallet::WalletService;

/// Execute a `user` subcommand.
pub fn execute(accounts: &dyn WalletService, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Upsert(args) => {
            let profile = profile_from(args)?;
            accounts.upsert_user(profile.clone())?;
            if output::is_json() {
                return output::json_result("user.upsert", &profile);
            }
            output::success(&format!("Saved user {}", profile.id));
            print_profile(&profile);
            Ok(())
        }
        UserCommand::Show(args) => {
            let profile = accounts.user(&UserId::new(args.user))?;
            if output::is_json() {
                return output::json_result("user.show", &profile);
            }
            output::section("User");
            output::field("ID", &profile.id);
            print_profile(&profile);
            Ok(())
        }
    }
}

fn profile_from(args: UserUpsertArgs) -> Result<UserProfile> {
    let kyc_status: KycStatus = args.kyc.parse().map_err(Error::Validation)?;
    Ok(UserProfile {
        id: UserId::new(args.user),
        is_active: !args.inactive,
        locked_until: args
            .lock_minutes
            .map(|minutes| Utc::now() + Duration::minutes(i64::from(minutes))),
        email_verified: !args.unverified_email,
        kyc_status,
    })
}

fn print_profile(profile: &UserProfile) {
    output::field("Active", profile.is_active);
    output::field("Email", if profile.email_verified { "verified" } else { "unverified" });
    output::field("KYC", profile.kyc_status);
    if let Some(until) = profile.locked_until {
        output::field("Locked until", until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kyc: &str) -> UserUpsertArgs {
        UserUpsertArgs {
            user: "alice".into(),
            inactive: false,
            unverified_email: false,
            kyc: kyc.into(),
            lock_minutes: None,
        }
    }

    #[test]
    fn defaults_build_a_verified_profile() {
        let profile = profile_from(args("verified")).unwrap();
        assert_eq!(profile, UserProfile::verified("alice"));
    }

    #[test]
    fn unknown_kyc_status_is_a_validation_error() {
        let err = profile_from(args("maybe")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn lock_minutes_sets_future_lock() {
        let mut upsert = args("pending");
        upsert.lock_minutes = Some(30);
        upsert.inactive = true;
        let profile = profile_from(upsert).unwrap();
        assert!(!profile.is_active);
        assert_eq!(profile.kyc_status, KycStatus::Pending);
        assert!(profile.locked_until.unwrap() > Utc::now());
    }
}
