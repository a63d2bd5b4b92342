use crate::config::FraudConfig;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::fraud::FraudCheckResult;
use crate::models::user::FingerprintSignals;
use uuid::Uuid;

/// Reason attached to threshold denies. Generic on purpose: the specific
/// signal that tripped is never surfaced to the caller.
pub const HIGH_RISK_REASON: &str = "High fraud risk detected";

/// Score contribution from distinct accounts sharing a fingerprint or IP.
/// Tiers are exclusive: only the highest matching tier applies.
pub fn reuse_score(distinct_accounts: i64) -> u8 {
    if distinct_accounts >= 5 {
        50
    } else if distinct_accounts >= 3 {
        30
    } else if distinct_accounts >= 2 {
        15
    } else {
        0
    }
}

/// Score contribution from fresh free-plan signups on the same IP inside
/// the velocity window. Same exclusive-tier rule.
pub fn velocity_score(recent_signups: i64) -> u8 {
    if recent_signups >= 3 {
        40
    } else if recent_signups >= 2 {
        25
    } else {
        0
    }
}

pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, domain)| domain).unwrap_or("")
}

pub struct FraudService<'a> {
    pub repo: &'a PostgresRepository,
    pub config: &'a FraudConfig,
}

impl<'a> FraudService<'a> {
    pub fn new(repo: &'a PostgresRepository, config: &'a FraudConfig) -> Self {
        Self { repo, config }
    }

    /// Assess the risk of a gated action, in strict order: blocklist hard
    /// stop, fingerprint/IP reuse, free-plan IP velocity, threshold
    /// decision. Computed fresh on every call; nothing is persisted here.
    pub async fn assess_risk(&self, email: &str, fingerprint: &str, ip: &str) -> Result<FraudCheckResult, AppError> {
        if let Some(block) = self.repo.find_active_fraud_block(ip, fingerprint, email_domain(email)).await? {
            return Ok(FraudCheckResult::deny(100, format!("Blocked: {}", block.reason)));
        }

        let mut risk_score = 0u8;

        let distinct_accounts = self.repo.count_fingerprint_reuse(fingerprint, ip).await?;
        risk_score += reuse_score(distinct_accounts);

        let recent_signups = self.repo.count_recent_free_plan_signups(ip, self.config.velocity_window_hours).await?;
        risk_score += velocity_score(recent_signups);

        if risk_score >= self.config.deny_threshold {
            return Ok(FraudCheckResult::deny(risk_score, HIGH_RISK_REASON.to_string()));
        }

        Ok(FraudCheckResult::allow(risk_score))
    }

    /// Record that this user was seen with this fingerprint: upserts the
    /// global fingerprint row and bumps the per-user usage counter.
    pub async fn record_fingerprint(
        &self,
        user_id: &Uuid,
        fingerprint: &str,
        ip: &str,
        user_agent: &str,
        signals: Option<&FingerprintSignals>,
    ) -> Result<(), AppError> {
        let fingerprint_row = self.repo.upsert_device_fingerprint(fingerprint, ip, user_agent, signals).await?;
        self.repo.touch_user_fingerprint(user_id, &fingerprint_row.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reuse_tiers_are_exclusive() {
        assert_eq!(reuse_score(0), 0);
        assert_eq!(reuse_score(1), 0);
        assert_eq!(reuse_score(2), 15);
        assert_eq!(reuse_score(3), 30);
        assert_eq!(reuse_score(4), 30);
        assert_eq!(reuse_score(5), 50);
        assert_eq!(reuse_score(12), 50);
    }

    #[test]
    fn velocity_tiers_are_exclusive() {
        assert_eq!(velocity_score(0), 0);
        assert_eq!(velocity_score(1), 0);
        assert_eq!(velocity_score(2), 25);
        assert_eq!(velocity_score(3), 40);
        assert_eq!(velocity_score(9), 40);
    }

    #[test]
    fn two_prior_accounts_alone_stay_allowed() {
        // Two prior accounts, no velocity, no block: 15 points, allowed.
        let score = reuse_score(2) + velocity_score(0);
        assert_eq!(score, 15);
        assert!(score < FraudConfig::default().deny_threshold);
    }

    #[test]
    fn heavy_reuse_plus_velocity_denies() {
        // Five prior accounts plus three recent free signups: 50+40=90.
        let score = reuse_score(5) + velocity_score(3);
        assert_eq!(score, 90);
        assert!(score >= FraudConfig::default().deny_threshold);
    }

    #[test]
    fn combined_score_never_exceeds_block_score() {
        assert!(reuse_score(i64::MAX) + velocity_score(i64::MAX) < 100);
    }

    #[test]
    fn email_domain_extraction() {
        assert_eq!(email_domain("ana@mailinator.com"), "mailinator.com");
        assert_eq!(email_domain("weird@@double.org"), "double.org");
        assert_eq!(email_domain("no-at-sign"), "");
    }

    proptest! {
        #[test]
        fn reuse_score_is_monotonic(a in 0i64..50, b in 0i64..50) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(reuse_score(lo) <= reuse_score(hi));
        }

        #[test]
        fn velocity_score_is_monotonic(a in 0i64..50, b in 0i64..50) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(velocity_score(lo) <= velocity_score(hi));
        }

        #[test]
        fn total_score_is_monotonic_in_both_signals(
            reuse in 0i64..50,
            velocity in 0i64..50,
            reuse_bump in 0i64..10,
            velocity_bump in 0i64..10,
        ) {
            let before = reuse_score(reuse) + velocity_score(velocity);
            let after = reuse_score(reuse + reuse_bump) + velocity_score(velocity + velocity_bump);
            prop_assert!(after >= before);
        }
    }
}
