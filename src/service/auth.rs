use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::audit::audit_events;
use crate::models::session::CreatedSession;
use crate::models::user::{FingerprintSignals, User};
use crate::service::fraud::FraudService;

/// Observed network/client signals for the request being authenticated.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo<'r> {
    pub user_agent: &'r str,
    pub ip: &'r str,
}

/// A successful login: the authenticated user plus the freshly issued
/// session. The route layer turns the session into the cookie.
pub struct LoginSuccess {
    pub user: User,
    pub session: CreatedSession,
}

pub struct AuthService<'a> {
    pub repo: &'a PostgresRepository,
    pub config: &'a Config,
}

impl<'a> AuthService<'a> {
    pub fn new(repo: &'a PostgresRepository, config: &'a Config) -> Self {
        Self { repo, config }
    }

    /// Run the full login sequence: fraud gate (when a fingerprint is
    /// supplied), credential check, session issue, fingerprint recording.
    ///
    /// Credential failures are indistinguishable from unknown accounts:
    /// same error, same (decoy-equalized) timing.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        fingerprint: Option<&str>,
        signals: Option<&FingerprintSignals>,
        device: DeviceInfo<'_>,
    ) -> Result<LoginSuccess, AppError> {
        let email = email.trim().to_lowercase();
        let fraud = FraudService::new(self.repo, &self.config.fraud);

        if let Some(fp) = fingerprint {
            let check = fraud.assess_risk(&email, fp, device.ip).await?;
            if !check.allowed {
                let _ = self
                    .repo
                    .create_security_audit_log(
                        None,
                        audit_events::LOGIN_BLOCKED,
                        false,
                        Some(device.ip.to_string()),
                        Some(device.user_agent.to_string()),
                        Some(serde_json::json!({"risk_score": check.risk_score})),
                    )
                    .await;

                return Err(AppError::AccessBlocked(check.reason.unwrap_or_else(|| "Access blocked".to_string())));
            }
        }

        let Some(user) = self.repo.get_user_by_email(&email).await? else {
            // Burn the same time as a real verification, then fail with
            // the generic message; never reveal which field was wrong.
            PostgresRepository::dummy_verify(password);
            let _ = self
                .repo
                .create_security_audit_log(
                    None,
                    audit_events::LOGIN_FAILED,
                    false,
                    Some(device.ip.to_string()),
                    Some(device.user_agent.to_string()),
                    None,
                )
                .await;
            return Err(AppError::InvalidCredentials);
        };

        if let Err(err) = PostgresRepository::verify_password(&user, password) {
            let _ = self
                .repo
                .create_security_audit_log(
                    Some(&user.id),
                    audit_events::LOGIN_FAILED,
                    false,
                    Some(device.ip.to_string()),
                    Some(device.user_agent.to_string()),
                    None,
                )
                .await;
            return Err(err);
        }

        let session = self
            .repo
            .create_session(&user.id, device.user_agent, device.ip, self.config.session.ttl_days)
            .await?;

        if let Some(fp) = fingerprint {
            fraud.record_fingerprint(&user.id, fp, device.ip, device.user_agent, signals).await?;
        }

        let _ = self
            .repo
            .create_security_audit_log(
                Some(&user.id),
                audit_events::LOGIN_SUCCESS,
                true,
                Some(device.ip.to_string()),
                Some(device.user_agent.to_string()),
                None,
            )
            .await;

        Ok(LoginSuccess { user, session })
    }

    /// Register a new account. The fraud gate only runs here when
    /// `fraud.gate_registration` is enabled and the client sent a
    /// fingerprint; the shipped default gates login only.
    pub async fn register(
        &self,
        email: &str,
        name: Option<&str>,
        password: &str,
        fingerprint: Option<&str>,
        device: DeviceInfo<'_>,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();

        if self.config.fraud.gate_registration
            && let Some(fp) = fingerprint
        {
            let fraud = FraudService::new(self.repo, &self.config.fraud);
            let check = fraud.assess_risk(&email, fp, device.ip).await?;
            if !check.allowed {
                let _ = self
                    .repo
                    .create_security_audit_log(
                        None,
                        audit_events::REGISTER_BLOCKED,
                        false,
                        Some(device.ip.to_string()),
                        Some(device.user_agent.to_string()),
                        Some(serde_json::json!({"risk_score": check.risk_score})),
                    )
                    .await;

                return Err(AppError::AccessBlocked(check.reason.unwrap_or_else(|| "Access blocked".to_string())));
            }
        }

        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let Some(user) = self.repo.create_user(&email, name, password).await? else {
            return Err(AppError::UserAlreadyExists(email));
        };

        let _ = self
            .repo
            .create_security_audit_log(
                Some(&user.id),
                audit_events::REGISTER_SUCCESS,
                true,
                Some(device.ip.to_string()),
                Some(device.user_agent.to_string()),
                None,
            )
            .await;

        Ok(user)
    }
}
