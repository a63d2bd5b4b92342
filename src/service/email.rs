use crate::config::EmailConfig;
use crate::error::app_error::AppError;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a password reset email with the reset token
    pub async fn send_password_reset_email(&self, to_email: &str, to_name: Option<&str>, reset_token: &str, reset_url: &str) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::warn!("Email service is disabled, skipping password reset email to {}", to_email);
            return Ok(());
        }

        let reset_link = format!("{}?token={}", reset_url, reset_token);
        let name = to_name.unwrap_or("there");

        let subject = "Reset your Sketchport password";
        let text_body = format!(
            "Hi {name},\n\n\
             Someone requested a password reset for this account. If that was\n\
             you, open the link below within the next hour:\n\n\
             {reset_link}\n\n\
             If you didn't request this, you can ignore this email; the link\n\
             expires on its own and your password stays unchanged.\n"
        );
        let html_body = format!(
            r#"<html><body style="font-family: sans-serif; color: #222;">
<p>Hi {name},</p>
<p>Someone requested a password reset for this account. If that was you,
use the button below within the next hour:</p>
<p><a href="{reset_link}" style="display:inline-block;padding:10px 18px;background:#4f46e5;color:#fff;border-radius:6px;text-decoration:none;">Reset password</a></p>
<p>If you didn't request this, you can ignore this email &mdash; the link
expires on its own and your password stays unchanged.</p>
</body></html>"#
        );

        self.send_email(to_email, subject, &html_body, &text_body).await
    }

    /// Send the post-registration welcome email.
    pub async fn send_welcome_email(&self, to_email: &str, to_name: Option<&str>) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::warn!("Email service is disabled, skipping welcome email to {}", to_email);
            return Ok(());
        }

        let name = to_name.unwrap_or("there");
        let subject = "Welcome to Sketchport";
        let text_body = format!(
            "Hi {name},\n\n\
             Your Sketchport account is ready. Sign in to start converting\n\
             your design files.\n"
        );
        let html_body = format!(
            r#"<html><body style="font-family: sans-serif; color: #222;">
<p>Hi {name},</p>
<p>Your Sketchport account is ready. Sign in to start converting your
design files.</p>
</body></html>"#
        );

        self.send_email(to_email, subject, &html_body, &text_body).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, html_body: &str, text_body: &str) -> Result<(), AppError> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_address)
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid from address: {e}")))?;
        let to: Mailbox = to_email.parse().map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text_body.to_string(), html_body.to_string()))
            .map_err(|e| AppError::BadRequest(format!("Failed to build email: {e}")))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| AppError::BadRequest(format!("SMTP configuration error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(self.config.smtp_username.clone(), self.config.smtp_password.clone()))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to send email: {e}")))?;

        tracing::info!("Email sent to {}", to_email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_service_short_circuits() {
        let service = EmailService::new(EmailConfig::default());
        // enabled=false by default: no SMTP connection is attempted.
        assert!(service.send_password_reset_email("ana@example.com", Some("Ana"), "token", "http://localhost/reset").await.is_ok());
        assert!(service.send_welcome_email("ana@example.com", None).await.is_ok());
    }
}
