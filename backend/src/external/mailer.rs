//! Transactional email through Amazon SES v2

use std::time::Duration;

use aws_config::SdkConfig;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;

use super::with_timeout;
use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct Mailer {
    ses: SesClient,
    from: String,
    timeout: Duration,
}

impl Mailer {
    pub fn new(sdk_config: &SdkConfig, config: &Config) -> Self {
        Self {
            ses: SesClient::new(sdk_config),
            from: config.email.from_address.clone(),
            timeout: config.external.timeout(),
        }
    }

    pub async fn send_password_reset_code(
        &self,
        to: &str,
        first_name: &str,
        code: &str,
    ) -> AppResult<()> {
        self.send(to, "Brewery Finder - Password reset", &reset_code_text(first_name, code))
            .await?;
        tracing::info!(to = to, "Password reset code sent");
        Ok(())
    }

    pub async fn send_password_changed(&self, to: &str, first_name: &str) -> AppResult<()> {
        let body = format!(
            "Hello {first_name},\n\n\
             The password on your Brewery Finder account was just changed.\n\
             If this was not you, contact us right away."
        );
        self.send(to, "Brewery Finder - Password changed", &body).await?;
        tracing::info!(to = to, "Password change notice sent");
        Ok(())
    }

    async fn send(&self, to: &str, subject: &str, text: &str) -> AppResult<()> {
        let content = simple_email(subject, text)?;

        with_timeout("email", self.timeout, async {
            self.ses
                .send_email()
                .from_email_address(&self.from)
                .destination(Destination::builder().to_addresses(to).build())
                .content(content)
                .send()
                .await
                .map_err(|e| AppError::ExternalService(format!("Email request failed: {}", e)))?;
            Ok(())
        })
        .await
    }
}

fn reset_code_text(first_name: &str, code: &str) -> String {
    format!(
        "Hello {first_name},\n\n\
         Someone asked to reset the password on your Brewery Finder account.\n\
         If it was you, enter this code in the app:\n\n\
         {code}\n\n\
         The code is valid for one hour. If you did not ask for a reset, \
         ignore this email and your password stays the same."
    )
}

fn simple_email(subject: &str, text: &str) -> AppResult<EmailContent> {
    let content = |data: &str| {
        Content::builder()
            .data(data)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    };

    let body = Body::builder().text(content(text)?).build();
    let message = Message::builder()
        .subject(content(subject)?)
        .body(body)
        .build();

    Ok(EmailContent::builder().simple(message).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_mail_carries_the_code() {
        let text = reset_code_text("Sam", "0a1b2c3d4e5f6a7b");
        assert!(text.starts_with("Hello Sam,"));
        assert!(text.contains("0a1b2c3d4e5f6a7b"));
    }

    #[test]
    fn email_content_is_plain_text() {
        let content = simple_email("Subject line", "Body text").unwrap();
        let message = content.simple().unwrap();
        assert_eq!(message.subject().map(|s| s.data()), Some("Subject line"));
        assert_eq!(
            message.body().and_then(|b| b.text()).map(|t| t.data()),
            Some("Body text")
        );
    }
}
