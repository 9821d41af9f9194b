//! Outgoing mail through Gmail SMTP (STARTTLS)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::actions::{Action, ActionArgs, ActionContext};
use crate::config::EmailConfig;
use crate::{Error, Result};

/// `send_email` action
pub struct EmailTool {
    smtp_host: String,
    smtp_port: u16,
    username: Option<String>,
    password: Option<SecretString>,
}

impl EmailTool {
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn credentials(&self) -> Result<(&str, &SecretString)> {
        match (self.username.as_deref(), self.password.as_ref()) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => {
                tracing::error!("gmail credentials not configured");
                Err(Error::External(
                    "Email sending failed: Gmail credentials not configured.".to_string(),
                ))
            }
        }
    }

    /// Build the message without sending it
    ///
    /// # Errors
    ///
    /// Returns `Error::Rejected` for malformed addresses, `Error::Email` if the
    /// message cannot be assembled
    pub fn compose(
        from: &str,
        to: &str,
        cc: Option<&str>,
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        let mut builder = Message::builder()
            .from(mailbox(from)?)
            .to(mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        if let Some(cc) = cc {
            builder = builder.cc(mailbox(cc)?);
        }
        builder
            .body(body.to_string())
            .map_err(|e| Error::Email(e.to_string()))
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse::<Mailbox>().map_err(|_| {
        Error::Rejected(format!("'{address}' doesn't look like an email address."))
    })
}

#[async_trait]
impl Action for EmailTool {
    async fn run(&self, args: &ActionArgs, _ctx: &ActionContext) -> Result<String> {
        let (user, password) = self.credentials()?;
        let to = args.required_str("to_email")?.trim();
        let message = Self::compose(
            user,
            to,
            args.non_blank("cc_email"),
            args.required_str("subject")?,
            args.required_str("message")?,
        )?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .map_err(|e| Error::External(format!("Email sending failed: SMTP error - {e}")))?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                user.to_string(),
                password.expose_secret().to_string(),
            ))
            .build();

        match mailer.send(message).await {
            Ok(_) => {
                tracing::info!(to, "email sent");
                Ok(format!("Email sent successfully to {to}"))
            }
            Err(e) if is_auth_failure(&e) => {
                tracing::error!(error = %e, "gmail authentication failed");
                Err(Error::External(
                    "Email sending failed: Authentication error. Please check your Gmail credentials."
                        .to_string(),
                ))
            }
            Err(e) => {
                tracing::error!(error = %e, "smtp error");
                Err(Error::External(format!("Email sending failed: SMTP error - {e}")))
            }
        }
    }
}

/// 534/535: the server refused the credentials
fn is_auth_failure(err: &lettre::transport::smtp::Error) -> bool {
    err.status()
        .is_some_and(|code| matches!(code.to_string().as_str(), "534" | "535"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ArgValue;
    use crate::testsupport;

    fn config(user: Option<&str>, password: Option<&str>) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 587,
            username: user.map(String::from),
            password: password.map(|p| SecretString::from(p.to_string())),
        }
    }

    fn args() -> ActionArgs {
        ActionArgs::from_values([
            ("to_email".to_string(), ArgValue::from("friend@example.com")),
            ("subject".to_string(), ArgValue::from("Hi")),
            ("message".to_string(), ArgValue::from("See you at 5.")),
        ])
    }

    #[tokio::test]
    async fn missing_credentials_reported() {
        let tool = EmailTool::new(&config(Some("me@gmail.com"), None));
        let err = tool.run(&args(), &testsupport::context()).await.unwrap_err();
        assert_eq!(err.to_string(), "Email sending failed: Gmail credentials not configured.");
    }

    #[test]
    fn credentials_carry_configured_password() {
        let tool = EmailTool::new(&config(Some("me@gmail.com"), Some("app-pass")));
        let (user, password) = tool.credentials().unwrap();
        assert_eq!(user, "me@gmail.com");
        assert_eq!(password.expose_secret(), "app-pass");
    }

    #[test]
    fn compose_sets_headers() {
        let message = EmailTool::compose(
            "me@gmail.com",
            "friend@example.com",
            Some("boss@example.com"),
            "Hi",
            "See you at 5.",
        )
        .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: friend@example.com"));
        assert!(raw.contains("Cc: boss@example.com"));
        assert!(raw.contains("Subject: Hi"));
        assert!(raw.contains("See you at 5."));
    }

    #[test]
    fn compose_rejects_bad_address() {
        let err = EmailTool::compose("me@gmail.com", "not an address", None, "s", "b").unwrap_err();
        assert!(matches!(err, Error::Rejected(ref m) if m.contains("not an address")));
    }
}
