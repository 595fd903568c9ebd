//! Outbound mail. Delivery is an external concern; the mailer records every
//! message as a structured tracing event so the flows that depend on mail
//! (email verification, agent invites, password reset codes) stay observable
//! without an SMTP transport.

#[derive(Debug)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub template: &'static str,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct Mailer;

impl Mailer {
    pub fn send(&self, mail: OutgoingMail) {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            template = mail.template,
            body = %mail.body,
            "sending mail"
        );
    }

    pub fn send_verification(&self, to: &str, full_name: &str, token: &str) {
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Verify Your Email - Car Rental".to_string(),
            template: "verify-email",
            body: format!(
                "Hi {}, verify your email: /api/auth/verify-email?token={}",
                full_name, token
            ),
        });
    }

    pub fn send_agent_invite(&self, to: &str, full_name: &str, temp_password: &str) {
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Agent Account Created".to_string(),
            template: "agent-invite",
            body: format!(
                "Hi {}, your agent account is ready. Temporary password: {}",
                full_name, temp_password
            ),
        });
    }

    pub fn send_reset_code(&self, to: &str, full_name: &str, code: &str) {
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Password Reset Code".to_string(),
            template: "reset-code",
            body: format!("Hi {}, your password reset code is {}", full_name, code),
        });
    }

    pub fn send_password_changed(&self, to: &str, full_name: &str) {
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Password Changed Successfully".to_string(),
            template: "password-changed",
            body: format!("Hi {}, your password was changed.", full_name),
        });
    }
}
