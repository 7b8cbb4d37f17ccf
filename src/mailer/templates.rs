/// Subject and plain-text body of an account email.
#[derive(Debug, Clone)]
pub struct MailContent {
    pub subject: String,
    pub body: String,
}

impl MailContent {
    pub fn verification(frontend_origin: &str, token: &str) -> Self {
        let link = link(frontend_origin, "verify", token);
        Self {
            subject: "Email Verification".to_string(),
            body: format!("Please verify your email by clicking the link: {}", link),
        }
    }

    pub fn password_reset(frontend_origin: &str, token: &str) -> Self {
        let link = link(frontend_origin, "reset-password", token);
        Self {
            subject: "Password Reset Request".to_string(),
            body: format!(
                "You have requested to reset your password. Please click the following link \
                 to reset your password:\n\n{}\n\nIf you did not request this, please ignore \
                 this email.",
                link
            ),
        }
    }
}

fn link(origin: &str, page: &str, token: &str) -> String {
    format!("{}/{}?token={}", origin.trim_end_matches('/'), page, token)
}
