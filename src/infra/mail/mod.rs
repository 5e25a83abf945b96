// Mail infra layer.
// - `smtp_mailer.rs` sends the alert over SMTP with STARTTLS.

pub mod smtp_mailer;

pub use smtp_mailer::{SmtpMailer, SmtpSettings};
