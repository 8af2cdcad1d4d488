pub mod alma;
pub mod mailer;
pub mod turnstile;

pub use alma::{AlmaClient, AlmaError};
pub use mailer::{Mailer, MailerError};
pub use turnstile::{CaptchaError, TurnstileVerifier};
