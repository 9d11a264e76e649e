mod entity;
mod repository;
mod sender;

pub use entity::{
    normalize_email, VerificationCode, CODE_LENGTH, CODE_TTL_MINUTES, MAX_FAILED_ATTEMPTS,
};
pub use repository::VerificationCodeRepository;
pub use sender::EmailSender;
