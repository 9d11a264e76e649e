//! One-time email verification codes for merchant signup and password reset

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use crate::domain::verification::{
    normalize_email, EmailSender, VerificationCode, VerificationCodeRepository, CODE_LENGTH,
    MAX_FAILED_ATTEMPTS,
};
use crate::domain::DomainError;

const TOO_MANY_ATTEMPTS_MESSAGE: &str = "Too many failed attempts. Please request a new code.";

#[derive(Debug, Clone)]
pub struct VerificationService {
    codes: Arc<dyn VerificationCodeRepository>,
    sender: Arc<dyn EmailSender>,
}

impl VerificationService {
    pub fn new(codes: Arc<dyn VerificationCodeRepository>, sender: Arc<dyn EmailSender>) -> Self {
        Self { codes, sender }
    }

    /// Issues a fresh code, superseding any earlier one for the address
    pub async fn send_code(&self, email: &str) -> Result<(), DomainError> {
        let email = validate_email(email)?;
        let code = generate_code();

        self.codes
            .replace(VerificationCode::issue(&email, &code, Utc::now()))
            .await?;
        self.sender.send_verification_code(&email, &code).await?;

        info!(email = %email, "Verification code sent");
        Ok(())
    }

    /// Consumes the code when it matches and has not expired
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), DomainError> {
        let email = validate_email(email)?;

        let stored = self
            .codes
            .get(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("No verification code requested for this email"))?;

        if stored.is_expired(Utc::now()) {
            self.codes.delete(&email).await?;
            return Err(DomainError::validation("Verification code expired"));
        }

        if stored.is_exhausted() {
            self.codes.delete(&email).await?;
            return Err(DomainError::validation(TOO_MANY_ATTEMPTS_MESSAGE));
        }

        if !stored.matches(code) {
            let failures = self.codes.record_failure(&email).await?;

            if failures >= MAX_FAILED_ATTEMPTS {
                self.codes.delete(&email).await?;
                warn!(email = %email, failures, "Verification code discarded after repeated failures");
                return Err(DomainError::validation(TOO_MANY_ATTEMPTS_MESSAGE));
            }

            return Err(DomainError::validation("Invalid verification code"));
        }

        self.codes.delete(&email).await?;
        info!(email = %email, "Verification code accepted");

        Ok(())
    }
}

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = normalize_email(email);

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::validation("A valid email address is required")),
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::email::mock::RecordingEmailSender;
    use crate::infrastructure::storage::InMemoryVerificationCodeRepository;
    use chrono::Duration;

    fn service() -> (
        VerificationService,
        Arc<InMemoryVerificationCodeRepository>,
        Arc<RecordingEmailSender>,
    ) {
        let codes = Arc::new(InMemoryVerificationCodeRepository::new());
        let sender = Arc::new(RecordingEmailSender::default());
        (
            VerificationService::new(codes.clone(), sender.clone()),
            codes,
            sender,
        )
    }

    #[test]
    fn test_generated_code_is_four_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_send_then_verify_consumes_code() {
        let (service, codes, sender) = service();

        service.send_code("Shop@Example.com").await.unwrap();
        let code = sender.last_code().unwrap();

        service.verify_code("shop@example.com", &code).await.unwrap();
        assert!(codes.get("shop@example.com").await.unwrap().is_none());

        // Consumed codes cannot be replayed
        assert!(matches!(
            service.verify_code("shop@example.com", &code).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_request_supersedes_previous_code() {
        let (service, codes, _) = service();

        codes
            .replace(VerificationCode::issue("a@b.co", "1111", Utc::now()))
            .await
            .unwrap();
        service.send_code("a@b.co").await.unwrap();

        let stored = codes.get("a@b.co").await.unwrap().unwrap();
        // The sender may coincidentally draw 1111 again
        if !stored.matches("1111") {
            assert!(service.verify_code("a@b.co", "1111").await.is_err());
        }
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_stored_code() {
        let (service, codes, _) = service();
        codes
            .replace(VerificationCode::issue("a@b.co", "1234", Utc::now()))
            .await
            .unwrap();

        let err = service.verify_code("a@b.co", "9999").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(codes.get("a@b.co").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_repeated_wrong_guesses_discard_code() {
        let (service, codes, _) = service();
        codes
            .replace(VerificationCode::issue("a@b.co", "1234", Utc::now()))
            .await
            .unwrap();

        for _ in 1..MAX_FAILED_ATTEMPTS {
            let err = service.verify_code("a@b.co", "9999").await.unwrap_err();
            assert_eq!(err.public_message(), "Invalid verification code");
        }

        let err = service.verify_code("a@b.co", "9999").await.unwrap_err();
        assert_eq!(err.public_message(), TOO_MANY_ATTEMPTS_MESSAGE);
        assert!(codes.get("a@b.co").await.unwrap().is_none());

        // The right code no longer helps once discarded
        assert!(matches!(
            service.verify_code("a@b.co", "1234").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_code_resets_failures() {
        let (service, codes, _) = service();
        codes
            .replace(VerificationCode::issue("a@b.co", "1234", Utc::now()))
            .await
            .unwrap();
        for _ in 1..MAX_FAILED_ATTEMPTS {
            assert!(service.verify_code("a@b.co", "9999").await.is_err());
        }

        codes
            .replace(VerificationCode::issue("a@b.co", "5678", Utc::now()))
            .await
            .unwrap();

        assert!(service.verify_code("a@b.co", "9999").await.is_err());
        service.verify_code("a@b.co", "5678").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_code_is_removed() {
        let (service, codes, _) = service();
        codes
            .replace(VerificationCode::issue(
                "a@b.co",
                "1234",
                Utc::now() - Duration::minutes(11),
            ))
            .await
            .unwrap();

        let err = service.verify_code("a@b.co", "1234").await.unwrap_err();
        assert_eq!(err.public_message(), "Verification code expired");
        assert!(codes.get("a@b.co").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_malformed_email() {
        let (service, _, sender) = service();

        assert!(matches!(
            service.send_code("not-an-email").await,
            Err(DomainError::Validation { .. })
        ));
        assert!(sender.last_code().is_none());
    }
}
