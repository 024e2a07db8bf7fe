//! Password step of the login, guarded by a per-username attempt counter.
//!
//! The attempt record is read and written straight through the repository
//! on every call. Two concurrent failures for the same username can race and
//! lose an increment; the throttle is best effort, not a strict counter.

use std::sync::Arc;
use std::time::Duration;

use super::{DEFAULT_STORAGE_TIMEOUT, within};
use crate::domain::LoginAttemptState;
use crate::error::{Denial, DomainError};
use crate::ports::{Clock, LoginAttemptRepository, PasswordService, Session, SessionStage};

/// The owner account the password step checks against.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    /// PHC-format hash understood by the configured `PasswordService`.
    pub password_hash: String,
}

pub struct LoginThrottle {
    attempts: Arc<dyn LoginAttemptRepository>,
    passwords: Arc<dyn PasswordService>,
    clock: Arc<dyn Clock>,
    credentials: AdminCredentials,
    storage_timeout: Duration,
}

impl LoginThrottle {
    pub fn new(
        attempts: Arc<dyn LoginAttemptRepository>,
        passwords: Arc<dyn PasswordService>,
        clock: Arc<dyn Clock>,
        credentials: AdminCredentials,
    ) -> Self {
        Self {
            attempts,
            passwords,
            clock,
            credentials,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Check a username/password pair.
    ///
    /// On success the session moves to `PasswordVerified` and the caller
    /// should ask for the one-time code. A success does not clear earlier
    /// failures; only the lockout window does.
    pub async fn authenticate<S>(
        &self,
        username: &str,
        password: &str,
        session: &mut S,
    ) -> Result<SessionStage, DomainError>
    where
        S: Session + ?Sized,
    {
        let now = self.clock.now();
        let mut state = within(
            self.storage_timeout,
            self.attempts.find_by_id(username.to_string()),
        )
        .await?
        .unwrap_or_else(|| LoginAttemptState::new(username));
        if state.username.is_empty() {
            state.username = username.to_string();
        }

        if username == self.credentials.username
            && !state.lockout_active(now)
            && self.password_matches(password)?
        {
            if state.expire_lockout(now) {
                tracing::info!(username = %username, "Lockout window elapsed, attempts reset");
                self.persist(state).await?;
            }
            session.set_stage(SessionStage::PasswordVerified);
            tracing::info!(username = %username, "Password accepted, awaiting one-time code");
            return Ok(SessionStage::PasswordVerified);
        }

        // A capped record past its window is reset here and the attempt is not counted.
        let denial = state.record_failure(now);
        self.persist(state).await?;

        match denial {
            Denial::LockedOut { retry_in_minutes } => {
                tracing::warn!(username = %username, retry_in_minutes, "Login attempt while locked out");
            }
            Denial::InvalidCredentials { attempts_remaining } => {
                tracing::warn!(username = %username, attempts_remaining, "Invalid username or password");
            }
        }
        Err(DomainError::AuthDenied(denial))
    }

    fn password_matches(&self, password: &str) -> Result<bool, DomainError> {
        self.passwords
            .verify(password, &self.credentials.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    async fn persist(&self, state: LoginAttemptState) -> Result<(), DomainError> {
        within(self.storage_timeout, self.attempts.save(state)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use tokio::sync::Mutex;

    use super::*;
    use crate::error::RepoError;
    use crate::ports::{AuthError, BaseRepository, ManualClock};

    #[derive(Default)]
    struct FakeAttempts {
        rows: Mutex<HashMap<String, LoginAttemptState>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl FakeAttempts {
        async fn stored(&self, username: &str) -> Option<LoginAttemptState> {
            self.rows.lock().await.get(username).cloned()
        }
    }

    #[async_trait]
    impl BaseRepository<LoginAttemptState, String> for FakeAttempts {
        async fn find_by_id(&self, id: String) -> Result<Option<LoginAttemptState>, RepoError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepoError::Connection("store unreachable".into()));
            }
            Ok(self.rows.lock().await.get(&id).cloned())
        }

        async fn save(&self, entity: LoginAttemptState) -> Result<LoginAttemptState, RepoError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RepoError::Query("write rejected".into()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.rows
                .lock()
                .await
                .insert(entity.username.clone(), entity.clone());
            Ok(entity)
        }

        async fn delete(&self, id: String) -> Result<(), RepoError> {
            self.rows.lock().await.remove(&id);
            Ok(())
        }
    }

    impl LoginAttemptRepository for FakeAttempts {}

    /// Compares plain text; hashing is not under test here.
    struct PlainPasswords;

    impl PasswordService for PlainPasswords {
        fn hash(&self, password: &str) -> Result<String, AuthError> {
            Ok(password.to_string())
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(password == hash)
        }
    }

    #[derive(Default)]
    struct RecordingSession {
        stage: Option<SessionStage>,
    }

    impl Session for RecordingSession {
        fn set_stage(&mut self, stage: SessionStage) {
            self.stage = Some(stage);
        }

        fn clear(&mut self) {
            self.stage = None;
        }
    }

    struct Harness {
        throttle: LoginThrottle,
        attempts: Arc<FakeAttempts>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let attempts = Arc::new(FakeAttempts::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let throttle = LoginThrottle::new(
            attempts.clone(),
            Arc::new(PlainPasswords),
            clock.clone(),
            AdminCredentials {
                username: "owner".into(),
                password_hash: "hunter2".into(),
            },
        );
        Harness {
            throttle,
            attempts,
            clock,
        }
    }

    #[tokio::test]
    async fn test_correct_credentials_reach_second_factor() {
        let h = harness();
        let mut session = RecordingSession::default();

        let stage = h
            .throttle
            .authenticate("owner", "hunter2", &mut session)
            .await
            .unwrap();

        assert_eq!(stage, SessionStage::PasswordVerified);
        assert_eq!(session.stage, Some(SessionStage::PasswordVerified));
        assert_eq!(h.attempts.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_password_counts_down() {
        let h = harness();
        let mut session = RecordingSession::default();

        let err = h
            .throttle
            .authenticate("owner", "nope", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::AuthDenied(Denial::InvalidCredentials {
                attempts_remaining: 2
            })
        ));
        assert_eq!(session.stage, None);
        let stored = h.attempts.stored("owner").await.unwrap();
        assert_eq!(stored.login_attempts, 1);
        assert_eq!(stored.last_login_attempt, Some(h.clock.now()));
    }

    #[tokio::test]
    async fn test_unknown_username_is_throttled_under_its_own_key() {
        let h = harness();
        let mut session = RecordingSession::default();

        let _ = h
            .throttle
            .authenticate("intruder", "hunter2", &mut session)
            .await;

        assert_eq!(h.attempts.stored("intruder").await.unwrap().login_attempts, 1);
        assert!(h.attempts.stored("owner").await.is_none());
    }

    #[tokio::test]
    async fn test_three_failures_lock_the_account() {
        let h = harness();
        let mut session = RecordingSession::default();

        for _ in 0..2 {
            let _ = h.throttle.authenticate("owner", "nope", &mut session).await;
            h.clock.advance(ChronoDuration::seconds(20));
        }
        let err = h
            .throttle
            .authenticate("owner", "nope", &mut session)
            .await
            .unwrap_err();

        match err {
            DomainError::AuthDenied(Denial::LockedOut { retry_in_minutes }) => {
                assert!((retry_in_minutes - 30.0).abs() < 0.01);
            }
            other => panic!("expected lockout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lockout_rejects_correct_password() {
        let h = harness();
        let mut session = RecordingSession::default();
        for _ in 0..3 {
            let _ = h.throttle.authenticate("owner", "nope", &mut session).await;
        }
        h.clock.advance(ChronoDuration::minutes(10));

        let err = h
            .throttle
            .authenticate("owner", "hunter2", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::AuthDenied(Denial::LockedOut { retry_in_minutes })
                if (retry_in_minutes - 20.0).abs() < 0.01
        ));
        assert_eq!(session.stage, None);
        assert_eq!(h.attempts.stored("owner").await.unwrap().login_attempts, 3);
    }

    #[tokio::test]
    async fn test_lockout_expires_after_window() {
        let h = harness();
        let mut session = RecordingSession::default();
        for _ in 0..3 {
            let _ = h.throttle.authenticate("owner", "nope", &mut session).await;
        }
        h.clock.advance(ChronoDuration::minutes(31));

        let stage = h
            .throttle
            .authenticate("owner", "hunter2", &mut session)
            .await
            .unwrap();

        assert_eq!(stage, SessionStage::PasswordVerified);
        let stored = h.attempts.stored("owner").await.unwrap();
        assert_eq!(stored.login_attempts, 0);
        assert_eq!(stored.timeout, 0.0);
    }

    #[tokio::test]
    async fn test_wrong_password_after_window_starts_a_fresh_count() {
        let h = harness();
        let mut session = RecordingSession::default();
        for _ in 0..3 {
            let _ = h.throttle.authenticate("owner", "nope", &mut session).await;
        }
        h.clock.advance(ChronoDuration::minutes(31));

        let err = h
            .throttle
            .authenticate("owner", "nope", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::AuthDenied(Denial::InvalidCredentials {
                attempts_remaining: 3
            })
        ));
        let stored = h.attempts.stored("owner").await.unwrap();
        assert_eq!(stored.login_attempts, 0);
        assert_eq!(stored.timeout, 0.0);

        let err = h
            .throttle
            .authenticate("owner", "nope", &mut session)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::AuthDenied(Denial::InvalidCredentials {
                attempts_remaining: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_success_does_not_clear_earlier_failures() {
        let h = harness();
        let mut session = RecordingSession::default();
        for _ in 0..2 {
            let _ = h.throttle.authenticate("owner", "nope", &mut session).await;
        }

        h.throttle
            .authenticate("owner", "hunter2", &mut session)
            .await
            .unwrap();

        assert_eq!(h.attempts.stored("owner").await.unwrap().login_attempts, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_surfaced_without_writing() {
        let h = harness();
        h.attempts.fail_reads.store(true, Ordering::SeqCst);
        let mut session = RecordingSession::default();

        let err = h
            .throttle
            .authenticate("owner", "hunter2", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Infrastructure(_)));
        assert_eq!(h.attempts.writes.load(Ordering::SeqCst), 0);
        assert_eq!(session.stage, None);
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced() {
        let h = harness();
        h.attempts.fail_writes.store(true, Ordering::SeqCst);
        let mut session = RecordingSession::default();

        let err = h
            .throttle
            .authenticate("owner", "nope", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Infrastructure(_)));
        assert!(h.attempts.stored("owner").await.is_none());
    }
}
