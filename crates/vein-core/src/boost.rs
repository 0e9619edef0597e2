//! Mining power boost policy and verification challenges.
//!
//! Solving a challenge permanently raises an account's mining power by a
//! fixed increment. The cooldown between boosts is advisory: it is reported
//! to clients so they can run a local countdown, but the server never
//! persists cooldown state and applies the increment once per accepted
//! solve regardless of timing.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mining power gained per accepted challenge solve.
pub const POWER_INCREMENT: f64 = 0.025;

/// Advisory cooldown reported to clients after an accepted solve.
pub const BOOST_COOLDOWN: Duration = Duration::hours(2);

const CODE_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LEN: usize = 6;

/// The flavor of a verification challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    /// Retype a short alphanumeric code (matched case-insensitively).
    Code,
    /// Solve a small arithmetic problem.
    Math,
}

/// A pending verification challenge with its expected answer.
///
/// The answer stays server-side; only `id`, `kind` and `prompt` are shown
/// to the client.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: Uuid,
    pub kind: ChallengeKind,
    pub prompt: String,
    answer: String,
    pub issued_at: DateTime<Utc>,
}

impl Challenge {
    /// Generates a random challenge, alternating kinds by chance.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(0.5) {
            Self::code_at(now)
        } else {
            Self::math_at(now)
        }
    }

    /// A retype-the-code challenge.
    pub fn code_at(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
            .collect();
        Self {
            id: Uuid::new_v4(),
            kind: ChallengeKind::Code,
            prompt: code.clone(),
            answer: code,
            issued_at: now,
        }
    }

    /// A small arithmetic challenge. Subtraction operands are ordered so
    /// the answer is never negative.
    pub fn math_at(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let (prompt, answer) = match rng.gen_range(0..3) {
            0 => {
                let a: i64 = rng.gen_range(0..50);
                let b: i64 = rng.gen_range(0..50);
                (format!("{} + {}", a, b), a + b)
            }
            1 => {
                let a: i64 = rng.gen_range(50..100);
                let b: i64 = rng.gen_range(0..a);
                (format!("{} - {}", a, b), a - b)
            }
            _ => {
                let a: i64 = rng.gen_range(0..12);
                let b: i64 = rng.gen_range(0..12);
                (format!("{} * {}", a, b), a * b)
            }
        };
        Self {
            id: Uuid::new_v4(),
            kind: ChallengeKind::Math,
            prompt,
            answer: answer.to_string(),
            issued_at: now,
        }
    }

    /// Checks a submitted answer. Code challenges match case-insensitively;
    /// math answers must match after trimming.
    pub fn verify(&self, submitted: &str) -> bool {
        let submitted = submitted.trim();
        match self.kind {
            ChallengeKind::Code => submitted.eq_ignore_ascii_case(&self.answer),
            ChallengeKind::Math => submitted == self.answer,
        }
    }

    /// Whether the challenge is older than `max_age` as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.issued_at > max_age
    }

    #[cfg(test)]
    pub(crate) fn answer(&self) -> &str {
        &self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_challenge_verifies_case_insensitively() {
        let challenge = Challenge::code_at(Utc::now());
        assert_eq!(challenge.prompt.len(), CODE_LEN);
        assert!(challenge.verify(&challenge.answer().to_lowercase()));
        assert!(challenge.verify(&format!("  {}  ", challenge.answer())));
        assert!(!challenge.verify("WRONG1"));
    }

    #[test]
    fn test_math_challenge_answer_is_never_negative() {
        for _ in 0..100 {
            let challenge = Challenge::math_at(Utc::now());
            let answer: i64 = challenge.answer().parse().unwrap();
            assert!(answer >= 0, "negative answer for '{}'", challenge.prompt);
            assert!(challenge.verify(challenge.answer()));
        }
    }

    #[test]
    fn test_math_challenge_rejects_wrong_answer() {
        let challenge = Challenge::math_at(Utc::now());
        assert!(!challenge.verify("not a number"));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let challenge = Challenge::code_at(now);
        assert!(!challenge.is_expired(now + Duration::minutes(4), Duration::minutes(5)));
        assert!(challenge.is_expired(now + Duration::minutes(6), Duration::minutes(5)));
    }
}
