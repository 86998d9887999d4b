use crate::database::models::ChallengeCompletionRecord;
use crate::database::repositories::ChallengeCompletionRepository;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    Culture,
    Food,
    Nature,
    Social,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofRequirement {
    Photo,
    Checkin,
    Quiz,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub answer_index: usize,
}

/// The challenge catalog is fixed at compile time; only per-user
/// completion state lives in the database.
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub points: u32,
    pub category: ChallengeCategory,
    pub difficulty: Difficulty,
    pub proof: ProofRequirement,
    pub quiz: Option<Quiz>,
}

pub static CATALOG: &[Challenge] = &[
    Challenge {
        id: "sunrise-summit",
        title: "Sunrise summit",
        description: "Photograph a sunrise from any summit or viewpoint above 1000m.",
        points: 50,
        category: ChallengeCategory::Nature,
        difficulty: Difficulty::Hard,
        proof: ProofRequirement::Photo,
        quiz: None,
    },
    Challenge {
        id: "street-food-five",
        title: "Street food five",
        description: "Try five different street food stalls in one city.",
        points: 30,
        category: ChallengeCategory::Food,
        difficulty: Difficulty::Medium,
        proof: ProofRequirement::Photo,
        quiz: None,
    },
    Challenge {
        id: "local-phrasebook",
        title: "Local phrasebook",
        description: "Learn to greet, thank, and say goodbye in the local language.",
        points: 20,
        category: ChallengeCategory::Culture,
        difficulty: Difficulty::Easy,
        proof: ProofRequirement::Quiz,
        quiz: Some(Quiz {
            question: "Which of these is a greeting in Japanese?",
            options: &["Arigatou", "Konnichiwa", "Sayounara", "Sumimasen"],
            answer_index: 1,
        }),
    },
    Challenge {
        id: "market-morning",
        title: "Market morning",
        description: "Visit a local market before 08:00 and check in.",
        points: 15,
        category: ChallengeCategory::Culture,
        difficulty: Difficulty::Easy,
        proof: ProofRequirement::Checkin,
        quiz: None,
    },
    Challenge {
        id: "travel-buddy",
        title: "Travel buddy",
        description: "Post a photo together with someone you met on the road.",
        points: 25,
        category: ChallengeCategory::Social,
        difficulty: Difficulty::Medium,
        proof: ProofRequirement::Photo,
        quiz: None,
    },
];

pub fn find_challenge(id: &str) -> Option<&'static Challenge> {
    CATALOG.iter().find(|c| c.id == id)
}

#[derive(Clone)]
pub struct ChallengeService {
    database: Database,
}

impl ChallengeService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Catalog merged with the caller's completion flags; anonymous
    /// callers get the catalog with every flag false.
    pub fn list(&self, user_id: Option<&str>) -> Result<Vec<ChallengeView>> {
        let completed = match user_id {
            Some(user) => self
                .database
                .with_repositories(|repos| repos.challenge_completions().completed_ids(user))?,
            None => Vec::new(),
        };
        Ok(CATALOG
            .iter()
            .map(|c| ChallengeView {
                challenge: c,
                completed: completed.iter().any(|id| id == c.id),
            })
            .collect())
    }

    /// Returns true when the completion was newly recorded; repeating a
    /// completion is a no-op.
    pub fn complete(&self, user_id: &str, challenge_id: &str) -> Result<bool> {
        if find_challenge(challenge_id).is_none() {
            anyhow::bail!("challenge not found");
        }
        self.database.with_repositories(|repos| {
            repos.challenge_completions().complete(&ChallengeCompletionRecord {
                user_id: user_id.to_string(),
                challenge_id: challenge_id.to_string(),
                completed_at: now_utc_iso(),
            })
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeView {
    #[serde(flatten)]
    pub challenge: &'static Challenge,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, RegisterInput};
    use rusqlite::Connection;

    fn setup() -> (ChallengeService, String) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let session = AuthService::new(db.clone())
            .register(RegisterInput {
                username: "amelia".into(),
                password: "pw".into(),
            })
            .unwrap();
        (ChallengeService::new(db), session.user_id)
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn quiz_answers_are_in_range() {
        for challenge in CATALOG {
            if let Some(quiz) = &challenge.quiz {
                assert!(quiz.answer_index < quiz.options.len(), "{}", challenge.id);
            }
            // Quiz proof implies a quiz is attached.
            if challenge.proof == ProofRequirement::Quiz {
                assert!(challenge.quiz.is_some(), "{}", challenge.id);
            }
        }
    }

    #[test]
    fn completion_flags_follow_the_user() {
        let (service, user_id) = setup();
        let before = service.list(Some(&user_id)).unwrap();
        assert!(before.iter().all(|c| !c.completed));

        assert!(service.complete(&user_id, "street-food-five").unwrap());
        // Repeat completion does not error and does not double-record.
        assert!(!service.complete(&user_id, "street-food-five").unwrap());

        let after = service.list(Some(&user_id)).unwrap();
        let entry = after
            .iter()
            .find(|c| c.challenge.id == "street-food-five")
            .unwrap();
        assert!(entry.completed);

        let anonymous = service.list(None).unwrap();
        assert!(anonymous.iter().all(|c| !c.completed));
    }

    #[test]
    fn unknown_challenge_is_rejected() {
        let (service, user_id) = setup();
        let err = service.complete(&user_id, "does-not-exist").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
