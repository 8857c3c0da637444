use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use quiz_core::model::{QuizId, Score, SubmissionId};
use serde::Serialize;
use storage::repository::{QuizRepository, SubmissionRepository};

use crate::auth::{AuthProvider, require_admin};
use crate::error::AnalyticsError;

const RECENT_LIMIT: u32 = 10;
const ACTIVITY_DAYS: i64 = 7;
const UNKNOWN_QUIZ: &str = "Unknown Quiz";

/// A recent submission with the title of its quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentSubmission {
    pub id: SubmissionId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub display_name: String,
    pub score: Score,
    pub completed_at: DateTime<Utc>,
}

/// Submissions completed on one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub submissions: u32,
}

/// Numbers behind the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_quizzes: usize,
    pub total_submissions: u64,
    pub unique_participants: usize,
    pub recent: Vec<RecentSubmission>,
    /// Oldest day first, one entry per day including empty ones.
    pub daily_activity: Vec<ActivityDay>,
}

/// Attempts made under one display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub display_name: String,
    pub attempts: u32,
    pub last_activity: DateTime<Utc>,
}

/// Read-only aggregates over stored submissions. Admin only.
#[derive(Clone)]
pub struct AnalyticsService {
    auth: Arc<dyn AuthProvider>,
    quizzes: Arc<dyn QuizRepository>,
    submissions: Arc<dyn SubmissionRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        quizzes: Arc<dyn QuizRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            auth,
            quizzes,
            submissions,
        }
    }

    /// Build dashboard numbers as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Auth` unless an admin is signed in, and
    /// `AnalyticsError::Storage` if repository access fails.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, AnalyticsError> {
        require_admin(self.auth.as_ref())?;

        let quizzes = self.quizzes.list_quizzes(None).await?;
        let titles: HashMap<QuizId, String> =
            quizzes.iter().map(|q| (q.id, q.title.clone())).collect();

        let total_submissions = self.submissions.count_submissions().await?;
        let recent = self
            .submissions
            .list_recent_submissions(RECENT_LIMIT)
            .await?
            .into_iter()
            .map(|s| RecentSubmission {
                id: s.id,
                quiz_id: s.snapshot.quiz_id(),
                quiz_title: titles
                    .get(&s.snapshot.quiz_id())
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_QUIZ.to_string()),
                display_name: s.snapshot.display_name().to_string(),
                score: s.snapshot.score(),
                completed_at: s.snapshot.completed_at(),
            })
            .collect();

        let all = self
            .submissions
            .list_submissions_between(DateTime::<Utc>::UNIX_EPOCH, now)
            .await?;
        let unique_participants = all
            .iter()
            .map(|s| s.snapshot.display_name())
            .collect::<HashSet<_>>()
            .len();

        let today = now.date_naive();
        let first_day = today - Duration::days(ACTIVITY_DAYS - 1);
        let mut buckets: BTreeMap<NaiveDate, u32> = (0..ACTIVITY_DAYS)
            .map(|offset| (first_day + Duration::days(offset), 0))
            .collect();
        for submission in &all {
            if let Some(count) = buckets.get_mut(&submission.snapshot.completed_at().date_naive()) {
                *count += 1;
            }
        }
        let daily_activity = buckets
            .into_iter()
            .map(|(date, submissions)| ActivityDay { date, submissions })
            .collect();

        Ok(DashboardStats {
            total_quizzes: quizzes.len(),
            total_submissions,
            unique_participants,
            recent,
            daily_activity,
        })
    }

    /// Attempts per display name, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Auth` unless an admin is signed in, and
    /// `AnalyticsError::Storage` if repository access fails.
    pub async fn participants(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ParticipantSummary>, AnalyticsError> {
        require_admin(self.auth.as_ref())?;

        let all = self
            .submissions
            .list_submissions_between(DateTime::<Utc>::UNIX_EPOCH, now)
            .await?;
        let mut by_name: HashMap<&str, ParticipantSummary> = HashMap::new();
        for submission in &all {
            let name = submission.snapshot.display_name();
            let at = submission.snapshot.completed_at();
            by_name
                .entry(name)
                .and_modify(|p| {
                    p.attempts += 1;
                    p.last_activity = p.last_activity.max(at);
                })
                .or_insert_with(|| ParticipantSummary {
                    display_name: name.to_string(),
                    attempts: 1,
                    last_activity: at,
                });
        }

        let mut participants: Vec<ParticipantSummary> = by_name.into_values().collect();
        participants.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryAuthProvider;
    use quiz_core::model::{CategoryDraft, QuizDraft, SubmissionSnapshot};
    use quiz_core::time::fixed_now;
    use storage::repository::{CategoryRepository, InMemoryRepository};

    #[tokio::test]
    async fn deleted_quiz_shows_as_unknown_and_old_days_drop_out() {
        let repo = InMemoryRepository::new();
        let category = repo
            .insert_category(CategoryDraft::new("General", "book").validate(fixed_now()).unwrap())
            .await
            .unwrap();
        let quiz = repo
            .insert_quiz(QuizDraft::new("Gone", category.id).validate(fixed_now()).unwrap())
            .await
            .unwrap();
        for days_ago in [0, 3, 30] {
            let snapshot = SubmissionSnapshot::new(
                quiz.id,
                None,
                "Ada",
                Score::new(1, 1),
                fixed_now() - Duration::days(days_ago),
                Vec::new(),
            )
            .unwrap();
            repo.create_submission(&snapshot).await.unwrap();
        }
        repo.delete_quiz(quiz.id).await.unwrap();

        let auth = Arc::new(InMemoryAuthProvider::new(Some("admin@quiz.dev")));
        auth.sign_up("admin@quiz.dev", "password").await.unwrap();
        let analytics = AnalyticsService::new(auth, Arc::new(repo.clone()), Arc::new(repo));

        let stats = analytics.dashboard(fixed_now()).await.unwrap();
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.unique_participants, 1);
        assert_eq!(stats.recent[0].quiz_title, "Unknown Quiz");

        let per_day: Vec<u32> = stats.daily_activity.iter().map(|d| d.submissions).collect();
        assert_eq!(per_day, vec![0, 0, 0, 1, 0, 0, 1]);
        assert_eq!(stats.daily_activity[6].date, fixed_now().date_naive());
    }

    #[tokio::test]
    async fn requires_admin() {
        let repo = InMemoryRepository::new();
        let auth = Arc::new(InMemoryAuthProvider::new(None));
        let analytics = AnalyticsService::new(auth, Arc::new(repo.clone()), Arc::new(repo));
        assert!(matches!(
            analytics.dashboard(fixed_now()).await,
            Err(AnalyticsError::Auth(crate::error::AuthError::NotSignedIn))
        ));
    }
}
