use std::sync::Arc;

use quiz_core::model::{Quiz, QuizFilter, Subject, SubjectId, default_subjects};
use storage::repository::{QuizRepository, SubjectRepository};

use crate::context::UserContext;
use crate::error::CatalogError;

/// Subject and quiz browsing for the signed-in user.
#[derive(Clone)]
pub struct CatalogService {
    subjects: Arc<dyn SubjectRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(subjects: Arc<dyn SubjectRepository>, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { subjects, quizzes }
    }

    /// Built-in subjects followed by the user's own, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if custom subjects cannot be loaded.
    pub async fn subjects(&self, ctx: &UserContext) -> Result<Vec<Subject>, CatalogError> {
        let mut all = default_subjects();
        all.extend(self.subjects.list_subjects_for_user(ctx.user_id).await?);
        Ok(all)
    }

    /// Subjects whose name or description contains `query`, ignoring case.
    /// A blank query returns everything.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if custom subjects cannot be loaded.
    pub async fn search_subjects(
        &self,
        ctx: &UserContext,
        query: &str,
    ) -> Result<Vec<Subject>, CatalogError> {
        let query = query.trim();
        let all = self.subjects(ctx).await?;
        if query.is_empty() {
            return Ok(all);
        }
        Ok(all.into_iter().filter(|s| s.matches_query(query)).collect())
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if custom subjects cannot be loaded.
    pub async fn subject(
        &self,
        ctx: &UserContext,
        id: &SubjectId,
    ) -> Result<Option<Subject>, CatalogError> {
        Ok(self
            .subjects(ctx)
            .await?
            .into_iter()
            .find(|s| &s.id == id))
    }

    /// Create a custom subject. Custom subjects get the fallback icon and color.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Domain` for a blank name and
    /// `CatalogError::Storage` if the subject cannot be stored.
    pub async fn add_subject(
        &self,
        ctx: &UserContext,
        name: &str,
        description: &str,
    ) -> Result<Subject, CatalogError> {
        let subject = Subject::custom(
            SubjectId::generate(),
            name.trim(),
            description.trim(),
            ctx.user_id,
        )
        .map_err(quiz_core::Error::from)?;
        self.subjects.insert_subject(&subject).await?;
        log::debug!("added subject {} ({})", subject.id, subject.name);
        Ok(subject)
    }

    /// The user's quizzes, newest first, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if quizzes cannot be loaded.
    pub async fn quizzes(
        &self,
        ctx: &UserContext,
        filter: &QuizFilter,
    ) -> Result<Vec<Quiz>, CatalogError> {
        let quizzes = self.quizzes.list_quizzes_for_user(ctx.user_id).await?;
        Ok(filter.apply(&quizzes).into_iter().cloned().collect())
    }

    /// Quizzes filed under one subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if quizzes cannot be loaded.
    pub async fn quizzes_for_subject(&self, id: &SubjectId) -> Result<Vec<Quiz>, CatalogError> {
        Ok(self.quizzes.list_quizzes_for_subject(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuizId, SubjectColor, SubjectFilter, SubjectIcon, UserId};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service() -> (CatalogService, Arc<InMemoryRepository>, UserContext) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = CatalogService::new(repo.clone(), repo.clone());
        (service, repo, UserContext::new(UserId::from_u128(1)))
    }

    #[tokio::test]
    async fn custom_subjects_follow_defaults_with_fallback_look() {
        let (service, _repo, ctx) = service();
        let added = service
            .add_subject(&ctx, " Econometrics ", "Regressions")
            .await
            .unwrap();
        assert_eq!(added.name, "Econometrics");
        assert_eq!(added.icon, SubjectIcon::BookOpen);
        assert_eq!(added.color, SubjectColor::Gray);

        let all = service.subjects(&ctx).await.unwrap();
        assert_eq!(all.len(), default_subjects().len() + 1);
        assert_eq!(all.last().map(|s| &s.id), Some(&added.id));
        assert!(service.subject(&ctx, &added.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn blank_subject_name_is_rejected() {
        let (service, _repo, ctx) = service();
        let err = service.add_subject(&ctx, "   ", "").await.unwrap_err();
        assert!(matches!(err, CatalogError::Domain(_)));
    }

    #[tokio::test]
    async fn subject_search_ignores_case() {
        let (service, _repo, ctx) = service();
        let found = service.search_subjects(&ctx, "STATIS").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, SubjectId::new("statistics"));
        let everything = service.search_subjects(&ctx, "  ").await.unwrap();
        assert_eq!(everything.len(), default_subjects().len());
    }

    #[tokio::test]
    async fn quizzes_are_filtered_by_query_and_subject() {
        let (service, repo, ctx) = service();
        let stats = SubjectId::new("statistics");
        let q1 = Quiz::new(QuizId::from_u128(1), "Quiz - variance.txt", ctx.user_id, fixed_now())
            .unwrap()
            .with_subject(stats.clone());
        let q2 = Quiz::new(
            QuizId::from_u128(2),
            "Quiz - markets.txt",
            ctx.user_id,
            fixed_now() + Duration::minutes(1),
        )
        .unwrap()
        .with_description("Supply and VARIANCE of prices");
        repo.insert_quiz(&q1).await.unwrap();
        repo.insert_quiz(&q2).await.unwrap();

        let all = service.quizzes(&ctx, &QuizFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![q2.id, q1.id]);

        let by_query = service
            .quizzes(&ctx, &QuizFilter::new("variance", SubjectFilter::All))
            .await
            .unwrap();
        assert_eq!(by_query.len(), 2);

        let by_subject = service
            .quizzes(&ctx, &QuizFilter::new("variance", SubjectFilter::Only(stats.clone())))
            .await
            .unwrap();
        assert_eq!(by_subject, vec![q1.clone()]);

        assert_eq!(service.quizzes_for_subject(&stats).await.unwrap(), vec![q1]);
    }
}
