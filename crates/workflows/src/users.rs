use std::sync::Arc;

use learning::{
    DeletionSummary, LearningError, LearningStore, Profile, Timestamp, User, UserId,
};
use tracing::{info, warn};

use crate::commands::{NewUser, ProfileFields};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn LearningStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    /// Registers a user after validating every field. Emails are unique
    /// ignoring case; a duplicate is a `Conflict`.
    #[tracing::instrument(level = "debug", skip(self, input), fields(role = %input.role))]
    pub async fn register_user(&self, input: NewUser) -> Result<User, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        if uow.graph().user_by_email(&input.email).is_some() {
            warn!("registration with an existing email rejected");
            return Err(LearningError::conflict(format!(
                "a user with email {} already exists",
                input.email.trim()
            )));
        }

        let user = uow
            .graph_mut()
            .insert_user(User {
                id: UserId::new_random(),
                name: input.name.trim().to_owned(),
                email: input.email.trim().to_owned(),
                role: input.role,
                is_active: true,
                created_at: Timestamp::now(),
            })?
            .clone();
        uow.commit().await?;

        info!(user = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, user: UserId) -> Result<User, LearningError> {
        let view = self.store.read().await?;
        Ok(view.graph().user(user)?.clone())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, LearningError> {
        let view = self.store.read().await?;
        Ok(view.graph().user_by_email(email).cloned())
    }

    /// Marks the user inactive. Existing enrollments and submissions stay;
    /// the user can no longer enroll or author courses.
    pub async fn deactivate_user(&self, user: UserId) -> Result<User, LearningError> {
        let mut uow = self.store.begin().await?;
        let updated = uow.graph_mut().set_user_active(user, false)?.clone();
        uow.commit().await?;
        info!(%user, "user deactivated");
        Ok(updated)
    }

    /// Creates or replaces the user's profile. `created_at` survives
    /// replacement; `updated_at` is refreshed.
    #[tracing::instrument(level = "debug", skip(self, fields))]
    pub async fn upsert_profile(
        &self,
        user: UserId,
        fields: ProfileFields,
    ) -> Result<Profile, LearningError> {
        fields.validate()?;
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        graph.user(user)?;
        let now = Timestamp::now();
        let created_at = graph.profile(user).map_or(now, |p| p.created_at);

        let profile = uow
            .graph_mut()
            .upsert_profile(Profile {
                user,
                bio: fields.bio,
                avatar_url: fields.avatar_url,
                phone: fields.phone,
                website: fields.website,
                github: fields.github,
                linkedin: fields.linkedin,
                created_at,
                updated_at: now,
            })?
            .clone();
        uow.commit().await?;
        info!(%user, "profile saved");
        Ok(profile)
    }

    /// The user's profile, or `None` if they never created one.
    pub async fn profile(&self, user: UserId) -> Result<Option<Profile>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.user(user)?;
        Ok(graph.profile(user).cloned())
    }

    /// Deletes a user and their profile. Users still referenced by a course,
    /// enrollment, submission, quiz submission, or review cannot be deleted
    /// (`Conflict`); deactivate them instead.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_user(&self, user: UserId) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_user(user)?;
        uow.commit().await?;
        info!(%user, profiles = summary.profiles, "user deleted");
        Ok(summary)
    }
}
