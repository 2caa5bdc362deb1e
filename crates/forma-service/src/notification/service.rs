//! Notification queries and state transitions.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use forma_core::error::AppError;
use forma_core::types::id::{NotificationId, UserId};
use forma_core::types::pagination::{PageRequest, PageResponse};
use forma_database::repositories::notification::{NotificationFilter, NotificationRepository};
use forma_entity::notification::model::{Notification, NotificationCounts};

use crate::context::RequestContext;

/// Manages notification queries, read-state, and action-completion
/// transitions.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification repository.
    notif_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(notif_repo: Arc<NotificationRepository>) -> Self {
        Self { notif_repo }
    }

    /// Lists notifications visible to the current identity.
    pub async fn list_notifications(
        &self,
        ctx: &RequestContext,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Notification>, AppError> {
        self.notif_repo
            .find_for_user(ctx.user_id, &ctx.groups, filter, page)
            .await
    }

    /// Aggregate counts for the current identity.
    pub async fn counts(&self, ctx: &RequestContext) -> Result<NotificationCounts, AppError> {
        self.notif_repo
            .counts_for_user(ctx.user_id, &ctx.groups)
            .await
    }

    /// Aggregate counts for an arbitrary identity (used by the periodic
    /// counts-refresh push, which runs outside any request).
    pub async fn counts_for(
        &self,
        user_id: UserId,
        groups: &[String],
    ) -> Result<NotificationCounts, AppError> {
        self.notif_repo.counts_for_user(user_id, groups).await
    }

    /// Marks a notification as read. Idempotent: marking an already-read
    /// row is a no-op.
    pub async fn mark_read(
        &self,
        ctx: &RequestContext,
        notification_id: NotificationId,
    ) -> Result<(), AppError> {
        let transitioned = self.notif_repo.mark_read(notification_id, Utc::now()).await?;
        if transitioned {
            info!(
                notification_id = %notification_id,
                user_id = %ctx.user_id,
                "Notification marked as read"
            );
        }
        Ok(())
    }

    /// Marks every unread notification visible to the identity as read.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> Result<u64, AppError> {
        let count = self
            .notif_repo
            .mark_all_read(ctx.user_id, &ctx.groups, Utc::now())
            .await?;
        info!(user_id = %ctx.user_id, count, "All notifications marked as read");
        Ok(count)
    }

    /// Flips `action_effectuee` for an action-required notification.
    ///
    /// The transition happens exactly once; a second call finds no row to
    /// update and reports not-found so double-clicks surface cleanly.
    pub async fn execute_action(
        &self,
        ctx: &RequestContext,
        notification_id: NotificationId,
    ) -> Result<Notification, AppError> {
        let updated = self.notif_repo.mark_action_done(notification_id).await?;
        match updated {
            Some(notification) => {
                info!(
                    notification_id = %notification_id,
                    user_id = %ctx.user_id,
                    "Notification action performed"
                );
                Ok(notification)
            }
            None => Err(AppError::not_found(
                "Notification action already performed or not actionable",
            )),
        }
    }

    /// Persists a notification row (callback ingestion and internal jobs).
    pub async fn create_notification(&self, notification: Notification) -> Result<Notification, AppError> {
        self.notif_repo.create(&notification).await?;
        Ok(notification)
    }

    /// Fetch one notification.
    pub async fn get(&self, notification_id: NotificationId) -> Result<Option<Notification>, AppError> {
        self.notif_repo.find_by_id(notification_id).await
    }
}
