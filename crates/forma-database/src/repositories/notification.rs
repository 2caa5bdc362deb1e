//! Notification repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forma_core::error::{AppError, ErrorKind};
use forma_core::result::AppResult;
use forma_core::types::id::{NotificationId, UserId};
use forma_core::types::pagination::{PageRequest, PageResponse};
use forma_entity::notification::category::NotificationCategory;
use forma_entity::notification::model::{Notification, NotificationCounts};
use forma_entity::notification::priority::NotificationPriority;

/// Optional filters for the notification list endpoint.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Restrict to one category.
    pub categorie: Option<NotificationCategory>,
    /// Restrict to one priority.
    pub priorite: Option<NotificationPriority>,
    /// Only unread rows.
    pub non_lues_seules: bool,
}

/// Repository for notification persistence and aggregate counts.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Visibility clause inputs for one identity: the personal audience
    /// string plus the role groups the identity belongs to.
    fn audience_of(user_id: UserId) -> String {
        format!("user:{user_id}")
    }

    /// List notifications visible to a user, most recent first.
    pub async fn find_for_user(
        &self,
        user_id: UserId,
        groups: &[String],
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let personal = Self::audience_of(user_id);
        let categorie = filter.categorie.map(|c| c.to_string());
        let priorite = filter.priorite.map(|p| p.to_string());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE (audience = $1 OR audience = ANY($2) OR audience = 'TOUS') \
               AND ($3::TEXT IS NULL OR categorie = $3) \
               AND ($4::TEXT IS NULL OR priorite = $4) \
               AND (NOT $5 OR lue = FALSE)",
        )
        .bind(&personal)
        .bind(groups)
        .bind(&categorie)
        .bind(&priorite)
        .bind(filter.non_lues_seules)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
        })?;

        let notifs = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE (audience = $1 OR audience = ANY($2) OR audience = 'TOUS') \
               AND ($3::TEXT IS NULL OR categorie = $3) \
               AND ($4::TEXT IS NULL OR priorite = $4) \
               AND (NOT $5 OR lue = FALSE) \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7",
        )
        .bind(&personal)
        .bind(groups)
        .bind(&categorie)
        .bind(&priorite)
        .bind(filter.non_lues_seules)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
        })?;

        Ok(PageResponse::new(
            notifs,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Aggregate counts for one identity, in a single pass.
    pub async fn counts_for_user(
        &self,
        user_id: UserId,
        groups: &[String],
    ) -> AppResult<NotificationCounts> {
        sqlx::query_as::<_, NotificationCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE lue = FALSE) AS non_lues, \
                    COUNT(*) FILTER (WHERE lue = FALSE AND priorite = 'URGENTE') AS urgentes, \
                    COUNT(*) FILTER (WHERE lue = FALSE AND action_requise AND NOT action_effectuee) AS actions_requises \
             FROM notifications \
             WHERE (audience = $1 OR audience = ANY($2) OR audience = 'TOUS')",
        )
        .bind(Self::audience_of(user_id))
        .bind(groups)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to aggregate counts", e))
    }

    /// Fetch one notification by ID.
    pub async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch notification", e)
            })
    }

    /// Persist a notification row.
    pub async fn create(&self, notification: &Notification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, source_agent, categorie, type_notification, priorite, \
                                        audience, titre, message, entite_type, entite_id, \
                                        lien_action, action_requise, type_action, action_effectuee, \
                                        lue, date_lecture, payload, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(notification.id)
        .bind(notification.source_agent)
        .bind(notification.categorie)
        .bind(&notification.type_notification)
        .bind(notification.priorite)
        .bind(&notification.audience)
        .bind(&notification.titre)
        .bind(&notification.message)
        .bind(&notification.entite_type)
        .bind(notification.entite_id)
        .bind(&notification.lien_action)
        .bind(notification.action_requise)
        .bind(notification.type_action)
        .bind(notification.action_effectuee)
        .bind(notification.lue)
        .bind(notification.date_lecture)
        .bind(&notification.payload)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })?;
        Ok(())
    }

    /// Mark one notification as read. Returns `false` when the row was
    /// already read or does not exist (the transition never reverts).
    pub async fn mark_read(&self, id: NotificationId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET lue = TRUE, date_lecture = $2 \
             WHERE id = $1 AND lue = FALSE",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification visible to the identity as read.
    /// Returns the number of rows transitioned.
    pub async fn mark_all_read(
        &self,
        user_id: UserId,
        groups: &[String],
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET lue = TRUE, date_lecture = $3 \
             WHERE (audience = $1 OR audience = ANY($2) OR audience = 'TOUS') \
               AND lue = FALSE",
        )
        .bind(Self::audience_of(user_id))
        .bind(groups)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    /// Flip `action_effectuee` exactly once. Returns the updated row, or
    /// `None` when the action was already performed or not required.
    pub async fn mark_action_done(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET action_effectuee = TRUE \
             WHERE id = $1 AND action_requise = TRUE AND action_effectuee = FALSE \
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark action done", e))
    }
}
