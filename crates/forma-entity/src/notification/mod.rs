//! Notification entity: persisted model, priority, audience, and category.

pub mod audience;
pub mod category;
pub mod model;
pub mod priority;
pub mod source;

/// Macro to delegate sqlx TEXT column support to `Display`/`FromStr`.
///
/// Columns stay plain `TEXT` in PostgreSQL while the Rust side keeps a
/// typed enum.
macro_rules! impl_sqlx_text {
    ($name:ident) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(
                    &self.to_string(),
                    buf,
                )
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <String as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

pub(crate) use impl_sqlx_text;
