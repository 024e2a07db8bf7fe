//! Login attempt entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::LoginAttemptState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "login_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub login_attempts: i32,
    pub last_login_attempt: Option<DateTimeWithTimeZone>,
    /// Remaining lockout minutes.
    pub timeout: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LoginAttemptState {
    fn from(model: Model) -> Self {
        Self {
            username: model.username,
            login_attempts: u32::try_from(model.login_attempts).unwrap_or(0),
            last_login_attempt: model.last_login_attempt.map(Into::into),
            timeout: model.timeout,
        }
    }
}

impl From<LoginAttemptState> for ActiveModel {
    fn from(state: LoginAttemptState) -> Self {
        Self {
            username: Set(state.username),
            login_attempts: Set(i32::try_from(state.login_attempts).unwrap_or(i32::MAX)),
            last_login_attempt: Set(state.last_login_attempt.map(Into::into)),
            timeout: Set(state.timeout),
        }
    }
}
