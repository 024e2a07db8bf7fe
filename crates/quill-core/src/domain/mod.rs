//! Domain entities - the core business objects.

mod login_attempt;
mod post;

pub use login_attempt::{LOCKOUT_WINDOW_MINUTES, LoginAttemptState, MAX_LOGIN_ATTEMPTS};
pub use post::{
    DATE_FORMAT, Post, PostDraft, aggregate_tags, filter_by_tag, format_date, parse_tags,
    sort_newest_first,
};
