pub mod logging;
pub mod user_id;
