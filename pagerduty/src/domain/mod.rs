mod api_object;
mod schedule;
mod schedule_override;
mod user;

pub use api_object::*;
pub use schedule::*;
pub use schedule_override::*;
pub use user::*;
