pub mod job;
pub mod user;

pub use job::{JobCategory, JobStatus, RequestState, WeekDays};
pub use user::AccountType;
