pub mod admin;
pub mod attendance;
pub mod error;
pub mod leave_quota;
pub mod requests;
pub mod work_permit;
