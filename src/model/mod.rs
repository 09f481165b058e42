pub mod attendance;
pub mod leave_quota;
pub mod pending_request;
pub mod role;
pub mod status;
pub mod work_permit;
