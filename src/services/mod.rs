pub mod errors;
pub mod lead_board;
pub mod lead_capture;
pub mod lead_detail;
pub mod lead_list;
pub mod live_refresh;

pub use errors::{ServiceError, ServiceResult};
