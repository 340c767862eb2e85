pub mod principal;
pub mod response;

pub use principal::identify_principal;
pub use response::{ApiResponse, ApiResult};
