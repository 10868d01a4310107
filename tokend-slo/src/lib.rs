pub mod errors;
mod id;

pub type Result<T, E = errors::WithBacktrace> = core::result::Result<T, E>;

pub use id::{is_uuid_v4, next_jti};
