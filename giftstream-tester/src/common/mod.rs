pub mod scenario;
pub mod storage;
pub mod util;

pub use util::split_csv;
