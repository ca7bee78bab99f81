pub mod filter;
pub mod sort;

pub use filter::{filter, FilterCriteria};
pub use sort::{sort, SortColumn, SortState};
