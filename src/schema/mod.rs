pub mod alternative;
pub mod symbol;
