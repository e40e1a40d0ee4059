pub mod row;
pub mod turbulence;
