pub mod bounds;
pub mod simplex;
pub mod vertex;
