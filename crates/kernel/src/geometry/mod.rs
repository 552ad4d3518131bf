pub mod point;
pub mod vector;
pub mod line;
pub mod plane;
