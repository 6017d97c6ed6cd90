pub mod builder;
pub mod figures;
pub mod focus;
pub mod reducer;
