pub mod columns;
pub mod params;
pub mod upstream;
