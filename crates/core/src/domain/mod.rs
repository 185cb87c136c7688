pub mod chart;
pub mod quiz;
