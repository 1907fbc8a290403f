pub mod detector;
pub mod iir;

pub use detector::ToneDetector;
pub use iir::RecursiveFilter;
