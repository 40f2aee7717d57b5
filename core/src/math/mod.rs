pub mod angles;
pub mod window;

pub use angles::{condition_az, condition_el, diff_deg};
pub use window::WindowFactors;
