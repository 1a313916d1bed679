// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Tolerance used for geometric comparisons across the crate.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-4;
/// Tolerance used for geometric comparisons across the crate.
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-8;
