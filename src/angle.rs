//! Angle units accepted by the rotation APIs.

use crate::consts::{FRAC_1_PI, PI};
use approx::{AbsDiffEq, RelativeEq};
use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Neg, Sub};

/// Represents an angle in some unit.
///
/// Every operation that takes a rotation angle accepts any [`Angle`], so
/// callers can pass [`Degrees`] (the unit used by the decomposition methods)
/// or [`Radians`] without converting by hand.
pub trait Angle: Copy {
    /// Returns the value of the angle in degrees.
    fn degrees(self) -> f32;

    /// Returns the value of the angle in radians.
    fn radians(self) -> f32;

    /// Returns the angle as [`Degrees`].
    fn as_degrees(self) -> Degrees {
        Degrees(self.degrees())
    }

    /// Returns the angle as [`Radians`].
    fn as_radians(self) -> Radians {
        Radians(self.radians())
    }

    /// Computes the sine and cosine of the angle.
    fn sin_cos(self) -> (f32, f32) {
        self.radians().sin_cos()
    }
}

/// An angle in degrees.
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Zeroable, Pod)]
pub struct Degrees(pub f32);

/// An angle in radians.
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Zeroable, Pod)]
pub struct Radians(pub f32);

impl Angle for Degrees {
    #[inline]
    fn degrees(self) -> f32 {
        self.0
    }

    #[inline]
    fn radians(self) -> f32 {
        degrees_to_radians(self.0)
    }
}

impl Angle for Radians {
    #[inline]
    fn degrees(self) -> f32 {
        radians_to_degrees(self.0)
    }

    #[inline]
    fn radians(self) -> f32 {
        self.0
    }
}

impl From<Radians> for Degrees {
    fn from(angle: Radians) -> Self {
        angle.as_degrees()
    }
}

impl From<Degrees> for Radians {
    fn from(angle: Degrees) -> Self {
        angle.as_radians()
    }
}

impl<A: Angle> Add<A> for Degrees {
    type Output = Self;

    fn add(self, rhs: A) -> Self {
        Self(self.0 + rhs.degrees())
    }
}

impl<A: Angle> Add<A> for Radians {
    type Output = Self;

    fn add(self, rhs: A) -> Self {
        Self(self.0 + rhs.radians())
    }
}

impl<A: Angle> Sub<A> for Degrees {
    type Output = Self;

    fn sub(self, rhs: A) -> Self {
        Self(self.0 - rhs.degrees())
    }
}

impl<A: Angle> Sub<A> for Radians {
    type Output = Self;

    fn sub(self, rhs: A) -> Self {
        Self(self.0 - rhs.radians())
    }
}

impl Neg for Degrees {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Neg for Radians {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl_abs_diff_eq!(Degrees, |a, b, epsilon| {
    a.0.abs_diff_eq(&b.0, epsilon)
});

impl_relative_eq!(Degrees, |a, b, epsilon, max_relative| {
    a.0.relative_eq(&b.0, epsilon, max_relative)
});

impl_abs_diff_eq!(Radians, |a, b, epsilon| {
    a.0.abs_diff_eq(&b.0, epsilon)
});

impl_relative_eq!(Radians, |a, b, epsilon, max_relative| {
    a.0.relative_eq(&b.0, epsilon, max_relative)
});

#[inline]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * (180.0 * FRAC_1_PI)
}

#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}
