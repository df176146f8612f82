use core::fmt;
use std::ops::{Add, Mul, Sub};

use grid_util::{SimpleValueGrid, ValueGrid};
use num_traits::Float;

/// A 2D vector, generic over the float type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector<T> {
    pub x: T,
    pub y: T,
}

impl<T: Float> Vector<T> {
    pub fn new(x: T, y: T) -> Self {
        Vector { x, y }
    }

    pub fn zero() -> Self {
        Vector::new(T::zero(), T::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    pub fn magnitude(&self) -> T {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalized(&self) -> Self {
        let m = self.magnitude();
        if m.is_zero() {
            *self
        } else {
            Vector::new(self.x / m, self.y / m)
        }
    }
}

impl<T: Float> Add for Vector<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Float> Sub for Vector<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Float> Mul<T> for Vector<T> {
    type Output = Self;
    fn mul(self, rhs: T) -> Self {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

/// Grid of [Vector]s. Reads outside the field yield the zero vector and
/// writes outside it are ignored.
#[derive(Clone, Debug)]
pub struct VectorField<T> {
    vectors: SimpleValueGrid<Vector<T>>,
}

impl<T: Float + Default> VectorField<T> {
    pub fn new(width: usize, height: usize) -> Self {
        VectorField {
            vectors: SimpleValueGrid::new(width, height, Vector::zero()),
        }
    }

    pub fn width(&self) -> usize {
        self.vectors.width()
    }

    pub fn height(&self) -> usize {
        self.vectors.height()
    }

    pub fn get(&self, x: i32, y: i32) -> Vector<T> {
        if self.vectors.index_in_bounds(x, y) {
            self.vectors.get(x, y)
        } else {
            Vector::zero()
        }
    }

    pub fn set(&mut self, x: i32, y: i32, vector: Vector<T>) {
        if self.vectors.index_in_bounds(x, y) {
            self.vectors.set(x, y, vector);
        }
    }

    pub fn normalize_all(&mut self) {
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                let v = self.vectors.get(x, y).normalized();
                self.vectors.set(x, y, v);
            }
        }
    }

    /// Number of non-zero vectors in the field.
    pub fn count_nonzero(&self) -> usize {
        (0..self.height() as i32)
            .flat_map(|y| (0..self.width() as i32).map(move |x| (x, y)))
            .filter(|&(x, y)| !self.vectors.get(x, y).is_zero())
            .count()
    }
}

impl<T: Float + Default + fmt::Display> fmt::Display for VectorField<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height() as i32 {
            let row = (0..self.width() as i32)
                .map(|x| {
                    let v = self.get(x, y);
                    format!("({:.2},{:.2})", v.x, v.y)
                })
                .collect::<Vec<_>>();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_unit_length() {
        let mut field: VectorField<f64> = VectorField::new(2, 2);
        field.set(0, 0, Vector::new(3.0, 4.0));
        field.set(1, 1, Vector::new(-2.0, 0.0));
        field.normalize_all();
        assert!((field.get(0, 0).magnitude() - 1.0).abs() < 1e-12);
        assert_eq!(field.get(1, 1), Vector::new(-1.0, 0.0));
        assert!(field.get(1, 0).is_zero());
        assert_eq!(field.count_nonzero(), 2);
    }

    #[test]
    fn out_of_bounds_is_zero() {
        let mut field: VectorField<f32> = VectorField::new(1, 1);
        field.set(5, 5, Vector::new(1.0, 1.0));
        assert!(field.get(5, 5).is_zero());
        assert!(field.get(-1, 0).is_zero());
        assert_eq!(field.count_nonzero(), 0);
    }

    #[test]
    fn arithmetic() {
        let a = Vector::new(1.0_f64, 2.0);
        let b = Vector::new(0.5, -1.0);
        assert_eq!(a + b, Vector::new(1.5, 1.0));
        assert_eq!(a - b, Vector::new(0.5, 3.0));
        assert_eq!(a * 2.0, Vector::new(2.0, 4.0));
    }
}
