//! 2D affine transform tracking with a canvas-style save/restore stack.
//!
//! Matrices use the canvas layout
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! and every operation post-multiplies the current matrix, so the most
//! recently applied operation acts first on model coordinates.

use glam::{DAffine2, DVec2};

/// An affine model-to-screen transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D(DAffine2);

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self(DAffine2::IDENTITY);

    /// Build from canvas components `(a, b, c, d, e, f)`.
    pub fn from_components(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self(DAffine2::from_cols_array(&[a, b, c, d, e, f]))
    }

    pub fn from_affine(affine: DAffine2) -> Self {
        Self(affine)
    }

    pub fn as_affine(&self) -> &DAffine2 {
        &self.0
    }

    /// Canvas components `[a, b, c, d, e, f]`.
    pub fn components(&self) -> [f64; 6] {
        self.0.to_cols_array()
    }

    pub fn a(&self) -> f64 {
        self.0.matrix2.x_axis.x
    }

    pub fn b(&self) -> f64 {
        self.0.matrix2.x_axis.y
    }

    pub fn c(&self) -> f64 {
        self.0.matrix2.y_axis.x
    }

    pub fn d(&self) -> f64 {
        self.0.matrix2.y_axis.y
    }

    pub fn e(&self) -> f64 {
        self.0.translation.x
    }

    pub fn f(&self) -> f64 {
        self.0.translation.y
    }

    /// Map a model point to screen space.
    pub fn apply(&self, point: DVec2) -> DVec2 {
        self.0.transform_point2(point)
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}

impl std::ops::Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Self) -> Self::Output {
        Transform2D(self.0 * rhs.0)
    }
}

/// Tracks the current transform of a drawing surface.
///
/// The tracker mirrors every transform operation issued by the renderer so
/// that screen points can be mapped back into model space at any time.
#[derive(Debug, Clone, Default)]
pub struct TransformTracker {
    current: Transform2D,
    stack: Vec<Transform2D>,
    last_reported: Option<Transform2D>,
}

impl TransformTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn post_multiply(&mut self, op: DAffine2) {
        self.current = Transform2D(self.current.0 * op);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.post_multiply(DAffine2::from_translation(DVec2::new(dx, dy)));
    }

    pub fn translate_by(&mut self, delta: DVec2) {
        self.translate(delta.x, delta.y);
    }

    /// Scale the model axes. Zero factors make the transform non-invertible.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        debug_assert!(sx != 0.0 && sy != 0.0, "zero scale factor");
        self.post_multiply(DAffine2::from_scale(DVec2::new(sx, sy)));
    }

    pub fn rotate(&mut self, radians: f64) {
        self.post_multiply(DAffine2::from_angle(radians));
    }

    /// Post-multiply an arbitrary matrix given as canvas components.
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.post_multiply(*Transform2D::from_components(a, b, c, d, e, f).as_affine());
    }

    /// Replace the current matrix.
    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.current = Transform2D::from_components(a, b, c, d, e, f);
    }

    pub fn reset(&mut self) {
        self.current = Transform2D::IDENTITY;
    }

    pub fn save(&mut self) {
        self.stack.push(self.current);
    }

    /// Pop the last saved matrix. An unmatched restore is ignored.
    pub fn restore(&mut self) {
        if let Some(saved) = self.stack.pop() {
            self.current = saved;
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Map a screen point back into model space.
    pub fn transformed_point(&self, x: f64, y: f64) -> DVec2 {
        self.current.inverse().apply(DVec2::new(x, y))
    }

    /// Map a model point into screen space.
    pub fn to_screen(&self, point: DVec2) -> DVec2 {
        self.current.apply(point)
    }

    pub fn get_transform(&self) -> Transform2D {
        self.current
    }

    /// Report whether the transform differs from the one seen by the previous
    /// call, remembering the current one.
    pub fn take_changed(&mut self) -> bool {
        let changed = self.last_reported != Some(self.current);
        self.last_reported = Some(self.current);
        changed
    }

    /// Make the next [`take_changed`](Self::take_changed) report a change.
    pub fn forget_reported(&mut self) {
        self.last_reported = None;
    }
}
