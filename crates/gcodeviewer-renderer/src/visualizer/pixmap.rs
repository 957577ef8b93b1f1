//! Raster drawing surface backed by tiny-skia.
//!
//! Paths are accumulated in f32 device-independent model coordinates and
//! rasterized with the transform passed to each stroke or fill. Arcs are
//! flattened to quadratic curves before they reach tiny-skia.

use super::arc::{for_each_quadratic, point_on_circle};
use super::color::Color;
use super::surface::{DrawSurface, LineCap, LineJoin, StrokeStyle};
use super::transform::Transform2D;
use crate::model::ArcWinding;
use gcodeviewer_core::RenderError;
use glam::DVec2;
use image::RgbaImage;
use std::path::Path;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};
use tracing::{debug, warn};

fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_skia_transform(t: &Transform2D) -> Transform {
    let [a, b, c, d, e, f] = t.components();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));
    paint.anti_alias = true;
    paint
}

/// tiny-skia backed [`DrawSurface`].
pub struct PixmapSurface {
    pixmap: Pixmap,
    background: Color,
    path: PathBuilder,
    has_current_point: bool,
}

impl PixmapSurface {
    /// Allocate a surface cleared to `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, RenderError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::SurfaceCreation { width, height })?;
        pixmap.fill(to_skia_color(background));
        Ok(Self {
            pixmap,
            background,
            path: PathBuilder::new(),
            has_current_point: false,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Pixel at `(x, y)` with alpha un-premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Copy the surface into an RGBA image.
    pub fn to_image(&self) -> RgbaImage {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let pixels = self.pixmap.pixels();
        RgbaImage::from_fn(width, height, |x, y| {
            let px = pixels[(y * width + x) as usize].demultiply();
            image::Rgba([px.red(), px.green(), px.blue(), px.alpha()])
        })
    }

    /// Encode the surface as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap.encode_png().map_err(|e| RenderError::Encoding {
            reason: e.to_string(),
        })
    }

    /// Save the surface; the image format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        debug!(
            "Saving {}x{} surface to {}",
            self.pixmap.width(),
            self.pixmap.height(),
            path.display()
        );
        self.to_image().save(path).map_err(|e| RenderError::Encoding {
            reason: e.to_string(),
        })
    }

    fn current_path(&self) -> Option<tiny_skia::Path> {
        self.path.clone().finish()
    }
}

impl DrawSurface for PixmapSurface {
    fn size(&self) -> DVec2 {
        DVec2::new(self.pixmap.width() as f64, self.pixmap.height() as f64)
    }

    fn clear(&mut self) {
        self.pixmap.fill(to_skia_color(self.background));
    }

    fn begin_path(&mut self) {
        self.path = PathBuilder::new();
        self.has_current_point = false;
    }

    fn move_to(&mut self, point: DVec2) {
        self.path.move_to(point.x as f32, point.y as f32);
        self.has_current_point = true;
    }

    fn line_to(&mut self, point: DVec2) {
        if !self.has_current_point {
            self.move_to(point);
            return;
        }
        self.path.line_to(point.x as f32, point.y as f32);
    }

    fn quad_to(&mut self, control: DVec2, to: DVec2) {
        if !self.has_current_point {
            self.move_to(control);
        }
        self.path
            .quad_to(control.x as f32, control.y as f32, to.x as f32, to.y as f32);
    }

    fn arc(
        &mut self,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    ) {
        self.line_to(point_on_circle(center, radius, start_angle));
        for_each_quadratic(center, radius, start_angle, end_angle, winding, |ctrl, to| {
            self.path
                .quad_to(ctrl.x as f32, ctrl.y as f32, to.x as f32, to.y as f32);
        });
    }

    fn close_path(&mut self) {
        self.path.close();
    }

    fn stroke(&mut self, style: &StrokeStyle, transform: &Transform2D) {
        let Some(path) = self.current_path() else {
            return;
        };
        let dash = style.dash.and_then(|[on, off]| {
            let dash = StrokeDash::new(vec![on as f32, off as f32], 0.0);
            if dash.is_none() {
                warn!("Ignoring invalid dash pattern [{}, {}]", on, off);
            }
            dash
        });
        let stroke = Stroke {
            width: style.width as f32,
            line_cap: match style.cap {
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Butt => tiny_skia::LineCap::Butt,
            },
            line_join: match style.join {
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
            },
            dash,
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint_for(style.color),
            &stroke,
            to_skia_transform(transform),
            None,
        );
    }

    fn fill(&mut self, color: Color, transform: &Transform2D) {
        let Some(path) = self.current_path() else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            to_skia_transform(transform),
            None,
        );
    }
}
