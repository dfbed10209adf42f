use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SurfaceError {
    #[error("drawing surface lost: {0}")]
    Lost(String),
    #[error("drawing surface has no drawable area ({width}x{height})")]
    Degenerate { width: f32, height: f32 },
}

/// Translate-then-scale mapping applied to every coordinate a surface
/// receives. Stroke widths and text sizes are not scaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceTransform {
    pub translation: Vec2,
    pub scale: f32,
}

impl SurfaceTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn apply(&self, point: Pos2) -> Pos2 {
        Pos2::ZERO + self.translation + point.to_vec2() * self.scale
    }

    pub fn apply_length(&self, length: f32) -> f32 {
        length * self.scale
    }
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Immediate-mode 2D target the engine draws into.
pub trait DrawSurface {
    /// Fails when the surface can't be drawn to this frame.
    fn begin_frame(&mut self, canvas: Rect) -> Result<(), SurfaceError>;
    fn clear(&mut self, color: Color32);
    fn set_transform(&mut self, transform: SurfaceTransform);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);
    fn quadratic(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke);
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);
    fn polygon(&mut self, points: &[Pos2], fill: Color32);
    fn rect(&mut self, rect: Rect, fill: Color32, stroke: Stroke);
    fn measure_text(&self, text: &str, size: f32) -> Vec2;
    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32);
}

/// Draws through an egui [`Painter`].
pub struct EguiSurface<'a> {
    painter: &'a Painter,
    canvas: Rect,
    transform: SurfaceTransform,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a Painter) -> Self {
        Self {
            painter,
            canvas: painter.clip_rect(),
            transform: SurfaceTransform::IDENTITY,
        }
    }
}

impl DrawSurface for EguiSurface<'_> {
    fn begin_frame(&mut self, canvas: Rect) -> Result<(), SurfaceError> {
        if !canvas.is_finite() || !canvas.is_positive() {
            return Err(SurfaceError::Degenerate {
                width: canvas.width(),
                height: canvas.height(),
            });
        }
        self.canvas = canvas;
        self.transform = SurfaceTransform::IDENTITY;
        Ok(())
    }

    fn clear(&mut self, color: Color32) {
        self.painter.rect_filled(self.canvas, 0.0, color);
    }

    fn set_transform(&mut self, transform: SurfaceTransform) {
        self.transform = transform;
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter
            .line_segment([self.transform.apply(from), self.transform.apply(to)], stroke);
    }

    fn quadratic(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke) {
        let points = [from, control, to].map(|point| self.transform.apply(point));
        self.painter.add(QuadraticBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            stroke,
        ));
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.painter.circle(
            self.transform.apply(center),
            self.transform.apply_length(radius),
            fill,
            stroke,
        );
    }

    fn polygon(&mut self, points: &[Pos2], fill: Color32) {
        let points = points
            .iter()
            .map(|point| self.transform.apply(*point))
            .collect::<Vec<_>>();
        self.painter
            .add(Shape::convex_polygon(points, fill, Stroke::NONE));
    }

    fn rect(&mut self, rect: Rect, fill: Color32, stroke: Stroke) {
        let rect = Rect::from_min_max(
            self.transform.apply(rect.min),
            self.transform.apply(rect.max),
        );
        self.painter.rect_filled(rect, 3.0, fill);
        if stroke != Stroke::NONE {
            self.painter
                .rect_stroke(rect, 3.0, stroke, eframe::egui::StrokeKind::Middle);
        }
    }

    fn measure_text(&self, text: &str, size: f32) -> Vec2 {
        self.painter
            .layout_no_wrap(text.to_owned(), FontId::proportional(size), Color32::WHITE)
            .size()
    }

    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        self.painter.text(
            self.transform.apply(position),
            anchor,
            text,
            FontId::proportional(size),
            color,
        );
    }
}

/// One recorded call on a [`CommandList`], in screen coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color32),
    Line {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    Quadratic {
        from: Pos2,
        control: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Pos2>,
        fill: Color32,
    },
    Rect {
        rect: Rect,
        fill: Color32,
    },
    Text {
        position: Pos2,
        text: String,
        color: Color32,
    },
}

/// Recording surface for headless runs and tests. Text is measured with a
/// fixed advance per character.
#[derive(Clone, Debug)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
    transform: SurfaceTransform,
    available: bool,
}

impl Default for CommandList {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            transform: SurfaceTransform::IDENTITY,
            available: true,
        }
    }
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing (`false`) or regaining the underlying context.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Circle { .. }))
            .count()
    }
}

impl DrawSurface for CommandList {
    fn begin_frame(&mut self, canvas: Rect) -> Result<(), SurfaceError> {
        if !self.available {
            return Err(SurfaceError::Lost("recording surface disabled".to_owned()));
        }
        if !canvas.is_finite() || !canvas.is_positive() {
            return Err(SurfaceError::Degenerate {
                width: canvas.width(),
                height: canvas.height(),
            });
        }
        self.commands.clear();
        self.transform = SurfaceTransform::IDENTITY;
        Ok(())
    }

    fn clear(&mut self, color: Color32) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn set_transform(&mut self, transform: SurfaceTransform) {
        self.transform = transform;
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.commands.push(DrawCommand::Line {
            from: self.transform.apply(from),
            to: self.transform.apply(to),
            stroke,
        });
    }

    fn quadratic(&mut self, from: Pos2, control: Pos2, to: Pos2, stroke: Stroke) {
        self.commands.push(DrawCommand::Quadratic {
            from: self.transform.apply(from),
            control: self.transform.apply(control),
            to: self.transform.apply(to),
            stroke,
        });
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.commands.push(DrawCommand::Circle {
            center: self.transform.apply(center),
            radius: self.transform.apply_length(radius),
            fill,
            stroke,
        });
    }

    fn polygon(&mut self, points: &[Pos2], fill: Color32) {
        self.commands.push(DrawCommand::Polygon {
            points: points.iter().map(|point| self.transform.apply(*point)).collect(),
            fill,
        });
    }

    fn rect(&mut self, rect: Rect, fill: Color32, _stroke: Stroke) {
        self.commands.push(DrawCommand::Rect {
            rect: Rect::from_min_max(
                self.transform.apply(rect.min),
                self.transform.apply(rect.max),
            ),
            fill,
        });
    }

    fn measure_text(&self, text: &str, size: f32) -> Vec2 {
        Vec2::new(text.chars().count() as f32 * size * 0.55, size * 1.2)
    }

    fn text(&mut self, position: Pos2, _anchor: Align2, text: &str, _size: f32, color: Color32) {
        self.commands.push(DrawCommand::Text {
            position: self.transform.apply(position),
            text: text.to_owned(),
            color,
        });
    }
}
