use crate::exercise::ExerciseKind;
use crate::pose::{Point2, Pose, POSE_CONNECTIONS};
use crate::workout::FrameReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    const STATUS_BOX: Color = Color::rgb(16, 117, 245);
    const BONE: Color = Color::rgb(230, 66, 245);
    const JOINT: Color = Color::rgb(66, 117, 245);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Filled rectangle between two corners.
    Rect {
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: Color,
    },
    /// Text with its baseline starting at `origin`.
    Text {
        text: String,
        origin: (i32, i32),
        scale: f64,
        color: Color,
    },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        color: Color,
    },
    Circle {
        center: (i32, i32),
        radius: i32,
        color: Color,
    },
}

fn to_pixel(point: Point2, width: u32, height: u32) -> (i32, i32) {
    ((point.x * width as f32) as i32, (point.y * height as f32) as i32)
}

fn text(text: impl Into<String>, origin: (i32, i32), scale: f64, color: Color) -> Directive {
    Directive::Text {
        text: text.into(),
        origin,
        scale,
        color,
    }
}

/// Rep counter, stage and exercise name panel plus the angle at the joint.
/// Empty while no exercise is selected.
pub fn hud(report: &FrameReport, width: u32, height: u32) -> Vec<Directive> {
    let Some(active) = &report.active else {
        return Vec::new();
    };

    let mut directives = Vec::with_capacity(7);
    if let Some(angle) = active.angle {
        directives.push(text(
            format!("{}", angle as i32),
            to_pixel(active.vertex, width, height),
            0.5,
            Color::WHITE,
        ));
    }

    directives.push(Directive::Rect {
        top_left: (0, 0),
        bottom_right: (300, 100),
        color: Color::STATUS_BOX,
    });
    directives.push(text("REPS", (10, 30), 0.7, Color::BLACK));
    // count flashes green on the frame a rep lands
    let count_color = if active.rep_completed { Color::GREEN } else { Color::WHITE };
    directives.push(text(active.reps.to_string(), (10, 70), 2.0, count_color));
    directives.push(text("STAGE", (150, 30), 0.7, Color::BLACK));
    directives.push(text(active.stage.label(), (150, 70), 2.0, Color::WHITE));
    directives.push(text(exercise_caption(active.kind), (10, 120), 0.7, Color::GREEN));
    directives
}

fn exercise_caption(kind: ExerciseKind) -> String {
    format!("Exercise: {kind}")
}

/// Bones between connected joints and a dot per landmark.
pub fn skeleton(pose: &Pose, width: u32, height: u32) -> Vec<Directive> {
    let bones = POSE_CONNECTIONS.iter().map(|&(a, b)| Directive::Line {
        from: to_pixel(pose.point(a), width, height),
        to: to_pixel(pose.point(b), width, height),
        color: Color::BONE,
    });
    let joints = pose.landmarks().iter().map(|lm| Directive::Circle {
        center: to_pixel(lm.point(), width, height),
        radius: 2,
        color: Color::JOINT,
    });
    bones.chain(joints).collect()
}

#[cfg(feature = "camera")]
pub use window::OverlayWindow;

#[cfg(feature = "camera")]
mod window {
    use anyhow::Result;
    use opencv::core::{Mat, Point, Rect, Scalar};
    use opencv::{highgui, imgproc};

    use super::{Color, Directive};
    use crate::trainer::FrameSink;

    const QUIT_KEY: i32 = 'q' as i32;

    fn scalar(color: Color) -> Scalar {
        // OpenCV frames are BGR
        Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.0)
    }

    /// HighGUI window showing the annotated camera feed.
    pub struct OverlayWindow {
        title: String,
    }

    impl OverlayWindow {
        pub fn new(title: &str) -> Result<Self> {
            highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
            Ok(Self {
                title: title.to_string(),
            })
        }

        pub fn draw(&self, frame: &mut Mat, directives: &[Directive]) -> Result<()> {
            for directive in directives {
                match directive {
                    Directive::Rect {
                        top_left,
                        bottom_right,
                        color,
                    } => {
                        let rect = Rect::new(
                            top_left.0,
                            top_left.1,
                            bottom_right.0 - top_left.0,
                            bottom_right.1 - top_left.1,
                        );
                        imgproc::rectangle(frame, rect, scalar(*color), imgproc::FILLED, imgproc::LINE_8, 0)?;
                    }
                    Directive::Text {
                        text,
                        origin,
                        scale,
                        color,
                    } => {
                        imgproc::put_text(
                            frame,
                            text,
                            Point::new(origin.0, origin.1),
                            imgproc::FONT_HERSHEY_SIMPLEX,
                            *scale,
                            scalar(*color),
                            2,
                            imgproc::LINE_AA,
                            false,
                        )?;
                    }
                    Directive::Line { from, to, color } => {
                        imgproc::line(
                            frame,
                            Point::new(from.0, from.1),
                            Point::new(to.0, to.1),
                            scalar(*color),
                            2,
                            imgproc::LINE_8,
                            0,
                        )?;
                    }
                    Directive::Circle { center, radius, color } => {
                        imgproc::circle(
                            frame,
                            Point::new(center.0, center.1),
                            *radius,
                            scalar(*color),
                            2,
                            imgproc::LINE_8,
                            0,
                        )?;
                    }
                }
            }
            Ok(())
        }

        pub fn show(&self, frame: &Mat) -> Result<()> {
            highgui::imshow(&self.title, frame)?;
            Ok(())
        }

        /// Pumps window events; true once the quit key was pressed.
        pub fn quit_requested(&self) -> Result<bool> {
            let key = highgui::wait_key(10)?;
            Ok(key & 0xFF == QUIT_KEY)
        }
    }

    impl FrameSink<Mat> for OverlayWindow {
        fn draw(&mut self, frame: &mut Mat, directives: &[Directive]) -> Result<()> {
            OverlayWindow::draw(self, frame, directives)
        }

        fn show(&mut self, frame: &Mat) -> Result<()> {
            OverlayWindow::show(self, frame)
        }

        fn quit_requested(&mut self) -> Result<bool> {
            OverlayWindow::quit_requested(self)
        }
    }

    impl Drop for OverlayWindow {
        fn drop(&mut self) {
            let _ = highgui::destroy_window(&self.title);
        }
    }
}
