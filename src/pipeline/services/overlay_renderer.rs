use image::imageops::FilterType;
use image::{Rgb, RgbImage};

use crate::common::{DetectionBox, GoalRegion, Keypoint, PoseSnapshot, Rect, POSE_CONNECTIONS};

const CONNECTOR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BALL_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
const GOAL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LINE_WIDTH: i64 = 2;
const LANDMARK_RADIUS: i64 = 2;
const CLIP_MARGIN: f64 = 8.0;

/// Draws the frame plus skeleton, ball and hoop overlays onto a fixed size
/// canvas.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    width: u32,
    height: u32,
}

impl OverlayRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render(
        &self,
        frame: &image::DynamicImage,
        pose: Option<&PoseSnapshot>,
        ball: Option<&DetectionBox>,
        goal: &GoalRegion,
    ) -> RgbImage {
        let mut canvas = if frame.width() == self.width && frame.height() == self.height {
            frame.to_rgb8()
        } else {
            image::imageops::resize(&frame.to_rgb8(), self.width, self.height, FilterType::Nearest)
        };

        if let Some(pose) = pose {
            self.draw_skeleton(&mut canvas, pose);
        }
        if let Some(ball) = ball {
            draw_rect(&mut canvas, &ball.bounds, BALL_COLOR);
        }
        draw_rect(&mut canvas, goal, GOAL_COLOR);

        canvas
    }

    fn draw_skeleton(&self, canvas: &mut RgbImage, pose: &PoseSnapshot) {
        for (from, to) in POSE_CONNECTIONS {
            let a = self.to_canvas(pose.landmark(*from));
            let b = self.to_canvas(pose.landmark(*to));
            draw_line(canvas, a, b, CONNECTOR_COLOR);
        }
        for keypoint in pose.landmarks() {
            let (x, y) = self.to_canvas(*keypoint);
            if on_canvas(canvas, x, y) {
                fill_square(canvas, x.round() as i64, y.round() as i64, LANDMARK_RADIUS, LANDMARK_COLOR);
            }
        }
    }

    fn to_canvas(&self, keypoint: Keypoint) -> (f64, f64) {
        (
            keypoint.x as f64 * self.width as f64,
            keypoint.y as f64 * self.height as f64,
        )
    }
}

fn on_canvas(canvas: &RgbImage, x: f64, y: f64) -> bool {
    x.is_finite()
        && y.is_finite()
        && x > -CLIP_MARGIN
        && y > -CLIP_MARGIN
        && x < canvas.width() as f64 + CLIP_MARGIN
        && y < canvas.height() as f64 + CLIP_MARGIN
}

fn put(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_square(canvas: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    for y in cy - radius..=cy + radius {
        for x in cx - radius..=cx + radius {
            put(canvas, x, y, color);
        }
    }
}

/// Liang-Barsky clip of a segment to the canvas grown by `CLIP_MARGIN`.
/// Returns `None` for segments that miss it or have non-finite endpoints.
fn clip_segment(canvas: &RgbImage, from: (f64, f64), to: (f64, f64)) -> Option<((i64, i64), (i64, i64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (min_x, min_y) = (-CLIP_MARGIN, -CLIP_MARGIN);
    let max_x = canvas.width() as f64 + CLIP_MARGIN;
    let max_y = canvas.height() as f64 + CLIP_MARGIN;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    let point = |t: f64| {
        (
            (from.0 + t * dx).round() as i64,
            (from.1 + t * dy).round() as i64,
        )
    };
    Some((point(t0), point(t1)))
}

// Bresenham, thickened by stamping a small square at each step.
fn draw_line(canvas: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let Some(((mut x, mut y), end)) = clip_segment(canvas, from, to) else {
        return;
    };
    let dx = (end.0 - x).abs();
    let dy = -(end.1 - y).abs();
    let sx = if x < end.0 { 1 } else { -1 };
    let sy = if y < end.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = LINE_WIDTH / 2;

    loop {
        fill_square(canvas, x, y, half, color);
        if x == end.0 && y == end.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_rect(canvas: &mut RgbImage, rect: &Rect, color: Rgb<u8>) {
    let left = rect.x as f64;
    let top = rect.y as f64;
    let right = left + rect.width as f64;
    let bottom = top + rect.height as f64;
    draw_line(canvas, (left, top), (right, top), color);
    draw_line(canvas, (right, top), (right, bottom), color);
    draw_line(canvas, (right, bottom), (left, bottom), color);
    draw_line(canvas, (left, bottom), (left, top), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::keypoint::fixtures;
    use image::DynamicImage;

    fn black_frame(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn test_render_scales_frame_to_canvas() {
        let renderer = OverlayRenderer::new(64, 48);
        let goal = Rect::new(500.0, 50.0, 60.0, 40.0);
        let canvas = renderer.render(&black_frame(320, 240), None, None, &goal);
        assert_eq!(canvas.dimensions(), (64, 48));
    }

    #[test]
    fn test_goal_outline_drawn_in_blue() {
        let renderer = OverlayRenderer::new(64, 48);
        let goal = Rect::new(10.0, 10.0, 20.0, 10.0);
        let canvas = renderer.render(&black_frame(64, 48), None, None, &goal);
        assert_eq!(*canvas.get_pixel(10, 10), GOAL_COLOR);
        assert_eq!(*canvas.get_pixel(20, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_ball_and_skeleton_drawn() {
        let renderer = OverlayRenderer::new(100, 100);
        let goal = Rect::new(90.0, 0.0, 5.0, 5.0);
        let ball = DetectionBox::new("sports ball", 0.9, Rect::new(5.0, 80.0, 10.0, 10.0));
        let pose = fixtures::pose(0.3, 0.4, 0.6, 0.8);

        let canvas = renderer.render(&black_frame(100, 100), Some(&pose), Some(&ball), &goal);
        assert_eq!(*canvas.get_pixel(5, 80), BALL_COLOR);
        // Every non-positioned landmark sits at the centre.
        assert_eq!(*canvas.get_pixel(50, 50), LANDMARK_COLOR);
    }

    #[test]
    fn test_offscreen_shapes_are_clipped() {
        let renderer = OverlayRenderer::new(32, 32);
        let goal = Rect::new(-100.0, -100.0, 500.0, 500.0);
        let canvas = renderer.render(&black_frame(32, 32), None, None, &goal);
        assert_eq!(canvas.dimensions(), (32, 32));
    }

    #[test]
    fn test_huge_ball_box_is_clipped_quickly() {
        let renderer = OverlayRenderer::new(64, 48);
        let goal = Rect::new(10.0, 10.0, 20.0, 10.0);
        let started = std::time::Instant::now();

        for width in [1e30_f32, 3e8, f32::INFINITY, f32::NAN] {
            let ball = DetectionBox::new("sports ball", 0.9, Rect::new(0.0, 0.0, width, 1.0));
            let canvas = renderer.render(&black_frame(64, 48), None, Some(&ball), &goal);
            assert_eq!(canvas.dimensions(), (64, 48));
        }
        let ball = DetectionBox::new("sports ball", 0.9, Rect::new(0.0, 20.0, 1e30, 1.0));
        let canvas = renderer.render(&black_frame(64, 48), None, Some(&ball), &goal);
        // The visible part of the top edge is still drawn.
        assert_eq!(*canvas.get_pixel(40, 20), BALL_COLOR);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_far_offscreen_landmarks_are_skipped() {
        let renderer = OverlayRenderer::new(32, 32);
        let goal = Rect::new(0.0, 0.0, 4.0, 4.0);
        let mut landmarks = vec![Keypoint::new(1e20, -1e20); crate::common::keypoint::POSE_LANDMARK_COUNT];
        landmarks[0] = Keypoint::new(f32::NAN, 0.5);
        let pose = PoseSnapshot::new(landmarks).unwrap();

        let canvas = renderer.render(&black_frame(32, 32), Some(&pose), None, &goal);
        assert_eq!(*canvas.get_pixel(16, 16), Rgb([0, 0, 0]));
    }
}
