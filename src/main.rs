// Copyright (c) 2026 James O. Schreckengast
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use ouroboros::self_referencing;
use pixels::{Pixels, SurfaceTexture};
use rand::Rng;
use rusttype::{Font, Scale};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Embedded font data (DejaVu Sans Bold - Bitstream Vera derived license).
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Lazily-initialized cached font to avoid loading on every render.
fn get_font() -> &'static Font<'static> {
    static FONT: OnceLock<Font<'static>> = OnceLock::new();
    FONT.get_or_init(|| Font::try_from_bytes(FONT_DATA).expect("Failed to load embedded font"))
}

// Colors
const BACKGROUND_COLOR: [u8; 4] = [10, 10, 10, 255];
const MENU_COLOR_MAIN: [u8; 4] = [210, 210, 210, 255];
const MENU_COLOR_SECONDARY: [u8; 4] = [100, 100, 100, 255];

// Physics constants
const TARGET_FPS: f64 = 120.0;
const MAX_FRAME_DT: f64 = 0.05;
const SPEED_SCALE: f64 = 0.5;
const EDGE_MARGIN: f64 = 10.0;
const BALL_RADIUS: i32 = 5;
const DISTANCE_EPSILON: f64 = 0.0001;

// Speed-to-color tuning
const HUE_SPEED_DIVISOR: f64 = 60.0;
const VALUE_SPEED_DIVISOR: f64 = 5.0;
const HSV_CEILING: f64 = 0.95;

// Menu layout constants
const SLIDER_BAR_HEIGHT: f64 = 8.0;
const SLIDER_CAP_RADIUS: i32 = 4;
const SLIDER_CLICK_RANGE: f64 = 10.0;
const SLIDER_OFFSETS: [f64; 4] = [-300.0, -100.0, 100.0, 300.0];
const LABEL_OFFSET: f64 = 30.0;
const VALUE_TEXT_GAP: f64 = 10.0;
const LABEL_FONT_SIZE: f32 = 32.0;
const QUIT_FONT_SIZE: f32 = 64.0;

// Parameter indices, in menu display order
const FRICTION_PARAM: usize = 0;
const PULL_DISTANCE_PARAM: usize = 1;
const PULL_STRENGTH_PARAM: usize = 2;
const POPULATION_PARAM: usize = 3;

// =============================================================================
// Type conversion helpers for graphics code
// =============================================================================
// These functions document the intent of narrowing conversions that are
// inherent to graphics programming (float coords -> integer pixels, etc.)

/// Convert f64 coordinate to signed pixel position (truncates toward zero).
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn coord_to_pixel(v: f64) -> i32 {
    v as i32
}

/// Convert f64 to unsigned dimension, clamping negative values to 0.
/// Used for pixel buffer indexing where negative values are invalid.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coord_to_pixel_unsigned(v: f64) -> u32 {
    v.max(0.0) as u32
}

/// Convert f64 color component (0.0-255.0) to u8.
/// Values are clamped to valid range.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color_component(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Convert f32 color component (0.0-255.0) to u8.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color_component_f32(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Truncate a hue scaled into six sectors to its sector index.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hue_sector(scaled_hue: f64) -> u32 {
    scaled_hue as u32
}

/// Convert physical pixels to logical pixels given a scale factor.
/// Used for display size calculations where we need logical dimensions.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn physical_to_logical(physical: u32, scale_factor: f64) -> u32 {
    (f64::from(physical) / scale_factor) as u32
}

/// Convert an HSV color (all components in [0, 1]) to an RGBA draw color.
/// Channels are truncated, not rounded, when scaled to the 0-255 range.
fn hsv_to_rgba(hue: f64, saturation: f64, value: f64) -> [u8; 4] {
    let scaled = hue * 6.0;
    let fraction = scaled - scaled.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * fraction);
    let t = value * (1.0 - saturation * (1.0 - fraction));

    let (red, green, blue) = match hue_sector(scaled) {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    [
        color_component(red * 255.0),
        color_component(green * 255.0),
        color_component(blue * 255.0),
        255,
    ]
}

/// Map a particle's speed to its draw color. Fast particles render as bright,
/// saturated, warm colors; stationary ones as near-black.
fn speed_color(speed: f64) -> [u8; 4] {
    let hue = (speed / HUE_SPEED_DIVISOR).clamp(0.0, HSV_CEILING);
    let value = (speed / VALUE_SPEED_DIVISOR).clamp(0.0, HSV_CEILING);
    hsv_to_rgba(hue, 1.0, value)
}

/// Direction of the pointer force applied to particles.
#[derive(Clone, Copy)]
enum PullDirection {
    Attract,
    Repel,
}

impl PullDirection {
    fn signum(self) -> f64 {
        match self {
            PullDirection::Attract => 1.0,
            PullDirection::Repel => -1.0,
        }
    }
}

/// A particle in the simulation with position and velocity.
struct Particle {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

impl Particle {
    /// Create a particle at a random position inside the edge margin,
    /// with zero velocity.
    fn new_random(width: u32, height: u32) -> Self {
        let mut rng = rand::thread_rng();
        Particle {
            x: rng.gen_range(EDGE_MARGIN..(f64::from(width) - EDGE_MARGIN)),
            y: rng.gen_range(EDGE_MARGIN..(f64::from(height) - EDGE_MARGIN)),
            vx: 0.0,
            vy: 0.0,
        }
    }

    fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// Advance one step: displace by `velocity * SPEED_SCALE * dt_scale`,
    /// reflect the velocity at the edge margins, apply friction, then clamp
    /// the position onto the screen. Order is fixed: reflect before friction
    /// before clamp, identically for both axes.
    fn integrate(&mut self, dt_scale: f64, friction: f64, width: u32, height: u32) {
        self.x += self.vx * SPEED_SCALE * dt_scale;
        self.y += self.vy * SPEED_SCALE * dt_scale;

        let width_f = f64::from(width);
        let height_f = f64::from(height);

        if self.x <= EDGE_MARGIN || self.x >= width_f - EDGE_MARGIN {
            self.vx = -self.vx;
        }
        if self.y <= EDGE_MARGIN || self.y >= height_f - EDGE_MARGIN {
            self.vy = -self.vy;
        }

        self.vx *= friction;
        self.vy *= friction;

        self.x = self.x.clamp(0.0, width_f);
        self.y = self.y.clamp(0.0, height_f);
    }

    /// Accumulate a pull toward (or away from) the target into the velocity.
    /// The force magnitude is `strength / distance` with a hard cutoff at
    /// `max_distance`; the epsilon floor guards the division when the target
    /// coincides with the particle.
    fn apply_pull(
        &mut self,
        target_x: f64,
        target_y: f64,
        strength: f64,
        max_distance: f64,
        direction: PullDirection,
    ) {
        let dx = target_x - self.x;
        let dy = target_y - self.y;
        let distance = (dx * dx + dy * dy).sqrt().max(DISTANCE_EPSILON);
        if distance > max_distance {
            return;
        }

        let ratio = strength / distance;
        self.vx += dx * ratio * direction.signum();
        self.vy += dy * ratio * direction.signum();
    }
}

/// The particle population. Regeneration discards every existing particle;
/// nothing carries over even when the count is unchanged.
struct Swarm {
    particles: Vec<Particle>,
}

impl Swarm {
    fn new() -> Self {
        Swarm {
            particles: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.particles.len()
    }

    /// Replace the collection with `count` fresh particles.
    fn regenerate(&mut self, count: usize, width: u32, height: u32) {
        self.particles = (0..count)
            .map(|_| Particle::new_random(width, height))
            .collect();
    }

    /// Integrate every particle. Particles are independent of each other.
    fn tick(&mut self, dt_scale: f64, friction: f64, width: u32, height: u32) {
        for particle in &mut self.particles {
            particle.integrate(dt_scale, friction, width, height);
        }
    }

    /// Apply the pointer pull to every particle with identical parameters.
    fn apply_pull(
        &mut self,
        target_x: f64,
        target_y: f64,
        strength: f64,
        max_distance: f64,
        direction: PullDirection,
    ) {
        for particle in &mut self.particles {
            particle.apply_pull(target_x, target_y, strength, max_distance, direction);
        }
    }
}

/// One tunable simulation parameter with its slider range.
struct SliderParam {
    label: &'static str,
    min: f64,
    max: f64,
    value: f64,
    /// Whole-number parameters (the ball count) truncate on assignment.
    integral: bool,
}

impl SliderParam {
    /// Assign a new value, clamped into the parameter's range.
    fn set(&mut self, value: f64) {
        let clamped = value.clamp(self.min, self.max);
        self.value = if self.integral {
            clamped.trunc()
        } else {
            clamped
        };
    }
}

/// The four live-adjustable simulation parameters, in menu display order.
struct ParamSet {
    params: [SliderParam; 4],
}

impl ParamSet {
    fn new() -> Self {
        ParamSet {
            params: [
                SliderParam {
                    label: "Friction",
                    min: 0.9,
                    max: 1.0,
                    value: 0.99,
                    integral: false,
                },
                SliderParam {
                    label: "Pull distance",
                    min: 200.0,
                    max: 800.0,
                    value: 400.0,
                    integral: false,
                },
                SliderParam {
                    label: "Pull strength",
                    min: 0.5,
                    max: 5.0,
                    value: 1.0,
                    integral: false,
                },
                SliderParam {
                    label: "Ball number",
                    min: 100.0,
                    max: 10000.0,
                    value: 1000.0,
                    integral: true,
                },
            ],
        }
    }

    fn friction(&self) -> f64 {
        self.params[FRICTION_PARAM].value
    }

    fn pull_distance(&self) -> f64 {
        self.params[PULL_DISTANCE_PARAM].value
    }

    fn pull_strength(&self) -> f64 {
        self.params[PULL_STRENGTH_PARAM].value
    }

    /// Safe: the population value is clamped to [100, 10000] and truncated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn population(&self) -> usize {
        self.params[POPULATION_PARAM].value as usize
    }
}

/// Map a parameter value to a horizontal pixel offset along a slider bar.
fn value_to_pos(value: f64, bar_width: f64, min: f64, max: f64) -> f64 {
    (value - min) * bar_width / (max - min)
}

/// Inverse of `value_to_pos`: recover a parameter value from a pixel offset.
fn pos_to_value(offset: f64, bar_width: f64, min: f64, max: f64) -> f64 {
    offset * (max - min) / bar_width + min
}

/// Format a parameter value for the menu: whole-number parameters plain,
/// fractional values rounded to four decimal places with trailing zeros
/// dropped.
fn format_value(param: &SliderParam) -> String {
    if param.integral {
        // Integral values are clamped well inside i64 range
        #[allow(clippy::cast_possible_truncation)]
        let whole = param.value as i64;
        return format!("{whole}");
    }
    let rounded = (param.value * 10000.0).round() / 10000.0;
    let mut text = format!("{rounded:.4}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.push('0');
    }
    text
}

/// Axis-aligned rectangle in logical pixels, for menu hit-testing and fills.
#[derive(Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Pixel geometry of the parameter menu, fixed once the window size is known.
/// Each slider's hit rectangle extends the bar by the click range above and
/// below so the thin bar is comfortable to grab.
struct MenuLayout {
    slider_centers: [(f64, f64); 4],
    slider_rects: [Rect; 4],
    bar_width: f64,
    quit_rect: Rect,
}

impl MenuLayout {
    fn new(width: u32, height: u32) -> Self {
        let width_f = f64::from(width);
        let height_f = f64::from(height);
        let bar_width = width_f / 3.0;

        let slider_centers = SLIDER_OFFSETS.map(|dy| (width_f / 2.0, height_f / 2.0 + dy));
        let slider_rects = slider_centers.map(|(cx, cy)| Rect {
            x: cx - bar_width / 2.0,
            y: cy - SLIDER_BAR_HEIGHT / 2.0 - SLIDER_CLICK_RANGE,
            w: bar_width,
            h: SLIDER_BAR_HEIGHT + 2.0 * SLIDER_CLICK_RANGE,
        });

        let quit_rect = Rect {
            x: width_f * 0.9,
            y: 20.0,
            w: width_f * 0.1 - 20.0,
            h: height_f * 0.1 - 20.0,
        };

        MenuLayout {
            slider_centers,
            slider_rects,
            bar_width,
            quit_rect,
        }
    }

    /// Which slider's hit rectangle contains the point, if any.
    fn slider_at(&self, x: f64, y: f64) -> Option<usize> {
        self.slider_rects.iter().position(|rect| rect.contains(x, y))
    }
}

/// Whether the frame loop is running the simulation or showing the menu.
#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Simulating,
    Menu,
}

/// Converts a held key or button into a single firing per press.
struct EdgeTrigger {
    armed: bool,
}

impl EdgeTrigger {
    fn new() -> Self {
        EdgeTrigger { armed: true }
    }

    /// Returns true exactly once per press; re-arms when released.
    fn fire(&mut self, pressed: bool) -> bool {
        if pressed {
            let fired = self.armed;
            self.armed = false;
            fired
        } else {
            self.armed = true;
            false
        }
    }
}

/// Pointer state tracked from window events, in logical pixels.
#[derive(Default)]
struct PointerState {
    x: f64,
    y: f64,
    left_down: bool,
    right_down: bool,
}

/// Held state of the two control keys.
#[derive(Default)]
struct KeyState {
    menu_down: bool,
    reset_down: bool,
}

/// Clear the whole frame to the background color.
fn clear_frame(frame: &mut [u8]) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&BACKGROUND_COLOR);
    }
}

/// Draw a filled circle, clipped to the frame bounds.
fn fill_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: f64,
    cy: f64,
    radius: i32,
    color: [u8; 4],
) {
    let center_x = coord_to_pixel(cx);
    let center_y = coord_to_pixel(cy);
    let radius_sq = radius * radius;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            let px = center_x + dx;
            let py = center_y + dy;

            // Bounds check: px/py are valid pixel coordinates after this check
            #[allow(clippy::cast_sign_loss)]
            if px >= 0 && (px as u32) < width && py >= 0 && (py as u32) < height {
                let idx = ((py as u32) * width + (px as u32)) as usize * 4;
                frame[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }
}

/// Fill an axis-aligned rectangle, clipped to the frame bounds.
fn fill_rect(frame: &mut [u8], width: u32, height: u32, rect: Rect, color: [u8; 4]) {
    let x_start = coord_to_pixel_unsigned(rect.x);
    let y_start = coord_to_pixel_unsigned(rect.y);
    let x_end = coord_to_pixel_unsigned((rect.x + rect.w).ceil()).min(width);
    let y_end = coord_to_pixel_unsigned((rect.y + rect.h).ceil()).min(height);

    for y in y_start..y_end {
        for x in x_start..x_end {
            let idx = (y * width + x) as usize * 4;
            frame[idx..idx + 4].copy_from_slice(&color);
        }
    }
}

/// Lay out a string at the given size and return its pixel width and height.
fn measure_text(text: &str, font_size: f32) -> (f32, f32) {
    let font = get_font();
    let scale = Scale::uniform(font_size);
    let v_metrics = font.v_metrics(scale);
    let text_width = font
        .layout(text, scale, rusttype::point(0.0, 0.0))
        .last()
        .map_or(0.0, |glyph| {
            glyph.position().x + glyph.unpositioned().h_metrics().advance_width
        });
    (text_width, v_metrics.ascent - v_metrics.descent)
}

/// Draw text with its top-left corner at the given position, blending glyph
/// coverage over the existing frame contents.
#[allow(clippy::cast_possible_truncation, clippy::too_many_arguments)]
fn draw_text(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: f64,
    y: f64,
    text: &str,
    font_size: f32,
    color: [u8; 4],
) {
    let font = get_font();
    let scale = Scale::uniform(font_size);
    let v_metrics = font.v_metrics(scale);
    let origin = rusttype::point(x as f32, y as f32 + v_metrics.ascent);

    for glyph in font.layout(text, scale, origin) {
        if let Some(bounding_box) = glyph.pixel_bounding_box() {
            glyph.draw(|glyph_x, glyph_y, coverage| {
                // Font library provides u32 glyph coords, bounding box has i32 positions
                #[allow(clippy::cast_possible_wrap)]
                let px = bounding_box.min.x + glyph_x as i32;
                #[allow(clippy::cast_possible_wrap)]
                let py = bounding_box.min.y + glyph_y as i32;

                // Only render if within bounds and coverage is significant
                #[allow(clippy::cast_sign_loss)]
                if px >= 0
                    && (px as u32) < width
                    && py >= 0
                    && (py as u32) < height
                    && coverage > 0.1
                {
                    let idx = (py as u32 * width + px as u32) as usize * 4;
                    let alpha = u16::from(color_component_f32(coverage * 255.0));
                    for channel in 0..3 {
                        let src = u16::from(color[channel]);
                        let dst = u16::from(frame[idx + channel]);
                        frame[idx + channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
                    }
                    frame[idx + 3] = 255;
                }
            });
        }
    }
}

/// Draw text centered on a point.
#[allow(clippy::too_many_arguments)]
fn draw_text_centered(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: f64,
    cy: f64,
    text: &str,
    font_size: f32,
    color: [u8; 4],
) {
    let (text_width, text_height) = measure_text(text, font_size);
    draw_text(
        frame,
        width,
        height,
        cx - f64::from(text_width) / 2.0,
        cy - f64::from(text_height) / 2.0,
        text,
        font_size,
        color,
    );
}

/// Draw text vertically centered with its left edge at the given x.
#[allow(clippy::too_many_arguments)]
fn draw_text_midleft(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: f64,
    cy: f64,
    text: &str,
    font_size: f32,
    color: [u8; 4],
) {
    let (_, text_height) = measure_text(text, font_size);
    draw_text(
        frame,
        width,
        height,
        x,
        cy - f64::from(text_height) / 2.0,
        text,
        font_size,
        color,
    );
}

/// Render every particle as a filled circle colored by its speed.
fn render_swarm(frame: &mut [u8], width: u32, height: u32, swarm: &Swarm) {
    for particle in &swarm.particles {
        fill_circle(
            frame,
            width,
            height,
            particle.x,
            particle.y,
            BALL_RADIUS,
            speed_color(particle.speed()),
        );
    }
}

/// Render one slider: a rounded bar, its handle at the mapped position, the
/// parameter name above, and the current value to the right.
#[allow(clippy::too_many_arguments)]
fn render_slider(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: f64,
    cy: f64,
    bar_width: f64,
    param: &SliderParam,
) {
    let bar_left = cx - bar_width / 2.0;
    let bar_top = cy - SLIDER_BAR_HEIGHT / 2.0;

    fill_rect(
        frame,
        width,
        height,
        Rect {
            x: bar_left,
            y: bar_top,
            w: bar_width,
            h: SLIDER_BAR_HEIGHT,
        },
        MENU_COLOR_SECONDARY,
    );
    fill_circle(
        frame,
        width,
        height,
        bar_left,
        cy,
        SLIDER_CAP_RADIUS,
        MENU_COLOR_SECONDARY,
    );
    fill_circle(
        frame,
        width,
        height,
        bar_left + bar_width,
        cy,
        SLIDER_CAP_RADIUS,
        MENU_COLOR_SECONDARY,
    );

    let handle_x = bar_left + value_to_pos(param.value, bar_width, param.min, param.max);
    fill_rect(
        frame,
        width,
        height,
        Rect {
            x: handle_x - SLIDER_BAR_HEIGHT / 2.0,
            y: bar_top,
            w: SLIDER_BAR_HEIGHT,
            h: SLIDER_BAR_HEIGHT,
        },
        MENU_COLOR_MAIN,
    );
    fill_circle(
        frame,
        width,
        height,
        handle_x,
        bar_top,
        SLIDER_CAP_RADIUS,
        MENU_COLOR_MAIN,
    );
    fill_circle(
        frame,
        width,
        height,
        handle_x,
        bar_top + SLIDER_BAR_HEIGHT,
        SLIDER_CAP_RADIUS,
        MENU_COLOR_MAIN,
    );

    draw_text_centered(
        frame,
        width,
        height,
        cx,
        cy - LABEL_OFFSET,
        param.label,
        LABEL_FONT_SIZE,
        MENU_COLOR_MAIN,
    );
    draw_text_midleft(
        frame,
        width,
        height,
        cx + bar_width / 2.0 + VALUE_TEXT_GAP,
        cy,
        &format_value(param),
        LABEL_FONT_SIZE,
        MENU_COLOR_MAIN,
    );
}

/// Render the parameter sliders and the quit button.
fn render_menu(frame: &mut [u8], width: u32, height: u32, layout: &MenuLayout, params: &ParamSet) {
    for (index, param) in params.params.iter().enumerate() {
        let (cx, cy) = layout.slider_centers[index];
        render_slider(frame, width, height, cx, cy, layout.bar_width, param);
    }

    fill_rect(frame, width, height, layout.quit_rect, MENU_COLOR_SECONDARY);
    let (quit_cx, quit_cy) = layout.quit_rect.center();
    draw_text_centered(
        frame,
        width,
        height,
        quit_cx,
        quit_cy,
        "Quit",
        QUIT_FONT_SIZE,
        MENU_COLOR_MAIN,
    );
}

/// Sleep out the remainder of the frame budget to hold the target frame rate.
fn pace_frame(frame_start: Instant) {
    let budget = Duration::from_secs_f64(1.0 / TARGET_FPS);
    let elapsed = frame_start.elapsed();
    if elapsed < budget {
        std::thread::sleep(budget - elapsed);
    }
}

/// GPU render target using ouroboros for safe self-referential struct.
/// Pixels borrows from Window, so they must be in the same struct.
/// Uses Rc<Window> to allow sharing the window with fallback logic.
#[self_referencing]
struct GpuSink {
    window: Rc<Window>,
    width: u32,
    height: u32,
    #[borrows(window)]
    #[covariant]
    pixels: Pixels<'this>,
}

/// CPU render target using softbuffer (no self-reference needed).
struct CpuSink {
    window: Rc<Window>,
    width: u32,           // Logical width (for simulation/rendering)
    height: u32,          // Logical height (for simulation/rendering)
    physical_width: u32,  // Physical width (for softbuffer surface)
    physical_height: u32, // Physical height (for softbuffer surface)
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    buffer: Vec<u8>, // RGBA buffer for rendering functions (logical size)
}

/// Render target abstraction supporting both GPU and CPU backends.
enum RenderSink {
    Gpu(Box<GpuSink>),
    Cpu(CpuSink),
}

impl RenderSink {
    /// Get the window reference for requesting redraws.
    fn window(&self) -> &Window {
        match self {
            RenderSink::Gpu(sink) => sink.borrow_window(),
            RenderSink::Cpu(sink) => &sink.window,
        }
    }

    /// Get the logical width.
    fn width(&self) -> u32 {
        match self {
            RenderSink::Gpu(sink) => *sink.borrow_width(),
            RenderSink::Cpu(sink) => sink.width,
        }
    }

    /// Get the logical height.
    fn height(&self) -> u32 {
        match self {
            RenderSink::Gpu(sink) => *sink.borrow_height(),
            RenderSink::Cpu(sink) => sink.height,
        }
    }

    /// Get a mutable reference to the RGBA frame buffer and call a function with it.
    fn with_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        match self {
            RenderSink::Gpu(sink) => sink.with_pixels_mut(|pixels| f(pixels.frame_mut())),
            RenderSink::Cpu(sink) => f(sink.buffer.as_mut_slice()),
        }
    }

    /// Present the frame to the screen.
    fn present(&mut self) -> Result<(), String> {
        match self {
            RenderSink::Gpu(sink) => {
                sink.with_pixels_mut(|pixels| pixels.render().map_err(|e| e.to_string()))
            }
            RenderSink::Cpu(sink) => {
                let mut surface_buffer = sink.surface.buffer_mut().map_err(|e| e.to_string())?;

                // Scale from logical to physical dimensions using nearest-neighbor
                let logical_width = sink.width as usize;
                let logical_height = sink.height as usize;
                let physical_width = sink.physical_width as usize;
                let physical_height = sink.physical_height as usize;

                for py in 0..physical_height {
                    for px in 0..physical_width {
                        let lx = px * logical_width / physical_width;
                        let ly = py * logical_height / physical_height;

                        let src_idx = (ly * logical_width + lx) * 4;
                        let dst_idx = py * physical_width + px;

                        if src_idx + 2 < sink.buffer.len() {
                            let r = u32::from(sink.buffer[src_idx]);
                            let g = u32::from(sink.buffer[src_idx + 1]);
                            let b = u32::from(sink.buffer[src_idx + 2]);
                            surface_buffer[dst_idx] = (r << 16) | (g << 8) | b;
                        }
                    }
                }

                surface_buffer.present().map_err(|e| e.to_string())?;
                Ok(())
            }
        }
    }

    /// Resize the surface (for GPU backend only, when window size changes).
    fn resize_surface(&mut self, width: u32, height: u32) {
        if let RenderSink::Gpu(sink) = self {
            sink.with_pixels_mut(|pixels| {
                let _ = pixels.resize_surface(width, height);
            });
        }
    }
}

/// Create a GPU render sink using ouroboros for safe self-referential struct.
fn try_create_gpu_sink(
    window: &Rc<Window>,
    width: u32,
    height: u32,
) -> Result<GpuSink, pixels::Error> {
    GpuSinkTryBuilder {
        window: Rc::clone(window),
        width,
        height,
        #[allow(clippy::borrowed_box)]
        pixels_builder: |win: &Rc<Window>| {
            let size = win.inner_size();
            let surface_texture = SurfaceTexture::new(size.width, size.height, win.as_ref());
            Pixels::new(width, height, surface_texture)
        },
    }
    .try_build()
}

/// Create a CPU render sink using softbuffer as fallback.
/// `width` and `height` are logical dimensions for the simulation.
/// `physical_width` and `physical_height` are the actual surface dimensions.
fn create_cpu_sink(
    window: Rc<Window>,
    width: u32,
    height: u32,
    physical_width: u32,
    physical_height: u32,
) -> CpuSink {
    let context =
        softbuffer::Context::new(Rc::clone(&window)).expect("Failed to create softbuffer context");
    let mut surface = softbuffer::Surface::new(&context, Rc::clone(&window))
        .expect("Failed to create softbuffer surface");
    // Resize to physical dimensions - softbuffer works with actual pixels
    surface
        .resize(
            NonZeroU32::new(physical_width).expect("Width must be > 0"),
            NonZeroU32::new(physical_height).expect("Height must be > 0"),
        )
        .expect("Failed to resize softbuffer surface");
    // Render buffer uses logical dimensions
    let buffer = vec![0u8; (width as usize) * (height as usize) * 4];
    CpuSink {
        window,
        width,
        height,
        physical_width,
        physical_height,
        surface,
        buffer,
    }
}

/// Create a render sink, trying GPU first with CPU fallback.
fn create_render_sink(
    window: &Rc<Window>,
    width: u32,
    height: u32,
    physical_width: u32,
    physical_height: u32,
) -> RenderSink {
    match try_create_gpu_sink(window, width, height) {
        Ok(gpu_sink) => {
            println!("Rendering: GPU (pixels/wgpu)");
            gpu_sink.borrow_window().request_redraw();
            RenderSink::Gpu(Box::new(gpu_sink))
        }
        Err(_gpu_error) => {
            println!("GPU unavailable, using CPU rendering");
            let cpu_sink = create_cpu_sink(
                Rc::clone(window),
                width,
                height,
                physical_width,
                physical_height,
            );
            println!("Rendering: CPU (softbuffer)");
            window.request_redraw();
            RenderSink::Cpu(cpu_sink)
        }
    }
}

/// Main application state for the particle playground.
struct App {
    // Window and rendering (initialized on resume)
    render: Option<RenderSink>,
    scale_factor: f64,

    // Simulation state
    swarm: Swarm,
    params: ParamSet,
    mode: Mode,
    layout: Option<MenuLayout>,

    // Input state
    pointer: PointerState,
    keys: KeyState,
    menu_trigger: EdgeTrigger,
    reset_trigger: EdgeTrigger,
    click_trigger: EdgeTrigger,
    dragged_slider: Option<usize>,
    quit_requested: bool,

    // Timing
    last_time: Instant,
    frame_count: u64,
    fps_timer: Instant,
    warmup_frames: u32,
}

impl App {
    fn new() -> Self {
        App {
            render: None,
            scale_factor: 1.0,
            swarm: Swarm::new(),
            params: ParamSet::new(),
            mode: Mode::Simulating,
            layout: None,
            pointer: PointerState::default(),
            keys: KeyState::default(),
            menu_trigger: EdgeTrigger::new(),
            reset_trigger: EdgeTrigger::new(),
            click_trigger: EdgeTrigger::new(),
            dragged_slider: None,
            quit_requested: false,
            last_time: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
            warmup_frames: 3,
        }
    }

    /// Initialize simulation state: particles, menu geometry, and timers.
    fn init_simulation_state(&mut self, width: u32, height: u32) {
        self.swarm
            .regenerate(self.params.population(), width, height);
        self.layout = Some(MenuLayout::new(width, height));
        println!("Particles: {}", self.swarm.len());

        self.last_time = Instant::now();
        self.fps_timer = Instant::now();
    }

    /// Simulation-mode frame update: pointer pull, then integration.
    fn update_simulation(&mut self, dt_scale: f64, width: u32, height: u32) {
        if self.pointer.left_down {
            self.swarm.apply_pull(
                self.pointer.x,
                self.pointer.y,
                self.params.pull_strength(),
                self.params.pull_distance(),
                PullDirection::Attract,
            );
        } else if self.pointer.right_down {
            self.swarm.apply_pull(
                self.pointer.x,
                self.pointer.y,
                self.params.pull_strength(),
                self.params.pull_distance(),
                PullDirection::Repel,
            );
        }

        self.swarm
            .tick(dt_scale, self.params.friction(), width, height);
    }

    /// Menu-mode frame update: slider dragging and the quit button.
    fn update_menu(&mut self, clicked: bool, width: u32, height: u32) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };

        if clicked {
            if layout.quit_rect.contains(self.pointer.x, self.pointer.y) {
                self.quit_requested = true;
                return;
            }
            self.dragged_slider = layout.slider_at(self.pointer.x, self.pointer.y);
        }

        if !self.pointer.left_down {
            self.dragged_slider = None;
            return;
        }

        if let Some(index) = self.dragged_slider {
            let rect = layout.slider_rects[index];
            let bar_width = layout.bar_width;
            // Clamping to the bar span keeps the mapped value inside its range
            let offset = (self.pointer.x - rect.x).clamp(0.0, bar_width);

            let previous_population = self.params.population();
            let param = &mut self.params.params[index];
            let value = pos_to_value(offset, bar_width, param.min, param.max);
            param.set(value);

            if index == POPULATION_PARAM && self.params.population() != previous_population {
                self.swarm
                    .regenerate(self.params.population(), width, height);
            }
        }
    }

    /// Update FPS counter and print statistics.
    fn update_fps_counter(&mut self) {
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            // Precision loss acceptable: frame_count is small relative to f64 mantissa
            #[allow(clippy::cast_precision_loss)]
            let fps = self.frame_count as f64 / elapsed;
            println!("FPS: {fps:.1}, Particles: {}", self.swarm.len());
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }

    fn update_and_render(&mut self) {
        // Get dimensions from render sink (if available)
        let Some((width, height)) = self.render.as_ref().map(|r| (r.width(), r.height())) else {
            return;
        };
        let frame_start = Instant::now();

        // Warmup frames for GPU initialization
        if self.warmup_frames > 0 {
            self.warmup_frames -= 1;
            self.last_time = frame_start;
            self.fps_timer = frame_start;
            self.frame_count = 0;

            let swarm = &self.swarm;
            if let Some(ref mut render) = self.render {
                render.with_frame(|frame| {
                    clear_frame(frame);
                    render_swarm(frame, width, height, swarm);
                });
                render
                    .present()
                    .expect("Failed to render frame during warmup");
                render.window().request_redraw();
            }
            return;
        }

        let dt = frame_start
            .duration_since(self.last_time)
            .as_secs_f64()
            .min(MAX_FRAME_DT);
        self.last_time = frame_start;
        let dt_scale = dt * TARGET_FPS;

        if self.menu_trigger.fire(self.keys.menu_down) {
            self.mode = match self.mode {
                Mode::Simulating => Mode::Menu,
                Mode::Menu => Mode::Simulating,
            };
            self.dragged_slider = None;
        }
        if self.mode == Mode::Simulating && self.reset_trigger.fire(self.keys.reset_down) {
            self.swarm
                .regenerate(self.params.population(), width, height);
        }

        // Polled every frame so a press held across a mode switch cannot fire
        let clicked = self.click_trigger.fire(self.pointer.left_down);

        match self.mode {
            Mode::Simulating => self.update_simulation(dt_scale, width, height),
            Mode::Menu => self.update_menu(clicked, width, height),
        }

        // Render current state (borrow render only for this section)
        let swarm = &self.swarm;
        let params = &self.params;
        let layout = self.layout.as_ref();
        let mode = self.mode;
        if let Some(ref mut render) = self.render {
            render.with_frame(|frame| {
                clear_frame(frame);
                match (mode, layout) {
                    (Mode::Menu, Some(layout)) => {
                        render_menu(frame, width, height, layout, params);
                    }
                    _ => render_swarm(frame, width, height, swarm),
                }
            });
            render.present().expect("Failed to render frame");
            render.window().request_redraw();
        }

        self.update_fps_counter();
        pace_frame(frame_start);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.render.is_some() {
            return; // Already initialized
        }

        let window_attrs = Window::default_attributes()
            .with_title("Pully Particles - ESC for menu")
            .with_resizable(false)
            .with_fullscreen(Some(Fullscreen::Borderless(None)));

        println!("Window mode: fullscreen");

        let window = event_loop
            .create_window(window_attrs)
            .expect("Failed to create window");

        let physical_size = window.inner_size();
        let scale_factor = window.scale_factor();
        let width = physical_to_logical(physical_size.width, scale_factor);
        let height = physical_to_logical(physical_size.height, scale_factor);

        println!(
            "Window: {}x{} physical, {}x{} logical, scale={}",
            physical_size.width, physical_size.height, width, height, scale_factor
        );

        self.scale_factor = scale_factor;
        self.init_simulation_state(width, height);

        let window = Rc::new(window);
        self.render = Some(create_render_sink(
            &window,
            width,
            height,
            physical_size.width,
            physical_size.height,
        ));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                match key_code {
                    KeyCode::Escape => self.keys.menu_down = pressed,
                    KeyCode::Space => self.keys.reset_down = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.x = position.x / self.scale_factor;
                self.pointer.y = position.y / self.scale_factor;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.pointer.left_down = pressed,
                    MouseButton::Right => self.pointer.right_down = pressed,
                    _ => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(ref mut render) = self.render {
                    render.resize_surface(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.update_and_render();
                if self.quit_requested {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref render) = self.render {
            render.window().request_redraw();
        }
    }
}

fn main() {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    let _ = event_loop.run_app(&mut app);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn still_particle(x: f64, y: f64) -> Particle {
        Particle {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    #[test]
    fn integrate_keeps_position_in_bounds() {
        let mut particle = Particle {
            x: 200.0,
            y: 150.0,
            vx: 1000.0,
            vy: -777.0,
        };
        for _ in 0..100 {
            particle.integrate(1.0, 0.99, 400, 300);
            assert!((0.0..=400.0).contains(&particle.x), "x = {}", particle.x);
            assert!((0.0..=300.0).contains(&particle.y), "y = {}", particle.y);
        }
    }

    #[test]
    fn integrate_without_velocity_leaves_position() {
        let mut corner = still_particle(0.0, 0.0);
        let mut center = still_particle(100.0, 100.0);
        corner.integrate(1.0, 0.99, 600, 600);
        center.integrate(1.0, 0.99, 600, 600);
        assert_eq!((corner.x, corner.y), (0.0, 0.0));
        assert_eq!((center.x, center.y), (100.0, 100.0));
    }

    #[test]
    fn integrate_reflects_at_edge_margin() {
        let mut particle = Particle {
            x: 12.0,
            y: 300.0,
            vx: -30.0,
            vy: 0.0,
        };
        particle.integrate(1.0, 1.0, 600, 600);
        // Displaced to -3, reflected, clamped back onto the screen
        assert_eq!(particle.vx, 30.0);
        assert_eq!(particle.x, 0.0);
        assert_eq!(particle.y, 300.0);
    }

    #[test]
    fn integrate_applies_friction_after_displacement() {
        let mut particle = Particle {
            x: 300.0,
            y: 300.0,
            vx: 10.0,
            vy: 0.0,
        };
        particle.integrate(1.0, 0.9, 600, 600);
        assert_close(particle.x, 305.0);
        assert_close(particle.vx, 9.0);
    }

    #[test]
    fn integrate_scales_displacement_with_dt() {
        let mut slow = Particle {
            x: 300.0,
            y: 300.0,
            vx: 10.0,
            vy: 0.0,
        };
        let mut fast = Particle {
            x: 300.0,
            y: 300.0,
            vx: 10.0,
            vy: 0.0,
        };
        slow.integrate(0.5, 1.0, 600, 600);
        fast.integrate(2.0, 1.0, 600, 600);
        assert_close(slow.x, 302.5);
        assert_close(fast.x, 310.0);
    }

    #[test]
    fn pull_is_noop_beyond_max_distance() {
        let mut particle = still_particle(0.0, 0.0);
        particle.apply_pull(500.0, 0.0, 1.0, 400.0, PullDirection::Attract);
        assert_eq!(particle.vx, 0.0);
        assert_eq!(particle.vy, 0.0);
    }

    #[test]
    fn pull_applies_within_max_distance() {
        let mut particle = still_particle(0.0, 0.0);
        particle.apply_pull(300.0, 0.0, 1.0, 400.0, PullDirection::Attract);
        assert!(particle.vx > 0.0);
        assert_eq!(particle.vy, 0.0);
    }

    #[test]
    fn pull_toward_target_directly_above() {
        let mut particle = still_particle(50.0, 50.0);
        particle.apply_pull(50.0, 150.0, 1.0, 400.0, PullDirection::Attract);
        // Distance is exactly 100, so the pull is (0, 100 * 1/100)
        assert_eq!(particle.vx, 0.0);
        assert!(particle.vy > 0.0);
        assert_close(particle.vy, 1.0);
    }

    #[test]
    fn attract_and_repel_are_opposite() {
        let mut attracted = still_particle(50.0, 60.0);
        let mut repelled = still_particle(50.0, 60.0);
        attracted.apply_pull(90.0, 80.0, 2.0, 400.0, PullDirection::Attract);
        repelled.apply_pull(90.0, 80.0, 2.0, 400.0, PullDirection::Repel);
        assert!(attracted.vx != 0.0);
        assert_eq!(attracted.vx, -repelled.vx);
        assert_eq!(attracted.vy, -repelled.vy);
    }

    #[test]
    fn pull_at_zero_distance_stays_finite() {
        let mut particle = still_particle(50.0, 50.0);
        particle.apply_pull(50.0, 50.0, 5.0, 400.0, PullDirection::Attract);
        assert!(particle.vx.is_finite());
        assert!(particle.vy.is_finite());
        assert_eq!(particle.vx, 0.0);
        assert_eq!(particle.vy, 0.0);
    }

    #[test]
    fn regenerate_replaces_whole_population() {
        let mut swarm = Swarm::new();
        swarm.regenerate(250, 800, 600);
        assert_eq!(swarm.len(), 250);
        for particle in &swarm.particles {
            assert_eq!(particle.vx, 0.0);
            assert_eq!(particle.vy, 0.0);
            assert!((10.0..=790.0).contains(&particle.x), "x = {}", particle.x);
            assert!((10.0..=590.0).contains(&particle.y), "y = {}", particle.y);
        }

        swarm.regenerate(100, 800, 600);
        assert_eq!(swarm.len(), 100);
    }

    #[test]
    fn swarm_pull_reaches_every_particle() {
        let mut swarm = Swarm::new();
        swarm.particles = vec![
            still_particle(100.0, 100.0),
            still_particle(200.0, 200.0),
            still_particle(300.0, 300.0),
        ];
        swarm.apply_pull(150.0, 150.0, 1.0, 400.0, PullDirection::Attract);
        for particle in &swarm.particles {
            assert!(particle.speed() > 0.0);
        }
    }

    #[test]
    fn value_pos_mapping_round_trips() {
        for &(value, bar_width, min, max) in &[
            (0.9, 640.0, 0.9, 1.0),
            (0.9543, 640.0, 0.9, 1.0),
            (1.0, 640.0, 0.9, 1.0),
            (200.0, 500.0, 200.0, 800.0),
            (433.7, 500.0, 200.0, 800.0),
            (2.25, 333.0, 0.5, 5.0),
            (100.0, 640.0, 100.0, 10000.0),
            (9999.0, 640.0, 100.0, 10000.0),
        ] {
            let pos = value_to_pos(value, bar_width, min, max);
            assert_close(pos_to_value(pos, bar_width, min, max), value);
        }
    }

    #[test]
    fn pos_mapping_endpoints() {
        assert_close(pos_to_value(0.0, 640.0, 0.9, 1.0), 0.9);
        assert_close(pos_to_value(640.0, 640.0, 0.9, 1.0), 1.0);
        assert_close(value_to_pos(0.9, 640.0, 0.9, 1.0), 0.0);
        assert_close(value_to_pos(1.0, 640.0, 0.9, 1.0), 640.0);
    }

    #[test]
    fn slider_param_clamps_and_truncates() {
        let mut params = ParamSet::new();
        params.params[FRICTION_PARAM].set(2.0);
        assert_eq!(params.friction(), 1.0);
        params.params[FRICTION_PARAM].set(0.5);
        assert_eq!(params.friction(), 0.9);

        params.params[POPULATION_PARAM].set(1234.9);
        assert_eq!(params.population(), 1234);
        params.params[POPULATION_PARAM].set(50.0);
        assert_eq!(params.population(), 100);
    }

    #[test]
    fn param_defaults_are_in_range() {
        let params = ParamSet::new();
        for param in &params.params {
            assert!(param.min < param.max);
            assert!((param.min..=param.max).contains(&param.value));
        }
        assert_eq!(params.friction(), 0.99);
        assert_eq!(params.pull_distance(), 400.0);
        assert_eq!(params.pull_strength(), 1.0);
        assert_eq!(params.population(), 1000);
    }

    #[test]
    fn format_value_trims_trailing_zeros() {
        let params = ParamSet::new();
        assert_eq!(format_value(&params.params[FRICTION_PARAM]), "0.99");
        assert_eq!(format_value(&params.params[PULL_DISTANCE_PARAM]), "400.0");
        assert_eq!(format_value(&params.params[PULL_STRENGTH_PARAM]), "1.0");
        assert_eq!(format_value(&params.params[POPULATION_PARAM]), "1000");

        let mut params = ParamSet::new();
        params.params[FRICTION_PARAM].set(0.987_654_3);
        assert_eq!(format_value(&params.params[FRICTION_PARAM]), "0.9877");
    }

    #[test]
    fn speed_color_is_black_when_still() {
        assert_eq!(speed_color(0.0), [0, 0, 0, 255]);
    }

    #[test]
    fn speed_color_distinguishes_slow_from_fast() {
        assert_ne!(speed_color(0.0), speed_color(10.0));
    }

    #[test]
    fn speed_color_saturates_past_both_caps() {
        assert_eq!(speed_color(100.0), speed_color(300.0));
    }

    #[test]
    fn speed_color_brightness_is_monotonic() {
        let mut previous = 0;
        for &speed in &[0.0, 0.5, 1.0, 2.0, 4.0, 10.0, 60.0] {
            let [r, g, b, _] = speed_color(speed);
            let brightest = r.max(g).max(b);
            assert!(brightest >= previous, "dimmed at speed {speed}");
            previous = brightest;
        }
    }

    #[test]
    fn hsv_primary_corners() {
        assert_eq!(hsv_to_rgba(0.0, 1.0, 1.0), [255, 0, 0, 255]);
        assert_eq!(hsv_to_rgba(1.0 / 3.0, 1.0, 1.0), [0, 255, 0, 255]);
        assert_eq!(hsv_to_rgba(0.5, 1.0, 1.0), [0, 255, 255, 255]);
    }

    #[test]
    fn hsv_zero_saturation_is_grey() {
        assert_eq!(hsv_to_rgba(0.25, 0.0, 0.5), [127, 127, 127, 255]);
    }

    #[test]
    fn edge_trigger_fires_once_per_press() {
        let mut trigger = EdgeTrigger::new();
        assert!(trigger.fire(true));
        assert!(!trigger.fire(true));
        assert!(!trigger.fire(false));
        assert!(trigger.fire(true));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect {
            x: 10.0,
            y: 20.0,
            w: 30.0,
            h: 40.0,
        };
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(39.9, 59.9));
        assert!(!rect.contains(40.0, 30.0));
        assert!(!rect.contains(20.0, 60.0));
        assert!(!rect.contains(9.9, 30.0));
    }

    #[test]
    fn menu_layout_hit_testing() {
        let layout = MenuLayout::new(1920, 1080);
        assert_eq!(layout.bar_width, 640.0);

        // First slider: centered at (960, 240), bar from x 640 to 1280
        assert_eq!(layout.slider_centers[0], (960.0, 240.0));
        assert_eq!(layout.slider_at(650.0, 230.0), Some(0));
        assert_eq!(layout.slider_at(960.0, 440.0), Some(1));
        assert_eq!(layout.slider_at(650.0, 300.0), None);
        assert_eq!(layout.slider_at(600.0, 240.0), None);

        assert!(layout.quit_rect.contains(1800.0, 50.0));
        assert!(!layout.quit_rect.contains(1700.0, 50.0));
    }

    #[test]
    fn slider_rect_covers_click_range() {
        let layout = MenuLayout::new(1920, 1080);
        let rect = layout.slider_rects[0];
        let (_, cy) = layout.slider_centers[0];
        // 8-px bar plus 10 px of grab slack above and below
        assert_eq!(rect.h, 28.0);
        assert!(rect.contains(960.0, cy - 13.0));
        assert!(rect.contains(960.0, cy + 13.0));
        assert!(!rect.contains(960.0, cy - 15.0));
    }
}
