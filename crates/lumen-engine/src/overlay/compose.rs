use super::stats::{FrameSample, OverlayStats};

/// Distance in device pixels between the bar graph and the right/bottom edges.
pub const BAR_MARGIN: u32 = 10;

/// Rows over which the blue channel fades out.
const BLUE_FADE_ROWS: u32 = 30;

const FAST_FRAME_S: f64 = 1.0 / 60.0;
const SLOW_FRAME_S: f64 = 1.0 / 30.0;

/// One solid rectangle of the bar graph, in device pixels (top-left origin).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarSegment {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Straight-alpha RGBA in `[0, 1]`.
    pub color: [f32; 4],
}

/// Everything the overlay renderer draws for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub bars: Vec<BarSegment>,
    pub lines: Vec<String>,
}

/// Maps a frame duration onto `[0, 1]`: 0 at 60 FPS or faster, 1 at 30 FPS or
/// slower, linear in between.
pub fn normalized_frame_cost(dt_s: f64) -> f64 {
    ((dt_s - FAST_FRAME_S) / (SLOW_FRAME_S - FAST_FRAME_S)).clamp(0.0, 1.0)
}

/// Builds the overlay for one frame.
///
/// Column `i` of the graph shows ring slot `i` at `x = width - 10 - i`; its
/// height is one pixel per millisecond, rising from `BAR_MARGIN` above the
/// bottom edge and clipped to the surface. Text lines are the FPS line, the
/// average line, then `debug_lines` in push order.
pub fn compose(
    stats: &OverlayStats,
    sample: &FrameSample,
    device_width: u32,
    device_height: u32,
    debug_lines: Vec<String>,
) -> OverlayFrame {
    let mut bars = Vec::new();
    let max_height = device_height.saturating_sub(BAR_MARGIN);

    for (i, dt_ms) in stats.ring().iter().enumerate() {
        let Some(x) = device_width.checked_sub(BAR_MARGIN + i as u32) else {
            break;
        };

        let dt_s = dt_ms / 1000.0;
        let v = normalized_frame_cost(dt_s) as f32;
        let height = ((1000.0 * dt_s).floor().max(0.0) as u32).min(max_height);
        if height == 0 {
            continue;
        }

        // Bottom row of the column sits just above the margin.
        let base = device_height - BAR_MARGIN;

        let faded = height.min(BLUE_FADE_ROWS);
        for j in 0..faded {
            let blue = (1.0 - j as f32 / BLUE_FADE_ROWS as f32).max(0.0);
            bars.push(BarSegment {
                x,
                y: base - j - 1,
                width: 1,
                height: 1,
                color: [v, 1.0 - v, blue, 1.0],
            });
        }

        if height > faded {
            bars.push(BarSegment {
                x,
                y: base - height,
                width: 1,
                height: height - faded,
                color: [v, 1.0 - v, 0.0, 1.0],
            });
        }
    }

    let mut lines = Vec::with_capacity(2 + debug_lines.len());
    lines.push(sample.fps_text());
    lines.push(sample.avg_text());
    lines.extend(debug_lines);

    OverlayFrame { bars, lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_after(samples: &[f64], w: u32, h: u32, debug: Vec<String>) -> OverlayFrame {
        let mut stats = OverlayStats::new();
        let mut last = None;
        for &dt in samples {
            last = Some(stats.record(dt));
        }
        compose(&stats, &last.unwrap(), w, h, debug)
    }

    #[test]
    fn cost_is_clamped_and_linear() {
        assert_eq!(normalized_frame_cost(0.0), 0.0);
        assert_eq!(normalized_frame_cost(1.0 / 60.0), 0.0);
        assert_eq!(normalized_frame_cost(1.0 / 30.0), 1.0);
        assert_eq!(normalized_frame_cost(1.0), 1.0);
        let mid = (1.0 / 60.0 + 1.0 / 30.0) / 2.0;
        assert!((normalized_frame_cost(mid) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_fast_frame_produces_one_green_column() {
        let frame = frame_after(&[16.0], 600, 600, Vec::new());
        // 16 ms → 16 rows, all within the fade range.
        assert_eq!(frame.bars.len(), 16);
        assert!(frame.bars.iter().all(|b| b.x == 600 - 10));
        let bottom = frame.bars[0];
        assert_eq!(bottom.y, 600 - 10 - 1);
        assert_eq!(bottom.color, [0.0, 1.0, 1.0, 1.0]);
        let top = frame.bars[15];
        assert_eq!(top.y, 600 - 10 - 16);
        assert_eq!(top.color[2], 0.5);
    }

    #[test]
    fn slow_frame_is_red_with_solid_tail() {
        let frame = frame_after(&[50.0], 600, 600, Vec::new());
        assert_eq!(frame.bars.len(), 31);
        let tail = frame.bars[30];
        assert_eq!(tail.height, 20);
        assert_eq!(tail.y, 600 - 10 - 50);
        assert_eq!(tail.color, [1.0, 0.0, 0.0, 1.0]);
        assert!(frame.bars.iter().all(|b| b.color[0] == 1.0));
    }

    #[test]
    fn columns_follow_ring_order() {
        let frame = frame_after(&[5.0, 7.0], 600, 600, Vec::new());
        // Newest (7 ms) is slot 0 at the rightmost column.
        let newest: Vec<_> = frame.bars.iter().filter(|b| b.x == 590).collect();
        let older: Vec<_> = frame.bars.iter().filter(|b| b.x == 589).collect();
        assert_eq!(newest.len(), 7);
        assert_eq!(older.len(), 5);
    }

    #[test]
    fn bars_are_clipped_to_small_surfaces() {
        let frame = frame_after(&[500.0], 40, 30, Vec::new());
        let total: u32 = frame.bars.iter().map(|b| b.height).sum();
        assert_eq!(total, 20);
        assert!(frame.bars.iter().all(|b| b.y + b.height <= 20));

        // Narrower than the margin: nothing to draw.
        let frame = frame_after(&[16.0], 8, 600, Vec::new());
        assert!(frame.bars.is_empty());

        // Exactly the margin wide: the newest column lands on x = 0.
        let frame = frame_after(&[16.0, 16.0], 10, 600, Vec::new());
        assert_eq!(frame.bars.len(), 16);
        assert!(frame.bars.iter().all(|b| b.x == 0));
    }

    #[test]
    fn text_lines_follow_stats_then_debug_queue() {
        let frame = frame_after(
            &[16.0, 16.0],
            600,
            600,
            vec!["zoom 1.0".to_string(), "N 64".to_string()],
        );
        assert_eq!(frame.lines.len(), 4);
        assert!(frame.lines[0].ends_with(" FPS"));
        assert!(frame.lines[1].ends_with(" ms"));
        assert_eq!(frame.lines[2], "zoom 1.0");
        assert_eq!(frame.lines[3], "N 64");
    }
}
