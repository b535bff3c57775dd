use std::time::Duration;

/// How far through scrollable content the view is, 0.0..=100.0.
/// Content that fits in the viewport counts as 0.
pub fn scroll_percent(scrolled: usize, content: usize, viewport: usize) -> f64 {
    if content <= viewport {
        return 0.0;
    }
    let range = (content - viewport) as f64;
    (scrolled as f64 / range * 100.0).clamp(0.0, 100.0)
}

/// Number of items visible after `elapsed` when item `i` appears at `base + i * step`
pub fn revealed(elapsed: Duration, base: Duration, step: Duration, total: usize) -> usize {
    if elapsed < base {
        return 0;
    }
    if step.is_zero() {
        return total;
    }
    let since = (elapsed - base).as_nanos() / step.as_nanos();
    (since as usize).saturating_add(1).min(total)
}
