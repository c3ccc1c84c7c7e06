use bevy::prelude::*;

/// True if a square of side `side` fits strictly inside `bounds` on both axes.
pub fn square_fits(bounds: Rect, side: f32) -> bool {
    side > 0.0 && side < bounds.width() && side < bounds.height()
}

/// Region in which the min corner of a `side`-sized square can be placed
/// while keeping the whole square inside `bounds`.
///
/// Returns `None` when the square does not fit.
pub fn min_corner_region(bounds: Rect, side: f32) -> Option<Rect> {
    if !square_fits(bounds, side) {
        return None;
    }
    Some(Rect {
        min: bounds.min,
        max: bounds.max - Vec2::splat(side),
    })
}

/// True if `inner` lies within `outer`, edges included.
pub fn rect_within(inner: Rect, outer: Rect, epsilon: f32) -> bool {
    inner.min.x >= outer.min.x - epsilon
        && inner.min.y >= outer.min.y - epsilon
        && inner.max.x <= outer.max.x + epsilon
        && inner.max.y <= outer.max.y + epsilon
}
