//! Point-in-shape resolution over ordered collision layers.

use shellkit_surface::{Collision, CollisionKind};

use crate::render::CollisionInfo;

/// Id of the first collision containing (x, y), scanning layers and their
/// collisions in order. Each layer's offset is subtracted from the point.
/// Coordinates are widened so that no offset or extent can overflow.
pub fn hit_test(layers: &[CollisionInfo], x: i64, y: i64) -> Option<&str> {
    for layer in layers {
        let lx = x.saturating_sub(i64::from(layer.x));
        let ly = y.saturating_sub(i64::from(layer.y));
        if let Some(c) = layer.collisions.iter().find(|c| contains(c, lx, ly)) {
            return Some(c.id.as_str());
        }
    }
    None
}

/// Whether `collision` contains the point. Malformed shapes never hit.
pub fn contains(collision: &Collision, x: i64, y: i64) -> bool {
    let p: Vec<i64> = collision.points.iter().copied().map(i64::from).collect();
    match collision.kind {
        CollisionKind::Rect => {
            if p.len() != 4 {
                log::warn!("collision {}: rect needs 4 points", collision.id);
                return false;
            }
            p[0] <= x && x <= p[2] && p[1] <= y && y <= p[3]
        }
        CollisionKind::Ellipse => {
            if p.len() != 4 {
                log::warn!("collision {}: ellipse needs 4 points", collision.id);
                return false;
            }
            in_ellipse(p[0], p[1], p[2], p[3], x, y)
        }
        CollisionKind::Circle => {
            if p.len() != 3 {
                log::warn!("collision {}: circle needs 3 points", collision.id);
                return false;
            }
            let dx = i128::from(p[0]) - i128::from(x);
            let dy = i128::from(p[1]) - i128::from(y);
            let r = i128::from(p[2]);
            match (dx.checked_mul(dx), dy.checked_mul(dy)) {
                (Some(dx2), Some(dy2)) => dx2.checked_add(dy2).is_some_and(|d| d <= r * r),
                _ => false,
            }
        }
        CollisionKind::Polygon => {
            if p.len() % 2 != 0 || p.len() < 6 {
                log::warn!("collision {}: polygon needs an even count of at least 6", collision.id);
                return false;
            }
            in_polygon(&p, x, y)
        }
        CollisionKind::Region => false,
    }
}

/// Axis-aligned ellipse inscribed in the box spanned by the two corners.
fn in_ellipse(x1: i64, y1: i64, x2: i64, y2: i64, x: i64, y: i64) -> bool {
    let rx = (x1 - x2).abs() as f64 / 2.0;
    let ry = (y1 - y2).abs() as f64 / 2.0;
    if rx == 0.0 || ry == 0.0 {
        return false;
    }
    let dx = (x1 + x2) as f64 / 2.0 - x as f64;
    let dy = (y1 + y2) as f64 / 2.0 - y as f64;
    (dx / rx).powi(2) + (dy / ry).powi(2) <= 1.0
}

/// Even-odd ray cast towards +x over the closed outline. A vertex lying
/// exactly on the ray counts once: on the upper end of a falling edge
/// (inclusive of x) and on the start of a rising edge (exclusive of x).
fn in_polygon(points: &[i64], x: i64, y: i64) -> bool {
    let n = points.len() / 2;
    let (x, y) = (x as f64, y as f64);
    let mut crossings = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (x1, y1) = (points[2 * i] as f64, points[2 * i + 1] as f64);
        let (x2, y2) = (points[2 * j] as f64, points[2 * j + 1] as f64);
        if y1 == y2 {
            continue;
        }
        if y1 > y2 {
            if y == y1 {
                continue;
            }
            if y == y2 && x <= x2 {
                crossings += 1;
                continue;
            }
        } else {
            if y == y1 && x < x1 {
                crossings += 1;
                continue;
            }
            if y == y2 {
                continue;
            }
        }
        if (y < y1 && y < y2) || (y > y1 && y > y2) {
            continue;
        }
        let ix = x1 + (y - y1) * (x2 - x1) / (y2 - y1);
        if ix > x {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}
