use crate::ecs::{AnimationState, BoundingBox, Entity, Transform};
use crate::geometry::Vec2;

/// Per-axis penetration depth of the two bounding boxes.
///
/// Both components positive means the boxes intersect. Entities without a
/// bounding box never overlap anything.
pub fn overlap(a: &Entity, b: &Entity) -> Vec2 {
    match (a.get::<BoundingBox>(), b.get::<BoundingBox>()) {
        (Some(box_a), Some(box_b)) => penetration(box_a.pos, box_a.half_size, box_b.pos, box_b.half_size),
        _ => Vec2::ZERO,
    }
}

/// Same as [`overlap`] but places `a`'s box where it was before this tick's move.
pub fn previous_overlap(a: &Entity, b: &Entity) -> Vec2 {
    match (
        a.get::<BoundingBox>(),
        a.get::<Transform>(),
        b.get::<BoundingBox>(),
    ) {
        (Some(box_a), Some(transform_a), Some(box_b)) => penetration(
            transform_a.prev_pos + box_a.offset,
            box_a.half_size,
            box_b.pos,
            box_b.half_size,
        ),
        _ => Vec2::ZERO,
    }
}

pub fn is_colliding(a: &Entity, b: &Entity) -> bool {
    let depth = overlap(a, b);
    depth.x > 0.0 && depth.y > 0.0
}

fn penetration(pos_a: Vec2, half_a: Vec2, pos_b: Vec2, half_b: Vec2) -> Vec2 {
    let delta = (pos_b - pos_a).abs();
    Vec2::new(half_a.x + half_b.x - delta.x, half_a.y + half_b.y - delta.y)
}

/// Strict containment of `point` in the entity's on-screen bounds.
///
/// Render bounds are the animation frame scaled by the transform and centred on
/// it; entities without an animation fall back to their bounding box.
pub fn point_in_box(point: Vec2, entity: &Entity) -> bool {
    let bounds = match (entity.get::<Transform>(), entity.get::<AnimationState>()) {
        (Some(transform), Some(animation)) => {
            let size = animation.animation.size();
            let half = Vec2::new(
                (size.x * transform.scale.x).abs() / 2.0,
                (size.y * transform.scale.y).abs() / 2.0,
            );
            Some((transform.pos, half))
        }
        _ => entity
            .get::<BoundingBox>()
            .map(|bbox| (bbox.pos, bbox.half_size)),
    };

    match bounds {
        Some((center, half)) => {
            point.x > center.x - half.x
                && point.x < center.x + half.x
                && point.y > center.y - half.y
                && point.y < center.y + half.y
        }
        None => false,
    }
}

/// Intersection point of segments `p1 p2` and `p3 p4`.
///
/// Parallel or collinear segments report no intersection.
pub fn segment_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let r = p2 - p1;
    let s = p4 - p3;
    let rxs = r.cross(s);
    if rxs == 0.0 {
        return None;
    }

    let qp = p3 - p1;
    let t = qp.cross(s) / rxs;
    let u = qp.cross(r) / rxs;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(p1 + r * t)
}

pub fn segment_intersects_box(p1: Vec2, p2: Vec2, entity: &Entity) -> bool {
    let Some(bbox) = entity.get::<BoundingBox>() else {
        return false;
    };
    box_edges(bbox)
        .into_iter()
        .any(|(a, b)| segment_intersect(p1, p2, a, b).is_some())
}

fn box_edges(bbox: &BoundingBox) -> [(Vec2, Vec2); 4] {
    let min = bbox.min();
    let max = bbox.max();
    let top_left = min;
    let top_right = Vec2::new(max.x, min.y);
    let bottom_right = max;
    let bottom_left = Vec2::new(min.x, max.y);
    [
        (top_left, top_right),
        (top_right, bottom_right),
        (bottom_right, bottom_left),
        (bottom_left, top_left),
    ]
}
