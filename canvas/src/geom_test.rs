#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn point_delta_from() {
    let d = Point::new(120.0, 90.0).delta_from(Point::new(100.0, 100.0));
    assert_eq!(d, Point::new(20.0, -10.0));
}

#[test]
fn point_distance_to() {
    assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
}

#[test]
fn from_corners_forward_drag() {
    let b = Bounds::from_corners(Point::new(100.0, 100.0), Point::new(250.0, 180.0));
    assert_eq!(b, Bounds::new(100.0, 100.0, 150.0, 80.0));
}

#[test]
fn from_corners_backward_drag_normalizes() {
    let b = Bounds::from_corners(Point::new(250.0, 180.0), Point::new(100.0, 100.0));
    assert_eq!(b, Bounds::new(100.0, 100.0, 150.0, 80.0));
}

#[test]
fn from_corners_mixed_axes() {
    let b = Bounds::from_corners(Point::new(50.0, 10.0), Point::new(20.0, 60.0));
    assert_eq!(b, Bounds::new(20.0, 10.0, 30.0, 50.0));
}

#[test]
fn from_corners_same_point_is_empty() {
    let b = Bounds::from_corners(Point::new(7.0, 7.0), Point::new(7.0, 7.0));
    assert_eq!(b.width, 0.0);
    assert_eq!(b.height, 0.0);
}

#[test]
fn meets_min_requires_both_axes() {
    assert!(Bounds::new(0.0, 0.0, 20.0, 20.0).meets_min(20.0));
    assert!(!Bounds::new(0.0, 0.0, 19.9, 200.0).meets_min(20.0));
    assert!(!Bounds::new(0.0, 0.0, 200.0, 5.0).meets_min(20.0));
}

#[test]
fn contains_is_inclusive() {
    let b = Bounds::new(10.0, 10.0, 20.0, 20.0);
    assert!(b.contains(Point::new(10.0, 10.0)));
    assert!(b.contains(Point::new(30.0, 30.0)));
    assert!(b.contains(Point::new(20.0, 15.0)));
    assert!(!b.contains(Point::new(30.1, 15.0)));
    assert!(!b.contains(Point::new(9.9, 15.0)));
}

#[test]
fn translated_keeps_extents() {
    let b = Bounds::new(100.0, 100.0, 150.0, 80.0).translated(Point::new(20.0, -10.0));
    assert_eq!(b, Bounds::new(120.0, 90.0, 150.0, 80.0));
}

#[test]
fn right_and_bottom() {
    let b = Bounds::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(b.right(), 40.0);
    assert_eq!(b.bottom(), 60.0);
}
