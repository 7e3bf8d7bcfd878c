use base::Vec2;

#[test]
fn test_new_and_from_tuple() {
    assert_eq!(Vec2::new(320usize, 240usize), Vec2::from((320, 240)));
}

#[test]
fn test_area_and_rgba_len() {
    let size = Vec2::new(320usize, 240usize);
    assert_eq!(size.area(), 76_800);
    assert_eq!(size.rgba_len(), 307_200);
}

#[test]
fn test_is_empty() {
    assert!(Vec2::new(0usize, 240usize).is_empty());
    assert!(Vec2::new(320usize, 0usize).is_empty());
    assert!(!Vec2::new(1usize, 1usize).is_empty());
}

#[test]
fn test_display() {
    assert_eq!(Vec2::new(640usize, 480usize).to_string(), "640x480");
}
