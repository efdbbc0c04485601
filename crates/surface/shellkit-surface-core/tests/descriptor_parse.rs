use std::path::PathBuf;

use shellkit_surface::{
    parse_descriptor, CollisionKind, Interval, Method, ParseError, Surfaces, NO_SURFACE,
};
use shellkit_test_fixtures::descriptors;

fn fixture(name: &str) -> Surfaces {
    let text = descriptors::text(name).expect("fixture text");
    parse_descriptor(&text)
}

#[test]
fn parsing_is_deterministic() {
    for key in descriptors::keys() {
        let text = descriptors::text(&key).expect("fixture text");
        assert_eq!(parse_descriptor(&text), parse_descriptor(&text), "fixture {key}");
    }
}

#[test]
fn single_line_surface_block() {
    let surfaces = parse_descriptor("surface0 { element0, base, a.png, 0, 0 }");
    assert!(surfaces.diagnostics().is_empty());
    let surface = surfaces.get(0).expect("surface 0");
    assert_eq!(surface.elements.len(), 1);
    let e = &surface.elements[&0];
    assert_eq!(e.method, Method::Base);
    assert_eq!((e.x, e.y), (0, 0));
    assert_eq!(e.file, PathBuf::from("a.png"));
}

#[test]
fn basic_fixture_model() {
    let surfaces = fixture("basic");
    assert!(surfaces.diagnostics().is_empty(), "{:?}", surfaces.diagnostics());
    assert_eq!(surfaces.version(), 1);
    assert_eq!(surfaces.len(), 3);

    let s0 = surfaces.get(0).expect("surface 0");
    let anim = &s0.animations[&0];
    assert!(anim.has(Interval::Sometimes));
    assert_eq!(anim.interval_factor, 1);
    let refs: Vec<_> = anim.patterns.iter().map(|p| p.surface).collect();
    assert_eq!(refs, vec![100, 101, NO_SURFACE]);
    assert_eq!((anim.patterns[0].x, anim.patterns[0].y), (30, 40));
    assert_eq!(anim.patterns[0].wait_min, 50);

    let head = &s0.collisions[&0];
    assert_eq!(head.kind, CollisionKind::Rect);
    assert_eq!(head.id, "Head");
    assert_eq!(head.points, vec![10, 10, 60, 40]);
    let bust = &s0.collisions[&1];
    assert_eq!(bust.kind, CollisionKind::Circle);
    let hand = &s0.collisions[&2];
    assert_eq!(hand.kind, CollisionKind::Polygon);
    assert!(head.factor < bust.factor && bust.factor < hand.factor);
}

#[test]
fn ranges_appends_and_overlays() {
    let surfaces = fixture("layered");
    assert!(surfaces.diagnostics().is_empty(), "{:?}", surfaces.diagnostics());
    assert_eq!(surfaces.version(), 2);

    let ids: Vec<_> = surfaces.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![0, 1, 3]);

    let s1 = surfaces.get(1).expect("surface 1");
    assert_eq!(s1.elements.len(), 2);
    assert_eq!((s1.elements[&1].x, s1.elements[&1].y), (12, 8));
    assert_eq!(surfaces.get(0).expect("surface 0").elements.len(), 1);

    let s3 = surfaces.get(3).expect("surface 3");
    assert_eq!(s3.elements[&0].file, PathBuf::from("other.png"));
    assert_eq!((s3.elements[&0].x, s3.elements[&0].y), (4, 4));
}

#[test]
fn broken_lines_are_reported_and_skipped() {
    let surfaces = fixture("broken");
    let lines: Vec<_> = surfaces.diagnostics().iter().filter_map(ParseError::line).collect();
    assert_eq!(lines, vec![4, 5, 6, 7, 9, 10, 12, 13, 16, 17, 18, 20, 21, 22, 23]);

    let d = surfaces.diagnostics();
    assert!(matches!(d[0], ParseError::MethodNotAllowed { .. }));
    assert!(matches!(d[1], ParseError::InvalidNumber { field: "element x", .. }));
    assert!(matches!(&d[2], ParseError::UnknownInterval { interval, .. } if interval == "blink"));
    assert!(matches!(d[3], ParseError::DuplicateAnimation { id: 1, .. }));
    assert!(matches!(d[4], ParseError::PatternIndexGap { index: 2, len: 1, .. }));
    assert!(matches!(d[5], ParseError::UndeclaredAnimation { id: 2, .. }));
    assert!(matches!(d[6], ParseError::MethodNotAllowed { .. }));
    assert!(matches!(d[7], ParseError::MethodNotAllowed { .. }));
    assert!(matches!(d[8], ParseError::MalformedTargetList { .. }));
    assert!(matches!(d[9], ParseError::EmptyTargetList { .. }));
    assert!(matches!(d[10], ParseError::UnknownMethod { .. }));
    assert!(matches!(d[11], ParseError::DuplicateCollision { id: 0, .. }));
    assert!(matches!(d[12], ParseError::UnknownCollisionKind { .. }));
    assert!(matches!(d[13], ParseError::BadPointCount { count: 2, .. }));
    assert!(matches!(d[14], ParseError::InvalidNumber { field: "interval factor", .. }));

    let s0 = surfaces.get(0).expect("surface 0 survives");
    assert_eq!(s0.elements.keys().copied().collect::<Vec<_>>(), vec![0]);

    // the known tag and the factor survive the bad one
    let a1 = &s0.animations[&1];
    assert_eq!(a1.intervals.iter().copied().collect::<Vec<_>>(), vec![Interval::Sometimes]);
    assert_eq!(a1.interval_factor, 3);
    assert_eq!(a1.patterns.len(), 1);

    assert!(!s0.animations.contains_key(&2));
    let a3 = &s0.animations[&3];
    assert_eq!(a3.patterns.len(), 1);
    assert_eq!(a3.patterns[0].method, Method::Add);
    assert!(s0.animations[&4].patterns.is_empty());

    // a bad factor falls back to 1 and keeps the declaration
    let a5 = &s0.animations[&5];
    assert_eq!(a5.intervals.iter().copied().collect::<Vec<_>>(), vec![Interval::Sometimes]);
    assert_eq!(a5.interval_factor, 1);
    assert_eq!(a5.patterns.len(), 1);

    assert_eq!(s0.collisions.len(), 1);
    assert_eq!(s0.collisions[&0].id, "First");
}

#[test]
fn later_pattern_lines_overwrite_by_index() {
    let text = "surface0\n{\n\
        animation0.interval,always\n\
        animation0.pattern0,overlay,1,10,0,0\n\
        animation0.pattern1,overlay,2,10,0,0\n\
        animation0.pattern0,overlay,3,20-40,5,6\n\
        }";
    let surfaces = parse_descriptor(text);
    assert!(surfaces.diagnostics().is_empty());
    let anim = &surfaces.get(0).expect("surface 0").animations[&0];
    let refs: Vec<_> = anim.patterns.iter().map(|p| p.surface).collect();
    assert_eq!(refs, vec![3, 2]);
    assert_eq!((anim.patterns[0].wait_min, anim.patterns[0].wait_max), (20, 40));
}

#[test]
fn control_patterns_carry_targets() {
    let text = "surface0 {\n\
        animation0.interval,runonce\n\
        animation0.pattern0,start,5\n\
        animation0.pattern1,parallelstop,(1, 2,3)\n\
        animation0.pattern2,alternativestart,(7)\n\
        }";
    let surfaces = parse_descriptor(text);
    assert!(surfaces.diagnostics().is_empty(), "{:?}", surfaces.diagnostics());
    let anim = &surfaces.get(0).expect("surface 0").animations[&0];
    assert_eq!(anim.patterns[0].targets, vec![5]);
    assert_eq!(anim.patterns[1].targets, vec![1, 2, 3]);
    assert_eq!(anim.patterns[2].method, Method::AlternativeStart);
    assert_eq!(anim.patterns[2].targets, vec![7]);
}

#[test]
fn interval_factor_is_floored_to_one() {
    let surfaces =
        parse_descriptor("surface0 {\nanimation0.interval,periodic+talk,0\n}\nsurface1 {\n}");
    let anim = &surfaces.get(0).expect("surface 0").animations[&0];
    assert_eq!(anim.interval_factor, 1);
    assert!(anim.has(Interval::Periodic) && anim.has(Interval::Talk));
    assert!(surfaces.get(1).expect("empty surface").is_empty());
}

#[test]
fn unterminated_block_is_reported() {
    let surfaces = parse_descriptor("surface0\n{\nelement0,base,a.png,0,0\n");
    assert_eq!(surfaces.diagnostics(), &[ParseError::UnterminatedBlock]);
    assert!(surfaces.get(0).is_none());
}

#[test]
fn surfaces_serialize_to_json() {
    let surfaces = fixture("basic");
    let json = serde_json::to_value(&surfaces).expect("serialize");
    assert_eq!(json["version"], 1);
    assert_eq!(json["surfaces"]["0"]["collisions"]["0"]["id"], "Head");
    assert_eq!(json["surfaces"]["0"]["animations"]["0"]["intervals"][0], "sometimes");
}

#[test]
fn huge_append_ranges_touch_only_existing_surfaces() {
    let text = "surface5 { element0,base,a.png,0,0 }\n\
        surface.append 0-2000000000 { element1,overlay,b.png,0,0 }";
    let surfaces = parse_descriptor(text);
    assert!(surfaces.diagnostics().is_empty());
    assert_eq!(surfaces.len(), 1);
    assert_eq!(surfaces.get(5).map(|s| s.elements.len()), Some(2));
}
