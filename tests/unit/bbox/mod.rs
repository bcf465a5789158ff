use super::*;
use crate::sheet::document::parse_document;

const SHEET: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 100 100">
  <defs>
    <path id="bar" d="M0,0 L10,0 L10,2 L0,2 Z"/>
    <g id="pair" transform="translate(1,1)"><use xlink:href="#bar"/><use xlink:href="#bar" y="5"/></g>
    <g id="loop"><use xlink:href="#loop"/></g>
  </defs>
  <g id="plain" transform="translate(10,20)"><path d="M0,0 L5,5" transform="matrix(2,0,0,2,1,1)"/></g>
  <g id="ref" transform="translate(50,50)"><use xlink:href="#pair" transform="translate(2,0)"/></g>
  <g id="empty"><rect width="10" height="10"/><circle r="4"/></g>
  <g id="cycle"><use xlink:href="#loop"/></g>
  <g id="filled"><path d="M10,10 L30,10 L30,40 L10,40 Z" fill="#000"/></g>
</svg>"##;

fn group<'a, 'input>(sheet: &'a SpriteSheet<'a, 'input>, id: &str) -> &'a TopGroup<'a, 'input> {
    sheet
        .groups()
        .iter()
        .find(|g| g.node.attribute("id") == Some(id))
        .unwrap()
}

fn assert_rect_near(a: Rect, b: Rect, tol: f64) {
    assert!(
        (a.x0 - b.x0).abs() <= tol
            && (a.y0 - b.y0).abs() <= tol
            && (a.x1 - b.x1).abs() <= tol
            && (a.y1 - b.y1).abs() <= tol,
        "{a:?} != {b:?}"
    );
}

#[test]
fn analytic_composes_group_and_path_transforms() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    let bb = AnalyticResolver
        .resolve(&sheet, group(&sheet, "plain"))
        .unwrap()
        .unwrap();
    // (0,0)-(5,5) scaled by 2, shifted by 1, then by (10,20).
    assert_eq!(bb, Rect::new(11.0, 21.0, 21.0, 31.0));
}

#[test]
fn analytic_follows_use_references_with_placement() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    let bb = AnalyticResolver
        .resolve(&sheet, group(&sheet, "ref"))
        .unwrap()
        .unwrap();
    // bar spans (0,0)-(10,2) and (0,5)-(10,7); pair adds (1,1), use adds (2,0), group (50,50).
    assert_eq!(bb, Rect::new(53.0, 51.0, 63.0, 58.0));
}

#[test]
fn analytic_ignores_unknown_kinds_and_stops_cycles() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    assert_eq!(
        AnalyticResolver
            .resolve(&sheet, group(&sheet, "empty"))
            .unwrap(),
        None
    );
    assert_eq!(
        AnalyticResolver
            .resolve(&sheet, group(&sheet, "cycle"))
            .unwrap(),
        None
    );
}

#[test]
fn alpha_bbox_scans_strictly_above_threshold() {
    // 3x2 image, alpha: [0, 5, 1] / [0, 0, 200]
    let rgba = [
        0, 0, 0, 0, 9, 9, 9, 5, 1, 1, 1, 1, //
        0, 0, 0, 0, 0, 0, 0, 0, 7, 7, 7, 200,
    ];
    assert_eq!(
        alpha_bbox(&rgba, 3, 1),
        Some(Rect::new(1.0, 0.0, 3.0, 2.0))
    );
    assert_eq!(
        alpha_bbox(&rgba, 3, 5),
        Some(Rect::new(2.0, 1.0, 3.0, 2.0))
    );
    assert_eq!(alpha_bbox(&rgba, 3, 200), None);
    assert_eq!(alpha_bbox(&[], 0, 0), None);
}

#[test]
fn single_group_svg_wraps_group_on_full_canvas() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    let svg = single_group_svg(&sheet, group(&sheet, "ref"));
    assert!(svg.contains(r#"viewBox="0 0 100 100" width="100" height="100""#));
    assert!(svg.contains("<defs>"));
    assert!(svg.contains(r#"<g id="ref""#));
    assert!(!svg.contains(r#"id="plain""#));
    roxmltree::Document::parse(&svg).unwrap();
}

#[test]
fn raster_finds_filled_extent() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    let resolver = RasterResolver::new(1.0, 1);
    let bb = resolver
        .resolve(&sheet, group(&sheet, "filled"))
        .unwrap()
        .unwrap();
    assert_rect_near(bb, Rect::new(10.0, 10.0, 30.0, 40.0), 1.0);

    let resolver = RasterResolver::new(2.0, 1);
    let bb = resolver
        .resolve(&sheet, group(&sheet, "filled"))
        .unwrap()
        .unwrap();
    assert_rect_near(bb, Rect::new(10.0, 10.0, 30.0, 40.0), 0.5);
}

#[test]
fn raster_sees_shapes_the_analytic_walk_skips() {
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    let bb = RasterResolver::new(1.0, 1)
        .resolve(&sheet, group(&sheet, "empty"))
        .unwrap()
        .unwrap();
    assert_rect_near(bb, Rect::new(0.0, 0.0, 10.0, 10.0), 1.0);
}

#[test]
fn raster_rejects_oversized_canvas() {
    let resolver = RasterResolver::new(100.0, 1);
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1000 1000" width="1000" height="1000"/>"#;
    let err = resolver
        .bbox_of_svg(svg, crate::foundation::core::CanvasSize::default())
        .unwrap_err();
    assert!(matches!(err, crate::foundation::error::PoseError::Raster(_)));
}

#[test]
fn auto_strategy_picks_by_transform_support() {
    let paths_only = parse_document(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs><path id="p" d="M0,0 L1,1"/></defs><g transform="translate(3,4)"><path d="M0,0 L5,5"/><use xlink:href="#p"/></g></svg>"##,
    )
    .unwrap();
    let sheet = SpriteSheet::new(&paths_only).unwrap();
    assert_eq!(create_resolver(BBoxStrategy::Auto, &sheet, 1.0, 1).name(), "analytic");
    assert_eq!(create_resolver(BBoxStrategy::Raster, &sheet, 1.0, 1).name(), "raster");

    let rotated = parse_document(
        r#"<svg xmlns="http://www.w3.org/2000/svg"><g transform="rotate(30)"/></svg>"#,
    )
    .unwrap();
    let sheet = SpriteSheet::new(&rotated).unwrap();
    assert_eq!(create_resolver(BBoxStrategy::Auto, &sheet, 1.0, 1).name(), "raster");
    assert_eq!(
        create_resolver(BBoxStrategy::Analytic, &sheet, 1.0, 1).name(),
        "analytic"
    );
}

#[test]
fn auto_strategy_rasterizes_sheets_with_basic_shapes() {
    // SHEET's "empty" group holds a <rect> and a <circle>.
    let doc = parse_document(SHEET).unwrap();
    let sheet = SpriteSheet::new(&doc).unwrap();
    assert_eq!(create_resolver(BBoxStrategy::Auto, &sheet, 1.0, 1).name(), "raster");

    let via_use = parse_document(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs><circle id="c" r="5"/></defs><g><use xlink:href="#c"/></g></svg>"##,
    )
    .unwrap();
    let sheet = SpriteSheet::new(&via_use).unwrap();
    assert_eq!(create_resolver(BBoxStrategy::Auto, &sheet, 1.0, 1).name(), "raster");
}
