use super::*;
use crate::bbox::BBoxStrategy;
use crate::cluster::OverlapPredicate;

fn square_group(x: f64, y: f64, w: f64, h: f64) -> String {
    format!(
        r#"<g><path d="M{x},{y} h{w} v{h} h-{w} z" fill="black"/></g>"#
    )
}

fn cluster_groups(ox: f64, oy: f64) -> String {
    [
        square_group(ox, oy, 30.0, 30.0),
        square_group(ox + 20.0, oy, 40.0, 30.0),
        square_group(ox, oy + 20.0, 30.0, 40.0),
        square_group(ox + 20.0, oy + 20.0, 40.0, 40.0),
    ]
    .concat()
}

/// Two 4-group clusters; the right-hand one comes first in the document.
fn two_pose_sheet() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 200">{}{}</svg>"#,
        cluster_groups(220.0, 30.0),
        cluster_groups(20.0, 20.0)
    )
}

fn analytic() -> ExtractOpts {
    ExtractOpts {
        strategy: BBoxStrategy::Analytic,
        ..ExtractOpts::default()
    }
}

#[test]
fn plan_finds_two_poses_in_reading_order() {
    let plan = plan_poses(&two_pose_sheet(), Path::new("sheet.svg"), &analytic()).unwrap();
    assert_eq!(plan.report.groups_total, 8);
    assert_eq!(plan.report.groups_drawable, 8);
    assert_eq!(plan.report.components, 2);
    assert_eq!(plan.report.strategy, "analytic");

    let names: Vec<_> = plan.documents.iter().map(|d| d.file_name.as_str()).collect();
    assert_eq!(names, vec!["pose_01.svg", "pose_02.svg"]);
    // Left cluster (document indices 4..8) is numbered first.
    assert_eq!(plan.documents[0].group_indices, vec![4, 5, 6, 7]);
    assert_eq!(plan.documents[1].group_indices, vec![0, 1, 2, 3]);
    assert_eq!(plan.documents[0].crop, Rect::new(12.0, 12.0, 88.0, 88.0));
}

#[test]
fn raster_and_analytic_agree_on_axis_aligned_art() {
    let a = plan_poses(&two_pose_sheet(), Path::new("sheet.svg"), &analytic()).unwrap();
    let r = plan_poses(
        &two_pose_sheet(),
        Path::new("sheet.svg"),
        &ExtractOpts::default(),
    )
    .unwrap();
    assert_eq!(r.report.strategy, "raster");
    assert_eq!(a.documents.len(), r.documents.len());
    for (x, y) in a.documents.iter().zip(&r.documents) {
        assert_eq!(x.group_indices, y.group_indices);
        assert!((x.crop.x0 - y.crop.x0).abs() <= 1.0);
        assert!((x.crop.y1 - y.crop.y1).abs() <= 1.0);
    }
}

#[test]
fn parallel_resolution_matches_sequential() {
    let seq = plan_poses(&two_pose_sheet(), Path::new("s.svg"), &ExtractOpts::default()).unwrap();
    let par = plan_poses(
        &two_pose_sheet(),
        Path::new("s.svg"),
        &ExtractOpts {
            parallel: true,
            threads: Some(3),
            ..ExtractOpts::default()
        },
    )
    .unwrap();
    let svgs = |p: &PosePlan| p.documents.iter().map(|d| d.svg.clone()).collect::<Vec<_>>();
    assert_eq!(svgs(&seq), svgs(&par));
}

#[test]
fn no_drawable_groups_is_an_error_naming_the_sheet() {
    let text = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><g/><g><rect width="5" height="5"/></g></svg>"#;
    let err = plan_poses(text, Path::new("blank.svg"), &analytic()).unwrap_err();
    match err {
        PoseError::NoDrawableContent { path } => assert_eq!(path, Path::new("blank.svg")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sparse_components_yield_no_valid_poses() {
    let text = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 200">{}{}{}</svg>"#,
        square_group(10.0, 10.0, 50.0, 50.0),
        square_group(20.0, 20.0, 50.0, 50.0),
        square_group(30.0, 30.0, 50.0, 50.0),
    );
    let err = plan_poses(&text, Path::new("sparse.svg"), &analytic()).unwrap_err();
    assert!(matches!(
        err,
        PoseError::NoValidPoses { components: 1, .. }
    ));
}

#[test]
fn area_share_splits_loosely_touching_groups() {
    // A 4-group pose plus a small accessory that only grazes it.
    let text = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 200">{}{}</svg>"#,
        cluster_groups(20.0, 20.0),
        square_group(80.5, 40.0, 5.0, 5.0),
    );
    let padded = plan_poses(&text, Path::new("s.svg"), &analytic()).unwrap();
    assert_eq!(padded.report.components, 1);
    assert_eq!(padded.documents[0].group_indices.len(), 5);

    let opts = ExtractOpts {
        predicate: OverlapPredicate::area_share(),
        ..analytic()
    };
    let strict = plan_poses(&text, Path::new("s.svg"), &opts).unwrap();
    assert_eq!(strict.report.components, 2);
    assert_eq!(strict.documents.len(), 1);
    assert_eq!(strict.documents[0].group_indices, vec![0, 1, 2, 3]);
}

#[test]
fn malformed_sheet_reports_parse_error_with_path() {
    let err = plan_poses("<svg", Path::new("broken.svg"), &analytic()).unwrap_err();
    assert!(matches!(err, PoseError::Parse(ref msg) if msg.contains("broken.svg")));
}

#[test]
fn directory_input_uses_first_svg_by_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.svg"), "<svg/>").unwrap();
    std::fs::write(dir.path().join("a.svg"), "<svg/>").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
    assert_eq!(resolve_input(dir.path()).unwrap(), dir.path().join("a.svg"));

    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        resolve_input(empty.path()),
        Err(PoseError::InputNotFound { .. })
    ));
    assert!(matches!(
        resolve_input(&empty.path().join("missing.svg")),
        Err(PoseError::InputNotFound { .. })
    ));
}

#[test]
fn failed_sheet_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><g/></svg>"#;
    assert!(extract_poses_from_str(text, Path::new("x.svg"), &out, &analytic()).is_err());
    assert!(!out.exists());
}

#[test]
fn raster_failure_names_the_sheet_and_group() {
    let text = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20000 100">{}</svg>"#,
        square_group(10.0, 10.0, 30.0, 30.0)
    );
    let err = plan_poses(&text, Path::new("player_vector.svg"), &ExtractOpts::default())
        .unwrap_err();
    match err {
        PoseError::Raster(msg) => {
            assert!(msg.contains("player_vector.svg"), "{msg}");
            assert!(msg.contains("group #0"), "{msg}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn auto_strategy_measures_circle_heads_by_raster() {
    let text = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 200"><g><circle cx="50" cy="35" r="20" fill="black"/></g>{}{}{}</svg>"#,
        square_group(30.0, 50.0, 40.0, 40.0),
        square_group(25.0, 85.0, 20.0, 60.0),
        square_group(55.0, 85.0, 20.0, 60.0),
    );
    let auto = ExtractOpts {
        strategy: BBoxStrategy::Auto,
        ..ExtractOpts::default()
    };
    let plan = plan_poses(&text, Path::new("s.svg"), &auto).unwrap();
    assert_eq!(plan.report.strategy, "raster");
    assert_eq!(plan.documents.len(), 1);
    assert_eq!(plan.documents[0].group_indices, vec![0, 1, 2, 3]);
    // The crop reaches the top of the head, not just the torso.
    assert!(plan.documents[0].crop.y0 <= 15.0 - 8.0 + 1.0);
}

#[test]
fn negative_view_box_art_is_measured_and_cropped() {
    let text = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-300 -200 400 300">{}</svg>"#,
        cluster_groups(-250.0, -150.0)
    );
    let a = plan_poses(&text, Path::new("s.svg"), &analytic()).unwrap();
    let r = plan_poses(&text, Path::new("s.svg"), &ExtractOpts::default()).unwrap();
    assert_eq!(a.documents.len(), 1);
    assert_eq!(r.documents.len(), 1);
    assert_eq!(a.documents[0].crop, Rect::new(-258.0, -158.0, -182.0, -82.0));
    assert_eq!(r.documents[0].crop, a.documents[0].crop);
}
