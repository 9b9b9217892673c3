//! End-to-end flows through the strata facade: populate a viewer, rebuild,
//! select with a gesture and grow a region from a pick.

use std::cell::Cell;
use std::rc::Rc;

use strata::*;

fn block_volume(shape: [usize; 3], lo: usize, hi: usize) -> Grid3<f32> {
    Grid3::from_fn(shape, |z, y, x| {
        let inside = |i: usize| (lo..hi).contains(&i);
        if inside(z) && inside(y) && inside(x) {
            10.0
        } else {
            0.0
        }
    })
}

#[test]
fn test_point_layers_merge_and_select() {
    init_logging();
    let mut viewer = Viewer::new([1, 1, 1]);
    let shared: Vec<Vec3> = (0..10)
        .map(|i| Vec3::new(i as f32 * 0.2 - 0.9, 0.0, 0.0))
        .collect();
    viewer.points.set_shared_positions(shared);

    viewer.points.allocate("all").unwrap();
    viewer.points.allocate("left").unwrap();
    viewer
        .points
        .set_mask("left", Some((0..10).map(|i| i < 5).collect()))
        .unwrap();
    viewer.points.set_zorder("left", 1.0).unwrap();
    viewer
        .points
        .set_color("left", PointColor::Uniform(Vec4::new(1.0, 0.0, 0.0, 1.0)))
        .unwrap();
    viewer.points.allocate("hidden").unwrap();
    viewer.points.set_visible("hidden", false).unwrap();

    let redraws = Rc::new(Cell::new(0));
    let counter = Rc::clone(&redraws);
    viewer
        .points
        .set_redraw_callback(move || counter.set(counter.get() + 1));
    viewer.refresh();
    assert_eq!(redraws.get(), 1);

    let combined = viewer.points.combined();
    assert_eq!(combined.len(), 15);
    assert_eq!(combined.layer_range("all"), Some(0..10));
    assert_eq!(combined.layer_range("left"), Some(10..15));
    assert_eq!(combined.layer_range("hidden"), None);
    assert_eq!(combined.layer_at(12), Some(("left", 2)));
    assert_eq!(combined.colors[10], Vec4::new(1.0, 0.0, 0.0, 1.0));

    // Right half of the screen.
    let rect = Rectangle::new(Vec2::new(0.0, -1.0), Vec2::new(1.0, 1.0));
    let hits = viewer.select(&rect, &mut |_, _| {});
    let labels: Vec<&str> = hits.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, ["all", "left"]);
    assert_eq!(hits[0].1.count(), 5);
    assert_eq!(hits[1].1.count(), 0);

    viewer.points.deallocate("all").unwrap();
    viewer.refresh();
    assert_eq!(viewer.points.combined().len(), 5);
    assert_eq!(redraws.get(), 2);
}

#[test]
fn test_view_transform_moves_selection() {
    let mut viewer = Viewer::new([1, 1, 1]);
    viewer
        .points
        .set_shared_positions(vec![Vec3::new(10.0, 10.0, 0.0)]);
    viewer.points.allocate("p").unwrap();

    let rect = Rectangle::new(Vec2::splat(-1.0), Vec2::splat(1.0));
    assert_eq!(viewer.select(&rect, &mut |_, _| {})[0].1.count(), 0);

    viewer.view = Transform::scale_translate(Vec3::splat(0.1), Vec3::splat(-0.5));
    assert_eq!(viewer.select(&rect, &mut |_, _| {})[0].1.count(), 1);
}

#[test]
fn test_volume_bands_and_selection() {
    let shape = [8, 8, 8];
    let mut viewer = Viewer::new(shape);

    viewer.volumes.allocate("base").unwrap();
    let ramp = ColorRamp::fade_in(Vec3::ONE);
    viewer
        .volumes
        .set_volume(
            "base",
            Grid3::from_fn(shape, |_, _, x| x as f32),
            (0.0, 7.0),
            ramp,
        )
        .unwrap();

    viewer.volumes.allocate("roi").unwrap();
    viewer
        .volumes
        .set_mask("roi", Some(Grid3::from_fn(shape, |z, _, _| z < 4)))
        .unwrap();
    viewer.refresh();

    let options = viewer.options().clone();
    let combined = viewer.volumes.combined();
    assert_eq!(combined.bands, ["base", "roi"]);
    assert_eq!(combined.ramp.stops().len(), 4 * 2 + 2);
    let field = combined.field.as_ref().unwrap();
    assert_eq!(combined.band_of(*field.get([1, 3, 3]).unwrap(), &options), Some(1));
    assert_eq!(combined.band_of(*field.get([6, 3, 3]).unwrap(), &options), Some(0));

    // Only layers carrying data are selected.
    let circle = Circle::new(Vec2::new(3.5, 3.5), 2.0);
    let mut reports = Vec::new();
    let hits = viewer.select(&circle, &mut |label, p| reports.push((label.to_string(), p)));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "base");
    let mask = hits[0].1.as_voxels().unwrap();
    assert_eq!(mask.shape(), shape);
    assert_eq!(mask.count() % 8, 0);
    assert!(mask.count() > 0);
    assert!(reports.iter().all(|(l, _)| l == "base"));
    assert_eq!(reports.last().map(|(_, p)| *p), Some(100.0));

    viewer.volumes.disable("base").unwrap();
    assert!(viewer.select(&circle, &mut |_, _| {}).is_empty());
}

#[test]
fn test_grow_region_from_pick() {
    let shape = [16, 16, 16];
    let mut viewer = Viewer::new(shape);
    viewer.volumes.allocate("cells").unwrap();
    viewer
        .volumes
        .set_volume(
            "cells",
            block_volume(shape, 4, 12),
            (0.0, 10.0),
            ColorRamp::fade_in(Vec3::new(0.0, 1.0, 0.0)),
        )
        .unwrap();

    let grown = viewer
        .grow_region("cells", Vec2::new(7.0, 7.0), (0.0, 15.0), 2.0)
        .unwrap()
        .unwrap();
    assert_eq!(grown.count(), 512);

    // Outside the block every voxel is zero, so the seed grows nothing.
    let empty = viewer
        .grow_region("cells", Vec2::new(1.0, 1.0), (0.0, 15.0), 2.0)
        .unwrap()
        .unwrap();
    assert_eq!(empty.count(), 0);

    let missed = viewer
        .grow_region("cells", Vec2::new(100.0, 100.0), (0.0, 15.0), 2.0)
        .unwrap();
    assert!(missed.is_none());
}

#[test]
fn test_viewer_registry() {
    let mut viewers = ViewerRegistry::new();
    let a = viewers.insert(Viewer::new([2, 2, 2]));
    let b = viewers.insert(Viewer::new([4, 4, 4]));

    viewers.get_mut(b).unwrap().points.allocate("p").unwrap();
    assert_eq!(viewers.get(b).unwrap().points.layers().len(), 1);
    assert_eq!(viewers.get(a).unwrap().volumes.shape(), [2, 2, 2]);

    assert!(viewers.remove(a).is_some());
    assert_eq!(viewers.ids(), vec![b]);
    assert!(viewers.get(a).is_none());
}

#[test]
fn test_ramp_sequence_cycles() {
    let mut ramps = ColorRampSequence::default();
    let n = ramps.len();
    let first = ramps.next_ramp().unwrap();
    for _ in 1..n {
        ramps.next_ramp();
    }
    assert_eq!(ramps.next_ramp().unwrap().name, first.name);
}

#[test]
fn test_options_from_json() {
    let options = Options::from_json_str(r#"{"guard_gap": 0.5, "chunk_budget": 64}"#).unwrap();
    let viewer = Viewer::with_options([4, 4, 4], options);
    assert_eq!(viewer.volumes.options().guard_gap, 0.5);
    assert_eq!(viewer.points.options().chunk_budget, 64);
    assert_eq!(viewer.options().chunk_budget, 64);
    assert!(matches!(
        Options::from_json_str("{not json"),
        Err(StrataError::JsonError(_))
    ));
}
