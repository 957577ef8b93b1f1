//! End-to-end rendering scenarios

use gcodeviewer_core::types::shared_vec;
use gcodeviewer_renderer::{
    BedGeometry, Color, Command, DrawOp, Layer, Model, OptionPatch, PixmapSurface,
    RecordingSurface, RenderOptions, Renderer, Retract,
};

fn perimeter_layer(z: f64) -> Vec<Command> {
    vec![
        Command::line((0.0, 0.0), (20.0, 20.0), false).with_z(z, z),
        Command::line((20.0, 20.0), (40.0, 20.0), true),
        Command::line((40.0, 20.0), (40.0, 40.0), true),
        Command::line((40.0, 40.0), (20.0, 40.0), false).with_retract(Retract::Retracting),
        Command::line((20.0, 40.0), (20.0, 40.0), true).with_retract(Retract::Restarting),
        Command::line((20.0, 40.0), (20.0, 20.0), true),
    ]
}

fn model(layers: usize) -> Model {
    Model::new(
        (0..layers)
            .map(|i| Layer::from(perimeter_layer(0.2 * (i + 1) as f64)))
            .collect(),
    )
}

#[test]
fn test_empty_model_renders_cleared_canvas() {
    let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
    renderer.do_render(Model::default(), 0);

    assert_eq!(renderer.stats().redraws, 1);
    assert_eq!(renderer.stats().last_pass, None);
    assert_eq!(renderer.model_num_layers(), 0);
    let surface = renderer.surface();
    assert_eq!(surface.count(|op| *op == DrawOp::Clear), 1);
    // only the bed is drawn
    assert!(surface
        .frame_strokes()
        .iter()
        .all(|style| style.color == RenderOptions::default().color_grid));
}

#[test]
fn test_bed_change_resets_once_then_redraws_once() {
    let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
    renderer.do_render(model(3), 1);
    let before = renderer.stats();
    let old_scale = renderer.transform().a();

    renderer.set_option(OptionPatch::new().bed(BedGeometry::rectangular(300.0, 300.0)));

    let after = renderer.stats();
    assert_eq!(after.resets - before.resets, 1);
    assert_eq!(after.redraws - before.redraws, 1);
    assert!(renderer.transform().a() < old_scale);
}

#[test]
fn test_markers_and_batching() {
    let mut renderer = Renderer::new(
        RecordingSurface::new(400, 400),
        RenderOptions {
            show_head: true,
            ..RenderOptions::default()
        },
    );
    renderer.do_render(model(1), 0);

    let options = renderer.options().clone();
    let frame = renderer.surface().last_frame();
    let fills: Vec<Color> = frame
        .iter()
        .filter_map(|op| match op {
            DrawOp::Fill { color, .. } => Some(*color),
            _ => None,
        })
        .collect();
    assert!(fills.contains(&options.color_retract));
    assert!(fills.contains(&options.color_restart));
    assert_eq!(fills.last(), Some(&options.color_head));

    let pass = renderer.stats().last_pass.unwrap();
    assert_eq!(pass.segments, 5);
    assert!(pass.strokes < pass.segments);
}

#[test]
fn test_ghost_layers_are_translucent() {
    let mut renderer = Renderer::new(
        RecordingSurface::new(400, 400),
        RenderOptions {
            show_previous_layer: true,
            ..RenderOptions::default()
        },
    );
    renderer.do_render(model(3), 1);

    let extrusion = renderer.options().color_line[0];
    let strokes = renderer.surface().frame_strokes();
    assert!(strokes
        .iter()
        .any(|style| style.color == extrusion.with_alpha(0.3)));
    assert!(strokes.iter().any(|style| style.color == extrusion));
    assert_eq!(renderer.cached_layers(), Vec::<usize>::new());
}

#[test]
fn test_progress_range_draws_prefix() {
    let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
    renderer.do_render(model(2), 0);
    renderer.render(0, 0, 1);
    assert_eq!(renderer.stats().last_pass.unwrap().segments, 2);
    renderer.render(0, 2, 5);
    assert_eq!(renderer.stats().last_pass.unwrap().segments, 3);
}

#[test]
fn test_internal_option_changes_are_reported() {
    let seen = shared_vec();
    let sink = seen.clone();
    let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
    let mut patch = OptionPatch::new().zoom_in_on_model(true);
    patch.hooks.on_internal_option_change = Some(Box::new(move |change| sink.borrow_mut().push(change)));
    renderer.set_option(patch);
    renderer.do_render(model(1), 0);

    renderer.wheel(-3.0);
    assert!(!renderer.options().zoom_in_on_model);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].zoom_in_on_model, Some(false));
    assert_eq!(seen.borrow()[0].move_model, None);
}

#[test]
fn test_raster_backend_draws_extrusion() {
    let options = RenderOptions {
        extrusion_width: 4.0,
        ..RenderOptions::default()
    };
    let surface = PixmapSurface::new(200, 200, options.bg_color_off_grid).unwrap();
    let mut renderer = Renderer::new(surface, options);
    let layer = vec![Command::line((20.0, 100.0), (180.0, 100.0), true)];
    renderer.do_render(Model::new(vec![layer.into()]), 0);

    // 0.95 px per mm; the bed spans 5..195 on both axes
    let surface = renderer.surface();
    let on_line = surface.pixel(97, 100).unwrap();
    assert!(on_line.r < 40 && on_line.g < 40 && on_line.b < 40, "{on_line}");
    let on_bed = surface.pixel(97, 50).unwrap();
    assert!(on_bed.r > 240 && on_bed.g > 240 && on_bed.b > 240, "{on_bed}");
    let off_bed = surface.pixel(1, 1).unwrap();
    assert_eq!(off_bed, renderer.options().bg_color_off_grid);

    let png = renderer.surface().encode_png().unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_compressed_model_round_trips_through_renderer() {
    let layers: Vec<Layer> = (0..4)
        .map(|i| Layer::compress(&perimeter_layer(0.2 * (i + 1) as f64)).unwrap())
        .collect();
    let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
    renderer.do_render(Model::new(layers), 2);

    assert_eq!(renderer.layer_num_segments(2), 6);
    assert!((renderer.get_z(2).unwrap() - 0.6).abs() < 1e-12);
    let info = renderer.model_info().unwrap();
    assert!((info.bounding_box.max_x - 40.0).abs() < 1e-12);
    assert!(renderer.cached_layers().len() <= 2);
}
