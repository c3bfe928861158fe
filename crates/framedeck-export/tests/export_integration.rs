use framedeck_core::{
    CameraState, CanvasHost, DeckGenerator, Frame, MemoryCanvas, Presenter, Primitive,
    RegionRegistry, SceneUpdate, derive_regions,
};
use framedeck_export::{ExportError, PdfExporter, export_region_png};
use kurbo::{Point, Vec2};

const DECK: &str = "# Intro\n- one\n- two\n---\n# Middle\nSome body text\n---\n# Outro\n```rust\nfn main() {}\n```";

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

fn generated_canvas() -> (MemoryCanvas, RegionRegistry) {
    let mut canvas = MemoryCanvas::new();
    DeckGenerator::default().generate(&mut canvas, DECK).unwrap();
    let mut registry = RegionRegistry::new();
    registry.refresh(&canvas.scene_elements());
    (canvas, registry)
}

#[test]
fn test_three_regions_three_pages() {
    let (mut canvas, registry) = generated_canvas();
    let before = canvas.app_state().camera;

    let pdf = block_on(PdfExporter::default().export_all(&mut canvas, registry.regions())).unwrap();
    assert_eq!(pdf.page_count(), 3);
    let captions: Vec<&str> = pdf.pages.iter().map(|p| p.caption.as_str()).collect();
    assert_eq!(captions, ["Intro", "Middle", "Outro"]);
    let indicators: Vec<&str> = pdf.pages.iter().map(|p| p.indicator.as_str()).collect();
    assert_eq!(indicators, ["1 / 3", "2 / 3", "3 / 3"]);
    assert!(pdf.bytes.starts_with(b"%PDF"));

    // 1200x800 frame, 20 padding, 2x
    assert_eq!(pdf.pages[0].pixel_size, (2480, 1680));
    assert_eq!(canvas.export_count(), 3);
    assert_eq!(canvas.app_state().camera, before);
}

#[test]
fn test_pages_follow_navigation_order_not_scene_order() {
    // Inserted bottom row first, then right to left.
    let frames = [
        (Point::new(0.0, 2000.0), "Bottom"),
        (Point::new(1400.0, 0.0), "Right"),
        (Point::new(0.0, 30.0), "Left"),
    ]
    .into_iter()
    .map(|(origin, name)| Primitive::Frame(Frame::new(origin, 1200.0, 800.0, name)))
    .collect();
    let mut canvas = MemoryCanvas::new();
    canvas.update_scene(SceneUpdate::elements(frames)).unwrap();
    let mut registry = RegionRegistry::new();
    registry.refresh(&canvas.scene_elements());

    let pdf = block_on(PdfExporter::default().export_all(&mut canvas, registry.regions())).unwrap();
    let captions: Vec<&str> = pdf.pages.iter().map(|p| p.caption.as_str()).collect();
    assert_eq!(captions, ["Left", "Right", "Bottom"]);
    let navigable: Vec<String> = derive_regions(&canvas.scene_elements())
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(captions, navigable);
}

#[test]
fn test_failure_aborts_and_restores_camera() {
    let (mut canvas, registry) = generated_canvas();
    let before = CameraState::new(0.8, Vec2::new(-30.0, 15.0));
    canvas.set_camera(before);
    canvas.fail_exports_after(Some(1));

    let err = block_on(PdfExporter::default().export_all(&mut canvas, registry.regions()))
        .unwrap_err();
    assert!(matches!(err, ExportError::Canvas(_)));
    assert_eq!(canvas.export_count(), 2);
    assert_eq!(canvas.app_state().camera, before);
}

#[test]
fn test_no_regions() {
    let mut canvas = MemoryCanvas::new();
    let err = block_on(PdfExporter::default().export_all(&mut canvas, &[])).unwrap_err();
    assert!(matches!(err, ExportError::NoRegions));
    assert_eq!(canvas.camera_writes(), 0);
}

#[test]
fn test_export_keeps_presentation_state() {
    let (mut canvas, _) = generated_canvas();
    let mut presenter = Presenter::new();
    presenter.refresh_now(&canvas);
    presenter.jump_to(&mut canvas, 1, std::time::Instant::now()).unwrap();

    presenter.suspend_for_export();
    let regions = presenter.regions().to_vec();
    block_on(PdfExporter::default().export_all(&mut canvas, &regions)).unwrap();
    assert_eq!(presenter.current_index(), 1);
}

#[test]
fn test_save_to_disk() {
    let (mut canvas, registry) = generated_canvas();
    let pdf = block_on(PdfExporter::default().export_all(&mut canvas, registry.regions())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.pdf");
    pdf.save(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), pdf.bytes);
}

#[test]
fn test_single_region_png() {
    let (canvas, registry) = generated_canvas();
    let region = registry.get(0).unwrap();
    let bytes = block_on(export_region_png(
        &canvas,
        region,
        Default::default(),
        framedeck_core::region::MEMBERSHIP_TOLERANCE,
    ))
    .unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}
