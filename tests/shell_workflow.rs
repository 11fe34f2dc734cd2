use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use egui::{Color32, pos2};
use image::{Rgba, RgbaImage};
use sketch_render::gallery::GALLERY_KEY;
use sketch_render::{
    AppShell, DrawingSurface, GalleryError, GalleryRepository, GenerateError, ImageGenerator,
    KeyValueStore, MemoryStore, Snapshot, ToolSettings,
};

/// Returns a fixed image, or a fixed failure, and counts calls
struct MockGenerator {
    calls: AtomicUsize,
    fail: bool,
}

impl MockGenerator {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn rendered() -> Snapshot {
    Snapshot::capture(&RgbaImage::from_pixel(6, 4, Rgba([10, 200, 10, 255]))).unwrap()
}

impl ImageGenerator for MockGenerator {
    fn generate(&self, _sketch: &Snapshot, _prompt: &str) -> Result<Snapshot, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(GenerateError::NoImage)
        } else {
            Ok(rendered())
        }
    }
}

fn shell(store: MemoryStore, generator: Arc<MockGenerator>) -> AppShell {
    AppShell::new(
        ToolSettings::default(),
        GalleryRepository::load(store),
        Some(generator),
    )
}

fn sketched_surface() -> DrawingSurface {
    let mut surface = DrawingSurface::new(32, 32, Color32::WHITE);
    surface.begin_stroke(pos2(4.0, 4.0), &ToolSettings::default());
    surface.extend_stroke(pos2(28.0, 28.0));
    surface.end_stroke();
    surface
}

#[test]
fn test_empty_prompt_makes_no_request() {
    let generator = MockGenerator::succeeding();
    let mut shell = shell(MemoryStore::new(), generator.clone());
    let surface = sketched_surface();

    assert!(matches!(shell.generate(&surface), Err(GenerateError::EmptyPrompt)));
    assert!(shell.error().is_some());
    assert!(!shell.is_generating());
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_successful_generation_then_save() {
    let generator = MockGenerator::succeeding();
    let store = MemoryStore::new();
    let mut shell = shell(store.clone(), generator.clone());
    let surface = sketched_surface();

    shell.prompt = "a ceramic vase".to_owned();
    shell.generate(&surface).unwrap();
    assert!(shell.is_generating());
    shell.wait_for_generation();

    let result = shell.result().cloned().unwrap();
    assert_eq!(result.image, rendered());
    assert_eq!(result.prompt, "a ceramic vase");
    assert!(result.created_at > 0);
    assert_eq!(result.sketch.decode().unwrap(), *surface.canvas().pixels());
    assert_eq!(generator.calls(), 1);
    assert!(shell.error().is_none());

    let first = shell.save_result().unwrap();
    let second = shell.save_result().unwrap();
    assert_ne!(first, second);

    let items = shell.gallery().items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, second);
    assert_eq!(items[1].id, first);
    assert_eq!(items[0].prompt, "a ceramic vase");

    // Every change is flushed to the store
    let reloaded = GalleryRepository::load(store);
    assert_eq!(reloaded.items(), shell.gallery().items());
}

#[test]
fn test_failed_generation_is_reported_and_resets() {
    let generator = MockGenerator::failing();
    let mut shell = shell(MemoryStore::new(), generator.clone());
    let surface = sketched_surface();

    shell.prompt = "a ceramic vase".to_owned();
    shell.generate(&surface).unwrap();
    shell.wait_for_generation();

    assert!(!shell.is_generating());
    assert!(shell.result().is_none());
    assert_eq!(shell.error(), Some("The image service did not return an image"));

    // The next attempt is allowed
    shell.generate(&surface).unwrap();
    shell.wait_for_generation();
    assert_eq!(generator.calls(), 2);
}

#[test]
fn test_delete_removes_exactly_one_item() {
    let generator = MockGenerator::succeeding();
    let mut shell = shell(MemoryStore::new(), generator);
    let surface = sketched_surface();

    shell.prompt = "a stool".to_owned();
    shell.generate(&surface).unwrap();
    shell.wait_for_generation();
    let ids: Vec<_> = (0..3).map(|_| shell.save_result().unwrap()).collect();
    let before: Vec<_> = shell.gallery().items().to_vec();

    shell.delete_item(ids[1]).unwrap();

    let after = shell.gallery().items();
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|item| item.id != ids[1]));
    for item in after {
        assert!(before.contains(item));
    }

    assert!(matches!(shell.delete_item(ids[1]), Err(GalleryError::NotFound(_))));
    assert_eq!(shell.gallery().len(), 2);
}

#[test]
fn test_loading_a_result_is_undoable() {
    let generator = MockGenerator::succeeding();
    let mut shell = shell(MemoryStore::new(), generator);
    let mut surface = sketched_surface();
    let sketch = surface.canvas().pixels().clone();

    shell.prompt = "a chair".to_owned();
    shell.generate(&surface).unwrap();
    shell.wait_for_generation();
    let id = shell.save_result().unwrap();

    shell.load_item_into(id, &mut surface).unwrap();
    assert_eq!(surface.canvas().pixel(0, 0), Some(Color32::from_rgb(10, 200, 10)));
    assert_eq!(surface.canvas().pixel(20, 20), Some(Color32::WHITE));

    assert!(sketch_render::CanvasControl::undo(&mut surface));
    assert_eq!(surface.canvas().pixels(), &sketch);
}

#[test]
fn test_corrupt_gallery_starts_empty() {
    let mut store = MemoryStore::new();
    store
        .set_string(GALLERY_KEY, r#"[{"id": "not-a-uuid"}]"#.to_owned())
        .unwrap();

    let shell = shell(store, MockGenerator::succeeding());
    assert!(shell.gallery().is_empty());
}
