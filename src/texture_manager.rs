use std::collections::HashMap;

use egui::{ColorImage, Context, Id, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Failed to generate texture: {0}")]
    GenerationFailed(String),
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
}

/// Caches GPU textures for the canvas and for displayed snapshots.
///
/// Textures are keyed by a source id plus a version. Creating a new version
/// of a source drops the older ones.
pub struct TextureManager {
    /// Cache of textures by (source, version)
    texture_cache: HashMap<(Id, u64), TextureHandle>,
    /// Tracks when each texture was last used
    last_used: HashMap<(Id, u64), u64>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    /// Maximum number of textures to cache
    max_cache_size: usize,
}

impl TextureManager {
    /// Creates a new texture manager with the specified cache size
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Increments the frame counter, should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Gets or creates a texture for the given source
    pub fn get_or_create_texture<F>(
        &mut self,
        source: Id,
        version: u64,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let cache_key = (source, version);

        if let Some(handle) = self.texture_cache.get(&cache_key) {
            self.last_used.insert(cache_key, self.current_frame);
            return Ok(handle.id());
        }

        // Older versions of this source are stale now
        self.invalidate_source(source);
        self.prune_cache_if_needed();

        let image = generator()?;
        if image.size[0] == 0 || image.size[1] == 0 {
            return Err(TextureGenerationError::InvalidDimensions);
        }

        let name = format!("{:?}_v{}", source, version);
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);

        self.texture_cache.insert(cache_key, handle.clone());
        self.last_used.insert(cache_key, self.current_frame);

        Ok(handle.id())
    }

    /// Invalidates all textures for a specific source
    pub fn invalidate_source(&mut self, source: Id) {
        self.texture_cache.retain(|(id, _), _| *id != source);
        self.last_used.retain(|(id, _), _| *id != source);
    }

    /// Prunes the cache so one more texture fits
    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        // Collect keys and their last-used frames
        let mut entries: Vec<((Id, u64), u64)> = self.last_used
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect();

        // Sort by last-used frame (oldest first)
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() + 1 - self.max_cache_size.max(1);
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    /// Returns the number of textures currently in the cache
    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    pub fn get_texture(&self, source: Id, version: u64) -> Option<&TextureHandle> {
        self.texture_cache.get(&(source, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock a texture generation function for testing
    fn mock_texture_generator() -> Result<ColorImage, TextureGenerationError> {
        Ok(ColorImage::new([10, 10], egui::Color32::WHITE))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let source = Id::new("canvas");

        let texture_id1 = manager.get_or_create_texture(
            source, 1, mock_texture_generator, &ctx
        ).unwrap();

        // Second call with same params should hit the cache
        let texture_id2 = manager.get_or_create_texture(
            source, 1, || Err(TextureGenerationError::GenerationFailed("not called".into())), &ctx
        ).unwrap();

        assert_eq!(texture_id1, texture_id2);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_invalidation() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);

        manager.get_or_create_texture(Id::new(1), 1, mock_texture_generator, &ctx).unwrap();
        manager.get_or_create_texture(Id::new(2), 1, mock_texture_generator, &ctx).unwrap();
        assert_eq!(manager.cache_size(), 2);

        manager.invalidate_source(Id::new(1));

        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let (a, b, c) = (Id::new("a"), Id::new("b"), Id::new("c"));

        // Create three textures to trigger eviction
        manager.get_or_create_texture(a, 0, mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(b, 0, mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(c, 0, mock_texture_generator, &ctx).unwrap();

        // Cache should be at max size with most recent textures
        assert_eq!(manager.cache_size(), 2);
        assert!(manager.get_texture(a, 0).is_none()); // This one should be evicted
        assert!(manager.get_texture(b, 0).is_some());
        assert!(manager.get_texture(c, 0).is_some());
    }

    #[test]
    fn test_new_version_replaces_old() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let canvas = Id::new("canvas");

        manager.get_or_create_texture(canvas, 1, mock_texture_generator, &ctx).unwrap();
        manager.get_or_create_texture(canvas, 2, mock_texture_generator, &ctx).unwrap();

        assert_eq!(manager.cache_size(), 1);
        assert!(manager.get_texture(canvas, 1).is_none());
        assert!(manager.get_texture(canvas, 2).is_some());
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);

        let result = manager.get_or_create_texture(
            Id::new("empty"), 0, || Ok(ColorImage::new([0, 4], egui::Color32::WHITE)), &ctx
        );
        assert!(matches!(result, Err(TextureGenerationError::InvalidDimensions)));
    }
}
