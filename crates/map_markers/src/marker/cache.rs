//! Marker cache keyed by file identifier.
//!
//! The cache is constructed explicitly and handed to the renderer through
//! [`RenderContext`](crate::render::RenderContext). It always knows the built-in `shape://` markers;
//! anything else is resolved through an optional [`MarkerLoader`].
//!
//! Typical usage:
//! - Create a cache with [`MarkerCache::new`] or [`MarkerCache::with_loader`].
//! - Resolve identifiers with [`MarkerCache::find`]; pass `update_cache = true` to memoize loads.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::marker::{shapes, Marker};

const SHAPE_SCHEME: &str = "shape://";

/// Turns a file identifier into a marker.
///
/// `Ok(None)` means the asset does not exist. Errors are treated as a corrupted input set.
pub trait MarkerLoader {
    fn load(&self, id: &str) -> Result<Option<Marker>>;
}

impl<F> MarkerLoader for F
where
    F: Fn(&str) -> Result<Option<Marker>>,
{
    fn load(&self, id: &str) -> Result<Option<Marker>> {
        self(id)
    }
}

/// Cache of resolved markers, shared by reference between placements.
pub struct MarkerCache {
    markers: HashMap<String, Arc<Marker>>,
    loader: Option<Box<dyn MarkerLoader>>,
}

impl MarkerCache {
    /// Creates a cache holding only the built-in shapes.
    pub fn new() -> Self {
        let mut cache = Self {
            markers: HashMap::new(),
            loader: None,
        };
        cache.register_builtins();
        cache
    }

    /// Creates a cache that resolves unknown identifiers through `loader`.
    pub fn with_loader(loader: impl MarkerLoader + 'static) -> Self {
        let mut cache = Self::new();
        cache.loader = Some(Box::new(loader));
        cache
    }

    fn register_builtins(&mut self) {
        self.insert(shapes::ELLIPSE, Marker::vector(shapes::default_ellipse()));
        self.insert(shapes::ARROW, Marker::vector(shapes::default_arrow()));
    }

    /// Stores `marker` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, marker: Marker) -> Arc<Marker> {
        let marker = Arc::new(marker);
        self.markers.insert(id.into(), Arc::clone(&marker));
        marker
    }

    pub fn contains(&self, id: &str) -> bool {
        self.markers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Drops every loaded marker. Built-in shapes stay available.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.register_builtins();
    }

    /// Resolves `id` to a marker.
    ///
    /// Returns `Ok(None)` for an empty identifier, an unknown built-in, or an asset the loader
    /// cannot find. With `update_cache` a freshly loaded marker is memoized.
    pub fn find(&mut self, id: &str, update_cache: bool) -> Result<Option<Arc<Marker>>> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(marker) = self.markers.get(id) {
            return Ok(Some(Arc::clone(marker)));
        }
        if !self.is_uri(id) {
            debug!("Unknown built-in marker '{}'", id);
            return Ok(None);
        }
        let Some(loader) = &self.loader else {
            debug!("No marker loader configured for '{}'", id);
            return Ok(None);
        };

        let loaded = loader.load(id).map_err(|e| Error::Asset {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        let Some(marker) = loaded else {
            return Ok(None);
        };
        if update_cache {
            Ok(Some(self.insert(id, marker)))
        } else {
            Ok(Some(Arc::new(marker)))
        }
    }

    /// Returns `true` for identifiers that name an external asset rather than a built-in shape.
    pub fn is_uri(&self, id: &str) -> bool {
        !id.starts_with(SHAPE_SCHEME)
    }
}

impl Default for MarkerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MarkerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.markers.keys().collect();
        ids.sort();
        f.debug_struct("MarkerCache")
            .field("markers", &ids)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::marker::{MarkerKind, RasterImage};
    use crate::symbolizer::Color;

    fn counting_loader(calls: Rc<Cell<usize>>) -> impl MarkerLoader {
        move |id: &str| -> Result<Option<Marker>> {
            calls.set(calls.get() + 1);
            match id {
                "pin.png" => Ok(Some(Marker::raster(RasterImage::solid(4, 6, Color::WHITE)))),
                "broken.png" => Err(Error::Other("truncated file".into())),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn builtins_are_registered_on_construction() {
        let mut cache = MarkerCache::new();
        let ellipse = cache.find(shapes::ELLIPSE, false).unwrap().unwrap();
        assert_eq!(ellipse.kind(), MarkerKind::Vector);
        assert!(cache.find(shapes::ARROW, false).unwrap().is_some());
        assert!(cache.find("shape://star", false).unwrap().is_none());
    }

    #[test]
    fn empty_identifier_is_a_miss() {
        let mut cache = MarkerCache::new();
        assert!(cache.find("", true).unwrap().is_none());
    }

    #[test]
    fn loads_are_memoized_only_when_requested() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = MarkerCache::with_loader(counting_loader(Rc::clone(&calls)));

        assert!(cache.find("pin.png", false).unwrap().is_some());
        assert!(!cache.contains("pin.png"));
        assert!(cache.find("pin.png", true).unwrap().is_some());
        assert!(cache.find("pin.png", true).unwrap().is_some());
        assert_eq!(calls.get(), 2);
        assert!(cache.contains("pin.png"));
    }

    #[test]
    fn loader_errors_are_asset_errors() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = MarkerCache::with_loader(counting_loader(calls));
        let err = cache.find("broken.png", true).unwrap_err();
        assert!(matches!(err, Error::Asset { ref id, .. } if id == "broken.png"));
        assert!(cache.find("missing.png", true).unwrap().is_none());
    }

    #[test]
    fn clear_keeps_builtins() {
        let mut cache = MarkerCache::new();
        cache.insert("custom", Marker::raster(RasterImage::solid(1, 1, Color::BLACK)));
        cache.clear();
        assert!(!cache.contains("custom"));
        assert!(cache.contains(shapes::ELLIPSE));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn uri_detection() {
        let cache = MarkerCache::new();
        assert!(!cache.is_uri("shape://ellipse"));
        assert!(cache.is_uri("icons/pin.svg"));
    }
}
