//! Session-scoped memo of preprocessed piece templates.

use super::{preprocess, Template};
use crate::image::io::load_rgb_image;
use crate::trace::{trace_event, trace_span};
use crate::util::XqResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Preprocessing applied to every raw template on first use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateSettings {
    /// Horizontal scale factor applied before cropping.
    pub scale_x: f32,
    /// Vertical scale factor applied before cropping.
    pub scale_y: f32,
    /// Fraction of each dimension removed from every edge.
    pub border_clip: f32,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            border_clip: 0.2,
        }
    }
}

#[derive(Default)]
struct Entries {
    catalog: String,
    templates: HashMap<String, Arc<Template>>,
}

/// Lazily populated cache of templates read from `<find_path>/<catalog>/<file>`.
///
/// Entries are keyed by piece file name; the catalog is fixed per session, and
/// asking for a different catalog drops every cached entry first. A failed
/// load leaves no entry behind, so the next lookup retries from disk.
pub struct TemplateCache {
    find_path: PathBuf,
    settings: TemplateSettings,
    entries: RwLock<Entries>,
}

impl TemplateCache {
    /// Creates an empty cache rooted at `find_path`.
    pub fn new(find_path: impl Into<PathBuf>, settings: TemplateSettings) -> Self {
        Self {
            find_path: find_path.into(),
            settings,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Returns the directory holding one sub-directory per catalog.
    pub fn find_path(&self) -> &Path {
        &self.find_path
    }

    /// Returns the on-disk location of a raw template.
    pub fn template_path(&self, catalog: &str, file_name: &str) -> PathBuf {
        self.find_path.join(catalog).join(file_name)
    }

    /// Returns the preprocessed template for `file_name`, loading it on a miss.
    pub fn get(&self, catalog: &str, file_name: &str) -> XqResult<Arc<Template>> {
        {
            let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
            if entries.catalog == catalog {
                if let Some(tpl) = entries.templates.get(file_name) {
                    return Ok(Arc::clone(tpl));
                }
            }
        }

        let _span = trace_span!("load_template", file = file_name).entered();
        let path = self.template_path(catalog, file_name);
        let raw = load_rgb_image(&path)?;
        let processed = preprocess(
            &raw,
            self.settings.scale_x,
            self.settings.scale_y,
            self.settings.border_clip,
        )?;
        let template = Arc::new(Template::from_rgb(&processed)?);
        trace_event!(
            "template_loaded",
            width = template.width(),
            height = template.height()
        );

        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if entries.catalog != catalog {
            entries.templates.clear();
            entries.catalog = catalog.to_owned();
        }
        entries
            .templates
            .insert(file_name.to_owned(), Arc::clone(&template));
        Ok(template)
    }

    /// Drops the cached entry for `file_name` so the next lookup rereads it.
    pub fn invalidate(&self, file_name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.templates.remove(file_name);
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.templates.clear();
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{TemplateCache, TemplateSettings};
    use crate::image::io::save_rgb_png;
    use crate::XqError;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xqmatch-cache-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn icon() -> RgbImage {
        RgbImage::from_fn(20, 20, |x, y| Rgb([(x * 12) as u8, (y * 12) as u8, ((x + y) * 6) as u8]))
    }

    #[test]
    fn loads_once_and_memoizes() {
        let root = scratch_dir("memo");
        save_rgb_png(&icon(), root.join("0").join("br.png")).unwrap();

        let cache = TemplateCache::new(&root, TemplateSettings::default());
        let first = cache.get("0", "br.png").unwrap();
        assert_eq!((first.width(), first.height()), (12, 12));

        fs::remove_file(root.join("0").join("br.png")).unwrap();
        let second = cache.get("0", "br.png").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn failed_load_does_not_poison() {
        let root = scratch_dir("retry");
        let cache = TemplateCache::new(&root, TemplateSettings::default());

        let err = cache.get("0", "rk.png").unwrap_err();
        assert!(matches!(err, XqError::ImageLoad { .. }));
        assert!(cache.is_empty());

        save_rgb_png(&icon(), root.join("0").join("rk.png")).unwrap();
        assert!(cache.get("0", "rk.png").is_ok());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn switching_catalog_drops_entries() {
        let root = scratch_dir("catalog");
        save_rgb_png(&icon(), root.join("a").join("bk.png")).unwrap();
        save_rgb_png(&icon(), root.join("b").join("bp.png")).unwrap();

        let cache = TemplateCache::new(&root, TemplateSettings::default());
        cache.get("a", "bk.png").unwrap();
        cache.get("b", "bp.png").unwrap();
        assert_eq!(cache.len(), 1);

        cache.invalidate("bp.png");
        assert!(cache.is_empty());

        let _ = fs::remove_dir_all(&root);
    }
}
