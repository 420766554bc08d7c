//! Root Controller
//!
//! Wires one render watcher to the reconciler and owns the mount
//! lifecycle. Construction resolves the mount selector, makes every data
//! key reactive, and runs the first render; from then on every write to a
//! field the render function reads drives a synchronous
//! re-render-and-patch cycle before the write returns.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::error::Error;
use crate::reactive::{DataRecord, Value, Watcher};
use crate::render::patch::patch_unchecked;
use crate::render::surface::{NodeRef, RenderSurface};
use crate::render::vnode::{wrap_surface_node, VNode};

/// A render function: reads the instance's record, returns the desired
/// tree. Reads are tracked, so the fields touched here are exactly the
/// fields whose writes re-render.
pub type RenderFn = Arc<dyn Fn(&DataRecord) -> VNode + Send + Sync>;

/// Configuration for [`App::mount`].
pub struct AppConfig {
    /// Selector identifying the mount target on the surface.
    pub el: String,

    /// Initial field values. Only keys present here become reactive.
    pub data: IndexMap<String, Value>,

    /// The render function.
    pub render: RenderFn,
}

impl AppConfig {
    /// Start a config with a selector and render function.
    pub fn new<F>(el: impl Into<String>, render: F) -> Self
    where
        F: Fn(&DataRecord) -> VNode + Send + Sync + 'static,
    {
        Self {
            el: el.into(),
            data: IndexMap::new(),
            render: Arc::new(render),
        }
    }

    /// Add an initial data field.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Previous-cycle baseline: the tree the last successful patch produced,
/// and the surface node rooting the mounted region.
struct MountState {
    /// `None` only before the first successful patch; the first cycle
    /// wraps the live mount target instead.
    tree: Option<VNode>,
    root: NodeRef,
}

/// A mounted instance.
///
/// # Example
///
/// ```rust,ignore
/// let surface = Arc::new(MemorySurface::new());
/// surface.mount_point("app");
///
/// let app = App::mount(
///     surface.clone(),
///     AppConfig::new("#app", |data| VNode::text(data.get("count").to_string()))
///         .data("count", 0),
/// )?;
///
/// app.set("count", 1); // surface now shows "1"
/// ```
pub struct App {
    record: Arc<DataRecord>,
    surface: Arc<dyn RenderSurface>,
    state: Arc<RwLock<MountState>>,
    last_error: Arc<RwLock<Option<Error>>>,

    /// The render watcher. Held for the instance's lifetime; dropping the
    /// App is what stops re-rendering (deps hold it weakly).
    _render_watcher: Arc<Watcher<()>>,
}

impl App {
    /// Mount a new instance on `surface`.
    ///
    /// Fails fast with [`Error::MountTargetNotFound`] if the selector
    /// resolves to nothing, and returns [`Error::InvalidVNode`] if the
    /// first render produces a tree that fails validation.
    pub fn mount(surface: Arc<dyn RenderSurface>, config: AppConfig) -> Result<Self, Error> {
        let AppConfig { el, data, render } = config;

        let root = surface
            .query_selector(&el)
            .ok_or(Error::MountTargetNotFound {
                selector: el.clone(),
            })?;
        tracing::info!(selector = %el, fields = data.len(), "mounting");

        let record = Arc::new(DataRecord::observe_all(data));
        let state = Arc::new(RwLock::new(MountState { tree: None, root }));
        let last_error = Arc::new(RwLock::new(None));

        // The render watcher: evaluate the render function (tracking every
        // field it reads), then reconcile against the previous cycle's
        // tree. Re-rendering is a side effect of evaluation, so the
        // watcher's value is () and it carries no change callback.
        let eval_record = Arc::clone(&record);
        let eval_surface = Arc::clone(&surface);
        let eval_state = Arc::clone(&state);
        let eval_error = Arc::clone(&last_error);
        let render_watcher = Watcher::new(move || {
            let tree = render(&eval_record);
            if let Err(err) = tree.validate() {
                tracing::error!(%err, "render produced an invalid tree, surface left untouched");
                *eval_error.write().expect("error slot lock poisoned") = Some(err);
                return;
            }

            let mut state = eval_state.write().expect("mount state lock poisoned");
            let root = match state.tree.take() {
                // First cycle: wrap the live mount target so the patch
                // sees two vnodes.
                None => {
                    let wrapped = wrap_surface_node(&*eval_surface, state.root);
                    patch_unchecked(&*eval_surface, &wrapped, &tree)
                }
                Some(prev) => patch_unchecked(&*eval_surface, &prev, &tree),
            };
            state.root = root;
            state.tree = Some(tree);
        });

        // The baseline evaluation already ran; surface its failure as the
        // mount result rather than leaving a half-constructed instance.
        if let Some(err) = last_error
            .write()
            .expect("error slot lock poisoned")
            .take()
        {
            return Err(err);
        }

        Ok(Self {
            record,
            surface,
            state,
            last_error,
            _render_watcher: render_watcher,
        })
    }

    /// Read a field. Equivalent to reading the internal record: inside an
    /// evaluation this registers a dependency like any other read.
    pub fn get(&self, key: &str) -> Value {
        self.record.get(key)
    }

    /// Write a field, driving the full synchronous cascade before
    /// returning. Equal writes are no-ops.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.record.set(key, value);
    }

    /// The instance's data record.
    pub fn record(&self) -> &DataRecord {
        &self.record
    }

    /// The surface this instance renders to.
    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    /// The surface node currently rooting the mounted region.
    pub fn root(&self) -> NodeRef {
        self.state.read().expect("mount state lock poisoned").root
    }

    /// The most recent post-mount render failure, if any. The failing
    /// cycle left the surface untouched; the previous tree remains the
    /// baseline.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
            .read()
            .expect("error slot lock poisoned")
            .clone()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::memory::MemorySurface;
    use crate::render::vnode::{Attrs, VNode};

    #[test]
    fn mount_fails_fast_on_missing_target() {
        let surface = Arc::new(MemorySurface::new());

        let result = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#nowhere", |_| VNode::text("x")),
        );

        assert_eq!(
            result.err(),
            Some(Error::MountTargetNotFound {
                selector: "#nowhere".into()
            })
        );
    }

    #[test]
    fn counter_updates_surface_text() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");
        let body = surface.query_selector("body").expect("seeded");

        let app = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |data| VNode::text(data.get("count").to_string()))
                .data("count", 0),
        )
        .expect("mounts");

        // The text vnode replaced the placeholder div.
        assert_eq!(surface.to_markup(body), "<body>0</body>");
        assert_eq!(surface.text_of(app.root()).as_deref(), Some("0"));

        app.set("count", 1);
        assert_eq!(surface.to_markup(body), "<body>1</body>");

        // Equal write: nothing happens.
        let before = surface.mutation_count();
        app.set("count", 1);
        assert_eq!(surface.mutation_count(), before);
    }

    #[test]
    fn tag_alternation_replaces_the_root_node() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");
        let body = surface.query_selector("body").expect("seeded");

        let app = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |data| {
                let tag = if data.get("fancy").is_truthy() {
                    "span"
                } else {
                    "section"
                };
                VNode::element(tag, Attrs::new(), "x")
            })
            .data("fancy", false),
        )
        .expect("mounts");

        let first_root = app.root();
        assert_eq!(surface.tag_name(first_root), "section");

        app.set("fancy", true);
        let second_root = app.root();
        assert_ne!(second_root, first_root);
        assert_eq!(surface.tag_name(second_root), "span");
        // Old node detached, new one in its position.
        assert_eq!(surface.parent_node(first_root), None);
        assert_eq!(surface.children_of(body), vec![second_root]);
    }

    #[test]
    fn untracked_field_write_does_not_rerender() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");

        let app = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |data| VNode::text(data.get("shown").to_string()))
                .data("shown", "a")
                .data("hidden", "b"),
        )
        .expect("mounts");

        let before = surface.mutation_count();
        app.set("hidden", "changed");
        assert_eq!(surface.mutation_count(), before);

        app.set("shown", "changed");
        assert!(surface.mutation_count() > before);
    }

    #[test]
    fn invalid_first_render_fails_mount() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");

        let result = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |_| VNode::element("", Attrs::new(), Vec::new())),
        );

        assert!(matches!(result, Err(Error::InvalidVNode { .. })));
    }

    #[test]
    fn invalid_rerender_is_reported_and_leaves_surface_untouched() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");
        let body = surface.query_selector("body").expect("seeded");

        let app = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |data| {
                VNode::element(data.get("tag").to_string(), Attrs::new(), "x")
            })
            .data("tag", "p"),
        )
        .expect("mounts");
        assert!(app.last_error().is_none());
        assert_eq!(surface.to_markup(body), "<body><p>x</p></body>");

        app.set("tag", "");
        assert!(matches!(
            app.last_error(),
            Some(Error::InvalidVNode { .. })
        ));
        assert_eq!(surface.to_markup(body), "<body><p>x</p></body>");

        // A later valid write recovers against the retained baseline.
        app.set("tag", "h1");
        assert_eq!(surface.to_markup(body), "<body><h1>x</h1></body>");
    }

    #[test]
    fn writes_to_unknown_keys_are_dropped() {
        let surface = Arc::new(MemorySurface::new());
        surface.mount_point("app");

        let app = App::mount(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            AppConfig::new("#app", |data| VNode::text(data.get("count").to_string()))
                .data("count", 0),
        )
        .expect("mounts");

        app.set("unknown", 9);
        assert_eq!(app.get("unknown"), Value::Null);
        assert_eq!(app.get("count"), Value::Int(0));
    }
}
