//! Facade owning the point store, its index and the fitting passes.

use std::fmt;
use std::path::Path;

use crate::config::DataManagerConfig;
use crate::error::{CloudIoError, RangeError};
use crate::io;
use crate::kdtree::KdTree;
use crate::normals;
use crate::passes::{Cloud, FittingPass, PassRegistry, PassVisitor};
use crate::point::DataPoint;
use crate::store::{PointStore, Range};

type PostUpdateHook = Box<dyn FnMut()>;

/// Shared state of the application: the cloud, its k-d tree and the passes.
///
/// Edits go through [`points_mut`](Self::points_mut) and are published with
/// [`update_kd_tree`](Self::update_kd_tree), which rebuilds the index,
/// refreshes the passes and then runs the post-update hook.
pub struct DataManager {
    config: DataManagerConfig,
    store: PointStore,
    tree: KdTree,
    passes: PassRegistry,
    on_update: PostUpdateHook,
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataManager")
            .field("config", &self.config)
            .field("points", &self.store.len())
            .field("indexed", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl DataManager {
    /// Creates an empty manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DataManagerConfig::default())
    }

    pub fn with_config(config: DataManagerConfig) -> Self {
        let passes = PassRegistry::new(&config.passes);
        Self {
            config,
            store: PointStore::new(),
            tree: KdTree::new(),
            passes,
            on_update: Box::new(|| {}),
        }
    }

    #[inline]
    pub fn config(&self) -> &DataManagerConfig {
        &self.config
    }

    /// Read access to the points.
    #[inline]
    pub fn points(&self) -> &PointStore {
        &self.store
    }

    /// Mutable access to the points. The index is stale until the next
    /// [`update_kd_tree`](Self::update_kd_tree).
    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<DataPoint> {
        self.store.as_mut_vec()
    }

    /// Appends a point with the configured default orientation.
    pub fn push_point(&mut self, x: f32, y: f32) {
        let angle = self.config.default_point_angle;
        self.store.as_mut_vec().push(DataPoint::new(x, y, angle));
    }

    /// Read access to the index as of the last rebuild.
    #[inline]
    pub fn kd_tree(&self) -> &KdTree {
        &self.tree
    }

    /// Points and index together, as passes see them.
    pub fn cloud(&self) -> Cloud<'_> {
        Cloud::new(self.store.as_slice(), &self.tree)
    }

    /// Rebuilds the index from the current points, refreshes every pass and
    /// runs the post-update hook once.
    pub fn update_kd_tree(&mut self) {
        if self.store.is_empty() {
            self.tree.clear();
        } else {
            self.tree = KdTree::from_points(self.store.as_slice());
        }
        log::debug!(
            "rebuilt kd-tree over {} points (depth {})",
            self.tree.len(),
            self.tree.depth()
        );

        let cloud = Cloud::new(self.store.as_slice(), &self.tree);
        self.passes.prepare_all(&cloud);
        (self.on_update)();
    }

    /// Replaces the post-update hook.
    pub fn set_kd_tree_post_update_function(&mut self, hook: impl FnMut() + 'static) {
        self.on_update = Box::new(hook);
    }

    /// Writes the current points to `path`.
    pub fn save_point_cloud(&self, path: impl AsRef<Path>) -> Result<(), CloudIoError> {
        let path = path.as_ref();
        io::save(path, self.store.as_slice()).inspect_err(|e| {
            log::warn!("failed to save {}: {e}", path.display());
        })?;
        log::info!("saved {} points to {}", self.store.len(), path.display());
        Ok(())
    }

    /// Replaces the points with the content of `path`. On error the current
    /// points are kept. The index is not rebuilt.
    pub fn load_point_cloud(&mut self, path: impl AsRef<Path>) -> Result<(), CloudIoError> {
        let path = path.as_ref();
        let points = io::load(path).inspect_err(|e| {
            log::warn!("failed to load {}: {e}", path.display());
        })?;
        log::info!("loaded {} points from {}", points.len(), path.display());
        self.store.replace(points);
        Ok(())
    }

    /// Maps point coordinates from `source` (inferred when `None`) to `target`.
    /// See [`PointStore::fit_to_range`].
    pub fn fit_point_cloud_to_range(
        &mut self,
        target: impl Into<Range>,
        source: Option<Range>,
    ) -> Result<(), RangeError> {
        self.store.fit_to_range(target.into(), source).inspect_err(|e| {
            log::warn!("range fit rejected: {e}");
        })
    }

    /// Re-estimates every normal from its `k` nearest neighbors. Requires an
    /// up-to-date index. Returns the number of points updated.
    ///
    /// The stored angle is the direction of the normal, not of the tangent:
    /// points along the x axis end up with π/2. Use [`DataPoint::tangent`]
    /// for the direction along the curve. `k` larger than the cloud uses
    /// every point.
    pub fn compute_normals(&mut self, k: usize) -> usize {
        normals::compute_normals(self.store.as_mut_vec(), &self.tree, k)
    }

    /// [`compute_normals`](Self::compute_normals) with the configured k.
    pub fn compute_normals_default(&mut self) -> usize {
        let k = self.config.normal_neighbors;
        self.compute_normals(k)
    }

    pub fn passes(&self) -> &PassRegistry {
        &self.passes
    }

    /// Pass registered under `name`, `None` for unknown names.
    pub fn drawing_pass(&self, name: &str) -> Option<&FittingPass> {
        self.passes.by_name(name)
    }

    pub fn drawing_pass_mut(&mut self, name: &str) -> Option<&mut FittingPass> {
        self.passes.by_name_mut(name)
    }

    /// Pass stored at `index`, `None` outside `0..PASS_COUNT`.
    pub fn drawing_pass_at(&self, index: usize) -> Option<&FittingPass> {
        self.passes.get(index)
    }

    pub fn drawing_pass_at_mut(&mut self, index: usize) -> Option<&mut FittingPass> {
        self.passes.get_mut(index)
    }

    /// Re-runs the prepare step of one pass, after its parameters changed.
    pub fn prepare_pass(&mut self, index: usize) -> bool {
        let cloud = Cloud::new(self.store.as_slice(), &self.tree);
        match self.passes.get_mut(index) {
            Some(pass) => {
                pass.as_drawing_pass_mut().prepare(&cloud);
                true
            }
            None => false,
        }
    }

    /// Hands the pass at `index` to `visitor` with its concrete type, along
    /// with the current cloud. Returns `false`, without visiting, for an
    /// invalid index.
    pub fn process_pass<I, V>(&mut self, index: I, visitor: &mut V) -> bool
    where
        I: TryInto<usize>,
        V: PassVisitor,
    {
        let cloud = Cloud::new(self.store.as_slice(), &self.tree);
        self.passes.process_pass(index, &cloud, visitor)
    }

    /// Like [`process_pass`](Self::process_pass), returning the visitor's output.
    pub fn visit_pass<I, V>(&mut self, index: I, visitor: &mut V) -> Option<V::Output>
    where
        I: TryInto<usize>,
        V: PassVisitor,
    {
        let cloud = Cloud::new(self.store.as_slice(), &self.tree);
        self.passes.visit_pass(index, &cloud, visitor)
    }
}
