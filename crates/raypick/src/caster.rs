//! Segment picking against the triangle meshes of a scene.

use glam::{Mat4, Vec3};
use raypick_core::geometry::intersect_segment_aabb;
use raypick_core::{
    ContainerId, CullMode, LineQuery, NodeId, PickError, PickResult, PickingOptions,
    SceneGeometry, SceneQuery, Segment,
};

/// Decides whether a candidate reported by the line query gets tested.
///
/// Runs before any geometry work, so rejecting here is the cheap way to
/// exclude objects from picking. Closures `FnMut(NodeId) -> bool` are filters.
pub trait CandidateFilter {
    /// Returns `false` to skip `candidate` entirely.
    fn accept(&mut self, candidate: NodeId) -> bool {
        let _ = candidate;
        true
    }
}

/// Filter accepting every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CandidateFilter for AcceptAll {}

impl<F> CandidateFilter for F
where
    F: FnMut(NodeId) -> bool,
{
    fn accept(&mut self, candidate: NodeId) -> bool {
        self(candidate)
    }
}

/// Counters of the most recent query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickStats {
    /// Candidates reported by the line query.
    pub candidates: u32,
    /// Candidates the filter rejected.
    pub filtered: u32,
    /// Candidates without a mesh.
    pub without_mesh: u32,
    /// Candidates whose bounding box the segment missed.
    pub box_misses: u32,
    /// Candidates skipped because their bounding box starts behind the best hit.
    pub early_rejections: u32,
    /// Narrow phase triangle tests run.
    pub triangle_tests: u32,
    /// Hits discarded for lying behind a segment start inside the box.
    pub backfires: u32,
    /// Hits that replaced the previous best.
    pub commits: u32,
}

/// Finds the closest segment/triangle intersection.
///
/// Candidates come from the scene's line query. Each one is tested in its own
/// local space and compared by squared distance in the reference space the
/// segment was given in.
#[derive(Debug, Clone, Default)]
pub struct RayCaster<F = AcceptAll> {
    filter: F,
    options: PickingOptions,
    stats: PickStats,
}

impl RayCaster {
    /// Creates a caster accepting every candidate.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: CandidateFilter> RayCaster<F> {
    /// Creates a caster with a candidate filter.
    pub fn with_filter(filter: F) -> Self {
        Self {
            filter,
            options: PickingOptions::default(),
            stats: PickStats::default(),
        }
    }

    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: PickingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PickingOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PickingOptions) {
        self.options = options;
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut F {
        &mut self.filter
    }

    /// Counters of the most recent query.
    pub fn last_stats(&self) -> PickStats {
        self.stats
    }

    /// Picks the nearest mesh triangle under the segment `start -> end`,
    /// given in `container` space, using the configured cull mode.
    ///
    /// Returns `true` only if a hit was found within the segment. On `false`,
    /// `result` may still hold a hit the range guard discarded.
    pub fn pick_in_container<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        container: ContainerId,
        start: Vec3,
        end: Vec3,
    ) -> bool
    where
        S: SceneQuery + SceneGeometry + ?Sized,
    {
        let cull_mode = self.options.cull_mode;
        self.try_pick_in_container(scene, result, container, start, end, cull_mode)
            .is_ok()
    }

    /// [`RayCaster::pick_in_container`] with an explicit cull mode.
    pub fn pick_in_container_culled<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        container: ContainerId,
        start: Vec3,
        end: Vec3,
        cull_mode: CullMode,
    ) -> bool
    where
        S: SceneQuery + SceneGeometry + ?Sized,
    {
        self.try_pick_in_container(scene, result, container, start, end, cull_mode)
            .is_ok()
    }

    /// [`RayCaster::pick_in_container`] reporting why nothing was picked.
    pub fn try_pick_in_container<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        container: ContainerId,
        start: Vec3,
        end: Vec3,
        cull_mode: CullMode,
    ) -> Result<(), PickError>
    where
        S: SceneQuery + SceneGeometry + ?Sized,
    {
        result.begin(Some(container), start);
        self.stats = PickStats::default();

        let segment = Segment::new(start, end);
        let query = LineQuery::new(container, segment).with_cull_mode(cull_mode);
        let backfire_rejection = self.options.backfire_rejection;
        let filter = &mut self.filter;
        let stats = &mut self.stats;

        scene.query_line(&query, &mut |candidate| {
            stats.candidates += 1;
            let Some(reference) = result.reference_container() else {
                return;
            };
            if !filter.accept(candidate) {
                stats.filtered += 1;
                return;
            }
            if !scene.has_mesh(candidate) {
                stats.without_mesh += 1;
                return;
            }
            let Some(local_to_reference) = local_to_reference(scene, candidate, reference) else {
                log::trace!("{candidate:?} has no usable transform into {reference:?}");
                return;
            };
            let local = segment.transformed(&local_to_reference.inverse());
            let test = MeshTest {
                node: candidate,
                local: &local,
                local_to_reference,
                geometry_filter: None,
                backfire_rejection,
            };
            test.run(scene, result, stats);
        });

        self.finish(result, &segment)
    }

    /// Picks the nearest triangle of a single object's mesh.
    ///
    /// The segment is given in the object's local space and distances are
    /// measured there. `geometry_filter` restricts the test to the listed
    /// sub-meshes. The candidate filter is not consulted.
    pub fn pick_in_object<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        object: NodeId,
        start: Vec3,
        end: Vec3,
        geometry_filter: Option<&[u32]>,
    ) -> bool
    where
        S: SceneGeometry + ?Sized,
    {
        self.try_pick_in_object(scene, result, object, start, end, geometry_filter)
            .is_ok()
    }

    /// [`RayCaster::pick_in_object`] reporting why nothing was picked.
    pub fn try_pick_in_object<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        object: NodeId,
        start: Vec3,
        end: Vec3,
        geometry_filter: Option<&[u32]>,
    ) -> Result<(), PickError>
    where
        S: SceneGeometry + ?Sized,
    {
        result.begin(None, start);
        self.stats = PickStats {
            candidates: 1,
            ..PickStats::default()
        };

        if !scene.has_mesh(object) {
            self.stats.without_mesh += 1;
            return Err(PickError::MissingPrerequisite("object mesh"));
        }

        let segment = Segment::new(start, end);
        let test = MeshTest {
            node: object,
            local: &segment,
            local_to_reference: Mat4::IDENTITY,
            geometry_filter,
            backfire_rejection: self.options.backfire_rejection,
        };
        test.run(scene, result, &mut self.stats);

        self.finish(result, &segment)
    }

    fn finish(&self, result: &PickResult, segment: &Segment) -> Result<(), PickError> {
        log::debug!("pick finished: {:?}", self.stats);

        if !result.has_hit() {
            return Err(PickError::NoCandidateAcceptable);
        }
        let squared_length = segment.squared_length();
        let squared_distance = result.nearest_squared_distance();
        if squared_length < squared_distance {
            log::debug!(
                "discarding hit at squared distance {squared_distance}, \
                 segment squared length is {squared_length}"
            );
            return Err(PickError::OutOfRange {
                squared_distance,
                squared_length,
            });
        }
        Ok(())
    }
}

/// Local space of `node` to the space of `reference`, if invertible.
fn local_to_reference<S>(scene: &S, node: NodeId, reference: ContainerId) -> Option<Mat4>
where
    S: SceneGeometry + ?Sized,
{
    let container = scene.node_container(node)?;
    let transform = scene.container_transform(container, reference)? * scene.node_transform(node)?;
    (transform.determinant().abs() > f32::EPSILON).then_some(transform)
}

/// One candidate's bounds check, narrow phase and commit.
struct MeshTest<'a> {
    node: NodeId,
    /// Query segment in node local space.
    local: &'a Segment,
    local_to_reference: Mat4,
    geometry_filter: Option<&'a [u32]>,
    backfire_rejection: bool,
}

impl MeshTest<'_> {
    fn run<S>(&self, scene: &S, result: &mut PickResult, stats: &mut PickStats)
    where
        S: SceneGeometry + ?Sized,
    {
        let Some(aabb) = scene.local_aabb(self.node) else {
            stats.box_misses += 1;
            return;
        };
        let Some(t) = intersect_segment_aabb(self.local, &aabb) else {
            stats.box_misses += 1;
            return;
        };

        // Start outside the box: nothing in it is closer than the entry point.
        if result.has_hit() && t >= 0.0 {
            let entry = self
                .local_to_reference
                .transform_point3(self.local.point_at(t));
            if entry.distance_squared(result.reference_start()) > result.nearest_squared_distance()
            {
                stats.early_rejections += 1;
                return;
            }
        }

        stats.triangle_tests += 1;
        let Some(hit) = scene.find_nearest_triangle(self.node, self.local, self.geometry_filter)
        else {
            return;
        };

        if self.backfire_rejection && t < 0.0 {
            let to_hit = (hit.point - self.local.start).normalize_or_zero();
            if self.local.direction().dot(to_hit) < 0.0 {
                stats.backfires += 1;
                return;
            }
        }

        let reference_hit = self.local_to_reference.transform_point3(hit.point);
        let squared_distance = reference_hit.distance_squared(result.reference_start());
        if result.offer(self.node, &hit, self.local_to_reference, squared_distance) {
            stats.commits += 1;
            log::trace!(
                "{:?} hit triangle {}/{} at squared distance {squared_distance}",
                self.node,
                hit.geometry_index,
                hit.triangle_index
            );
        }
    }
}
