use std::collections::HashMap;

use runtime::event_bus::{CameraChanged, EventBus, Subscription};
use runtime::frame::Frame;
use scene::entity::EntityId;
use scene::view::SceneView;
use tracing::{debug, trace};

use crate::cluster::{ClusterState, DeclutterStats, declutter};
use crate::config::{ClusterConfig, ConfigError};
use crate::labels::{
    EstimatedGlyphs, GlyphMetrics, Label, LabelCollection, LabelIndex, LabelRenderer, PickId,
};
use crate::layer::{Layer, LayerId};

/// Label layer that merges overlapping entity labels into count markers.
///
/// Owns the source labels (one per registered entity, never compacted), the
/// render output of the latest recompute and the state carried between
/// recomputes. Recomputes are driven by camera-change events.
///
/// Call [`EntityCluster::destroy`] to release the event subscription. Dropping
/// the layer without it leaves its cursor registered on the bus; the bus can
/// then never discard events past that cursor, so its backlog grows with every
/// publish.
#[derive(Debug)]
pub struct EntityCluster<G = EstimatedGlyphs> {
    id: LayerId,
    config: ClusterConfig,
    glyphs: G,
    labels: Option<LabelCollection>,
    render: Option<LabelCollection>,
    label_indices: HashMap<EntityId, LabelIndex>,
    state: ClusterState,
    subscription: Option<Subscription>,
    destroyed: bool,
}

impl EntityCluster<EstimatedGlyphs> {
    pub fn new(
        id: u64,
        config: ClusterConfig,
        camera_events: &mut EventBus<CameraChanged>,
    ) -> Result<Self, ConfigError> {
        Self::with_glyphs(id, config, EstimatedGlyphs, camera_events)
    }
}

impl<G: GlyphMetrics> EntityCluster<G> {
    pub fn with_glyphs(
        id: u64,
        config: ClusterConfig,
        glyphs: G,
        camera_events: &mut EventBus<CameraChanged>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let subscription = camera_events.subscribe();
        debug!(layer = id, pixel_range = config.pixel_range, "entity cluster created");
        Ok(Self {
            id: LayerId(id),
            config,
            glyphs,
            labels: None,
            render: None,
            label_indices: HashMap::new(),
            state: ClusterState::default(),
            subscription: Some(subscription),
            destroyed: false,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// Source labels, once any entity has been registered.
    pub fn label_collection(&self) -> Option<&LabelCollection> {
        self.labels.as_ref()
    }

    /// Output of the latest recompute; `None` means the source labels are drawn.
    pub fn render_collection(&self) -> Option<&LabelCollection> {
        self.render.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns the label for `entity`, creating it on first use.
    ///
    /// New labels are tagged with `PickId::Single(entity)`. Returns `None` only
    /// after [`EntityCluster::destroy`].
    pub fn label_for(&mut self, entity: EntityId) -> Option<&mut Label> {
        if self.destroyed {
            return None;
        }
        let labels = self.labels.get_or_insert_with(LabelCollection::new);
        let index = match self.label_indices.get(&entity) {
            Some(&index) => index,
            None => {
                let index = labels.add(Label {
                    id: Some(PickId::Single(entity)),
                    ..Label::default()
                });
                self.label_indices.insert(entity, index);
                index
            }
        };
        labels.get_mut(index)
    }

    pub fn label(&self, entity: EntityId) -> Option<&Label> {
        let index = self.label_indices.get(&entity)?;
        self.labels.as_ref()?.get(*index)
    }

    /// Hides the entity's label. The slot is kept so indices stay stable.
    pub fn remove(&mut self, entity: EntityId) {
        let Some(labels) = self.labels.as_mut() else {
            return;
        };
        let Some(index) = self.label_indices.get(&entity) else {
            return;
        };
        if let Some(label) = labels.get_mut(*index) {
            label.show = false;
        }
    }

    /// Submits whichever collection is current: the clustered output if the
    /// latest recompute produced one, the source labels otherwise.
    pub fn update<R: LabelRenderer>(&self, frame: &Frame, renderer: &mut R) {
        let Some(labels) = self.labels.as_ref() else {
            return;
        };
        match self.render.as_ref() {
            Some(render) => render.update(frame, renderer),
            None => labels.update(frame, renderer),
        }
    }

    /// Camera-change handler. Small changes (below `min_change`) are ignored.
    ///
    /// Returns the recompute's stats, or `None` when it was skipped.
    pub fn on_camera_changed<V: SceneView>(
        &mut self,
        amount: Option<f64>,
        view: &V,
    ) -> Option<DeclutterStats> {
        if !self.passes_gate(amount) {
            trace!(layer = self.id.0, ?amount, "camera change below threshold");
            return None;
        }
        self.recompute(view)
    }

    /// Drains this layer's pending camera events and recomputes once if any of
    /// them passes the change threshold.
    pub fn process_camera_events<V: SceneView>(
        &mut self,
        camera_events: &mut EventBus<CameraChanged>,
        view: &V,
    ) -> Option<DeclutterStats> {
        let subscription = self.subscription.as_ref()?;
        let events = camera_events.poll(subscription);
        if !events.iter().any(|e| self.passes_gate(e.amount)) {
            if !events.is_empty() {
                trace!(layer = self.id.0, count = events.len(), "camera changes below threshold");
            }
            return None;
        }
        self.recompute(view)
    }

    /// Releases labels, render output and the event subscription. Repeated
    /// calls are no-ops.
    pub fn destroy(&mut self, camera_events: &mut EventBus<CameraChanged>) {
        if self.destroyed {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            camera_events.unsubscribe(subscription);
        }
        self.labels = None;
        self.render = None;
        self.label_indices.clear();
        self.state = ClusterState::default();
        self.destroyed = true;
        debug!(layer = self.id.0, "entity cluster destroyed");
    }

    fn passes_gate(&self, amount: Option<f64>) -> bool {
        !amount.is_some_and(|a| a < self.config.min_change)
    }

    fn recompute<V: SceneView>(&mut self, view: &V) -> Option<DeclutterStats> {
        let labels = self.labels.as_ref()?;
        let out = declutter(
            std::mem::take(&mut self.state),
            labels,
            view,
            &self.glyphs,
            &self.config,
        );
        self.state = out.state;
        self.render = out.render;
        Some(out.stats)
    }
}

impl<G> Layer for EntityCluster<G> {
    fn id(&self) -> LayerId {
        self.id
    }
}
