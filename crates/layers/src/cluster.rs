//! Screen-space label clustering.
//!
//! One [`declutter`] call culls the source labels against the current view,
//! keeps still-dense clusters from the previous call while the camera is not
//! rising, then greedily merges whatever is left. The result replaces the
//! previous render output and cluster list wholesale.
//!
//! Ordering contract:
//! - Candidates are visited in label-store order; earlier labels seed clusters first.
//! - Count-marker member lists are in ascending `LabelIndex` order.

use foundation::math::{Vec2, Vec3, stable_max_f64};
use scene::spatial::ScreenIndex;
use scene::view::SceneView;
use scene::visibility::EllipsoidalOccluder;
use tracing::debug;

use crate::config::ClusterConfig;
use crate::labels::{GlyphMetrics, Label, LabelCollection, LabelIndex, label_bounding_rect};

/// Cluster carried from one recompute to the next.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cluster {
    /// Mean world position of the members when the cluster formed.
    pub position: Vec3,
    /// Screen-space capture radius, pixels.
    pub radius: f64,
}

/// State threaded between recomputes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterState {
    /// Only clusters with two or more members.
    pub previous_clusters: Vec<Cluster>,
    /// Camera altitude of the previous recompute; `None` before the first one.
    pub previous_altitude: Option<f64>,
}

/// A label that passed culling, for the duration of one recompute.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub label: LabelIndex,
    pub coord: Vec2,
    pub clustered: bool,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DeclutterStats {
    pub candidates: usize,
    pub culled: usize,
    pub reused_clusters: usize,
    pub new_clusters: usize,
    pub singles: usize,
}

/// Output of one recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct Declutter {
    pub state: ClusterState,
    /// `None` when nothing is drawn; callers fall back to the source labels.
    pub render: Option<LabelCollection>,
    pub stats: DeclutterStats,
}

/// Labels that face the camera and project inside the viewport, in store order.
pub fn collect_screen_points<V: SceneView>(
    labels: &LabelCollection,
    view: &V,
    occluder: &EllipsoidalOccluder,
) -> Vec<ScreenPoint> {
    labels
        .iter()
        .filter_map(|(index, label)| {
            let coord = view.visible_screen_position(occluder, label.position)?;
            Some(ScreenPoint {
                label: index,
                coord,
                clustered: false,
            })
        })
        .collect()
}

/// Recomputes the displayed label set for `view`.
pub fn declutter<V: SceneView, G: GlyphMetrics>(
    state: ClusterState,
    labels: &LabelCollection,
    view: &V,
    glyphs: &G,
    config: &ClusterConfig,
) -> Declutter {
    let occluder = view.occluder();
    let current_altitude = view.camera_altitude();

    let mut points = collect_screen_points(labels, view, &occluder);
    let coords: Vec<Vec2> = points.iter().map(|p| p.coord).collect();
    let index = ScreenIndex::build(&coords);

    let mut render = LabelCollection::new();
    let mut clusters = Vec::new();
    let mut stats = DeclutterStats {
        candidates: points.len(),
        culled: labels.len() - points.len(),
        ..DeclutterStats::default()
    };

    // Zooming out lets clusters re-form from scratch.
    let reuse = state
        .previous_altitude
        .is_some_and(|previous| current_altitude <= previous);
    if reuse {
        stats.reused_clusters = reuse_clusters(
            &state.previous_clusters,
            &mut points,
            &index,
            view,
            &occluder,
            &mut render,
            &mut clusters,
        );
    }

    let (new_clusters, singles) = merge_remaining(
        labels,
        &mut points,
        &index,
        glyphs,
        config.pixel_range,
        &mut render,
        &mut clusters,
    );
    stats.new_clusters = new_clusters;
    stats.singles = singles;

    debug!(
        candidates = stats.candidates,
        culled = stats.culled,
        reused = stats.reused_clusters,
        formed = stats.new_clusters,
        singles = stats.singles,
        altitude = current_altitude,
        "declutter complete"
    );

    Declutter {
        state: ClusterState {
            previous_clusters: clusters,
            previous_altitude: Some(current_altitude),
        },
        render: (!render.is_empty()).then_some(render),
        stats,
    }
}

/// Keeps each previous cluster that still captures two or more unclaimed
/// points. Kept clusters are re-emitted with their stored centroid and radius.
///
/// Returns the number of clusters kept.
fn reuse_clusters<V: SceneView>(
    previous: &[Cluster],
    points: &mut [ScreenPoint],
    index: &ScreenIndex,
    view: &V,
    occluder: &EllipsoidalOccluder,
    render: &mut LabelCollection,
    clusters: &mut Vec<Cluster>,
) -> usize {
    let mut kept = 0;
    for cluster in previous {
        let Some(coord) = view.visible_screen_position(occluder, cluster.position) else {
            continue;
        };

        let mut claimed = Vec::new();
        for i in index.within(coord.x, coord.y, cluster.radius) {
            let point = &mut points[i];
            if !point.clustered {
                point.clustered = true;
                claimed.push(i);
            }
        }

        match claimed.len() {
            0 => {}
            // A lone survivor goes back to the greedy pass.
            1 => points[claimed[0]].clustered = false,
            _ => {
                let members = claimed.iter().map(|&i| points[i].label).collect();
                render.add(Label::count_marker(cluster.position, members));
                clusters.push(*cluster);
                kept += 1;
            }
        }
    }
    kept
}

/// Greedy bounding-box merge over the unclaimed points.
///
/// The seed's box is grown by each absorbed neighbor's box, but the neighbor
/// query is issued once from the seed's box and is not repeated as it grows.
///
/// Returns `(clusters formed, labels emitted individually)`.
fn merge_remaining<G: GlyphMetrics>(
    labels: &LabelCollection,
    points: &mut [ScreenPoint],
    index: &ScreenIndex,
    glyphs: &G,
    pixel_range: f64,
    render: &mut LabelCollection,
    clusters: &mut Vec<Cluster>,
) -> (usize, usize) {
    let mut formed = 0;
    let mut singles = 0;

    for i in 0..points.len() {
        if points[i].clustered {
            continue;
        }
        points[i].clustered = true;

        let seed_index = points[i].label;
        let Some(seed) = labels.get(seed_index) else {
            continue;
        };
        let mut bbox = label_bounding_rect(
            seed,
            points[i].coord,
            glyphs.text_size_px(seed),
            pixel_range,
        );

        let mut position_sum = seed.position;
        let mut members = vec![seed_index];

        for n in index.within(bbox.x, bbox.y, bbox.width) {
            let neighbor = &mut points[n];
            if neighbor.clustered {
                continue;
            }
            neighbor.clustered = true;

            let Some(label) = labels.get(neighbor.label) else {
                continue;
            };
            position_sum += label.position;
            let footprint = label_bounding_rect(
                label,
                neighbor.coord,
                glyphs.text_size_px(label),
                pixel_range,
            );
            bbox = bbox.union(&footprint);
            members.push(neighbor.label);
        }

        if members.len() == 1 {
            render.add(seed.clone());
            singles += 1;
            continue;
        }

        let centroid = position_sum * (1.0 / members.len() as f64);
        members.sort_unstable();
        render.add(Label::count_marker(centroid, members));
        clusters.push(Cluster {
            position: centroid,
            radius: stable_max_f64(bbox.width, bbox.height) * 0.5,
        });
        formed += 1;
    }

    (formed, singles)
}
