use foundation::bounds::BoundingRect;
use foundation::math::{Vec2, Vec3};
use runtime::frame::Frame;
use scene::entity::EntityId;

/// Stable position of a label inside a [`LabelCollection`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelIndex(pub usize);

/// What a drawn label stands for when picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickId {
    Single(EntityId),
    /// Count marker; lists every member label.
    Merged(Vec<LabelIndex>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FillStyle {
    #[default]
    Fill,
    Outline,
    FillAndOutline,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HorizontalOrigin {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VerticalOrigin {
    #[default]
    Baseline,
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeightReference {
    #[default]
    None,
    ClampToGround,
    RelativeToGround,
}

/// Scalar interpolated between `near_value` and `far_value` over camera distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NearFarScalar {
    pub near: f64,
    pub near_value: f64,
    pub far: f64,
    pub far_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub fill_color: [f32; 4],
    pub outline_color: [f32; 4],
    pub outline_width_px: f32,
    pub fill_style: FillStyle,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 30.0,
            fill_color: [1.0, 1.0, 1.0, 1.0],
            outline_color: [0.0, 0.0, 0.0, 1.0],
            outline_width_px: 1.0,
            fill_style: FillStyle::Fill,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub show: bool,
    pub style: LabelStyle,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: VerticalOrigin,
    pub pixel_offset: Vec2,
    pub eye_offset: Vec3,
    /// World (ECEF) position, meters.
    pub position: Vec3,
    pub scale: f64,
    pub id: Option<PickId>,
    pub translucency_by_distance: Option<NearFarScalar>,
    pub pixel_offset_scale_by_distance: Option<NearFarScalar>,
    pub height_reference: HeightReference,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            text: String::new(),
            show: true,
            style: LabelStyle::default(),
            horizontal_origin: HorizontalOrigin::default(),
            vertical_origin: VerticalOrigin::default(),
            pixel_offset: Vec2::ZERO,
            eye_offset: Vec3::ZERO,
            position: Vec3::ZERO,
            scale: 1.0,
            id: None,
            translucency_by_distance: None,
            pixel_offset_scale_by_distance: None,
            height_reference: HeightReference::default(),
        }
    }
}

impl Label {
    pub fn new(text: impl Into<String>, position: Vec3) -> Self {
        Self {
            text: text.into(),
            position,
            ..Self::default()
        }
    }

    /// Aggregate marker drawn in place of `members`.
    pub fn count_marker(position: Vec3, members: Vec<LabelIndex>) -> Self {
        Self {
            text: members.len().to_string(),
            position,
            id: Some(PickId::Merged(members)),
            ..Self::default()
        }
    }

    pub fn members(&self) -> Option<&[LabelIndex]> {
        match &self.id {
            Some(PickId::Merged(members)) => Some(members),
            _ => None,
        }
    }
}

/// Receives the labels to draw for a frame.
pub trait LabelRenderer {
    fn submit(&mut self, frame: &Frame, labels: &[&Label]);
}

/// Ordered, index-stable label storage.
///
/// Used both for the source labels owned by a cluster layer and for the
/// per-recompute render output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelCollection {
    labels: Vec<Label>,
}

impl LabelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) -> LabelIndex {
        let index = LabelIndex(self.labels.len());
        self.labels.push(label);
        index
    }

    pub fn get(&self, index: LabelIndex) -> Option<&Label> {
        self.labels.get(index.0)
    }

    pub fn get_mut(&mut self, index: LabelIndex) -> Option<&mut Label> {
        self.labels.get_mut(index.0)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn remove_all(&mut self) {
        self.labels.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelIndex, &Label)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (LabelIndex(i), label))
    }

    pub fn visible(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(|label| label.show)
    }

    pub fn update<R: LabelRenderer>(&self, frame: &Frame, renderer: &mut R) {
        let shown: Vec<&Label> = self.visible().collect();
        renderer.submit(frame, &shown);
    }
}

/// Unscaled on-screen extent of a label's text.
pub trait GlyphMetrics {
    /// `[width, height]` in pixels: summed glyph advance and tallest glyph.
    fn text_size_px(&self, label: &Label) -> [f64; 2];
}

/// Approximates text extent from font size and character count.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct EstimatedGlyphs;

impl GlyphMetrics for EstimatedGlyphs {
    fn text_size_px(&self, label: &Label) -> [f64; 2] {
        let count = label.text.chars().count().max(1) as f64;
        let font = label.style.font_size_px as f64;
        [font * 0.6 * count, font]
    }
}

/// Screen footprint of `label` anchored at `coord`, grown by `pixel_range`.
///
/// The extent is scaled by `label.scale` and shifted by the origin anchors so
/// it hugs the drawn glyphs. The position moves by the full range while width
/// and height grow by half of it.
pub fn label_bounding_rect(
    label: &Label,
    coord: Vec2,
    size_px: [f64; 2],
    pixel_range: f64,
) -> BoundingRect {
    let width = size_px[0] * label.scale;
    let height = size_px[1] * label.scale;

    let mut x = coord.x;
    match label.horizontal_origin {
        HorizontalOrigin::Right => x -= width,
        HorizontalOrigin::Center => x -= width * 0.5,
        HorizontalOrigin::Left => {}
    }

    let mut y = coord.y;
    match label.vertical_origin {
        VerticalOrigin::Top => y -= height,
        VerticalOrigin::Center => y -= height * 0.5,
        VerticalOrigin::Baseline | VerticalOrigin::Bottom => {}
    }

    BoundingRect::new(
        x + pixel_range,
        y + pixel_range,
        width + pixel_range * 0.5,
        height + pixel_range * 0.5,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::time::Time;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        submitted: Vec<(u64, Vec<String>)>,
    }

    impl LabelRenderer for Recorder {
        fn submit(&mut self, frame: &Frame, labels: &[&Label]) {
            self.submitted
                .push((frame.index, labels.iter().map(|l| l.text.clone()).collect()));
        }
    }

    #[test]
    fn indices_are_stable_and_sequential() {
        let mut c = LabelCollection::new();
        let a = c.add(Label::new("a", Vec3::ZERO));
        let b = c.add(Label::new("b", Vec3::ZERO));
        assert_eq!((a, b), (LabelIndex(0), LabelIndex(1)));

        c.get_mut(a).unwrap().show = false;
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(b).unwrap().text, "b");
        assert!(c.get(LabelIndex(7)).is_none());

        c.remove_all();
        assert!(c.is_empty());
    }

    #[test]
    fn update_submits_only_shown_labels() {
        let mut c = LabelCollection::new();
        c.add(Label::new("kept", Vec3::ZERO));
        let hidden = c.add(Label::new("hidden", Vec3::ZERO));
        c.get_mut(hidden).unwrap().show = false;

        let mut r = Recorder::default();
        c.update(&Frame::new(4, Time(1.0)), &mut r);
        assert_eq!(r.submitted, vec![(4, vec!["kept".to_string()])]);
    }

    #[test]
    fn count_marker_text_and_members() {
        let marker = Label::count_marker(
            Vec3::new(1.0, 2.0, 3.0),
            vec![LabelIndex(0), LabelIndex(4), LabelIndex(9)],
        );
        assert_eq!(marker.text, "3");
        assert_eq!(
            marker.members(),
            Some(&[LabelIndex(0), LabelIndex(4), LabelIndex(9)][..])
        );
        assert!(Label::new("x", Vec3::ZERO).members().is_none());
    }

    #[test]
    fn bounding_rect_applies_range_and_anchors() {
        let size = [20.0, 10.0];
        let coord = Vec2::new(10.0, 10.0);

        let left = Label::default();
        assert_eq!(
            label_bounding_rect(&left, coord, size, 5.0),
            BoundingRect::new(15.0, 15.0, 22.5, 12.5)
        );

        let centered = Label {
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: VerticalOrigin::Center,
            ..Label::default()
        };
        assert_eq!(
            label_bounding_rect(&centered, coord, size, 0.0),
            BoundingRect::new(0.0, 5.0, 20.0, 10.0)
        );

        let top_right = Label {
            horizontal_origin: HorizontalOrigin::Right,
            vertical_origin: VerticalOrigin::Top,
            scale: 2.0,
            ..Label::default()
        };
        assert_eq!(
            label_bounding_rect(&top_right, coord, size, 0.0),
            BoundingRect::new(-30.0, -10.0, 40.0, 20.0)
        );
    }

    #[test]
    fn estimated_glyphs_scale_with_text_length() {
        let label = Label::new("abcd", Vec3::ZERO);
        let [w, h] = EstimatedGlyphs.text_size_px(&label);
        assert_eq!(h, 30.0);
        assert!((w - 72.0).abs() < 1e-9);
    }
}
