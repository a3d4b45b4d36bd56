//! 把构件的各面轮廓与加工特征归入截面表声明的命名面，并计算多面排布的偏移。

use std::collections::BTreeMap;

use dstv_config::ComposerConfig;
use dstv_core::geometry::{Bounds2D, Point2, Vector2};
use dstv_core::part::{ContourPoint, Hole, HoleKind, Notch, Part, Slot};
use dstv_core::schema::{self, FaceTag, ProfileSchema};
use serde::Serialize;
use tracing::{debug, trace};

use crate::errors::EngineError;

/// 轮廓为空时的面高度（mm）。
const FALLBACK_FACE_HEIGHT: f64 = 200.0;

/// 一个已合成的面。孔、长圆孔与缺口借用自构件。
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedFace<'a> {
    pub tag: FaceTag,
    pub name: &'static str,
    pub color: u8,
    pub contour: Vec<ContourPoint>,
    pub holes: Vec<&'a Hole>,
    pub slots: Vec<&'a Slot>,
    pub notches: Vec<&'a Notch>,
}

impl ComposedFace<'_> {
    fn has_features(&self) -> bool {
        !self.contour.is_empty()
            || !self.holes.is_empty()
            || !self.slots.is_empty()
            || !self.notches.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceComposer {
    face_gap: f64,
}

impl FaceComposer {
    pub fn new(face_gap: f64) -> Self {
        Self { face_gap }
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::new(config.face_gap)
    }

    #[inline]
    pub fn face_gap(&self) -> f64 {
        self.face_gap
    }

    /// 按构件的截面类型查表后合成。
    pub fn compose<'a>(&self, part: &'a Part) -> Result<ComposedProfile<'a>, EngineError> {
        let schema = schema::lookup(part.profile_type())
            .ok_or_else(|| EngineError::UnknownProfileType(part.profile_type().to_string()))?;
        Ok(self.compose_with_schema(part, schema))
    }

    pub fn compose_with_schema<'a>(
        &self,
        part: &'a Part,
        schema: &ProfileSchema,
    ) -> ComposedProfile<'a> {
        let faces: Vec<ComposedFace<'a>> = schema
            .faces()
            .iter()
            .map(|&(tag, name)| ComposedFace {
                tag,
                name,
                color: tag.color_index(),
                contour: face_contour(part, tag),
                holes: on_face(part.holes(), tag, |hole| &hole.face),
                slots: on_face(part.slots(), tag, |slot| &slot.face),
                notches: on_face(part.notches(), tag, |notch| &notch.face),
            })
            .collect();

        let offsets =
            std::array::from_fn(|step| Vector2::new(0.0, -(step as f64) * self.face_gap));

        debug!(
            profile_type = %part.profile_type(),
            faces = faces.len(),
            face_gap = self.face_gap,
            "面合成完成"
        );
        ComposedProfile { faces, offsets }
    }
}

impl Default for FaceComposer {
    fn default() -> Self {
        Self::from_config(&ComposerConfig::default())
    }
}

/// I 型钢腹板的翼缘厚度；不需要裁剪时返回 `None`。
fn web_clamp_thickness(part: &Part, tag: FaceTag) -> Option<f64> {
    if tag != FaceTag::Front || !part.profile_type().to_ascii_uppercase().starts_with('I') {
        return None;
    }
    let height = part.dimension("profile_height").filter(|h| *h != 0.0)?;
    let thickness = part.dimension("flange_thickness").filter(|t| *t != 0.0)?;
    trace!(height, thickness, "腹板轮廓按翼缘厚度裁剪");
    Some(thickness)
}

fn face_contour(part: &Part, tag: FaceTag) -> Vec<ContourPoint> {
    let contour = part.contour(tag);
    match web_clamp_thickness(part, tag) {
        Some(thickness) => clamp_web(contour, thickness),
        None => contour.to_vec(),
    }
}

/// 把每个点的 Y 限制在 `[min_y + t, max_y - t]`，去掉与翼缘重叠的部分。
pub fn clamp_web(contour: &[ContourPoint], flange_thickness: f64) -> Vec<ContourPoint> {
    let Some(bounds) = Bounds2D::from_points(contour.iter().map(ContourPoint::position)) else {
        return Vec::new();
    };
    let bottom = bounds.min().y() + flange_thickness;
    let top = bounds.max().y() - flange_thickness;
    contour
        .iter()
        .map(|point| ContourPoint {
            y: point.y.max(bottom).min(top),
            ..*point
        })
        .collect()
}

fn on_face<'a, T>(items: &'a [T], tag: FaceTag, face_of: impl Fn(&T) -> &String) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| FaceTag::from_code(face_of(*item)) == Some(tag))
        .collect()
}

/// 一次合成的结果，只读。偏移仅用于排布，不回写构件。
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedProfile<'a> {
    faces: Vec<ComposedFace<'a>>,
    /// 按 [`FaceTag::STACKING_ORDER`] 排列。
    offsets: [Vector2; 4],
}

impl<'a> ComposedProfile<'a> {
    /// 截面表声明的面，保持声明顺序。
    pub fn available_faces(&self) -> impl Iterator<Item = FaceTag> + '_ {
        self.faces.iter().map(|face| face.tag)
    }

    pub fn faces(&self) -> &[ComposedFace<'a>] {
        &self.faces
    }

    pub fn face(&self, tag: FaceTag) -> Option<&ComposedFace<'a>> {
        self.faces.iter().find(|face| face.tag == tag)
    }

    pub fn has_features(&self, tag: FaceTag) -> bool {
        self.face(tag).is_some_and(ComposedFace::has_features)
    }

    pub fn face_bounds(&self, tag: FaceTag) -> Option<Bounds2D> {
        let face = self.face(tag)?;
        Bounds2D::from_points(face.contour.iter().map(ContourPoint::position))
    }

    /// 轮廓的 Y 向跨度；面不存在或轮廓为空时取 200。
    pub fn face_height(&self, tag: FaceTag) -> f64 {
        self.face_bounds(tag).map_or(FALLBACK_FACE_HEIGHT, |bounds| bounds.height())
    }

    /// 四个面都有偏移，与该截面是否声明此面无关。
    pub fn offset(&self, tag: FaceTag) -> Vector2 {
        let index = FaceTag::STACKING_ORDER
            .iter()
            .position(|face| *face == tag)
            .unwrap_or_default();
        self.offsets[index]
    }

    pub fn offsets(&self) -> impl Iterator<Item = (FaceTag, Vector2)> + '_ {
        FaceTag::STACKING_ORDER.into_iter().zip(self.offsets)
    }

    pub fn contour_points(&self, tag: FaceTag, with_offset: bool) -> Vec<ContourPoint> {
        let Some(face) = self.face(tag) else {
            return Vec::new();
        };
        let shift = self.shift(tag, with_offset);
        face.contour
            .iter()
            .map(|point| ContourPoint {
                x: point.x + shift.x(),
                y: point.y + shift.y(),
                ..*point
            })
            .collect()
    }

    /// 所有面的导出视图，按面标记排序。
    pub fn export(&self, with_offset: bool) -> BTreeMap<FaceTag, FaceExport> {
        self.faces
            .iter()
            .filter_map(|face| Some((face.tag, self.export_face(face.tag, with_offset)?)))
            .collect()
    }

    pub fn export_face(&self, tag: FaceTag, with_offset: bool) -> Option<FaceExport> {
        let face = self.face(tag)?;
        let shift = self.shift(tag, with_offset);
        Some(FaceExport {
            name: face.name.to_string(),
            color: face.color,
            contour: face
                .contour
                .iter()
                .map(|point| point.position().translate(shift))
                .collect(),
            holes: face
                .holes
                .iter()
                .map(|hole| HoleExport {
                    center: hole.center().translate(shift),
                    diameter: hole.diameter,
                    hole_type: hole.hole_type,
                })
                .collect(),
            slots: face
                .slots
                .iter()
                .map(|slot| SlotExport {
                    center: slot.center().translate(shift),
                    diameter: slot.diameter,
                    cc_distance: slot.cc_distance,
                    angle: slot.angle,
                    length: slot.length,
                })
                .collect(),
            offset: shift,
        })
    }

    fn shift(&self, tag: FaceTag, with_offset: bool) -> Vector2 {
        if with_offset {
            self.offset(tag)
        } else {
            Vector2::zero()
        }
    }
}

/// 下游绘图与 CAD 导出读取的面数据。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceExport {
    pub name: String,
    pub color: u8,
    pub contour: Vec<Point2>,
    pub holes: Vec<HoleExport>,
    pub slots: Vec<SlotExport>,
    pub offset: Vector2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleExport {
    pub center: Point2,
    pub diameter: f64,
    #[serde(rename = "type")]
    pub hole_type: HoleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotExport {
    pub center: Point2,
    pub diameter: f64,
    pub cc_distance: f64,
    pub angle: f64,
    pub length: f64,
}

#[cfg(test)]
mod tests {
    use dstv_core::part::{Dimensions, PartHeader};

    use super::*;

    fn part(profile_type: &str, dimensions: &[(&str, f64)]) -> Part {
        let dimensions: Dimensions = dimensions
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        Part::new(
            PartHeader {
                order_id: "ORD-1".to_string(),
                piece_id: "P1".to_string(),
                material: "S355JR".to_string(),
                quantity: 1,
                profile_type: profile_type.to_string(),
                profile_code: format!("{profile_type}300"),
                length: 1200.0,
            },
            dimensions,
        )
    }

    fn web_outline() -> Vec<ContourPoint> {
        [(0.0, 0.0), (0.0, 300.0), (50.0, 300.0), (50.0, 0.0)]
            .into_iter()
            .map(|(x, y)| ContourPoint::new(x, y, 0.0))
            .collect()
    }

    fn i_profile() -> Part {
        let mut beam = part(
            "I",
            &[
                ("profile_height", 300.0),
                ("flange_width", 150.0),
                ("flange_thickness", 20.0),
                ("web_thickness", 8.0),
            ],
        );
        beam.add_contour_points(FaceTag::Front, web_outline());
        beam
    }

    #[test]
    fn i_profile_web_is_clamped_between_flanges() {
        let beam = i_profile();
        let composed = FaceComposer::default().compose(&beam).expect("compose");
        let web = composed.face(FaceTag::Front).expect("web face");
        let ys: Vec<f64> = web.contour.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![20.0, 280.0, 280.0, 20.0]);
        assert!(ys.iter().all(|y| (20.0..=280.0).contains(y)));
        assert_eq!(beam.contour(FaceTag::Front)[1].y, 300.0);
    }

    #[test]
    fn non_i_profile_web_is_left_alone() {
        let mut channel = part("U", &[("profile_height", 300.0), ("flange_thickness", 20.0)]);
        channel.add_contour_points(FaceTag::Front, web_outline());
        let composed = FaceComposer::default().compose(&channel).expect("compose");
        assert_eq!(
            composed.face(FaceTag::Front).expect("web face").contour,
            web_outline()
        );
    }

    #[test]
    fn clamp_needs_nonzero_dimensions() {
        let mut beam = part("I", &[("profile_height", 300.0), ("flange_thickness", 0.0)]);
        beam.add_contour_points(FaceTag::Front, web_outline());
        let composed = FaceComposer::default().compose(&beam).expect("compose");
        assert_eq!(composed.face(FaceTag::Front).expect("web").contour, web_outline());
    }

    #[test]
    fn clamping_an_empty_contour_yields_nothing() {
        assert!(clamp_web(&[], 12.0).is_empty());
    }

    #[test]
    fn features_are_bucketed_by_declared_face() {
        let mut beam = i_profile();
        beam.add_hole(Hole::new(50.0, 20.0, 13.0, "o"));
        beam.add_hole(Hole::new(80.0, 40.0, 17.5, "v"));
        beam.add_hole(Hole::new(10.0, 10.0, 9.0, "h"));
        beam.add_hole(Hole::new(10.0, 10.0, 9.0, "x"));
        beam.add_notch(Notch {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            notch_type: "t".to_string(),
            face: "u".to_string(),
        });

        let composed = FaceComposer::default().compose(&beam).expect("compose");
        let faces: Vec<FaceTag> = composed.available_faces().collect();
        assert_eq!(faces, vec![FaceTag::Top, FaceTag::Bottom, FaceTag::Front]);

        assert_eq!(composed.face(FaceTag::Top).expect("o").holes.len(), 1);
        assert_eq!(composed.face(FaceTag::Front).expect("v").holes.len(), 1);
        assert_eq!(composed.face(FaceTag::Bottom).expect("u").notches.len(), 1);
        assert!(composed.face(FaceTag::Back).is_none());
        assert_eq!(beam.holes_count(), 4);

        assert!(composed.has_features(FaceTag::Bottom));
        assert!(!composed.has_features(FaceTag::Back));
    }

    #[test]
    fn face_names_and_colors_follow_schema() {
        let beam = i_profile();
        let composed = FaceComposer::default().compose(&beam).expect("compose");
        let top = composed.face(FaceTag::Top).expect("o");
        assert_eq!(top.name, "Top Flange");
        assert_eq!(top.color, 1);
        assert_eq!(composed.face(FaceTag::Front).expect("v").color, 3);
    }

    #[test]
    fn offsets_stack_downwards_for_every_face() {
        let beam = i_profile();
        let composed = FaceComposer::new(250.0).compose(&beam).expect("compose");
        let offsets: Vec<(FaceTag, f64)> = composed
            .offsets()
            .map(|(tag, offset)| (tag, offset.y()))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (FaceTag::Top, 0.0),
                (FaceTag::Bottom, -250.0),
                (FaceTag::Front, -500.0),
                (FaceTag::Back, -750.0),
            ]
        );
        assert_eq!(composed.offset(FaceTag::Back).x(), 0.0);
    }

    #[test]
    fn face_height_and_bounds() {
        let beam = i_profile();
        let composed = FaceComposer::default().compose(&beam).expect("compose");
        assert_eq!(composed.face_height(FaceTag::Front), 260.0);
        assert_eq!(composed.face_height(FaceTag::Top), FALLBACK_FACE_HEIGHT);
        assert_eq!(composed.face_height(FaceTag::Back), FALLBACK_FACE_HEIGHT);

        let bounds = composed.face_bounds(FaceTag::Front).expect("bounds");
        assert_eq!(bounds.width(), 50.0);
        assert!(composed.face_bounds(FaceTag::Top).is_none());
    }

    #[test]
    fn contour_points_apply_offset_on_request() {
        let beam = i_profile();
        let composed = FaceComposer::new(100.0).compose(&beam).expect("compose");
        let plain = composed.contour_points(FaceTag::Front, false);
        let shifted = composed.contour_points(FaceTag::Front, true);
        assert_eq!(plain[0], ContourPoint::new(0.0, 20.0, 0.0));
        assert_eq!(shifted[0], ContourPoint::new(0.0, -180.0, 0.0));
        assert!(composed.contour_points(FaceTag::Back, true).is_empty());
    }

    #[test]
    fn export_shape_for_downstream_renderers() {
        let mut beam = i_profile();
        beam.add_hole(Hole::new(80.0, 40.0, 17.5, "v"));
        beam.add_slot(Slot {
            x: 250.0,
            y: 80.0,
            diameter: 22.0,
            raw_type_code: 0.0,
            cc_distance: 60.0,
            height: 0.0,
            angle: 0.0,
            length: 82.0,
            face: "v".to_string(),
        });

        let composed = FaceComposer::new(100.0).compose(&beam).expect("compose");
        let exported = composed.export(true);
        assert_eq!(exported.len(), 3);

        let web = &exported[&FaceTag::Front];
        assert_eq!(web.name, "Web");
        assert_eq!(web.offset, Vector2::new(0.0, -200.0));
        assert_eq!(web.contour[0], Point2::new(0.0, -180.0));
        assert_eq!(web.holes[0].center, Point2::new(80.0, -160.0));
        assert_eq!(web.slots[0].length, 82.0);

        let json = serde_json::to_value(&exported).expect("serialize export");
        assert_eq!(json["v"]["holes"][0]["type"], "normal");
        assert_eq!(json["v"]["slots"][0]["cc_distance"], 60.0);
        assert_eq!(json["v"]["contour"][0][1], -180.0);

        let unshifted = composed.export_face(FaceTag::Front, false).expect("web");
        assert_eq!(unshifted.offset, Vector2::zero());
        assert_eq!(unshifted.holes[0].center, Point2::new(80.0, 40.0));
        assert!(composed.export_face(FaceTag::Back, false).is_none());
    }

    #[test]
    fn unknown_profile_type_is_an_error() {
        let beam = part("Z", &[]);
        match FaceComposer::default().compose(&beam) {
            Err(EngineError::UnknownProfileType(code)) => assert_eq!(code, "Z"),
            other => panic!("期望 UnknownProfileType，实际 {other:?}"),
        }
    }

    #[test]
    fn composer_reads_gap_from_config() {
        let composer = FaceComposer::from_config(&ComposerConfig { face_gap: 42.0 });
        assert_eq!(composer.face_gap(), 42.0);
    }
}
