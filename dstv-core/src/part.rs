//! 单个钢构件的内存模型：头部信息、尺寸、四个面的轮廓以及孔、长圆孔、缺口。

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::schema::FaceTag;

/// 斜切检测的默认容差（mm）。
pub const DEFAULT_SKEW_TOLERANCE: f64 = 0.1;

/// 普通矩形面轮廓的顶点数（首尾重合的闭合路径）。
const PLAIN_CONTOUR_POINTS: usize = 5;

/// 轮廓点，`angle` 为文件中记录的第三列（倒角/圆角参数），原样保存。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

impl ContourPoint {
    #[inline]
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }

    #[inline]
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl From<(f64, f64, f64)> for ContourPoint {
    fn from((x, y, angle): (f64, f64, f64)) -> Self {
        Self::new(x, y, angle)
    }
}

/// 尺寸字段名到数值的映射，键集合由截面表决定。
pub type Dimensions = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartHeader {
    pub order_id: String,
    pub piece_id: String,
    pub material: String,
    pub quantity: u32,
    pub profile_type: String,
    pub profile_code: String,
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleKind {
    #[default]
    Normal,
    Threaded,
    Countersunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
    /// 记录中的第五列原始数值；NC1 孔记录没有该列。
    pub raw_type_code: Option<f64>,
    pub face: String,
    pub hole_type: HoleKind,
    pub depth: f64,
}

impl Hole {
    pub fn new(x: f64, y: f64, diameter: f64, face: impl Into<String>) -> Self {
        Self {
            x,
            y,
            diameter,
            raw_type_code: None,
            face: face.into(),
            hole_type: HoleKind::Normal,
            depth: 0.0,
        }
    }

    pub fn with_type_code(mut self, code: f64) -> Self {
        self.raw_type_code = Some(code);
        self
    }

    #[inline]
    pub fn center(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn face_tag(&self) -> Option<FaceTag> {
        FaceTag::from_code(&self.face)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
    pub raw_type_code: f64,
    pub cc_distance: f64,
    pub height: f64,
    pub angle: f64,
    /// 总长 = 直径 + 圆心距。
    pub length: f64,
    pub face: String,
}

/// 长圆孔（跑道形）的绘制几何：两个半圆圆心与四个切点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotOutline {
    pub centers: [Point2; 2],
    pub radius: f64,
    /// 依次为上切线起止点、下切线起止点。
    pub tangents: [Point2; 4],
}

impl Slot {
    #[inline]
    pub fn center(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn face_tag(&self) -> Option<FaceTag> {
        FaceTag::from_code(&self.face)
    }

    /// 以 `angle`（度）为长轴方向，两个半圆圆心相距 `cc_distance`。
    pub fn outline(&self) -> SlotOutline {
        let radius = self.diameter / 2.0;
        let axis = DVec2::from_angle(self.angle.to_radians());
        let half = axis * (self.cc_distance / 2.0);
        let normal = axis.perp() * radius;
        let center = self.center().as_vec2();
        let first = center - half;
        let second = center + half;
        SlotOutline {
            centers: [Point2(first), Point2(second)],
            radius,
            tangents: [
                Point2(first + normal),
                Point2(second + normal),
                Point2(second - normal),
                Point2(first - normal),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notch {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// `t` 切线型、`w` 圆孔型，其余原样保留。
    pub notch_type: String,
    pub face: String,
}

/// 单个轮廓的斜切检测结果。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inclination {
    pub inclined: bool,
    pub delta_left: f64,
    pub delta_right: f64,
}

impl Inclination {
    pub const NONE: Inclination = Inclination {
        inclined: false,
        delta_left: 0.0,
        delta_right: 0.0,
    };

    /// 两个面的偏差比较固定使用 [`DEFAULT_SKEW_TOLERANCE`]，与检测容差无关。
    fn deltas_match(&self, other: &Inclination) -> bool {
        (self.delta_left - other.delta_left).abs() < DEFAULT_SKEW_TOLERANCE
            && (self.delta_right - other.delta_right).abs() < DEFAULT_SKEW_TOLERANCE
    }
}

/// 比较轮廓最低层与最高层点的 X 值判断端部是否斜切。
///
/// 仅对恰好 5 个点的轮廓给出结论，其余点数视为无倾斜数据。
pub fn check_inclination(contour: &[ContourPoint], tolerance: f64) -> Inclination {
    if contour.len() != PLAIN_CONTOUR_POINTS {
        return Inclination::NONE;
    }

    let min_y = contour.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = contour.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let level_extent = |level: f64| {
        contour
            .iter()
            .filter(|p| (p.y - level).abs() <= tolerance)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            })
    };
    let (bottom_min_x, bottom_max_x) = level_extent(min_y);
    let (top_min_x, top_max_x) = level_extent(max_y);

    let delta_left = (bottom_min_x - top_min_x).abs();
    let delta_right = (bottom_max_x - top_max_x).abs();

    Inclination {
        inclined: delta_left > tolerance || delta_right > tolerance,
        delta_left,
        delta_right,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeaturesSummary {
    pub holes: usize,
    pub slots: usize,
    pub o_contour_points: usize,
    pub u_contour_points: usize,
    pub v_contour_points: usize,
    pub h_contour_points: usize,
}

/// 一个解析完成的构件。只由解析器在构造后追加数据，之后只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    header: PartHeader,
    dimensions: Dimensions,
    o_contour: Vec<ContourPoint>,
    u_contour: Vec<ContourPoint>,
    v_contour: Vec<ContourPoint>,
    h_contour: Vec<ContourPoint>,
    holes: Vec<Hole>,
    slots: Vec<Slot>,
    notches: Vec<Notch>,
}

impl Part {
    pub fn new(header: PartHeader, dimensions: Dimensions) -> Self {
        Self {
            header,
            dimensions,
            o_contour: Vec::new(),
            u_contour: Vec::new(),
            v_contour: Vec::new(),
            h_contour: Vec::new(),
            holes: Vec::new(),
            slots: Vec::new(),
            notches: Vec::new(),
        }
    }

    #[inline]
    pub fn header(&self) -> &PartHeader {
        &self.header
    }

    #[inline]
    pub fn profile_type(&self) -> &str {
        &self.header.profile_type
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.header.length
    }

    #[inline]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    #[inline]
    pub fn dimension(&self, name: &str) -> Option<f64> {
        self.dimensions.get(name).copied()
    }

    pub fn contour(&self, face: FaceTag) -> &[ContourPoint] {
        match face {
            FaceTag::Top => &self.o_contour,
            FaceTag::Bottom => &self.u_contour,
            FaceTag::Front => &self.v_contour,
            FaceTag::Back => &self.h_contour,
        }
    }

    fn contour_mut(&mut self, face: FaceTag) -> &mut Vec<ContourPoint> {
        match face {
            FaceTag::Top => &mut self.o_contour,
            FaceTag::Bottom => &mut self.u_contour,
            FaceTag::Front => &mut self.v_contour,
            FaceTag::Back => &mut self.h_contour,
        }
    }

    #[inline]
    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub fn notches(&self) -> &[Notch] {
        &self.notches
    }

    pub fn add_hole(&mut self, hole: Hole) {
        self.holes.push(hole);
    }

    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn add_notch(&mut self, notch: Notch) {
        self.notches.push(notch);
    }

    /// 追加轮廓点，保持插入顺序。
    pub fn add_contour_points(
        &mut self,
        face: FaceTag,
        points: impl IntoIterator<Item = ContourPoint>,
    ) {
        self.contour_mut(face).extend(points);
    }

    #[inline]
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    #[inline]
    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }

    #[inline]
    pub fn has_notches(&self) -> bool {
        !self.notches.is_empty()
    }

    /// 任一轮廓点数超过 5，说明边缘经过切割或开缺口。
    pub fn has_worked_areas(&self) -> bool {
        FaceTag::STACKING_ORDER
            .iter()
            .any(|face| self.contour(*face).len() > PLAIN_CONTOUR_POINTS)
    }

    #[inline]
    pub fn has_contour(&self, face: FaceTag) -> bool {
        !self.contour(face).is_empty()
    }

    #[inline]
    pub fn holes_count(&self) -> usize {
        self.holes.len()
    }

    #[inline]
    pub fn slots_count(&self) -> usize {
        self.slots.len()
    }

    pub fn holes_by_face(&self) -> BTreeMap<&str, Vec<&Hole>> {
        group_by_face(&self.holes, |hole| &hole.face)
    }

    pub fn slots_by_face(&self) -> BTreeMap<&str, Vec<&Slot>> {
        group_by_face(&self.slots, |slot| &slot.face)
    }

    pub fn holes_coordinates_by_face(&self) -> BTreeMap<&str, Vec<(f64, f64)>> {
        self.holes_by_face()
            .into_iter()
            .map(|(face, holes)| (face, holes.iter().map(|h| (h.x, h.y)).collect()))
            .collect()
    }

    /// 精确相等比较，不带容差。
    #[allow(clippy::float_cmp)]
    pub fn holes_by_diameter(&self, diameter: f64) -> Vec<&Hole> {
        self.holes
            .iter()
            .filter(|hole| hole.diameter == diameter)
            .collect()
    }

    /// 精确相等比较，不带容差。
    #[allow(clippy::float_cmp)]
    pub fn slots_by_length(&self, length: f64) -> Vec<&Slot> {
        self.slots
            .iter()
            .filter(|slot| slot.length == length)
            .collect()
    }

    /// 按缺口类型分组，`t` 与 `w` 两组总是存在。
    pub fn notches_by_type(&self) -> BTreeMap<&'static str, Vec<&Notch>> {
        ["t", "w"]
            .into_iter()
            .map(|kind| {
                let notches = self
                    .notches
                    .iter()
                    .filter(|notch| notch.notch_type == kind)
                    .collect();
                (kind, notches)
            })
            .collect()
    }

    pub fn features_summary(&self) -> FeaturesSummary {
        FeaturesSummary {
            holes: self.holes_count(),
            slots: self.slots_count(),
            o_contour_points: self.o_contour.len(),
            u_contour_points: self.u_contour.len(),
            v_contour_points: self.v_contour.len(),
            h_contour_points: self.h_contour.len(),
        }
    }

    pub fn flange_skew_cut(&self) -> bool {
        self.flange_skew_cut_within(DEFAULT_SKEW_TOLERANCE)
    }

    /// 上下翼缘都斜切且两侧偏差一致时成立。
    pub fn flange_skew_cut_within(&self, tolerance: f64) -> bool {
        if self.o_contour.len() < PLAIN_CONTOUR_POINTS
            || self.u_contour.len() < PLAIN_CONTOUR_POINTS
        {
            return false;
        }
        let top = check_inclination(&self.o_contour, tolerance);
        let bottom = check_inclination(&self.u_contour, tolerance);
        top.inclined && bottom.inclined && top.deltas_match(&bottom)
    }

    pub fn web_skew_cut(&self) -> bool {
        self.web_skew_cut_within(DEFAULT_SKEW_TOLERANCE)
    }

    /// 两个腹板面都有轮廓时需同时斜切且偏差一致；只有一个面时取其结论。
    pub fn web_skew_cut_within(&self, tolerance: f64) -> bool {
        let back = (self.h_contour.len() >= PLAIN_CONTOUR_POINTS)
            .then(|| check_inclination(&self.h_contour, tolerance));
        let front = (self.v_contour.len() >= PLAIN_CONTOUR_POINTS)
            .then(|| check_inclination(&self.v_contour, tolerance));

        match (back, front) {
            (Some(back), Some(front)) => {
                back.inclined && front.inclined && back.deltas_match(&front)
            }
            (Some(only), None) | (None, Some(only)) => only.inclined,
            (None, None) => false,
        }
    }
}

fn group_by_face<'a, T>(
    items: &'a [T],
    face_of: impl Fn(&'a T) -> &'a String,
) -> BTreeMap<&'a str, Vec<&'a T>> {
    let mut grouped: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for item in items {
        grouped.entry(face_of(item).as_str()).or_default().push(item);
    }
    grouped
}
