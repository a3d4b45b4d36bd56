pub mod part;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 平面点（面展开坐标，单位 mm），内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 平面位移，用于面布局偏移。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn zero() -> Self {
            Self(DVec2::ZERO)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于估算面轮廓范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 由点集构造；点集为空时返回 `None`。
        pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Option<Self> {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point2(self.min.as_vec2().min(point.as_vec2()));
            self.max = Point2(self.max.as_vec2().max(point.as_vec2()));
        }
    }

}

/// 型材截面类型到尺寸字段、头部列号与可绘制面的静态映射。
pub mod schema {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 两种兄弟方言：`.nc` 与 `.nc1`，头部列号互不兼容。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Dialect {
        #[serde(rename = "NC")]
        Nc,
        #[serde(rename = "NC1")]
        Nc1,
    }

    impl Dialect {
        pub fn as_str(self) -> &'static str {
            match self {
                Dialect::Nc => "NC",
                Dialect::Nc1 => "NC1",
            }
        }
    }

    impl fmt::Display for Dialect {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// 型材的四个展开面。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum FaceTag {
        /// 上翼缘 `o`
        #[serde(rename = "o")]
        Top,
        /// 下翼缘 `u`
        #[serde(rename = "u")]
        Bottom,
        /// 前腹板 `v`
        #[serde(rename = "v")]
        Front,
        /// 后腹板 `h`
        #[serde(rename = "h")]
        Back,
    }

    impl FaceTag {
        /// 自上而下的固定堆叠顺序，同时也是布局偏移的计算顺序。
        pub const STACKING_ORDER: [FaceTag; 4] =
            [FaceTag::Top, FaceTag::Bottom, FaceTag::Front, FaceTag::Back];

        pub fn code(self) -> char {
            match self {
                FaceTag::Top => 'o',
                FaceTag::Bottom => 'u',
                FaceTag::Front => 'v',
                FaceTag::Back => 'h',
            }
        }

        pub fn from_code(code: &str) -> Option<Self> {
            match code {
                "o" => Some(FaceTag::Top),
                "u" => Some(FaceTag::Bottom),
                "v" => Some(FaceTag::Front),
                "h" => Some(FaceTag::Back),
                _ => None,
            }
        }

        /// AutoCAD 颜色索引（1 红、5 蓝、3 绿、6 青）。
        pub fn color_index(self) -> u8 {
            match self {
                FaceTag::Top => 1,
                FaceTag::Bottom => 5,
                FaceTag::Front => 3,
                FaceTag::Back => 6,
            }
        }
    }

    impl fmt::Display for FaceTag {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.code())
        }
    }

    #[derive(Debug, PartialEq)]
    pub struct ProfileSchema {
        profile_type: &'static str,
        fields: &'static [&'static str],
        nc_indices: &'static [usize],
        nc1_indices: &'static [usize],
        faces: &'static [(FaceTag, &'static str)],
    }

    impl ProfileSchema {
        #[inline]
        pub fn profile_type(&self) -> &'static str {
            self.profile_type
        }

        /// 尺寸字段名，顺序与头部列号一一对应。
        #[inline]
        pub fn fields(&self) -> &'static [&'static str] {
            self.fields
        }

        /// 指定方言下各尺寸字段在头部块中的行号（从 0 开始），可能为空。
        pub fn indices(&self, dialect: Dialect) -> &'static [usize] {
            match dialect {
                Dialect::Nc => self.nc_indices,
                Dialect::Nc1 => self.nc1_indices,
            }
        }

        /// 字段名与列号配对；列号缺失的字段不参与。
        pub fn columns(&self, dialect: Dialect) -> impl Iterator<Item = (&'static str, usize)> {
            self.fields
                .iter()
                .copied()
                .zip(self.indices(dialect).iter().copied())
        }

        #[inline]
        pub fn faces(&self) -> &'static [(FaceTag, &'static str)] {
            self.faces
        }

        pub fn face_name(&self, tag: FaceTag) -> Option<&'static str> {
            self.faces
                .iter()
                .find(|(face, _)| *face == tag)
                .map(|(_, name)| *name)
        }

        #[inline]
        pub fn has_face(&self, tag: FaceTag) -> bool {
            self.face_name(tag).is_some()
        }
    }

    const FLANGED_FACES: &[(FaceTag, &str)] = &[
        (FaceTag::Top, "Top Flange"),
        (FaceTag::Bottom, "Bottom Flange"),
        (FaceTag::Front, "Web"),
    ];

    static SCHEMAS: [ProfileSchema; 9] = [
        // I 型钢
        ProfileSchema {
            profile_type: "I",
            fields: &[
                "profile_height",
                "flange_width",
                "flange_thickness",
                "web_thickness",
            ],
            nc_indices: &[9, 10, 11, 12],
            nc1_indices: &[10, 11, 12, 13],
            faces: FLANGED_FACES,
        },
        // 槽钢
        ProfileSchema {
            profile_type: "U",
            fields: &["profile_height", "flange_width", "thickness"],
            nc_indices: &[9, 10, 11],
            nc1_indices: &[10, 11, 12],
            faces: FLANGED_FACES,
        },
        // 角钢
        ProfileSchema {
            profile_type: "L",
            fields: &["width", "height", "thickness"],
            nc_indices: &[9, 10, 11],
            nc1_indices: &[10, 11, 12],
            faces: &[(FaceTag::Bottom, "Side #1"), (FaceTag::Front, "Front Side #2")],
        },
        // 板材
        ProfileSchema {
            profile_type: "B",
            fields: &["length", "width", "thickness"],
            nc_indices: &[8, 9, 12],
            nc1_indices: &[],
            faces: &[(FaceTag::Front, "Plate")],
        },
        // 圆钢
        ProfileSchema {
            profile_type: "RU",
            fields: &[],
            nc_indices: &[],
            nc1_indices: &[],
            faces: &[],
        },
        // 圆管
        ProfileSchema {
            profile_type: "RO",
            fields: &["radius", "thickness"],
            nc_indices: &[9, 10],
            nc1_indices: &[],
            faces: &[],
        },
        // 矩形管
        ProfileSchema {
            profile_type: "M",
            fields: &["side_1_size", "side_2_size", "thickness"],
            nc_indices: &[9, 10, 11],
            nc1_indices: &[],
            faces: &[
                (FaceTag::Top, "Top Side #1"),
                (FaceTag::Bottom, "Bottom Side #1"),
                (FaceTag::Front, "Front Side #2"),
                (FaceTag::Back, "Behind Side #2"),
            ],
        },
        // C 型钢
        ProfileSchema {
            profile_type: "C",
            fields: &["flange_width", "web_height", "thickness"],
            nc_indices: &[9, 10, 11],
            nc1_indices: &[],
            faces: FLANGED_FACES,
        },
        // T 型钢
        ProfileSchema {
            profile_type: "T",
            fields: &[
                "flange_width",
                "web_height",
                "flange_thickness",
                "web_thickness",
            ],
            nc_indices: &[9, 10, 11, 12],
            nc1_indices: &[],
            faces: &[(FaceTag::Top, "Front Web"), (FaceTag::Back, "Top Flange")],
        },
    ];

    /// 按截面类型代码查表，未知代码返回 `None`。
    pub fn lookup(profile_type: &str) -> Option<&'static ProfileSchema> {
        SCHEMAS
            .iter()
            .find(|schema| schema.profile_type == profile_type)
    }

    pub fn profile_types() -> impl Iterator<Item = &'static str> {
        SCHEMAS.iter().map(|schema| schema.profile_type)
    }

}
