use dstv_core::part::{ContourPoint, Hole, Slot};
use dstv_core::schema::{Dialect, FaceTag};
use tracing::trace;

use crate::header::{HeaderLayout, NC1_LAYOUT};
use crate::machine::{self, DialectRules, Marker, number_at};
use crate::nc::contour_point;
use crate::{LineRejection, ParseFailure, ParsedPart, PartLoader};

/// `.nc1` 方言解析器。
///
/// 该方言的长圆孔记录尚不支持：`BO` 段中只识别 4 字段的孔记录。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nc1Parser;

impl Nc1Parser {
    pub fn new() -> Self {
        Self
    }
}

impl PartLoader for Nc1Parser {
    fn dialect(&self) -> Dialect {
        Dialect::Nc1
    }

    fn parse_str(&self, source: &str) -> Result<ParsedPart, ParseFailure> {
        machine::run(source, Nc1Rules::default())
    }
}

/// 轮廓行可以省略面标记，沿用上一个出现的面。
#[derive(Debug, Default)]
struct Nc1Rules {
    current_face: Option<FaceTag>,
}

impl DialectRules for Nc1Rules {
    fn dialect(&self) -> Dialect {
        Dialect::Nc1
    }

    fn header_layout(&self) -> &'static HeaderLayout {
        &NC1_LAYOUT
    }

    fn marker(&self, code: &str) -> Option<Marker> {
        match code {
            "ST" => Some(Marker::Start),
            "BO" => Some(Marker::Holes),
            "AK" => Some(Marker::Contours),
            "SI" => Some(Marker::Markings),
            "EN" => Some(Marker::End),
            _ => None,
        }
    }

    fn accepts_body_line(&self, _line: &str) -> bool {
        true
    }

    fn parse_slot(&self, _fields: &[&str], _line: &str) -> Option<Slot> {
        trace!("NC1 长圆孔记录尚未支持");
        None
    }

    /// 恰好 4 个字段：`face x y d`。
    fn parse_hole(&self, fields: &[&str]) -> Option<Hole> {
        if fields.len() != 4 {
            return None;
        }
        let x = number_at(fields, 1)?;
        let y = number_at(fields, 2)?;
        let diameter = number_at(fields, 3)?;
        Some(Hole::new(x, y, diameter, fields[0]))
    }

    fn parse_contour(
        &mut self,
        fields: &[&str],
    ) -> Result<(FaceTag, ContourPoint), LineRejection> {
        // 续行同样至少 4 个字段，第四列不读取。
        if fields.len() < 4 {
            return Err(LineRejection::UnrecognizedRecord);
        }
        if let Some(face) = FaceTag::from_code(fields[0]) {
            self.current_face = Some(face);
            let point = contour_point(fields, 1).ok_or(LineRejection::UnrecognizedRecord)?;
            return Ok((face, point));
        }

        let face = self.current_face.ok_or(LineRejection::NoCurrentFace)?;
        let point = contour_point(fields, 0).ok_or(LineRejection::UnrecognizedRecord)?;
        Ok((face, point))
    }
}
