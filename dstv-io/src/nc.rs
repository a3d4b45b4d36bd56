use dstv_core::part::{ContourPoint, Hole, Slot};
use dstv_core::schema::{Dialect, FaceTag};
use tracing::trace;

use crate::header::{HeaderLayout, NC_LAYOUT};
use crate::machine::{self, DialectRules, Marker, number_at};
use crate::numeric::normalize;
use crate::{LineRejection, ParseFailure, ParsedPart, PartLoader};

const FACE_CODES: [char; 4] = ['o', 'u', 'v', 'h'];

/// `.nc` 方言解析器。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NcParser;

impl NcParser {
    pub fn new() -> Self {
        Self
    }
}

impl PartLoader for NcParser {
    fn dialect(&self) -> Dialect {
        Dialect::Nc
    }

    fn parse_str(&self, source: &str) -> Result<ParsedPart, ParseFailure> {
        machine::run(source, NcRules)
    }
}

struct NcRules;

impl DialectRules for NcRules {
    fn dialect(&self) -> Dialect {
        Dialect::Nc
    }

    fn header_layout(&self) -> &'static HeaderLayout {
        &NC_LAYOUT
    }

    fn marker(&self, code: &str) -> Option<Marker> {
        match code {
            "ST" => Some(Marker::Start),
            "BO" => Some(Marker::Holes),
            "AK" => Some(Marker::Contours),
            "IK" => Some(Marker::InnerContours),
            "SI" => Some(Marker::Markings),
            "EN" => Some(Marker::End),
            _ => None,
        }
    }

    fn accepts_body_line(&self, line: &str) -> bool {
        line.starts_with(FACE_CODES)
    }

    /// 形如 `face x y d ... <含 l 的字段> cc_distance height [angle]`。
    fn parse_slot(&self, fields: &[&str], line: &str) -> Option<Slot> {
        if !line.contains('l') {
            return None;
        }
        let face = fields.first()?;
        let x = number_at(fields, 1)?;
        let y = number_at(fields, 2)?;
        let diameter = number_at(fields, 3)?;

        // 只看第一个含 `l` 的字段，其后字段不全则整行不是长圆孔。
        let (index, marker) = fields
            .iter()
            .enumerate()
            .skip(4)
            .find(|(_, field)| field.contains('l'))?;
        let raw_type_code = normalize(marker).ok()?;
        let cc_distance = number_at(fields, index + 1)?;
        let height = number_at(fields, index + 2)?;
        let angle = match fields.get(index + 3) {
            Some(_) => number_at(fields, index + 3)?,
            None => 0.0,
        };
        trace!(index, "长圆孔标记字段");

        Some(Slot {
            x,
            y,
            diameter,
            raw_type_code,
            cc_distance,
            height,
            angle,
            length: diameter + cc_distance,
            face: face.to_string(),
        })
    }

    /// 恰好 5 个字段：`face x y d type`。
    fn parse_hole(&self, fields: &[&str]) -> Option<Hole> {
        if fields.len() != 5 {
            return None;
        }
        let x = number_at(fields, 1)?;
        let y = number_at(fields, 2)?;
        let diameter = number_at(fields, 3)?;
        let type_code = number_at(fields, 4)?;
        Some(Hole::new(x, y, diameter, fields[0]).with_type_code(type_code))
    }

    fn parse_contour(
        &mut self,
        fields: &[&str],
    ) -> Result<(FaceTag, ContourPoint), LineRejection> {
        if fields.len() < 4 {
            return Err(LineRejection::UnrecognizedRecord);
        }
        let face = FaceTag::from_code(fields[0]).ok_or(LineRejection::UnknownFace)?;
        let point = contour_point(fields, 1).ok_or(LineRejection::UnrecognizedRecord)?;
        Ok((face, point))
    }
}

/// 从 `start` 开始连续读取 `x y angle`。
pub(crate) fn contour_point(fields: &[&str], start: usize) -> Option<ContourPoint> {
    Some(ContourPoint::new(
        number_at(fields, start)?,
        number_at(fields, start + 1)?,
        number_at(fields, start + 2)?,
    ))
}
