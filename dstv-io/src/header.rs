use dstv_core::part::{Dimensions, Part, PartHeader};
use dstv_core::schema::{self, Dialect};
use thiserror::Error;
use tracing::debug;

use crate::ParseError;
use crate::numeric::{NumericFormatError, normalize};

#[derive(Debug, Error)]
pub enum HeaderFieldError {
    #[error("header line {index} for `{field}` is missing")]
    MissingLine { field: &'static str, index: usize },
    #[error("header field `{field}` (line {index}) is not numeric: {source}")]
    NotNumeric {
        field: &'static str,
        index: usize,
        #[source]
        source: NumericFormatError,
    },
    #[error("header field `{field}` (line {index}) is not an integer: \"{value}\"")]
    NotInteger {
        field: &'static str,
        index: usize,
        value: String,
    },
}

/// 头部块中各身份字段所在的行号（从 0 开始）。
#[derive(Debug)]
pub(crate) struct HeaderLayout {
    pub order_id: usize,
    pub piece_id: usize,
    pub quantity: usize,
    pub material: usize,
    pub profile_code: usize,
    pub profile_type: usize,
    pub length: usize,
}

pub(crate) const NC_LAYOUT: HeaderLayout = HeaderLayout {
    order_id: 0,
    piece_id: 3,
    quantity: 5,
    material: 4,
    profile_code: 6,
    profile_type: 7,
    length: 8,
};

pub(crate) const NC1_LAYOUT: HeaderLayout = HeaderLayout {
    order_id: 1,
    piece_id: 2,
    quantity: 3,
    material: 5,
    profile_code: 7,
    profile_type: 8,
    length: 9,
};

/// 由缓存的头部行构建构件。先确定截面类型与尺寸，再读取其余字段。
pub(crate) fn build_part(
    lines: &[String],
    layout: &HeaderLayout,
    dialect: Dialect,
) -> Result<Part, ParseError> {
    let profile_type = text_field(lines, layout.profile_type, "profile_type")?;
    let schema = schema::lookup(profile_type).ok_or_else(|| ParseError::UnknownProfileType {
        profile_type: profile_type.to_string(),
    })?;

    let mut dimensions = Dimensions::new();
    for (field, index) in schema.columns(dialect) {
        dimensions.insert(field.to_string(), numeric_field(lines, index, field)?);
    }

    let header = PartHeader {
        order_id: text_field(lines, layout.order_id, "order_id")?.to_string(),
        piece_id: text_field(lines, layout.piece_id, "piece_id")?.to_string(),
        material: text_field(lines, layout.material, "material")?.to_string(),
        quantity: integer_field(lines, layout.quantity, "quantity")?,
        profile_type: profile_type.to_string(),
        profile_code: text_field(lines, layout.profile_code, "profile_code")?.to_string(),
        length: numeric_field(lines, layout.length, "length")?,
    };
    debug!(
        dialect = %dialect,
        profile_type = %header.profile_type,
        profile_code = %header.profile_code,
        ?dimensions,
        "头部解析完成"
    );
    Ok(Part::new(header, dimensions))
}

fn text_field<'a>(
    lines: &'a [String],
    index: usize,
    field: &'static str,
) -> Result<&'a str, HeaderFieldError> {
    lines
        .get(index)
        .map(String::as_str)
        .ok_or(HeaderFieldError::MissingLine { field, index })
}

/// 形如 `1000,0` 的值只取逗号前的整数部分，再去掉末尾字母注记。
fn numeric_field(
    lines: &[String],
    index: usize,
    field: &'static str,
) -> Result<f64, HeaderFieldError> {
    let raw = text_field(lines, index, field)?;
    let integral = raw.split(',').next().unwrap_or(raw).trim();
    normalize(integral).map_err(|source| HeaderFieldError::NotNumeric {
        field,
        index,
        source,
    })
}

fn integer_field(
    lines: &[String],
    index: usize,
    field: &'static str,
) -> Result<u32, HeaderFieldError> {
    let raw = text_field(lines, index, field)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| HeaderFieldError::NotInteger {
            field,
            index,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    fn nc_i_header() -> Vec<String> {
        lines(&[
            "ORD-17", "DRW-3", "1", "B12", "S355JR", "4", "HEA300", "I", "1250,00", "300,00",
            "150,00", "12,00", "8,00",
        ])
    }

    #[test]
    fn builds_nc_i_profile() {
        let part = build_part(&nc_i_header(), &NC_LAYOUT, Dialect::Nc).expect("header");
        let header = part.header();
        assert_eq!(header.order_id, "ORD-17");
        assert_eq!(header.piece_id, "B12");
        assert_eq!(header.material, "S355JR");
        assert_eq!(header.quantity, 4);
        assert_eq!(header.profile_code, "HEA300");
        assert_eq!(header.length, 1250.0);
        assert_eq!(part.dimension("profile_height"), Some(300.0));
        assert_eq!(part.dimension("web_thickness"), Some(8.0));
        assert_eq!(part.dimensions().len(), 4);
    }

    #[test]
    fn unknown_profile_type_aborts() {
        let mut header = nc_i_header();
        header[7] = "Z".to_string();
        match build_part(&header, &NC_LAYOUT, Dialect::Nc) {
            Err(ParseError::UnknownProfileType { profile_type }) => assert_eq!(profile_type, "Z"),
            other => panic!("期望 UnknownProfileType，实际 {other:?}"),
        }
    }

    #[test]
    fn non_numeric_dimension_aborts() {
        let mut header = nc_i_header();
        header[11] = "twelve".to_string();
        match build_part(&header, &NC_LAYOUT, Dialect::Nc) {
            Err(ParseError::HeaderField(HeaderFieldError::NotNumeric { field, index, .. })) => {
                assert_eq!(field, "flange_thickness");
                assert_eq!(index, 11);
            }
            other => panic!("期望 NotNumeric，实际 {other:?}"),
        }
    }

    #[test]
    fn short_header_aborts() {
        let header = lines(&["ORD-17", "DRW-3", "1", "B12", "S355JR", "4", "HEA300", "I"]);
        match build_part(&header, &NC_LAYOUT, Dialect::Nc) {
            Err(ParseError::HeaderField(HeaderFieldError::MissingLine { field, index })) => {
                assert_eq!(field, "profile_height");
                assert_eq!(index, 9);
            }
            other => panic!("期望 MissingLine，实际 {other:?}"),
        }
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        let mut header = nc_i_header();
        header[5] = "2.5".to_string();
        assert!(matches!(
            build_part(&header, &NC_LAYOUT, Dialect::Nc),
            Err(ParseError::HeaderField(HeaderFieldError::NotInteger { .. }))
        ));
    }

    #[test]
    fn plate_in_nc1_has_no_dimensions() {
        let header = lines(&[
            "DRW-1", "ORD-9", "P-77", "3", "x", "S235", "y", "PL10", "B", "640,00",
        ]);
        let part = build_part(&header, &NC1_LAYOUT, Dialect::Nc1).expect("plate header");
        assert!(part.dimensions().is_empty());
        assert_eq!(part.header().order_id, "ORD-9");
        assert_eq!(part.header().material, "S235");
        assert_eq!(part.length(), 640.0);
    }
}
