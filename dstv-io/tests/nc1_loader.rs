use std::path::PathBuf;

use dstv_core::part::{ContourPoint, HoleKind};
use dstv_core::schema::{Dialect, FaceTag};
use dstv_io::{LineRejection, Nc1Parser, ParseError, PartLoader, Section, load_part};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

#[test]
fn load_nc1_header_and_dimensions() {
    let parsed = load_part(fixture("2501.nc1")).expect("读取 NC1 文件失败");
    assert_eq!(parsed.dialect, Dialect::Nc1);

    let header = parsed.part.header();
    assert_eq!(header.order_id, "ORD-88");
    assert_eq!(header.piece_id, "P-2501");
    assert_eq!(header.quantity, 2);
    assert_eq!(header.material, "S275JR");
    assert_eq!(header.profile_code, "IPE200");
    assert_eq!(header.profile_type, "I");
    assert_eq!(header.length, 3000.0);

    let part = &parsed.part;
    assert_eq!(part.dimension("profile_height"), Some(200.0));
    assert_eq!(part.dimension("flange_width"), Some(100.0));
    assert_eq!(part.dimension("flange_thickness"), Some(8.5));
    assert_eq!(part.dimension("web_thickness"), Some(5.6));
}

#[test]
fn load_nc1_holes_without_type_code() {
    let parsed = load_part(fixture("2501.nc1")).expect("读取 NC1 文件失败");
    let part = &parsed.part;
    assert_eq!(part.holes_count(), 2);
    assert!(!part.has_slots());
    for hole in part.holes() {
        assert_eq!(hole.face, "v");
        assert_eq!(hole.raw_type_code, None);
        assert_eq!(hole.hole_type, HoleKind::Normal);
    }
    assert_eq!(
        part.holes_coordinates_by_face()["v"],
        vec![(150.0, 60.0), (150.0, 140.0)]
    );
}

#[test]
fn load_nc1_skips_slot_records() {
    let parsed = load_part(fixture("2501.nc1")).expect("读取 NC1 文件失败");
    assert_eq!(parsed.skipped.len(), 1);
    let skipped = &parsed.skipped[0];
    assert_eq!(skipped.line_number, 19);
    assert_eq!(skipped.section, Section::Holes);
    assert_eq!(skipped.reason, LineRejection::UnrecognizedRecord);
}

#[test]
fn load_nc1_continuation_contours() {
    let parsed = load_part(fixture("2501.nc1")).expect("读取 NC1 文件失败");
    let part = &parsed.part;

    let web = part.contour(FaceTag::Front);
    assert_eq!(web.len(), 5);
    assert_eq!(web[0], ContourPoint::new(0.0, 0.0, 0.0));
    assert_eq!(web[2], ContourPoint::new(3000.0, 200.0, 0.0));

    let flange = part.contour(FaceTag::Top);
    assert_eq!(flange.len(), 5);
    assert_eq!(flange[2], ContourPoint::new(3000.0, 100.0, 0.0));

    assert!(!part.has_contour(FaceTag::Bottom));
    assert!(!part.web_skew_cut());
}

#[test]
fn continuation_before_face_is_skipped() {
    let source = "\
ST
DRW
ORD
P1
1
x
S235
y
PL10
B
500,00
AK
10.00 0.00 0.00 0.00
u 0.00 0.00 0.00
10.00 0.00 0.00 0.00
20.00 0.00 0.00
EN
";
    let parsed = Nc1Parser::new().parse_str(source).expect("解析失败");
    assert_eq!(parsed.skipped.len(), 2);
    assert_eq!(parsed.skipped[0].reason, LineRejection::NoCurrentFace);
    assert_eq!(parsed.skipped[0].line_number, 13);
    assert_eq!(parsed.skipped[1].reason, LineRejection::UnrecognizedRecord);
    assert_eq!(parsed.skipped[1].line_number, 16);
    assert_eq!(parsed.part.contour(FaceTag::Bottom).len(), 2);
    assert!(parsed.part.dimensions().is_empty());
}

#[test]
fn nc1_treats_ik_as_data_line() {
    let source = "\
ST
DRW
ORD
P1
1
x
S235
y
PL10
B
500,00
BO
IK
EN
";
    let parsed = Nc1Parser::new().parse_str(source).expect("解析失败");
    assert_eq!(parsed.skipped.len(), 1);
    assert_eq!(parsed.skipped[0].line_number, 13);
    assert_eq!(parsed.skipped[0].reason, LineRejection::UnrecognizedRecord);
    assert_eq!(parsed.skipped[0].section, Section::Holes);
}

#[test]
fn nc1_header_too_short() {
    let failure = Nc1Parser::new()
        .parse_str("ST\nDRW\nORD\nBO\nEN\n")
        .expect_err("头部不完整");
    assert!(matches!(failure.error, ParseError::HeaderField(_)));
    assert!(failure.partial.is_none());
}
