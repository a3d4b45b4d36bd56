use std::fs;
use std::path::{Path, PathBuf};

use dstv_core::part::Part;
use dstv_core::schema::Dialect;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

mod header;
mod machine;
mod nc;
mod nc1;
pub mod numeric;

pub use header::HeaderFieldError;
pub use nc::NcParser;
pub use nc1::Nc1Parser;
pub use numeric::{NumericFormatError, normalize};

/// 终止整个解析的错误（头部阶段或文件层面）。
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file format: {path:?}")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown profile type \"{profile_type}\"")]
    UnknownProfileType { profile_type: String },
    #[error(transparent)]
    HeaderField(#[from] HeaderFieldError),
    #[error("input ended before any header block was completed")]
    MissingHeader,
}

/// 解析器当前所处的段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// 第一个 `ST` 之前。
    Preamble,
    Header,
    /// `BO`：孔与长圆孔。
    Holes,
    /// `AK`：外轮廓。
    Contours,
    /// `IK`：内轮廓（仅 NC，忽略）。
    InnerContours,
    /// `SI`：标记文字（忽略）。
    Markings,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRejection {
    #[error("no part has been built yet")]
    NoPart,
    #[error("line is outside any data section")]
    OutsideSection,
    #[error("line does not start with a face tag")]
    NotAFaceRecord,
    #[error("unknown face tag")]
    UnknownFace,
    #[error("continuation line before any face tag")]
    NoCurrentFace,
    #[error("line matches no known record shape")]
    UnrecognizedRecord,
}

/// 被跳过的数据行。不会中断解析，只作为诊断信息返回。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("line {line_number} in {section:?} skipped ({reason}): {content}")]
pub struct MalformedLine {
    pub line_number: usize,
    pub section: Section,
    pub content: String,
    pub reason: LineRejection,
}

/// 成功解析的结果，附带所有被跳过行的诊断。
#[derive(Debug, Clone)]
pub struct ParsedPart {
    pub part: Part,
    pub dialect: Dialect,
    pub skipped: Vec<MalformedLine>,
}

/// 终止性失败。若失败前已经构建过构件，则通过 `partial` 返回。
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ParseFailure {
    #[source]
    pub error: ParseError,
    pub partial: Option<Box<Part>>,
    pub skipped: Vec<MalformedLine>,
}

impl From<ParseError> for ParseFailure {
    fn from(error: ParseError) -> Self {
        Self {
            error,
            partial: None,
            skipped: Vec::new(),
        }
    }
}

pub trait PartLoader {
    fn dialect(&self) -> Dialect;

    fn parse_str(&self, source: &str) -> Result<ParsedPart, ParseFailure>;

    fn load(&self, path: &Path) -> Result<ParsedPart, ParseFailure> {
        let bytes = fs::read(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), dialect = %self.dialect(), "开始解析 DSTV 文件");
        self.parse_str(&String::from_utf8_lossy(&bytes))
    }
}

/// 按方言分派的解析器，由文件扩展名一次性选定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstvParser {
    Nc(NcParser),
    Nc1(Nc1Parser),
}

impl DstvParser {
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Nc => DstvParser::Nc(NcParser::new()),
            Dialect::Nc1 => DstvParser::Nc1(Nc1Parser::new()),
        }
    }

    pub fn for_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        dialect_for_path(path.as_ref()).map(Self::for_dialect)
    }
}

impl PartLoader for DstvParser {
    fn dialect(&self) -> Dialect {
        match self {
            DstvParser::Nc(parser) => parser.dialect(),
            DstvParser::Nc1(parser) => parser.dialect(),
        }
    }

    fn parse_str(&self, source: &str) -> Result<ParsedPart, ParseFailure> {
        match self {
            DstvParser::Nc(parser) => parser.parse_str(source),
            DstvParser::Nc1(parser) => parser.parse_str(source),
        }
    }
}

/// 扩展名（不区分大小写）：`.nc` → NC，`.nc1` → NC1。
pub fn dialect_for_path(path: &Path) -> Result<Dialect, ParseError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("nc") => Ok(Dialect::Nc),
        Some("nc1") => Ok(Dialect::Nc1),
        _ => Err(ParseError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// 根据扩展名选择解析器并读取文件。
pub fn load_part(path: impl AsRef<Path>) -> Result<ParsedPart, ParseFailure> {
    let path = path.as_ref();
    DstvParser::for_path(path)?.load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_dispatches_on_extension() {
        assert_eq!(
            DstvParser::for_path("parts/722.nc").expect("nc").dialect(),
            Dialect::Nc
        );
        assert_eq!(
            DstvParser::for_path("parts/2501.NC1").expect("nc1").dialect(),
            Dialect::Nc1
        );
    }

    #[test]
    fn factory_rejects_other_extensions() {
        for name in ["part.dxf", "part", "part.nc2", "nc"] {
            match DstvParser::for_path(name) {
                Err(ParseError::UnsupportedFormat { path }) => {
                    assert_eq!(path, PathBuf::from(name));
                }
                other => panic!("{name}: 期望 UnsupportedFormat，实际 {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_reports_read_error() {
        let failure = load_part("definitely/not/here.nc").expect_err("missing file");
        assert!(matches!(failure.error, ParseError::Read { .. }));
        assert!(failure.partial.is_none());
    }
}
