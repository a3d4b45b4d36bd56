//! 两种方言共用的分段状态机。方言差异由 [`DialectRules`] 提供。

use dstv_core::part::{ContourPoint, Hole, Part, Slot};
use dstv_core::schema::{Dialect, FaceTag};
use tracing::{debug, trace, warn};

use crate::header::{HeaderLayout, build_part};
use crate::numeric::normalize;
use crate::{LineRejection, MalformedLine, ParseFailure, ParsedPart, Section};

/// 行首两个字符表示的段标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Start,
    Holes,
    Contours,
    InnerContours,
    Markings,
    End,
}

pub(crate) trait DialectRules {
    fn dialect(&self) -> Dialect;

    fn header_layout(&self) -> &'static HeaderLayout;

    fn marker(&self, code: &str) -> Option<Marker>;

    /// 数据行在分派到段解析之前的过滤。
    fn accepts_body_line(&self, line: &str) -> bool;

    fn parse_slot(&self, fields: &[&str], line: &str) -> Option<Slot>;

    fn parse_hole(&self, fields: &[&str]) -> Option<Hole>;

    fn parse_contour(&mut self, fields: &[&str])
    -> Result<(FaceTag, ContourPoint), LineRejection>;
}

/// 对一份文件内容运行状态机。每次调用都持有独立的方言状态。
pub(crate) fn run<R: DialectRules>(source: &str, rules: R) -> Result<ParsedPart, ParseFailure> {
    let mut machine = SectionMachine::new(rules);
    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if !machine.feed(index + 1, line)? {
            break;
        }
    }
    machine.finish()
}

struct SectionMachine<R> {
    rules: R,
    section: Section,
    header_lines: Vec<String>,
    part: Option<Part>,
    skipped: Vec<MalformedLine>,
}

impl<R: DialectRules> SectionMachine<R> {
    fn new(rules: R) -> Self {
        Self {
            rules,
            section: Section::Preamble,
            header_lines: Vec::new(),
            part: None,
            skipped: Vec::new(),
        }
    }

    /// 处理一行。返回 `false` 表示遇到 `EN`，解析结束。
    fn feed(&mut self, line_number: usize, line: &str) -> Result<bool, ParseFailure> {
        let marker = self.rules.marker(section_code(line));

        if marker == Some(Marker::Start) {
            trace!(line_number, "进入头部");
            self.section = Section::Header;
            self.header_lines.clear();
            return Ok(true);
        }

        if self.section == Section::Header {
            if marker.is_none() {
                self.header_lines.push(line.to_string());
                return Ok(true);
            }
            self.close_header()?;
        }

        match marker {
            Some(Marker::Holes) => self.enter(Section::Holes, line_number),
            Some(Marker::Contours) => self.enter(Section::Contours, line_number),
            Some(Marker::InnerContours) => self.enter(Section::InnerContours, line_number),
            Some(Marker::Markings) => self.enter(Section::Markings, line_number),
            Some(Marker::End) => {
                debug!(line_number, "文件结束标记 EN");
                self.section = Section::Done;
                return Ok(false);
            }
            Some(Marker::Start) | None => self.body_line(line_number, line),
        }
        Ok(true)
    }

    fn enter(&mut self, section: Section, line_number: usize) {
        debug!(line_number, ?section, "进入数据段");
        self.section = section;
    }

    fn close_header(&mut self) -> Result<(), ParseFailure> {
        let dialect = self.rules.dialect();
        match build_part(&self.header_lines, self.rules.header_layout(), dialect) {
            Ok(part) => {
                if self.part.is_some() {
                    debug!("新的头部块替换之前的构件");
                }
                self.part = Some(part);
                Ok(())
            }
            Err(error) => {
                warn!(%dialect, error = %error, "头部解析失败，终止解析");
                Err(ParseFailure {
                    error,
                    partial: self.part.take().map(Box::new),
                    skipped: std::mem::take(&mut self.skipped),
                })
            }
        }
    }

    fn body_line(&mut self, line_number: usize, line: &str) {
        match self.section {
            Section::Markings | Section::InnerContours => {
                trace!(line_number, line, "忽略的行");
                return;
            }
            Section::Preamble | Section::Header | Section::Done => {
                self.reject(line_number, line, LineRejection::OutsideSection);
                return;
            }
            Section::Holes | Section::Contours => {}
        }

        if !self.rules.accepts_body_line(line) {
            self.reject(line_number, line, LineRejection::NotAFaceRecord);
            return;
        }
        let Some(part) = self.part.as_mut() else {
            self.reject(line_number, line, LineRejection::NoPart);
            return;
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let outcome = if self.section == Section::Holes {
            if let Some(slot) = self.rules.parse_slot(&fields, line) {
                trace!(line_number, ?slot, "长圆孔");
                part.add_slot(slot);
                Ok(())
            } else if let Some(hole) = self.rules.parse_hole(&fields) {
                trace!(line_number, ?hole, "孔");
                part.add_hole(hole);
                Ok(())
            } else {
                Err(LineRejection::UnrecognizedRecord)
            }
        } else {
            self.rules.parse_contour(&fields).map(|(face, point)| {
                trace!(line_number, %face, ?point, "轮廓点");
                part.add_contour_points(face, [point]);
            })
        };

        if let Err(reason) = outcome {
            self.reject(line_number, line, reason);
        }
    }

    fn reject(&mut self, line_number: usize, line: &str, reason: LineRejection) {
        match reason {
            LineRejection::UnrecognizedRecord
            | LineRejection::UnknownFace
            | LineRejection::NoCurrentFace => {
                warn!(line_number, line, %reason, "跳过无法识别的数据行");
            }
            LineRejection::NoPart | LineRejection::OutsideSection | LineRejection::NotAFaceRecord => {
                debug!(line_number, line, %reason, "跳过数据行");
            }
        }
        self.skipped.push(MalformedLine {
            line_number,
            section: self.section,
            content: line.to_string(),
            reason,
        });
    }

    fn finish(self) -> Result<ParsedPart, ParseFailure> {
        let dialect = self.rules.dialect();
        match self.part {
            Some(part) => Ok(ParsedPart {
                part,
                dialect,
                skipped: self.skipped,
            }),
            None => Err(ParseFailure {
                error: crate::ParseError::MissingHeader,
                partial: None,
                skipped: self.skipped,
            }),
        }
    }
}

/// 行首两个字符；行长不足两个字符时返回整行。
fn section_code(line: &str) -> &str {
    match line.char_indices().nth(2) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}

/// 读取第 `index` 个字段并归一化为数值；缺失或格式错误都返回 `None`。
pub(crate) fn number_at(fields: &[&str], index: usize) -> Option<f64> {
    let token = fields.get(index)?;
    match normalize(token) {
        Ok(value) => Some(value),
        Err(err) => {
            trace!(index, error = %err, "字段不是数值");
            None
        }
    }
}
