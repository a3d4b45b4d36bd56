pub mod faces;

pub use faces::{ComposedFace, ComposedProfile, FaceComposer, FaceExport};

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("no profile schema for type \"{0}\"")]
        UnknownProfileType(String),
    }
}

/// 构件级斜切检查，供按是否斜切分拣文件的外部工具使用。
pub mod inspection {
    use dstv_config::InspectionConfig;
    use dstv_core::part::{DEFAULT_SKEW_TOLERANCE, Part};
    use serde::Serialize;
    use tracing::debug;

    /// 板件没有翼缘与腹板之分，不参与斜切检查。
    const PLATE_PROFILE: &str = "B";

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct SkewReport {
        pub piece_id: String,
        pub profile_code: String,
        pub flange_skew_cut: bool,
        pub web_skew_cut: bool,
    }

    impl SkewReport {
        /// 翼缘或腹板至少一处斜切。
        #[inline]
        pub fn is_inclined(&self) -> bool {
            self.flange_skew_cut || self.web_skew_cut
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SkewInspector {
        tolerance: f64,
    }

    impl SkewInspector {
        pub fn new(tolerance: f64) -> Self {
            Self { tolerance }
        }

        pub fn from_config(config: &InspectionConfig) -> Self {
            Self::new(config.skew_tolerance)
        }

        #[inline]
        pub fn tolerance(&self) -> f64 {
            self.tolerance
        }

        /// 板件返回 `None`。
        pub fn inspect(&self, part: &Part) -> Option<SkewReport> {
            if part.profile_type() == PLATE_PROFILE {
                debug!(piece_id = %part.header().piece_id, "板件跳过斜切检查");
                return None;
            }
            let header = part.header();
            let report = SkewReport {
                piece_id: header.piece_id.clone(),
                profile_code: header.profile_code.clone(),
                flange_skew_cut: part.flange_skew_cut_within(self.tolerance),
                web_skew_cut: part.web_skew_cut_within(self.tolerance),
            };
            debug!(
                piece_id = %report.piece_id,
                flange = report.flange_skew_cut,
                web = report.web_skew_cut,
                "斜切检查完成"
            );
            Some(report)
        }
    }

    impl Default for SkewInspector {
        fn default() -> Self {
            Self::new(DEFAULT_SKEW_TOLERANCE)
        }
    }

}
