//! State owned by one build call

use crate::images::ImageCache;
use crate::numbering::NumberingState;
use crate::settings::BuilderSettings;
use std::collections::HashSet;

/// Mutable state threaded through every step of a build. Nothing here
/// outlives the call, so independent builds never share state.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub settings: BuilderSettings,
    pub images: ImageCache,
    pub numbering: NumberingState,
    /// Last bookmark id handed out
    pub last_bookmark_id: i64,
    /// Item ids of custom XML parts already copied, normalized
    pub custom_xml_items: HashSet<String>,
}

impl BuildContext {
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}
