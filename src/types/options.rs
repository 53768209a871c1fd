/// Optional sampling parameters for a completion call.
///
/// A `None` field means "let the provider default apply". An explicit value
/// is always forwarded, including zero — providers distinguish "unset" from
/// "explicitly zero" via the `Option`, never via the value.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Local-only sampling knob; the cloud protocol has no equivalent and
    /// the cloud client ignores it.
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

impl ChatOptions {
    /// True when no field is set, in which case request builders omit the
    /// options object entirely.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_tokens.is_none()
            && self.stop.is_none()
    }
}
