//! A string together with the byte ranges its capture groups cover.

/// A matched or substituted path along with its numbered capture groups,
/// each a half-open byte range into `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedString {
    pub value: String,
    pub captured_groups: Vec<(usize, usize)>,
}

impl CapturedString {
    /// The text selected by capture group `ix`.
    pub fn group(&self, ix: usize) -> Option<&str> {
        let &(from, to) = self.captured_groups.get(ix)?;
        self.value.get(from..to)
    }
}
