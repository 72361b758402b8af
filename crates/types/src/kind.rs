/// Closed set of message-type tags recognized by one service
///
/// Implemented with `#[derive(MessageKind)]`. Tags arrive as free-form
/// strings at the boundary; `from_tag` is the only place they are parsed.
pub trait MessageKind: Sized + Copy + Send + Sync + 'static {
    /// Every recognized kind, in declaration order
    const ALL: &'static [Self];

    /// Wire tag for this kind
    fn tag(&self) -> &'static str;

    /// Parse a wire tag. Exact match only.
    fn from_tag(tag: &str) -> Option<Self>;

    /// Wire tags of every recognized kind
    fn tags() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.tag()).collect()
    }
}
