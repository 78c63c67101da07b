use axum::extract::ws::Utf8Bytes;

/// An encoded text frame queued for one connection.
///
/// Cloning shares the same buffer, so a broadcast encodes once and every
/// recipient's socket writes those same bytes.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    pub fn text(text: impl Into<Utf8Bytes>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether two messages share one encoded buffer
    pub fn shares_buffer(&self, other: &OutboundMessage) -> bool {
        let (a, b) = (self.as_str(), other.as_str());
        a.len() == b.len() && a.as_ptr() == b.as_ptr()
    }

    /// Payload for the socket's text frame, still backed by the shared buffer
    pub fn into_frame(self) -> Utf8Bytes {
        self.0
    }
}

impl PartialEq for OutboundMessage {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for OutboundMessage {}
