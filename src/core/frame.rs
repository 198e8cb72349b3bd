use bytes::Bytes;

/// Close code for a normal, caller-initiated closure. Never retried.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the stream ends without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Transport-neutral websocket frame type.
///
/// Transports convert their native frame representation into/from `WsFrame`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsFrame {
    Text(Bytes),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(Option<WsCloseFrame>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsCloseFrame {
    pub code: u16,
    pub reason: Bytes,
}

impl WsFrame {
    #[inline]
    pub fn text_static(s: &'static str) -> Self {
        Self::Text(Bytes::from_static(s.as_bytes()))
    }

    #[inline]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(Bytes::from(s.into()))
    }

    #[inline]
    pub fn close(code: u16, reason: &'static str) -> Self {
        Self::Close(Some(WsCloseFrame {
            code,
            reason: Bytes::from_static(reason.as_bytes()),
        }))
    }

    /// Close code carried by this frame, if it is a close frame.
    ///
    /// A close frame without a payload is reported as [`CLOSE_ABNORMAL`]; browsers
    /// surface the same code for a missing status.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            WsFrame::Close(Some(frame)) => Some(frame.code),
            WsFrame::Close(None) => Some(CLOSE_ABNORMAL),
            _ => None,
        }
    }
}

/// Borrow the application payload of data frames without allocation.
#[inline]
pub fn frame_bytes(frame: &WsFrame) -> Option<&[u8]> {
    match frame {
        WsFrame::Text(bytes) | WsFrame::Binary(bytes) => Some(bytes.as_ref()),
        WsFrame::Ping(_) | WsFrame::Pong(_) | WsFrame::Close(_) => None,
    }
}

/// Convert owned bytes into a `WsFrame`, preferring text when bytes are valid UTF-8.
#[inline]
pub fn into_ws_frame<B>(bytes: B) -> WsFrame
where
    B: Into<Bytes>,
{
    let payload = bytes.into();
    if std::str::from_utf8(payload.as_ref()).is_ok() {
        WsFrame::Text(payload)
    } else {
        WsFrame::Binary(payload)
    }
}
