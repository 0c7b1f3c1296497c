use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Image argument for `setImage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image<'a> {
    /// Passed through untouched: a `data:` URL, an SVG string or a plugin-relative path.
    Url(&'a str),
    /// Already-encoded image bytes (PNG, JPEG, ...), sent as a base64 data URL.
    Encoded { mime_type: &'a str, bytes: &'a [u8] },
}

impl Image<'_> {
    pub fn to_wire(&self) -> String {
        match self {
            Self::Url(url) => (*url).to_owned(),
            Self::Encoded { mime_type, bytes } => {
                format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
            }
        }
    }
}
