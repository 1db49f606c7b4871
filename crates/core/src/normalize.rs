use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

// NFC; decomposing filesystems hand back base letter + combining mark.
pub fn normalize_caption(caption: &str) -> String {
    match is_nfc_quick(caption.chars()) {
        IsNormalized::Yes => caption.to_string(),
        _ => caption.nfc().collect(),
    }
}
