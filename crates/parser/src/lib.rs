pub mod classifier;
pub mod html;
pub mod sitemap;

use md5::{Digest, Md5};

pub use classifier::classify;

/// MD5 digest of a response body, used both for content-level dedup and as
/// the `<md5>` filesystem key for a URL's artifacts.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_matches_known_vector() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
