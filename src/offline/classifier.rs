use crate::models::{Buckets, Category};

/// Splits manifest URLs into vulnerability and component buckets.
///
/// The vulnerability marker is checked first, so a URL carrying both markers is a
/// vulnerability. URLs with neither marker are dropped. Order follows the input.
pub fn classify<S: AsRef<str>>(urls: &[S]) -> Buckets {
    let mut buckets = Buckets::default();
    for url in urls.iter().map(AsRef::as_ref) {
        if url.contains(Category::Vulnerability.marker()) {
            buckets.vulnerabilities.push(url.to_string());
        } else if url.contains(Category::Component.marker()) {
            buckets.components.push(url.to_string());
        }
    }
    buckets
}
