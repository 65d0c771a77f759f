/// Finds the first known locality mentioned in free text, scanning
/// case-insensitively. The order of `known_regions` decides the winner when
/// several localities appear in the same string.
pub fn extract_region(text: &str, known_regions: &[String]) -> String {
    if text.is_empty() {
        return String::new();
    }
    let haystack = text.to_lowercase();
    known_regions
        .iter()
        .find(|region| haystack.contains(&region.to_lowercase()))
        .cloned()
        .unwrap_or_default()
}
