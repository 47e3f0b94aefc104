//! Query text normalization.
//!
//! Strips noise characters while keeping ASCII alphanumerics and the
//! Vietnamese accented Latin set, and collapses whitespace runs.

/// Accented characters kept alongside ASCII alphanumerics. Lowercase
/// set; uppercase variants are matched via `to_lowercase`.
const ACCENTED: &str = "áàảãạâấầẩẫậăắằẳẵặđéèẻẽẹêếềểễệíìỉĩịòóỏõọôốồổỗộơớờởỡợúùủũụưứừửữựýỳỷỹỵ";

fn is_permitted(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.to_lowercase().all(|l| ACCENTED.contains(l))
}

/// Strip everything outside the permitted alphabet and collapse
/// whitespace to single spaces. Pure; empty input yields empty output.
pub fn normalize(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|&c| c.is_whitespace() || is_permitted(c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
