/// URL-friendly form of a name: transliterated to ASCII, lowercased, every
/// other run of characters collapsed into a single `-`, no leading or
/// trailing `-`.
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("Hello,  World!"), "hello-world");
        assert_eq!(slugify("  Rust & Web -- 2024 "), "rust-web-2024");
    }

    #[test]
    fn transliterates_non_ascii() {
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("Über Rust"), "uber-rust");
        assert_eq!(slugify("Été"), "ete");
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}
