/// Uppercase + trim, the canonical form of descriptive attributes.
pub fn upper_trim(value: &str) -> String {
    value.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_accented_text() {
        assert_eq!(upper_trim("  camión eléctrico "), "CAMIÓN ELÉCTRICO");
    }
}
