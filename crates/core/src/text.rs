/// Fold the accented characters common in Spanish-language records to
/// their ASCII base, the same normalization the upstream registry exports
/// use for entity names. Other characters pass through untouched.
pub fn fold_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::fold_ascii;

    #[test]
    fn spanish_accents_fold_to_ascii() {
        assert_eq!(fold_ascii("educación"), "educacion");
        assert_eq!(fold_ascii("NARIÑO"), "NARINO");
        assert_eq!(fold_ascii("Bogotá D.C."), "Bogota D.C.");
    }

    #[test]
    fn plain_ascii_is_unchanged() {
        assert_eq!(fold_ascii("SENA 2024"), "SENA 2024");
    }
}
