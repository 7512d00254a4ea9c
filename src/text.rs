//! Text normalization shared by the matcher and the taxonomy loader.
//!
//! Keywords and proposal text go through the same folding so that
//! `"Previdência"` in a taxonomy file matches `"PREVIDENCIA"` in an ementa.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text for matching: lowercase, decompose (NFKD) and drop combining
/// marks, then collapse every run of whitespace into a single space. Leading
/// and trailing whitespace is removed.
///
/// Compatibility decomposition also folds ordinal indicators ("13º salário")
/// and non-breaking spaces.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join and normalize the searchable parts of a record, skipping empty ones.
pub fn searchable_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("Previdência Social"), "previdencia social");
        assert_eq!(normalize_text("GREVE NO JUDICIÁRIO"), "greve no judiciario");
        assert_eq!(normalize_text("Ação de Execução"), "acao de execucao");
        assert_eq!(normalize_text("13º salário"), "13o salario");
    }

    #[test]
    fn test_normalize_decomposed_input() {
        // "Previdência" with the circumflex as a combining mark (NFD)
        let decomposed = "Reforma da Previde\u{0302}ncia";
        assert_eq!(normalize_text(decomposed), "reforma da previdencia");
        assert_eq!(normalize_text(decomposed), normalize_text("Reforma da Previdência"));
        assert_eq!(normalize_text("Sindicato\u{00A0}dos Servidores"), "sindicato dos servidores");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  reajuste \n\t salarial  "), "reajuste salarial");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_searchable_text_skips_empty_parts() {
        let text = searchable_text(["Reajuste salarial RJU", "", "  "]);
        assert_eq!(text, "reajuste salarial rju");
    }
}
