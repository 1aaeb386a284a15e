//! Byte-exact SQL reconstruction from formatting-annotated lexemes.
//! Each lexeme carries its verbatim source slice and trailing trivia,
//! so concatenation reproduces the original text exactly.

use sqlforge_lib_core::lexer::LexemeSequence;

pub fn restore(sequence: &LexemeSequence) -> String {
    let mut out = String::from(sequence.prelude.as_str());
    for lexeme in &sequence.lexemes {
        out.push_str(&lexeme.raw);
        out.push_str(&lexeme.raw_trailing);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::lexer::Lexer;

    use super::*;

    #[test]
    fn restores_bytes_exactly() {
        let sources = [
            "select 1",
            "  -- head\nSELECT  a ,\tb\nFROM t  -- tail\n",
            "select 'it''s', $tag$ raw $tag$ /* mid */ from t;",
            "with w as (select 1)\nselect * from w",
        ];
        for source in sources {
            let sequence = Lexer::default().tokenize(source).unwrap();
            assert_eq!(restore(&sequence), source);
        }
    }
}
