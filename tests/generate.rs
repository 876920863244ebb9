//! End to end conversion of a small query language.

use abnfgen::{generate, Options};

const LEXER: &str = include_str!("fixtures/mql.l");
const GRAMMAR: &str = include_str!("fixtures/mql.y");

#[test]
fn generate_mql() {
    let got = generate(LEXER, GRAMMAR, &Options::default()).unwrap();
    let want = r#"SHOW = "SHOW"
TABLES = "TABLES"
SELECT = "SELECT"
FROM = "FROM"
WHERE = "WHERE"
AND = "AND"
<digit> = DIGIT
<integer> = 0*1"-" 1*<digit>
<identifier> = (ALPHA / "_") *(ALPHA / DIGIT / "_")

<statement_list> = (SHOW TABLES ";" / <select_statement> ";") *(SHOW
                   TABLES ";" / <select_statement> ";")

<select_statement> = SELECT ("*" / <identifier> *("," <identifier>))
                     FROM <identifier> [WHERE <condition>]

<condition> = <identifier> ("=" / "<=") (<integer> / "'" <identifier>
              "'") *(AND <identifier> ("=" / "<=") (<integer> / "'"
              <identifier> "'"))
"#;
    assert_eq!(got, want);
}

#[test]
fn generate_respects_width() {
    let options = Options {
        width: 200,
        ..Options::default()
    };
    let got = generate(LEXER, GRAMMAR, &options).unwrap();
    let rules: Vec<&str> = got.split("\n\n").skip(1).map(str::trim_end).collect();
    assert_eq!(
        rules,
        vec![
            "<statement_list> = (SHOW TABLES \";\" / <select_statement> \";\") *(SHOW TABLES \";\" / <select_statement> \";\")",
            "<select_statement> = SELECT (\"*\" / <identifier> *(\",\" <identifier>)) FROM <identifier> [WHERE <condition>]",
            "<condition> = <identifier> (\"=\" / \"<=\") (<integer> / \"'\" <identifier> \"'\") *(AND <identifier> (\"=\" / \"<=\") (<integer> / \"'\" <identifier> \"'\"))",
        ]
    );
}

#[test]
fn generate_without_markers() {
    let grammar = GRAMMAR.replace("/*#toplevel#*/", "");
    let options = Options {
        width: 200,
        ..Options::default()
    };
    let got = generate(LEXER, &grammar, &options).unwrap();
    let rules: Vec<&str> = got.split("\n\n").skip(1).collect();

    // Only the start symbol is emitted, with everything below it inlined.
    assert_eq!(rules.len(), 1);
    assert!(rules[0].starts_with("<statement_list> = (SHOW TABLES \";\" / SELECT"));
    assert!(!rules[0].contains("<select_statement>"));
}

#[test]
fn generate_custom_marker() {
    let grammar = GRAMMAR.replace("/*#toplevel#*/", "/*#public#*/");
    let options = Options {
        marker: "public".to_owned(),
        ..Options::default()
    };
    assert_eq!(
        generate(LEXER, &grammar, &options).unwrap(),
        generate(LEXER, GRAMMAR, &Options::default()).unwrap()
    );
}

#[test]
fn generate_fails_without_output() {
    let tests = vec![
        (LEXER.replace("%%", ""), GRAMMAR.to_owned(), "lexer source has no '%%' section separator"),
        (LEXER.to_owned(), GRAMMAR.replace("%%", ""), "grammar source has no '%%' section separator"),
        (
            LEXER.replace("[0-9]", "[0-9"),
            GRAMMAR.to_owned(),
            "line 25: bad pattern for 'DIGIT': unterminated character class in '[0-9'",
        ),
    ];

    for (lexer, grammar, want) in tests {
        let err = generate(&lexer, &grammar, &Options::default()).unwrap_err();
        assert_eq!(err.to_string(), want);
    }
}
