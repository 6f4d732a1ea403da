//! Level 5 integration tests — arithmetic, inline conditionals, movement.
//!
//! Level 5 is the first level with integer arithmetic and string-coerced
//! equality; `if`/`else` clauses are still written inline.

use hedyc::transpile;

const LEVEL: u32 = 5;

/// Helper: join expected output lines.
fn lines(expected: &[&str]) -> String {
    expected.join("\n")
}

/// Helper: compile at level 5, asserting no graphics were used.
fn compile(src: &str) -> String {
    let result = transpile(src, LEVEL).expect("compile failed");
    assert!(!result.uses_graphics, "unexpected graphics in:\n{src}");
    result.code
}

// =============================================================================
// Output and input
// =============================================================================

#[test]
fn print_with_var() {
    assert_eq!(
        compile("naam is Hedy\nprint 'ik heet' naam"),
        lines(&["naam = 'Hedy'", "print('ik heet'+str(naam))"])
    );
}

#[test]
fn transpile_ask() {
    assert_eq!(
        compile("antwoord is ask 'wat is je lievelingskleur?'"),
        "antwoord = input('wat is je lievelingskleur?')"
    );
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn calculation_with_and_without_spaces() {
    assert_eq!(compile("nummer is 4 + 5"), "nummer = int(4) + int(5)");
    assert_eq!(compile("nummer is 4+5"), "nummer = int(4) + int(5)");
}

#[test]
fn print_calculation_with_var() {
    assert_eq!(
        compile("var is 5\nprint var + 5"),
        lines(&["var = '5'", "print(str(int(var) + int(5)))"])
    );
}

#[test]
fn print_calculation_times_directly() {
    assert_eq!(
        compile("print '5 keer 5 is ' 5 * 5"),
        "print('5 keer 5 is '+str(int(5) * int(5)))"
    );
    assert_eq!(
        compile("print '5 keer 5 keer 5 is ' 5 * 5 * 5"),
        "print('5 keer 5 keer 5 is '+str(int(5) * int(5) * int(5)))"
    );
}

#[test]
fn assign_calculation_then_print() {
    assert_eq!(
        compile("nummer is 4 + 5\nprint nummer"),
        lines(&["nummer = int(4) + int(5)", "print(str(nummer))"])
    );
}

#[test]
fn calculation_over_variables() {
    assert_eq!(
        compile("nummer is 5\nnummertwee is 6\ngetal is nummer * nummertwee\nprint getal"),
        lines(&[
            "nummer = '5'",
            "nummertwee = '6'",
            "getal = int(nummer) * int(nummertwee)",
            "print(str(getal))",
        ])
    );
}

#[test]
fn division_is_floor_division() {
    assert_eq!(
        compile("nummer is 5\nnummertwee is 6\nprint nummer / nummertwee"),
        lines(&[
            "nummer = '5'",
            "nummertwee = '6'",
            "print(str(int(nummer) // int(nummertwee)))",
        ])
    );
}

// =============================================================================
// Movement
// =============================================================================

#[test]
fn forward_turn_forward() {
    let result = transpile("forward 50\nturn\nforward 100", LEVEL).unwrap();
    assert_eq!(
        result.code,
        lines(&[
            "t.forward(50)",
            "time.sleep(0.1)",
            "t.right(90)",
            "t.forward(100)",
            "time.sleep(0.1)",
        ])
    );
    assert!(result.uses_graphics);
}

#[test]
fn forward_with_input_variable() {
    let result = transpile("afstand is ask 'hoe ver dan?'\nforward afstand", LEVEL).unwrap();
    assert_eq!(
        result.code,
        lines(&[
            "afstand = input('hoe ver dan?')",
            "t.forward(afstand)",
            "time.sleep(0.1)",
        ])
    );
    assert!(result.uses_graphics);
}

// =============================================================================
// Inline conditionals
// =============================================================================

#[test]
fn allow_space_after_else_line() {
    assert_eq!(
        compile("a is 2\nif a is 1 print a \nelse print 'nee'"),
        lines(&[
            "a = '2'",
            "if str(a) == str('1'):",
            "  print(str(a))",
            "else:",
            "  print('nee')",
        ])
    );
}

/// Input inside an inline branch, concatenated print in the else branch.
#[test]
fn issue_andras() {
    let src = lines(&[
        "prijs is 0",
        "optiestoetje is ask 'zou u nog een toetje willen'",
        "if optiestoetje is ja toet is ask 'zou u een brownie of een ijsje willen' else print 'ok dan wordt het ' prijs ' euro'",
        "print toet",
        "if toet is ijsje prijs is prijs + 2",
        "print 'ok bedankt dan wordt het ' prijs ' euro'",
    ]);
    assert_eq!(
        compile(&src),
        lines(&[
            "prijs = '0'",
            "optiestoetje = input('zou u nog een toetje willen')",
            "if str(optiestoetje) == str('ja'):",
            "  toet = input('zou u een brownie of een ijsje willen')",
            "else:",
            "  print('ok dan wordt het '+str(prijs)+' euro')",
            "print(str(toet))",
            "if str(toet) == str('ijsje'):",
            "  prijs = int(prijs) + int(2)",
            "print('ok bedankt dan wordt het '+str(prijs)+' euro')",
        ])
    );
}

#[test]
fn print_and_else() {
    let src = lines(&[
        "keuzes is 1, 2, 3, 4, 5, regenworm",
        "punten is 0",
        "worp is keuzes at random",
        "if worp is regenworm punten is punten + 5",
        "else punten is punten + worp",
        "print 'dat zijn dan ' punten",
    ]);
    assert_eq!(
        compile(&src),
        lines(&[
            "keuzes = ['1', '2', '3', '4', '5', 'regenworm']",
            "punten = '0'",
            "worp=random.choice(keuzes)",
            "if str(worp) == str('regenworm'):",
            "  punten = int(punten) + int(5)",
            "else:",
            "  punten = int(punten) + int(worp)",
            "print('dat zijn dan '+str(punten))",
        ])
    );
}

#[test]
fn ifelse_should_go_before_assign() {
    assert_eq!(
        compile("kleur is geel\nif kleur is groen antwoord is ok else antwoord is stom\nprint ans"),
        lines(&[
            "kleur = 'geel'",
            "if str(kleur) == str('groen'):",
            "  antwoord = 'ok'",
            "else:",
            "  antwoord = 'stom'",
            "print(str(ans))",
        ])
    );
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn indented_body_not_yet_allowed() {
    let err = transpile("if a is b\n    print 'x'", LEVEL).unwrap_err();
    assert_eq!(err.line(), Some(1));
}
