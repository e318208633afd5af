//! Integration tests for rule evaluation against realistic window contexts
//!
//! Rules are authored as TOML exactly as a user would write them, compiled
//! through the config layer, and evaluated against context snapshots.

use kbctx::config::Config;
use kbctx::context::WindowContext;
use pretty_assertions::assert_eq;

fn compile(rules_toml: &str) -> Config {
    Config::from_toml_str(rules_toml).expect("config should compile")
}

fn firefox() -> WindowContext {
    WindowContext {
        wm_class: Some("Firefox".to_string()),
        wm_name: Some("GitHub - Mozilla Firefox".to_string()),
        device_name: "Logitech MX Keys".to_string(),
        numlock_on: false,
        capslock_on: false,
    }
}

fn unidentified() -> WindowContext {
    WindowContext {
        wm_class: None,
        wm_name: None,
        device_name: "Logitech MX Keys".to_string(),
        numlock_on: false,
        capslock_on: false,
    }
}

#[test]
fn substring_search_is_case_insensitive_by_default() {
    let config = compile("[[rules]]\nclas = \"firefox\"");
    assert!(config.rules[0].matches(&firefox()));
}

#[test]
fn cse_makes_the_same_pattern_miss() {
    let config = compile("[[rules]]\nclas = \"firefox\"\ncse = true");
    assert!(!config.rules[0].matches(&firefox()));

    let config = compile("[[rules]]\nclas = \"Firefox\"\ncse = true");
    assert!(config.rules[0].matches(&firefox()));
}

#[test]
fn all_fields_in_one_rule_are_anded() {
    let toml = r#"
[[rules]]
clas = "firefox"
name = "github"
devn = "MX Keys"
"#;
    let config = compile(toml);
    assert!(config.rules[0].matches(&firefox()));

    let mut other_title = firefox();
    other_title.wm_name = Some("Settings".to_string());
    assert!(!config.rules[0].matches(&other_title));
}

#[test]
fn unidentified_context_never_matches_positive_fields() {
    // A window with no class/title facts must not trigger class rules,
    // whatever the pattern
    let config = compile("[[rules]]\nclas = \".*\"");
    assert!(!config.rules[0].matches(&unidentified()));

    let config = compile("[[rules]]\nname = \".*\"");
    assert!(!config.rules[0].matches(&unidentified()));
}

#[test]
fn unidentified_context_does_match_negative_fields() {
    // not_clas means "class is not known to be X", which holds vacuously
    let config = compile("[[rules]]\nnot_clas = \"firefox\"");
    assert!(config.rules[0].matches(&unidentified()));
    assert!(!config.rules[0].matches(&firefox()));
}

#[test]
fn led_fields_are_tri_state() {
    let mut ctx = firefox();
    ctx.numlock_on = true;

    // Omitted LED field: don't care
    let config = compile("[[rules]]\nclas = \"firefox\"");
    assert!(config.rules[0].matches(&ctx));

    // numlk = true requires the LED on
    let config = compile("[[rules]]\nclas = \"firefox\"\nnumlk = true");
    assert!(config.rules[0].matches(&ctx));
    assert!(!config.rules[0].matches(&firefox()));

    // numlk = false requires the LED off, it is not "don't care"
    let config = compile("[[rules]]\nclas = \"firefox\"\nnumlk = false");
    assert!(!config.rules[0].matches(&ctx));
    assert!(config.rules[0].matches(&firefox()));
}

#[test]
fn lst_matches_when_any_sub_record_does() {
    let toml = r#"
[[rules]]
dbg = "browsers"
lst = [
    { clas = "^firefox$" },
    { clas = "^chromium$" },
    { name = "github", devn = "MX Keys" },
]
"#;
    let config = compile(toml);
    assert!(config.rules[0].matches(&firefox()));

    let mut kitty = firefox();
    kitty.wm_class = Some("kitty".to_string());
    kitty.wm_name = Some("~".to_string());
    assert!(!config.rules[0].matches(&kitty));
}

#[test]
fn not_lst_matches_when_no_sub_record_does() {
    let toml = r#"
[[rules]]
not_lst = [
    { clas = "^firefox$" },
    { clas = "^chromium$" },
]
"#;
    let config = compile(toml);
    assert!(!config.rules[0].matches(&firefox()));

    let mut kitty = firefox();
    kitty.wm_class = Some("kitty".to_string());
    assert!(config.rules[0].matches(&kitty));
}

#[test]
fn rules_evaluate_independently() {
    let toml = r#"
[[rules]]
dbg = "browsers"
clas = "firefox"

[[rules]]
dbg = "terminals"
clas = "kitty"

[[rules]]
dbg = "caps warning"
capslk = true
"#;
    let config = compile(toml);
    let matched: Vec<&str> = config
        .rules
        .iter()
        .filter(|r| r.matches(&firefox()))
        .filter_map(|r| r.label.as_deref())
        .collect();
    assert_eq!(matched, vec!["browsers"]);
}

// Configuration errors surface at compile time with the offending detail

#[test]
fn positive_and_negative_of_same_field_is_a_config_error() {
    let toml = "[[rules]]\nclas = \"x\"\nnot_clas = \"y\"";
    let err = Config::from_toml_str(toml).unwrap_err();
    assert!(format!("{err:#}").contains("clas"), "{err:#}");
}

#[test]
fn lst_combined_with_scalar_field_is_a_config_error() {
    let toml = r#"
[[rules]]
clas = "firefox"
lst = [ { name = "github" } ]
"#;
    assert!(Config::from_toml_str(toml).is_err());
}

#[test]
fn empty_rule_record_is_a_config_error() {
    assert!(Config::from_toml_str("[[rules]]\ndbg = \"nothing\"").is_err());
}

#[test]
fn non_boolean_led_value_is_a_config_error() {
    let err = Config::from_toml_str("[[rules]]\nnumlk = \"on\"").unwrap_err();
    assert!(format!("{err:#}").contains("numlk"), "{err:#}");
}
