use std::fs;
use std::path::PathBuf;
use storygraph_script::{
    parse_file, update_branch_block, update_say_statement, ScriptError,
};

fn write_script(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SCRIPT: &str = r#"// intro chapter
scene intro {
    say Alice "Hello there"
    play music "theme.ogg"
}

scene forest {
    say Narrator "The woods are dark"
}
"#;

#[test]
fn test_branch_block_inserted_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_branch_block(&path, "intro", &["forest".to_string()]).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("// @graph-begin"));
    assert!(content.contains("    goto forest"));
    // Author content survives untouched.
    assert!(content.contains("play music \"theme.ogg\""));
    assert!(content.contains("// intro chapter"));

    // Growing to two targets swaps the goto for a choice block in place.
    update_branch_block(
        &path,
        "intro",
        &["forest".to_string(), "cave".to_string()],
    )
    .unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("// @graph-begin").count(), 1);
    assert!(content.contains("\"forest\" -> goto forest"));
    assert!(content.contains("\"cave\" -> goto cave"));
    assert!(!content.contains("\n    goto forest\n"));
}

#[test]
fn test_branch_block_rewrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);
    let targets = vec!["forest".to_string(), "cave".to_string()];

    update_branch_block(&path, "intro", &targets).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    update_branch_block(&path, "intro", &targets).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_branch_block_removed_when_targets_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_branch_block(&path, "intro", &["forest".to_string()]).unwrap();
    update_branch_block(&path, "intro", &[]).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("@graph-begin"));
    assert!(content.contains("say Alice \"Hello there\""));
}

#[test]
fn test_branch_block_noop_without_targets_or_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_branch_block(&path, "intro", &[]).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), SCRIPT);
}

#[test]
fn test_branch_block_unknown_scene_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    let err = update_branch_block(&path, "missing", &["forest".to_string()]).unwrap_err();
    assert!(matches!(err, ScriptError::SceneNotFound(_)));
}

#[test]
fn test_say_statement_replaced_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_say_statement(&path, "intro", "Alice", "A new greeting").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("say Alice \"A new greeting\""));
    assert!(!content.contains("Hello there"));
    // Other scenes untouched.
    assert!(content.contains("say Narrator \"The woods are dark\""));
}

#[test]
fn test_say_statement_prepended_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "s.nms", "scene silent {\n    play music \"a.ogg\"\n}\n");

    update_say_statement(&path, "silent", "Guide", "Now with words").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let say_at = content.find("say Guide \"Now with words\"").unwrap();
    let play_at = content.find("play music").unwrap();
    assert!(say_at < play_at);
}

#[test]
fn test_say_statement_ignores_commented_out_say() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        &dir,
        "s.nms",
        "scene intro {\n    // say Ghost \"boo\"\n    play music \"a.ogg\"\n}\n",
    );

    update_say_statement(&path, "intro", "Alice", "Hello").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    // The comment is author text and stays untouched; a real say
    // statement is prepended instead.
    assert!(content.contains("// say Ghost \"boo\""));
    assert!(content.contains("\n    say Alice \"Hello\""));

    let outcome = parse_file(&path).unwrap();
    assert_eq!(outcome.nodes[0].speaker, "Alice");
    assert_eq!(outcome.nodes[0].text, "Hello");
}

#[test]
fn test_say_statement_skips_placeholder_and_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_say_statement(&path, "intro", "Alice", "").unwrap();
    update_say_statement(&path, "intro", "Alice", "  New scene  ").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), SCRIPT);
}

#[test]
fn test_say_statement_sanitizes_speaker_and_escapes_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_say_statement(&path, "intro", "Dr. Who", "line1\nline2 \"quoted\"").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(r#"say Dr__Who "line1\nline2 \"quoted\"""#));
}

#[test]
fn test_sync_then_parse_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, "chapter1.nms", SCRIPT);

    update_branch_block(&path, "intro", &["forest".to_string()]).unwrap();
    update_say_statement(&path, "forest", "Narrator", "The woods are bright").unwrap();

    let outcome = parse_file(&path).unwrap();
    assert!(outcome.is_clean(), "issues: {:?}", outcome.issues);
    assert_eq!(outcome.nodes.len(), 2);
    assert_eq!(
        outcome.edges,
        vec![("intro".to_string(), "forest".to_string())]
    );
    assert_eq!(outcome.nodes[1].text, "The woods are bright");
}
