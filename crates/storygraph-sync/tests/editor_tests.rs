//! Integration tests for the graph editing facade.

use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use storygraph_core::{GraphEvent, NodeKind, Position};
use storygraph_sync::{EditorError, GraphEditor, SyncState};
use tokio::sync::mpsc;

fn editor_in(dir: &Path) -> GraphEditor {
    GraphEditor::new(dir)
}

fn layout_file(dir: &Path) -> std::path::PathBuf {
    dir.join(".storygraph/story_graph.json")
}

#[test]
fn test_add_node_scaffolds_script_and_saves_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor
        .add_node("intro", NodeKind::Dialogue, Position::new(10.0, 20.0))
        .unwrap();
    editor
        .set_property("intro", "scriptPath", "scripts/intro.nms")
        .unwrap();

    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(script.contains("scene intro {"));
    assert!(script.contains("say Narrator \"New script node\""));

    let layout = fs::read_to_string(layout_file(dir.path())).unwrap();
    assert!(layout.contains("\"id\": \"intro\""));
    assert!(layout.contains("\"scriptPath\": \"scripts/intro.nms\""));
}

#[test]
fn test_connect_writes_branch_block() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    for id in ["intro", "cave", "river"] {
        editor
            .add_node(id, NodeKind::Dialogue, Position::default())
            .unwrap();
    }
    editor
        .set_property("intro", "scriptPath", "scripts/intro.nms")
        .unwrap();

    editor.connect("intro", "cave").unwrap();
    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(script.contains("// @graph-begin"));
    assert!(script.contains("    goto cave"));

    editor.connect("intro", "river").unwrap();
    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(script.contains("choice {"));
    assert!(script.contains("\"cave\" -> goto cave"));
    assert!(script.contains("\"river\" -> goto river"));

    editor.disconnect("intro", "cave").unwrap();
    editor.disconnect("intro", "river").unwrap();
    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(!script.contains("goto"));
}

#[test]
fn test_connect_rejects_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor.add_node("a", NodeKind::Scene, Position::default()).unwrap();
    editor.add_node("b", NodeKind::Scene, Position::default()).unwrap();
    editor.connect("a", "b").unwrap();

    let err = editor.connect("b", "a").unwrap_err();
    assert!(matches!(err, EditorError::Graph(_)));
    assert!(!editor.model().has_edge(
        editor.model().resolve("b").unwrap(),
        editor.model().resolve("a").unwrap()
    ));
}

#[test]
fn test_text_edit_rewrites_say_statement() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor
        .add_node("intro", NodeKind::Dialogue, Position::default())
        .unwrap();
    editor
        .set_property("intro", "scriptPath", "scripts/intro.nms")
        .unwrap();
    editor.set_property("intro", "speaker", "Dr. Evil!").unwrap();
    editor
        .set_property("intro", "text", "Say \"hello\"\nplease")
        .unwrap();

    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(script.contains(r#"say Dr__Evil_ "Say \"hello\"\nplease""#));
    assert!(!script.contains("New script node"));
}

#[test]
fn test_choice_targets_follow_option_labels() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor
        .add_node("fork", NodeKind::Choice, Position::default())
        .unwrap();
    editor.add_node("cave", NodeKind::Scene, Position::default()).unwrap();
    editor.add_node("river", NodeKind::Scene, Position::default()).unwrap();
    editor
        .set_property("fork", "choices", "Go left\nGo right")
        .unwrap();

    editor.connect("fork", "cave").unwrap();
    editor.connect("fork", "river").unwrap();

    let fork = editor.model().resolve("fork").unwrap();
    let node = editor.model().node(fork).unwrap();
    assert_eq!(node.choice_targets["Go left"], "cave");
    assert_eq!(node.choice_targets["Go right"], "river");
}

#[test]
fn test_failed_script_write_leaves_model_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor
        .add_node("intro", NodeKind::Dialogue, Position::default())
        .unwrap();
    editor
        .set_property("intro", "scriptPath", "scripts/intro.nms")
        .unwrap();
    editor.set_property("intro", "text", "Original").unwrap();

    fs::remove_file(dir.path().join("scripts/intro.nms")).unwrap();

    assert!(editor.set_property("intro", "text", "Changed").is_err());
    assert!(editor.set_property("intro", "speaker", "Alice").is_err());

    let model = editor.model();
    let intro = model.resolve("intro").unwrap();
    assert_eq!(model.node(intro).unwrap().dialogue_text, "Original");
    assert_eq!(model.node(intro).unwrap().speaker, "Narrator");
}

#[test]
fn test_rename_keeps_edges_and_rejects_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor.add_node("a", NodeKind::Scene, Position::default()).unwrap();
    editor.add_node("b", NodeKind::Scene, Position::default()).unwrap();
    editor.connect("a", "b").unwrap();

    editor.rename_node("a", "start").unwrap();
    let model = editor.model();
    assert!(model.resolve("a").is_none());
    let start = model.resolve("start").unwrap();
    assert!(model.has_edge(start, model.resolve("b").unwrap()));

    let err = editor.rename_node("start", "b").unwrap_err();
    assert!(matches!(err, EditorError::Graph(_)));
}

#[test]
fn test_unknown_property_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor.add_node("a", NodeKind::Scene, Position::default()).unwrap();

    let err = editor.set_property("a", "color", "red").unwrap_err();
    assert!(matches!(err, EditorError::UnknownProperty(_)));

    let err = editor.set_property("a", "type", "villain").unwrap_err();
    assert!(matches!(err, EditorError::InvalidValue { .. }));
}

#[test]
fn test_auto_layout_layers_a_chain() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    for id in ["intro", "middle", "finale"] {
        editor
            .add_node(id, NodeKind::Scene, Position::new(999.0, 999.0))
            .unwrap();
    }
    editor.connect("intro", "middle").unwrap();
    editor.connect("middle", "finale").unwrap();
    editor.set_entry("intro").unwrap();

    editor.run_auto_layout().unwrap();

    let model = editor.model();
    let pos = |id: &str| model.node(model.resolve(id).unwrap()).unwrap().position;
    assert_eq!(pos("intro"), Position::new(0.0, 0.0));
    assert_eq!(pos("middle"), Position::new(0.0, 150.0));
    assert_eq!(pos("finale"), Position::new(0.0, 300.0));
    assert!(layout_file(dir.path()).exists());
}

#[test]
fn test_delete_entry_node_clears_marker() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor.add_node("intro", NodeKind::Scene, Position::default()).unwrap();
    editor.set_entry("intro").unwrap();
    editor.delete_node("intro").unwrap();

    assert_eq!(editor.model().entry(), None);
    assert!(matches!(
        editor.delete_node("intro"),
        Err(EditorError::UnknownNode(_))
    ));
}

#[test]
fn test_events_fire_per_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    editor.subscribe(move |event| {
        let tag = match event {
            GraphEvent::NodeAdded { id } => format!("add:{id}"),
            GraphEvent::EdgeAdded { from, to } => format!("edge:{from}->{to}"),
            GraphEvent::EntryChanged { id } => {
                format!("entry:{}", id.as_deref().unwrap_or("-"))
            }
            GraphEvent::PropertyChanged { id, property } => format!("prop:{id}.{property}"),
            other => format!("{other:?}"),
        };
        sink.lock().push(tag);
    });

    editor.add_node("a", NodeKind::Scene, Position::default()).unwrap();
    editor.add_node("b", NodeKind::Scene, Position::default()).unwrap();
    editor.connect("a", "b").unwrap();
    editor.set_entry("a").unwrap();
    editor.set_property("b", "title", "The End").unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            "add:a".to_string(),
            "add:b".to_string(),
            "edge:a->b".to_string(),
            "entry:a".to_string(),
            "prop:b.title".to_string(),
        ]
    );
}

#[test]
fn test_load_round_trips_layout_file() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut editor = editor_in(dir.path());
        editor
            .add_node("intro", NodeKind::Dialogue, Position::new(5.0, 6.0))
            .unwrap();
        editor.add_node("end", NodeKind::Scene, Position::default()).unwrap();
        editor.set_entry("intro").unwrap();
        editor.set_property("intro", "title", "Opening").unwrap();
    }

    let mut editor = editor_in(dir.path());
    let issues = editor.load().unwrap();
    assert!(issues.is_empty());

    let model = editor.model();
    assert_eq!(model.node_count(), 2);
    let intro = model.resolve("intro").unwrap();
    assert_eq!(model.node(intro).unwrap().title, "Opening");
    assert_eq!(model.node(intro).unwrap().position, Position::new(5.0, 6.0));
    assert_eq!(model.entry(), Some(intro));
}

#[test]
fn test_rebuild_from_scripts_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(
        scripts.join("intro.nms"),
        "entry intro\nscene intro {\n    say Alice \"Welcome\"\n    goto fork\n}\n",
    )
    .unwrap();
    fs::write(
        scripts.join("fork.nms"),
        concat!(
            "scene fork {\n",
            "    choice {\n",
            "        \"Cave\" -> goto cave\n",
            "        \"River\" -> goto river\n",
            "    }\n",
            "}\n",
            "scene cave {\n}\n",
            "scene river {\n    goto nowhere\n}\n",
        ),
    )
    .unwrap();

    let mut editor = editor_in(dir.path());
    let plan = editor.plan_rebuild_from_scripts(&scripts);
    let issues = editor.apply_rebuild(&plan).unwrap();

    let model = editor.model();
    assert_eq!(model.node_count(), 4);
    assert_eq!(model.entry(), Some(model.resolve("intro").unwrap()));

    let fork = model.resolve("fork").unwrap();
    assert_eq!(model.node(fork).unwrap().kind, NodeKind::Choice);
    assert!(model.has_edge(model.resolve("intro").unwrap(), fork));
    assert!(model.has_edge(fork, model.resolve("cave").unwrap()));

    // The dangling goto in river.nms is reported, not fatal.
    assert!(issues.iter().any(|i| i.contains("nowhere")));
    assert!(layout_file(dir.path()).exists());
}

#[tokio::test]
async fn test_sync_pushes_dialogue_into_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());

    editor
        .add_node("intro", NodeKind::Dialogue, Position::default())
        .unwrap();
    editor
        .set_property("intro", "scriptPath", "scripts/intro.nms")
        .unwrap();
    editor.set_property("intro", "text", "Fresh line").unwrap();
    // Reset the file so the job has something to overwrite.
    fs::write(
        dir.path().join("scripts/intro.nms"),
        "scene intro {\n    say Narrator \"stale\"\n}\n",
    )
    .unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let handle = editor.start_sync_to_scripts(tx).unwrap();
    let report = handle.await.unwrap();

    assert_eq!(report.state, SyncState::Completed);
    assert_eq!(report.synced, 1);
    assert_eq!(editor.sync_state(), SyncState::Completed);
    editor.reset_sync().unwrap();
    assert_eq!(editor.sync_state(), SyncState::Idle);

    let script = fs::read_to_string(dir.path().join("scripts/intro.nms")).unwrap();
    assert!(script.contains("say Narrator \"Fresh line\""));
}
