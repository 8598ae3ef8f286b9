//! Pre-armed caret formatting through the reconciler: the marker carries
//! pending formats until a character is typed.

use vellum_memdom::{MemoryPlatform, MemoryTree};
use vellum_selection::{
    ContentTree, FormatValue, NativePosition, Range, RawRange, SelectionPlatform,
    SelectionReconciler, Source,
};

fn host(content: &str) -> (MemoryTree, MemoryPlatform) {
    let tree = MemoryTree::with_text(content);
    let mut platform = MemoryPlatform::new();
    platform.relayout(&tree);
    (tree, platform)
}

#[test]
fn test_bold_at_caret_then_typing() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::caret(1)), Source::Api);
    reconciler.format(&mut tree, &mut platform, "bold", FormatValue::Flag(true));

    // The range did not move; the marker sits between the split halves with
    // the pending format, and the platform caret is at its text end.
    assert_eq!(reconciler.saved_range(), Range::caret(1));
    assert!(tree.marker_attached());
    assert_eq!(
        tree.marker_formats().get("bold"),
        Some(&FormatValue::Flag(true))
    );
    let line = tree.line(0).unwrap();
    assert_eq!(tree.child_count(&line), 3);
    let marker_text = tree.marker_text_node().unwrap();
    assert_eq!(
        platform.active_range(),
        Some(RawRange::caret(NativePosition::new(marker_text, 1)))
    );

    // The next character donates the marker's formats and detaches it.
    assert!(tree.commit_typed_char('c'));
    assert_eq!(tree.plain_text(), "acb\n");
    assert!(!tree.marker_attached());
    let typed = tree.find_text("c").unwrap();
    let wrapper = tree.parent(&typed).unwrap();
    assert_eq!(
        tree.node_formats(wrapper).get("bold"),
        Some(&FormatValue::Flag(true))
    );

    // The editor relays the post-typing caret; the model follows silently.
    platform.relayout(&tree);
    platform.set_user_selection(Some(RawRange::caret(NativePosition::new(typed, 1))));
    reconciler.handle_content_changed(&mut tree, &mut platform);
    assert_eq!(reconciler.last_range(), Some(Range::caret(2)));
}

#[test]
fn test_block_format_is_ignored_at_caret() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::caret(1)), Source::Api);
    let applies = platform.apply_calls();

    reconciler.format(
        &mut tree,
        &mut platform,
        "header",
        FormatValue::Name("2".into()),
    );
    assert!(!tree.marker_attached());
    assert_eq!(platform.apply_calls(), applies);
}

#[test]
fn test_unknown_format_is_ignored() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::caret(1)), Source::Api);
    reconciler.format(&mut tree, &mut platform, "wavy", FormatValue::Flag(true));
    assert!(!tree.marker_attached());
}

#[test]
fn test_expanded_selection_is_ignored() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::new(0, 2)), Source::Api);
    reconciler.format(&mut tree, &mut platform, "bold", FormatValue::Flag(true));
    assert!(!tree.marker_attached());
}

#[test]
fn test_no_selection_is_ignored() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.format(&mut tree, &mut platform, "bold", FormatValue::Flag(true));
    assert!(!tree.marker_attached());
}

#[test]
fn test_second_format_reuses_attached_marker() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::caret(1)), Source::Api);
    reconciler.format(&mut tree, &mut platform, "bold", FormatValue::Flag(true));
    reconciler.format(&mut tree, &mut platform, "italic", FormatValue::Flag(true));

    // The caret already sat on the marker: no second splice.
    let line = tree.line(0).unwrap();
    assert_eq!(tree.child_count(&line), 3);
    assert_eq!(
        tree.marker_formats().get("bold"),
        Some(&FormatValue::Flag(true))
    );
    assert_eq!(
        tree.marker_formats().get("italic"),
        Some(&FormatValue::Flag(true))
    );
}

#[test]
fn test_format_at_run_start_attaches_before_run() {
    let (mut tree, mut platform) = host("ab");
    let mut reconciler = SelectionReconciler::new(&mut tree, &mut platform);

    reconciler.set_range(&mut tree, &mut platform, Some(Range::caret(0)), Source::Api);
    reconciler.format(&mut tree, &mut platform, "bold", FormatValue::Flag(true));

    assert!(tree.marker_attached());
    assert_eq!(reconciler.saved_range(), Range::caret(0));

    // Restoring hands back the equivalent caret at the run start.
    let restored = tree.restore_marker().unwrap();
    let text = tree.find_text("ab").unwrap();
    assert_eq!(restored.start, NativePosition::new(text, 0));
}
