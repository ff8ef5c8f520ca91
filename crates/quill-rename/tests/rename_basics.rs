use pretty_assertions::assert_eq;
use quill_rename::{rename, RenameParams};

fn offset(src: &str, pattern: &str) -> u32 {
    src.find(pattern).expect("pattern missing from fixture") as u32
}

const COUNTER: &str = "\
class Counter
{
    int count;

    int Bump()
    {
        count = count + 1;
        return count;
    }
}
";

#[test]
fn renaming_to_the_same_name_changes_nothing() {
    let outcome = rename(COUNTER, &RenameParams::new(offset(COUNTER, "count"), "count"))
        .expect("rename should succeed");

    assert_eq!(outcome.text, COUNTER);
    assert!(
        outcome.modified_spans.is_empty(),
        "no-op rename must not report spans; got {:#?}",
        outcome.modified_spans
    );
    assert!(
        outcome.conflicts.is_empty(),
        "no-op rename must not report conflicts; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn rename_round_trips() {
    let forward = rename(COUNTER, &RenameParams::new(offset(COUNTER, "count"), "total"))
        .expect("forward rename should succeed");
    assert!(forward.text.contains("total = total + 1;"));

    let back = rename(
        &forward.text,
        &RenameParams::new(offset(&forward.text, "total"), "count"),
    )
    .expect("reverse rename should succeed");

    assert_eq!(back.text, COUNTER);
}

#[test]
fn modified_spans_keep_original_starts() {
    let outcome = rename(COUNTER, &RenameParams::new(offset(COUNTER, "count"), "sum"))
        .expect("rename should succeed");

    assert_eq!(outcome.modified_spans.len(), 4, "declaration plus three references");
    for span in &outcome.modified_spans {
        assert_eq!(span.new.start, span.old.start);
        assert_eq!(span.old.len(), 5);
        assert_eq!(span.new.len(), 3);
    }
}

const DESCRIBED: &str = "\
class Counter
{
    int count;

    string Describe()
    {
        // count tracker
        return \"count is high\";
    }
}
";

#[test]
fn string_literals_are_left_alone_by_default() {
    let outcome = rename(DESCRIBED, &RenameParams::new(offset(DESCRIBED, "count"), "total"))
        .expect("rename should succeed");

    assert!(outcome.text.contains("\"count is high\""));
    let literal_match = offset(DESCRIBED, "count is high");
    assert!(
        outcome.modified_spans.iter().all(|s| s.old.start != literal_match),
        "string content must not be touched without opting in; got {:#?}",
        outcome.modified_spans
    );
}

#[test]
fn string_literals_are_substituted_when_opted_in() {
    let mut params = RenameParams::new(offset(DESCRIBED, "count"), "total");
    params.rename_in_strings = true;
    let outcome = rename(DESCRIBED, &params).expect("rename should succeed");

    assert!(outcome.text.contains("\"total is high\""));
    let literal_match = offset(DESCRIBED, "count is high");
    assert!(
        outcome.modified_spans.iter().any(|s| s.old.start == literal_match),
        "expected a span for the in-string substitution; got {:#?}",
        outcome.modified_spans
    );
}

#[test]
fn comments_are_substituted_when_opted_in() {
    let mut params = RenameParams::new(offset(DESCRIBED, "count"), "total");
    params.rename_in_comments = true;
    let outcome = rename(DESCRIBED, &params).expect("rename should succeed");

    assert!(outcome.text.contains("// total tracker"));
    assert!(outcome.text.contains("\"count is high\""), "strings stay untouched");
}

const CALLER: &str = "\
class App
{
    void Helper() { }

    void Run()
    {
        Helper();
    }
}
";

#[test]
fn renamed_declaration_is_annotated() {
    let outcome = rename(CALLER, &RenameParams::new(offset(CALLER, "Helper"), "Assist"))
        .expect("rename should succeed");

    let declaration = outcome
        .annotations
        .annotations_at(offset(CALLER, "Helper"))
        .iter()
        .find(|a| a.is_original_declaration)
        .expect("declaration token should carry an annotation");
    assert!(declaration.is_rename_location);
    assert_eq!(declaration.original_span.start, offset(CALLER, "Helper"));
}

#[test]
fn invocations_containing_renames_are_annotated() {
    let outcome = rename(CALLER, &RenameParams::new(offset(CALLER, "Helper"), "Assist"))
        .expect("rename should succeed");

    assert!(
        outcome.annotations.iter().any(|(_, a)| a.is_invocation_expression),
        "the call through the renamed method should be flagged for re-checking"
    );
}
