use pretty_assertions::assert_eq;
use quill_core::TextRange;
use quill_rename::{rename, RenameParams};

fn offset(src: &str, pattern: &str) -> u32 {
    src.find(pattern).expect("pattern missing from fixture") as u32
}

fn zone(src: &str, pattern: &str) -> TextRange {
    TextRange::at(offset(src, pattern), pattern.len() as u32)
}

const STATIC_CALL: &str = "\
class Outer
{
    static int Value() { return 1; }

    int Compute()
    {
        return Value();
    }
}
";

#[test]
fn conflict_zones_are_expanded_to_qualified_form() {
    let mut params = RenameParams::new(offset(STATIC_CALL, "Compute"), "Run");
    params.conflict_zones = vec![zone(STATIC_CALL, "return Value();")];
    let outcome = rename(STATIC_CALL, &params).expect("rename should succeed");

    assert!(
        outcome.text.contains("return Outer.Value();"),
        "static member access should gain its declaring type; got:\n{}",
        outcome.text
    );
    assert_eq!(outcome.complexified_spans.len(), 1);
    let span = &outcome.complexified_spans[0];
    assert_eq!(span.old, zone(STATIC_CALL, "return Value();"));
    assert_eq!(
        span.new,
        TextRange::at(span.old.start, "return Outer.Value();".len() as u32)
    );
}

#[test]
fn instance_members_gain_a_this_receiver() {
    let src = "\
class Bag
{
    int size;

    int Total()
    {
        return size;
    }
}
";
    let mut params = RenameParams::new(offset(src, "Total"), "Sum");
    params.conflict_zones = vec![zone(src, "return size;")];
    let outcome = rename(src, &params).expect("rename should succeed");

    assert!(
        outcome.text.contains("return this.size;"),
        "instance member access should gain `this.`; got:\n{}",
        outcome.text
    );
}

#[test]
fn expansion_is_idempotent() {
    let mut params = RenameParams::new(offset(STATIC_CALL, "Compute"), "Run");
    params.conflict_zones = vec![zone(STATIC_CALL, "return Value();")];
    let first = rename(STATIC_CALL, &params).expect("first rename should succeed");

    let mut again = RenameParams::new(offset(&first.text, "Run"), "Go");
    again.conflict_zones = vec![zone(&first.text, "return Outer.Value();")];
    let second = rename(&first.text, &again).expect("second rename should succeed");

    assert!(
        second.complexified_spans.is_empty(),
        "an already-qualified region must not be expanded again; got {:#?}",
        second.complexified_spans
    );
    assert_eq!(second.text, first.text.replace("Run", "Go"));
}

#[test]
fn base_list_zones_are_expanded_to_qualified_form() {
    let src = "\
class Outer
{
    class Inner { }

    class Sub : Inner
    {
    }
}
";
    let mut params = RenameParams::new(offset(src, "Sub"), "Branch");
    params.conflict_zones = vec![zone(src, ": Inner")];
    let outcome = rename(src, &params).expect("rename should succeed");

    assert!(
        outcome.text.contains("class Branch : Outer.Inner"),
        "the base type should gain its container path; got:\n{}",
        outcome.text
    );
    assert_eq!(outcome.complexified_spans.len(), 1);
    assert_eq!(outcome.complexified_spans[0].old, zone(src, ": Inner"));
}

#[test]
fn rename_targets_inside_an_expanded_zone_are_still_renamed() {
    let src = "\
class Store
{
    static int Fetch() { return 1; }

    int Use()
    {
        return Fetch();
    }
}
";
    let mut params = RenameParams::new(offset(src, "Fetch"), "Load");
    params.conflict_zones = vec![zone(src, "return Fetch();")];
    let outcome = rename(src, &params).expect("rename should succeed");

    assert!(
        outcome.text.contains("return Store.Load();"),
        "the reference inside the expanded zone must be both qualified and renamed; got:\n{}",
        outcome.text
    );
    let span = &outcome.complexified_spans[0];
    assert!(
        !span.sub_spans.is_empty(),
        "the renamed token inside the region should be tracked as a sub-span"
    );
}
