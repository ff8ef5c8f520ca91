use quill_rename::{rename, RenameParams};

fn offset(src: &str, pattern: &str) -> u32 {
    src.find(pattern).expect("pattern missing from fixture") as u32
}

#[test]
fn renaming_get_enumerator_away_breaks_foreach_consumers() {
    let src = "\
class Seq
{
    Seq GetEnumerator() { return this; }

    bool MoveNext() { return false; }
}

class App
{
    void Use(Seq seq)
    {
        foreach (var item in seq)
        {
        }
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "GetEnumerator"), "Fetch"))
        .expect("rename should succeed");

    assert!(
        outcome
            .conflicts
            .iter()
            .any(|c| c.start == offset(src, "foreach")),
        "the foreach that enumerates Seq loses its GetEnumerator; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn renaming_an_unrelated_method_leaves_foreach_alone() {
    let src = "\
class Seq
{
    Seq GetEnumerator() { return this; }

    void Reset() { }
}

class App
{
    void Use(Seq seq)
    {
        foreach (var item in seq)
        {
        }
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Reset"), "Clear"))
        .expect("rename should succeed");

    assert!(
        outcome.conflicts.is_empty(),
        "renaming Reset does not disturb the enumeration protocol; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn renaming_deconstruct_away_breaks_deconstruction_sites() {
    let src = "\
class Point
{
    void Deconstruct(int a, int b) { }
}

class App
{
    void Use(Point p)
    {
        (a, b) = p;
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Deconstruct"), "Split"))
        .expect("rename should succeed");

    assert!(
        outcome
            .conflicts
            .iter()
            .any(|c| c.start == offset(src, "(a, b)")),
        "the tuple assignment deconstructs through Point.Deconstruct; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn renaming_onto_an_inherited_protocol_member_conflicts() {
    let src = "\
class Base
{
    void MoveNext() { }
}

class Derived : Base
{
    void Step() { }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Step"), "MoveNext"))
        .expect("rename should succeed");

    assert!(
        outcome
            .conflicts
            .iter()
            .any(|c| c.start == offset(src, "Step")),
        "hiding the inherited MoveNext should be flagged at the renamed declaration; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn unqualified_call_captured_by_a_local_conflicts() {
    let src = "\
class App
{
    void Helper() { }

    void Run()
    {
        int handler = 0;
        Helper();
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Helper"), "handler"))
        .expect("rename should succeed");

    assert!(
        outcome
            .conflicts
            .iter()
            .any(|c| c.start == offset(src, "Helper();")),
        "the call site binds through the local `handler` after the rename; got {:?}",
        outcome.conflicts
    );
}

#[test]
fn unqualified_call_with_no_local_in_scope_is_fine() {
    let src = "\
class App
{
    void Helper() { }

    void Run()
    {
        Helper();
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Helper"), "handler"))
        .expect("rename should succeed");

    assert!(
        outcome.conflicts.is_empty(),
        "no local named `handler` is in scope; got {:?}",
        outcome.conflicts
    );
}
