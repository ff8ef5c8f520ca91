use quill_rename::{rename, RenameParams};

fn offset(src: &str, pattern: &str) -> u32 {
    src.find(pattern).expect("pattern missing from fixture") as u32
}

fn conflict_starts(src: &str, params: &RenameParams) -> Vec<u32> {
    let outcome = rename(src, params).expect("rename should succeed");
    outcome.conflicts.iter().map(|c| c.start).collect()
}

#[test]
fn property_rename_clashes_with_accessor_shaped_method() {
    let src = "\
class Widget
{
    int Size { get; set; }

    int get_Length() { return 0; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Size"), "Length"));
    assert!(
        starts.contains(&offset(src, "get_Length")),
        "the existing get_Length method collides with the renamed property's getter; got {starts:?}"
    );
}

#[test]
fn property_rename_without_a_collision_is_clean() {
    let src = "\
class Widget
{
    int Size { get; set; }

    int get_Length() { return 0; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Size"), "Width"));
    assert!(starts.is_empty(), "no accessor collision for Width; got {starts:?}");
}

#[test]
fn method_rename_onto_sibling_field_conflicts() {
    let src = "\
class Data
{
    int total;

    int Sum() { return total; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Sum"), "total"));
    assert!(starts.contains(&offset(src, "total")));
    assert!(starts.contains(&offset(src, "Sum")));
}

#[test]
fn member_may_not_take_its_containing_types_name() {
    let src = "\
class Box
{
    void Pack() { }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Pack"), "Box"));
    assert!(starts.contains(&offset(src, "Pack")));
}

#[test]
fn enum_members_may_share_the_enum_name() {
    let src = "\
enum Color
{
    Red,
    Blue
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Red"), "Color"));
    assert!(
        starts.is_empty(),
        "enum containers are exempt from the member clash; got {starts:?}"
    );
}

#[test]
fn local_shadowed_by_parameter_conflicts_at_every_reference() {
    let src = "\
class Calc
{
    int Run(int x)
    {
        int count = 0;
        count = count + x;
        return count;
    }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "count"), "x"));
    assert!(
        starts.contains(&offset(src, "x)")),
        "the shadowed parameter declaration must be flagged; got {starts:?}"
    );
    assert!(starts.contains(&offset(src, "count = count + x")));
    assert!(starts.contains(&offset(src, "count;")));
}

#[test]
fn alias_collision_in_the_same_directive_scope() {
    let src = "\
using First = Alpha;
using Second = Beta;

namespace Alpha { class A { } }
namespace Beta { class B { } }
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Second"), "First"));
    assert!(starts.contains(&offset(src, "First")));
    assert!(starts.contains(&offset(src, "Second")));
}

#[test]
fn aliases_in_different_namespace_blocks_never_collide() {
    let src = "\
using First = Alpha;

namespace Alpha { class A { } }
namespace Beta
{
    using Third = Alpha;

    class B { }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Third"), "First"));
    assert!(
        starts.is_empty(),
        "aliases in separate directive scopes are independent; got {starts:?}"
    );
}

#[test]
fn type_parameters_in_one_list_may_not_collide() {
    let src = "\
class Holder<T, U>
{
    void Keep() { }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "U>"), "T"));
    assert!(starts.contains(&offset(src, "T,")));
    assert!(starts.contains(&offset(src, "U>")));
}

#[test]
fn member_renamed_onto_a_type_parameter_conflicts() {
    let src = "\
class Holder<T>
{
    int size;
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "size"), "T"));
    assert!(starts.contains(&offset(src, "T>")));
    assert!(starts.contains(&offset(src, "size")));
}

#[test]
fn duplicate_signature_after_rename_conflicts() {
    let src = "\
class Ops
{
    int First(int a) { return a; }

    int Second(int a) { return a; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Second"), "First"));
    assert!(starts.contains(&offset(src, "First")));
    assert!(starts.contains(&offset(src, "Second")));
}

#[test]
fn overloads_with_distinct_signatures_do_not_conflict() {
    let src = "\
class Ops
{
    int First(int a) { return a; }

    int Second(int a, int b) { return a + b; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Second"), "First"));
    assert!(
        starts.is_empty(),
        "different parameter lists make a legal overload; got {starts:?}"
    );
}

#[test]
fn elidable_optional_parameters_still_duplicate_a_signature() {
    let src = "\
class Ops
{
    int First(int a) { return a; }

    int Second(int a, int b = 0) { return a + b; }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "Second"), "First"));
    assert!(
        starts.contains(&offset(src, "First")),
        "a one-argument call matches both methods; got {starts:?}"
    );
    assert!(starts.contains(&offset(src, "Second")));
}

#[test]
fn labels_in_one_member_may_not_collide() {
    let src = "\
class Flow
{
    void Run()
    {
        start:
        goto done;
        done:
        return;
    }
}
";
    let starts = conflict_starts(src, &RenameParams::new(offset(src, "done:"), "start"));
    assert!(starts.contains(&offset(src, "start")));
    assert!(starts.contains(&offset(src, "done:")));
}
