//! End-to-end analysis and fix workflows over in-memory snapshots.

use unthrow_core::{MemoryHost, MethodSpec, Program, ProgramBuilder, Stmt};
use unthrow_engine::{Analyzer, AnalyzerOptions, ProblemCategory};

fn analyzer(host: &MemoryHost) -> Analyzer<'_> {
    Analyzer::new(host, AnalyzerOptions::default())
}

fn try_of(program: &Program, method: unthrow_core::MethodId) -> &Stmt {
    let body = program.method(method).body.as_ref().unwrap();
    body.iter()
        .find(|s| matches!(s, Stmt::Try { .. }))
        .expect("method should contain a try-statement")
}

#[test]
fn test_unthrown_declaration_is_flagged_and_removed() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let owner = b.class("com.example.Copier", &[]);
    let log = b.method(MethodSpec {
        body: Some(vec![]),
        ..MethodSpec::new(owner, "log")
    });
    let call = b.call(log);
    let m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![call]),
        ..MethodSpec::new(owner, "copy")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analyzer = analyzer(&host);
    let analysis = analyzer.analyze(&p).unwrap();
    assert_eq!(analysis.problems.len(), 1);
    assert_eq!(analysis.problems[0].method, m);
    assert_eq!(analysis.problems[0].type_name, "java.io.IOException");
    assert_eq!(analysis.problems[0].category, ProblemCategory::PlainMethod);

    analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();
    let after = host.snapshot();
    assert_eq!(after.method(m).throws_list_len(), 0);
    assert_eq!(after.method(m).body, p.method(m).body);
}

#[test]
fn test_throwing_override_protects_base_declaration() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let base = b.class("com.example.Base", &[]);
    let sub = b.class("com.example.Sub", &[base]);
    b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(base, "run")
    });
    let throw_io = b.throw_stmt(wk.io_exception);
    let reader = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![throw_io]),
        ..MethodSpec::new(sub, "read")
    });
    let call = b.call(reader);
    let rethrow = b.throw_stmt(wk.io_exception);
    let catch = b.catch_clause(vec![wk.io_exception], vec![rethrow]);
    let sub_body = vec![b.try_stmt(vec![], vec![call], vec![catch], None)];
    b.method(MethodSpec {
        body: Some(sub_body),
        ..MethodSpec::new(sub, "run")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analysis = analyzer(&host).analyze(&p).unwrap();
    assert!(analysis.problems.is_empty());
    assert!(analysis.statistics.candidates_retracted >= 1);
}

#[test]
fn test_fix_deletes_dead_catch_but_keeps_live_sibling() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let sql = b.class("java.sql.SQLException", &[wk.exception]);
    let owner = b.class("com.example.Repo", &[]);
    let m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(owner, "load")
    });
    let query = b.method(MethodSpec {
        throws: vec![sql],
        body: Some(vec![]),
        ..MethodSpec::new(owner, "query")
    });
    let call_m = b.call(m);
    let call_query = b.call(query);
    let throw_sql = b.throw_stmt(sql);
    let catch_io = b.catch_clause(vec![wk.io_exception], vec![]);
    let catch_sql = b.catch_clause(vec![sql], vec![]);
    let body = vec![b.try_stmt(
        vec![],
        vec![call_m, call_query],
        vec![catch_io, catch_sql],
        None,
    )];
    let caller = b.method(MethodSpec {
        body: Some(body),
        ..MethodSpec::new(owner, "refresh")
    });
    // query() genuinely throws, so only load()'s declaration is flagged.
    b.set_body(query, vec![throw_sql]);
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analyzer = analyzer(&host);
    let analysis = analyzer.analyze(&p).unwrap();
    assert_eq!(analysis.problems.len(), 1);
    assert_eq!(analysis.problems[0].method, m);

    analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();
    let after = host.snapshot();
    let Stmt::Try { catches, .. } = try_of(&after, caller) else {
        unreachable!();
    };
    assert_eq!(catches.len(), 1);
    assert_eq!(catches[0].types, vec![sql]);
}

#[test]
fn test_fix_unwraps_try_left_without_handlers() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let owner = b.class("com.example.Repo", &[]);
    let m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(owner, "load")
    });
    let call_m = b.call(m);
    let catch_io = b.catch_clause(vec![wk.io_exception], vec![]);
    let body = vec![b.try_stmt(vec![], vec![call_m], vec![catch_io], None)];
    let caller = b.method(MethodSpec {
        body: Some(body),
        ..MethodSpec::new(owner, "refresh")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analyzer = analyzer(&host);
    let analysis = analyzer.analyze(&p).unwrap();
    assert_eq!(analysis.problems.len(), 1);

    analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();
    let after = host.snapshot();
    let body = after.method(caller).body.as_ref().unwrap();
    assert_eq!(body.len(), 1);
    assert!(matches!(body[0], Stmt::Call { .. }));
}

#[test]
fn test_remote_exception_on_remote_type_is_not_flagged() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let service = b.interface("com.example.Registry", &[wk.remote]);
    let impl_ty = b.class("com.example.RegistryImpl", &[service]);
    b.method(MethodSpec {
        throws: vec![wk.remote_exception],
        body: Some(vec![]),
        ..MethodSpec::new(impl_ty, "lookup")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analysis = analyzer(&host).analyze(&p).unwrap();
    assert!(analysis.problems.is_empty());
}

#[test]
fn test_single_entry_fix_prunes_matching_doc_tag() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let owner = b.class("com.example.Copier", &[]);
    let m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        doc_throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(owner, "copy")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analyzer = analyzer(&host);
    let analysis = analyzer.analyze(&p).unwrap();
    assert_eq!(analysis.problems.len(), 1);

    analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();
    let after = host.snapshot();
    assert_eq!(after.method(m).throws_list_len(), 0);
    assert_eq!(after.method(m).doc_tag_types().count(), 0);
}

#[test]
fn test_interface_method_is_flagged_with_abstract_category() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let api = b.interface("com.example.Api", &[]);
    let impl_ty = b.class("com.example.ApiImpl", &[api]);
    let m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        ..MethodSpec::new(api, "call")
    });
    let impl_m = b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(impl_ty, "call")
    });
    let p = b.finish();
    let host = MemoryHost::new(p.clone());

    let analyzer = analyzer(&host);

    // While the implementation still redeclares the type, the interface
    // entry is load-bearing; only the implementation is flagged.
    let analysis = analyzer.analyze(&p).unwrap();
    assert_eq!(analysis.problems.len(), 1);
    assert_eq!(analysis.problems[0].method, impl_m);
    analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();

    // Second pass: the interface method surfaces as an abstract-method
    // finding and its fix clears the last remaining entry.
    let after = host.snapshot();
    let analysis = analyzer.analyze(&after).unwrap();
    assert_eq!(analysis.problems.len(), 1);
    assert_eq!(analysis.problems[0].method, m);
    assert_eq!(analysis.problems[0].category, ProblemCategory::AbstractMethod);
    analyzer.apply_fix(&after, &analysis.problems[0]).unwrap();

    let cleaned = host.snapshot();
    assert!(cleaned
        .method_ids()
        .all(|id| cleaned.method(id).throws_list_len() == 0));
}

#[test]
fn test_snapshot_json_round_trip_drives_analysis() {
    let mut b = ProgramBuilder::new();
    let wk = b.well_known();
    let owner = b.class("com.example.Copier", &[]);
    b.method(MethodSpec {
        throws: vec![wk.io_exception],
        body: Some(vec![]),
        ..MethodSpec::new(owner, "copy")
    });
    let p = b.finish();

    let restored = Program::from_json(&p.to_json().unwrap()).unwrap();
    let host = MemoryHost::new(restored.clone());
    let analysis = analyzer(&host).analyze(&restored).unwrap();
    assert_eq!(analysis.problems.len(), 1);
}
