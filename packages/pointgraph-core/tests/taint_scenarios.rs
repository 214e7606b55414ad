//! End-to-end taint-analysis scenarios.

use std::io::Write as _;

use pointgraph_core::features::pointer_analysis::ports::HeapModel;
use pointgraph_core::shared::models::CallKind;
use pointgraph_core::{
    AnalysisOptions, Context, ContextInsensitiveSelector, ProgramBuilder, Solver, TaintConfig,
    TaintFlow, TAINT_CONFIG_KEY,
};

const SRC_GET: &str = "<Src: T get()>";
const SNK_USE: &str = "<Snk: void use(T)>";
const WRAP_OF: &str = "<Wrap: T of(T)>";

/// Declare the `Src.get` source and `Snk.use` sink methods.
fn declare_source_and_sink(b: &mut ProgramBuilder) {
    let src = b.method(SRC_GET);
    b.link_static(SRC_GET, src);
    let snk = b.method(SNK_USE);
    let p = b.var(snk, "p");
    b.add_param(snk, p);
    b.link_static(SNK_USE, snk);
}

const SOURCE_SINK_YAML: &str = r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
"#;

/// Scenario: `x = Src.get(); Snk.use(x);` yields exactly one flow.
#[test]
fn test_source_to_sink() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    let (_, src_call) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![x], None);
    b.set_entry(main);
    let mut program = b.finish();

    let config = TaintConfig::from_yaml(SOURCE_SINK_YAML)
        .unwrap()
        .resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();

    let flows: Vec<TaintFlow> = result.taint_flows().into_iter().collect();
    assert_eq!(flows, vec![TaintFlow::new(src_call, snk_call, 0)]);
}

/// Scenario: an arg-to-result transfer relays taint through `Wrap.of`,
/// preserving the original source call.
#[test]
fn test_arg_to_result_transfer() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let wrap = b.method(WRAP_OF);
    let wp = b.var(wrap, "p");
    b.add_param(wrap, wp);
    b.link_static(WRAP_OF, wrap);

    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    let y = b.var(main, "y");
    let (_, src_call) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    b.stmt_invoke(main, CallKind::Static, WRAP_OF, None, vec![x], Some(y));
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![y], None);
    b.set_entry(main);
    let mut program = b.finish();

    let yaml = r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
transfers:
  - { method: "<Wrap: T of(T)>", from: 0, to: result, type: "T" }
"#;
    let config = TaintConfig::from_yaml(yaml).unwrap().resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();

    let flows: Vec<TaintFlow> = result.taint_flows().into_iter().collect();
    assert_eq!(flows, vec![TaintFlow::new(src_call, snk_call, 0)]);

    // y points to exactly one taint object, inheriting the source call
    let pt_y = result.pt_of_var(&Context::empty(), y);
    assert_eq!(pt_y.len(), 1);
    let (ctx, obj) = result.cs_manager().cs_obj(pt_y.iter().next().unwrap());
    assert!(result.cs_manager().context(ctx).is_empty());
    assert!(result.heap().is_taint(obj));
    assert_eq!(result.heap().source_call(obj), Some(src_call));
}

/// Scenario: arg-to-base taints the receiver, base-to-result reads it
/// back out.
#[test]
fn test_arg_to_base_and_base_to_result_transfers() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let ty_box = b.ty("Box");

    let set = b.method("<Box: void set(T)>");
    let set_this = b.var(set, "this");
    b.set_this(set, set_this);
    let set_p = b.var(set, "p");
    b.add_param(set, set_p);
    b.link_virtual(ty_box, "set", set);

    let get = b.method("<Box: T get()>");
    let get_this = b.var(get, "this");
    b.set_this(get, get_this);
    b.link_virtual(ty_box, "get", get);

    let main = b.method("<Main: void main()>");
    let bx = b.var(main, "box");
    let x = b.var(main, "x");
    let y = b.var(main, "y");
    b.stmt_new(main, bx, ty_box);
    let (_, src_call) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    b.stmt_invoke(main, CallKind::Virtual, "set", Some(bx), vec![x], None);
    b.stmt_invoke(main, CallKind::Virtual, "get", Some(bx), vec![], Some(y));
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![y], None);
    b.set_entry(main);
    let mut program = b.finish();

    let yaml = r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
transfers:
  - { method: "<Box: void set(T)>", from: 0, to: base, type: "T" }
  - { method: "<Box: T get()>", from: base, to: result, type: "T" }
"#;
    let config = TaintConfig::from_yaml(yaml).unwrap().resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();

    let flows: Vec<TaintFlow> = result.taint_flows().into_iter().collect();
    assert_eq!(flows, vec![TaintFlow::new(src_call, snk_call, 0)]);
}

/// A source call whose result is discarded injects nothing.
#[test]
fn test_source_without_result_injects_nothing() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], None);
    b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![x], None);
    b.set_entry(main);
    let mut program = b.finish();

    let config = TaintConfig::from_yaml(SOURCE_SINK_YAML)
        .unwrap()
        .resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();
    assert!(result.taint_flows().is_empty());
}

/// Taint does not cross methods the transfer config says nothing about.
#[test]
fn test_unconfigured_call_does_not_relay_taint() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let wrap = b.method(WRAP_OF);
    let wp = b.var(wrap, "p");
    b.add_param(wrap, wp);
    b.link_static(WRAP_OF, wrap);

    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    let y = b.var(main, "y");
    b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    b.stmt_invoke(main, CallKind::Static, WRAP_OF, None, vec![x], Some(y));
    let _ = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![y], None);
    b.set_entry(main);
    let mut program = b.finish();

    // no transfer for Wrap.of: the taint stops at its parameter
    let config = TaintConfig::from_yaml(SOURCE_SINK_YAML)
        .unwrap()
        .resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();
    assert!(result.taint_flows().is_empty());
}

/// An absent overlay leaves the result without flows.
#[test]
fn test_disabled_overlay_reports_nothing() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![x], None);
    b.set_entry(main);
    let program = b.finish();

    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .solve()
        .unwrap();
    assert!(result.taint_flows().is_empty());
}

/// The `taint-config` option loads the overlay from disk.
#[test]
fn test_taint_config_via_analysis_options() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    let (_, src_call) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![x], None);
    b.set_entry(main);
    let mut program = b.finish();

    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .unwrap();
    file.write_all(SOURCE_SINK_YAML.as_bytes()).unwrap();

    let mut options = AnalysisOptions::new();
    options.set(TAINT_CONFIG_KEY, file.path().to_str().unwrap());
    let config = options.load_taint_config(&mut program).unwrap();

    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();
    let flows: Vec<TaintFlow> = result.taint_flows().into_iter().collect();
    assert_eq!(flows, vec![TaintFlow::new(src_call, snk_call, 0)]);
}

/// Two sources into one sink produce two distinct, ordered flows.
#[test]
fn test_multiple_sources_are_distinguished() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    let y = b.var(main, "y");
    let z = b.var(main, "z");
    let (_, src1) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    let (_, src2) = b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(y));
    b.stmt_copy(main, z, x);
    b.stmt_copy(main, z, y);
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![z], None);
    b.set_entry(main);
    let mut program = b.finish();

    let config = TaintConfig::from_yaml(SOURCE_SINK_YAML)
        .unwrap()
        .resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();

    let flows: Vec<TaintFlow> = result.taint_flows().into_iter().collect();
    assert_eq!(
        flows,
        vec![
            TaintFlow::new(src1, snk_call, 0),
            TaintFlow::new(src2, snk_call, 0),
        ]
    );
}

/// A cyclic transfer configuration must still reach the fixed point: the
/// rewritten taint object is interned, so re-emission stops.
#[test]
fn test_cyclic_transfers_terminate() {
    let mut b = ProgramBuilder::new();
    declare_source_and_sink(&mut b);
    let wrap = b.method(WRAP_OF);
    let wp = b.var(wrap, "p");
    b.add_param(wrap, wp);
    b.link_static(WRAP_OF, wrap);

    let main = b.method("<Main: void main()>");
    let x = b.var(main, "x");
    b.stmt_invoke(main, CallKind::Static, SRC_GET, None, vec![], Some(x));
    // x = Wrap.of(x): the transfer target feeds its own source
    b.stmt_invoke(main, CallKind::Static, WRAP_OF, None, vec![x], Some(x));
    let (_, snk_call) = b.stmt_invoke(main, CallKind::Static, SNK_USE, None, vec![x], None);
    b.set_entry(main);
    let mut program = b.finish();

    let yaml = r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
transfers:
  - { method: "<Wrap: T of(T)>", from: 0, to: result, type: "T" }
"#;
    let config = TaintConfig::from_yaml(yaml).unwrap().resolve(&mut program);
    let selector = ContextInsensitiveSelector;
    let result = Solver::new(&program, &selector, &program.dispatch)
        .with_taint_config(config)
        .solve()
        .unwrap();

    // converges, and the sink still sees the taint
    assert!(!result.taint_flows().is_empty());
    assert!(result
        .taint_flows()
        .iter()
        .all(|flow| flow.sink_call == snk_call));
}
